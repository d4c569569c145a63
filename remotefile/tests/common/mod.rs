#![allow(dead_code)]

pub mod object_server;
