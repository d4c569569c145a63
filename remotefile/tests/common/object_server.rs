//! Minimal HTTP/1.1 server for integration tests.
//!
//! Serves a single static body for GET and HEAD on any path and records the
//! request lines it sees. Every response carries `Connection: close`, so a
//! response without `Content-Length` is delimited by the connection closing.

use std::io::{Read, Write};
use std::net::{TcpListener, TcpStream};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

#[derive(Debug, Clone, Copy)]
pub struct ServerOptions {
    /// Status line code for GET and HEAD.
    pub status: u16,
    /// If false, GET responses omit `Content-Length`.
    pub send_length: bool,
    /// Length HEAD reports instead of the body length.
    pub head_length: Option<u64>,
    /// Number of initial requests answered with 500.
    pub failures: usize,
}

impl Default for ServerOptions {
    fn default() -> Self {
        Self {
            status: 200,
            send_length: true,
            head_length: None,
            failures: 0,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Request {
    pub method: String,
    pub path: String,
    pub authorization: Option<String>,
    pub user_agent: Option<String>,
}

pub struct ObjectServer {
    /// Base URL, e.g. "http://127.0.0.1:12345".
    pub base_url: String,
    requests: Arc<Mutex<Vec<Request>>>,
}

impl ObjectServer {
    pub fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    pub fn requests(&self) -> Vec<Request> {
        self.requests.lock().unwrap().clone()
    }
}

/// Starts a server in a background thread serving `body`. The server runs
/// until the process exits.
pub fn start(body: &[u8]) -> ObjectServer {
    start_with_options(body, ServerOptions::default())
}

pub fn start_with_options(body: &[u8], opts: ServerOptions) -> ObjectServer {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
    let port = listener.local_addr().unwrap().port();
    let body = Arc::new(body.to_vec());
    let requests = Arc::new(Mutex::new(Vec::new()));
    let failures = Arc::new(AtomicUsize::new(opts.failures));

    let recorded = Arc::clone(&requests);
    thread::spawn(move || {
        for stream in listener.incoming().flatten() {
            let body = Arc::clone(&body);
            let recorded = Arc::clone(&recorded);
            let failures = Arc::clone(&failures);
            thread::spawn(move || handle(stream, &body, opts, &recorded, &failures));
        }
    });

    ObjectServer {
        base_url: format!("http://127.0.0.1:{}", port),
        requests,
    }
}

fn handle(
    mut stream: TcpStream,
    body: &[u8],
    opts: ServerOptions,
    recorded: &Mutex<Vec<Request>>,
    failures: &AtomicUsize,
) {
    let _ = stream.set_read_timeout(Some(Duration::from_secs(2)));
    let _ = stream.set_write_timeout(Some(Duration::from_secs(2)));

    let Some(request) = read_request(&mut stream) else {
        return;
    };
    let is_head = request.method.eq_ignore_ascii_case("HEAD");
    recorded.lock().unwrap().push(request);

    if failures
        .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
        .is_ok()
    {
        let _ = stream.write_all(
            b"HTTP/1.1 500 Internal Server Error\r\nContent-Length: 0\r\nConnection: close\r\n\r\n",
        );
        return;
    }

    let reason = match opts.status {
        200 => "OK",
        403 => "Forbidden",
        404 => "Not Found",
        _ => "Unknown",
    };
    let mut head = format!("HTTP/1.1 {} {}\r\nConnection: close\r\n", opts.status, reason);
    if is_head {
        let length = opts.head_length.unwrap_or(body.len() as u64);
        head.push_str(&format!("Content-Length: {}\r\n\r\n", length));
        let _ = stream.write_all(head.as_bytes());
        return;
    }
    if opts.send_length {
        head.push_str(&format!("Content-Length: {}\r\n", body.len()));
    }
    head.push_str("\r\n");
    let _ = stream.write_all(head.as_bytes());
    let _ = stream.write_all(body);
}

/// Reads up to the end of the request headers.
fn read_request(stream: &mut TcpStream) -> Option<Request> {
    let mut data = Vec::new();
    let mut buf = [0u8; 4096];
    while !data.windows(4).any(|w| w == b"\r\n\r\n") {
        match stream.read(&mut buf) {
            Ok(0) | Err(_) => return None,
            Ok(n) => data.extend_from_slice(&buf[..n]),
        }
    }
    let text = String::from_utf8_lossy(&data);
    let mut lines = text.lines();
    let mut first = lines.next()?.split_whitespace();
    let method = first.next()?.to_string();
    let path = first.next()?.to_string();
    let mut authorization = None;
    let mut user_agent = None;
    for line in lines {
        let Some((name, value)) = line.split_once(':') else {
            continue;
        };
        let name = name.trim();
        if name.eq_ignore_ascii_case("authorization") {
            authorization = Some(value.trim().to_string());
        } else if name.eq_ignore_ascii_case("user-agent") {
            user_agent = Some(value.trim().to_string());
        }
    }
    Some(Request {
        method,
        path,
        authorization,
        user_agent,
    })
}
