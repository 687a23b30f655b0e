//! Minimal HTTP/1.1 server that plays several mirrors for integration tests.
//!
//! Each route is a path prefix (e.g. "/m1/") with a fixed behavior. The first
//! matching route wins; unmatched paths get 404. Every requested path is
//! recorded so tests can assert which mirrors were tried.

use std::io::{Read, Write};
use std::net::{TcpListener, TcpStream};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

#[derive(Debug, Clone)]
pub enum MirrorRoute {
    /// 200 with this body.
    Serve(Vec<u8>),
    /// Empty response with this status line, e.g. "404 Not Found".
    Status(&'static str),
    /// Close the connection without answering (transport error on the client).
    Hangup,
}

pub struct MirrorServer {
    base: String,
    hits: Arc<Mutex<Vec<String>>>,
}

impl MirrorServer {
    /// Mirror base URL for a route prefix, e.g. `mirror("m1")` -> "http://127.0.0.1:PORT/m1".
    pub fn mirror(&self, name: &str) -> String {
        format!("{}/{}", self.base, name)
    }

    /// Request paths in arrival order.
    pub fn hits(&self) -> Vec<String> {
        self.hits.lock().unwrap().clone()
    }
}

/// Starts a server in a background thread. The server runs until the process exits.
pub fn start(routes: Vec<(String, MirrorRoute)>) -> MirrorServer {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
    let port = listener.local_addr().unwrap().port();
    let routes = Arc::new(routes);
    let hits = Arc::new(Mutex::new(Vec::new()));
    let server_hits = Arc::clone(&hits);
    thread::spawn(move || {
        for stream in listener.incoming().flatten() {
            let routes = Arc::clone(&routes);
            let hits = Arc::clone(&server_hits);
            thread::spawn(move || handle(stream, &routes, &hits));
        }
    });
    MirrorServer {
        base: format!("http://127.0.0.1:{}", port),
        hits,
    }
}

fn handle(mut stream: TcpStream, routes: &[(String, MirrorRoute)], hits: &Mutex<Vec<String>>) {
    let _ = stream.set_read_timeout(Some(Duration::from_secs(2)));
    let _ = stream.set_write_timeout(Some(Duration::from_secs(2)));
    let mut buf = [0u8; 8192];
    let n = match stream.read(&mut buf) {
        Ok(0) | Err(_) => return,
        Ok(n) => n,
    };
    let Ok(request) = std::str::from_utf8(&buf[..n]) else {
        return;
    };
    let Some(path) = request_path(request) else {
        let _ = stream.write_all(b"HTTP/1.1 400 Bad Request\r\nContent-Length: 0\r\n\r\n");
        return;
    };
    hits.lock().unwrap().push(path.to_string());

    let route = routes
        .iter()
        .find(|(prefix, _)| path.starts_with(prefix.as_str()))
        .map(|(_, r)| r);
    match route {
        Some(MirrorRoute::Serve(body)) => {
            let head = format!(
                "HTTP/1.1 200 OK\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
                body.len()
            );
            let _ = stream.write_all(head.as_bytes());
            let _ = stream.write_all(body);
        }
        Some(MirrorRoute::Status(status)) => {
            let head = format!(
                "HTTP/1.1 {}\r\nContent-Length: 0\r\nConnection: close\r\n\r\n",
                status
            );
            let _ = stream.write_all(head.as_bytes());
        }
        Some(MirrorRoute::Hangup) => {}
        None => {
            let _ = stream.write_all(
                b"HTTP/1.1 404 Not Found\r\nContent-Length: 0\r\nConnection: close\r\n\r\n",
            );
        }
    }
}

/// Path from a `GET <path> HTTP/1.1` request line.
fn request_path(request: &str) -> Option<&str> {
    let line = request.lines().next()?;
    let mut parts = line.split_whitespace();
    let method = parts.next()?;
    if !method.eq_ignore_ascii_case("GET") {
        return None;
    }
    parts.next()
}
