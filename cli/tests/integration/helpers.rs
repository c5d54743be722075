//! Shared integration helpers: canned firewall servers for the spawned binary.

#![allow(dead_code, clippy::expect_used)]

use std::io::{Read as _, Write as _};
use std::net::TcpListener;

/// Build a full HTTP/1.1 response with a JSON content type.
pub fn http_response(status_line: &str, body: &str) -> String {
    format!(
        "HTTP/1.1 {status_line}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
        body.len()
    )
}

pub fn ok_json(body: &str) -> String {
    http_response("200 OK", body)
}

pub fn not_found() -> String {
    http_response("404 Not Found", "")
}

pub fn forbidden() -> String {
    http_response("403 Forbidden", "")
}

/// Serve `responses` to successive connections on an ephemeral loopback
/// port from a background thread. Returns the base URL.
pub fn serve(responses: Vec<String>) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind loopback");
    let addr = listener.local_addr().expect("local addr");
    std::thread::spawn(move || {
        for response in responses {
            let Ok((mut sock, _)) = listener.accept() else {
                return;
            };
            let mut buf = [0u8; 4096];
            let _ = sock.read(&mut buf);
            let _ = sock.write_all(response.as_bytes());
        }
    });
    format!("http://{addr}")
}

/// A loopback URL nothing is listening on: connecting to it is refused.
pub fn refused_url() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind loopback");
    let addr = listener.local_addr().expect("local addr");
    drop(listener);
    format!("http://{addr}")
}
