//! End-to-end tests over real sockets.

use std::collections::VecDeque;
use std::io::{ErrorKind, Read};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use flate2::read::GzDecoder;
use tokio::io::{AsyncReadExt, AsyncWriteExt, DuplexStream};
use tokio::net::{TcpListener, TcpStream};

use courier::config::Config;
use courier::http::parser::{MAX_BODY_SIZE, MAX_HEAD_SIZE, parse_http_response};
use courier::http::response::StatusCode;
use courier::server::listener::{Acceptor, serve, serve_with};

static NEXT_DIR: AtomicUsize = AtomicUsize::new(0);

fn scratch_dir() -> PathBuf {
    let dir = std::env::temp_dir().join(format!(
        "courier-server-{}-{}",
        std::process::id(),
        NEXT_DIR.fetch_add(1, Ordering::SeqCst)
    ));
    let _ = std::fs::remove_dir_all(&dir);
    std::fs::create_dir_all(&dir).unwrap();
    dir
}

async fn start(directory: Option<PathBuf>) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let cfg = Config {
        listen_addr: addr.to_string(),
        directory,
        max_connections: 16,
    };

    tokio::spawn(async move { serve(listener, &cfg).await });
    addr
}

async fn send(addr: SocketAddr, raw: &[u8]) -> Vec<u8> {
    let mut stream = TcpStream::connect(addr).await.unwrap();
    stream.write_all(raw).await.unwrap();

    let mut out = Vec::new();
    stream.read_to_end(&mut out).await.unwrap();
    out
}

#[tokio::test]
async fn test_root() {
    let addr = start(None).await;

    let out = send(addr, b"GET / HTTP/1.1\r\nHost: x\r\n\r\n").await;

    assert_eq!(out, b"HTTP/1.1 200 OK\r\n\r\n".to_vec());
}

#[tokio::test]
async fn test_echo_plain() {
    let addr = start(None).await;

    let out = send(addr, b"GET /echo/abc HTTP/1.1\r\nHost: x\r\nUser-Agent: t\r\n\r\n").await;

    assert_eq!(
        out,
        b"HTTP/1.1 200 OK\r\nContent-Type: text/plain\r\nContent-Length: 3\r\n\r\nabc".to_vec()
    );
}

#[tokio::test]
async fn test_echo_gzip() {
    let addr = start(None).await;

    let out = send(
        addr,
        b"GET /echo/abc HTTP/1.1\r\nHost: x\r\nAccept-Encoding: gzip\r\n\r\n",
    )
    .await;
    let response = parse_http_response(&out).unwrap();

    assert_eq!(response.status, StatusCode::Ok);
    assert_eq!(response.headers.get("Content-Encoding"), Some("gzip"));
    assert_eq!(
        response.headers.get("Content-Length"),
        Some(response.body.len().to_string().as_str())
    );

    let mut text = String::new();
    GzDecoder::new(&response.body[..])
        .read_to_string(&mut text)
        .unwrap();
    assert_eq!(text, "abc");
}

#[tokio::test]
async fn test_user_agent_any_header_position() {
    let addr = start(None).await;

    let out = send(
        addr,
        b"GET /user-agent HTTP/1.1\r\nAccept: */*\r\nHost: x\r\nUser-Agent: foobar/1.2.3\r\n\r\n",
    )
    .await;

    assert_eq!(
        out,
        b"HTTP/1.1 200 OK\r\nContent-Type: text/plain\r\nContent-Length: 12\r\n\r\nfoobar/1.2.3"
            .to_vec()
    );
}

#[tokio::test]
async fn test_unknown_path() {
    let addr = start(None).await;

    let out = send(addr, b"GET /banana HTTP/1.1\r\n\r\n").await;

    assert_eq!(out, b"HTTP/1.1 404 Not Found\r\n\r\n".to_vec());
}

#[tokio::test]
async fn test_missing_file() {
    let addr = start(Some(scratch_dir())).await;

    let out = send(addr, b"GET /files/missing.txt HTTP/1.1\r\nHost: x\r\n\r\n").await;

    assert_eq!(out, b"HTTP/1.1 404 Not Found\r\n\r\n".to_vec());
}

#[tokio::test]
async fn test_create_then_fetch_file() {
    let dir = scratch_dir();
    let addr = start(Some(dir.clone())).await;

    let out = send(
        addr,
        b"POST /files/new.txt HTTP/1.1\r\nHost: x\r\nContent-Length: 5\r\n\r\nhello",
    )
    .await;
    assert_eq!(out, b"HTTP/1.1 201 Created\r\n\r\n".to_vec());
    assert_eq!(std::fs::read(dir.join("new.txt")).unwrap(), b"hello".to_vec());

    let first = send(addr, b"GET /files/new.txt HTTP/1.1\r\nHost: x\r\n\r\n").await;
    assert_eq!(
        first,
        b"HTTP/1.1 200 OK\r\nContent-Type: application/octet-stream\r\nContent-Length: 5\r\n\r\nhello"
            .to_vec()
    );

    let second = send(addr, b"GET /files/new.txt HTTP/1.1\r\nHost: x\r\n\r\n").await;
    assert_eq!(first, second);
}

#[tokio::test]
async fn test_create_existing_file_conflicts() {
    let dir = scratch_dir();
    std::fs::write(dir.join("taken.txt"), "original").unwrap();
    let addr = start(Some(dir.clone())).await;

    let out = send(
        addr,
        b"POST /files/taken.txt HTTP/1.1\r\nContent-Length: 3\r\n\r\nnew",
    )
    .await;

    assert_eq!(out, b"HTTP/1.1 409 Conflict\r\n\r\n".to_vec());
    assert_eq!(std::fs::read_to_string(dir.join("taken.txt")).unwrap(), "original");
}

#[tokio::test]
async fn test_other_methods_on_files() {
    let addr = start(Some(scratch_dir())).await;

    for method in ["PUT", "DELETE"] {
        let raw = format!("{} /files/a.txt HTTP/1.1\r\n\r\n", method);
        let out = send(addr, raw.as_bytes()).await;
        assert_eq!(out, b"HTTP/1.1 405 Method Not Allowed\r\n\r\n".to_vec());
    }
}

#[tokio::test]
async fn test_files_without_directory() {
    let addr = start(None).await;

    let out = send(addr, b"GET /files/a.txt HTTP/1.1\r\n\r\n").await;

    assert_eq!(out, b"HTTP/1.1 404 Not Found\r\n\r\n".to_vec());
}

#[tokio::test]
async fn test_body_split_across_writes() {
    let dir = scratch_dir();
    let addr = start(Some(dir.clone())).await;

    let mut stream = TcpStream::connect(addr).await.unwrap();
    stream
        .write_all(b"POST /files/split.txt HTTP/1.1\r\nContent-Length: 11\r\n\r\nhello")
        .await
        .unwrap();
    stream.flush().await.unwrap();
    tokio::time::sleep(std::time::Duration::from_millis(20)).await;
    stream.write_all(b" world").await.unwrap();

    let mut out = Vec::new();
    stream.read_to_end(&mut out).await.unwrap();

    assert_eq!(out, b"HTTP/1.1 201 Created\r\n\r\n".to_vec());
    assert_eq!(std::fs::read(dir.join("split.txt")).unwrap(), b"hello world".to_vec());
}

#[tokio::test]
async fn test_bad_method_gets_no_response() {
    let addr = start(None).await;

    let out = send(addr, b"BREW /pot HTTP/1.1\r\n\r\n").await;

    assert!(out.is_empty());
}

#[tokio::test]
async fn test_empty_connection_is_closed_quietly() {
    let addr = start(None).await;

    let mut stream = TcpStream::connect(addr).await.unwrap();
    stream.shutdown().await.unwrap();
    let mut out = Vec::new();
    stream.read_to_end(&mut out).await.unwrap();

    assert!(out.is_empty());

    // The server keeps accepting afterwards
    let out = send(addr, b"GET / HTTP/1.1\r\n\r\n").await;
    assert_eq!(out, b"HTTP/1.1 200 OK\r\n\r\n".to_vec());
}

#[tokio::test]
async fn test_request_truncated_by_client_close() {
    let addr = start(None).await;

    let mut stream = TcpStream::connect(addr).await.unwrap();
    stream.write_all(b"GET /echo/hi HTTP/1.1\r\n").await.unwrap();
    stream.shutdown().await.unwrap();
    let mut out = Vec::new();
    stream.read_to_end(&mut out).await.unwrap();

    assert!(out.ends_with(b"\r\n\r\nhi"));
}

#[tokio::test]
async fn test_connections_are_served_concurrently() {
    let addr = start(None).await;

    // Leave one connection idle mid-request; others must still complete.
    let mut idle = TcpStream::connect(addr).await.unwrap();
    idle.write_all(b"GET / HTTP/1.1\r\n").await.unwrap();

    let out = send(addr, b"GET /echo/ok HTTP/1.1\r\n\r\n").await;
    assert!(out.ends_with(b"ok"));

    idle.write_all(b"\r\n").await.unwrap();
    let mut rest = Vec::new();
    idle.read_to_end(&mut rest).await.unwrap();
    assert_eq!(rest, b"HTTP/1.1 200 OK\r\n\r\n".to_vec());
}

#[tokio::test]
async fn test_oversized_head_closes_connection() {
    let addr = start(None).await;

    let mut stream = TcpStream::connect(addr).await.unwrap();
    let mut raw = b"GET / HTTP/1.1\r\nX-Filler: ".to_vec();
    raw.resize(MAX_HEAD_SIZE + 2048, b'a');
    let _ = stream.write_all(&raw).await;

    let mut out = Vec::new();
    let read = tokio::time::timeout(Duration::from_secs(5), stream.read_to_end(&mut out)).await;

    assert!(read.is_ok(), "server kept buffering an unterminated head");
    assert!(out.is_empty());
}

#[tokio::test]
async fn test_oversized_content_length_is_refused() {
    let addr = start(Some(scratch_dir())).await;

    let raw = format!(
        "POST /files/big.bin HTTP/1.1\r\nContent-Length: {}\r\n\r\nabc",
        MAX_BODY_SIZE + 1
    );
    let mut stream = TcpStream::connect(addr).await.unwrap();
    stream.write_all(raw.as_bytes()).await.unwrap();

    let mut out = Vec::new();
    let read = tokio::time::timeout(Duration::from_secs(5), stream.read_to_end(&mut out)).await;

    assert!(read.is_ok(), "server waited for an oversized body");
    assert!(out.is_empty());
}

/// Hands out queued accept results, then waits forever.
struct ScriptedAcceptor {
    queue: Mutex<VecDeque<std::io::Result<DuplexStream>>>,
}

impl Acceptor for ScriptedAcceptor {
    type Stream = DuplexStream;

    async fn accept(&self) -> std::io::Result<(DuplexStream, SocketAddr)> {
        let next = self.queue.lock().unwrap().pop_front();
        match next {
            Some(result) => result.map(|stream| (stream, "127.0.0.1:9".parse().unwrap())),
            None => std::future::pending().await,
        }
    }
}

#[tokio::test]
async fn test_accept_errors_do_not_stop_the_server() {
    let (client, server_side) = tokio::io::duplex(4096);
    let acceptor = ScriptedAcceptor {
        queue: Mutex::new(VecDeque::from([
            Err(std::io::Error::from_raw_os_error(24)),
            Err(std::io::Error::from(ErrorKind::ConnectionAborted)),
            Ok(server_side),
        ])),
    };
    let cfg = Config {
        max_connections: 1,
        ..Config::default()
    };

    let server = tokio::spawn(async move { serve_with(acceptor, &cfg).await });

    let mut client = client;
    client.write_all(b"GET /echo/alive HTTP/1.1\r\n\r\n").await.unwrap();
    let mut out = Vec::new();
    tokio::time::timeout(Duration::from_secs(5), client.read_to_end(&mut out))
        .await
        .unwrap()
        .unwrap();

    assert!(out.ends_with(b"\r\n\r\nalive"));
    assert!(!server.is_finished());
    server.abort();
}
