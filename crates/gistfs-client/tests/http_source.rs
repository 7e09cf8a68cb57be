//! Tests for `HttpGistSource` against a local one-shot HTTP server.

use gistfs_client::HttpGistSource;
use gistfs_core::{FsConfig, GistSource, Owner};
use std::net::SocketAddr;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

const LISTING: &str = r#"[
  {
    "id": "aa5a315d61ae9438b18d",
    "files": {
      "notes.txt": {
        "filename": "notes.txt",
        "raw_url": "https://gist.githubusercontent.com/alice/aa5a/raw/notes.txt",
        "size": 17
      }
    }
  },
  {
    "id": "bb21",
    "files": {
      "a.rs": { "raw_url": "https://example.invalid/a.rs", "size": 3 },
      "b.rs": { "raw_url": "https://example.invalid/b.rs", "size": 4 }
    }
  }
]"#;

/// Accepts a single connection, answers it with `status` and `body`, and
/// hands back the raw request head.
async fn serve_once(status: &'static str, body: Vec<u8>) -> (SocketAddr, JoinHandle<String>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let handle = tokio::spawn(async move {
        let (mut stream, _) = listener.accept().await.unwrap();

        let mut request = Vec::new();
        let mut buf = [0u8; 1024];
        while !request.windows(4).any(|w| w == b"\r\n\r\n") {
            let n = stream.read(&mut buf).await.unwrap();
            if n == 0 {
                break;
            }
            request.extend_from_slice(&buf[..n]);
        }

        let head = format!(
            "HTTP/1.1 {status}\r\ncontent-length: {}\r\nconnection: close\r\n\r\n",
            body.len()
        );
        stream.write_all(head.as_bytes()).await.unwrap();
        stream.write_all(&body).await.unwrap();
        stream.shutdown().await.unwrap();

        String::from_utf8_lossy(&request).into_owned()
    });

    (addr, handle)
}

fn config_for(addr: SocketAddr) -> FsConfig {
    FsConfig::builder()
        .endpoint(format!("http://{addr}/users/{{owner}}/gists"))
        .user_agent("gistfs-test")
        .request_timeout_secs(2)
        .build()
}

#[tokio::test]
async fn test_fetch_listing_decodes_collections() {
    let (addr, server) = serve_once("200 OK", LISTING.as_bytes().to_vec()).await;
    let source = HttpGistSource::new(&config_for(addr)).unwrap();

    let listing = source.fetch_listing(&Owner::new("alice")).await.unwrap();
    assert_eq!(listing.len(), 2);
    assert_eq!(listing[0].id, "aa5a315d61ae9438b18d");
    assert_eq!(listing[0].files["notes.txt"].size, 17);
    assert_eq!(
        listing[0].files["notes.txt"].url,
        "https://gist.githubusercontent.com/alice/aa5a/raw/notes.txt"
    );
    assert_eq!(listing[1].files.len(), 2);

    let request = server.await.unwrap().to_lowercase();
    assert!(request.starts_with("get /users/alice/gists http/1.1"));
    assert!(request.contains("accept: application/vnd.github+json"));
    assert!(request.contains("user-agent: gistfs-test"));
}

#[tokio::test]
async fn test_fetch_listing_encodes_owner_segment() {
    let (addr, server) = serve_once("200 OK", b"[]".to_vec()).await;
    let source = HttpGistSource::new(&config_for(addr)).unwrap();

    let listing = source.fetch_listing(&Owner::new("a?b")).await.unwrap();
    assert!(listing.is_empty());

    let request = server.await.unwrap();
    assert!(request.starts_with("GET /users/a%3Fb/gists HTTP/1.1"));
}

#[tokio::test]
async fn test_fetch_listing_empty() {
    let (addr, _server) = serve_once("200 OK", b"[]".to_vec()).await;
    let source = HttpGistSource::new(&config_for(addr)).unwrap();

    let listing = source.fetch_listing(&Owner::new("nobody")).await.unwrap();
    assert!(listing.is_empty());
}

#[tokio::test]
async fn test_fetch_listing_error_status() {
    let (addr, _server) = serve_once("404 Not Found", br#"{"message":"Not Found"}"#.to_vec()).await;
    let source = HttpGistSource::new(&config_for(addr)).unwrap();

    let err = source.fetch_listing(&Owner::new("ghost")).await.unwrap_err();
    assert!(err.is_remote_error());
    assert!(err.to_string().contains("/users/ghost/gists"));
}

#[tokio::test]
async fn test_fetch_listing_malformed_body() {
    let (addr, _server) = serve_once("200 OK", b"{\"not\": \"a list\"}".to_vec()).await;
    let source = HttpGistSource::new(&config_for(addr)).unwrap();

    let err = source.fetch_listing(&Owner::new("alice")).await.unwrap_err();
    assert!(err.is_serialization_error());
}

#[tokio::test]
async fn test_fetch_content_returns_raw_bytes() {
    let (addr, server) = serve_once("200 OK", b"Hey there\nYo man\n".to_vec()).await;
    let source = HttpGistSource::new(&config_for(addr)).unwrap();

    let body = source
        .fetch_content(&format!("http://{addr}/alice/raw/notes.txt"))
        .await
        .unwrap();
    assert_eq!(body, b"Hey there\nYo man\n");

    let request = server.await.unwrap().to_lowercase();
    assert!(request.starts_with("get /alice/raw/notes.txt http/1.1"));
    assert!(!request.contains("application/vnd.github+json"));
}

#[tokio::test]
async fn test_fetch_content_error_status() {
    let (addr, _server) = serve_once("500 Internal Server Error", Vec::new()).await;
    let source = HttpGistSource::new(&config_for(addr)).unwrap();

    let err = source
        .fetch_content(&format!("http://{addr}/raw"))
        .await
        .unwrap_err();
    assert!(err.is_remote_error());
}

#[tokio::test]
async fn test_connection_refused_is_remote_error() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let source = HttpGistSource::new(&config_for(addr)).unwrap();
    let err = source.fetch_listing(&Owner::new("alice")).await.unwrap_err();
    assert!(err.is_remote_error());
}

#[tokio::test]
async fn test_request_timeout() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    // Accept and then stay silent.
    let _server = tokio::spawn(async move {
        let (stream, _) = listener.accept().await.unwrap();
        tokio::time::sleep(Duration::from_secs(10)).await;
        drop(stream);
    });

    let config = FsConfig::builder()
        .endpoint(format!("http://{addr}/users/{{owner}}/gists"))
        .request_timeout_secs(1)
        .build();
    let source = HttpGistSource::new(&config).unwrap();

    let err = source.fetch_listing(&Owner::new("alice")).await.unwrap_err();
    assert!(err.is_remote_error());
}
