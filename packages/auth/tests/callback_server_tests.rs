// ABOUTME: Integration tests for the loopback callback server
// ABOUTME: Drives the relay page and token redirect over real TCP connections

use std::net::SocketAddr;

use streamline_auth::{AccessToken, AuthOutcome, CallbackServer};
use tokio::{
    io::{AsyncReadExt, AsyncWriteExt},
    net::{TcpListener, TcpStream},
};

/// Bind the server on an ephemeral port and serve in the background
async fn start_server() -> (SocketAddr, tokio::task::JoinHandle<AuthOutcome>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let handle = tokio::spawn(async move { CallbackServer::serve(listener).await.unwrap() });
    (addr, handle)
}

/// Send a bare GET and return the raw response
async fn get(addr: SocketAddr, target: &str) -> String {
    let mut stream = TcpStream::connect(addr).await.unwrap();
    let request = format!("GET {} HTTP/1.1\r\nHost: localhost\r\n\r\n", target);
    stream.write_all(request.as_bytes()).await.unwrap();

    let mut response = String::new();
    stream.read_to_string(&mut response).await.unwrap();
    response
}

#[tokio::test]
async fn test_relay_then_token() {
    let (addr, handle) = start_server().await;

    let relay = get(addr, "/auth/callback").await;
    assert!(relay.starts_with("HTTP/1.1 200 OK"));
    assert!(relay.contains("window.location.hash"));
    assert!(relay.contains("/auth/token?"));

    let done = get(
        addr,
        "/auth/token?access_token=tok1&scope=openid&state=xyz789&token_type=bearer",
    )
    .await;
    assert!(done.starts_with("HTTP/1.1 200 OK"));

    match handle.await.unwrap() {
        AuthOutcome::Success(params) => {
            assert_eq!(params.access_token, Some(AccessToken::new("tok1")));
            assert_eq!(params.state.as_deref(), Some("xyz789"));
            assert!(params.error.is_none());
        }
        other => panic!("unexpected outcome: {:?}", other),
    }
}

#[tokio::test]
async fn test_denial_in_query_resolves_immediately() {
    let (addr, handle) = start_server().await;

    let response = get(
        addr,
        "/auth/callback?error=access_denied&error_description=The+user+denied+you+access&state=abc",
    )
    .await;
    assert!(response.starts_with("HTTP/1.1 400 Bad Request"));
    assert!(response.contains("The user denied you access"));

    match handle.await.unwrap() {
        AuthOutcome::Success(params) => assert!(params.is_access_denied()),
        other => panic!("unexpected outcome: {:?}", other),
    }
}

#[tokio::test]
async fn test_unknown_paths_are_ignored() {
    let (addr, handle) = start_server().await;

    let not_found = get(addr, "/favicon.ico").await;
    assert!(not_found.starts_with("HTTP/1.1 404 Not Found"));
    assert!(!handle.is_finished());

    get(addr, "/auth/token?access_token=tok1&state=s").await;
    assert!(matches!(handle.await.unwrap(), AuthOutcome::Success(_)));
}

#[tokio::test]
async fn test_bare_relay_request_keeps_waiting() {
    let (addr, handle) = start_server().await;

    let response = get(addr, "/auth/token").await;
    assert!(response.starts_with("HTTP/1.1 404 Not Found"));
    let response = get(addr, "/auth/token?").await;
    assert!(response.starts_with("HTTP/1.1 404 Not Found"));
    assert!(!handle.is_finished());

    get(addr, "/auth/token?access_token=tok1&state=s").await;
    match handle.await.unwrap() {
        AuthOutcome::Success(params) => {
            assert_eq!(params.access_token, Some(AccessToken::new("tok1")));
        }
        other => panic!("unexpected outcome: {:?}", other),
    }
}
