//! Loopback tests for the listening socket and the per-connection handler.

use std::net::{Ipv4Addr, SocketAddr};

use courier::config::ParserConfig;
use courier::http::connection::HttpRequestConnection;
use courier::http::response::StatusCode;
use courier::server::handler;
use courier::server::listener::ListeningSocket;
use courier::{HttpError, SocketError};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;

fn loopback(socket: &ListeningSocket) -> SocketAddr {
    let port = socket.local_addr().unwrap().port();
    SocketAddr::from((Ipv4Addr::LOCALHOST, port))
}

async fn roundtrip(addr: SocketAddr, request: &[u8]) -> String {
    let mut client = TcpStream::connect(addr).await.unwrap();
    client.write_all(request).await.unwrap();
    let mut response = String::new();
    client.read_to_string(&mut response).await.unwrap();
    response
}

#[tokio::test]
async fn test_listener_binds_all_interfaces() {
    let socket = ListeningSocket::create(0, 16).unwrap();
    let addr = socket.local_addr().unwrap();

    assert!(addr.ip().is_unspecified());
    assert_ne!(addr.port(), 0);
}

#[tokio::test]
async fn test_listener_accepts_and_serves_request() {
    let socket = ListeningSocket::create(0, 16).unwrap();
    let addr = loopback(&socket);

    let server = tokio::spawn(async move {
        let conn = socket.accept().await.unwrap();
        let mut http = HttpRequestConnection::new(conn, &ParserConfig::default())
            .await
            .unwrap();
        let reply = format!("{} {} {}", http.method(), http.url(), http.body_string().unwrap());
        http.send_response(reply, StatusCode::Ok, &[("Content-Type", "text/plain")])
            .await
            .unwrap();
        http.close().await.unwrap();
    });

    let response = roundtrip(
        addr,
        b"POST /echo HTTP/1.1\r\nHost: localhost\r\nContent-Length: 5\r\n\r\nhello",
    )
    .await;
    server.await.unwrap();

    assert!(response.starts_with("HTTP/1.1 200 OK\r\n"));
    assert!(response.contains("Content-Length: 16\r\n"));
    assert!(response.ends_with("\r\n\r\nPOST /echo hello"));
}

#[tokio::test]
async fn test_handler_echoes_request() {
    let socket = ListeningSocket::create(0, 16).unwrap();
    let addr = loopback(&socket);

    let server = tokio::spawn(async move {
        let (conn, peer) = socket.accept_with_peer().await.unwrap();
        assert!(peer.ip().is_loopback());
        handler::serve(conn, &ParserConfig::default()).await
    });

    let response = roundtrip(addr, b"GET /hello HTTP/1.1\r\nHost: x\r\n\r\n").await;
    server.await.unwrap().unwrap();

    assert!(response.starts_with("HTTP/1.1 200 OK\r\n"));
    assert!(response.contains("Content-Type: text/plain\r\n"));
    assert!(response.ends_with("\r\n\r\nGET /hello\n"));
}

#[tokio::test]
async fn test_handler_reports_client_hangup() {
    let socket = ListeningSocket::create(0, 16).unwrap();
    let addr = loopback(&socket);

    let server = tokio::spawn(async move {
        let conn = socket.accept().await.unwrap();
        handler::serve(conn, &ParserConfig::default()).await
    });

    let mut client = TcpStream::connect(addr).await.unwrap();
    client.write_all(b"GET /partial HTTP/1.1\r\nHo").await.unwrap();
    drop(client);

    let result = server.await.unwrap();
    assert!(matches!(result, Err(HttpError::IncompleteRequest { .. })));
}

#[tokio::test]
async fn test_listener_serves_connections_independently() {
    let socket = ListeningSocket::create(0, 16).unwrap();
    let addr = loopback(&socket);

    let server = tokio::spawn(async move {
        let mut workers = Vec::new();
        for _ in 0..4 {
            let conn = socket.accept().await.unwrap();
            workers.push(tokio::spawn(async move {
                handler::serve(conn, &ParserConfig::default()).await
            }));
        }
        for worker in workers {
            worker.await.unwrap().unwrap();
        }
    });

    let mut clients = Vec::new();
    for i in 0..4 {
        clients.push(tokio::spawn(async move {
            let request = format!("GET /client/{i} HTTP/1.1\r\n\r\n");
            roundtrip(addr, request.as_bytes()).await
        }));
    }
    for (i, client) in clients.into_iter().enumerate() {
        let response = client.await.unwrap();
        assert!(response.ends_with(&format!("GET /client/{i}\n")));
    }
    server.await.unwrap();
}

#[tokio::test]
async fn test_bind_conflict_reports_bind_error() {
    let std_listener = std::net::TcpListener::bind((Ipv4Addr::UNSPECIFIED, 0)).unwrap();
    let port = std_listener.local_addr().unwrap().port();

    let result = ListeningSocket::create(port, 16);

    // SO_REUSEADDR does not allow two sockets to listen on one port.
    assert!(matches!(
        result,
        Err(SocketError::Bind(_)) | Err(SocketError::Listen(_))
    ));
}
