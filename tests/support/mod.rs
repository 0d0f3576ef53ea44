// Shared helpers: boot a fresh ground per test and talk to it over WebSocket.
#![allow(dead_code)]

use std::sync::{Arc, OnceLock};
use std::time::Duration;

use futures::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio::time::timeout;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};

use pitch_sync::config::Config;
use pitch_sync::ws::protocol::{ClientMsg, ServerMsg};

pub type Client = WebSocketStream<MaybeTlsStream<TcpStream>>;

// Start a server with its own ground on an ephemeral port and return host:port.
//
// Each call gets a dedicated OS thread and runtime so the ground outlives the
// calling test's runtime and tests never share match state.
pub fn spawn_server() -> String {
    let published = Arc::new(OnceLock::<String>::new());
    let published_thread = Arc::clone(&published);

    std::thread::spawn(move || {
        let runtime = tokio::runtime::Runtime::new().expect("test runtime");
        runtime.block_on(async move {
            let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
                .await
                .expect("bind ephemeral test port");
            let addr = listener.local_addr().expect("get local addr");
            let _ = published_thread.set(addr.to_string());
            pitch_sync::run(listener, Config::default())
                .await
                .expect("server failed");
        });
    });

    let addr = loop {
        if let Some(addr) = published.get() {
            break addr.clone();
        }
        std::thread::sleep(Duration::from_millis(10));
    };

    for _ in 0..100 {
        if std::net::TcpStream::connect(&addr).is_ok() {
            return addr;
        }
        std::thread::sleep(Duration::from_millis(20));
    }
    panic!("server did not become ready in time");
}

pub async fn connect(addr: &str) -> Client {
    let (ws, _) = connect_async(format!("ws://{addr}/ws"))
        .await
        .expect("websocket connect");
    ws
}

pub async fn send(ws: &mut Client, msg: &ClientMsg) {
    let json = serde_json::to_string(msg).expect("serialize");
    ws.send(Message::Text(json)).await.expect("send");
}

/// Next server message, failing the test after two seconds of silence
pub async fn next(ws: &mut Client) -> ServerMsg {
    loop {
        let frame = timeout(Duration::from_secs(2), ws.next())
            .await
            .expect("timed out waiting for server message")
            .expect("stream ended")
            .expect("websocket error");
        if let Message::Text(text) = frame {
            return serde_json::from_str(&text).expect("parse server message");
        }
    }
}

/// Skip messages until one matches
pub async fn recv_until<F>(ws: &mut Client, mut pred: F) -> ServerMsg
where
    F: FnMut(&ServerMsg) -> bool,
{
    loop {
        let msg = next(ws).await;
        if pred(&msg) {
            return msg;
        }
    }
}

/// Connect and read the welcome; returns the assigned id
pub async fn connect_welcomed(addr: &str) -> (Client, uuid::Uuid) {
    let mut ws = connect(addr).await;
    match next(&mut ws).await {
        ServerMsg::Welcome { id, .. } => (ws, id),
        other => panic!("expected welcome, got {other:?}"),
    }
}

/// Plain HTTP GET returning the response body
pub async fn http_get(addr: &str, path: &str) -> String {
    use tokio::io::{AsyncReadExt, AsyncWriteExt};

    let mut stream = TcpStream::connect(addr).await.expect("tcp connect");
    let request = format!("GET {path} HTTP/1.1\r\nHost: {addr}\r\nConnection: close\r\n\r\n");
    stream.write_all(request.as_bytes()).await.expect("write request");

    let mut response = String::new();
    stream.read_to_string(&mut response).await.expect("read response");
    let (_, body) = response
        .split_once("\r\n\r\n")
        .expect("http response has a body");
    body.to_string()
}
