//! Test fixtures shared by the integration tests.
//!
//! `TestServer` runs the real server binary on a fixed port and kills it on
//! drop. `WsClient` is a thin JSON wrapper over a tokio-tungstenite stream.

#![allow(dead_code)]

use std::{
    net::TcpStream,
    process::{Child, Command, Stdio},
    thread,
    time::{Duration, Instant},
};

use futures_util::{SinkExt, StreamExt};
use serde_json::Value;
use tokio::net::TcpStream as TokioTcpStream;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async, tungstenite::Message};

const STARTUP_TIMEOUT: Duration = Duration::from_secs(10);
const FRAME_TIMEOUT: Duration = Duration::from_secs(5);

pub struct TestServer {
    child: Child,
    port: u16,
}

impl TestServer {
    /// Spawn the server and block until it accepts TCP connections.
    pub fn start(port: u16) -> Self {
        let child = Command::new(env!("CARGO_BIN_EXE_parlor-server"))
            .args(["--host", "127.0.0.1", "--port", &port.to_string()])
            .env_remove("RUST_LOG")
            .env_remove("PARLOR_LOBBY_NAME")
            .env_remove("PARLOR_CASE_INSENSITIVE_ROOM_NAMES")
            .env("PARLOR_LOG_LEVEL", "warn")
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .expect("Failed to spawn server binary");
        let server = Self { child, port };

        let deadline = Instant::now() + STARTUP_TIMEOUT;
        while TcpStream::connect(("127.0.0.1", port)).is_err() {
            assert!(
                Instant::now() < deadline,
                "Server did not start on port {port}"
            );
            thread::sleep(Duration::from_millis(50));
        }
        server
    }

    pub fn base_url(&self) -> String {
        format!("http://127.0.0.1:{}", self.port)
    }

    pub fn ws_url(&self) -> String {
        format!("ws://127.0.0.1:{}/ws", self.port)
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        let _ = self.child.kill();
        let _ = self.child.wait();
    }
}

pub struct WsClient {
    stream: WebSocketStream<MaybeTlsStream<TokioTcpStream>>,
}

impl WsClient {
    /// Connect with a display name already chosen and wait until the lobby
    /// has taken the session in.
    pub async fn connect_as(server: &TestServer, client_name: &str) -> Self {
        let url = format!("{}?client_name={}", server.ws_url(), client_name);
        let mut client = Self::connect_url(&url).await;
        client.expect_room_changed("Lobby").await;
        client
    }

    /// Connect without a name.
    pub async fn connect_anonymous(server: &TestServer) -> Self {
        let mut client = Self::connect_url(&server.ws_url()).await;
        client.expect_room_changed("Lobby").await;
        client
    }

    async fn connect_url(url: &str) -> Self {
        let (stream, _) = connect_async(url)
            .await
            .expect("Failed to connect WebSocket");
        Self { stream }
    }

    pub async fn send_json(&mut self, value: Value) {
        self.stream
            .send(Message::Text(value.to_string().into()))
            .await
            .expect("Failed to send frame");
    }

    pub async fn chat(&mut self, content: &str) {
        self.send_json(serde_json::json!({"type": "chat", "content": content}))
            .await;
    }

    /// Read frames until one satisfies `predicate`, skipping the rest.
    pub async fn expect_frame(&mut self, predicate: impl Fn(&Value) -> bool) -> Value {
        let deadline = tokio::time::Instant::now() + FRAME_TIMEOUT;
        loop {
            let msg = tokio::time::timeout_at(deadline, self.stream.next())
                .await
                .expect("Timed out waiting for frame")
                .expect("Stream closed")
                .expect("WebSocket error");
            if let Message::Text(text) = msg {
                let value: Value = serde_json::from_str(text.as_str()).expect("Invalid JSON");
                if predicate(&value) {
                    return value;
                }
            }
        }
    }

    pub async fn expect_room_changed(&mut self, room_name: &str) -> Value {
        self.expect_frame(|v| v["type"] == "room-changed" && v["room_name"] == room_name)
            .await
    }

    pub async fn expect_chat(&mut self, from: &str, content: &str) -> Value {
        self.expect_frame(|v| v["type"] == "chat" && v["from"] == from && v["content"] == content)
            .await
    }
}
