// Shared helpers for booting a tracker server and talking to it over WebSockets.
#![allow(dead_code)]

use futures_util::{SinkExt, StreamExt};
use std::time::Duration;
use tokio::net::TcpStream;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async, tungstenite::Message};
use tracker_server::ServerSettings;

pub type Ws = WebSocketStream<MaybeTlsStream<TcpStream>>;

// Upper bound for any single wait in these tests.
pub const WAIT: Duration = Duration::from_secs(5);

// A server bound to an ephemeral port, stopped when dropped or via `stop`.
pub struct TestServer {
    pub ws_url: String,
    shutdown: Option<oneshot::Sender<()>>,
    handle: Option<JoinHandle<std::io::Result<()>>>,
}

impl TestServer {
    pub async fn stop(mut self) {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
        if let Some(handle) = self.handle.take() {
            let result = tokio::time::timeout(WAIT, handle)
                .await
                .expect("server should stop in time")
                .expect("server task");
            result.expect("server exited with error");
        }
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
    }
}

// Start a server on the current test runtime with the given settings.
pub async fn spawn_server(settings: ServerSettings) -> TestServer {
    // Bind to an ephemeral port to avoid collisions with local services.
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind ephemeral test port");
    let addr = listener.local_addr().expect("get local addr");
    let (tx, rx) = oneshot::channel::<()>();

    let handle = tokio::spawn(tracker_server::run_until(listener, settings, async move {
        let _ = rx.await;
    }));

    TestServer {
        ws_url: format!("ws://{addr}/ws/locations"),
        shutdown: Some(tx),
        handle: Some(handle),
    }
}

pub async fn connect(url: &str) -> Ws {
    let (ws, _) = tokio::time::timeout(WAIT, connect_async(url))
        .await
        .expect("connect timed out")
        .expect("websocket connect");
    ws
}

pub async fn send_text(ws: &mut Ws, text: &str) {
    ws.send(Message::text(text.to_string()))
        .await
        .expect("send text frame");
}

// Next text frame, skipping control frames. `None` on timeout or close.
pub async fn next_text(ws: &mut Ws, wait: Duration) -> Option<String> {
    let deadline = tokio::time::Instant::now() + wait;
    loop {
        let msg = tokio::time::timeout_at(deadline, ws.next()).await.ok()??.ok()?;
        match msg {
            Message::Text(_) => return msg.to_text().ok().map(str::to_string),
            Message::Close(_) => return None,
            _ => continue,
        }
    }
}

// Read frames until one equals `expected`; panics if it never shows up.
pub async fn wait_for(ws: &mut Ws, expected: &str) {
    let deadline = tokio::time::Instant::now() + WAIT;
    loop {
        let remaining = deadline.saturating_duration_since(tokio::time::Instant::now());
        match next_text(ws, remaining).await {
            Some(text) if text == expected => return,
            Some(_) => continue,
            None => panic!("did not receive {expected}"),
        }
    }
}

// Every text frame that arrives within `wait`.
pub async fn collect_for(ws: &mut Ws, wait: Duration) -> Vec<String> {
    let deadline = tokio::time::Instant::now() + wait;
    let mut out = Vec::new();
    loop {
        let remaining = deadline.saturating_duration_since(tokio::time::Instant::now());
        if remaining.is_zero() {
            return out;
        }
        match next_text(ws, remaining).await {
            Some(text) => out.push(text),
            None => return out,
        }
    }
}

// Connect and wait until the server has registered the socket, proven by receiving our
// own marker back (only valid when the server includes the origin).
pub async fn connect_registered(url: &str) -> Ws {
    let mut ws = connect(url).await;
    let marker = format!("marker-{}", uuid::Uuid::new_v4());
    send_text(&mut ws, &marker).await;
    wait_for(&mut ws, &marker).await;
    ws
}

pub fn position_json(bus_id: &str, lat: f64, lon: f64, route: &str) -> String {
    serde_json::json!({"bus_id": bus_id, "lat": lat, "lon": lon, "route": route}).to_string()
}
