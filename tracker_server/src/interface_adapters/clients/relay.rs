use crate::domain::{PositionMessage, PositionSink, SinkError};
use crate::interface_adapters::protocol::encode_position;
use async_trait::async_trait;
use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio::sync::{Mutex, watch};
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::{self, Message};
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};
use tracing::{debug, info, warn};

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

// Publishes positions to a remote relay over its WebSocket endpoint.
pub struct RelayClient {
    sink: Mutex<SplitSink<WsStream, Message>>,
    reader: JoinHandle<()>,
    closed: watch::Receiver<bool>,
}

impl RelayClient {
    pub async fn connect(url: &str) -> Result<Self, tungstenite::Error> {
        let (stream, _response) = connect_async(url).await?;
        let (sink, stream) = stream.split();
        info!(%url, "connected to relay");
        let (closed_tx, closed_rx) = watch::channel(false);

        Ok(Self {
            sink: Mutex::new(sink),
            // The relay echoes every message to every member, including us.
            // Keep reading so our server-side queue never backs up the fan-out.
            reader: tokio::spawn(drain_inbound(stream, closed_tx)),
            closed: closed_rx,
        })
    }

    /// True once the relay closed the connection or the read side failed.
    pub fn is_closed(&self) -> bool {
        *self.closed.borrow()
    }

    /// Resolves when the relay closes the connection or the read side fails.
    pub async fn closed(&self) {
        let mut closed = self.closed.clone();
        let _ = closed.wait_for(|closed| *closed).await;
    }

    pub async fn close(self) {
        let mut sink = self.sink.lock().await;
        if let Err(err) = sink.close().await {
            debug!(error = %err, "relay close error");
        }
        self.reader.abort();
    }
}

async fn drain_inbound(mut stream: SplitStream<WsStream>, closed: watch::Sender<bool>) {
    let mut received: u64 = 0;
    while let Some(incoming) = stream.next().await {
        match incoming {
            Ok(Message::Close(_)) => break,
            Ok(_) => received += 1,
            Err(err) => {
                warn!(error = %err, "relay read error");
                break;
            }
        }
    }
    info!(received, "relay connection closed");
    let _ = closed.send(true);
}

#[async_trait]
impl PositionSink for RelayClient {
    async fn publish_position(&self, msg: &PositionMessage) -> Result<(), SinkError> {
        if self.is_closed() {
            return Err(SinkError::Closed);
        }

        let txt = encode_position(msg).map_err(SinkError::Serialization)?;
        let mut sink = self.sink.lock().await;
        sink.send(Message::text(txt))
            .await
            .map_err(|e| SinkError::Transport(e.to_string()))
    }
}
