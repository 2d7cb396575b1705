use crate::interface_adapters::state::AppState;
use crate::use_cases::{ChannelHandle, ChannelId, ConnectionRegistry, Relay};

use axum::{
    extract::{
        State,
        ws::{CloseFrame, Message, Utf8Bytes, WebSocket, WebSocketUpgrade, close_code},
    },
    response::IntoResponse,
};
use futures::stream::{SplitSink, SplitStream};
use futures::{SinkExt, StreamExt};
use std::{
    sync::Arc,
    time::{Duration, Instant},
};
use tokio::sync::{mpsc, watch};
use tokio::time::timeout;
use tracing::{Instrument, debug, info, info_span, warn};

#[derive(Debug)]
enum NetError {
    // Categorizes connection lifecycle failures so the reader loop can log them.
    #[allow(dead_code)]
    Ws(axum::Error),
}

impl From<axum::Error> for NetError {
    fn from(e: axum::Error) -> Self {
        NetError::Ws(e)
    }
}

enum LoopControl {
    Continue,
    Disconnect,
}

const LOG_THROTTLE: Duration = Duration::from_secs(2);
// Time allowed for the writer to flush queued frames after the reader stops.
const WRITER_DRAIN_TIMEOUT: Duration = Duration::from_secs(1);

fn should_log(last: &mut Instant) -> bool {
    if last.elapsed() >= LOG_THROTTLE {
        *last = Instant::now();
        true
    } else {
        false
    }
}

pub async fn ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    ws.max_message_size(state.max_message_bytes)
        .on_upgrade(move |socket| handle_socket(socket, state))
}

#[derive(Debug, Default)]
struct ConnStats {
    msgs_in: u64,
    bytes_in: u64,
    published_to: u64,
    publish_failures: u64,
}

#[derive(Debug, Default)]
struct WriterStats {
    msgs_out: u64,
    bytes_out: u64,
}

async fn handle_socket(socket: WebSocket, state: Arc<AppState>) {
    // Every connection is both a potential publisher and a subscriber.
    let (queue_tx, queue_rx) = mpsc::channel::<Utf8Bytes>(state.channel_capacity);
    let channel = ChannelHandle::new(queue_tx);
    let channel_id = channel.id();
    let span = info_span!("conn", channel_id = channel_id.get());

    async move {
        let (ws_tx, ws_rx) = socket.split();
        let (close_tx, close_rx) = watch::channel::<Option<CloseFrame>>(None);
        let writer = tokio::spawn(write_loop(ws_tx, queue_rx, close_rx).in_current_span());

        state.registry.register(channel).await;
        let members = state.registry.member_count().await;
        info!(members, "client connected");

        let stats = read_loop(
            ws_rx,
            channel_id,
            &state.relay,
            state.shutdown.clone(),
            &close_tx,
        )
        .await;

        disconnect_cleanup(channel_id, &state.registry, writer, stats).await;
    }
    .instrument(span)
    .await
}

async fn read_loop(
    mut ws_rx: SplitStream<WebSocket>,
    channel_id: ChannelId,
    relay: &Relay,
    mut shutdown: watch::Receiver<bool>,
    close_tx: &watch::Sender<Option<CloseFrame>>,
) -> ConnStats {
    let mut stats = ConnStats::default();
    let mut last_failure_log = Instant::now() - LOG_THROTTLE;

    loop {
        if *shutdown.borrow() {
            close_going_away(close_tx);
            break;
        }

        let control = tokio::select! {
            incoming = ws_rx.next() => {
                let mut inbound = Inbound {
                    channel_id,
                    relay,
                    stats: &mut stats,
                    last_failure_log: &mut last_failure_log,
                    shutdown: &mut shutdown,
                    close_tx,
                };
                inbound.handle(incoming).await
            }
            changed = shutdown.changed() => {
                if changed.is_err() {
                    // Shutdown sender gone: treat like a shutdown request.
                    close_going_away(close_tx);
                    LoopControl::Disconnect
                } else {
                    LoopControl::Continue
                }
            }
        };

        if let LoopControl::Disconnect = control {
            break;
        }
    }

    stats
}

fn close_going_away(close_tx: &watch::Sender<Option<CloseFrame>>) {
    let _ = close_tx.send(Some(CloseFrame {
        code: close_code::AWAY,
        reason: "server shutting down".into(),
    }));
}

// Per-frame view of the reader's state.
struct Inbound<'a> {
    channel_id: ChannelId,
    relay: &'a Relay,
    stats: &'a mut ConnStats,
    last_failure_log: &'a mut Instant,
    shutdown: &'a mut watch::Receiver<bool>,
    close_tx: &'a watch::Sender<Option<CloseFrame>>,
}

impl Inbound<'_> {
    async fn handle(&mut self, incoming: Option<Result<Message, axum::Error>>) -> LoopControl {
        match incoming {
            Some(Ok(msg)) => match msg {
                Message::Text(text) => {
                    self.stats.msgs_in += 1;
                    self.stats.bytes_in += text.len() as u64;

                    // Relayed verbatim; the payload is never parsed here.
                    let Some(report) = self
                        .relay
                        .publish_until(Some(self.channel_id), text, self.shutdown)
                        .await
                    else {
                        close_going_away(self.close_tx);
                        return LoopControl::Disconnect;
                    };
                    self.stats.published_to += report.delivered as u64;
                    self.stats.publish_failures += report.failed as u64;
                    if report.failed > 0 && should_log(self.last_failure_log) {
                        warn!(
                            delivered = report.delivered,
                            failed = report.failed,
                            "some subscribers did not accept the update"
                        );
                    }
                    LoopControl::Continue
                }
                Message::Binary(_) => {
                    let _ = self.close_tx.send(Some(CloseFrame {
                        code: close_code::UNSUPPORTED,
                        reason: "binary messages not supported".into(),
                    }));
                    LoopControl::Disconnect
                }
                Message::Ping(_) | Message::Pong(_) => LoopControl::Continue,
                Message::Close(_) => LoopControl::Disconnect,
            },
            Some(Err(e)) => {
                warn!(error = ?NetError::from(e), "websocket recv error");
                LoopControl::Disconnect
            }
            None => {
                info!("websocket closed");
                LoopControl::Disconnect
            }
        }
    }
}

// Drains this channel's queue into the socket. Stops when the socket rejects a frame, when
// every queue sender is dropped, or when the reader asks for a close frame.
async fn write_loop(
    mut ws_tx: SplitSink<WebSocket, Message>,
    mut queue_rx: mpsc::Receiver<Utf8Bytes>,
    mut close_rx: watch::Receiver<Option<CloseFrame>>,
) -> WriterStats {
    let mut stats = WriterStats::default();

    loop {
        tokio::select! {
            next = queue_rx.recv() => {
                let Some(bytes) = next else { break };
                let len = bytes.len() as u64;
                if let Err(err) = ws_tx.send(Message::Text(bytes)).await {
                    // Relay sends to this channel fail from here on; the reader handles removal.
                    debug!(error = ?NetError::from(err), "failed to forward update");
                    return stats;
                }
                stats.msgs_out += 1;
                stats.bytes_out += len;
            }
            changed = close_rx.changed() => {
                if changed.is_ok() {
                    let frame = close_rx.borrow_and_update().clone();
                    if let Some(frame) = frame {
                        let _ = ws_tx.send(Message::Close(Some(frame))).await;
                    }
                }
                break;
            }
        }
    }

    if let Err(err) = ws_tx.close().await {
        debug!(error = ?NetError::from(err), "socket close error");
    }
    stats
}

async fn disconnect_cleanup(
    channel_id: ChannelId,
    registry: &ConnectionRegistry,
    mut writer: tokio::task::JoinHandle<WriterStats>,
    stats: ConnStats,
) {
    registry.unregister(channel_id).await;

    // With the registry entry gone the writer ends once in-flight publishes release their
    // handles, or right away if the reader requested a close frame.
    let writer_stats = match timeout(WRITER_DRAIN_TIMEOUT, &mut writer).await {
        Ok(Ok(stats)) => stats,
        Ok(Err(err)) => {
            warn!(error = %err, "writer task failed");
            WriterStats::default()
        }
        Err(_) => {
            writer.abort();
            debug!("writer did not finish in time");
            WriterStats::default()
        }
    };

    debug!(
        msgs_in = stats.msgs_in,
        bytes_in = stats.bytes_in,
        published_to = stats.published_to,
        publish_failures = stats.publish_failures,
        msgs_out = writer_stats.msgs_out,
        bytes_out = writer_stats.bytes_out,
        "connection stats"
    );
    info!("client disconnected");
}
