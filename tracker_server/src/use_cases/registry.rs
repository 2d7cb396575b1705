// Registry of open subscriber channels.

use axum::extract::ws::Utf8Bytes;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::{RwLock, mpsc};

/// Process-unique channel identity. Ids only grow, so ordering by id is registration order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ChannelId(u64);

impl ChannelId {
    fn next() -> Self {
        static NEXT_ID: AtomicU64 = AtomicU64::new(1);
        Self(NEXT_ID.fetch_add(1, Ordering::Relaxed))
    }

    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ChannelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The outbound queue for this channel is gone (its writer stopped).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChannelClosed;

impl fmt::Display for ChannelClosed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "channel closed")
    }
}

impl std::error::Error for ChannelClosed {}

/// Handle to one connected endpoint's outbound queue.
///
/// Clones refer to the same channel and compare equal; handles created separately never do.
#[derive(Debug, Clone)]
pub struct ChannelHandle {
    id: ChannelId,
    tx: mpsc::Sender<Utf8Bytes>,
}

impl ChannelHandle {
    pub fn new(tx: mpsc::Sender<Utf8Bytes>) -> Self {
        Self {
            id: ChannelId::next(),
            tx,
        }
    }

    pub fn id(&self) -> ChannelId {
        self.id
    }

    /// Queues a payload for this channel, waiting for buffer space if the queue is full.
    pub async fn send(&self, payload: Utf8Bytes) -> Result<(), ChannelClosed> {
        self.tx.send(payload).await.map_err(|_| ChannelClosed)
    }
}

impl PartialEq for ChannelHandle {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for ChannelHandle {}

/// Owns the active channel set. Callers only see point-in-time snapshots.
#[derive(Debug, Default)]
pub struct ConnectionRegistry {
    channels: RwLock<BTreeMap<ChannelId, ChannelHandle>>,
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a channel. Registering the same channel twice keeps a single entry.
    pub async fn register(&self, channel: ChannelHandle) {
        let mut channels = self.channels.write().await;
        channels.insert(channel.id(), channel);
    }

    /// Removes a channel if present. Returns whether anything was removed.
    pub async fn unregister(&self, id: ChannelId) -> bool {
        let mut channels = self.channels.write().await;
        channels.remove(&id).is_some()
    }

    /// Members at the instant of the call, in registration order.
    pub async fn snapshot(&self) -> Vec<ChannelHandle> {
        let channels = self.channels.read().await;
        channels.values().cloned().collect()
    }

    pub async fn contains(&self, id: ChannelId) -> bool {
        self.channels.read().await.contains_key(&id)
    }

    pub async fn member_count(&self) -> usize {
        self.channels.read().await.len()
    }
}
