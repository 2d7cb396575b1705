// Fan-out of inbound payloads to every registered channel.

use crate::use_cases::registry::{ChannelId, ConnectionRegistry};
use axum::extract::ws::Utf8Bytes;
use std::str::FromStr;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::debug;

/// Whether a publisher that is also subscribed gets its own message back.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SelfDelivery {
    #[default]
    IncludeOrigin,
    ExcludeOrigin,
}

impl FromStr for SelfDelivery {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "include" | "include_origin" => Ok(SelfDelivery::IncludeOrigin),
            "exclude" | "exclude_origin" => Ok(SelfDelivery::ExcludeOrigin),
            other => Err(format!("unknown self delivery mode: {other}")),
        }
    }
}

/// Outcome of one `publish` call across its snapshot.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PublishReport {
    pub delivered: usize,
    pub failed: usize,
    pub skipped_origin: bool,
}

#[derive(Debug)]
pub struct Relay {
    registry: Arc<ConnectionRegistry>,
    self_delivery: SelfDelivery,
}

impl Relay {
    pub fn new(registry: Arc<ConnectionRegistry>, self_delivery: SelfDelivery) -> Self {
        Self {
            registry,
            self_delivery,
        }
    }

    /// Sends `payload` unmodified to every channel registered when the call starts.
    ///
    /// `origin` is the publishing channel, if the payload came from one. A failed send is
    /// counted and skipped; it neither stops the remaining deliveries nor unregisters the
    /// channel (the transport's disconnect path owns that).
    pub async fn publish(&self, origin: Option<ChannelId>, payload: Utf8Bytes) -> PublishReport {
        // Iterate a snapshot: sends may wait on queue space while membership changes.
        let recipients = self.registry.snapshot().await;
        let mut report = PublishReport::default();

        for channel in recipients {
            if self.self_delivery == SelfDelivery::ExcludeOrigin && Some(channel.id()) == origin {
                report.skipped_origin = true;
                continue;
            }

            match channel.send(payload.clone()).await {
                Ok(()) => report.delivered += 1,
                Err(err) => {
                    report.failed += 1;
                    debug!(channel_id = %channel.id(), error = %err, "relay send failed");
                }
            }
        }

        report
    }

    /// Like `publish`, but gives up as soon as `shutdown` turns true or its sender is
    /// dropped. Returns `None` when the publish was abandoned.
    pub async fn publish_until(
        &self,
        origin: Option<ChannelId>,
        payload: Utf8Bytes,
        shutdown: &mut watch::Receiver<bool>,
    ) -> Option<PublishReport> {
        tokio::select! {
            report = self.publish(origin, payload) => Some(report),
            _ = shutdown.wait_for(|stop| *stop) => None,
        }
    }
}
