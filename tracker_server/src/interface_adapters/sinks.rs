// In-process sink: simulated positions enter the relay exactly like a publisher's frame.

use crate::domain::{PositionMessage, PositionSink, SinkError};
use crate::interface_adapters::protocol::encode_position;
use crate::use_cases::Relay;
use async_trait::async_trait;
use axum::extract::ws::Utf8Bytes;
use std::sync::Arc;

pub struct RelaySink {
    relay: Arc<Relay>,
}

impl RelaySink {
    pub fn new(relay: Arc<Relay>) -> Self {
        Self { relay }
    }
}

#[async_trait]
impl PositionSink for RelaySink {
    async fn publish_position(&self, msg: &PositionMessage) -> Result<(), SinkError> {
        let txt = encode_position(msg).map_err(SinkError::Serialization)?;
        // Per-channel failures are the relay's concern; the fleet only cares that the
        // position was handed over.
        self.relay.publish(None, Utf8Bytes::from(txt)).await;
        Ok(())
    }
}
