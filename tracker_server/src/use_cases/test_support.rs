use std::collections::HashSet;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::domain::{
    PositionMessage, PositionSink, RosterEntry, RosterError, RosterProvider, SinkError,
};

// Sink that records every accepted position and can be told to reject some vehicles.
#[derive(Default)]
pub(crate) struct RecordingSink {
    positions: Mutex<Vec<PositionMessage>>,
    failing: HashSet<String>,
}

impl RecordingSink {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn failing_for(mut self, vehicle_id: &str) -> Self {
        self.failing.insert(vehicle_id.to_string());
        self
    }

    pub(crate) fn recorded(&self) -> Vec<PositionMessage> {
        self.positions
            .lock()
            .expect("positions mutex poisoned")
            .clone()
    }
}

#[async_trait]
impl PositionSink for RecordingSink {
    async fn publish_position(&self, msg: &PositionMessage) -> Result<(), SinkError> {
        if self.failing.contains(&msg.vehicle_id) {
            return Err(SinkError::Closed);
        }

        let mut guard = self.positions.lock().expect("positions mutex poisoned");
        guard.push(msg.clone());
        Ok(())
    }
}

// Sink whose publish never completes, like a relay stuck on a full subscriber queue.
pub(crate) struct StalledSink;

#[async_trait]
impl PositionSink for StalledSink {
    async fn publish_position(&self, _msg: &PositionMessage) -> Result<(), SinkError> {
        std::future::pending().await
    }
}

// Roster stub returning a fixed list, or an outage.
pub(crate) struct StaticRoster {
    entries: Option<Vec<RosterEntry>>,
}

impl StaticRoster {
    pub(crate) fn with_vehicles(ids: &[&str]) -> Self {
        let entries = ids
            .iter()
            .map(|id| RosterEntry {
                vehicle_id: id.to_string(),
            })
            .collect();
        Self {
            entries: Some(entries),
        }
    }

    pub(crate) fn unavailable() -> Self {
        Self { entries: None }
    }
}

#[async_trait]
impl RosterProvider for StaticRoster {
    async fn list_vehicles(&self) -> Result<Vec<RosterEntry>, RosterError> {
        self.entries
            .clone()
            .ok_or_else(|| RosterError::Unavailable("connection refused".to_string()))
    }
}
