use async_trait::async_trait;

use crate::domain::errors::{RosterError, SinkError};
use crate::domain::position::PositionMessage;

// Destination for simulated positions. The scheduler depends on this trait, not on the
// relay or on a socket, so the same fleet can feed either.
#[async_trait]
pub trait PositionSink: Send + Sync {
    async fn publish_position(&self, msg: &PositionMessage) -> Result<(), SinkError>;
}

// One vehicle known to the roster service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RosterEntry {
    pub vehicle_id: String,
}

// Port for the external roster lookup, used only to seed the simulated fleet.
#[async_trait]
pub trait RosterProvider: Send + Sync {
    async fn list_vehicles(&self) -> Result<Vec<RosterEntry>, RosterError>;
}
