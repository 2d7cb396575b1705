use crate::use_cases::{ConnectionRegistry, Relay};
use std::sync::Arc;
use tokio::sync::watch;

#[derive(Clone)]
pub struct AppState {
    // Open channels; only touched through register/unregister/snapshot.
    pub registry: Arc<ConnectionRegistry>,
    // Fan-out shared by socket publishers and the simulated fleet.
    pub relay: Arc<Relay>,
    // Flips to true when the server is stopping.
    pub shutdown: watch::Receiver<bool>,
    // Outbound queue depth per connection.
    pub channel_capacity: usize,
    pub max_message_bytes: usize,
}
