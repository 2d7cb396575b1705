use crate::use_cases::SelfDelivery;
use std::{env, net::IpAddr, path::PathBuf, time::Duration};

// Runtime/server settings read from the environment (not fleet data).

pub fn http_port() -> u16 {
    env::var("TRACKER_SERVER_PORT")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(8000)
}

pub fn bind_addr() -> IpAddr {
    env::var("TRACKER_BIND_ADDR")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(IpAddr::from([127, 0, 0, 1]))
}

pub fn simulation_config_path() -> PathBuf {
    env::var("SIMULATION_CONFIG")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("simulation.toml"))
}

pub fn simulation_enabled() -> bool {
    env::var("SIMULATION_ENABLED")
        .map(|v| !matches!(v.trim().to_ascii_lowercase().as_str(), "0" | "false" | "no" | "off"))
        .unwrap_or(true)
}

pub fn self_delivery() -> SelfDelivery {
    match env::var("RELAY_SELF_DELIVERY") {
        Ok(value) => value.parse().unwrap_or_else(|err| {
            tracing::warn!(error = %err, "ignoring RELAY_SELF_DELIVERY; using include");
            SelfDelivery::IncludeOrigin
        }),
        Err(_) => SelfDelivery::IncludeOrigin,
    }
}

// Unset means the simulated fleet is not filtered against a roster.
pub fn roster_service_url() -> Option<String> {
    env::var("ROSTER_SERVICE_URL")
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

pub fn roster_timeout() -> Duration {
    let millis = env::var("ROSTER_TIMEOUT_MS")
        .ok()
        .and_then(|value| value.parse::<u64>().ok())
        .unwrap_or(1500);
    Duration::from_millis(millis)
}

// Relay endpoint the standalone simulator publishes to.
pub fn relay_url() -> String {
    env::var("RELAY_URL").unwrap_or_else(|_| "ws://127.0.0.1:8000/ws/locations".to_string())
}

pub const SUBSCRIBER_CHANNEL_CAPACITY: usize = 64;
pub const MAX_MESSAGE_BYTES: usize = 64 * 1024;
