// Domain-level errors for motion setup and the service ports.

use std::fmt;

#[derive(Debug, Clone, PartialEq)]
pub enum WaypathError {
    TooFewPoints { len: usize },
    NonFiniteCoordinate { index: usize },
    InvalidSpeed(f64),
}

impl fmt::Display for WaypathError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WaypathError::TooFewPoints { len } => {
                write!(f, "waypath needs at least 2 points, got {len}")
            }
            WaypathError::NonFiniteCoordinate { index } => {
                write!(f, "waypath point {index} is not a finite coordinate")
            }
            WaypathError::InvalidSpeed(speed) => {
                write!(f, "speed must be finite and non-negative, got {speed}")
            }
        }
    }
}

impl std::error::Error for WaypathError {}

// Failure to hand a position to its destination.
#[derive(Debug)]
pub enum SinkError {
    Serialization(serde_json::Error),
    Closed,
    Transport(String),
}

impl fmt::Display for SinkError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SinkError::Serialization(err) => write!(f, "failed to serialize position: {err}"),
            SinkError::Closed => write!(f, "position sink closed"),
            SinkError::Transport(reason) => write!(f, "position transport error: {reason}"),
        }
    }
}

impl std::error::Error for SinkError {}

#[derive(Debug)]
pub enum RosterError {
    Unavailable(String),
    Upstream { status: u16 },
    Decode(String),
}

impl fmt::Display for RosterError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RosterError::Unavailable(reason) => write!(f, "roster unavailable: {reason}"),
            RosterError::Upstream { status } => write!(f, "roster upstream error {status}"),
            RosterError::Decode(reason) => write!(f, "roster response decode error: {reason}"),
        }
    }
}

impl std::error::Error for RosterError {}
