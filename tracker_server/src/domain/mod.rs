// Domain layer: motion rules, position records and service ports.

pub mod errors;
pub mod motion;
pub mod ports;
pub mod position;

pub use errors::{RosterError, SinkError, WaypathError};
pub use motion::{Coord, MotionState, Waypath, speed_from_kmh};
pub use ports::{PositionSink, RosterEntry, RosterProvider};
pub use position::PositionMessage;
