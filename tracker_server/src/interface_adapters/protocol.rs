// Wire DTOs for position updates and the roster service.
// The relay itself never parses inbound frames; these shapes are only used by the
// simulation sinks and the roster client.

use crate::domain::{PositionMessage, RosterEntry};
use serde::{Deserialize, Serialize};

/// Position update as it travels over the WebSocket.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PositionDto {
    pub bus_id: String,
    pub lat: f64,
    pub lon: f64,
    pub route: String,
}

impl From<&PositionMessage> for PositionDto {
    fn from(msg: &PositionMessage) -> Self {
        Self {
            bus_id: msg.vehicle_id.clone(),
            lat: msg.lat,
            lon: msg.lon,
            route: msg.route_label.clone(),
        }
    }
}

pub fn encode_position(msg: &PositionMessage) -> Result<String, serde_json::Error> {
    serde_json::to_string(&PositionDto::from(msg))
}

/// Vehicle record returned by the roster service's `GET /buses`. Only the id matters here;
/// driver, stops and status are ignored.
#[derive(Debug, Clone, Deserialize)]
pub struct RosterBusDto {
    pub bus_id: String,
}

impl From<RosterBusDto> for RosterEntry {
    fn from(dto: RosterBusDto) -> Self {
        Self {
            vehicle_id: dto.bus_id,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn position_uses_bus_tracking_field_names() {
        let msg = PositionMessage {
            vehicle_id: "KA-01-FA-1234".to_string(),
            lat: 12.5,
            lon: 77.25,
            route_label: "Rt 101".to_string(),
        };

        let value: serde_json::Value =
            serde_json::from_str(&encode_position(&msg).expect("encode")).expect("valid json");

        assert_eq!(
            value,
            json!({"bus_id": "KA-01-FA-1234", "lat": 12.5, "lon": 77.25, "route": "Rt 101"})
        );
    }

    #[test]
    fn roster_entry_keeps_only_the_bus_id() {
        let dto: RosterBusDto = serde_json::from_value(json!({
            "bus_id": "B1",
            "driver_name": "Asha",
            "route_stops": "A,B",
            "status": "offline"
        }))
        .expect("decode");

        let entry = RosterEntry::from(dto);

        assert_eq!(entry.vehicle_id, "B1");
    }
}
