// Position report for one vehicle at one instant.

#[derive(Debug, Clone, PartialEq)]
pub struct PositionMessage {
    pub vehicle_id: String,
    pub lat: f64,
    pub lon: f64,
    pub route_label: String,
}
