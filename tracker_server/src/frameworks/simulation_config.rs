// TOML description of the simulated fleet, loaded at startup.

use crate::domain::{Coord, MotionState, Waypath, WaypathError, speed_from_kmh};
use crate::use_cases::{SimulationSettings, VehicleSpec};
use serde::Deserialize;
use std::{fmt, path::Path, time::Duration};

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SimulationFile {
    #[serde(default = "default_tick_interval_ms")]
    pub tick_interval_ms: u64,
    #[serde(default = "default_tick_dt_seconds")]
    pub tick_dt_seconds: f64,
    #[serde(default)]
    pub vehicles: Vec<VehicleEntry>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct VehicleEntry {
    pub vehicle_id: String,
    pub route_label: String,
    // Exactly one of the two speeds must be set.
    #[serde(default)]
    pub speed_kmh: Option<f64>,
    #[serde(default)]
    pub speed_deg_per_sec: Option<f64>,
    // [lat, lon] pairs.
    pub waypoints: Vec<[f64; 2]>,
}

fn default_tick_interval_ms() -> u64 {
    1000
}

fn default_tick_dt_seconds() -> f64 {
    1.0
}

/// Validated fleet ready for the scheduler.
#[derive(Debug, Clone)]
pub struct SimulationConfig {
    pub settings: SimulationSettings,
    pub vehicles: Vec<VehicleSpec>,
}

#[derive(Debug)]
pub enum SimulationConfigError {
    Io(std::io::Error),
    Parse(toml::de::Error),
    InvalidTick(String),
    InvalidVehicle { vehicle_id: String, reason: String },
}

impl fmt::Display for SimulationConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SimulationConfigError::Io(err) => {
                write!(f, "failed to read simulation config: {err}")
            }
            SimulationConfigError::Parse(err) => write!(f, "invalid simulation config: {err}"),
            SimulationConfigError::InvalidTick(reason) => {
                write!(f, "invalid tick setting: {reason}")
            }
            SimulationConfigError::InvalidVehicle { vehicle_id, reason } => {
                write!(f, "invalid vehicle {vehicle_id}: {reason}")
            }
        }
    }
}

impl std::error::Error for SimulationConfigError {}

impl SimulationConfig {
    pub fn load(path: &Path) -> Result<Self, SimulationConfigError> {
        let text = std::fs::read_to_string(path).map_err(SimulationConfigError::Io)?;
        Self::from_toml(&text)
    }

    pub fn from_toml(text: &str) -> Result<Self, SimulationConfigError> {
        let file: SimulationFile = toml::from_str(text).map_err(SimulationConfigError::Parse)?;
        file.try_into()
    }
}

impl TryFrom<SimulationFile> for SimulationConfig {
    type Error = SimulationConfigError;

    fn try_from(file: SimulationFile) -> Result<Self, Self::Error> {
        if file.tick_interval_ms == 0 {
            return Err(SimulationConfigError::InvalidTick(
                "tick_interval_ms must be positive".to_string(),
            ));
        }
        if !file.tick_dt_seconds.is_finite() || file.tick_dt_seconds < 0.0 {
            return Err(SimulationConfigError::InvalidTick(format!(
                "tick_dt_seconds must be finite and non-negative, got {}",
                file.tick_dt_seconds
            )));
        }

        let mut vehicles = Vec::with_capacity(file.vehicles.len());
        for entry in file.vehicles {
            if vehicles
                .iter()
                .any(|v: &VehicleSpec| v.vehicle_id == entry.vehicle_id)
            {
                return Err(SimulationConfigError::InvalidVehicle {
                    vehicle_id: entry.vehicle_id,
                    reason: "duplicate vehicle_id".to_string(),
                });
            }
            vehicles.push(entry.into_spec()?);
        }

        Ok(Self {
            settings: SimulationSettings {
                tick_interval: Duration::from_millis(file.tick_interval_ms),
                tick_dt_seconds: file.tick_dt_seconds,
            },
            vehicles,
        })
    }
}

impl VehicleEntry {
    fn into_spec(self) -> Result<VehicleSpec, SimulationConfigError> {
        let invalid = |vehicle_id: &str, reason: String| SimulationConfigError::InvalidVehicle {
            vehicle_id: vehicle_id.to_string(),
            reason,
        };

        if self.vehicle_id.trim().is_empty() {
            return Err(invalid("<empty>", "vehicle_id is required".to_string()));
        }

        let speed = match (self.speed_kmh, self.speed_deg_per_sec) {
            (Some(kmh), None) => speed_from_kmh(kmh),
            (None, Some(deg)) => deg,
            _ => {
                return Err(invalid(
                    &self.vehicle_id,
                    "set exactly one of speed_kmh or speed_deg_per_sec".to_string(),
                ));
            }
        };

        let points = self
            .waypoints
            .iter()
            .map(|&[lat, lon]| Coord::new(lat, lon))
            .collect();
        let motion = Waypath::new(points)
            .and_then(|path| MotionState::new(path, speed))
            .map_err(|e: WaypathError| invalid(&self.vehicle_id, e.to_string()))?;

        Ok(VehicleSpec {
            vehicle_id: self.vehicle_id,
            route_label: self.route_label,
            motion,
        })
    }
}
