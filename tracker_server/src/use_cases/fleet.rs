// Picks which configured vehicles get simulated, using the roster when one is available.

use crate::domain::RosterProvider;
use crate::use_cases::simulation::VehicleSpec;
use std::collections::HashSet;
use tracing::{info, warn};

/// Keeps the configured vehicles the roster knows about, in configuration order.
///
/// Without a roster every configured vehicle is kept. If the roster cannot be reached the
/// full configured fleet is kept as well, so a roster outage never silences the simulation.
pub async fn seed_fleet(
    configured: Vec<VehicleSpec>,
    roster: Option<&dyn RosterProvider>,
) -> Vec<VehicleSpec> {
    let Some(roster) = roster else {
        return configured;
    };

    let known: HashSet<String> = match roster.list_vehicles().await {
        Ok(entries) => entries.into_iter().map(|e| e.vehicle_id).collect(),
        Err(err) => {
            warn!(error = %err, "roster lookup failed; simulating all configured vehicles");
            return configured;
        }
    };

    let (kept, dropped): (Vec<_>, Vec<_>) = configured
        .into_iter()
        .partition(|vehicle| known.contains(&vehicle.vehicle_id));

    for vehicle in &dropped {
        info!(vehicle_id = %vehicle.vehicle_id, "vehicle not in roster; not simulated");
    }

    kept
}
