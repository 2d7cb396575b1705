// Simulated fleet: advances every vehicle once per tick and publishes its position.

use crate::domain::{MotionState, PositionMessage, PositionSink};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

/// Static description of one simulated vehicle.
#[derive(Debug, Clone)]
pub struct VehicleSpec {
    pub vehicle_id: String,
    pub route_label: String,
    pub motion: MotionState,
}

/// Timing knobs for the scheduler loop.
#[derive(Debug, Clone, Copy)]
pub struct SimulationSettings {
    /// Wall-clock time between ticks.
    pub tick_interval: Duration,
    /// Simulated seconds passed to the motion engine each tick. Deliberately a constant,
    /// not measured elapsed time.
    pub tick_dt_seconds: f64,
}

impl Default for SimulationSettings {
    fn default() -> Self {
        Self {
            tick_interval: Duration::from_secs(1),
            tick_dt_seconds: 1.0,
        }
    }
}

/// Positions produced by a single tick, in fleet order.
#[derive(Debug, Clone)]
pub struct SimulationTick {
    pub tick: u64,
    pub positions: Vec<PositionMessage>,
}

#[derive(Debug)]
pub struct SimulationScheduler {
    vehicles: Vec<VehicleSpec>,
    tick_dt_seconds: f64,
    tick: u64,
}

impl SimulationScheduler {
    pub fn new(vehicles: Vec<VehicleSpec>, tick_dt_seconds: f64) -> Self {
        Self {
            vehicles,
            tick_dt_seconds,
            tick: 0,
        }
    }

    pub fn vehicle_count(&self) -> usize {
        self.vehicles.len()
    }

    pub fn current_tick(&self) -> u64 {
        self.tick
    }

    /// Advances every vehicle once and returns their new positions.
    pub fn step(&mut self) -> SimulationTick {
        self.tick += 1;
        let dt = self.tick_dt_seconds;
        let positions = self
            .vehicles
            .iter_mut()
            .map(|vehicle| {
                let pos = vehicle.motion.advance(dt);
                PositionMessage {
                    vehicle_id: vehicle.vehicle_id.clone(),
                    lat: pos.lat,
                    lon: pos.lon,
                    route_label: vehicle.route_label.clone(),
                }
            })
            .collect();

        SimulationTick {
            tick: self.tick,
            positions,
        }
    }

    /// Runs one tick and hands each position to `sink`. Returns how many were accepted.
    pub async fn step_and_publish(&mut self, sink: &dyn PositionSink) -> usize {
        let SimulationTick { tick, positions } = self.step();
        let mut published = 0;
        for msg in &positions {
            // One vehicle failing must not hold back the rest of the tick.
            match sink.publish_position(msg).await {
                Ok(()) => published += 1,
                Err(err) => {
                    warn!(
                        tick,
                        vehicle_id = %msg.vehicle_id,
                        error = %err,
                        "failed to publish simulated position"
                    );
                }
            }
        }
        published
    }
}

/// Drives the scheduler on a fixed interval until `shutdown` flips to true or its sender
/// is dropped.
pub async fn simulation_task(
    mut scheduler: SimulationScheduler,
    sink: Arc<dyn PositionSink>,
    tick_interval: Duration,
    mut shutdown: watch::Receiver<bool>,
) {
    info!(
        vehicles = scheduler.vehicle_count(),
        tick_ms = tick_interval.as_millis() as u64,
        "simulation started"
    );

    let mut interval = tokio::time::interval(tick_interval);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        if *shutdown.borrow() {
            break;
        }

        tokio::select! {
            changed = shutdown.changed() => {
                if changed.is_err() || *shutdown.borrow() {
                    break;
                }
            }
            _ = interval.tick() => {
                // A sink may wait indefinitely; shutdown still wins.
                tokio::select! {
                    published = scheduler.step_and_publish(sink.as_ref()) => {
                        debug!(tick = scheduler.current_tick(), published, "simulation tick");
                    }
                    _ = shutdown.wait_for(|stop| *stop) => break,
                }
            }
        }
    }

    info!(ticks = scheduler.current_tick(), "simulation stopped");
}
