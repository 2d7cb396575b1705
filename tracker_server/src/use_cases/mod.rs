// Use cases layer: fan-out, connection tracking and fleet simulation.

pub mod fleet;
pub mod registry;
pub mod relay;
pub mod simulation;

#[cfg(test)]
pub(crate) mod test_support;

pub use registry::{ChannelClosed, ChannelHandle, ChannelId, ConnectionRegistry};
pub use relay::{PublishReport, Relay, SelfDelivery};
pub use simulation::{
    SimulationScheduler, SimulationSettings, SimulationTick, VehicleSpec, simulation_task,
};
