// Frameworks layer: environment config, simulation config file and server bootstrap.

pub mod config;
pub mod server;
pub mod simulation_config;
