// Standalone fleet simulator: publishes simulated positions to a remote relay.

use std::sync::Arc;

use tokio::sync::watch;
use tracker_server::SimulationConfig;
use tracker_server::domain::PositionSink;
use tracker_server::frameworks::{config, server};
use tracker_server::interface_adapters::clients::RelayClient;
use tracker_server::use_cases::{SimulationScheduler, simulation_task};

#[tokio::main]
async fn main() -> std::io::Result<()> {
    server::init_runtime();

    let path = config::simulation_config_path();
    let sim = SimulationConfig::load(&path).map_err(|e| {
        tracing::error!(path = %path.display(), error = %e, "failed to load simulation config");
        std::io::Error::other(e)
    })?;
    if sim.vehicles.is_empty() {
        tracing::warn!(path = %path.display(), "no vehicles configured; nothing to simulate");
        return Ok(());
    }

    let url = config::relay_url();
    let client = RelayClient::connect(&url).await.map_err(|e| {
        tracing::error!(%url, error = %e, "failed to connect to relay; is the server running?");
        std::io::Error::other(e)
    })?;
    let client = Arc::new(client);

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let scheduler = SimulationScheduler::new(sim.vehicles, sim.settings.tick_dt_seconds);
    let sink: Arc<dyn PositionSink> = client.clone();
    let task = tokio::spawn(simulation_task(
        scheduler,
        sink,
        sim.settings.tick_interval,
        shutdown_rx,
    ));

    let outcome = tokio::select! {
        _ = server::shutdown_signal() => {
            tracing::info!("simulation stopping");
            Ok(())
        }
        _ = client.closed() => {
            tracing::error!(%url, "relay closed the connection");
            Err(std::io::Error::other("relay connection closed"))
        }
    };

    let _ = shutdown_tx.send(true);
    if let Err(e) = task.await {
        tracing::warn!(error = %e, "simulation task failed");
    }

    if let Ok(client) = Arc::try_unwrap(client) {
        client.close().await;
    }
    outcome
}
