// Framework bootstrap for the tracker server runtime.

use crate::domain::{PositionSink, RosterProvider};
use crate::frameworks::config;
use crate::frameworks::simulation_config::SimulationConfig;
use crate::interface_adapters::clients::RosterClient;
use crate::interface_adapters::net::ws_handler;
use crate::interface_adapters::sinks::RelaySink;
use crate::interface_adapters::state::AppState;
use crate::use_cases::fleet::seed_fleet;
use crate::use_cases::{
    ConnectionRegistry, Relay, SelfDelivery, SimulationScheduler, SimulationSettings,
    simulation_task,
};

use axum::{Router, routing::get};
use std::future::Future;
use std::net::SocketAddr;
use std::{io::Result, sync::Arc};
use tokio::sync::watch;
use tokio::task::JoinHandle;

pub fn init_runtime() {
    let _ = dotenvy::dotenv();

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    let json = matches!(std::env::var("LOG_FORMAT").as_deref(), Ok("json"));
    if json {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .json()
            .with_current_span(true)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .compact()
            .init();
    }

    std::panic::set_hook(Box::new(|info| {
        let backtrace = std::backtrace::Backtrace::capture();
        tracing::error!(%info, ?backtrace, "panic");
    }));
}

/// Everything the server needs besides a listener. Tests build this directly.
#[derive(Debug, Clone)]
pub struct ServerSettings {
    pub self_delivery: SelfDelivery,
    pub channel_capacity: usize,
    pub max_message_bytes: usize,
    /// `None` runs the relay without a simulated fleet.
    pub simulation: Option<SimulationConfig>,
    pub roster_url: Option<String>,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            self_delivery: SelfDelivery::IncludeOrigin,
            channel_capacity: config::SUBSCRIBER_CHANNEL_CAPACITY,
            max_message_bytes: config::MAX_MESSAGE_BYTES,
            simulation: None,
            roster_url: None,
        }
    }
}

impl ServerSettings {
    pub fn from_env() -> Self {
        let simulation = if config::simulation_enabled() {
            let path = config::simulation_config_path();
            match SimulationConfig::load(&path) {
                Ok(sim) => Some(sim),
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "simulation disabled");
                    None
                }
            }
        } else {
            tracing::info!("simulation disabled by SIMULATION_ENABLED");
            None
        };

        Self {
            self_delivery: config::self_delivery(),
            simulation,
            roster_url: config::roster_service_url(),
            ..Self::default()
        }
    }
}

pub fn app(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/ws/locations", get(ws_handler))
        .with_state(state)
}

/// Serves the relay on `listener` until `shutdown` resolves, then stops the simulation
/// and every connection loop.
pub async fn run_until<F>(
    listener: tokio::net::TcpListener,
    settings: ServerSettings,
    shutdown: F,
) -> Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let address = listener.local_addr()?;
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let registry = Arc::new(ConnectionRegistry::new());
    let relay = Arc::new(Relay::new(registry.clone(), settings.self_delivery));
    tracing::debug!(self_delivery = ?settings.self_delivery, "relay configured");

    let simulation = match settings.simulation {
        Some(sim) => {
            spawn_simulation(
                sim,
                settings.roster_url.as_deref(),
                relay.clone(),
                shutdown_rx.clone(),
            )
            .await?
        }
        None => None,
    };

    let state = Arc::new(AppState {
        registry,
        relay,
        shutdown: shutdown_rx,
        channel_capacity: settings.channel_capacity,
        max_message_bytes: settings.max_message_bytes,
    });

    tracing::info!(%address, "listening");

    // Serve app and report errors rather than panicking
    let served = axum::serve(listener, app(state))
        .with_graceful_shutdown(async move {
            shutdown.await;
            tracing::info!("shutdown requested");
            let _ = shutdown_tx.send(true);
        })
        .await
        .inspect_err(|e| {
            tracing::error!(error = %e, "server error");
        });

    if let Some(handle) = simulation {
        if let Err(e) = handle.await {
            tracing::warn!(error = %e, "simulation task failed");
        }
    }

    served
}

pub async fn run(listener: tokio::net::TcpListener) -> Result<()> {
    run_until(listener, ServerSettings::from_env(), shutdown_signal()).await
}

pub async fn run_with_config() -> Result<()> {
    init_runtime();

    let address = SocketAddr::new(config::bind_addr(), config::http_port());

    // Bind TCP listener with error handling
    let listener = tokio::net::TcpListener::bind(address)
        .await
        .inspect_err(|e| {
            tracing::error!(%address, error = %e, "failed to bind");
        })?;

    run(listener).await
}

pub async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for ctrl-c");
        std::future::pending::<()>().await;
    }
}

async fn spawn_simulation(
    sim: SimulationConfig,
    roster_url: Option<&str>,
    relay: Arc<Relay>,
    shutdown: watch::Receiver<bool>,
) -> Result<Option<JoinHandle<()>>> {
    let roster = match roster_url {
        Some(url) => {
            let client = RosterClient::new(url, config::roster_timeout()).map_err(|e| {
                std::io::Error::other(format!("failed to initialize roster client: {e}"))
            })?;
            tracing::debug!(roster_url = %client.base_url(), "roster client configured");
            Some(client)
        }
        None => None,
    };

    let vehicles = seed_fleet(
        sim.vehicles,
        roster.as_ref().map(|r| r as &dyn RosterProvider),
    )
    .await;
    if vehicles.is_empty() {
        tracing::info!("no vehicles to simulate");
        return Ok(None);
    }

    let SimulationSettings {
        tick_interval,
        tick_dt_seconds,
    } = sim.settings;
    let scheduler = SimulationScheduler::new(vehicles, tick_dt_seconds);
    let sink: Arc<dyn PositionSink> = Arc::new(RelaySink::new(relay));

    Ok(Some(tokio::spawn(simulation_task(
        scheduler,
        sink,
        tick_interval,
        shutdown,
    ))))
}
