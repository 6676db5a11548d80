use anyhow::Result;
use blindclock::prelude::*;
use blindclock::server::ClockServer;
use blindclock::{ENGINE_NAME, VERSION};
use std::env;
use std::sync::Arc;
use blindclock::events::forward_clock_events;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

const DEFAULT_CONFIG_PATH: &str = "blindclock.toml";

#[tokio::main]
async fn main() -> Result<()> {
    // 1. Initialize structured logging.
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .init();

    // 2. Load configuration from the given path, falling back to ./blindclock.toml.
    let config_path = env::args().nth(1).unwrap_or_else(|| DEFAULT_CONFIG_PATH.to_string());
    let config = BlindClockConfig::load(Some(&config_path))?;
    let authorizer = Arc::new(StaticStaffDirectory::from_entries(&config.staff));
    info!(
        "{} v{} starting with {} tournament(s) and {} staff token(s)",
        ENGINE_NAME,
        VERSION,
        config.tournaments.len(),
        authorizer.len()
    );
    if authorizer.is_empty() {
        warn!("no staff tokens configured; clock actions will be refused");
    }

    // 3. Seed the repository and create the engine.
    let repository = Arc::new(InMemoryTournaments::from_records(config.tournaments.clone()));
    let engine = ClockEngine::with_store(repository, ClockStore::new(), config.event_capacity);

    // 4. Log every clock event.
    spawn_event_listener(&engine);

    // 5. Serve the HTTP surface until Ctrl+C.
    ClockServer::new(engine, authorizer, Arc::new(SystemClock))
        .serve(config.server.bind)
        .await
}

/// Spawns a task that subscribes to the engine's event stream.
fn spawn_event_listener(engine: &ClockEngine) {
    let clock_rx = engine.subscribe_clock_events();
    tokio::spawn(forward_clock_events(clock_rx, |event| {
        info!(tournament = %event.tournament_id(), "[CLOCK] => {:?}", event);
    }));
}
