use anyhow::Context;
use habitat::{
    io::{IdlePanel, LoggingActuator},
    Config, CredentialStore, Engine, EngineParts, FileStore, LimitsStore, MqttHandler, Portal,
    SimulatedSupplier,
};
use std::sync::Arc;
use tokio::signal;
use tokio::sync::mpsc;
use tracing::{error, info};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    habitat::init_tracing();
    info!("HABITAT v{} starting", habitat::VERSION);

    let config = match std::env::args().nth(1) {
        Some(path) => Config::from_file(&path).with_context(|| format!("loading {}", path))?,
        None => {
            info!("No configuration file given, using defaults");
            Config::default()
        }
    };

    let store = FileStore::new(&config.storage.data_dir)
        .with_context(|| format!("opening data directory {}", config.storage.data_dir.display()))?;
    let limits = LimitsStore::new(store.clone()).shared();
    let credentials = CredentialStore::new(store);
    if credentials.load()?.is_none() {
        info!("No network credentials stored");
    }

    let (events_tx, events_rx) = mpsc::channel(32);
    let mqtt = MqttHandler::new(config.mqtt.clone(), events_tx);
    let publisher = Arc::new(mqtt.publisher());
    tokio::spawn(mqtt.run());

    let portal = Portal::new(config.portal.bind_address, limits.clone());

    let mut engine = Engine::new(
        &config,
        EngineParts {
            limits,
            credentials,
            supplier: Box::new(SimulatedSupplier::new()),
            publisher,
            actuator: Box::new(LoggingActuator::default()),
            panel: Box::new(IdlePanel),
            portal: Box::new(portal),
            events: events_rx,
        },
    )?;

    tokio::select! {
        _ = signal::ctrl_c() => {
            info!("Received shutdown signal");
        }
        res = engine.run() => {
            if let Err(e) = res {
                error!("Engine error: {}", e);
            }
        }
    }
    engine.stop();

    let stats = engine.stats();
    info!(
        "Final stats: {} cycles, {} cycle errors, {} publish failures, uptime: {}s",
        stats.cycles, stats.cycle_errors, stats.publish_failures, stats.uptime_secs
    );
    Ok(())
}
