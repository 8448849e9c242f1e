//! # habridged: home-automation discovery bridge daemon
//!
//! Composition root that wires all adapters together and starts the bridge.
//!
//! ## Responsibilities
//! - Load configuration (config file, env vars)
//! - Initialize the `SQLite` connection pool and run migrations
//! - Connect the MQTT transport and drive its event loop
//! - Load the persisted registry, subscribe, then pump inbound messages
//! - Serve the HTTP API and shut down gracefully on SIGTERM/SIGINT
//!
//! ## Dependency rule
//! This is the **only** crate that depends on all other crates.
//! It is the wiring layer; no bridge logic belongs here.

mod config;
mod pump;

use std::sync::Arc;

use tokio::sync::mpsc;
use tracing_subscriber::EnvFilter;

use habridge_adapter_http_axum::state::AppState;
use habridge_adapter_mqtt::MqttTransport;
use habridge_adapter_storage_sqlite_sqlx::{SqliteAttributeStore, SqliteObjectModel};
use habridge_app::bridge::Bridge;

use crate::config::Config;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load()?;

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_new(&config.logging.filter)?)
        .init();

    // Database
    let db = habridge_adapter_storage_sqlite_sqlx::Config {
        database_url: config.database.url.clone(),
    }
    .build()
    .await?;
    let pool = db.pool().clone();
    let objects = Arc::new(SqliteObjectModel::new(pool.clone()));
    let store = Arc::new(SqliteAttributeStore::new(
        pool,
        config.database.instance.clone(),
    ));

    // Transport
    let (transport, event_loop) = MqttTransport::new(&config.mqtt)?;
    let transport = Arc::new(transport);
    let (events_tx, events_rx) = mpsc::unbounded_channel();
    let event_loop_task = tokio::spawn(event_loop.run(events_tx));

    // Bridge: the registry must be loaded before the first message is handled.
    let bridge = Arc::new(Bridge::new(
        config.bridge.clone(),
        Arc::clone(&transport),
        objects,
        store,
    )?);
    let restored = bridge.start().await?;
    tracing::info!(
        entities = restored,
        base_topic = %config.bridge.base_topic,
        broker = %config.mqtt.broker_host,
        "bridge started"
    );
    let pump_task = tokio::spawn(pump::run(Arc::clone(&bridge), events_rx));

    // HTTP
    let app = habridge_adapter_http_axum::router::build(AppState::new(bridge));
    let bind_addr = config.bind_addr();
    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    tracing::info!(%bind_addr, "habridged listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("shutting down");
    if let Err(err) = transport.disconnect().await {
        tracing::warn!(error = %err, "MQTT disconnect failed");
    }
    event_loop_task.abort();
    pump_task.abort();

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %err, "cannot listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{SignalKind, signal};

        match signal(SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(err) => {
                tracing::error!(error = %err, "cannot listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }
}
