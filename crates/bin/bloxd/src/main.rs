//! # bloxd — BloX hub daemon
//!
//! Composition root that wires all adapters together and starts the server.
//!
//! ## Responsibilities
//! - Load configuration (config file, env vars); a bad or missing file is
//!   fatal
//! - Initialise `tracing` from the configured filter
//! - Build the device registry, the event bus and the interpreter adapter
//! - Build the hub and the axum router, and serve them
//! - Arm timers configured with `activate_on_start`
//! - Handle graceful shutdown (SIGTERM/SIGINT), cancelling pending timers
//!
//! ## Dependency rule
//! This is the **only** crate that depends on all other crates.
//! It is the wiring layer — no domain logic belongs here.

use std::sync::Arc;

use tracing_subscriber::EnvFilter;

use blox_adapter_process::ProcessInterpreter;
use blox_adapter_ws_axum::state::AppState;
use blox_app::action_executor::ActionExecutor;
use blox_app::event_bus::InProcessEventBus;
use blox_app::handlers::HandlerTable;
use blox_app::hub::Hub;
use blox_app::timer::TimerContext;
use bloxd::config::Config;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load().inspect_err(|err| eprintln!("bloxd: {err}"))?;

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(&config.logging.filter))
        .init();

    // Devices
    let registry = Arc::new(config.build_registry()?);

    // Event bus
    let event_bus = Arc::new(InProcessEventBus::new(256));

    // Timers run actions through the interpreter process
    let executor = ActionExecutor::new(ProcessInterpreter::new(config.interpreter.clone()));
    let timers = TimerContext::new(executor, Arc::clone(&event_bus));

    // Hub
    let hub = Arc::new(Hub::new(
        Arc::clone(&registry),
        HandlerTable::with_defaults(),
    ));
    let forwarder = tokio::spawn({
        let hub = Arc::clone(&hub);
        let events = event_bus.subscribe();
        async move { hub.forward_events(events).await }
    });

    // HTTP / WebSocket
    let app = blox_adapter_ws_axum::router::build(AppState::new(hub));
    let listener = tokio::net::TcpListener::bind(config.bind_addr()).await?;
    tracing::info!(
        addr = %listener.local_addr()?,
        devices = registry.len(),
        interpreter = %config.interpreter.command,
        "bloxd listening"
    );

    for name in config.autostart_timers() {
        if let Some(timer) = registry.get(name)?.as_timer() {
            timer.activate(&timers).await?;
        }
    }

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    let cancelled = registry.cancel_all();
    forwarder.abort();
    tracing::info!(cancelled, "bloxd stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %err, "failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(err) => {
                tracing::error!(error = %err, "failed to listen for SIGTERM");
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
    tracing::info!("shutdown requested");
}
