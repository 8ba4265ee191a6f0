use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use wardwatch_api::config::ServerConfig;
use wardwatch_api::router::build_app_router;
use wardwatch_api::state::AppState;
use wardwatch_api::ws;
use wardwatch_events::{EmailConfig, EventBus};
use wardwatch_worker::{bootstrap, notifications, sweep, TriageConfig, TriageMonitor};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    // --- Tracing ---
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "wardwatch_api=debug,wardwatch_worker=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // --- Configuration ---
    let config = ServerConfig::from_env().map_err(anyhow::Error::msg)?;
    tracing::info!(host = %config.host, port = %config.port, "Loaded server configuration");

    let triage_config = TriageConfig::from_env().context("Invalid triage configuration")?;
    tracing::info!(
        sweep_interval_secs = triage_config.sweep_interval.as_secs(),
        realert_secs = triage_config.realert_after.map(|d| d.as_secs()),
        "Loaded triage configuration"
    );

    // --- Store ---
    let store = bootstrap::connect_store().await?;

    // --- WebSocket manager ---
    let ws_manager = Arc::new(ws::WsManager::new());
    let heartbeat_handle = ws::start_heartbeat(Arc::clone(&ws_manager));

    // --- Event bus ---
    let event_bus = Arc::new(EventBus::default());
    let forwarder_handle = tokio::spawn(ws::forward_events(
        Arc::clone(&ws_manager),
        event_bus.subscribe(),
    ));

    // --- Triage monitor ---
    let dispatcher = notifications::build_dispatcher(
        &triage_config,
        Some(Arc::clone(&event_bus)),
        EmailConfig::from_env(),
    )?;
    let monitor = Arc::new(
        TriageMonitor::from_config(Arc::clone(&store), &triage_config, dispatcher)?
            .with_event_bus(Arc::clone(&event_bus)),
    );

    let sweep_cancel = CancellationToken::new();
    let sweep_handle = tokio::spawn(sweep::run_sweeps(
        Arc::clone(&monitor),
        triage_config.sweep_interval,
        sweep_cancel.clone(),
    ));

    // --- App state ---
    let state = AppState {
        store,
        monitor: Arc::clone(&monitor),
        config: Arc::new(config.clone()),
        ws_manager: Arc::clone(&ws_manager),
        event_bus: Arc::clone(&event_bus),
    };

    let app = build_app_router(state, &config);

    // --- Start server ---
    let host: std::net::IpAddr = config
        .host
        .parse()
        .with_context(|| format!("Invalid HOST address '{}'", config.host))?;
    let addr = SocketAddr::new(host, config.port);
    tracing::info!(%addr, "Starting server");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .context("Failed to bind to address")?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    // --- Post-shutdown cleanup ---
    tracing::info!("Server stopped accepting connections, cleaning up");
    let cleanup_timeout = Duration::from_secs(config.shutdown_timeout_secs);

    sweep_cancel.cancel();
    let _ = tokio::time::timeout(cleanup_timeout, sweep_handle).await;
    tracing::info!("Triage sweep stopped");

    match tokio::time::timeout(cleanup_timeout, monitor.drain_notifications()).await {
        Ok(reports) => tracing::info!(drained = reports.len(), "Pending notifications delivered"),
        Err(_) => tracing::warn!("Timed out waiting for pending notifications"),
    }

    // The monitor holds a bus handle; both must go before the forwarder sees Closed.
    drop(monitor);
    drop(event_bus);
    let _ = tokio::time::timeout(cleanup_timeout, forwarder_handle).await;

    let ws_count = ws_manager.connection_count().await;
    tracing::info!(ws_count, "Closing remaining WebSocket connections");
    ws_manager.shutdown_all().await;

    heartbeat_handle.abort();
    tracing::info!("Graceful shutdown complete");
    Ok(())
}

/// Wait for SIGINT (Ctrl-C) or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl-C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("Received SIGINT (Ctrl-C), starting graceful shutdown");
        }
        () = terminate => {
            tracing::info!("Received SIGTERM, starting graceful shutdown");
        }
    }
}
