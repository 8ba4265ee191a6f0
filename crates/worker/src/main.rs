use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use wardwatch_events::EmailConfig;
use wardwatch_worker::{bootstrap, notifications, sweep, TriageConfig, TriageMonitor};

/// Upper bound on waiting for in-flight notifications at shutdown.
const DRAIN_TIMEOUT: Duration = Duration::from_secs(15);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    // --- Tracing ---
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "wardwatch_worker=debug,wardwatch_events=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // --- Configuration ---
    let config = TriageConfig::from_env().context("Invalid triage configuration")?;
    tracing::info!(
        sweep_interval_secs = config.sweep_interval.as_secs(),
        realert_secs = config.realert_after.map(|d| d.as_secs()),
        ward_recipient = %config.ward_recipient,
        "Loaded triage configuration"
    );

    // --- Store ---
    let store = bootstrap::connect_store().await?;

    // --- Notifications ---
    // No consoles attach to a standalone worker, so in-app delivery is off.
    let dispatcher = notifications::build_dispatcher(&config, None, EmailConfig::from_env())?;

    // --- Monitor ---
    let monitor = Arc::new(TriageMonitor::from_config(store, &config, dispatcher)?);

    let cancel = CancellationToken::new();
    let sweep_handle = tokio::spawn(sweep::run_sweeps(
        Arc::clone(&monitor),
        config.sweep_interval,
        cancel.clone(),
    ));

    shutdown_signal().await;
    tracing::info!("Shutdown signal received, stopping triage sweep");

    cancel.cancel();
    let _ = sweep_handle.await;

    match tokio::time::timeout(DRAIN_TIMEOUT, monitor.drain_notifications()).await {
        Ok(reports) => tracing::info!(drained = reports.len(), "Pending notifications delivered"),
        Err(_) => tracing::warn!("Timed out waiting for pending notifications"),
    }

    tracing::info!("Worker stopped");
    Ok(())
}

/// Wait for Ctrl-C or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl-C");
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
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
