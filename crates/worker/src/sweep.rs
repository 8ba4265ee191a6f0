//! Periodic triage sweep.

use std::sync::Arc;
use std::time::Duration;

use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

use crate::monitor::TriageMonitor;

/// Run [`TriageMonitor::sweep`] every `interval` until `cancel` fires.
///
/// Each pass is awaited before the next tick; ticks missed while a pass is
/// running are skipped rather than replayed.
pub async fn run_sweeps(monitor: Arc<TriageMonitor>, interval: Duration, cancel: CancellationToken) {
    tracing::info!(interval_secs = interval.as_secs(), "Triage sweep started");

    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                tracing::info!("Triage sweep stopping");
                break;
            }
            _ = ticker.tick() => {
                match monitor.sweep().await {
                    Ok(summary) if summary.changed > 0 || summary.failed > 0 => {
                        tracing::info!(
                            evaluated = summary.evaluated,
                            changed = summary.changed,
                            notified = summary.notified,
                            failed = summary.failed,
                            "Triage sweep: tiers updated"
                        );
                    }
                    Ok(_) => {}
                    Err(e) => {
                        tracing::error!(error = %e, "Triage sweep failed");
                    }
                }
            }
        }
    }
}
