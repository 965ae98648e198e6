//! Background expiry sweep.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::broadcast;

use super::CaptchaManager;

/// Periodically drop expired answers and spent images until shutdown.
pub async fn sweeper_worker(
    manager: Arc<CaptchaManager>,
    period: Duration,
    mut shutdown: broadcast::Receiver<()>,
) {
    tracing::info!("🧹 Sweeper started (every {}s)", period.as_secs());

    let mut ticker = tokio::time::interval_at(tokio::time::Instant::now() + period, period);
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                let m = manager.clone();
                match tokio::task::spawn_blocking(move || m.sweep()).await {
                    Ok(expired) if expired > 0 => {
                        tracing::info!(expired = expired, live = manager.registry_len(), "Expired captchas removed");
                    }
                    Ok(_) => {}
                    Err(e) => tracing::error!(error = %e, "Sweep task failed"),
                }
            }
            _ = shutdown.recv() => {
                tracing::info!("🧹 Sweeper shutting down...");
                break;
            }
        }
    }
}
