//! Periodic ingestion, enabled by `mail.pollIntervalSecs`.

use std::time::Duration;

use supportdesk::SupportDesk;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

/// Spawns a task running one ingestion cycle per `interval`. Failed cycles
/// are logged and retried on the next tick. The first cycle runs
/// immediately.
pub fn spawn_poller(desk: SupportDesk, interval: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        tracing::info!(interval_secs = interval.as_secs(), "mail poller started");

        loop {
            ticker.tick().await;
            match desk.fetch_mail().await {
                Ok(report) => tracing::debug!(
                    fetched = report.fetched,
                    stored = report.stored,
                    "scheduled fetch finished"
                ),
                Err(error) => tracing::warn!(%error, "scheduled fetch failed"),
            }
        }
    })
}
