//! Periodic TTL eviction of stale jobs.
//!
//! Spawns as a background task that removes jobs older than the
//! configured TTL from the in-memory store. Runs on a fixed interval
//! using `tokio::time::interval` until cancelled.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio_util::sync::CancellationToken;

use crate::store::MemoryJobStore;

/// Default job TTL: 1 hour.
pub const DEFAULT_TTL_SECS: u64 = 3600;

/// Default sweep interval: 5 minutes.
pub const DEFAULT_SWEEP_INTERVAL_SECS: u64 = 300;

/// Run the TTL sweep loop.
///
/// Evicts jobs with `created_at` older than `JOB_TTL_SECS` (default
/// 1 hour) every `JOB_SWEEP_INTERVAL_SECS` (default 5 minutes). Runs
/// until `cancel` is triggered. Orchestrators still holding an evicted
/// job id keep running; their writes become silent no-ops.
pub async fn run(store: Arc<MemoryJobStore>, cancel: CancellationToken) {
    let ttl_secs: u64 = std::env::var("JOB_TTL_SECS")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(DEFAULT_TTL_SECS);
    let interval_secs: u64 = std::env::var("JOB_SWEEP_INTERVAL_SECS")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(DEFAULT_SWEEP_INTERVAL_SECS);

    tracing::info!(ttl_secs, interval_secs, "Job TTL sweeper started");

    let mut interval = tokio::time::interval(Duration::from_secs(interval_secs));

    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                tracing::info!("Job TTL sweeper stopping");
                break;
            }
            _ = interval.tick() => {
                let cutoff = Utc::now() - chrono::Duration::seconds(ttl_secs as i64);
                let evicted = store.sweep_older_than(cutoff).await;
                if evicted > 0 {
                    tracing::info!(evicted, "Job TTL sweep: evicted expired jobs");
                } else {
                    tracing::debug!("Job TTL sweep: nothing to evict");
                }
            }
        }
    }
}
