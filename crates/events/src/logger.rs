//! Background subscriber that mirrors job events into tracing output.
//!
//! Intended to be spawned via `tokio::spawn` from the API binary. The
//! task ends when every `JobEventBus` sender has been dropped.

use tokio::sync::broadcast;

use crate::bus::{JobEvent, EVENT_JOB_COMPLETED, EVENT_JOB_FAILED};

/// Consume events from `receiver` until the bus closes, logging each one.
///
/// Lagged receivers skip ahead rather than aborting: losing a log line is
/// acceptable, losing the subscriber is not.
pub async fn run(mut receiver: broadcast::Receiver<JobEvent>) {
    tracing::info!("Job event logger started");

    loop {
        match receiver.recv().await {
            Ok(event) => log_event(&event),
            Err(broadcast::error::RecvError::Lagged(skipped)) => {
                tracing::warn!(skipped, "Job event logger lagged behind the bus");
            }
            Err(broadcast::error::RecvError::Closed) => {
                tracing::info!("Job event bus closed, logger stopping");
                break;
            }
        }
    }
}

fn log_event(event: &JobEvent) {
    match event.event_type.as_str() {
        EVENT_JOB_COMPLETED => {
            tracing::info!(job_id = %event.job_id, "Job completed");
        }
        EVENT_JOB_FAILED => {
            tracing::warn!(
                job_id = %event.job_id,
                error = %event.payload["error"].as_str().unwrap_or("unknown"),
                "Job failed",
            );
        }
        _ => {
            tracing::debug!(
                job_id = %event.job_id,
                event_type = %event.event_type,
                payload = %event.payload,
                "Job event",
            );
        }
    }
}
