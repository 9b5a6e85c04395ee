//! Panelforge job event infrastructure.
//!
//! - [`JobEventBus`] -- in-process publish/subscribe hub backed by
//!   `tokio::sync::broadcast`.
//! - [`JobEvent`] -- the canonical job lifecycle event envelope.
//! - [`logger`] -- background subscriber that mirrors job events into the
//!   tracing output for operators watching the service.

pub mod bus;
pub mod logger;

pub use bus::{
    JobEvent, JobEventBus, EVENT_JOB_COMPLETED, EVENT_JOB_FAILED, EVENT_JOB_PROGRESS,
};
