//! Pollable job state for the generation pipeline.
//!
//! - [`Job`], [`JobStatus`], [`JobProgress`] -- the entity a polling
//!   client reads.
//! - [`JobStore`] -- the injectable store seam; all mutations are one
//!   logical read-modify-write per call, and every mutating call on an
//!   unknown id is a no-op returning `None`.
//! - [`MemoryJobStore`] -- the default in-memory implementation. State
//!   lives for the process lifetime only; a durable backend can be
//!   substituted behind the same trait.
//! - [`sweeper`] -- periodic TTL eviction of stale jobs.

pub mod job;
pub mod store;
pub mod sweeper;

pub use job::{Job, JobProgress, JobStatus, JobType, ProgressUpdate};
pub use store::{JobStore, MemoryJobStore};
