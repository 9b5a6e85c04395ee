//! Domain types and pure logic shared by every panelforge crate.
//!
//! This crate has zero internal dependencies so that the capability
//! clients, the job store, and the pipeline can all build on the same
//! vocabulary without cycles. Anything that talks to the network or
//! holds long-lived tasks lives in the crates above this one.

pub mod aspect;
pub mod error;
pub mod identity;
pub mod panel;
pub mod plan;
pub mod progress;
pub mod scene;
pub mod types;
