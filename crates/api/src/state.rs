use std::sync::Arc;

use panelforge_core::identity::IdentityRegistry;
use panelforge_events::JobEventBus;
use panelforge_imagegen::ImageGenerator;
use panelforge_pipeline::Orchestrator;
use panelforge_store::JobStore;

use crate::config::ServerConfig;

/// Shared application state available to all Axum handlers via
/// `State<AppState>`.
///
/// Cheaply cloneable: every field is behind an `Arc`.
#[derive(Clone)]
pub struct AppState {
    /// Job store (polled by clients, written by orchestrator runs).
    pub store: Arc<dyn JobStore>,
    /// Visual identity registry for the project session.
    pub registry: Arc<IdentityRegistry>,
    /// The pipeline orchestrator; each accepted job spawns one detached
    /// run on it.
    pub orchestrator: Arc<Orchestrator>,
    /// Image synthesis capability, used directly for identity creation.
    pub imagegen: Arc<dyn ImageGenerator>,
    /// Job lifecycle event bus.
    pub events: Arc<JobEventBus>,
    /// Server configuration.
    pub config: Arc<ServerConfig>,
}
