//! The three-stage generation pipeline and its orchestrator.
//!
//! Stage order per job: [`MacroPlanner`] once, then per page a
//! [`ShotPlanner`] run, then per panel [`resolve`] + [`AssetSynthesizer`].
//! The [`Orchestrator`] sequences the stages strictly, records progress
//! and partial results in the job store, and applies the failure scoping
//! rules: macro failures are job-fatal, shot failures are page-fatal,
//! asset failures are recorded per panel and never halt the loop.

pub mod error;
pub mod macro_planner;
pub mod orchestrator;
pub mod resolver;
pub mod shot_planner;
pub mod synthesizer;

pub use error::PlanError;
pub use macro_planner::MacroPlanner;
pub use orchestrator::{GenerationMode, GenerationRequest, Orchestrator};
pub use resolver::{resolve, CharacterContext, LocationContext, ResolvedContext};
pub use shot_planner::ShotPlanner;
pub use synthesizer::AssetSynthesizer;
