//! The per-panel output record appended to a job as generation proceeds.

use serde::{Deserialize, Serialize};

use crate::plan::ShotPlan;
use crate::scene::StructuredScene;
use crate::types::Seed;

/// One rendered (or failed) panel. Append-only once produced.
///
/// A failed panel carries `image_url: None` and a readable `error`; the
/// shot plan and, when the merge got that far, the prompt that would have
/// been sent are kept so the panel can be retried by a later regeneration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneratedPanel {
    pub page_number: u32,
    pub panel_number: u32,
    pub image_url: Option<String>,
    pub seed: Option<Seed>,
    pub structured_prompt_used: Option<StructuredScene>,
    pub shot_plan: ShotPlan,
    pub error: Option<String>,
}

impl GeneratedPanel {
    /// A successfully rendered panel.
    pub fn succeeded(
        page_number: u32,
        shot_plan: ShotPlan,
        image_url: String,
        seed: Seed,
        structured_prompt_used: StructuredScene,
    ) -> Self {
        Self {
            page_number,
            panel_number: shot_plan.panel_number,
            image_url: Some(image_url),
            seed: Some(seed),
            structured_prompt_used: Some(structured_prompt_used),
            shot_plan,
            error: None,
        }
    }

    /// A panel whose synthesis failed. Never escalates past this record.
    pub fn failed(
        page_number: u32,
        shot_plan: ShotPlan,
        structured_prompt_used: Option<StructuredScene>,
        error: String,
    ) -> Self {
        Self {
            page_number,
            panel_number: shot_plan.panel_number,
            image_url: None,
            seed: None,
            structured_prompt_used,
            shot_plan,
            error: Some(error),
        }
    }

    pub fn is_failed(&self) -> bool {
        self.error.is_some()
    }
}
