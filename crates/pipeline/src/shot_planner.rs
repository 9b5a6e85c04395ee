//! Fine-grained shot planning: one page plan -> ordered panel shot plans.
//!
//! The instructions list every registered identity as an `id (name)` pair
//! so the capability references them by id, and document the sentinels
//! for inventing unregistered characters and locations. Failure here is
//! scoped to the page: the orchestrator fails the job with a page-scoped
//! message while keeping everything generated before it.

use std::sync::Arc;

use panelforge_core::identity::{IDENTITY_REF_GENERIC, IDENTITY_REF_NEW};
use panelforge_core::plan::{validate_shot_plans, PagePlan, ShotPlan};
use panelforge_textgen::StructuredGenerator;

use crate::error::PlanError;

/// Plans the panel-level shots of one page.
pub struct ShotPlanner {
    generator: Arc<dyn StructuredGenerator>,
}

impl ShotPlanner {
    pub fn new(generator: Arc<dyn StructuredGenerator>) -> Self {
        Self { generator }
    }

    /// Produce exactly `page.panel_count` shot plans for the page.
    ///
    /// `identity_pairs` is the registry's `(id, name)` listing; the
    /// capability must reference registered identities by id and use the
    /// sentinels for everything else.
    pub async fn plan(
        &self,
        page: &PagePlan,
        identity_pairs: &[(String, String)],
        style: &str,
    ) -> Result<Vec<ShotPlan>, PlanError> {
        if page.panel_count == 0 {
            return Ok(Vec::new());
        }

        let instructions = build_instructions(page, identity_pairs, style);
        let schema = shot_plan_schema(page.panel_count);

        let value = self
            .generator
            .generate(&instructions, &page.page_description, &schema)
            .await?;

        let panels_value = value
            .get("panels")
            .cloned()
            .ok_or_else(|| PlanError::Schema("shot list is missing the `panels` array".into()))?;
        let plans: Vec<ShotPlan> = serde_json::from_value(panels_value)
            .map_err(|e| PlanError::Schema(format!("shot list entries malformed: {e}")))?;

        validate_shot_plans(&plans, page.panel_count)?;

        tracing::debug!(
            page_number = page.page_number,
            panel_count = page.panel_count,
            "Shot list accepted",
        );
        Ok(plans)
    }
}

/// Instruction text: the page context, the identity roster, and the
/// sentinel contract.
fn build_instructions(page: &PagePlan, identity_pairs: &[(String, String)], style: &str) -> String {
    let roster = if identity_pairs.is_empty() {
        "No identities are registered yet.".to_string()
    } else {
        let listing: Vec<String> = identity_pairs
            .iter()
            .map(|(id, name)| format!("{id} ({name})"))
            .collect();
        format!(
            "Registered identities, referenced by id: {}.",
            listing.join(", ")
        )
    };

    format!(
        "You are breaking page {page_number} of a visual narrative into exactly \
         {panel_count} panels, rendered in the style of {style}. The page mood is \
         \"{mood}\". For each panel give panelNumber, sceneDescription, the characters \
         present (identityRef, action, expression), the location (identityRef, \
         timeOfDay, weather), cameraAngle, shotType (establishing, action, reaction, \
         detail, or transition), and an optional dialogueHint. {roster} For a \
         character that is not registered use identityRef \"{generic}\"; for a \
         location that is not registered use identityRef \"{new}\" -- both tell the \
         renderer to invent the details.",
        page_number = page.page_number,
        panel_count = page.panel_count,
        mood = page.mood,
        generic = IDENTITY_REF_GENERIC,
        new = IDENTITY_REF_NEW,
    )
}

/// Schema forcing exactly `panel_count` entries.
fn shot_plan_schema(panel_count: u32) -> serde_json::Value {
    serde_json::json!({
        "type": "object",
        "required": ["panels"],
        "properties": {
            "panels": {
                "type": "array",
                "minItems": panel_count,
                "maxItems": panel_count,
                "items": {
                    "type": "object",
                    "required": [
                        "panelNumber",
                        "sceneDescription",
                        "characters",
                        "location",
                        "cameraAngle",
                        "shotType",
                    ],
                    "properties": {
                        "panelNumber": { "type": "integer", "minimum": 1 },
                        "sceneDescription": { "type": "string" },
                        "characters": {
                            "type": "array",
                            "items": {
                                "type": "object",
                                "required": ["identityRef", "action", "expression"],
                                "properties": {
                                    "identityRef": { "type": "string" },
                                    "action": { "type": "string" },
                                    "expression": { "type": "string" },
                                },
                            },
                        },
                        "location": {
                            "type": "object",
                            "required": ["identityRef", "timeOfDay", "weather"],
                            "properties": {
                                "identityRef": { "type": "string" },
                                "timeOfDay": { "type": "string" },
                                "weather": { "type": "string" },
                            },
                        },
                        "cameraAngle": { "type": "string" },
                        "shotType": {
                            "type": "string",
                            "enum": ["establishing", "action", "reaction", "detail", "transition"],
                        },
                        "dialogueHint": { "type": "string" },
                    },
                },
            },
        },
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
