//! Macro-structure planning: story description -> ordered page plans.
//!
//! Delegates to the structured generation capability with pacing rules
//! baked into the instructions and a schema forcing exactly the
//! requested number of pages. No partial output is usable, so every
//! failure here is fatal at job scope.

use std::sync::Arc;

use panelforge_core::plan::{
    validate_page_count, validate_page_plans, PagePlan, ACTION_PANELS, DIALOGUE_PANELS,
    ESTABLISHING_PANELS, MAX_PANELS_PER_PAGE,
};
use panelforge_textgen::StructuredGenerator;

use crate::error::PlanError;

/// Plans the page-level structure of a narrative.
pub struct MacroPlanner {
    generator: Arc<dyn StructuredGenerator>,
}

impl MacroPlanner {
    pub fn new(generator: Arc<dyn StructuredGenerator>) -> Self {
        Self { generator }
    }

    /// Produce exactly `page_count` page plans for `story_description`.
    ///
    /// `available_identity_names` lets the capability weave registered
    /// characters and locations into the page beats by name. A page
    /// count of zero short-circuits without calling the capability.
    pub async fn plan(
        &self,
        story_description: &str,
        page_count: u32,
        available_identity_names: &[String],
        style: &str,
    ) -> Result<Vec<PagePlan>, PlanError> {
        if page_count == 0 {
            return Ok(Vec::new());
        }
        validate_page_count(page_count)?;

        let instructions = build_instructions(page_count, available_identity_names, style);
        let schema = page_plan_schema(page_count);

        let value = self
            .generator
            .generate(&instructions, story_description, &schema)
            .await?;

        let pages_value = value
            .get("pages")
            .cloned()
            .ok_or_else(|| PlanError::Schema("macro plan is missing the `pages` array".into()))?;
        let plans: Vec<PagePlan> = serde_json::from_value(pages_value)
            .map_err(|e| PlanError::Schema(format!("macro plan entries malformed: {e}")))?;

        validate_page_plans(&plans, page_count)?;

        tracing::debug!(page_count, "Macro plan accepted");
        Ok(plans)
    }
}

/// Instruction text for the capability: what a page plan is, how to pace
/// panel counts, and which identities already exist.
fn build_instructions(page_count: u32, identity_names: &[String], style: &str) -> String {
    let mut instructions = format!(
        "You are planning a sequential visual narrative in the style of {style}. \
         Break the user's story into exactly {page_count} pages. For each page give \
         a pageNumber, a pageDescription of the beats on that page, a one-word mood, \
         and a panelCount. Pacing rules for panelCount: action-dense pages use {}-{} \
         panels; dialogue or emotional pages use {}-{} panels; establishing pages use \
         {}-{} panels.",
        ACTION_PANELS.0,
        ACTION_PANELS.1,
        DIALOGUE_PANELS.0,
        DIALOGUE_PANELS.1,
        ESTABLISHING_PANELS.0,
        ESTABLISHING_PANELS.1,
    );

    if !identity_names.is_empty() {
        instructions.push_str(&format!(
            " These characters and locations already exist and should carry the story \
             where they fit: {}.",
            identity_names.join(", ")
        ));
    }

    instructions
}

/// Schema forcing exactly `page_count` entries.
fn page_plan_schema(page_count: u32) -> serde_json::Value {
    serde_json::json!({
        "type": "object",
        "required": ["pages"],
        "properties": {
            "pages": {
                "type": "array",
                "minItems": page_count,
                "maxItems": page_count,
                "items": {
                    "type": "object",
                    "required": ["pageNumber", "pageDescription", "mood", "panelCount"],
                    "properties": {
                        "pageNumber": { "type": "integer", "minimum": 1 },
                        "pageDescription": { "type": "string" },
                        "mood": { "type": "string" },
                        "panelCount": {
                            "type": "integer",
                            "minimum": 1,
                            "maximum": MAX_PANELS_PER_PAGE,
                        },
                    },
                },
            },
        },
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
