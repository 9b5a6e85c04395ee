//! Page- and panel-level planning types, pacing rules, and validation.
//!
//! [`PagePlan`]s come out of the macro planner; [`ShotPlan`]s come out of
//! the shot planner. Both are produced by the structured generation
//! capability against a schema this service defines, so the validators
//! here are the last line of defence against conforming-but-wrong output.

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::identity::{IDENTITY_REF_GENERIC, IDENTITY_REF_NEW};

// ---------------------------------------------------------------------------
// Pacing constants
// ---------------------------------------------------------------------------

/// Panel range for action-dense pages.
pub const ACTION_PANELS: (u32, u32) = (6, 9);

/// Panel range for dialogue or emotional pages.
pub const DIALOGUE_PANELS: (u32, u32) = (2, 4);

/// Panel range for establishing pages.
pub const ESTABLISHING_PANELS: (u32, u32) = (1, 3);

/// Hard ceiling on panels per page, matching the densest pacing band.
pub const MAX_PANELS_PER_PAGE: u32 = 9;

/// Hard ceiling on pages per job to prevent runaway plans.
pub const MAX_PAGES_PER_JOB: u32 = 50;

// ---------------------------------------------------------------------------
// Page plans
// ---------------------------------------------------------------------------

/// One page of the macro plan. Produced once, never mutated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PagePlan {
    pub page_number: u32,
    pub page_description: String,
    pub mood: String,
    pub panel_count: u32,
}

// ---------------------------------------------------------------------------
// Shot plans
// ---------------------------------------------------------------------------

/// A character appearing in one panel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CharacterDirective {
    /// Registry id, or [`IDENTITY_REF_GENERIC`] for an invented extra.
    pub identity_ref: String,
    pub action: String,
    pub expression: String,
}

/// The location of one panel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LocationDirective {
    /// Registry id, or [`IDENTITY_REF_NEW`] for an invented location.
    pub identity_ref: String,
    pub time_of_day: String,
    pub weather: String,
}

/// Framing intent for a panel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ShotType {
    Establishing,
    Action,
    Reaction,
    Detail,
    Transition,
}

impl ShotType {
    /// Framing bias attached to the synthesis request. Phrased as a
    /// preference so the capability keeps the final say on composition.
    pub fn framing_hint(&self) -> &'static str {
        match self {
            ShotType::Establishing => "favor wide framing with deep depth of field",
            ShotType::Action => "favor dynamic framing that emphasizes motion",
            ShotType::Reaction => "favor close framing on faces",
            ShotType::Detail => "favor a tight close-up on a single element",
            ShotType::Transition => "favor neutral framing bridging two scenes",
        }
    }
}

/// One panel's generation instructions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShotPlan {
    pub panel_number: u32,
    pub scene_description: String,
    pub characters: Vec<CharacterDirective>,
    pub location: LocationDirective,
    pub camera_angle: String,
    pub shot_type: ShotType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dialogue_hint: Option<String>,
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

/// Validate a macro plan against the requested page count.
///
/// Rules:
/// - Exactly `expected_pages` entries.
/// - Page numbers are 1..=n in order.
/// - Every panel count is in `1..=MAX_PANELS_PER_PAGE`.
pub fn validate_page_plans(plans: &[PagePlan], expected_pages: u32) -> Result<(), CoreError> {
    if plans.len() as u32 != expected_pages {
        return Err(CoreError::Validation(format!(
            "Macro plan has {} pages, expected exactly {expected_pages}",
            plans.len()
        )));
    }
    for (index, plan) in plans.iter().enumerate() {
        let expected_number = index as u32 + 1;
        if plan.page_number != expected_number {
            return Err(CoreError::Validation(format!(
                "Page at index {index} is numbered {}, expected {expected_number}",
                plan.page_number
            )));
        }
        if plan.panel_count == 0 || plan.panel_count > MAX_PANELS_PER_PAGE {
            return Err(CoreError::Validation(format!(
                "Page {} has panel count {}, allowed range is 1..={MAX_PANELS_PER_PAGE}",
                plan.page_number, plan.panel_count
            )));
        }
    }
    Ok(())
}

/// Validate a shot list against the page's panel count.
///
/// Rules:
/// - Exactly `expected_panels` entries, numbered 1..=n in order.
/// - Every identity reference is non-empty (real ids are checked later by
///   the resolver; sentinels pass through here).
pub fn validate_shot_plans(plans: &[ShotPlan], expected_panels: u32) -> Result<(), CoreError> {
    if plans.len() as u32 != expected_panels {
        return Err(CoreError::Validation(format!(
            "Shot list has {} panels, expected exactly {expected_panels}",
            plans.len()
        )));
    }
    for (index, plan) in plans.iter().enumerate() {
        let expected_number = index as u32 + 1;
        if plan.panel_number != expected_number {
            return Err(CoreError::Validation(format!(
                "Panel at index {index} is numbered {}, expected {expected_number}",
                plan.panel_number
            )));
        }
        if plan.location.identity_ref.is_empty() {
            return Err(CoreError::Validation(format!(
                "Panel {} has an empty location reference (use \"{IDENTITY_REF_NEW}\" \
                 for an invented location)",
                plan.panel_number
            )));
        }
        for character in &plan.characters {
            if character.identity_ref.is_empty() {
                return Err(CoreError::Validation(format!(
                    "Panel {} has an empty character reference (use \
                     \"{IDENTITY_REF_GENERIC}\" for an invented character)",
                    plan.panel_number
                )));
            }
        }
    }
    Ok(())
}

/// Validate a requested page count for a full-narrative job.
pub fn validate_page_count(page_count: u32) -> Result<(), CoreError> {
    if page_count > MAX_PAGES_PER_JOB {
        return Err(CoreError::Validation(format!(
            "Page count {page_count} exceeds the maximum of {MAX_PAGES_PER_JOB}"
        )));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
