//! Asset synthesis: one shot plan + resolved identity data -> one panel.
//!
//! Builds the merged structured description (static identity fields
//! preserved verbatim, dynamic fields overwritten per panel), applies
//! the seed policy, and calls the image synthesis capability. Capability
//! errors are caught here and recorded on the returned panel; they never
//! propagate past this boundary.

use std::sync::Arc;

use panelforge_core::aspect::AspectRatio;
use panelforge_core::panel::GeneratedPanel;
use panelforge_core::plan::ShotPlan;
use panelforge_core::scene::{merge_identity_object, SceneObject, StructuredScene};
use panelforge_core::types::Seed;
use panelforge_imagegen::{ImageGenerator, SynthesisRequest};

use crate::resolver::ResolvedContext;

/// Renders panels through the image synthesis capability.
pub struct AssetSynthesizer {
    imagegen: Arc<dyn ImageGenerator>,
}

impl AssetSynthesizer {
    pub fn new(imagegen: Arc<dyn ImageGenerator>) -> Self {
        Self { imagegen }
    }

    /// Render one panel. Infallible at the signature: any capability
    /// error becomes a failed [`GeneratedPanel`] carrying the message.
    pub async fn synthesize(
        &self,
        page_number: u32,
        shot_plan: &ShotPlan,
        context: &ResolvedContext,
        style: &str,
        aspect_ratio: AspectRatio,
    ) -> GeneratedPanel {
        let scene = build_scene(shot_plan, context, style);
        let request = SynthesisRequest {
            structured_description: scene.clone(),
            aspect_ratio,
            seed: select_seed(context),
            num_results: 1,
        };

        match self.imagegen.generate(&request).await {
            Ok(response) => match response.first_url() {
                Some(url) => GeneratedPanel::succeeded(
                    page_number,
                    shot_plan.clone(),
                    url.to_string(),
                    response.seed,
                    response.structured_description_used,
                ),
                None => GeneratedPanel::failed(
                    page_number,
                    shot_plan.clone(),
                    Some(scene),
                    "synthesis succeeded but returned no image url".to_string(),
                ),
            },
            Err(e) => {
                tracing::warn!(
                    page_number,
                    panel_number = shot_plan.panel_number,
                    error = %e,
                    "Panel synthesis failed",
                );
                GeneratedPanel::failed(page_number, shot_plan.clone(), Some(scene), e.to_string())
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Scene merge
// ---------------------------------------------------------------------------

/// Build the merged scene description for one panel.
///
/// - Characters become the ordered object list, each merged with its
///   resolved identity (static fields preserved, dynamics from the shot).
/// - The location's static background fields become the scene background;
///   time of day and weather drive the lighting line.
/// - `camera_angle` is written verbatim; the shot type adds a framing
///   bias phrased as a preference.
fn build_scene(shot_plan: &ShotPlan, context: &ResolvedContext, style: &str) -> StructuredScene {
    let objects = context
        .characters
        .iter()
        .map(|character| {
            let panel_object = SceneObject {
                pose_action: Some(character.directive.action.clone()),
                expression: Some(character.directive.expression.clone()),
                ..Default::default()
            };
            match character
                .description
                .as_ref()
                .and_then(|description| description.primary_object())
            {
                Some(identity_object) => merge_identity_object(identity_object, &panel_object),
                // Degraded mode: no stored identity, invent from the shot.
                None => panel_object,
            }
        })
        .collect();

    let location_description = context.location.description.as_ref();

    let background_setting = location_description
        .and_then(|description| description.background_setting.clone())
        .unwrap_or_else(|| shot_plan.scene_description.clone());

    let mut lighting_parts = vec![
        shot_plan.location.time_of_day.clone(),
        shot_plan.location.weather.clone(),
    ];
    if let Some(location_lighting) =
        location_description.and_then(|description| description.lighting.clone())
    {
        lighting_parts.insert(0, location_lighting);
    }

    StructuredScene {
        objects,
        background_setting: Some(background_setting),
        lighting: Some(lighting_parts.join(", ")),
        aesthetics: location_description
            .and_then(|description| description.aesthetics.clone()),
        photographic_characteristics: Some(format!(
            "{}; {}",
            shot_plan.camera_angle,
            shot_plan.shot_type.framing_hint()
        )),
        style_medium: Some(style.to_string()),
        artistic_style: location_description
            .and_then(|description| description.artistic_style.clone())
            .or_else(|| Some(style.to_string())),
        extra: serde_json::Map::new(),
    }
}

// ---------------------------------------------------------------------------
// Seed policy
// ---------------------------------------------------------------------------

/// Pick the seed for a synthesis request.
///
/// The seed is omitted (the backend then mints a fresh one) unless every
/// contributing resolved identity carries a seed. When they all do, the
/// dominant identity wins: the first seeded character in shot-plan order,
/// falling back to the location when no character contributes. Ad-hoc
/// participants have no identity and do not block reuse.
pub fn select_seed(context: &ResolvedContext) -> Option<Seed> {
    let mut contributing: Vec<Option<Seed>> = context
        .characters
        .iter()
        .filter(|character| character.description.is_some())
        .map(|character| character.seed)
        .collect();
    if context.location.description.is_some() {
        contributing.push(context.location.seed);
    }

    if contributing.is_empty() || contributing.iter().any(Option::is_none) {
        return None;
    }

    context
        .characters
        .iter()
        .find(|character| character.description.is_some() && character.seed.is_some())
        .and_then(|character| character.seed)
        .or(context.location.seed)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
