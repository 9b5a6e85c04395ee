//! Typed structured scene descriptions and the identity-preserving merge.
//!
//! A [`StructuredScene`] is the schema-constrained JSON document sent to
//! the image synthesis capability. The top-level fields the pipeline cares
//! about are typed; everything else round-trips untouched through `extra`.
//! [`SceneObject`] splits its attributes into static identity fields
//! (copied verbatim from a stored identity) and dynamic per-panel fields
//! (replaced for every shot), so the preserve-static/override-dynamic
//! contract is enforced by the types rather than by convention.

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// SceneObject
// ---------------------------------------------------------------------------

/// One object (character, prop, creature) in a structured scene.
///
/// Static fields are the consistency basis: once an identity is captured,
/// they must survive every subsequent merge byte-for-byte. Dynamic fields
/// change per panel and are always taken from the shot being rendered.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SceneObject {
    /// Free-text label for the object (e.g. `"Rex"`, `"stone archway"`).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    // -- static identity fields --
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shape_and_color: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub texture: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub clothing: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub material: Option<String>,

    // -- dynamic per-panel fields --
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pose_action: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expression: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub position: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub orientation: Option<String>,

    /// Fields the capability understands but this service does not model.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl SceneObject {
    /// True when at least one static identity field is present.
    pub fn has_static_fields(&self) -> bool {
        self.shape_and_color.is_some()
            || self.texture.is_some()
            || self.clothing.is_some()
            || self.material.is_some()
    }
}

/// Merge a stored identity object with a panel-specific object.
///
/// Static fields come from the identity wherever the identity defines
/// them (the panel may only fill gaps the identity left open). Dynamic
/// fields are taken from the panel wholesale, including absent ones:
/// a panel that does not pin a pose leaves the capability free to choose.
/// The identity's `extra` fields are carried over; panel `extra` entries
/// are layered on top without displacing identity keys.
pub fn merge_identity_object(identity: &SceneObject, panel: &SceneObject) -> SceneObject {
    let mut extra = identity.extra.clone();
    for (key, value) in &panel.extra {
        extra.entry(key.clone()).or_insert_with(|| value.clone());
    }

    SceneObject {
        description: identity
            .description
            .clone()
            .or_else(|| panel.description.clone()),
        shape_and_color: identity
            .shape_and_color
            .clone()
            .or_else(|| panel.shape_and_color.clone()),
        texture: identity.texture.clone().or_else(|| panel.texture.clone()),
        clothing: identity.clothing.clone().or_else(|| panel.clothing.clone()),
        material: identity.material.clone().or_else(|| panel.material.clone()),
        pose_action: panel.pose_action.clone(),
        expression: panel.expression.clone(),
        position: panel.position.clone(),
        orientation: panel.orientation.clone(),
        extra,
    }
}

// ---------------------------------------------------------------------------
// StructuredScene
// ---------------------------------------------------------------------------

/// The schema-constrained scene document sent to the image synthesis
/// capability.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StructuredScene {
    /// Ordered object list; characters first, in shot-plan order.
    pub objects: Vec<SceneObject>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub background_setting: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lighting: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub aesthetics: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub photographic_characteristics: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub style_medium: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub artistic_style: Option<String>,

    /// Unmodeled top-level fields, passed through unchanged.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl StructuredScene {
    /// First object in the scene. For an identity reference sheet this is
    /// the subject the identity was captured from.
    pub fn primary_object(&self) -> Option<&SceneObject> {
        self.objects.first()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
