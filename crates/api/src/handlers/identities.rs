//! Handlers for the `/identities` resource.
//!
//! Registering an identity synthesizes one reference image and captures
//! the description the capability actually used, plus the seed, as the
//! identity's permanent consistency basis. The only later mutation is
//! an explicit regeneration.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use panelforge_core::aspect::AspectRatio;
use panelforge_core::error::CoreError;
use panelforge_core::identity::{IdentityKind, VisualIdentity};
use panelforge_core::scene::{SceneObject, StructuredScene};
use panelforge_imagegen::SynthesisRequest;

use crate::error::{AppError, AppResult};
use crate::response::DataResponse;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// DTOs
// ---------------------------------------------------------------------------

/// Body of `POST /api/v1/identities`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateIdentityRequest {
    pub name: String,
    pub kind: IdentityKind,
    /// Free-text visual description to synthesize the reference sheet
    /// from.
    pub description: String,
    /// Reuse the session's canonical seed instead of letting the
    /// backend mint one.
    #[serde(default)]
    pub inherit_master_seed: bool,
}

/// Body of `POST /api/v1/identities/{id}/regenerate`.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RegenerateIdentityRequest {
    /// New visual description; omitted means re-render the stored one.
    pub description: Option<String>,
    pub inherit_master_seed: bool,
}

/// An identity plus the reference image it was captured from.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IdentityWithReference {
    #[serde(flatten)]
    pub identity: VisualIdentity,
    pub reference_image_url: Option<String>,
}

// ---------------------------------------------------------------------------
// Create
// ---------------------------------------------------------------------------

/// POST /api/v1/identities
///
/// Synthesize a reference sheet for the described character or location
/// and register the captured description + seed. 409 when the name is
/// already taken, 502 when the synthesis capability fails.
pub async fn create(
    State(state): State<AppState>,
    Json(input): Json<CreateIdentityRequest>,
) -> AppResult<(StatusCode, Json<DataResponse<IdentityWithReference>>)> {
    if input.name.trim().is_empty() {
        return Err(AppError::Core(CoreError::Validation(
            "Identity name must not be empty".to_string(),
        )));
    }
    if input.description.trim().is_empty() {
        return Err(AppError::Core(CoreError::Validation(
            "Identity description must not be empty".to_string(),
        )));
    }

    let seed = if input.inherit_master_seed {
        state.registry.master_seed().await
    } else {
        None
    };

    let request = SynthesisRequest {
        structured_description: reference_sheet_scene(input.kind, &input.description),
        aspect_ratio: AspectRatio::Square,
        seed,
        num_results: 1,
    };
    let response = state
        .imagegen
        .generate(&request)
        .await
        .map_err(|e| AppError::Upstream(e.to_string()))?;

    let identity = VisualIdentity {
        id: Uuid::new_v4().to_string(),
        name: input.name,
        kind: input.kind,
        structured_description: response.structured_description_used.clone(),
        seed: Some(response.seed),
        created_at: Utc::now(),
    };

    let registered = state.registry.register(identity).await?;

    tracing::info!(
        identity_id = %registered.id,
        name = %registered.name,
        kind = ?registered.kind,
        seed = ?registered.seed,
        "Identity registered",
    );

    Ok((
        StatusCode::CREATED,
        Json(DataResponse {
            data: IdentityWithReference {
                identity: registered,
                reference_image_url: response.first_url().map(str::to_string),
            },
        }),
    ))
}

// ---------------------------------------------------------------------------
// List
// ---------------------------------------------------------------------------

/// GET /api/v1/identities
pub async fn list(
    State(state): State<AppState>,
) -> AppResult<Json<DataResponse<Vec<VisualIdentity>>>> {
    let identities = state.registry.list().await;
    Ok(Json(DataResponse { data: identities }))
}

// ---------------------------------------------------------------------------
// Regenerate
// ---------------------------------------------------------------------------

/// POST /api/v1/identities/{id}/regenerate
///
/// Re-synthesize the identity's reference sheet, replacing its captured
/// description and seed. This is the only mutation an identity supports.
pub async fn regenerate(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(input): Json<RegenerateIdentityRequest>,
) -> AppResult<Json<DataResponse<IdentityWithReference>>> {
    let existing = state
        .registry
        .get(&id)
        .await
        .ok_or_else(|| AppError::Core(CoreError::NotFound {
            entity: "Identity",
            id: id.clone(),
        }))?;

    let structured_description = match &input.description {
        Some(text) if !text.trim().is_empty() => reference_sheet_scene(existing.kind, text),
        _ => existing.structured_description.clone(),
    };
    let seed = if input.inherit_master_seed {
        state.registry.master_seed().await
    } else {
        None
    };

    let request = SynthesisRequest {
        structured_description,
        aspect_ratio: AspectRatio::Square,
        seed,
        num_results: 1,
    };
    let response = state
        .imagegen
        .generate(&request)
        .await
        .map_err(|e| AppError::Upstream(e.to_string()))?;

    let updated = state
        .registry
        .regenerate(
            &id,
            response.structured_description_used.clone(),
            Some(response.seed),
        )
        .await?;

    tracing::info!(identity_id = %updated.id, seed = ?updated.seed, "Identity regenerated");

    Ok(Json(DataResponse {
        data: IdentityWithReference {
            identity: updated,
            reference_image_url: response.first_url().map(str::to_string),
        },
    }))
}

// ---------------------------------------------------------------------------
// Reference sheet construction
// ---------------------------------------------------------------------------

/// Build the scene for an identity reference sheet.
///
/// Characters are posed alone on a neutral backdrop so the capability's
/// returned description captures the subject, not a scene. Locations
/// put the description into the background fields instead.
fn reference_sheet_scene(kind: IdentityKind, description: &str) -> StructuredScene {
    match kind {
        IdentityKind::Character => StructuredScene {
            objects: vec![SceneObject {
                description: Some(description.to_string()),
                pose_action: Some("standing at rest, full body visible".to_string()),
                expression: Some("neutral".to_string()),
                ..Default::default()
            }],
            background_setting: Some("plain neutral backdrop".to_string()),
            photographic_characteristics: Some("character reference sheet, eye level".to_string()),
            ..Default::default()
        },
        IdentityKind::Location => StructuredScene {
            objects: Vec::new(),
            background_setting: Some(description.to_string()),
            photographic_characteristics: Some(
                "wide establishing view, deep depth of field".to_string(),
            ),
            ..Default::default()
        },
    }
}
