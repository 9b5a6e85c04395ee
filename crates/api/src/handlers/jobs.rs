//! Handlers for the `/jobs` resource.
//!
//! Creation is fire-and-forget: the handler records the job, spawns a
//! detached orchestrator run, and returns the job id before any
//! generation happens. Completion is observable only by polling.

use std::sync::Arc;

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use panelforge_core::aspect::AspectRatio;
use panelforge_core::error::CoreError;
use panelforge_pipeline::{GenerationMode, GenerationRequest};
use panelforge_store::{Job, JobType};

use crate::error::{AppError, AppResult};
use crate::state::AppState;

/// Panel count for a single-page job that does not specify one.
const DEFAULT_PANEL_COUNT: u32 = 3;

/// Rendering style when project settings carry none.
const DEFAULT_STYLE: &str = "clean ink-and-wash comic art";

// ---------------------------------------------------------------------------
// Request/response DTOs
// ---------------------------------------------------------------------------

/// Per-project rendering settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ProjectSettings {
    pub style: Option<String>,
    pub aspect_ratio: Option<String>,
}

/// Body of `POST /api/v1/jobs`.
///
/// Exactly one of `story_description` (full narrative) or
/// `page_description` (single page) must be present.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateJobRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub story_description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page_description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page_count: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub panel_count: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub project_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub project_settings: Option<ProjectSettings>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub aspect_ratio: Option<String>,
}

/// Query parameters for `GET /api/v1/jobs`.
#[derive(Debug, Deserialize)]
pub struct JobQuery {
    pub id: Option<String>,
}

// ---------------------------------------------------------------------------
// Create
// ---------------------------------------------------------------------------

/// POST /api/v1/jobs
///
/// Accept a generation request, create the job, and spawn a detached
/// orchestrator run for it. Returns 202 with the job id immediately;
/// the caller polls `GET /jobs?id=` for progress and results.
pub async fn create_job(
    State(state): State<AppState>,
    Json(input): Json<CreateJobRequest>,
) -> AppResult<impl IntoResponse> {
    let request = build_generation_request(&input)?;
    let job_type = match request.mode {
        GenerationMode::FullNarrative { .. } => JobType::FullNarrative,
        GenerationMode::SinglePage { .. } => JobType::SinglePage,
    };

    let input_value = serde_json::to_value(&input)
        .map_err(|e| AppError::InternalError(format!("failed to echo job input: {e}")))?;
    let job = state.store.create(job_type, input_value).await;

    tracing::info!(job_id = %job.id, job_type = ?job.job_type, "Job submitted");

    // Fire and forget: the run communicates only through the job store,
    // never through this request's return path.
    let orchestrator = Arc::clone(&state.orchestrator);
    let job_id = job.id;
    tokio::spawn(async move {
        orchestrator.run(job_id, request).await;
    });

    Ok((
        StatusCode::ACCEPTED,
        Json(serde_json::json!({ "success": true, "jobId": job.id })),
    ))
}

/// Translate the HTTP body into a pipeline request, rejecting bodies
/// that name neither (or an empty) description.
fn build_generation_request(input: &CreateJobRequest) -> Result<GenerationRequest, AppError> {
    let settings = input.project_settings.clone().unwrap_or_default();
    let style = settings
        .style
        .filter(|style| !style.trim().is_empty())
        .unwrap_or_else(|| DEFAULT_STYLE.to_string());

    let aspect_ratio = match settings.aspect_ratio.or_else(|| input.aspect_ratio.clone()) {
        Some(raw) => AspectRatio::snap_str(&raw).map_err(AppError::Core)?,
        None => AspectRatio::default(),
    };

    let mode = match (&input.story_description, &input.page_description) {
        (Some(story), _) if !story.trim().is_empty() => GenerationMode::FullNarrative {
            story_description: story.clone(),
            page_count: input.page_count.unwrap_or(1),
        },
        (_, Some(page)) if !page.trim().is_empty() => GenerationMode::SinglePage {
            page_description: page.clone(),
            panel_count: input.panel_count.unwrap_or(DEFAULT_PANEL_COUNT),
        },
        _ => {
            return Err(AppError::BadRequest(
                "Either storyDescription or pageDescription is required".into(),
            ))
        }
    };

    Ok(GenerationRequest {
        mode,
        style,
        aspect_ratio,
    })
}

// ---------------------------------------------------------------------------
// Poll
// ---------------------------------------------------------------------------

/// GET /api/v1/jobs?id={jobId}
///
/// Poll a job's cumulative state. 400 when `id` is missing or not a
/// UUID; 404 when the job is unknown or already TTL-evicted.
pub async fn get_job(
    State(state): State<AppState>,
    Query(params): Query<JobQuery>,
) -> AppResult<Json<Job>> {
    let raw_id = params.id.ok_or_else(|| {
        AppError::BadRequest("Missing required query parameter: id".to_string())
    })?;
    let job_id = Uuid::parse_str(&raw_id)
        .map_err(|_| AppError::BadRequest(format!("Invalid job id: {raw_id}")))?;

    let job = state
        .store
        .get(job_id)
        .await
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "Job",
            id: raw_id,
        }))?;

    Ok(Json(job))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn base_request() -> CreateJobRequest {
        CreateJobRequest {
            story_description: None,
            page_description: None,
            page_count: None,
            panel_count: None,
            project_type: None,
            project_settings: None,
            aspect_ratio: None,
        }
    }

    #[test]
    fn story_description_selects_full_narrative() {
        let request = CreateJobRequest {
            story_description: Some("A hero finds a hidden door".into()),
            page_count: Some(3),
            ..base_request()
        };

        let built = build_generation_request(&request).unwrap();
        match built.mode {
            GenerationMode::FullNarrative { page_count, .. } => assert_eq!(page_count, 3),
            other => panic!("expected full narrative, got {other:?}"),
        }
        assert_eq!(built.style, DEFAULT_STYLE);
    }

    #[test]
    fn page_description_selects_single_page_with_default_panels() {
        let request = CreateJobRequest {
            page_description: Some("The hero opens the door".into()),
            ..base_request()
        };

        let built = build_generation_request(&request).unwrap();
        match built.mode {
            GenerationMode::SinglePage { panel_count, .. } => {
                assert_eq!(panel_count, DEFAULT_PANEL_COUNT)
            }
            other => panic!("expected single page, got {other:?}"),
        }
    }

    #[test]
    fn missing_descriptions_are_rejected() {
        assert!(build_generation_request(&base_request()).is_err());

        let blank = CreateJobRequest {
            story_description: Some("   ".into()),
            ..base_request()
        };
        assert!(build_generation_request(&blank).is_err());
    }

    #[test]
    fn aspect_ratio_is_snapped_from_settings() {
        let request = CreateJobRequest {
            story_description: Some("story".into()),
            project_settings: Some(ProjectSettings {
                style: Some("watercolor".into()),
                aspect_ratio: Some("21:9".into()),
            }),
            ..base_request()
        };

        let built = build_generation_request(&request).unwrap();
        assert_eq!(built.aspect_ratio, AspectRatio::Wide);
        assert_eq!(built.style, "watercolor");
    }

    #[test]
    fn malformed_aspect_ratio_is_rejected() {
        let request = CreateJobRequest {
            story_description: Some("story".into()),
            aspect_ratio: Some("cinema".into()),
            ..base_request()
        };
        assert!(build_generation_request(&request).is_err());
    }
}
