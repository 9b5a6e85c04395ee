//! Shared test doubles for the pipeline integration tests.
//!
//! Mirrors the production wiring with scripted capability backends and a
//! recording job store, so the orchestrator is exercised through the
//! same `JobStore` trait object the API binary injects.

use std::collections::{HashSet, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::Utc;

use panelforge_core::identity::{IdentityKind, IdentityRegistry, VisualIdentity};
use panelforge_core::panel::GeneratedPanel;
use panelforge_core::scene::{SceneObject, StructuredScene};
use panelforge_core::types::Seed;
use panelforge_events::JobEventBus;
use panelforge_imagegen::{
    ImageGenError, ImageGenerator, ImageResult, SynthesisRequest, SynthesisResponse,
};
use panelforge_pipeline::Orchestrator;
use panelforge_store::{Job, JobStore, JobType, MemoryJobStore, ProgressUpdate};
use panelforge_textgen::{StructuredGenerator, TextGenError};
use uuid::Uuid;

// ---------------------------------------------------------------------------
// Scripted structured generation backend
// ---------------------------------------------------------------------------

/// Replays scripted planning responses. Macro and shot calls are told
/// apart by the schema the planner sends.
pub struct ScriptedGenerator {
    macro_response: Mutex<Result<serde_json::Value, String>>,
    shot_responses: Mutex<VecDeque<Result<serde_json::Value, String>>>,
    pub macro_calls: AtomicUsize,
    pub shot_calls: AtomicUsize,
}

impl ScriptedGenerator {
    pub fn new(
        macro_response: Result<serde_json::Value, String>,
        shot_responses: Vec<Result<serde_json::Value, String>>,
    ) -> Self {
        Self {
            macro_response: Mutex::new(macro_response),
            shot_responses: Mutex::new(shot_responses.into()),
            macro_calls: AtomicUsize::new(0),
            shot_calls: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl StructuredGenerator for ScriptedGenerator {
    async fn generate(
        &self,
        _instructions: &str,
        _user_prompt: &str,
        output_schema: &serde_json::Value,
    ) -> Result<serde_json::Value, TextGenError> {
        let is_macro = output_schema.pointer("/properties/pages").is_some();
        let response = if is_macro {
            self.macro_calls.fetch_add(1, Ordering::SeqCst);
            self.macro_response.lock().unwrap().clone()
        } else {
            self.shot_calls.fetch_add(1, Ordering::SeqCst);
            self.shot_responses
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Err("no scripted shot response left".into()))
        };
        response.map_err(TextGenError::Unavailable)
    }
}

// ---------------------------------------------------------------------------
// Counting image synthesis backend
// ---------------------------------------------------------------------------

/// Records every request and fails on the scripted call indices.
pub struct CountingImageGen {
    pub requests: Mutex<Vec<SynthesisRequest>>,
    fail_indices: HashSet<usize>,
    calls: AtomicUsize,
}

impl CountingImageGen {
    pub fn new(fail_indices: impl IntoIterator<Item = usize>) -> Self {
        Self {
            requests: Mutex::new(Vec::new()),
            fail_indices: fail_indices.into_iter().collect(),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ImageGenerator for CountingImageGen {
    async fn generate(
        &self,
        request: &SynthesisRequest,
    ) -> Result<SynthesisResponse, ImageGenError> {
        let index = self.calls.fetch_add(1, Ordering::SeqCst);
        self.requests.lock().unwrap().push(request.clone());

        if self.fail_indices.contains(&index) {
            return Err(ImageGenError::Request(format!(
                "induced failure on call {index}"
            )));
        }

        Ok(SynthesisResponse {
            images: vec![ImageResult {
                urls: vec![format!("http://img/{index}.png")],
            }],
            // A fresh backend-minted seed when the request omitted one.
            seed: request.seed.unwrap_or(9000 + index as Seed),
            structured_description_used: request.structured_description.clone(),
        })
    }
}

// ---------------------------------------------------------------------------
// Recording job store
// ---------------------------------------------------------------------------

/// Delegates to [`MemoryJobStore`] while recording every percent the
/// orchestrator writes, for monotonicity assertions.
pub struct RecordingStore {
    inner: MemoryJobStore,
    pub percents: Mutex<Vec<u8>>,
}

impl RecordingStore {
    pub fn new() -> Self {
        Self {
            inner: MemoryJobStore::new(),
            percents: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl JobStore for RecordingStore {
    async fn create(&self, job_type: JobType, input: serde_json::Value) -> Job {
        self.inner.create(job_type, input).await
    }

    async fn get(&self, id: Uuid) -> Option<Job> {
        self.inner.get(id).await
    }

    async fn update_progress(&self, id: Uuid, update: ProgressUpdate) -> Option<Job> {
        let result = self.inner.update_progress(id, update).await;
        if let Some(job) = &result {
            self.percents.lock().unwrap().push(job.progress.percent);
        }
        result
    }

    async fn append_item(&self, id: Uuid, item: GeneratedPanel) -> Option<Job> {
        self.inner.append_item(id, item).await
    }

    async fn complete(&self, id: Uuid, result: serde_json::Value) -> Option<Job> {
        self.inner.complete(id, result).await
    }

    async fn fail(&self, id: Uuid, message: &str) -> Option<Job> {
        self.inner.fail(id, message).await
    }

    async fn delete(&self, id: Uuid) -> bool {
        self.inner.delete(id).await
    }
}

// ---------------------------------------------------------------------------
// Fixtures
// ---------------------------------------------------------------------------

/// A macro-plan response with one page per entry of `panel_counts`.
pub fn pages_json(panel_counts: &[u32]) -> serde_json::Value {
    let pages: Vec<serde_json::Value> = panel_counts
        .iter()
        .enumerate()
        .map(|(index, count)| {
            serde_json::json!({
                "pageNumber": index + 1,
                "pageDescription": format!("beats of page {}", index + 1),
                "mood": "tense",
                "panelCount": count,
            })
        })
        .collect();
    serde_json::json!({ "pages": pages })
}

/// A shot-list response with `count` panels referencing the given ids.
pub fn panels_json(count: u32, character_ref: &str, location_ref: &str) -> serde_json::Value {
    let panels: Vec<serde_json::Value> = (1..=count)
        .map(|n| {
            serde_json::json!({
                "panelNumber": n,
                "sceneDescription": format!("panel {n}"),
                "characters": [
                    { "identityRef": character_ref, "action": "moving", "expression": "focused" }
                ],
                "location": {
                    "identityRef": location_ref, "timeOfDay": "dusk", "weather": "clear"
                },
                "cameraAngle": "eye level",
                "shotType": "action",
            })
        })
        .collect();
    serde_json::json!({ "panels": panels })
}

/// Rex: a character identity with full static fields and seed 42.
pub fn rex() -> VisualIdentity {
    VisualIdentity {
        id: "c1".into(),
        name: "Rex".into(),
        kind: IdentityKind::Character,
        structured_description: StructuredScene {
            objects: vec![SceneObject {
                description: Some("Rex".into()),
                shape_and_color: Some("grey wolfhound".into()),
                texture: Some("wiry fur".into()),
                clothing: Some("red bandana".into()),
                ..Default::default()
            }],
            ..Default::default()
        },
        seed: Some(42),
        created_at: Utc::now(),
    }
}

/// Cave: a location identity. Seed is configurable so the seed policy
/// can be tested from both sides.
pub fn cave(seed: Option<Seed>) -> VisualIdentity {
    VisualIdentity {
        id: "l1".into(),
        name: "Cave".into(),
        kind: IdentityKind::Location,
        structured_description: StructuredScene {
            background_setting: Some("a mossy cave mouth".into()),
            lighting: Some("cold ambient glow".into()),
            ..Default::default()
        },
        seed,
        created_at: Utc::now(),
    }
}

/// Wire an orchestrator over the given doubles.
pub fn orchestrator(
    store: Arc<RecordingStore>,
    registry: Arc<IdentityRegistry>,
    generator: Arc<ScriptedGenerator>,
    imagegen: Arc<CountingImageGen>,
) -> Orchestrator {
    Orchestrator::new(
        store as Arc<dyn JobStore>,
        registry,
        generator as Arc<dyn StructuredGenerator>,
        imagegen as Arc<dyn ImageGenerator>,
        Arc::new(JobEventBus::default()),
    )
}
