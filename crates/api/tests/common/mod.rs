//! Shared harness for the API integration tests.
//!
//! Builds the full application router -- same middleware stack as
//! `main.rs` -- over stub capability backends, so tests exercise exactly
//! what production serves without a network.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::header::{AUTHORIZATION, CONTENT_TYPE};
use axum::http::{HeaderName, Method, Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use tower::ServiceExt;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::CorsLayer;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::Level;

use panelforge_api::config::ServerConfig;
use panelforge_api::routes;
use panelforge_api::state::AppState;
use panelforge_core::identity::IdentityRegistry;
use panelforge_events::JobEventBus;
use panelforge_imagegen::{
    ImageGenError, ImageGenerator, ImageResult, SynthesisRequest, SynthesisResponse,
};
use panelforge_pipeline::Orchestrator;
use panelforge_store::{JobStore, MemoryJobStore};
use panelforge_textgen::{StructuredGenerator, TextGenError};

/// Seed the stub image backend mints when a request carries none.
pub const STUB_MINTED_SEED: u64 = 4242;

// ---------------------------------------------------------------------------
// Stub capabilities
// ---------------------------------------------------------------------------

/// Produces a conforming plan for whatever schema the planner sends:
/// macro schemas get pages (two panels each), shot schemas get panels
/// referencing the ad-hoc sentinels.
pub struct StubGenerator;

#[async_trait]
impl StructuredGenerator for StubGenerator {
    async fn generate(
        &self,
        _instructions: &str,
        _user_prompt: &str,
        output_schema: &serde_json::Value,
    ) -> Result<serde_json::Value, TextGenError> {
        if let Some(pages_schema) = output_schema.pointer("/properties/pages") {
            let count = pages_schema["minItems"].as_u64().unwrap_or(1);
            let pages: Vec<serde_json::Value> = (1..=count)
                .map(|n| {
                    serde_json::json!({
                        "pageNumber": n,
                        "pageDescription": format!("beats of page {n}"),
                        "mood": "tense",
                        "panelCount": 2,
                    })
                })
                .collect();
            Ok(serde_json::json!({ "pages": pages }))
        } else if let Some(panels_schema) = output_schema.pointer("/properties/panels") {
            let count = panels_schema["minItems"].as_u64().unwrap_or(1);
            let panels: Vec<serde_json::Value> = (1..=count)
                .map(|n| {
                    serde_json::json!({
                        "panelNumber": n,
                        "sceneDescription": format!("panel {n}"),
                        "characters": [
                            { "identityRef": "generic", "action": "moving", "expression": "calm" }
                        ],
                        "location": {
                            "identityRef": "new", "timeOfDay": "day", "weather": "clear"
                        },
                        "cameraAngle": "eye level",
                        "shotType": "action",
                    })
                })
                .collect();
            Ok(serde_json::json!({ "panels": panels }))
        } else {
            Err(TextGenError::SchemaViolation(
                "unrecognised schema in stub".into(),
            ))
        }
    }
}

/// Echoes the request description back and reuses or mints a seed.
pub struct StubImageGen;

#[async_trait]
impl ImageGenerator for StubImageGen {
    async fn generate(
        &self,
        request: &SynthesisRequest,
    ) -> Result<SynthesisResponse, ImageGenError> {
        Ok(SynthesisResponse {
            images: vec![ImageResult {
                urls: vec!["http://img/stub.png".into()],
            }],
            seed: request.seed.unwrap_or(STUB_MINTED_SEED),
            structured_description_used: request.structured_description.clone(),
        })
    }
}

// ---------------------------------------------------------------------------
// App construction
// ---------------------------------------------------------------------------

/// Build a test `ServerConfig` with safe defaults.
pub fn test_config() -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:5173".to_string()],
        request_timeout_secs: 30,
        textgen_url: "http://stub.invalid".to_string(),
        imagegen_url: "http://stub.invalid".to_string(),
        capability_timeout_secs: 5,
    }
}

/// Build the full application router with all middleware layers over
/// stub capabilities. Mirrors the router construction in `main.rs` so
/// integration tests exercise the same stack production uses.
pub fn build_test_app() -> Router {
    let store: Arc<dyn JobStore> = Arc::new(MemoryJobStore::new());
    let registry = Arc::new(IdentityRegistry::new());
    let events = Arc::new(JobEventBus::default());
    let textgen: Arc<dyn StructuredGenerator> = Arc::new(StubGenerator);
    let imagegen: Arc<dyn ImageGenerator> = Arc::new(StubImageGen);

    let orchestrator = Arc::new(Orchestrator::new(
        Arc::clone(&store),
        Arc::clone(&registry),
        textgen,
        Arc::clone(&imagegen),
        Arc::clone(&events),
    ));

    let state = AppState {
        store,
        registry,
        orchestrator,
        imagegen,
        events,
        config: Arc::new(test_config()),
    };

    let cors = CorsLayer::new()
        .allow_origin(["http://localhost:5173".parse().unwrap()])
        .allow_methods([Method::GET, Method::POST, Method::DELETE])
        .allow_headers([CONTENT_TYPE, AUTHORIZATION])
        .allow_credentials(true)
        .max_age(Duration::from_secs(3600));

    let request_id_header = HeaderName::from_static("x-request-id");

    Router::new()
        .merge(routes::health::router())
        .nest("/api/v1", routes::api_routes())
        .layer(CatchPanicLayer::new())
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            Duration::from_secs(30),
        ))
        .layer(PropagateRequestIdLayer::new(request_id_header.clone()))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(SetRequestIdLayer::new(request_id_header, MakeRequestUuid))
        .layer(cors)
        .with_state(state)
}

// ---------------------------------------------------------------------------
// Request helpers
// ---------------------------------------------------------------------------

/// Send a GET and return `(status, parsed JSON body)`.
pub async fn get_json(app: &Router, uri: &str) -> (StatusCode, serde_json::Value) {
    let response = app
        .clone()
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    split_response(response).await
}

/// Send a POST with a JSON body and return `(status, parsed JSON body)`.
pub async fn post_json(
    app: &Router,
    uri: &str,
    body: serde_json::Value,
) -> (StatusCode, serde_json::Value) {
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri(uri)
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
        .unwrap();
    split_response(response).await
}

async fn split_response(
    response: axum::response::Response,
) -> (StatusCode, serde_json::Value) {
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json = if bytes.is_empty() {
        serde_json::Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(serde_json::Value::Null)
    };
    (status, json)
}

/// Poll `GET /api/v1/jobs?id=` until the job reaches a terminal status.
pub async fn poll_until_terminal(app: &Router, job_id: &str) -> serde_json::Value {
    for _ in 0..200 {
        let (status, body) = get_json(app, &format!("/api/v1/jobs?id={job_id}")).await;
        assert_eq!(status, StatusCode::OK, "poll failed: {body}");
        match body["status"].as_str() {
            Some("complete") | Some("error") => return body,
            _ => tokio::time::sleep(Duration::from_millis(10)).await,
        }
    }
    panic!("job {job_id} did not reach a terminal status in time");
}
