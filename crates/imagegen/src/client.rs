//! REST client for the image synthesis HTTP endpoint.
//!
//! Wraps the backend's `/generate` endpoint using [`reqwest`]. Requests
//! carry a caller-side timeout; rendering is slow but must not hang the
//! pipeline forever.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use panelforge_core::aspect::AspectRatio;
use panelforge_core::scene::StructuredScene;
use panelforge_core::types::Seed;

/// Default caller-side timeout for one synthesis call.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(300);

/// Errors from the image synthesis capability.
#[derive(Debug, thiserror::Error)]
pub enum ImageGenError {
    /// The backend could not be reached (network, DNS, TLS, timeout).
    #[error("Image synthesis request failed: {0}")]
    Request(String),

    /// The backend returned a non-2xx status code.
    #[error("Image synthesis backend error ({status}): {body}")]
    Backend {
        /// HTTP status code.
        status: u16,
        /// Raw response body for debugging.
        body: String,
    },

    /// The backend's response did not match the expected shape.
    #[error("Malformed synthesis response: {0}")]
    Malformed(String),
}

/// One synthesis request.
///
/// When `seed` is `None` the backend mints a fresh seed and reports it in
/// [`SynthesisResponse::seed`], which is what makes later regenerations
/// reproducible.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SynthesisRequest {
    pub structured_description: StructuredScene,
    pub aspect_ratio: AspectRatio,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seed: Option<Seed>,
    pub num_results: u32,
}

/// One rendered result.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageResult {
    pub urls: Vec<String>,
}

/// The backend's response to a synthesis request.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SynthesisResponse {
    pub images: Vec<ImageResult>,
    /// The seed actually used (echoed back, or freshly minted by the
    /// backend when the request carried none).
    pub seed: Seed,
    /// The description actually used, enabling later re-merge on
    /// regeneration.
    pub structured_description_used: StructuredScene,
}

impl SynthesisResponse {
    /// URL of the first rendered image, if any.
    pub fn first_url(&self) -> Option<&str> {
        self.images
            .first()
            .and_then(|image| image.urls.first())
            .map(String::as_str)
    }
}

/// The seam the asset synthesizer programs against.
#[async_trait]
pub trait ImageGenerator: Send + Sync {
    async fn generate(&self, request: &SynthesisRequest)
        -> Result<SynthesisResponse, ImageGenError>;
}

/// HTTP client for an image synthesis backend.
pub struct HttpImageGenerator {
    client: reqwest::Client,
    base_url: String,
}

impl HttpImageGenerator {
    /// Create a client with the default request timeout.
    ///
    /// * `base_url` - backend base URL, e.g. `http://host:8188`.
    pub fn new(base_url: String) -> Self {
        Self::with_timeout(base_url, DEFAULT_REQUEST_TIMEOUT)
    }

    /// Create a client with an explicit per-request timeout.
    pub fn with_timeout(base_url: String, timeout: Duration) -> Self {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());
        Self { client, base_url }
    }

    /// Backend base URL.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

#[async_trait]
impl ImageGenerator for HttpImageGenerator {
    /// Submit a synthesis request via `POST /generate`.
    async fn generate(
        &self,
        request: &SynthesisRequest,
    ) -> Result<SynthesisResponse, ImageGenError> {
        let response = self
            .client
            .post(format!("{}/generate", self.base_url))
            .json(request)
            .send()
            .await
            .map_err(|e| ImageGenError::Request(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<unreadable body>".to_string());
            return Err(ImageGenError::Backend {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: SynthesisResponse = response
            .json()
            .await
            .map_err(|e| ImageGenError::Malformed(e.to_string()))?;

        if parsed.first_url().is_none() {
            return Err(ImageGenError::Malformed(
                "backend reported success but returned no image urls".to_string(),
            ));
        }

        tracing::debug!(
            base_url = %self.base_url,
            seed = parsed.seed,
            "Image synthesis call succeeded",
        );
        Ok(parsed)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
