//! REST client for the structured generation HTTP endpoint.
//!
//! Wraps the capability's `/generate` endpoint using [`reqwest`]. Every
//! request carries a caller-side timeout: the capability has unbounded
//! network latency and the pipeline's failure scoping depends on calls
//! actually returning.

use std::time::Duration;

use async_trait::async_trait;

/// Default caller-side timeout for one generation call.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

/// Errors from the structured generation capability.
#[derive(Debug, thiserror::Error)]
pub enum TextGenError {
    /// The capability returned output that does not conform to the
    /// requested schema.
    #[error("Schema violation: {0}")]
    SchemaViolation(String),

    /// The capability could not be reached or refused the request
    /// (network, auth, rate limit, non-2xx status).
    #[error("Generation capability unavailable: {0}")]
    Unavailable(String),
}

/// The seam the planning stages program against.
///
/// Implementations must return a JSON value conforming to
/// `output_schema`, or fail; partial output is never returned.
#[async_trait]
pub trait StructuredGenerator: Send + Sync {
    async fn generate(
        &self,
        instructions: &str,
        user_prompt: &str,
        output_schema: &serde_json::Value,
    ) -> Result<serde_json::Value, TextGenError>;
}

/// HTTP client for a structured generation backend.
pub struct HttpStructuredGenerator {
    client: reqwest::Client,
    base_url: String,
}

impl HttpStructuredGenerator {
    /// Create a client with the default request timeout.
    ///
    /// * `base_url` - capability base URL, e.g. `http://host:7860`.
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

    /// Capability base URL.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

#[async_trait]
impl StructuredGenerator for HttpStructuredGenerator {
    /// Submit a generation request.
    ///
    /// Sends `POST /generate` with the instructions, prompt, and target
    /// schema. A non-2xx response or transport failure maps to
    /// [`TextGenError::Unavailable`]; a 2xx response that is not a JSON
    /// object maps to [`TextGenError::SchemaViolation`] (callers apply
    /// their own domain-level validation on top).
    async fn generate(
        &self,
        instructions: &str,
        user_prompt: &str,
        output_schema: &serde_json::Value,
    ) -> Result<serde_json::Value, TextGenError> {
        let body = serde_json::json!({
            "instructions": instructions,
            "prompt": user_prompt,
            "schema": output_schema,
        });

        let response = self
            .client
            .post(format!("{}/generate", self.base_url))
            .json(&body)
            .send()
            .await
            .map_err(|e| TextGenError::Unavailable(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<unreadable body>".to_string());
            return Err(TextGenError::Unavailable(format!(
                "generation backend returned {status}: {body}"
            )));
        }

        let value: serde_json::Value = response
            .json()
            .await
            .map_err(|e| TextGenError::SchemaViolation(format!("response is not JSON: {e}")))?;

        if !value.is_object() && !value.is_array() {
            return Err(TextGenError::SchemaViolation(format!(
                "response is not a structured value: {value}"
            )));
        }

        tracing::debug!(base_url = %self.base_url, "Structured generation call succeeded");
        Ok(value)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
