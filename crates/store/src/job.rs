//! Job entity models and progress DTOs.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use panelforge_core::panel::GeneratedPanel;
use panelforge_core::types::Timestamp;

/// The two generation modes sharing the orchestration loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobType {
    /// Plan and render every page of a story.
    FullNarrative,
    /// Render one page from a provided page description.
    SinglePage,
}

/// Lifecycle states of a job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Pending,
    Planning,
    Generating,
    Complete,
    Error,
}

impl JobStatus {
    /// Terminal states accept no further writes.
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStatus::Complete | JobStatus::Error)
    }
}

/// Progress snapshot served to pollers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobProgress {
    /// Coarse stage label (`"pending"`, `"planning"`, `"generating"`,
    /// `"complete"`, `"error"`).
    pub stage: String,
    /// Human-readable progress line.
    pub message: String,
    pub current_page: u32,
    pub total_pages: u32,
    pub current_panel: u32,
    pub total_panels: u32,
    /// 0..=100; non-decreasing while the job runs, exactly 100 iff
    /// complete.
    pub percent: u8,
}

impl Default for JobProgress {
    fn default() -> Self {
        Self {
            stage: "pending".to_string(),
            message: "Queued".to_string(),
            current_page: 0,
            total_pages: 0,
            current_panel: 0,
            total_panels: 0,
            percent: 0,
        }
    }
}

/// Partial progress write. Absent fields keep their stored values.
#[derive(Debug, Clone, Default)]
pub struct ProgressUpdate {
    /// Optional status transition to record alongside the progress.
    pub status: Option<JobStatus>,
    pub stage: Option<String>,
    pub message: Option<String>,
    pub current_page: Option<u32>,
    pub total_pages: Option<u32>,
    pub current_panel: Option<u32>,
    pub total_panels: Option<u32>,
    pub percent: Option<u8>,
}

/// A trackable unit of asynchronous generation work.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Job {
    pub id: Uuid,
    #[serde(rename = "type")]
    pub job_type: JobType,
    pub status: JobStatus,
    pub progress: JobProgress,
    /// The request that created the job, echoed back to pollers.
    pub input: serde_json::Value,
    pub result: Option<serde_json::Value>,
    pub error: Option<String>,
    /// Append-only, in production order.
    pub generated_items: Vec<GeneratedPanel>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}
