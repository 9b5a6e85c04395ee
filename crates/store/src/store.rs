//! The injectable job store seam and its in-memory default.
//!
//! Per-key mutations are atomic: every call takes the write lock once,
//! performs one logical read-modify-write, and releases it. Mutating an
//! unknown (or already evicted) id is a silent no-op returning `None` --
//! the orchestrator keeps running against a dead key by design, and the
//! HTTP layer translates `None` into 404, never 500.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use uuid::Uuid;

use panelforge_core::panel::GeneratedPanel;
use panelforge_core::progress::PERCENT_COMPLETE;
use panelforge_core::types::Timestamp;

use crate::job::{Job, JobProgress, JobStatus, JobType, ProgressUpdate};

/// Keyed, TTL-bounded store of job lifecycle state.
#[async_trait]
pub trait JobStore: Send + Sync {
    /// Create a new pending job and return it.
    async fn create(&self, job_type: JobType, input: serde_json::Value) -> Job;

    /// Fetch a job by id.
    async fn get(&self, id: Uuid) -> Option<Job>;

    /// Merge a partial progress update into the job.
    async fn update_progress(&self, id: Uuid, update: ProgressUpdate) -> Option<Job>;

    /// Append one generated panel to the job.
    async fn append_item(&self, id: Uuid, item: GeneratedPanel) -> Option<Job>;

    /// Mark the job complete with a result payload. Forces percent to 100.
    async fn complete(&self, id: Uuid, result: serde_json::Value) -> Option<Job>;

    /// Mark the job failed with a readable message. Items generated before
    /// the failure stay on the job.
    async fn fail(&self, id: Uuid, message: &str) -> Option<Job>;

    /// Remove a job. Returns whether it existed.
    async fn delete(&self, id: Uuid) -> bool;
}

/// Default process-memory implementation of [`JobStore`].
pub struct MemoryJobStore {
    jobs: RwLock<HashMap<Uuid, Job>>,
}

impl MemoryJobStore {
    pub fn new() -> Self {
        Self {
            jobs: RwLock::new(HashMap::new()),
        }
    }

    /// Evict every job created strictly before `cutoff`, regardless of
    /// status. Returns the number of evicted jobs.
    pub async fn sweep_older_than(&self, cutoff: Timestamp) -> usize {
        let mut jobs = self.jobs.write().await;
        let before = jobs.len();
        jobs.retain(|_, job| job.created_at >= cutoff);
        before - jobs.len()
    }

    /// Number of jobs currently held.
    pub async fn len(&self) -> usize {
        self.jobs.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.jobs.read().await.is_empty()
    }

    /// Apply `mutate` to the job under the write lock, bumping
    /// `updated_at`. Returns the updated job, or `None` if the id is
    /// unknown.
    async fn mutate<F>(&self, id: Uuid, mutate: F) -> Option<Job>
    where
        F: FnOnce(&mut Job),
    {
        let mut jobs = self.jobs.write().await;
        let job = jobs.get_mut(&id)?;
        mutate(job);
        job.updated_at = Utc::now();
        Some(job.clone())
    }
}

impl Default for MemoryJobStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl JobStore for MemoryJobStore {
    async fn create(&self, job_type: JobType, input: serde_json::Value) -> Job {
        let now = Utc::now();
        let job = Job {
            id: Uuid::new_v4(),
            job_type,
            status: JobStatus::Pending,
            progress: JobProgress::default(),
            input,
            result: None,
            error: None,
            generated_items: Vec::new(),
            created_at: now,
            updated_at: now,
        };

        self.jobs.write().await.insert(job.id, job.clone());
        tracing::debug!(job_id = %job.id, job_type = ?job.job_type, "Job created");
        job
    }

    async fn get(&self, id: Uuid) -> Option<Job> {
        self.jobs.read().await.get(&id).cloned()
    }

    async fn update_progress(&self, id: Uuid, update: ProgressUpdate) -> Option<Job> {
        self.mutate(id, |job| {
            if job.status.is_terminal() {
                return;
            }
            if let Some(status) = update.status {
                job.status = status;
            }
            let progress = &mut job.progress;
            if let Some(stage) = update.stage {
                progress.stage = stage;
            }
            if let Some(message) = update.message {
                progress.message = message;
            }
            if let Some(current_page) = update.current_page {
                progress.current_page = current_page;
            }
            if let Some(total_pages) = update.total_pages {
                progress.total_pages = total_pages;
            }
            if let Some(current_panel) = update.current_panel {
                progress.current_panel = current_panel;
            }
            if let Some(total_panels) = update.total_panels {
                progress.total_panels = total_panels;
            }
            if let Some(percent) = update.percent {
                // Percent is monotonic while the job runs, whatever the
                // caller computed.
                progress.percent = progress.percent.max(percent);
            }
        })
        .await
    }

    async fn append_item(&self, id: Uuid, item: GeneratedPanel) -> Option<Job> {
        self.mutate(id, |job| {
            job.generated_items.push(item);
        })
        .await
    }

    async fn complete(&self, id: Uuid, result: serde_json::Value) -> Option<Job> {
        self.mutate(id, |job| {
            if job.status.is_terminal() {
                return;
            }
            job.status = JobStatus::Complete;
            job.result = Some(result);
            job.progress.stage = "complete".to_string();
            job.progress.percent = PERCENT_COMPLETE;
        })
        .await
    }

    async fn fail(&self, id: Uuid, message: &str) -> Option<Job> {
        self.mutate(id, |job| {
            if job.status.is_terminal() {
                return;
            }
            job.status = JobStatus::Error;
            job.error = Some(message.to_string());
            job.progress.stage = "error".to_string();
            job.progress.message = message.to_string();
        })
        .await
    }

    async fn delete(&self, id: Uuid) -> bool {
        self.jobs.write().await.remove(&id).is_some()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use panelforge_core::plan::{LocationDirective, ShotPlan, ShotType};

    fn panel(number: u32) -> GeneratedPanel {
        GeneratedPanel::failed(
            1,
            ShotPlan {
                panel_number: number,
                scene_description: "scene".into(),
                characters: Vec::new(),
                location: LocationDirective {
                    identity_ref: "new".into(),
                    time_of_day: "day".into(),
                    weather: "clear".into(),
                },
                camera_angle: "eye level".into(),
                shot_type: ShotType::Action,
                dialogue_hint: None,
            },
            None,
            "induced".into(),
        )
    }

    #[tokio::test]
    async fn create_then_get_round_trips() {
        let store = MemoryJobStore::new();
        let job = store
            .create(JobType::FullNarrative, serde_json::json!({"pageCount": 2}))
            .await;

        let fetched = store.get(job.id).await.expect("job should exist");
        assert_eq!(fetched.id, job.id);
        assert_eq!(fetched.status, JobStatus::Pending);
        assert_eq!(fetched.progress.percent, 0);
        assert!(fetched.generated_items.is_empty());
    }

    #[tokio::test]
    async fn mutations_on_unknown_id_are_noops() {
        let store = MemoryJobStore::new();
        let id = Uuid::new_v4();

        assert!(store.get(id).await.is_none());
        assert!(store
            .update_progress(id, ProgressUpdate::default())
            .await
            .is_none());
        assert!(store.append_item(id, panel(1)).await.is_none());
        assert!(store.complete(id, serde_json::Value::Null).await.is_none());
        assert!(store.fail(id, "nope").await.is_none());
        assert!(!store.delete(id).await);
    }

    #[tokio::test]
    async fn percent_never_decreases() {
        let store = MemoryJobStore::new();
        let job = store.create(JobType::SinglePage, serde_json::Value::Null).await;

        let update = |p: u8| ProgressUpdate {
            percent: Some(p),
            ..Default::default()
        };

        store.update_progress(job.id, update(40)).await.unwrap();
        let after = store.update_progress(job.id, update(10)).await.unwrap();
        assert_eq!(after.progress.percent, 40);

        let after = store.update_progress(job.id, update(55)).await.unwrap();
        assert_eq!(after.progress.percent, 55);
    }

    #[tokio::test]
    async fn append_preserves_production_order() {
        let store = MemoryJobStore::new();
        let job = store.create(JobType::SinglePage, serde_json::Value::Null).await;

        for number in 1..=3 {
            store.append_item(job.id, panel(number)).await.unwrap();
        }

        let fetched = store.get(job.id).await.unwrap();
        let numbers: Vec<u32> = fetched
            .generated_items
            .iter()
            .map(|item| item.panel_number)
            .collect();
        assert_eq!(numbers, vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn complete_forces_percent_to_100() {
        let store = MemoryJobStore::new();
        let job = store.create(JobType::SinglePage, serde_json::Value::Null).await;

        let done = store
            .complete(job.id, serde_json::json!({"panels": 3}))
            .await
            .unwrap();
        assert_eq!(done.status, JobStatus::Complete);
        assert_eq!(done.progress.percent, 100);
        assert_eq!(done.result, Some(serde_json::json!({"panels": 3})));
    }

    #[tokio::test]
    async fn fail_keeps_generated_items() {
        let store = MemoryJobStore::new();
        let job = store.create(JobType::FullNarrative, serde_json::Value::Null).await;

        store.append_item(job.id, panel(1)).await.unwrap();
        let failed = store.fail(job.id, "shot planning failed on page 2").await.unwrap();

        assert_eq!(failed.status, JobStatus::Error);
        assert_eq!(
            failed.error.as_deref(),
            Some("shot planning failed on page 2")
        );
        assert_eq!(failed.generated_items.len(), 1);
        assert!(failed.progress.percent < 100);
    }

    #[tokio::test]
    async fn terminal_jobs_ignore_further_writes() {
        let store = MemoryJobStore::new();
        let job = store.create(JobType::SinglePage, serde_json::Value::Null).await;

        store.complete(job.id, serde_json::Value::Null).await.unwrap();
        let after = store.fail(job.id, "too late").await.unwrap();

        assert_eq!(after.status, JobStatus::Complete);
        assert!(after.error.is_none());
    }

    #[tokio::test]
    async fn sweep_evicts_only_expired_jobs() {
        let store = MemoryJobStore::new();
        let old = store.create(JobType::SinglePage, serde_json::Value::Null).await;
        let cutoff = Utc::now();
        let fresh = store.create(JobType::SinglePage, serde_json::Value::Null).await;

        let evicted = store.sweep_older_than(cutoff).await;
        assert_eq!(evicted, 1);
        assert!(store.get(old.id).await.is_none());
        assert!(store.get(fresh.id).await.is_some());
    }

    #[tokio::test]
    async fn writes_after_eviction_are_dropped_silently() {
        let store = MemoryJobStore::new();
        let job = store.create(JobType::SinglePage, serde_json::Value::Null).await;

        store.sweep_older_than(Utc::now()).await;

        // The orchestrator may still be running; its writes must not error.
        assert!(store.append_item(job.id, panel(1)).await.is_none());
        assert!(store.complete(job.id, serde_json::Value::Null).await.is_none());
    }

    #[tokio::test]
    async fn delete_removes_the_job() {
        let store = MemoryJobStore::new();
        let job = store.create(JobType::SinglePage, serde_json::Value::Null).await;

        assert!(store.delete(job.id).await);
        assert!(store.get(job.id).await.is_none());
        assert!(!store.delete(job.id).await);
    }
}
