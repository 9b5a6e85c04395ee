//! The job orchestrator: sequences the pipeline stages over a job.
//!
//! State machine per job: `Pending -> Planning -> Generating ->
//! {Complete | Error}`. Stages run strictly sequentially -- one logical
//! worker per job, no intra-job parallelism -- so `generated_items`
//! completion order equals submission order and progress is
//! deterministic. There is no cancellation primitive: once started, a
//! run continues to a terminal state even if every poller has gone away
//! or the job has been evicted; writes to an evicted job are dropped
//! silently.

use std::sync::Arc;

use uuid::Uuid;

use panelforge_core::aspect::AspectRatio;
use panelforge_core::identity::IdentityRegistry;
use panelforge_core::plan::{validate_page_plans, PagePlan};
use panelforge_core::progress::completion_percent;
use panelforge_events::{JobEvent, JobEventBus, EVENT_JOB_COMPLETED, EVENT_JOB_FAILED, EVENT_JOB_PROGRESS};
use panelforge_imagegen::ImageGenerator;
use panelforge_store::{JobStatus, JobStore, ProgressUpdate};
use panelforge_textgen::StructuredGenerator;

use crate::error::PlanError;
use crate::macro_planner::MacroPlanner;
use crate::resolver::resolve;
use crate::shot_planner::ShotPlanner;
use crate::synthesizer::AssetSynthesizer;

/// Mood recorded for a directly-requested single page (no macro pass
/// runs to infer one).
const SINGLE_PAGE_MOOD: &str = "neutral";

/// What to generate.
#[derive(Debug, Clone)]
pub enum GenerationMode {
    /// Plan and render every page of a story.
    FullNarrative {
        story_description: String,
        page_count: u32,
    },
    /// Render one page from a provided description, skipping the macro
    /// pass (the degenerate pageCount = 1 shape of the same loop).
    SinglePage {
        page_description: String,
        panel_count: u32,
    },
}

/// One generation run's full input.
#[derive(Debug, Clone)]
pub struct GenerationRequest {
    pub mode: GenerationMode,
    pub style: String,
    pub aspect_ratio: AspectRatio,
}

/// Drives jobs through the three-stage pipeline.
///
/// Shared across jobs via `Arc`; each job is an independent detached
/// task, and the only shared mutable state is the job store.
pub struct Orchestrator {
    store: Arc<dyn JobStore>,
    registry: Arc<IdentityRegistry>,
    macro_planner: MacroPlanner,
    shot_planner: ShotPlanner,
    synthesizer: AssetSynthesizer,
    events: Arc<JobEventBus>,
}

impl Orchestrator {
    pub fn new(
        store: Arc<dyn JobStore>,
        registry: Arc<IdentityRegistry>,
        textgen: Arc<dyn StructuredGenerator>,
        imagegen: Arc<dyn ImageGenerator>,
        events: Arc<JobEventBus>,
    ) -> Self {
        Self {
            store,
            registry,
            macro_planner: MacroPlanner::new(Arc::clone(&textgen)),
            shot_planner: ShotPlanner::new(textgen),
            synthesizer: AssetSynthesizer::new(imagegen),
            events,
        }
    }

    /// Drive `job_id` to a terminal state. Never returns an error: every
    /// outcome is recorded in the job store.
    pub async fn run(&self, job_id: Uuid, request: GenerationRequest) {
        tracing::info!(job_id = %job_id, mode = ?request.mode, "Job run started");

        self.record_progress(
            job_id,
            ProgressUpdate {
                status: Some(JobStatus::Planning),
                stage: Some("planning".into()),
                message: Some("Planning the narrative structure".into()),
                ..Default::default()
            },
        )
        .await;

        let pages = match self.build_page_plans(&request).await {
            Ok(pages) => pages,
            Err(e) => {
                self.fail_job(job_id, &format!("Planning failed: {e}")).await;
                return;
            }
        };

        let total_pages = pages.len() as u32;
        if total_pages == 0 {
            // Nothing to generate: the job is complete before the first
            // capability call.
            self.complete_job(job_id, 0, 0, 0).await;
            return;
        }

        self.record_progress(
            job_id,
            ProgressUpdate {
                status: Some(JobStatus::Generating),
                stage: Some("generating".into()),
                total_pages: Some(total_pages),
                ..Default::default()
            },
        )
        .await;

        let identity_pairs = self.registry.name_pairs().await;
        let mut rendered_panels = 0u32;
        let mut failed_panels = 0u32;

        for page in &pages {
            self.record_progress(
                job_id,
                ProgressUpdate {
                    current_page: Some(page.page_number),
                    current_panel: Some(0),
                    total_panels: Some(page.panel_count),
                    message: Some(format!(
                        "Planning shots for page {} of {total_pages}",
                        page.page_number
                    )),
                    ..Default::default()
                },
            )
            .await;

            let shots = match self
                .shot_planner
                .plan(page, &identity_pairs, &request.style)
                .await
            {
                Ok(shots) => shots,
                Err(e) => {
                    // Page-fatal: everything rendered so far stays on the
                    // job for pollers to keep.
                    self.fail_job(
                        job_id,
                        &format!("Shot planning failed on page {}: {e}", page.page_number),
                    )
                    .await;
                    return;
                }
            };

            let registry_snapshot = self.registry.snapshot().await;

            for shot in &shots {
                let context = resolve(shot, &registry_snapshot);
                let panel = self
                    .synthesizer
                    .synthesize(
                        page.page_number,
                        shot,
                        &context,
                        &request.style,
                        request.aspect_ratio,
                    )
                    .await;

                if panel.is_failed() {
                    failed_panels += 1;
                }
                rendered_panels += 1;

                if self.store.append_item(job_id, panel).await.is_none() {
                    tracing::debug!(job_id = %job_id, "Job evicted mid-run; dropping panel write");
                }

                let percent = completion_percent(
                    page.page_number,
                    total_pages,
                    shot.panel_number,
                    page.panel_count,
                );
                self.record_progress(
                    job_id,
                    ProgressUpdate {
                        current_panel: Some(shot.panel_number),
                        percent: Some(percent),
                        message: Some(format!(
                            "Generated panel {} of {} (page {} of {total_pages})",
                            shot.panel_number, page.panel_count, page.page_number
                        )),
                        ..Default::default()
                    },
                )
                .await;
            }
        }

        self.complete_job(job_id, total_pages, rendered_panels, failed_panels)
            .await;
    }

    /// Produce the page plans for the requested mode.
    ///
    /// Full-narrative jobs run the macro planner (job-fatal on failure);
    /// single-page jobs build the one page directly from the request.
    async fn build_page_plans(
        &self,
        request: &GenerationRequest,
    ) -> Result<Vec<PagePlan>, PlanError> {
        match &request.mode {
            GenerationMode::FullNarrative {
                story_description,
                page_count,
            } => {
                let identity_names: Vec<String> = self
                    .registry
                    .name_pairs()
                    .await
                    .into_iter()
                    .map(|(_, name)| name)
                    .collect();
                self.macro_planner
                    .plan(story_description, *page_count, &identity_names, &request.style)
                    .await
            }
            GenerationMode::SinglePage {
                page_description,
                panel_count,
            } => {
                if *panel_count == 0 {
                    return Ok(Vec::new());
                }
                let page = PagePlan {
                    page_number: 1,
                    page_description: page_description.clone(),
                    mood: SINGLE_PAGE_MOOD.to_string(),
                    panel_count: *panel_count,
                };
                validate_page_plans(std::slice::from_ref(&page), 1)?;
                Ok(vec![page])
            }
        }
    }

    /// Write a progress update and mirror it onto the event bus. A
    /// `None` from the store means the job was evicted; the write is
    /// dropped and the run continues.
    async fn record_progress(&self, job_id: Uuid, update: ProgressUpdate) {
        match self.store.update_progress(job_id, update).await {
            Some(job) => {
                self.events.publish(
                    JobEvent::new(EVENT_JOB_PROGRESS, job_id).with_payload(serde_json::json!({
                        "percent": job.progress.percent,
                        "stage": job.progress.stage,
                        "currentPage": job.progress.current_page,
                        "currentPanel": job.progress.current_panel,
                    })),
                );
            }
            None => {
                tracing::debug!(job_id = %job_id, "Job evicted mid-run; dropping progress write");
            }
        }
    }

    async fn complete_job(
        &self,
        job_id: Uuid,
        total_pages: u32,
        total_panels: u32,
        failed_panels: u32,
    ) {
        let result = serde_json::json!({
            "totalPages": total_pages,
            "totalPanels": total_panels,
            "failedPanels": failed_panels,
        });
        if self.store.complete(job_id, result).await.is_none() {
            tracing::debug!(job_id = %job_id, "Job evicted before completion write");
        }
        self.events
            .publish(JobEvent::new(EVENT_JOB_COMPLETED, job_id).with_payload(
                serde_json::json!({ "totalPanels": total_panels, "failedPanels": failed_panels }),
            ));
        tracing::info!(
            job_id = %job_id,
            total_pages,
            total_panels,
            failed_panels,
            "Job completed",
        );
    }

    async fn fail_job(&self, job_id: Uuid, message: &str) {
        if self.store.fail(job_id, message).await.is_none() {
            tracing::debug!(job_id = %job_id, "Job evicted before failure write");
        }
        self.events.publish(
            JobEvent::new(EVENT_JOB_FAILED, job_id)
                .with_payload(serde_json::json!({ "error": message })),
        );
        tracing::warn!(job_id = %job_id, error = %message, "Job failed");
    }
}
