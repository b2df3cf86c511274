//! Drives a job from submission to its terminal state.
//!
//! `submit` records the job, marks it `PROCESANDO`, makes exactly one
//! analysis call bounded by a timeout, and stores the outcome. Everything
//! after the insert runs on a tracked task that [`JobOrchestrator::shutdown`]
//! waits for. In [`SubmitMode::Sync`] `submit` awaits that task; in
//! [`SubmitMode::Background`] it returns as soon as the job is recorded.

use std::sync::Arc;
use std::time::Duration;

use analyticore_client::analysis::{AnalysisError, Analyzer};
use analyticore_client::{Analysis, JobState, ANALYSIS_FAILED};
use thiserror::Error;
use tokio_util::task::TaskTracker;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::config::SubmitMode;
use crate::models::job::Job;
use crate::store::{JobStore, StoreError};

#[derive(Debug, Error)]
pub enum SubmitError {
    /// The job exists but ended `FALLIDO`.
    #[error("job {job_id} failed: {reason}")]
    JobFailed { job_id: Uuid, reason: String },

    /// The job could not even be recorded.
    #[error("could not record job: {0}")]
    Store(#[from] StoreError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Submitted {
    /// The job already reached `COMPLETADO`.
    Completed(Uuid),
    /// The job is recorded and being processed in the background.
    Accepted(Uuid),
}

impl Submitted {
    pub fn job_id(&self) -> Uuid {
        match self {
            Submitted::Completed(id) | Submitted::Accepted(id) => *id,
        }
    }
}

#[derive(Clone)]
pub struct JobOrchestrator {
    store: Arc<dyn JobStore>,
    analyzer: Arc<dyn Analyzer>,
    analysis_timeout: Duration,
    mode: SubmitMode,
    tasks: TaskTracker,
}

impl JobOrchestrator {
    pub fn new(
        store: Arc<dyn JobStore>,
        analyzer: Arc<dyn Analyzer>,
        analysis_timeout: Duration,
        mode: SubmitMode,
    ) -> Self {
        Self {
            store,
            analyzer,
            analysis_timeout,
            mode,
            tasks: TaskTracker::new(),
        }
    }

    pub async fn submit(&self, text: &str) -> Result<Submitted, SubmitError> {
        let job_id = Uuid::new_v4();
        self.store.create(job_id, text).await?;
        info!(%job_id, chars = text.chars().count(), "job created");

        // Detached from this future: the job settles even if it is dropped.
        let this = self.clone();
        let owned = text.to_string();
        let handle = self
            .tasks
            .spawn(async move { this.process(job_id, &owned).await });

        match self.mode {
            SubmitMode::Sync => match handle.await {
                Ok(Ok(_)) => Ok(Submitted::Completed(job_id)),
                Ok(Err(reason)) => Err(SubmitError::JobFailed { job_id, reason }),
                Err(e) => {
                    error!(%job_id, error = %e, "job task aborted");
                    Err(SubmitError::JobFailed {
                        job_id,
                        reason: e.to_string(),
                    })
                }
            },
            // The outcome is recorded in the store by the task.
            SubmitMode::Background => Ok(Submitted::Accepted(job_id)),
        }
    }

    pub async fn get_status(&self, job_id: Uuid) -> Result<Job, StoreError> {
        self.store.get(job_id).await
    }

    /// Stops accepting background work and waits for in-flight jobs.
    pub async fn shutdown(&self) {
        self.tasks.close();
        if !self.tasks.is_empty() {
            info!(pending = self.tasks.len(), "waiting for in-flight jobs");
        }
        self.tasks.wait().await;
    }

    /// Runs the job from `PENDIENTE` to a terminal state. Every failure ends
    /// with the job recorded as `FALLIDO` (best effort) and the reason
    /// returned.
    async fn process(&self, job_id: Uuid, text: &str) -> Result<Analysis, String> {
        if let Err(e) = self.store.set_state(job_id, JobState::Processing).await {
            error!(%job_id, error = %e, "could not mark job as processing");
            self.record_failure(job_id).await;
            return Err(e.to_string());
        }

        let analysis =
            match tokio::time::timeout(self.analysis_timeout, self.analyzer.analyze(text)).await {
                Ok(Ok(analysis)) => analysis,
                Ok(Err(e)) => {
                    warn!(%job_id, error = %e, "analysis failed");
                    self.record_failure(job_id).await;
                    return Err(e.to_string());
                }
                Err(_) => {
                    let e = AnalysisError::TimedOut(self.analysis_timeout);
                    warn!(%job_id, error = %e, "analysis failed");
                    self.record_failure(job_id).await;
                    return Err(e.to_string());
                }
            };

        if let Err(e) = self.store.complete(job_id, &analysis).await {
            error!(%job_id, error = %e, "could not store analysis result");
            self.record_failure(job_id).await;
            return Err(e.to_string());
        }

        info!(%job_id, sentiment = %analysis.sentiment, keywords = analysis.keywords.len(), "job completed");
        Ok(analysis)
    }

    async fn record_failure(&self, job_id: Uuid) {
        match self.store.fail(job_id, ANALYSIS_FAILED).await {
            Ok(()) => info!(%job_id, "job failed"),
            Err(e) => error!(%job_id, error = %e, "could not mark job as failed"),
        }
    }
}
