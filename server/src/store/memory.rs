use std::sync::Arc;

use analyticore_client::{Analysis, JobState, JobStatus};
use async_trait::async_trait;
use chrono::Utc;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use uuid::Uuid;

use super::{payload_free, JobStore, StoreError};
use crate::models::job::Job;

/// Process-local store: job_id → Job. Nothing survives a restart.
#[derive(Clone, Debug, Default)]
pub struct InMemoryJobStore {
    jobs: Arc<DashMap<Uuid, Job>>,
}

impl InMemoryJobStore {
    pub fn new() -> Self {
        Self::default()
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.jobs.len()
    }

    #[cfg(test)]
    pub fn states(&self) -> Vec<JobState> {
        self.jobs.iter().map(|job| job.state()).collect()
    }

    fn advance(&self, id: Uuid, next: JobStatus) -> Result<(), StoreError> {
        let mut job = self.jobs.get_mut(&id).ok_or(StoreError::NotFound(id))?;
        let (from, to) = (job.state(), next.state());
        if !from.can_advance_to(to) {
            return Err(StoreError::InvalidTransition { id, from, to });
        }
        job.status = next;
        job.updated_at = Utc::now();
        Ok(())
    }
}

#[async_trait]
impl JobStore for InMemoryJobStore {
    async fn create(&self, id: Uuid, text: &str) -> Result<(), StoreError> {
        match self.jobs.entry(id) {
            Entry::Occupied(_) => Err(StoreError::DuplicateId(id)),
            Entry::Vacant(slot) => {
                slot.insert(Job::new(id, text));
                Ok(())
            }
        }
    }

    async fn set_state(&self, id: Uuid, state: JobState) -> Result<(), StoreError> {
        match payload_free(state) {
            Some(status) => self.advance(id, status),
            None => {
                let from = self.get(id).await?.state();
                Err(StoreError::InvalidTransition {
                    id,
                    from,
                    to: state,
                })
            }
        }
    }

    async fn complete(&self, id: Uuid, analysis: &Analysis) -> Result<(), StoreError> {
        self.advance(id, JobStatus::Completed(analysis.clone()))
    }

    async fn fail(&self, id: Uuid, error: &str) -> Result<(), StoreError> {
        self.advance(
            id,
            JobStatus::Failed {
                error: error.to_string(),
            },
        )
    }

    async fn get(&self, id: Uuid) -> Result<Job, StoreError> {
        self.jobs
            .get(&id)
            .map(|job| job.value().clone())
            .ok_or(StoreError::NotFound(id))
    }
}
