//! Durable job records.
//!
//! Every backend enforces the same transition rules: a job is created
//! `PENDIENTE`, may move to `PROCESANDO`, and ends in exactly one terminal
//! state that is never left again.

mod memory;
mod postgres;

pub use memory::InMemoryJobStore;
pub use postgres::PgJobStore;

use analyticore_client::{Analysis, JobState, JobStatus};
use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

use crate::models::job::Job;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("job {0} already exists")]
    DuplicateId(Uuid),

    #[error("job {0} not found")]
    NotFound(Uuid),

    #[error("job {id} cannot move from {from} to {to}")]
    InvalidTransition {
        id: Uuid,
        from: JobState,
        to: JobState,
    },

    #[error("corrupt job record {id}: {reason}")]
    Corrupt { id: String, reason: String },

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

#[async_trait]
pub trait JobStore: Send + Sync {
    /// Inserts a new `PENDIENTE` job.
    async fn create(&self, id: Uuid, text: &str) -> Result<(), StoreError>;

    /// Moves a job to a non-terminal state. Terminal states carry a payload
    /// and go through [`JobStore::complete`] or [`JobStore::fail`].
    async fn set_state(&self, id: Uuid, state: JobState) -> Result<(), StoreError>;

    async fn complete(&self, id: Uuid, analysis: &Analysis) -> Result<(), StoreError>;

    async fn fail(&self, id: Uuid, error: &str) -> Result<(), StoreError>;

    async fn get(&self, id: Uuid) -> Result<Job, StoreError>;
}

/// The payload-free status for `state`, if it has one.
fn payload_free(state: JobState) -> Option<JobStatus> {
    match state {
        JobState::Pending => Some(JobStatus::Pending),
        JobState::Processing => Some(JobStatus::Processing),
        JobState::Completed | JobState::Failed => None,
    }
}
