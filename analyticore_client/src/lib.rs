pub mod analysis;
pub mod error;
pub mod gateway;
pub mod poller;
pub mod utils;
pub mod validation;

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use error::ClientError;

/// Payload stored in a failed job when the analysis call did not succeed.
pub const ANALYSIS_FAILED: &str = "analysis failed";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sentiment {
    #[serde(alias = "positivo")]
    Positive,
    #[serde(alias = "negativo")]
    Negative,
    Neutral,
}

impl fmt::Display for Sentiment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Sentiment::Positive => write!(f, "positive"),
            Sentiment::Negative => write!(f, "negative"),
            Sentiment::Neutral => write!(f, "neutral"),
        }
    }
}

/// What the analysis service returns for a piece of text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Analysis {
    #[serde(alias = "sentimiento")]
    pub sentiment: Sentiment,
    #[serde(default, alias = "palabrasClave")]
    pub keywords: Vec<String>,
}

/// Lifecycle state of a job, without its payload.
///
/// The serialized spelling matches the `estado` column of the `jobs` table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum JobState {
    #[serde(rename = "PENDIENTE", alias = "PENDING")]
    Pending,
    #[serde(rename = "PROCESANDO", alias = "PROCESSING")]
    Processing,
    #[serde(rename = "COMPLETADO", alias = "COMPLETED")]
    Completed,
    #[serde(rename = "FALLIDO", alias = "FAILED", alias = "ERROR")]
    Failed,
}

impl JobState {
    pub const ALL: [JobState; 4] = [
        JobState::Pending,
        JobState::Processing,
        JobState::Completed,
        JobState::Failed,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            JobState::Pending => "PENDIENTE",
            JobState::Processing => "PROCESANDO",
            JobState::Completed => "COMPLETADO",
            JobState::Failed => "FALLIDO",
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, JobState::Completed | JobState::Failed)
    }

    /// Whether a job may move from `self` to `next`.
    ///
    /// States only move forward and nothing leaves a terminal state.
    pub fn can_advance_to(self, next: JobState) -> bool {
        match (self, next) {
            (JobState::Pending, JobState::Processing) => true,
            (JobState::Pending | JobState::Processing, next) => next.is_terminal(),
            _ => false,
        }
    }

    /// States from which `self` can be reached in one step.
    pub fn predecessors(self) -> Vec<JobState> {
        JobState::ALL
            .into_iter()
            .filter(|from| from.can_advance_to(self))
            .collect()
    }
}

impl fmt::Display for JobState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown job state: {0}")]
pub struct UnknownJobState(pub String);

impl FromStr for JobState {
    type Err = UnknownJobState;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PENDIENTE" | "PENDING" => Ok(JobState::Pending),
            "PROCESANDO" | "PROCESSING" => Ok(JobState::Processing),
            "COMPLETADO" | "COMPLETED" => Ok(JobState::Completed),
            "FALLIDO" | "FAILED" | "ERROR" => Ok(JobState::Failed),
            other => Err(UnknownJobState(other.to_string())),
        }
    }
}

/// A job's state together with the payload that belongs to it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobStatus {
    Pending,
    Processing,
    Completed(Analysis),
    Failed { error: String },
}

impl JobStatus {
    pub fn state(&self) -> JobState {
        match self {
            JobStatus::Pending => JobState::Pending,
            JobStatus::Processing => JobState::Processing,
            JobStatus::Completed(_) => JobState::Completed,
            JobStatus::Failed { .. } => JobState::Failed,
        }
    }

    pub fn outcome(&self) -> Option<JobOutcome> {
        match self {
            JobStatus::Completed(analysis) => Some(JobOutcome::Completed(analysis.clone())),
            JobStatus::Failed { error } => Some(JobOutcome::Failed {
                error: error.clone(),
            }),
            JobStatus::Pending | JobStatus::Processing => None,
        }
    }
}

/// The `resultado` of a terminal job as it appears on the wire.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum JobOutcome {
    Completed(Analysis),
    Failed { error: String },
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("job in state {state} carries an inconsistent result")]
pub struct InconsistentRecord {
    pub state: JobState,
}

/// Job record as returned by `GET /status/{id}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobRecord {
    pub id: String,
    pub texto: String,
    pub estado: JobState,
    #[serde(default)]
    pub resultado: Option<JobOutcome>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl JobRecord {
    pub fn new(id: impl Into<String>, text: impl Into<String>, status: &JobStatus) -> Self {
        Self {
            id: id.into(),
            texto: text.into(),
            estado: status.state(),
            resultado: status.outcome(),
            created_at: None,
            updated_at: None,
        }
    }

    /// Rebuilds the tagged status from `estado` and `resultado`.
    pub fn status(&self) -> Result<JobStatus, InconsistentRecord> {
        match (self.estado, &self.resultado) {
            (JobState::Pending, _) => Ok(JobStatus::Pending),
            (JobState::Processing, _) => Ok(JobStatus::Processing),
            (JobState::Completed, Some(JobOutcome::Completed(analysis))) => {
                Ok(JobStatus::Completed(analysis.clone()))
            }
            (JobState::Failed, Some(JobOutcome::Failed { error })) => Ok(JobStatus::Failed {
                error: error.clone(),
            }),
            (JobState::Failed, None) => Ok(JobStatus::Failed {
                error: ANALYSIS_FAILED.to_string(),
            }),
            (state, _) => Err(InconsistentRecord { state }),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmitRequest {
    #[serde(alias = "texto")]
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmitResponse {
    #[serde(rename = "jobId")]
    pub job_id: String,
}

/// Body of every non-2xx gateway response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
    #[serde(rename = "jobId", default, skip_serializing_if = "Option::is_none")]
    pub job_id: Option<String>,
}
