use analyticore_client::{JobRecord, JobState, JobStatus};
use chrono::{DateTime, Utc};
use uuid::Uuid;

/// One analysis request and where it is in its lifecycle.
#[derive(Clone, Debug, PartialEq)]
pub struct Job {
    pub id: Uuid,
    pub text: String,
    pub status: JobStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Job {
    pub fn new(id: Uuid, text: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id,
            text: text.into(),
            status: JobStatus::Pending,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn state(&self) -> JobState {
        self.status.state()
    }

    pub fn to_record(&self) -> JobRecord {
        JobRecord {
            created_at: Some(self.created_at),
            updated_at: Some(self.updated_at),
            ..JobRecord::new(self.id.to_string(), self.text.clone(), &self.status)
        }
    }
}
