use analyticore_client::{Analysis, JobOutcome, JobRecord, JobState};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::types::Json;
use sqlx::PgPool;
use uuid::Uuid;

use super::{payload_free, JobStore, StoreError};
use crate::models::job::Job;

/// `jobs` table backed store. Each transition is a single guarded UPDATE.
#[derive(Clone, Debug)]
pub struct PgJobStore {
    pool: PgPool,
}

#[derive(sqlx::FromRow)]
struct JobRow {
    id: String,
    texto: String,
    estado: String,
    resultado: Option<serde_json::Value>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<JobRow> for Job {
    type Error = StoreError;

    fn try_from(row: JobRow) -> Result<Self, Self::Error> {
        let corrupt = |reason: String| StoreError::Corrupt {
            id: row.id.clone(),
            reason,
        };
        let id = Uuid::parse_str(&row.id).map_err(|e| corrupt(e.to_string()))?;
        let estado: JobState = row.estado.parse().map_err(|e| corrupt(format!("{e}")))?;
        let resultado = row
            .resultado
            .map(serde_json::from_value::<JobOutcome>)
            .transpose()
            .map_err(|e| corrupt(e.to_string()))?;

        let record = JobRecord {
            id: row.id.clone(),
            texto: row.texto.clone(),
            estado,
            resultado,
            created_at: Some(row.created_at),
            updated_at: Some(row.updated_at),
        };
        let status = record.status().map_err(|e| corrupt(e.to_string()))?;

        Ok(Job {
            id,
            text: row.texto,
            status,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

impl PgJobStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn advance(
        &self,
        id: Uuid,
        to: JobState,
        resultado: Option<JobOutcome>,
    ) -> Result<(), StoreError> {
        let allowed_from: Vec<String> = to
            .predecessors()
            .into_iter()
            .map(|state| state.as_str().to_string())
            .collect();

        let updated = sqlx::query(
            "UPDATE jobs SET estado = $2, resultado = $3, updated_at = NOW() \
             WHERE id = $1 AND estado = ANY($4)",
        )
        .bind(id.to_string())
        .bind(to.as_str())
        .bind(resultado.map(Json))
        .bind(allowed_from)
        .execute(&self.pool)
        .await?;

        if updated.rows_affected() == 0 {
            let from = self.current_state(id).await?;
            return Err(StoreError::InvalidTransition { id, from, to });
        }
        Ok(())
    }

    async fn current_state(&self, id: Uuid) -> Result<JobState, StoreError> {
        let estado: Option<String> = sqlx::query_scalar("SELECT estado FROM jobs WHERE id = $1")
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await?;
        let estado = estado.ok_or(StoreError::NotFound(id))?;
        estado.parse().map_err(|e| StoreError::Corrupt {
            id: id.to_string(),
            reason: format!("{e}"),
        })
    }
}

#[async_trait]
impl JobStore for PgJobStore {
    async fn create(&self, id: Uuid, text: &str) -> Result<(), StoreError> {
        sqlx::query("INSERT INTO jobs (id, texto, estado) VALUES ($1, $2, $3)")
            .bind(id.to_string())
            .bind(text)
            .bind(JobState::Pending.as_str())
            .execute(&self.pool)
            .await
            .map_err(|e| match e {
                sqlx::Error::Database(ref db) if db.is_unique_violation() => {
                    StoreError::DuplicateId(id)
                }
                other => StoreError::Database(other),
            })?;
        Ok(())
    }

    async fn set_state(&self, id: Uuid, state: JobState) -> Result<(), StoreError> {
        if payload_free(state).is_none() {
            let from = self.current_state(id).await?;
            return Err(StoreError::InvalidTransition {
                id,
                from,
                to: state,
            });
        }
        self.advance(id, state, None).await
    }

    async fn complete(&self, id: Uuid, analysis: &Analysis) -> Result<(), StoreError> {
        self.advance(
            id,
            JobState::Completed,
            Some(JobOutcome::Completed(analysis.clone())),
        )
        .await
    }

    async fn fail(&self, id: Uuid, error: &str) -> Result<(), StoreError> {
        self.advance(
            id,
            JobState::Failed,
            Some(JobOutcome::Failed {
                error: error.to_string(),
            }),
        )
        .await
    }

    async fn get(&self, id: Uuid) -> Result<Job, StoreError> {
        let row = sqlx::query_as::<_, JobRow>(
            "SELECT id, texto, estado, resultado, created_at, updated_at FROM jobs WHERE id = $1",
        )
        .bind(id.to_string())
        .fetch_optional(&self.pool)
        .await?
        .ok_or(StoreError::NotFound(id))?;
        Job::try_from(row)
    }
}

// These need a running Postgres: `DATABASE_URL=... cargo test -- --ignored`.
#[cfg(test)]
mod tests {
    use super::*;
    use analyticore_client::{JobStatus, Sentiment};

    async fn store() -> PgJobStore {
        let url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");
        let pool = PgPool::connect(&url).await.unwrap();
        sqlx::migrate!().run(&pool).await.unwrap();
        PgJobStore::new(pool)
    }

    #[tokio::test]
    #[ignore]
    async fn lifecycle_round_trips_through_table() {
        let store = store().await;
        let id = Uuid::new_v4();
        store.create(id, "Hello world").await.unwrap();
        assert_eq!(store.get(id).await.unwrap().status, JobStatus::Pending);

        store.set_state(id, JobState::Processing).await.unwrap();
        let analysis = Analysis {
            sentiment: Sentiment::Neutral,
            keywords: vec!["hello".into(), "world".into()],
        };
        store.complete(id, &analysis).await.unwrap();

        let job = store.get(id).await.unwrap();
        assert_eq!(job.status, JobStatus::Completed(analysis));
        assert_eq!(job.text, "Hello world");
    }

    #[tokio::test]
    #[ignore]
    async fn duplicate_and_missing_ids() {
        let store = store().await;
        let id = Uuid::new_v4();
        store.create(id, "Hello world").await.unwrap();
        assert!(matches!(
            store.create(id, "Hello world").await,
            Err(StoreError::DuplicateId(_))
        ));

        let missing = Uuid::new_v4();
        assert!(matches!(store.get(missing).await, Err(StoreError::NotFound(_))));
        assert!(matches!(
            store.fail(missing, "analysis failed").await,
            Err(StoreError::NotFound(_))
        ));
    }

    #[tokio::test]
    #[ignore]
    async fn terminal_row_is_not_updated() {
        let store = store().await;
        let id = Uuid::new_v4();
        store.create(id, "Hello world").await.unwrap();
        store.fail(id, "analysis failed").await.unwrap();
        let settled = store.get(id).await.unwrap();

        assert!(matches!(
            store.set_state(id, JobState::Processing).await,
            Err(StoreError::InvalidTransition { from: JobState::Failed, .. })
        ));
        assert_eq!(store.get(id).await.unwrap(), settled);
    }
}
