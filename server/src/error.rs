use analyticore_client::{ErrorBody, ANALYSIS_FAILED};
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;
use tracing::error;
use uuid::Uuid;

use crate::orchestrator::SubmitError;
use crate::store::StoreError;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("{0}")]
    Validation(String),

    #[error("job not found")]
    NotFound,

    /// The job was recorded but its analysis failed.
    #[error("analysis failed for job {0}")]
    AnalysisFailed(Uuid),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl From<SubmitError> for AppError {
    fn from(err: SubmitError) -> Self {
        match err {
            SubmitError::JobFailed { job_id, .. } => AppError::AnalysisFailed(job_id),
            SubmitError::Store(e) => AppError::Store(e),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error, job_id) = match self {
            AppError::Validation(message) => (StatusCode::BAD_REQUEST, message, None),
            AppError::NotFound | AppError::Store(StoreError::NotFound(_)) => {
                (StatusCode::NOT_FOUND, "job not found".to_string(), None)
            }
            AppError::AnalysisFailed(job_id) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ANALYSIS_FAILED.to_string(),
                Some(job_id.to_string()),
            ),
            AppError::Store(e) => {
                error!(error = %e, "job store failure");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal error".to_string(),
                    None,
                )
            }
        };
        (status, Json(ErrorBody { error, job_id })).into_response()
    }
}
