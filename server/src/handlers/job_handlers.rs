use analyticore_client::{JobRecord, SubmitResponse};
use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use serde_json::{json, Value};
use uuid::Uuid;

use crate::error::AppError;
use crate::orchestrator::Submitted;
use crate::state::AppState;

#[derive(Deserialize)]
pub struct SubmitPayload {
    #[serde(default, alias = "texto")]
    pub text: Option<String>,
}

/// POST /submit
pub async fn submit(
    State(state): State<AppState>,
    payload: Result<Json<SubmitPayload>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let Json(payload) = payload.map_err(|e| AppError::Validation(e.body_text()))?;
    let text = payload
        .text
        .filter(|text| !text.trim().is_empty())
        .ok_or_else(|| AppError::Validation("missing text".to_string()))?;

    let submitted = state.orchestrator.submit(&text).await?;
    let status = match submitted {
        Submitted::Completed(_) => StatusCode::OK,
        Submitted::Accepted(_) => StatusCode::ACCEPTED,
    };
    Ok((
        status,
        Json(SubmitResponse {
            job_id: submitted.job_id().to_string(),
        }),
    ))
}

/// GET /status/{id}
pub async fn status(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<JobRecord>, AppError> {
    // Ids are opaque to callers; anything that is not one of ours is unknown.
    let job_id = Uuid::parse_str(&id).map_err(|_| AppError::NotFound)?;
    let job = state.orchestrator.get_status(job_id).await?;
    Ok(Json(job.to_record()))
}

/// GET /health
pub async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}
