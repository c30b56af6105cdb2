use axum::{
    Json,
    Router,
    extract::{Extension, State, rejection::JsonRejection},
    routing::{get, post},
};
use serde_json::Value;
use std::sync::Arc;
use tracing::{info, warn};

use crate::web::models::AuthenticatedUser;
use crate::web::models::batch_job_models::{BatchJobListResponse, StartBatchResponse};
use crate::web::validation::{self, BATCH_INVALID_MESSAGE, ValidationError};
use crate::web::{AppState, error::AppError};

pub fn batch_job_routes() -> Router<Arc<AppState>> {
    Router::<Arc<AppState>>::new()
        .route("/start-batch", post(start_batch))
        .route("/batch-jobs", get(list_batch_jobs))
}

async fn start_batch(
    Extension(authenticated_user): Extension<AuthenticatedUser>,
    State(app_state): State<Arc<AppState>>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<Json<StartBatchResponse>, AppError> {
    let Json(payload) = payload.map_err(|rejection| {
        ValidationError::malformed_body(BATCH_INVALID_MESSAGE, rejection.body_text())
    })?;

    let request = validation::validate_batch_job_request(&payload).map_err(|e| {
        warn!(
            user_id = authenticated_user.id,
            fields = ?e.fields(),
            "Rejected batch job request."
        );
        e
    })?;

    let batch_job = app_state.job_ledger.create_job(request).await?;
    info!(
        user_id = authenticated_user.id,
        batch_job_id = batch_job.id,
        "Batch started."
    );
    Ok(Json(StartBatchResponse::started(batch_job)))
}

async fn list_batch_jobs(
    State(app_state): State<Arc<AppState>>,
) -> Json<BatchJobListResponse> {
    Json(BatchJobListResponse {
        batch_jobs: app_state.job_ledger.list_jobs().await,
    })
}
