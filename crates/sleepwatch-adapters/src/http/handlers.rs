//! Request handlers for prediction, analytics and health.

use std::sync::Arc;

use axum::extract::{Multipart, State};
use axum::Json;
use serde_json::{json, Value};
use sleepwatch_core::domain::is_accepted_content_type;
use sleepwatch_core::{AnalyticsReport, Frame, PipelineError, PredictionResponse};
use tracing::debug;

use super::error::ApiError;
use super::AppState;

const FILE_FIELD: &str = "file";

pub async fn predict_eye_state(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Json<PredictionResponse>, ApiError> {
    let (content_type, bytes) = read_file_field(multipart).await?;
    debug!(content_type = %content_type, bytes = bytes.len(), "Upload received");

    // Reject before any model runs.
    if !is_accepted_content_type(&content_type) {
        return Err(PipelineError::InvalidInputType.into());
    }

    let monitor = Arc::clone(&state.monitor);
    let task = tokio::task::spawn_blocking(move || {
        let frame = Frame::decode(&bytes)?;
        monitor.observe(&frame)
    });

    let verdict = tokio::time::timeout(state.settings.request_timeout, task)
        .await
        .map_err(|_| ApiError::Timeout)?
        .map_err(|e| ApiError::Internal(e.into()))??;

    Ok(Json(verdict.into()))
}

pub async fn sleep_analytics(
    State(state): State<AppState>,
) -> Result<Json<AnalyticsReport>, ApiError> {
    let monitor = Arc::clone(&state.monitor);
    let summaries = tokio::task::spawn_blocking(move || monitor.analytics())
        .await
        .map_err(|e| ApiError::Internal(e.into()))?
        .map_err(ApiError::Analytics)?;

    Ok(Json(summaries.into()))
}

pub async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

async fn read_file_field(mut multipart: Multipart) -> Result<(String, Vec<u8>), ApiError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::BadRequest(e.body_text()))?
    {
        if field.name() != Some(FILE_FIELD) {
            continue;
        }
        let content_type = field.content_type().unwrap_or_default().to_string();
        let bytes = field
            .bytes()
            .await
            .map_err(|e| ApiError::BadRequest(e.body_text()))?;
        return Ok((content_type, bytes.to_vec()));
    }
    Err(ApiError::BadRequest(format!(
        "Missing multipart field '{FILE_FIELD}'"
    )))
}
