//! Batch ingestion + question answering.

use crate::errors::AppError;
use crate::services::AppState;
use axum::extract::rejection::JsonRejection;
use axum::{extract::State, Json};
use serde::Serialize;
use serde_json::Value;
use tracing::instrument;

#[derive(Serialize)]
pub struct RunResponse {
    pub answers: Vec<String>,
}

const MISSING_FIELDS: &str = "Missing documents or questions array";

/// `POST /hackrx/run`: ingest the document (or skip on a dedup hit), then
/// answer every question concurrently. Ingestion always completes before any
/// retrieval begins; its errors are fatal to the whole request, while
/// per-question failures degrade to a fixed sentence in place.
#[instrument(skip(state, payload))]
pub async fn run_batch(
    State(state): State<AppState>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<Json<RunResponse>, AppError> {
    let body = payload.map(|Json(v)| v).unwrap_or(Value::Null);

    let url = body.get("documents").and_then(Value::as_str);
    // Any non-string entry makes the whole array malformed; dropping entries
    // would break the one-answer-per-question positional contract.
    let questions: Option<Vec<String>> = body
        .get("questions")
        .and_then(Value::as_array)
        .and_then(|items| {
            items
                .iter()
                .map(|q| q.as_str().map(str::to_owned))
                .collect::<Option<Vec<_>>>()
        });

    let (Some(url), Some(questions)) = (url, questions) else {
        return Err(AppError::InvalidRequest(MISSING_FIELDS.to_string()));
    };
    if questions.is_empty() {
        return Err(AppError::InvalidRequest(MISSING_FIELDS.to_string()));
    }

    state.ingest_service.ingest_url(url).await?;

    let answers = state.answer_service.answer_batch(questions).await;

    Ok(Json(RunResponse { answers }))
}
