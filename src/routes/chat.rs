//! Conversational question answering against the already-indexed corpus.

use crate::errors::AppError;
use crate::services::AppState;
use axum::extract::rejection::JsonRejection;
use axum::{extract::State, Json};
use serde::Serialize;
use serde_json::Value;
use tracing::instrument;
use uuid::Uuid;

#[derive(Serialize)]
pub struct ChatResponse {
    pub answer: String,
    pub session_id: String,
}

/// `POST /hackrx/chat`: answer one question within a session's conversation.
/// The session id keys the history; when omitted, a fresh session is created
/// and its id returned for follow-ups.
#[instrument(skip(state, payload))]
pub async fn chat_turn(
    State(state): State<AppState>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<Json<ChatResponse>, AppError> {
    let body = payload.map(|Json(v)| v).unwrap_or(Value::Null);

    let Some(question) = body.get("question").and_then(Value::as_str) else {
        return Err(AppError::InvalidRequest("Missing question".to_string()));
    };
    if question.trim().is_empty() {
        return Err(AppError::InvalidRequest("Missing question".to_string()));
    }

    let session_id = body
        .get("session_id")
        .and_then(Value::as_str)
        .map(str::to_owned)
        .unwrap_or_else(|| Uuid::new_v4().to_string());

    let answer = state.answer_service.answer_chat(&session_id, question).await;

    Ok(Json(ChatResponse { answer, session_id }))
}
