use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// Application error taxonomy.
///
/// Ingestion-phase errors (`UnsupportedFormat`, `AcquisitionFailed`,
/// `IndexingFailed`) are fatal to the whole request. Answer-phase errors
/// (`RewriteFailed`, `RetrievalFailed`, `SynthesisFailed`) are isolated per
/// question by the answer service and normally never reach the HTTP boundary.
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Unauthorized")]
    Unauthorized,

    #[error("{0}")]
    InvalidRequest(String),

    #[error("Unsupported document format: {0}")]
    UnsupportedFormat(String),

    #[error("Document acquisition failed: {0}")]
    AcquisitionFailed(String),

    #[error("Indexing failed: {0}")]
    IndexingFailed(String),

    #[error("Query rewrite failed: {0}")]
    RewriteFailed(String),

    #[error("Retrieval failed: {0}")]
    RetrievalFailed(String),

    #[error("Answer synthesis failed: {0}")]
    SynthesisFailed(String),

    #[error("Embedding service error: {0}")]
    EmbeddingFailed(String),

    #[error("LLM call failed: {0}")]
    LlmCall(String),

    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    /// HTTP status code for this error.
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::Unauthorized => StatusCode::UNAUTHORIZED,
            Self::InvalidRequest(_) | Self::UnsupportedFormat(_) => StatusCode::BAD_REQUEST,
            Self::AcquisitionFailed(_)
            | Self::IndexingFailed(_)
            | Self::RewriteFailed(_)
            | Self::RetrievalFailed(_)
            | Self::SynthesisFailed(_)
            | Self::EmbeddingFailed(_)
            | Self::LlmCall(_) => StatusCode::BAD_GATEWAY,
            Self::Config(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Message exposed to the caller. Internal details stay in the logs.
    fn public_message(&self) -> String {
        match self {
            Self::Unauthorized => "Unauthorized".to_string(),
            Self::Config(_) | Self::Internal(_) => "Internal Server Error".to_string(),
            other => other.to_string(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let message = self.to_string();

        match &self {
            AppError::InvalidRequest(_) | AppError::UnsupportedFormat(_) => {
                tracing::debug!(status = status.as_u16(), %message, "Client error");
            }
            AppError::Unauthorized => {
                tracing::info!(status = status.as_u16(), "Rejected unauthorized request");
            }
            _ => {
                tracing::error!(status = status.as_u16(), %message, "Request failed");
            }
        }

        let body = Json(json!({ "error": self.public_message() }));
        (status, body).into_response()
    }
}
