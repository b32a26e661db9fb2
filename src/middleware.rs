//! Request middleware.

use crate::errors::AppError;
use crate::services::AppState;
use axum::{
    extract::{Request, State},
    http::header,
    middleware::Next,
    response::{IntoResponse, Response},
};

/// Bearer-token gate. Runs before any pipeline work, so a rejected request
/// has no side effects. When no token is configured the gate is open.
pub async fn bearer_auth(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    let Some(expected) = state.auth_token.as_deref() else {
        return next.run(request).await;
    };

    let provided = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "));

    match provided {
        Some(token) if token == expected => next.run(request).await,
        _ => {
            tracing::warn!(path = %request.uri().path(), "Missing or invalid bearer token");
            AppError::Unauthorized.into_response()
        }
    }
}
