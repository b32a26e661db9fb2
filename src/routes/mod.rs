pub mod chat;
pub mod health;
pub mod run;

use crate::middleware as app_middleware;
use crate::services::AppState;
use axum::routing::{get, post};
use axum::Router;
use std::time::Duration;
use tower::limit::ConcurrencyLimitLayer;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

/// Maximum concurrent in-flight requests (backpressure control).
const MAX_CONCURRENT_REQUESTS: usize = 100;

/// Inbound request timeout. Outbound calls carry their own configured
/// timeouts; this bounds the whole request.
const REQUEST_TIMEOUT_SECS: u64 = 120;

pub fn create_router(state: AppState) -> Router {
    let (prometheus_layer, metrics_router) = crate::metrics::setup_metrics();

    // Pipeline routes sit behind the bearer gate; liveness and metrics do not.
    let api_routes = Router::new()
        .route("/hackrx/run", post(run::run_batch))
        .route("/hackrx/chat", post(chat::chat_turn))
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            app_middleware::bearer_auth,
        ))
        .with_state(state);

    Router::new()
        .route("/", get(health::liveness))
        .merge(api_routes)
        .merge(metrics_router)
        .layer(
            ServiceBuilder::new()
                .layer(prometheus_layer)
                .layer(TraceLayer::new_for_http())
                .layer(TimeoutLayer::new(Duration::from_secs(REQUEST_TIMEOUT_SECS)))
                .layer(ConcurrencyLimitLayer::new(MAX_CONCURRENT_REQUESTS))
                .layer(CorsLayer::permissive()),
        )
}
