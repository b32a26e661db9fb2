use docqa::config::AppConfig;
use docqa::embeddings::{CloudEmbedder, Embedder, MockEmbedder};
use docqa::index::{HttpVectorIndex, MemoryIndex, VectorIndex};
use docqa::llm::{ChatModel, CloudChatModel, MockChatModel};
use docqa::routes;
use docqa::services::AppState;
use std::sync::Arc;
use tokio::signal;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = AppConfig::build()?;

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(&config.server.rust_log))
        .init();

    tracing::info!("Starting docqa...");

    // External collaborators; the "mock"/"memory" keys select in-process
    // implementations for local runs.
    let embedder: Arc<dyn Embedder> = if config.embeddings.api_key == "mock" {
        tracing::warn!("Using in-process mock embedder");
        Arc::new(MockEmbedder::new(config.embeddings.dimension))
    } else {
        Arc::new(CloudEmbedder::new(config.embeddings.clone())?)
    };

    let index: Arc<dyn VectorIndex> = if config.index.api_key == "memory" {
        tracing::warn!("Using in-process memory vector index");
        Arc::new(MemoryIndex::new())
    } else {
        Arc::new(HttpVectorIndex::new(config.index.clone())?)
    };

    let llm: Arc<dyn ChatModel> = if config.llm.api_key == "mock" {
        tracing::warn!("Using in-process mock chat model");
        Arc::new(MockChatModel)
    } else {
        Arc::new(CloudChatModel::new(config.llm.clone())?)
    };

    let state = AppState::new(&config, embedder, index, llm)?;
    let app = routes::create_router(state);

    let addr = format!("{}:{}", config.server.host, config.server.port);
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c().await.expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => tracing::info!("Received Ctrl+C, shutting down..."),
        _ = terminate => tracing::info!("Received SIGTERM, shutting down..."),
    }
}
