use config::{Config, ConfigError, Environment};
use serde::Deserialize;
use std::time::Duration;

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub server: ServerConfig,
    #[serde(default)]
    pub auth: AuthConfig,
    pub embeddings: EmbeddingsConfig,
    pub index: IndexConfig,
    pub llm: LlmConfig,
    pub ingest: IngestConfig,
    pub retrieval: RetrievalConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub rust_log: String,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct AuthConfig {
    /// Shared bearer secret. When unset, the auth gate is open.
    pub team_token: Option<String>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct EmbeddingsConfig {
    /// Base URL of an OpenAI-compatible embeddings API.
    pub api_url: String,
    /// API key; the literal "mock" selects the in-process embedder.
    pub api_key: String,
    pub model: String,
    pub dimension: usize,
    pub timeout_secs: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct IndexConfig {
    /// Base URL of the vector index (Pinecone-style REST surface).
    pub api_url: String,
    /// API key; the literal "memory" selects the in-process index.
    pub api_key: String,
    pub namespace: String,
    pub timeout_secs: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct LlmConfig {
    /// Base URL of an OpenAI-compatible chat completions API.
    pub api_url: String,
    /// API key; the literal "mock" selects the in-process model.
    pub api_key: String,
    pub model: String,
    pub timeout_secs: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct IngestConfig {
    /// Chunk window size in characters.
    pub chunk_size: usize,
    /// Overlap between consecutive chunks in characters.
    pub chunk_overlap: usize,
    /// Cap on simultaneous embed+upsert calls during ingestion.
    pub max_concurrent_upserts: usize,
    pub download_timeout_secs: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct RetrievalConfig {
    pub top_k: usize,
    /// Total vector-query attempts before giving up (not extra retries).
    pub max_attempts: u32,
    /// Fixed delay between attempts.
    pub backoff_ms: u64,
}

impl AppConfig {
    pub fn build() -> Result<Self, ConfigError> {
        let builder = Config::builder()
            .set_default("server.host", "0.0.0.0")?
            .set_default("server.port", 8000)?
            .set_default("server.rust_log", "info,docqa=debug")?
            .set_default("embeddings.api_url", "https://api.openai.com/v1")?
            .set_default("embeddings.api_key", "mock")?
            .set_default("embeddings.model", "text-embedding-3-small")?
            .set_default("embeddings.dimension", 768)?
            .set_default("embeddings.timeout_secs", 30)?
            .set_default("index.api_url", "http://localhost:5080")?
            .set_default("index.api_key", "memory")?
            .set_default("index.namespace", "docqa")?
            .set_default("index.timeout_secs", 10)?
            .set_default("llm.api_url", "https://api.openai.com/v1")?
            .set_default("llm.api_key", "mock")?
            .set_default("llm.model", "gpt-4o-mini")?
            .set_default("llm.timeout_secs", 60)?
            .set_default("ingest.chunk_size", 1000)?
            .set_default("ingest.chunk_overlap", 200)?
            .set_default("ingest.max_concurrent_upserts", 5)?
            .set_default("ingest.download_timeout_secs", 60)?
            .set_default("retrieval.top_k", 10)?
            .set_default("retrieval.max_attempts", 2)?
            .set_default("retrieval.backoff_ms", 500)?
            // E.g. `APP_AUTH__TEAM_TOKEN=...` sets `auth.team_token`.
            .add_source(Environment::default().separator("__").prefix("APP"));

        builder.build()?.try_deserialize()
    }

    pub fn download_timeout(&self) -> Duration {
        Duration::from_secs(self.ingest.download_timeout_secs)
    }

    pub fn retrieval_backoff(&self) -> Duration {
        Duration::from_millis(self.retrieval.backoff_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_load_without_env() {
        let config = AppConfig::build().expect("defaults must be complete");
        assert_eq!(config.server.port, 8000);
        assert_eq!(config.ingest.chunk_size, 1000);
        assert_eq!(config.ingest.chunk_overlap, 200);
        assert_eq!(config.ingest.max_concurrent_upserts, 5);
        assert_eq!(config.retrieval.top_k, 10);
        assert_eq!(config.retrieval.max_attempts, 2);
        assert_eq!(config.retrieval_backoff(), Duration::from_millis(500));
        assert!(config.auth.team_token.is_none());
    }
}
