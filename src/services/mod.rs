pub mod answer;
pub mod ingest;

pub use answer::{AnswerService, RetryPolicy, NOT_FOUND_ANSWER, QUESTION_ERROR_ANSWER};
pub use ingest::{IngestOutcome, IngestService};

use crate::chunker::ChunkingConfig;
use crate::config::AppConfig;
use crate::document::DocumentAcquirer;
use crate::embeddings::Embedder;
use crate::errors::AppError;
use crate::index::VectorIndex;
use crate::llm::ChatModel;
use crate::store::{ConversationStore, DedupCache};
use std::sync::Arc;

/// Container for the pipeline services, injected into the routes.
#[derive(Clone)]
pub struct AppState {
    pub ingest_service: Arc<IngestService>,
    pub answer_service: Arc<AnswerService>,
    /// Shared bearer secret; `None` leaves the auth gate open.
    pub auth_token: Option<Arc<str>>,
}

impl AppState {
    pub fn new(
        config: &AppConfig,
        embedder: Arc<dyn Embedder>,
        index: Arc<dyn VectorIndex>,
        llm: Arc<dyn ChatModel>,
    ) -> Result<Self, AppError> {
        let acquirer = DocumentAcquirer::new(config.download_timeout())?;
        let dedup = DedupCache::new();
        let conversations = ConversationStore::new();

        let chunking = ChunkingConfig {
            window: config.ingest.chunk_size,
            overlap: config.ingest.chunk_overlap,
        };
        let retry = RetryPolicy {
            max_attempts: config.retrieval.max_attempts,
            backoff: config.retrieval_backoff(),
        };

        Ok(Self {
            ingest_service: Arc::new(IngestService::new(
                acquirer,
                Arc::clone(&embedder),
                Arc::clone(&index),
                dedup,
                chunking,
                config.ingest.max_concurrent_upserts,
            )),
            answer_service: Arc::new(AnswerService::new(
                embedder,
                index,
                llm,
                conversations,
                config.retrieval.top_k,
                retry,
            )),
            auth_token: config.auth.team_token.as_deref().map(Arc::from),
        })
    }
}
