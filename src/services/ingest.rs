//! Document ingestion service: the write path of the pipeline.
//!
//! acquire → extract text → chunk → embed + upsert → mark content hash.
//! Ingestion is idempotent per content hash within one process lifetime: a
//! hash already marked in the dedup cache skips every step, including the
//! download itself.

use crate::chunker::{chunk_text, ChunkingConfig};
use crate::document::{self, DocumentAcquirer};
use crate::embeddings::Embedder;
use crate::errors::AppError;
use crate::fingerprint::content_hash;
use crate::index::{IndexRecord, VectorIndex};
use crate::store::DedupCache;
use futures::stream::{self, StreamExt, TryStreamExt};
use std::sync::Arc;
use std::time::Instant;
use tracing::instrument;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IngestOutcome {
    Indexed { chunks: usize },
    /// Content hash was already marked; no embedding or upsert happened.
    AlreadyIndexed,
}

pub struct IngestService {
    acquirer: DocumentAcquirer,
    embedder: Arc<dyn Embedder>,
    index: Arc<dyn VectorIndex>,
    dedup: DedupCache,
    chunking: ChunkingConfig,
    max_concurrent_upserts: usize,
}

impl IngestService {
    pub fn new(
        acquirer: DocumentAcquirer,
        embedder: Arc<dyn Embedder>,
        index: Arc<dyn VectorIndex>,
        dedup: DedupCache,
        chunking: ChunkingConfig,
        max_concurrent_upserts: usize,
    ) -> Self {
        Self {
            acquirer,
            embedder,
            index,
            dedup,
            chunking,
            max_concurrent_upserts: max_concurrent_upserts.max(1),
        }
    }

    /// Fetch and index the document behind `url`, unless its content hash is
    /// already marked as indexed.
    ///
    /// Any embedding or upsert failure aborts the whole ingestion with
    /// `IndexingFailed`; upserts already committed are not rolled back. The
    /// downloaded temp artifact is removed on success and failure alike.
    #[instrument(skip(self), fields(url = %url))]
    pub async fn ingest_url(&self, url: &str) -> Result<IngestOutcome, AppError> {
        let hash = content_hash(url);

        if self.dedup.contains(&hash).await {
            tracing::debug!(hash = %hash, "Document already indexed, skipping ingestion");
            metrics::counter!("docqa_ingest_dedup_hits_total").increment(1);
            return Ok(IngestOutcome::AlreadyIndexed);
        }

        let start = Instant::now();
        let (format, artifact) = self.acquirer.fetch(url).await?;
        let text = document::extract_text(format, artifact.path())?;
        let chunks = chunk_text(&text, &self.chunking);
        let chunk_count = chunks.len();

        stream::iter(chunks)
            .map(|chunk| {
                let embedder = Arc::clone(&self.embedder);
                let index = Arc::clone(&self.index);
                let id = format!("{hash}-{}", chunk.position);
                async move {
                    let vector = embedder
                        .embed(&chunk.text)
                        .await
                        .map_err(|e| AppError::IndexingFailed(e.to_string()))?;
                    let record = IndexRecord {
                        id,
                        vector,
                        text: chunk.text,
                        position: chunk.position,
                    };
                    index.upsert(&[record]).await
                }
            })
            .buffer_unordered(self.max_concurrent_upserts)
            .try_collect::<Vec<()>>()
            .await?;

        self.dedup.mark(hash.clone()).await;

        let elapsed = start.elapsed();
        metrics::counter!("docqa_ingest_documents_total").increment(1);
        metrics::counter!("docqa_ingest_chunks_total").increment(chunk_count as u64);
        metrics::histogram!("docqa_ingest_duration_seconds").record(elapsed.as_secs_f64());

        tracing::info!(
            hash = %hash,
            chunks = chunk_count,
            total_ms = elapsed.as_millis(),
            "Document ingested"
        );

        Ok(IngestOutcome::Indexed { chunks: chunk_count })
    }
}
