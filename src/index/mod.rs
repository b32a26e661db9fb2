//! Vector index abstraction.
//!
//! [`HttpVectorIndex`] speaks a Pinecone-style REST surface
//! (`/vectors/upsert`, `/query`); [`MemoryIndex`] is an in-process cosine
//! index selected by configuring the API key as `"memory"`.

use crate::config::IndexConfig;
use crate::errors::AppError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;

/// A chunk's embedding plus its retrievable metadata. Written once per chunk
/// per document, never mutated.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexRecord {
    pub id: String,
    pub vector: Vec<f32>,
    pub text: String,
    pub position: usize,
}

/// A retrieved passage with its similarity score, highest first.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredPassage {
    pub text: String,
    pub position: usize,
    pub score: f32,
}

#[async_trait]
pub trait VectorIndex: Send + Sync {
    async fn upsert(&self, records: &[IndexRecord]) -> Result<(), AppError>;

    /// Nearest-neighbor search returning the `top_k` best passages with
    /// metadata, best first.
    async fn query(&self, vector: &[f32], top_k: usize) -> Result<Vec<ScoredPassage>, AppError>;
}

pub struct HttpVectorIndex {
    client: reqwest::Client,
    config: IndexConfig,
}

#[derive(Deserialize)]
struct QueryResponse {
    #[serde(default)]
    matches: Vec<QueryMatch>,
}

#[derive(Deserialize)]
struct QueryMatch {
    score: f32,
    #[serde(default)]
    metadata: Option<MatchMetadata>,
}

#[derive(Deserialize)]
struct MatchMetadata {
    #[serde(default)]
    text: String,
    #[serde(default)]
    position: usize,
}

impl HttpVectorIndex {
    pub fn new(config: IndexConfig) -> Result<Self, AppError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| AppError::IndexingFailed(format!("HTTP client setup: {e}")))?;
        Ok(Self { client, config })
    }
}

#[async_trait]
impl VectorIndex for HttpVectorIndex {
    async fn upsert(&self, records: &[IndexRecord]) -> Result<(), AppError> {
        let url = format!("{}/vectors/upsert", self.config.api_url);
        let vectors: Vec<_> = records
            .iter()
            .map(|r| {
                json!({
                    "id": r.id,
                    "values": r.vector,
                    "metadata": { "text": r.text, "position": r.position },
                })
            })
            .collect();
        let body = json!({ "vectors": vectors, "namespace": self.config.namespace });

        let response = self
            .client
            .post(&url)
            .header("Api-Key", &self.config.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| AppError::IndexingFailed(format!("upsert request: {e}")))?;

        if !response.status().is_success() {
            return Err(AppError::IndexingFailed(format!(
                "upsert API error {}",
                response.status()
            )));
        }
        Ok(())
    }

    async fn query(&self, vector: &[f32], top_k: usize) -> Result<Vec<ScoredPassage>, AppError> {
        let url = format!("{}/query", self.config.api_url);
        let body = json!({
            "vector": vector,
            "topK": top_k,
            "includeMetadata": true,
            "namespace": self.config.namespace,
        });

        let response = self
            .client
            .post(&url)
            .header("Api-Key", &self.config.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| AppError::RetrievalFailed(format!("query request: {e}")))?;

        if !response.status().is_success() {
            return Err(AppError::RetrievalFailed(format!(
                "query API error {}",
                response.status()
            )));
        }

        let parsed: QueryResponse = response
            .json()
            .await
            .map_err(|e| AppError::RetrievalFailed(format!("query response parse: {e}")))?;

        Ok(parsed
            .matches
            .into_iter()
            .map(|m| {
                let metadata = m.metadata.unwrap_or(MatchMetadata { text: String::new(), position: 0 });
                ScoredPassage { text: metadata.text, position: metadata.position, score: m.score }
            })
            .collect())
    }
}

/// In-process cosine-similarity index. No eviction; records live for the
/// process lifetime, mirroring the external index's write-once model.
#[derive(Clone, Default)]
pub struct MemoryIndex {
    records: Arc<RwLock<Vec<IndexRecord>>>,
}

impl MemoryIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.records.read().await.is_empty()
    }
}

fn cosine(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a * norm_b)
}

#[async_trait]
impl VectorIndex for MemoryIndex {
    async fn upsert(&self, records: &[IndexRecord]) -> Result<(), AppError> {
        let mut store = self.records.write().await;
        for record in records {
            if let Some(existing) = store.iter_mut().find(|r| r.id == record.id) {
                *existing = record.clone();
            } else {
                store.push(record.clone());
            }
        }
        Ok(())
    }

    async fn query(&self, vector: &[f32], top_k: usize) -> Result<Vec<ScoredPassage>, AppError> {
        let store = self.records.read().await;
        let mut scored: Vec<ScoredPassage> = store
            .iter()
            .map(|r| ScoredPassage {
                text: r.text.clone(),
                position: r.position,
                score: cosine(&r.vector, vector),
            })
            .collect();
        scored.sort_by(|a, b| b.score.total_cmp(&a.score));
        scored.truncate(top_k);
        Ok(scored)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(id: &str, vector: Vec<f32>, text: &str, position: usize) -> IndexRecord {
        IndexRecord { id: id.to_string(), vector, text: text.to_string(), position }
    }

    #[tokio::test]
    async fn memory_index_ranks_by_cosine() {
        let index = MemoryIndex::new();
        index
            .upsert(&[
                record("a", vec![1.0, 0.0], "about waiting periods", 0),
                record("b", vec![0.0, 1.0], "about premiums", 1),
                record("c", vec![0.9, 0.1], "more on waiting periods", 2),
            ])
            .await
            .unwrap();

        let results = index.query(&[1.0, 0.0], 2).await.unwrap();
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].text, "about waiting periods");
        assert_eq!(results[1].text, "more on waiting periods");
        assert!(results[0].score >= results[1].score);
    }

    #[tokio::test]
    async fn memory_index_upsert_replaces_by_id() {
        let index = MemoryIndex::new();
        index.upsert(&[record("a", vec![1.0], "old", 0)]).await.unwrap();
        index.upsert(&[record("a", vec![1.0], "new", 0)]).await.unwrap();
        assert_eq!(index.len().await, 1);
        let results = index.query(&[1.0], 1).await.unwrap();
        assert_eq!(results[0].text, "new");
    }

    #[test]
    fn cosine_handles_zero_vectors() {
        assert_eq!(cosine(&[0.0, 0.0], &[1.0, 0.0]), 0.0);
        assert!((cosine(&[1.0, 0.0], &[1.0, 0.0]) - 1.0).abs() < 1e-6);
    }
}
