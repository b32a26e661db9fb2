//! Embedding service abstraction.
//!
//! [`CloudEmbedder`] speaks the OpenAI `/embeddings` wire format;
//! [`MockEmbedder`] is a deterministic in-process stand-in selected by
//! configuring the API key as `"mock"`.

use crate::config::EmbeddingsConfig;
use crate::errors::AppError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::time::Duration;

#[async_trait]
pub trait Embedder: Send + Sync {
    /// Embed a single text into a fixed-length vector.
    async fn embed(&self, text: &str) -> Result<Vec<f32>, AppError>;
}

pub struct CloudEmbedder {
    client: reqwest::Client,
    config: EmbeddingsConfig,
}

#[derive(Serialize)]
struct EmbeddingRequest<'a> {
    input: [&'a str; 1],
    model: &'a str,
}

#[derive(Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Deserialize)]
struct EmbeddingData {
    embedding: Vec<f32>,
}

impl CloudEmbedder {
    pub fn new(config: EmbeddingsConfig) -> Result<Self, AppError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| AppError::EmbeddingFailed(format!("HTTP client setup: {e}")))?;
        Ok(Self { client, config })
    }
}

#[async_trait]
impl Embedder for CloudEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, AppError> {
        let url = format!("{}/embeddings", self.config.api_url);
        let request = EmbeddingRequest { input: [text], model: &self.config.model };

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.config.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| AppError::EmbeddingFailed(format!("request failed: {e}")))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::EmbeddingFailed(format!("API error {status}: {body}")));
        }

        let parsed: EmbeddingResponse = response
            .json()
            .await
            .map_err(|e| AppError::EmbeddingFailed(format!("response parse: {e}")))?;

        parsed
            .data
            .into_iter()
            .next()
            .map(|d| d.embedding)
            .ok_or_else(|| AppError::EmbeddingFailed("empty response".to_string()))
    }
}

/// Deterministic embedder: the vector is derived from a digest of the text,
/// so identical texts always embed identically. Useful for local runs and for
/// exercising the pipeline without an external service.
pub struct MockEmbedder {
    dimension: usize,
}

impl MockEmbedder {
    pub fn new(dimension: usize) -> Self {
        Self { dimension }
    }
}

#[async_trait]
impl Embedder for MockEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, AppError> {
        let digest = Sha256::digest(text.as_bytes());
        let vector = (0..self.dimension)
            .map(|i| {
                let byte = digest[i % digest.len()];
                // Spread values over [-1, 1), perturbed by position so the
                // vector is not a repeating pattern.
                (byte as f32 + (i / digest.len()) as f32).sin()
            })
            .collect();
        Ok(vector)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn mock_is_deterministic_and_text_sensitive() {
        let embedder = MockEmbedder::new(64);
        let a = embedder.embed("waiting period").await.unwrap();
        let b = embedder.embed("waiting period").await.unwrap();
        let c = embedder.embed("maternity cover").await.unwrap();
        assert_eq!(a.len(), 64);
        assert_eq!(a, b);
        assert_ne!(a, c);
    }
}
