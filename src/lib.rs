//! docqa: retrieval-augmented question answering over remote documents.
//!
//! The write path fetches a PDF/DOCX document, chunks its text into overlapping
//! windows, embeds each chunk and upserts it into an external vector index,
//! deduplicating by a content hash of the document locator. The read path
//! optionally rewrites a follow-up question into a standalone query, retrieves
//! the nearest chunks and asks an LLM to synthesize an answer grounded in them.
//!
//! The embedding service, the vector index and the LLM are external HTTP
//! services behind the [`embeddings::Embedder`], [`index::VectorIndex`] and
//! [`llm::ChatModel`] traits; in-process implementations of each exist for
//! local runs and tests.

pub mod chunker;
pub mod config;
pub mod document;
pub mod embeddings;
pub mod errors;
pub mod fingerprint;
pub mod index;
pub mod llm;
pub mod metrics;
pub mod middleware;
pub mod routes;
pub mod services;
pub mod store;

pub use errors::AppError;
