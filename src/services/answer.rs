//! Question answering service: the read path of the pipeline.
//!
//! For each question: optional conversational rewrite → embed → top-K vector
//! query with bounded retry → grounded prompt → one LLM call. A batch fans
//! out all questions concurrently and collects answers in input order.
//!
//! Answer-phase failures are isolated per question: whatever goes wrong for
//! one question degrades it to a fixed error sentence instead of failing its
//! siblings. Ingestion-phase failures, by contrast, fail the whole request.
//! That asymmetry is a policy decision, not an accident.

use crate::embeddings::Embedder;
use crate::errors::AppError;
use crate::index::{ScoredPassage, VectorIndex};
use crate::llm::{ChatMessage, ChatModel};
use crate::store::{ConversationStore, Role, Turn};
use futures::future::join_all;
use std::fmt::Write as _;
use std::sync::Arc;
use std::time::Duration;
use tracing::instrument;

/// Fixed refusal sentence the model is instructed to emit when the answer is
/// absent from the supplied context.
pub const NOT_FOUND_ANSWER: &str = "I could not find the answer in the provided document.";

/// Fixed sentence substituted when the answer phase fails for one question.
pub const QUESTION_ERROR_ANSWER: &str = "An error occurred while processing this question.";

/// Fixed-delay retry for vector queries. No exponential backoff, no jitter;
/// a deliberate simplification.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Total attempts, not extra retries.
    pub max_attempts: u32,
    pub backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self { max_attempts: 2, backoff: Duration::from_millis(500) }
    }
}

pub struct AnswerService {
    embedder: Arc<dyn Embedder>,
    index: Arc<dyn VectorIndex>,
    llm: Arc<dyn ChatModel>,
    conversations: ConversationStore,
    top_k: usize,
    retry: RetryPolicy,
}

impl AnswerService {
    pub fn new(
        embedder: Arc<dyn Embedder>,
        index: Arc<dyn VectorIndex>,
        llm: Arc<dyn ChatModel>,
        conversations: ConversationStore,
        top_k: usize,
        retry: RetryPolicy,
    ) -> Self {
        Self {
            embedder,
            index,
            llm,
            conversations,
            top_k,
            retry: RetryPolicy { max_attempts: retry.max_attempts.max(1), ..retry },
        }
    }

    /// Answer every question concurrently. The result vector is ordered by
    /// input position, never by completion time, and always has one entry per
    /// question.
    pub async fn answer_batch(&self, questions: Vec<String>) -> Vec<String> {
        let tasks = questions.into_iter().map(|q| self.answer_isolated(q));
        join_all(tasks).await
    }

    /// Answer within a conversation. On success the turn and its answer are
    /// appended to the session history; a failed turn is not recorded, so
    /// later rewrites are never conditioned on the fixed error sentence.
    #[instrument(skip(self, question), fields(session_id = %session_id))]
    pub async fn answer_chat(&self, session_id: &str, question: &str) -> String {
        let history = self.conversations.history(session_id).await;
        match self.answer_in_context(&history, question).await {
            Ok(answer) => {
                self.conversations.append(session_id, Turn::user(question)).await;
                self.conversations.append(session_id, Turn::model(answer.clone())).await;
                answer
            }
            Err(e) => {
                tracing::warn!(error = %e, "Chat answer phase failed, degrading to fixed sentence");
                metrics::counter!("docqa_question_failures_total").increment(1);
                QUESTION_ERROR_ANSWER.to_string()
            }
        }
    }

    async fn answer_isolated(&self, question: String) -> String {
        metrics::counter!("docqa_questions_total").increment(1);
        match self.answer_one(&question).await {
            Ok(answer) => answer,
            Err(e) => {
                tracing::warn!(error = %e, question = %question, "Answer phase failed, degrading to fixed sentence");
                metrics::counter!("docqa_question_failures_total").increment(1);
                QUESTION_ERROR_ANSWER.to_string()
            }
        }
    }

    async fn answer_one(&self, question: &str) -> Result<String, AppError> {
        let passages = self.retrieve(question).await?;
        self.synthesize(question, &passages, &[]).await
    }

    async fn answer_in_context(&self, history: &[Turn], question: &str) -> Result<String, AppError> {
        let standalone = self.rewrite_question(history, question).await?;
        let passages = self.retrieve(&standalone).await?;
        self.synthesize(question, &passages, history).await
    }

    /// Rephrase a follow-up question into a standalone query using the
    /// conversation history. Operates on a history snapshot; the stored
    /// history is never touched. Failure propagates as `RewriteFailed`; there
    /// is no silent fallback to the raw question.
    pub async fn rewrite_question(&self, history: &[Turn], question: &str) -> Result<String, AppError> {
        if history.is_empty() {
            return Ok(question.to_string());
        }

        let mut transcript = String::new();
        for turn in history {
            let speaker = match turn.role {
                Role::User => "User",
                Role::Model => "Assistant",
            };
            let _ = writeln!(transcript, "{speaker}: {}", turn.text);
        }

        let messages = [
            ChatMessage::system(
                "Rewrite the user's follow-up question as a single standalone question \
                 that needs no conversation context. Reply with the rewritten question only.",
            ),
            ChatMessage::user(format!(
                "Conversation so far:\n{transcript}\nFollow-up question: {question}"
            )),
        ];

        let rewritten = self
            .llm
            .complete(&messages)
            .await
            .map_err(|e| AppError::RewriteFailed(e.to_string()))?;

        let rewritten = rewritten.trim();
        tracing::debug!(original = %question, rewritten = %rewritten, "Rewrote follow-up question");
        Ok(rewritten.to_string())
    }

    /// Embed the query and run a top-K similarity search, retrying failed
    /// vector queries up to the policy bound with a fixed delay.
    pub async fn retrieve(&self, query: &str) -> Result<Vec<ScoredPassage>, AppError> {
        let vector = self
            .embedder
            .embed(query)
            .await
            .map_err(|e| AppError::RetrievalFailed(e.to_string()))?;

        let mut attempt = 1;
        loop {
            match self.index.query(&vector, self.top_k).await {
                Ok(passages) => {
                    tracing::debug!(query = %query, passages = passages.len(), attempt, "Retrieved passages");
                    return Ok(passages);
                }
                Err(e) if attempt < self.retry.max_attempts => {
                    tracing::warn!(attempt, error = %e, "Vector query failed, retrying after backoff");
                    metrics::counter!("docqa_retrieval_retries_total").increment(1);
                    tokio::time::sleep(self.retry.backoff).await;
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }

    /// Build a grounded prompt from the retrieved passages and ask the LLM
    /// once. Empty context short-circuits to the refusal sentence.
    async fn synthesize(
        &self,
        question: &str,
        passages: &[ScoredPassage],
        history: &[Turn],
    ) -> Result<String, AppError> {
        if passages.is_empty() {
            return Ok(NOT_FOUND_ANSWER.to_string());
        }

        let mut messages = Vec::with_capacity(history.len() + 2);
        messages.push(ChatMessage::system(format!(
            "You answer questions about a document using only the numbered source \
             passages supplied in the user message. If the answer is not present in \
             the passages, reply exactly: \"{NOT_FOUND_ANSWER}\""
        )));
        for turn in history {
            messages.push(match turn.role {
                Role::User => ChatMessage::user(turn.text.clone()),
                Role::Model => ChatMessage::assistant(turn.text.clone()),
            });
        }
        messages.push(ChatMessage::user(build_grounded_prompt(question, passages)));

        let answer = self
            .llm
            .complete(&messages)
            .await
            .map_err(|e| AppError::SynthesisFailed(e.to_string()))?;

        Ok(answer.trim().to_string())
    }
}

/// Enumerate the passages as labeled `Source N` blocks in rank order,
/// followed by the question.
fn build_grounded_prompt(question: &str, passages: &[ScoredPassage]) -> String {
    let mut prompt = String::from("Context passages, most relevant first:\n\n");
    for (rank, passage) in passages.iter().enumerate() {
        let _ = writeln!(prompt, "Source {}:\n{}\n", rank + 1, passage.text);
    }
    let _ = write!(prompt, "Question: {question}");
    prompt
}

#[cfg(test)]
mod tests {
    use super::*;

    fn passage(text: &str, score: f32) -> ScoredPassage {
        ScoredPassage { text: text.to_string(), position: 0, score }
    }

    #[test]
    fn prompt_labels_sources_in_rank_order() {
        let prompt = build_grounded_prompt(
            "Is maternity covered?",
            &[passage("first passage", 0.9), passage("second passage", 0.5)],
        );
        let first = prompt.find("Source 1:\nfirst passage").unwrap();
        let second = prompt.find("Source 2:\nsecond passage").unwrap();
        assert!(first < second);
        assert!(prompt.ends_with("Question: Is maternity covered?"));
    }
}
