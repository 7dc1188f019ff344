//! End-to-end question pipeline
//!
//! retrieve → assemble → generate → sanitize → policy-check → execute,
//! strictly in that order, one question at a time. The card set, example
//! bank, and index are read-only once construction finishes.

use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tracing::Instrument;
use uuid::Uuid;

use tabletalk_core::{
    builtin_cards, check_statement, load_cards, sanitize, ExampleBank, PolicyViolation,
    PromptPolicy, PromptRequest, SchemaCard, SchemaError,
};
use tabletalk_embed::{EmbedError, EmbedderChain, HashEmbedder, RemoteEmbedder};
use tabletalk_index::{ExactBackend, IndexBackend, IndexError, PersistedBackend, VectorIndex};
use tabletalk_mysql::{ExecutionError, QueryOutput, SqlExecutor};

use crate::config::Config;
use crate::llm::{GenerateError, SqlGenerator};

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Schema(#[from] SchemaError),

    #[error(transparent)]
    Embedding(#[from] EmbedError),

    #[error(transparent)]
    Index(#[from] IndexError),

    #[error(transparent)]
    Generate(#[from] GenerateError),

    #[error(transparent)]
    Policy(#[from] PolicyViolation),

    #[error(transparent)]
    Execution(#[from] ExecutionError),
}

/// What one question produces: the SQL that ran and the rows it returned.
pub struct Answer {
    pub sql: String,
    pub output: QueryOutput,
}

pub struct Pipeline {
    cards: Vec<SchemaCard>,
    examples: ExampleBank,
    index: Option<VectorIndex>,
    policy: PromptPolicy,
    generator: SqlGenerator,
    executor: SqlExecutor,
    top_k: usize,
}

impl Pipeline {
    /// Wire every component from configuration. The embedding provider is
    /// selected once here (primary probed first, local fallback second) and
    /// the index is built before the first question is accepted.
    pub async fn from_config(config: &Config) -> Result<Self, PipelineError> {
        let cards = match &config.retrieval.cards_path {
            Some(path) => load_cards(path)?,
            None => builtin_cards(),
        };
        tracing::info!(cards = cards.len(), "Schema cards loaded");

        let index = if config.retrieval.use_retriever {
            let chain = EmbedderChain::new(vec![
                Arc::new(RemoteEmbedder::new(
                    &config.embedding.base_url,
                    &Config::api_key(),
                    &config.embedding.model,
                )),
                Arc::new(HashEmbedder::new(config.embedding.fallback_dimension)),
            ]);
            let embedder = chain.select().await?;

            let backends = index_backends(config.retrieval.persist_dir.as_deref());
            Some(VectorIndex::build(cards.clone(), embedder, &backends).await?)
        } else {
            tracing::info!("Retriever disabled, prompts carry the full schema");
            None
        };

        let generator = SqlGenerator::new(
            &config.llm.base_url,
            &Config::api_key(),
            &config.llm.model,
        )
        .with_timeout(Duration::from_secs(config.timeouts.generate_secs));

        let executor = SqlExecutor::connect(&config.database.url)
            .await?
            .with_row_cap(config.policy.row_cap)
            .with_timeout(Duration::from_secs(config.timeouts.execute_secs));

        Ok(Self {
            cards,
            examples: ExampleBank::builtin(),
            index,
            policy: PromptPolicy {
                dialect: config.policy.dialect.clone(),
                row_cap: config.policy.row_cap,
            },
            generator,
            executor,
            top_k: config.retrieval.top_k,
        })
    }

    /// Process one question end to end.
    pub async fn ask(&self, question: &str) -> Result<Answer, PipelineError> {
        let question_id = Uuid::new_v4();
        self.ask_inner(question)
            .instrument(tracing::info_span!("question", %question_id))
            .await
    }

    async fn ask_inner(&self, question: &str) -> Result<Answer, PipelineError> {
        let prompt = self.assemble(question).await?;
        tracing::debug!(fingerprint = %prompt.fingerprint(), "Prompt assembled");

        let raw = self.generator.generate(&prompt).await?;
        let sql = sanitize(&raw);

        // The executor rechecks, but a violation should never get that far.
        check_statement(&sql)?;
        tracing::info!(sql = %sql, "Generated SQL accepted");

        let output = self.executor.execute(&sql).await?;
        Ok(Answer { sql, output })
    }

    async fn assemble(&self, question: &str) -> Result<PromptRequest, PipelineError> {
        let cards: Vec<SchemaCard> = match &self.index {
            Some(index) => {
                let hits = index.query(question, self.top_k).await?;
                tracing::debug!(
                    retrieved = hits.len(),
                    tables = ?hits.iter().map(|h| h.card.table.as_str()).collect::<Vec<_>>(),
                    "Schema cards retrieved"
                );
                hits.into_iter().map(|h| h.card).collect()
            }
            None => self.cards.clone(),
        };

        Ok(PromptRequest::assemble(
            &self.policy,
            &cards,
            &self.examples,
            question,
        ))
    }
}

/// Backend order: when a persist directory is configured the persisted
/// backend is primary and memory the fallback; otherwise memory alone.
fn index_backends(persist_dir: Option<&str>) -> Vec<Box<dyn IndexBackend>> {
    match persist_dir {
        Some(dir) => vec![
            Box::new(PersistedBackend::new(dir)),
            Box::new(ExactBackend),
        ],
        None => vec![Box::new(ExactBackend)],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backend_order_with_persist_dir() {
        let backends = index_backends(Some("/tmp/tabletalk-index"));
        assert_eq!(backends.len(), 2);
        assert_eq!(backends[0].name(), "file-persisted");
        assert_eq!(backends[1].name(), "exact-memory");
    }

    #[test]
    fn test_backend_order_without_persist_dir() {
        let backends = index_backends(None);
        assert_eq!(backends.len(), 1);
        assert_eq!(backends[0].name(), "exact-memory");
    }
}
