//! Embedding providers for schema retrieval
//!
//! Two providers ship by default: a remote OpenAI-compatible endpoint and a
//! deterministic local hashing embedder that needs no network. Provider
//! selection runs once per process: each candidate is probed in order with a
//! trivial input and the first one that answers is used for the lifetime of
//! the index.

use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

mod hash;
mod remote;

pub use hash::HashEmbedder;
pub use remote::RemoteEmbedder;

/// Input used for the one-time liveness probe at provider selection.
const PROBE_TEXT: &str = "ping";

#[derive(Debug, Error)]
pub enum EmbedError {
    #[error("Embedding API call failed: {0}")]
    Api(#[from] async_openai::error::OpenAIError),

    #[error("Embedding provider {provider} unavailable: {message}")]
    Unavailable { provider: String, message: String },

    #[error("Embedding response missing vector for input {index}")]
    MissingVector { index: usize },

    #[error("All embedding providers failed: {}", failures.join("; "))]
    AllProvidersFailed { failures: Vec<String> },
}

/// A text-embedding model: text in, fixed-length vector out.
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Provider name for diagnostics and backend reporting.
    fn name(&self) -> &str;

    async fn embed_one(&self, text: &str) -> Result<Vec<f32>, EmbedError>;

    async fn embed_many(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbedError> {
        let mut vectors = Vec::with_capacity(texts.len());
        for text in texts {
            vectors.push(self.embed_one(text).await?);
        }
        Ok(vectors)
    }
}

/// Ordered list of providers tried in sequence; the first whose liveness
/// probe succeeds is selected, and every failure is collected so the final
/// error names what went wrong where.
pub struct EmbedderChain {
    providers: Vec<Arc<dyn Embedder>>,
}

impl EmbedderChain {
    pub fn new(providers: Vec<Arc<dyn Embedder>>) -> Self {
        Self { providers }
    }

    /// Probe each provider once with [`PROBE_TEXT`] and return the first
    /// that answers with a non-empty vector. Selection happens once per
    /// process, not per embed call; a primary failure never reaches the
    /// caller as long as a later provider works.
    pub async fn select(self) -> Result<Arc<dyn Embedder>, EmbedError> {
        let mut failures = Vec::new();
        for provider in self.providers {
            match provider.embed_one(PROBE_TEXT).await {
                Ok(v) if !v.is_empty() => {
                    tracing::info!(
                        provider = provider.name(),
                        dimension = v.len(),
                        "Embedding provider selected"
                    );
                    return Ok(provider);
                }
                Ok(_) => {
                    failures.push(format!("{}: probe returned an empty vector", provider.name()));
                }
                Err(e) => {
                    tracing::warn!(
                        provider = provider.name(),
                        error = %e,
                        "Embedding provider probe failed, trying next"
                    );
                    failures.push(format!("{}: {e}", provider.name()));
                }
            }
        }
        Err(EmbedError::AllProvidersFailed { failures })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct DownEmbedder;

    #[async_trait]
    impl Embedder for DownEmbedder {
        fn name(&self) -> &str {
            "down"
        }

        async fn embed_one(&self, _text: &str) -> Result<Vec<f32>, EmbedError> {
            Err(EmbedError::Unavailable {
                provider: "down".to_string(),
                message: "connection refused".to_string(),
            })
        }
    }

    #[tokio::test]
    async fn chain_falls_back_when_primary_probe_fails() {
        let chain = EmbedderChain::new(vec![
            Arc::new(DownEmbedder),
            Arc::new(HashEmbedder::new(64)),
        ]);

        let selected = chain.select().await.expect("fallback should be selected");
        assert_eq!(selected.name(), "hash-embedder");

        // Subsequent calls go straight to the fallback with no error.
        let v = selected.embed_one("how many employees are there").await.unwrap();
        assert_eq!(v.len(), 64);
    }

    #[tokio::test]
    async fn chain_reports_all_failures() {
        let chain = EmbedderChain::new(vec![Arc::new(DownEmbedder), Arc::new(DownEmbedder)]);

        let err = match chain.select().await {
            Ok(_) => panic!("expected all providers to fail"),
            Err(e) => e,
        };
        match err {
            EmbedError::AllProvidersFailed { failures } => {
                assert_eq!(failures.len(), 2);
                assert!(failures[0].contains("connection refused"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn embed_many_default_preserves_order() {
        let embedder = HashEmbedder::new(32);
        let texts = vec!["alpha".to_string(), "beta".to_string()];
        let vectors = embedder.embed_many(&texts).await.unwrap();
        assert_eq!(vectors.len(), 2);
        assert_eq!(vectors[0], embedder.embed_one("alpha").await.unwrap());
        assert_eq!(vectors[1], embedder.embed_one("beta").await.unwrap());
    }
}
