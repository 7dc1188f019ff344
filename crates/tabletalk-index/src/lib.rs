//! Vector index over schema cards
//!
//! One embedding per card, queried by cosine similarity. Two storage
//! backends exist: a file-persisted one and a plain in-memory one. Build
//! tries the configured backends in order and keeps the first that
//! succeeds, logging which one is active; only when every backend fails
//! does construction error out.

use std::cmp::Ordering;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use tabletalk_core::SchemaCard;
use tabletalk_embed::{EmbedError, Embedder};

mod backend;

pub use backend::{ExactBackend, IndexBackend, PersistedBackend};

#[derive(Debug, Error)]
pub enum IndexError {
    #[error(transparent)]
    Embed(#[from] EmbedError),

    #[error("Vector dimension mismatch: index holds {expected}-dim vectors, got {got}")]
    DimensionMismatch { expected: usize, got: usize },

    #[error("Cannot build an index over zero schema cards")]
    EmptyCorpus,

    #[error("Index persistence I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("Index persistence encoding failed: {0}")]
    Encoding(#[from] serde_json::Error),

    #[error("All index backends failed: {}", failures.join("; "))]
    AllBackendsFailed { failures: Vec<String> },
}

/// A card paired with its embedding. The unit both backends store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexEntry {
    pub card: SchemaCard,
    pub vector: Vec<f32>,
}

/// A retrieved card with its similarity score.
#[derive(Debug, Clone)]
pub struct ScoredCard {
    pub card: SchemaCard,
    pub score: f32,
}

/// Read-only vector index: built once, queried many times.
pub struct VectorIndex {
    entries: Vec<IndexEntry>,
    dimension: usize,
    embedder: Arc<dyn Embedder>,
    backend: &'static str,
}

impl VectorIndex {
    /// Embed every card with `embedder` and commit the table through the
    /// first backend in `backends` that accepts it.
    ///
    /// All vectors must share one dimensionality; a mismatch is a
    /// construction error, never a query-time one.
    pub async fn build(
        cards: Vec<SchemaCard>,
        embedder: Arc<dyn Embedder>,
        backends: &[Box<dyn IndexBackend>],
    ) -> Result<Self, IndexError> {
        if cards.is_empty() {
            return Err(IndexError::EmptyCorpus);
        }

        let texts: Vec<String> = cards.iter().map(|c| c.content.clone()).collect();
        let vectors = embedder.embed_many(&texts).await?;

        let dimension = vectors[0].len();
        for v in &vectors {
            if v.len() != dimension {
                return Err(IndexError::DimensionMismatch {
                    expected: dimension,
                    got: v.len(),
                });
            }
        }

        let entries: Vec<IndexEntry> = cards
            .into_iter()
            .zip(vectors)
            .map(|(card, vector)| IndexEntry { card, vector })
            .collect();

        let mut failures = Vec::new();
        for backend in backends {
            match backend.commit(entries.clone()) {
                Ok(stored) => {
                    tracing::info!(
                        backend = backend.name(),
                        cards = stored.len(),
                        dimension,
                        "Vector index built"
                    );
                    return Ok(Self {
                        entries: stored,
                        dimension,
                        embedder,
                        backend: backend.name(),
                    });
                }
                Err(e) => {
                    tracing::warn!(
                        backend = backend.name(),
                        error = %e,
                        "Index backend failed, trying next"
                    );
                    failures.push(format!("{}: {e}", backend.name()));
                }
            }
        }
        Err(IndexError::AllBackendsFailed { failures })
    }

    /// Embed the question with the same provider used at build time and
    /// return the `k` most similar cards by cosine similarity, descending,
    /// with ties broken by card insertion order.
    pub async fn query(&self, question: &str, k: usize) -> Result<Vec<ScoredCard>, IndexError> {
        let qv = self.embedder.embed_one(question).await?;
        if qv.len() != self.dimension {
            return Err(IndexError::DimensionMismatch {
                expected: self.dimension,
                got: qv.len(),
            });
        }

        let mut scored: Vec<ScoredCard> = self
            .entries
            .iter()
            .map(|e| ScoredCard {
                card: e.card.clone(),
                score: cosine(&qv, &e.vector),
            })
            .collect();

        // Stable sort: equal scores keep insertion order.
        scored.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(Ordering::Equal));
        scored.truncate(k);
        Ok(scored)
    }

    /// Which backend accepted the build.
    pub fn active_backend(&self) -> &'static str {
        self.backend
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn dimension(&self) -> usize {
        self.dimension
    }
}

fn cosine(a: &[f32], b: &[f32]) -> f32 {
    let mut dot = 0.0f32;
    let mut na = 0.0f32;
    let mut nb = 0.0f32;
    for (x, y) in a.iter().zip(b) {
        dot += x * y;
        na += x * x;
        nb += y * y;
    }
    if na == 0.0 || nb == 0.0 {
        return 0.0;
    }
    dot / (na.sqrt() * nb.sqrt())
}
