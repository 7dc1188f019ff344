//! Index storage backends
//!
//! Both backends serve the same brute-force cosine scan; they differ only
//! in where the card/vector table lives. `PersistedBackend` writes the
//! table to disk at build so a later process can reopen it; `ExactBackend`
//! keeps everything in memory.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::{IndexEntry, IndexError};

const INDEX_FILE: &str = "index.json";

/// A place the embedded card table can be committed to at build time.
pub trait IndexBackend: Send + Sync {
    fn name(&self) -> &'static str;

    /// Commit the table; returns the entries the index will serve from.
    fn commit(&self, entries: Vec<IndexEntry>) -> Result<Vec<IndexEntry>, IndexError>;
}

/// In-memory backend. Commit is a no-op; nothing outlives the process.
pub struct ExactBackend;

impl IndexBackend for ExactBackend {
    fn name(&self) -> &'static str {
        "exact-memory"
    }

    fn commit(&self, entries: Vec<IndexEntry>) -> Result<Vec<IndexEntry>, IndexError> {
        Ok(entries)
    }
}

#[derive(Serialize, Deserialize)]
struct PersistedTable {
    dimension: usize,
    entries: Vec<IndexEntry>,
}

/// File-persisted backend: the table is written to `<dir>/index.json` at
/// build and can be reopened without re-embedding the card set.
pub struct PersistedBackend {
    dir: PathBuf,
}

impl PersistedBackend {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn index_path(&self) -> PathBuf {
        self.dir.join(INDEX_FILE)
    }

    /// Reload a previously committed table.
    pub fn load(&self) -> Result<Vec<IndexEntry>, IndexError> {
        let contents = std::fs::read_to_string(self.index_path())?;
        let table: PersistedTable = serde_json::from_str(&contents)?;
        for e in &table.entries {
            if e.vector.len() != table.dimension {
                return Err(IndexError::DimensionMismatch {
                    expected: table.dimension,
                    got: e.vector.len(),
                });
            }
        }
        Ok(table.entries)
    }

    pub fn path(&self) -> &Path {
        &self.dir
    }
}

impl IndexBackend for PersistedBackend {
    fn name(&self) -> &'static str {
        "file-persisted"
    }

    fn commit(&self, entries: Vec<IndexEntry>) -> Result<Vec<IndexEntry>, IndexError> {
        std::fs::create_dir_all(&self.dir)?;
        let table = PersistedTable {
            dimension: entries.first().map(|e| e.vector.len()).unwrap_or(0),
            entries,
        };
        let json = serde_json::to_string(&table)?;
        std::fs::write(self.index_path(), json)?;
        Ok(table.entries)
    }
}
