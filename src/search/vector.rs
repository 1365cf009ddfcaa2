//! Vector similarity search over neuron embeddings
//!
//! A flat in-memory matrix of `(id, embedding)`, loaded lazily from the
//! Store and invalidated on neuron mutation. A linear scan is acceptable at
//! the scales this system targets (tens of thousands of neurons); an ANN
//! structure could be swapped in behind the same `top_k` contract.

use super::embedding::cosine_similarity;
use crate::storage::{Store, StoreError};

/// Default embedding dimensionality assumed when the store is empty.
/// Informational only — the index does not enforce a fixed dimension
/// itself; mismatched-length vectors simply score `0.0` against each other.
pub const DEFAULT_DIMENSIONS: usize = 256;

#[non_exhaustive]
#[derive(Debug, thiserror::Error)]
pub enum VectorSearchError {
    #[error("failed to load embeddings from store: {0}")]
    LoadFailure(#[from] StoreError),
}

/// Snapshot statistics about the cached index contents.
#[derive(Debug, Clone, Default)]
pub struct VectorIndexStats {
    pub total_vectors: usize,
    pub dimensions: usize,
}

/// Cached flat embedding matrix with a top-k cosine similarity scan.
pub struct VectorIndex {
    entries: Vec<(String, Vec<f32>)>,
    loaded: bool,
}

impl Default for VectorIndex {
    fn default() -> Self {
        Self::new()
    }
}

impl VectorIndex {
    /// Create an empty, unloaded index.
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
            loaded: false,
        }
    }

    /// Number of cached vectors, loading from the store first if needed.
    pub fn len(&mut self, store: &Store) -> Result<usize, VectorSearchError> {
        self.ensure_loaded(store)?;
        Ok(self.entries.len())
    }

    pub fn is_empty(&mut self, store: &Store) -> Result<bool, VectorSearchError> {
        Ok(self.len(store)? == 0)
    }

    /// Drop the cached matrix. The next `top_k` call reloads from the
    /// store. Must be called after any neuron create, batch insert, file
    /// delete, or `clear_all`.
    pub fn invalidate(&mut self) {
        self.entries.clear();
        self.loaded = false;
    }

    fn ensure_loaded(&mut self, store: &Store) -> Result<(), VectorSearchError> {
        if self.loaded {
            return Ok(());
        }
        self.entries = store.all_embeddings()?;
        self.loaded = true;
        Ok(())
    }

    /// Top `k` neuron ids by cosine similarity to `query_vec`, descending,
    /// ties broken by neuron id for determinism. Neurons with no embedding
    /// are excluded (they are never cached in the first place).
    pub fn top_k(
        &mut self,
        store: &Store,
        query_vec: &[f32],
        k: usize,
    ) -> Result<Vec<(String, f32)>, VectorSearchError> {
        self.ensure_loaded(store)?;

        let mut scored: Vec<(String, f32)> = self
            .entries
            .iter()
            .map(|(id, vec)| (id.clone(), cosine_similarity(query_vec, vec)))
            .collect();

        scored.sort_by(|a, b| {
            b.1.partial_cmp(&a.1)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.0.cmp(&b.0))
        });
        scored.truncate(k);
        Ok(scored)
    }

    /// Statistics about the currently cached matrix, loading first if needed.
    pub fn stats(&mut self, store: &Store) -> Result<VectorIndexStats, VectorSearchError> {
        self.ensure_loaded(store)?;
        let dimensions = self.entries.first().map(|(_, v)| v.len()).unwrap_or(0);
        Ok(VectorIndexStats {
            total_vectors: self.entries.len(),
            dimensions,
        })
    }
}
