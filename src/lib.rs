//! # neuralrag-core
//!
//! A local code-retrieval engine: a persistent graph of semantic code
//! chunks ("neurons") connected by weighted, typed edges ("synapses"),
//! retrieved by combining vector similarity search with bounded best-first
//! **spreading activation** over the graph. The graph adapts over time
//! through Hebbian-style edge learning driven by query outcomes.
//!
//! ## Components
//!
//! - [`storage`] — the durable embedded store: neurons, synapses, the
//!   indexed-file manifest, and the query log.
//! - [`search`] — embedding byte encoding and a flat cosine-similarity scan
//!   over cached neuron vectors.
//! - [`walker`] — bounded best-first spreading activation over synapses.
//! - [`retrieval`] — composes the vector index and graph walker into a
//!   single `query` entry point, with activation bookkeeping and logging.
//! - [`learner`] — Hebbian edge mutation: co-activation synthesis,
//!   strengthening, decay, and pruning.
//! - [`graph`] — the data model shared by all of the above (`Neuron`,
//!   `Synapse`, `IndexedFile`, `QueryLogEntry`).
//!
//! Chunking source files into neurons, computing embeddings, and any
//! outer agent coordination are out of scope here; they are external
//! collaborators that produce [`graph::NeuronCreateInput`] /
//! [`graph::SynapseCreateInput`] batches and consume [`walker::ActivationResult`]s.
//!
//! ## Quick start
//!
//! ```rust,ignore
//! use neuralrag_core::prelude::*;
//!
//! let store = Store::new(Some(Path::new(".neuralrag/brain.db")))?;
//! let mut index = VectorIndex::new();
//! let engine = RetrievalEngine::new(LearnerConfig::default());
//!
//! let n1 = store.create_neuron(NeuronCreateInput {
//!     content: "fn main() {}".to_string(),
//!     embedding: vec![1.0, 0.0, 0.0],
//!     file_path: "src/main.rs".to_string(),
//!     start_line: 1,
//!     end_line: 1,
//!     ..Default::default()
//! })?;
//!
//! let result = engine.query(&store, &mut index, "entry point", &[1.0, 0.0, 0.0], &RetrievalConfig::default(), None)?;
//! ```

#![cfg_attr(docsrs, feature(doc_cfg))]
#![warn(rustdoc::missing_crate_level_docs)]

pub mod graph;
pub mod learner;
pub mod retrieval;
pub mod search;
pub mod storage;
pub mod walker;

// ============================================================================
// PUBLIC API RE-EXPORTS
// ============================================================================

pub use graph::{
    IndexedFile, Neuron, NeuronCreateInput, NeuronType, QueryLogEntry, Synapse,
    SynapseCreateInput, SynapseType,
};

pub use storage::{Store, StoreError, StoreStats};

pub use search::{VectorIndex, VectorIndexStats, VectorSearchError};

pub use walker::{avg_activation_depth, ActivationResult, Entry, GraphWalker, WalkerConfig, WalkerError};

pub use retrieval::{QueryResult, RetrievalConfig, RetrievalEngine, RetrievalError};

pub use learner::{Learner, LearnerConfig, LearnerError};

/// Semantic version of this crate, exposed for diagnostics and schema-aware
/// tooling that wants to pair a store with the library build that wrote it.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// ============================================================================
// DEADLINE / CANCELLATION
// ============================================================================

/// A point-in-time deadline used to bound the Graph Walker and Learner
/// background jobs. Checked between bounded units of work (synapse hops,
/// batches), never inside a tight inner loop.
#[derive(Debug, Clone, Copy)]
pub struct Deadline {
    at: std::time::Instant,
}

impl Deadline {
    /// A deadline `timeout` from now.
    pub fn after(timeout: std::time::Duration) -> Self {
        Self {
            at: std::time::Instant::now() + timeout,
        }
    }

    pub fn is_expired(&self) -> bool {
        std::time::Instant::now() >= self.at
    }
}

/// Commonly paired imports for using this crate as a retrieval library.
pub mod prelude {
    pub use crate::graph::{
        IndexedFile, Neuron, NeuronCreateInput, NeuronType, QueryLogEntry, Synapse,
        SynapseCreateInput, SynapseType,
    };
    pub use crate::learner::{Learner, LearnerConfig};
    pub use crate::retrieval::{QueryResult, RetrievalConfig, RetrievalEngine};
    pub use crate::search::VectorIndex;
    pub use crate::storage::{Store, StoreError};
    pub use crate::walker::{ActivationResult, Entry, GraphWalker, WalkerConfig};
    pub use crate::Deadline;
}
