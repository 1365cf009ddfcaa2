//! Retrieval Engine
//!
//! Composes the Vector Index (entry selection) with the Graph Walker
//! (expansion), performs activation bookkeeping and co-activation edge
//! synthesis, and logs the query. This is the library's main entry point;
//! Store, VectorIndex, GraphWalker and Learner are otherwise independent
//! of each other.

use tracing::warn;

use crate::learner::{Learner, LearnerConfig};
use crate::search::VectorIndex;
use crate::storage::{Store, StoreError};
use crate::walker::{avg_activation_depth, ActivationResult, Entry, GraphWalker, WalkerConfig};
use crate::Deadline;

#[derive(Debug, Clone)]
pub struct RetrievalConfig {
    pub max_neurons: usize,
    pub entry_count: usize,
    pub decay_factor: f32,
    pub min_activation: f32,
    /// Optional floor below which vector-search entries are discarded
    /// before seeding the walk.
    pub similarity_floor: Option<f32>,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            max_neurons: 15,
            entry_count: 3,
            decay_factor: 0.7,
            min_activation: 0.1,
            similarity_floor: None,
        }
    }
}

/// Result of a single query: the accepted, ranked neurons plus the id this
/// query was logged under (for a later `report_used` call).
#[derive(Debug, Clone)]
pub struct QueryResult {
    pub query_id: String,
    pub results: Vec<ActivationResult>,
    /// `true` if a deadline cut the walk short, so `results` may be
    /// smaller than `max_neurons` even though more neurons were reachable.
    pub partial: bool,
    pub avg_activation_depth: f64,
}

#[non_exhaustive]
#[derive(Debug, thiserror::Error)]
pub enum RetrievalError {
    #[error("store error: {0}")]
    Store(#[from] StoreError),
    #[error("vector search error: {0}")]
    VectorSearch(#[from] crate::search::VectorSearchError),
    #[error("graph walk error: {0}")]
    Walk(#[from] crate::walker::WalkerError),
}

pub struct RetrievalEngine {
    learner: Learner,
}

impl RetrievalEngine {
    pub fn new(learner_config: LearnerConfig) -> Self {
        Self {
            learner: Learner::new(learner_config),
        }
    }

    /// Run one retrieval: select entries by vector similarity, expand via
    /// spreading activation, bump activation counts, synthesize
    /// co-activation edges among the accepted set, and log the query.
    pub fn query(
        &self,
        store: &Store,
        vector_index: &mut VectorIndex,
        text: &str,
        query_embedding: &[f32],
        config: &RetrievalConfig,
        deadline: Option<&Deadline>,
    ) -> Result<QueryResult, RetrievalError> {
        let mut candidates = vector_index.top_k(store, query_embedding, config.entry_count)?;
        if let Some(floor) = config.similarity_floor {
            candidates.retain(|(_, sim)| *sim >= floor);
        }

        let entries: Vec<Entry> = candidates
            .into_iter()
            .map(|(neuron_id, sim)| Entry {
                neuron_id,
                score: sim.clamp(f32::EPSILON, 1.0),
            })
            .collect();

        let walker_config = WalkerConfig {
            max_neurons: config.max_neurons,
            decay_factor: config.decay_factor,
            min_activation: config.min_activation,
        };

        let walker = GraphWalker::new();
        let results = walker.walk(store, &entries, &walker_config, deadline)?;
        let partial = deadline.is_some_and(|d| d.is_expired());

        let accepted_ids: Vec<String> = results.iter().map(|r| r.neuron.id.clone()).collect();

        for id in &accepted_ids {
            if let Err(e) = store.increment_activation(id) {
                warn!(neuron_id = %id, error = %e, "failed to record activation");
            }
        }

        self.learner.observe_co_activation_set(store, &accepted_ids);

        let query_id = store.log_query(text, &accepted_ids, None)?;

        Ok(QueryResult {
            query_id,
            avg_activation_depth: avg_activation_depth(&results),
            results,
            partial,
        })
    }

    /// Record which of a prior query's accepted neurons the caller actually
    /// used, and strengthen the co-activation edges among them.
    pub fn report_used(
        &self,
        store: &Store,
        query_id: &str,
        used_ids: &[String],
    ) -> Result<(), RetrievalError> {
        store.report_used(query_id, used_ids)?;
        self.learner.reinforce_use_set(store, used_ids);
        Ok(())
    }
}
