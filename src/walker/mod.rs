//! Bounded best-first spreading activation over the synapse graph
//!
//! Given a set of entry neurons with seed scores, walks outgoing synapses,
//! decaying the score geometrically at each hop, until the accepted set
//! reaches a cap or the frontier runs dry. Visited-with-best-score
//! bookkeeping makes the walk safe over cyclic graphs without an explicit
//! depth limit.

use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashMap};

use crate::graph::Neuron;
use crate::storage::{Store, StoreError};
use crate::Deadline;

/// Tunables for a single walk.
#[derive(Debug, Clone)]
pub struct WalkerConfig {
    pub max_neurons: usize,
    pub decay_factor: f32,
    pub min_activation: f32,
}

impl Default for WalkerConfig {
    fn default() -> Self {
        Self {
            max_neurons: 15,
            decay_factor: 0.7,
            min_activation: 0.1,
        }
    }
}

/// A seed for the walk: a neuron id and its initial activation score.
#[derive(Debug, Clone)]
pub struct Entry {
    pub neuron_id: String,
    pub score: f32,
}

/// One accepted node in the walk's result set.
#[derive(Debug, Clone)]
pub struct ActivationResult {
    pub neuron: Neuron,
    pub score: f32,
    pub depth: u32,
    /// Neuron ids from the entry that discovered this node to this node,
    /// inclusive of both endpoints.
    pub path: Vec<String>,
}

/// Candidate queued for expansion, ordered by score (max-heap), then by
/// shallower depth, then by neuron id — giving deterministic pop order for
/// ties, which in turn gives deterministic accepted-set ordering.
#[derive(Debug, Clone)]
struct Candidate {
    neuron_id: String,
    score: f32,
    depth: u32,
    path: Vec<String>,
}

impl PartialEq for Candidate {
    fn eq(&self, other: &Self) -> bool {
        self.score == other.score && self.depth == other.depth && self.neuron_id == other.neuron_id
    }
}
impl Eq for Candidate {}

impl PartialOrd for Candidate {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Candidate {
    fn cmp(&self, other: &Self) -> Ordering {
        self.score
            .partial_cmp(&other.score)
            .unwrap_or(Ordering::Equal)
            .then_with(|| other.depth.cmp(&self.depth))
            .then_with(|| other.neuron_id.cmp(&self.neuron_id))
    }
}

#[non_exhaustive]
#[derive(Debug, thiserror::Error)]
pub enum WalkerError {
    #[error("store error during walk: {0}")]
    Store(#[from] StoreError),
}

/// Stateless best-first walker: all state lives in the call to `walk`,
/// matching the Store's ownership of persistent graph data.
pub struct GraphWalker;

impl GraphWalker {
    pub fn new() -> Self {
        Self
    }

    /// Run a bounded best-first walk from `entries`, reading synapses and
    /// neurons from `store`. Stops early at `deadline` if given, returning
    /// whatever was accepted so far (a partial result is not an error).
    pub fn walk(
        &self,
        store: &Store,
        entries: &[Entry],
        config: &WalkerConfig,
        deadline: Option<&Deadline>,
    ) -> Result<Vec<ActivationResult>, WalkerError> {
        let mut queue: BinaryHeap<Candidate> = BinaryHeap::new();
        let mut best_score: HashMap<String, f32> = HashMap::new();
        let mut accepted: Vec<ActivationResult> = Vec::new();

        for entry in entries {
            let clamped = entry.score.clamp(f32::EPSILON, 1.0);
            queue.push(Candidate {
                neuron_id: entry.neuron_id.clone(),
                score: clamped,
                depth: 0,
                path: vec![entry.neuron_id.clone()],
            });
        }

        while let Some(candidate) = queue.pop() {
            if accepted.len() >= config.max_neurons {
                break;
            }
            if let Some(deadline) = deadline {
                if deadline.is_expired() {
                    break;
                }
            }

            if let Some(&existing) = best_score.get(&candidate.neuron_id) {
                if existing >= candidate.score {
                    continue;
                }
            }
            best_score.insert(candidate.neuron_id.clone(), candidate.score);

            let neuron = match store.get_neuron(&candidate.neuron_id) {
                Ok(n) => n,
                Err(StoreError::NotFound(_)) => continue,
                Err(e) => return Err(e.into()),
            };

            accepted.push(ActivationResult {
                neuron,
                score: candidate.score,
                depth: candidate.depth,
                path: candidate.path.clone(),
            });

            if accepted.len() >= config.max_neurons {
                break;
            }

            let outgoing = store.get_outgoing(&candidate.neuron_id)?;
            for synapse in outgoing {
                let propagated = candidate.score * synapse.weight * config.decay_factor;
                if propagated < config.min_activation {
                    continue;
                }
                if let Some(&existing) = best_score.get(&synapse.target_id) {
                    if existing >= propagated {
                        continue;
                    }
                }
                let mut path = candidate.path.clone();
                path.push(synapse.target_id.clone());
                queue.push(Candidate {
                    neuron_id: synapse.target_id,
                    score: propagated,
                    depth: candidate.depth + 1,
                    path,
                });
            }
        }

        accepted.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(Ordering::Equal)
                .then_with(|| a.depth.cmp(&b.depth))
                .then_with(|| a.neuron.id.cmp(&b.neuron.id))
        });

        Ok(accepted)
    }
}

impl Default for GraphWalker {
    fn default() -> Self {
        Self::new()
    }
}

/// Mean `depth` over accepted results; `0.0` if none.
pub fn avg_activation_depth(results: &[ActivationResult]) -> f64 {
    if results.is_empty() {
        return 0.0;
    }
    let total: u64 = results.iter().map(|r| r.depth as u64).sum();
    total as f64 / results.len() as f64
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{NeuronCreateInput, SynapseCreateInput, SynapseType};

    fn seed_two_file_graph() -> (Store, String, String, String) {
        let store = Store::new(None).unwrap();
        let n1 = store
            .create_neuron(NeuronCreateInput {
                content: "n1".to_string(),
                embedding: vec![1.0, 0.0, 0.0],
                file_path: "A".to_string(),
                start_line: 1,
                end_line: 1,
                ..Default::default()
            })
            .unwrap();
        let n2 = store
            .create_neuron(NeuronCreateInput {
                content: "n2".to_string(),
                embedding: vec![0.0, 1.0, 0.0],
                file_path: "A".to_string(),
                start_line: 2,
                end_line: 2,
                ..Default::default()
            })
            .unwrap();
        let n3 = store
            .create_neuron(NeuronCreateInput {
                content: "n3".to_string(),
                embedding: vec![0.9, 0.1, 0.0],
                file_path: "B".to_string(),
                start_line: 1,
                end_line: 1,
                ..Default::default()
            })
            .unwrap();
        store
            .create_synapse(SynapseCreateInput::new(&n1.id, &n3.id, SynapseType::Imports, 0.8))
            .unwrap();
        (store, n1.id, n2.id, n3.id)
    }

    #[test]
    fn test_two_file_graph_scenario() {
        let (store, n1, _n2, n3) = seed_two_file_graph();
        let walker = GraphWalker::new();
        let config = WalkerConfig::default();
        let entries = vec![Entry {
            neuron_id: n1.clone(),
            score: 1.0,
        }];

        let results = walker.walk(&store, &entries, &config, None).unwrap();
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].neuron.id, n1);
        assert!((results[0].score - 1.0).abs() < 1e-6);
        assert_eq!(results[0].depth, 0);
        assert_eq!(results[1].neuron.id, n3);
        assert!((results[1].score - 0.56).abs() < 1e-4);
        assert_eq!(results[1].depth, 1);
    }

    #[test]
    fn test_decay_cutoff_excludes_weak_hop() {
        let (store, n1, _n2, _n3) = seed_two_file_graph();
        let walker = GraphWalker::new();
        let config = WalkerConfig {
            min_activation: 0.6,
            ..Default::default()
        };
        let entries = vec![Entry {
            neuron_id: n1.clone(),
            score: 1.0,
        }];

        let results = walker.walk(&store, &entries, &config, None).unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].neuron.id, n1);
    }

    #[test]
    fn test_result_capped_at_max_neurons() {
        let (store, n1, _n2, _n3) = seed_two_file_graph();
        let walker = GraphWalker::new();
        let config = WalkerConfig {
            max_neurons: 1,
            ..Default::default()
        };
        let entries = vec![Entry {
            neuron_id: n1,
            score: 1.0,
        }];

        let results = walker.walk(&store, &entries, &config, None).unwrap();
        assert_eq!(results.len(), 1);
    }

    #[test]
    fn test_decreasing_decay_factor_never_increases_score() {
        let (store, n1, _n2, _n3) = seed_two_file_graph();
        let walker = GraphWalker::new();
        let entries = vec![Entry {
            neuron_id: n1,
            score: 1.0,
        }];

        let high = walker
            .walk(&store, &entries, &WalkerConfig { decay_factor: 0.9, ..Default::default() }, None)
            .unwrap();
        let low = walker
            .walk(&store, &entries, &WalkerConfig { decay_factor: 0.3, ..Default::default() }, None)
            .unwrap();

        for low_result in &low {
            let matching_high = high.iter().find(|r| r.neuron.id == low_result.neuron.id);
            if let Some(high_result) = matching_high {
                assert!(low_result.score <= high_result.score + 1e-6);
            }
        }
    }

    #[test]
    fn test_deterministic_output_for_same_inputs() {
        let (store, n1, _n2, _n3) = seed_two_file_graph();
        let walker = GraphWalker::new();
        let config = WalkerConfig::default();
        let entries = vec![Entry {
            neuron_id: n1,
            score: 1.0,
        }];

        let first: Vec<String> = walker
            .walk(&store, &entries, &config, None)
            .unwrap()
            .into_iter()
            .map(|r| r.neuron.id)
            .collect();
        let second: Vec<String> = walker
            .walk(&store, &entries, &config, None)
            .unwrap()
            .into_iter()
            .map(|r| r.neuron.id)
            .collect();
        assert_eq!(first, second);
    }
}
