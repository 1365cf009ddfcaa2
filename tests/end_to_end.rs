//! End-to-end retrieval and learning scenarios

mod common;

use chrono::Utc;
use common::TestStore;
use neuralrag_core::learner::{Learner, LearnerConfig};
use neuralrag_core::retrieval::{RetrievalConfig, RetrievalEngine};
use neuralrag_core::{IndexedFile, NeuronCreateInput, SynapseCreateInput, SynapseType, VectorIndex};

fn seed_two_file_graph(ts: &TestStore) -> (String, String, String) {
    let n1 = ts
        .create_neuron(NeuronCreateInput {
            content: "fn a() {}".to_string(),
            embedding: vec![1.0, 0.0, 0.0],
            file_path: "A".to_string(),
            start_line: 1,
            end_line: 1,
            ..Default::default()
        })
        .unwrap();
    let n2 = ts
        .create_neuron(NeuronCreateInput {
            content: "fn b() {}".to_string(),
            embedding: vec![0.0, 1.0, 0.0],
            file_path: "A".to_string(),
            start_line: 2,
            end_line: 2,
            ..Default::default()
        })
        .unwrap();
    let n3 = ts
        .create_neuron(NeuronCreateInput {
            content: "fn c() {}".to_string(),
            embedding: vec![0.9, 0.1, 0.0],
            file_path: "B".to_string(),
            start_line: 1,
            end_line: 1,
            ..Default::default()
        })
        .unwrap();
    ts.create_synapse(SynapseCreateInput::new(&n1.id, &n3.id, SynapseType::Imports, 0.8))
        .unwrap();
    (n1.id, n2.id, n3.id)
}

/// Scenario 1: two-file graph, default config, entry_count = 1.
#[test]
fn scenario_two_file_graph() {
    let ts = TestStore::new();
    let (n1, _n2, n3) = seed_two_file_graph(&ts);

    let mut index = VectorIndex::new();
    let engine = RetrievalEngine::new(LearnerConfig::default());
    let config = RetrievalConfig {
        entry_count: 1,
        ..Default::default()
    };

    let result = engine
        .query(&ts, &mut index, "entry point", &[1.0, 0.0, 0.0], &config, None)
        .unwrap();

    assert_eq!(result.results.len(), 2);
    assert_eq!(result.results[0].neuron.id, n1);
    assert!((result.results[0].score - 1.0).abs() < 1e-6);
    assert_eq!(result.results[0].depth, 0);
    assert_eq!(result.results[1].neuron.id, n3);
    assert!((result.results[1].score - 0.56).abs() < 1e-4);
    assert_eq!(result.results[1].depth, 1);
}

/// Scenario 2: same graph, `min_activation = 0.6` — only the entry survives.
#[test]
fn scenario_decay_cutoff() {
    let ts = TestStore::new();
    let (n1, _n2, _n3) = seed_two_file_graph(&ts);

    let mut index = VectorIndex::new();
    let engine = RetrievalEngine::new(LearnerConfig::default());
    let config = RetrievalConfig {
        entry_count: 1,
        min_activation: 0.6,
        ..Default::default()
    };

    let result = engine
        .query(&ts, &mut index, "entry point", &[1.0, 0.0, 0.0], &config, None)
        .unwrap();

    assert_eq!(result.results.len(), 1);
    assert_eq!(result.results[0].neuron.id, n1);
}

/// Scenario 3: co-activation synthesis then 15x repetition saturates at 1.0.
#[test]
fn scenario_co_activation_saturation() {
    let ts = TestStore::new();
    let (n1, _n2, n3) = seed_two_file_graph(&ts);

    let mut index = VectorIndex::new();
    let engine = RetrievalEngine::new(LearnerConfig::default());
    let config = RetrievalConfig {
        entry_count: 1,
        ..Default::default()
    };

    engine
        .query(&ts, &mut index, "q", &[1.0, 0.0, 0.0], &config, None)
        .unwrap();

    let forward = ts.get_outgoing(&n1).unwrap();
    let co = forward.iter().find(|s| s.synapse_type == "co_activation").unwrap();
    assert!((co.weight - 0.3).abs() < 1e-6);
    let backward = ts.get_outgoing(&n3).unwrap();
    let co_back = backward.iter().find(|s| s.synapse_type == "co_activation").unwrap();
    assert!((co_back.weight - 0.3).abs() < 1e-6);

    for _ in 0..14 {
        index.invalidate();
        engine
            .query(&ts, &mut index, "q", &[1.0, 0.0, 0.0], &config, None)
            .unwrap();
    }

    let forward = ts.get_outgoing(&n1).unwrap();
    let co = forward.iter().find(|s| s.synapse_type == "co_activation").unwrap();
    assert!((co.weight - 1.0).abs() < 1e-6);
    let backward = ts.get_outgoing(&n3).unwrap();
    let co_back = backward.iter().find(|s| s.synapse_type == "co_activation").unwrap();
    assert!((co_back.weight - 1.0).abs() < 1e-6);
}

/// Scenario 4: reindexing file A cascades away its synapses.
#[test]
fn scenario_cascade_on_reindex() {
    let ts = TestStore::new();
    let (n1, _n2, n3) = seed_two_file_graph(&ts);
    assert!(!ts.get_connected(&n3).unwrap().is_empty());

    let deleted = ts.delete_neurons_by_file("A").unwrap();
    assert_eq!(deleted, 2);

    let fresh = ts
        .create_neuron(NeuronCreateInput {
            content: "fn replacement() {}".to_string(),
            file_path: "A".to_string(),
            start_line: 1,
            end_line: 1,
            ..Default::default()
        })
        .unwrap();
    ts.upsert_indexed_file(IndexedFile {
        path: "A".to_string(),
        language: "rust".to_string(),
        neuron_count: 1,
        last_indexed: Utc::now(),
        content_hash: "deadbeef".to_string(),
    })
    .unwrap();

    assert!(ts.get_neuron(&n1).is_err());
    assert!(ts.get_connected(&n3).unwrap().is_empty());

    let stats = ts.stats().unwrap();
    assert_eq!(stats.neuron_count, 2); // fresh + n3
    assert_eq!(stats.synapse_count, 0);
    let _ = fresh;
}

/// Scenario 5: calling `create_synapse` twice with the same key is a
/// conflict, not an upsert — the original weight survives.
#[test]
fn scenario_duplicate_synapse_idempotency() {
    let ts = TestStore::new();
    let (n1, _n2, n3) = seed_two_file_graph(&ts);

    let result = ts.create_synapse(SynapseCreateInput::new(&n1, &n3, SynapseType::Imports, 0.5));
    assert!(result.is_err());

    let outgoing = ts.get_outgoing(&n1).unwrap();
    let imports: Vec<_> = outgoing.iter().filter(|s| s.synapse_type == "imports").collect();
    assert_eq!(imports.len(), 1);
    assert!((imports[0].weight - 0.8).abs() < 1e-6);
}

/// Scenario 6: a co-activation edge older than `days_old` decays to 0, then
/// prune removes it. A freshly created edge already satisfies "older than
/// 0 days", so `days_old = 0` exercises the same mechanism as the
/// documented "10 days old, days_old = 7" case without needing to fake the
/// system clock.
#[test]
fn scenario_decay_job() {
    let ts = TestStore::new();
    let n1 = ts
        .create_neuron(NeuronCreateInput {
            content: "a".to_string(),
            file_path: "A".to_string(),
            start_line: 1,
            end_line: 1,
            ..Default::default()
        })
        .unwrap();
    let n2 = ts
        .create_neuron(NeuronCreateInput {
            content: "b".to_string(),
            file_path: "A".to_string(),
            start_line: 2,
            end_line: 2,
            ..Default::default()
        })
        .unwrap();

    let learner = Learner::new(LearnerConfig::default());
    learner.observe_co_activation(&ts, &n1.id, &n2.id).unwrap();
    assert!((ts.get_outgoing(&n1.id).unwrap()[0].weight - 0.3).abs() < 1e-6);

    let mutated = learner.decay(&ts, 0, 0.05, None).unwrap();
    assert_eq!(mutated, 1);
    assert!((ts.get_outgoing(&n1.id).unwrap()[0].weight - 0.25).abs() < 1e-6);

    // Six more passes bring 0.3 down to 0 in steps of 0.05.
    for _ in 0..5 {
        learner.decay(&ts, 0, 0.05, None).unwrap();
    }
    assert_eq!(ts.get_outgoing(&n1.id).unwrap()[0].weight, 0.0);

    let pruned = learner.prune(&ts, 0.0).unwrap();
    assert_eq!(pruned, 1);
    assert!(ts.get_outgoing(&n1.id).unwrap().is_empty());
}
