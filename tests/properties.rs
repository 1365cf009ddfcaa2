//! Property and invariant tests that don't fit a single end-to-end scenario

mod common;

use common::TestStore;
use neuralrag_core::{NeuronCreateInput, Store, SynapseCreateInput, SynapseType};

#[test]
fn reopening_an_existing_store_applies_no_migrations_twice() {
    let ts = TestStore::new();
    ts.create_neuron(NeuronCreateInput {
        content: "fn f() {}".to_string(),
        file_path: "a.rs".to_string(),
        start_line: 1,
        end_line: 1,
        ..Default::default()
    })
    .unwrap();

    let path = ts.path().clone();
    drop(ts);

    let reopened = Store::open_at(path).unwrap();
    assert_eq!(reopened.get_all_neurons().unwrap().len(), 1);
}

#[test]
fn reindexing_with_identical_chunk_count_yields_same_neuron_count() {
    let ts = TestStore::new();
    let inputs = |path: &str| {
        vec![
            NeuronCreateInput {
                content: "fn one() {}".to_string(),
                file_path: path.to_string(),
                start_line: 1,
                end_line: 1,
                ..Default::default()
            },
            NeuronCreateInput {
                content: "fn two() {}".to_string(),
                file_path: path.to_string(),
                start_line: 3,
                end_line: 5,
                ..Default::default()
            },
        ]
    };

    let first_pass = ts.create_neurons_batch(inputs("src/lib.rs")).unwrap();
    assert_eq!(first_pass.len(), 2);

    ts.delete_neurons_by_file("src/lib.rs").unwrap();
    let second_pass = ts.create_neurons_batch(inputs("src/lib.rs")).unwrap();

    assert_eq!(second_pass.len(), first_pass.len());
    assert_ne!(second_pass[0].id, first_pass[0].id);
}

#[test]
fn synapse_endpoints_are_never_equal() {
    let ts = TestStore::new();
    let n1 = ts
        .create_neuron(NeuronCreateInput {
            content: "a".to_string(),
            file_path: "a.rs".to_string(),
            start_line: 1,
            end_line: 1,
            ..Default::default()
        })
        .unwrap();

    let result = ts.create_synapse(SynapseCreateInput::new(&n1.id, &n1.id, SynapseType::Proximity, 0.5));
    assert!(result.is_err());
}

#[test]
fn out_of_range_weight_is_rejected() {
    let ts = TestStore::new();
    let n1 = ts
        .create_neuron(NeuronCreateInput {
            content: "a".to_string(),
            file_path: "a.rs".to_string(),
            start_line: 1,
            end_line: 1,
            ..Default::default()
        })
        .unwrap();
    let n2 = ts
        .create_neuron(NeuronCreateInput {
            content: "b".to_string(),
            file_path: "a.rs".to_string(),
            start_line: 2,
            end_line: 2,
            ..Default::default()
        })
        .unwrap();

    let result = ts.create_synapse(SynapseCreateInput::new(&n1.id, &n2.id, SynapseType::Proximity, 1.5));
    assert!(result.is_err());
}

#[test]
fn activation_count_is_non_decreasing() {
    let ts = TestStore::new();
    let n1 = ts
        .create_neuron(NeuronCreateInput {
            content: "a".to_string(),
            file_path: "a.rs".to_string(),
            start_line: 1,
            end_line: 1,
            ..Default::default()
        })
        .unwrap();

    assert_eq!(ts.get_neuron(&n1.id).unwrap().activation_count, 0);
    ts.increment_activation(&n1.id).unwrap();
    ts.increment_activation(&n1.id).unwrap();
    assert_eq!(ts.get_neuron(&n1.id).unwrap().activation_count, 2);
}
