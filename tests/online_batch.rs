mod common;

use common::xor_network;
use neuron_graph::{RestartPolicy, SampleSet, TrainConfig, TrainMode};

fn single_epoch(mode: TrainMode) -> TrainConfig {
    TrainConfig {
        restart: RestartPolicy::disabled(),
        ..TrainConfig::new(1.0, 1, mode)
    }
}

#[test]
fn batch_equals_online_on_one_sample() {
    let samples = SampleSet::new(vec![vec![1.0, 0.0]], vec![vec![1.0]]).unwrap();

    let mut online = xor_network(99);
    let mut batch = xor_network(99);
    assert_eq!(online.weights_snapshot(), batch.weights_snapshot());

    let online_report = online.train(&samples, &single_epoch(TrainMode::Online)).unwrap();
    let batch_report = batch.train(&samples, &single_epoch(TrainMode::Batch)).unwrap();

    assert_eq!(online_report.epochs, 1);
    assert_eq!(online_report.train_error, batch_report.train_error);
    assert_eq!(online.weights_snapshot(), batch.weights_snapshot());
}

#[test]
fn batch_and_online_differ_on_several_samples() {
    let samples = common::xor_samples();
    let config = |mode| TrainConfig {
        shuffle_each_epoch: false,
        ..single_epoch(mode)
    };

    let mut online = xor_network(5);
    let mut batch = xor_network(5);
    online.train(&samples, &config(TrainMode::Online)).unwrap();
    batch.train(&samples, &config(TrainMode::Batch)).unwrap();
    assert_ne!(online.weights_snapshot(), batch.weights_snapshot());
}

#[test]
fn batch_mode_descends_on_xor() {
    let (tx, rx) = std::sync::mpsc::channel();
    let config = TrainConfig {
        epsilon: 0.0,
        max_epochs: 2_000,
        progress_tx: Some(tx),
        ..single_epoch(TrainMode::Batch)
    };

    let mut network = xor_network(42);
    let report = network.train(&common::xor_samples(), &config).unwrap();
    drop(config);

    let errors: Vec<f64> = rx.iter().map(|stats| stats.train_error).collect();
    assert_eq!(errors.len(), report.epochs);
    // The first epoch measures the fresh weights; nothing stalls at a zero mean error.
    assert!(report.epochs > 100, "stopped after {} epochs", report.epochs);
    assert!(errors[errors.len() - 1] < errors[0], "{} -> {}", errors[0], errors[errors.len() - 1]);
}
