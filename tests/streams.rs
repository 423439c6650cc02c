mod common;

use std::io::Cursor;

use common::{xor_network, XOR_TEXT};
use neuron_graph::data::stream::SampleError;
use neuron_graph::{NetworkError, TrainConfig};

#[test]
fn trains_and_answers_from_text_streams() {
    let mut network = xor_network(42);
    let config = TrainConfig { train_ratio: 1.0, ..TrainConfig::default() };
    let report = network.train_from_reader(Cursor::new(XOR_TEXT), &config).unwrap();
    assert!(report.train_error < 0.05, "report: {report:?}");

    let mut out = Vec::new();
    let answered = network
        .test_from_reader(Cursor::new("0 0\n0 1\n1 0\n1 1\n"), &mut out, " ")
        .unwrap();
    assert_eq!(answered, 4);

    let values: Vec<f64> = String::from_utf8(out)
        .unwrap()
        .lines()
        .map(|l| l.trim().parse().unwrap())
        .collect();
    let rounded: Vec<f64> = values.iter().map(|v| v.round()).collect();
    assert_eq!(rounded, vec![0.0, 1.0, 1.0, 0.0]);
}

#[test]
fn truncated_training_stream_is_rejected() {
    let mut network = xor_network(1);
    let err = network
        .train_from_reader(Cursor::new("0 0 0\n1 1"), &TrainConfig::default())
        .unwrap_err();
    assert!(matches!(
        err,
        NetworkError::Samples(SampleError::IncompleteRecord { record: 2, expected: 3, found: 2 })
    ));
}

#[test]
fn garbage_token_reports_its_line() {
    let mut network = xor_network(1);
    let err = network
        .test_from_reader(Cursor::new("0 1\n1 x\n"), Vec::new(), " ")
        .unwrap_err();
    assert!(matches!(err, NetworkError::Samples(SampleError::InvalidToken { line: 2, .. })));
}
