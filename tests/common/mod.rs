#![allow(dead_code)]

use neuron_graph::{Network, NetworkConfig, SampleSet, TopologySpec};

pub fn xor_samples() -> SampleSet {
    SampleSet::new(
        vec![vec![0.0, 0.0], vec![0.0, 1.0], vec![1.0, 0.0], vec![1.0, 1.0]],
        vec![vec![0.0], vec![1.0], vec![1.0], vec![0.0]],
    )
    .unwrap()
}

pub fn xor_network(seed: u64) -> Network {
    TopologySpec::new(vec![2, 2, 1]).build(NetworkConfig::seeded(seed)).unwrap()
}

pub const XOR_TEXT: &str = "0 0 0\n0 1 1\n1 0 1\n1 1 0\n";
