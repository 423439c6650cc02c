use neuron_graph::{Network, NetworkConfig, NodeKind, SampleSet, TrainConfig, TrainMode};

fn main() -> neuron_graph::Result<()> {
    tracing_subscriber::fmt().with_max_level(tracing::Level::INFO).init();

    // Wire 2 inputs -> 2 hidden -> 1 output by hand.
    let mut network = Network::new(NetworkConfig::default())?;
    let in1 = network.create_neuron(NodeKind::Input);
    let in2 = network.create_neuron(NodeKind::Input);
    let hidden1 = network.create_neuron(NodeKind::Hidden);
    let hidden2 = network.create_neuron(NodeKind::Hidden);
    let out = network.create_neuron(NodeKind::Output);

    for (from, to) in [(in1, hidden1), (in1, hidden2), (in2, hidden1), (in2, hidden2), (hidden1, out), (hidden2, out)] {
        network.connect(from, to)?;
    }
    for id in [in1, in2, hidden1, hidden2, out] {
        network.add_neuron(id)?;
    }

    let samples = SampleSet::new(
        vec![vec![1.0, 0.0], vec![1.0, 1.0], vec![0.0, 1.0], vec![0.0, 0.0]],
        vec![vec![1.0], vec![0.0], vec![1.0], vec![0.0]],
    )?;

    let config = TrainConfig::new(1.0, 20_000, TrainMode::Online);
    let report = network.train(&samples, &config)?;
    println!(
        "train error {:.6} after {} epochs ({} sessions, stopped: {:?})",
        report.train_error, report.epochs, report.sessions, report.stop_reason
    );

    for i in 0..samples.len() {
        let input = samples.input(i);
        println!("Input: {:?} -> Output: {:.4}", input, network.test(input)?[0]);
    }
    Ok(())
}
