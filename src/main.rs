use std::fs::File;
use std::io::{self, BufReader};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use neuron_graph::{ExperimentConfig, RestartPolicy, RpropConfig, TopologySpec, TrainMode};

/// Train a layered network of message-passing neurons on a sample file and
/// optionally answer inference queries with it.
///
/// Samples are whitespace-separated numbers: per record, one value per input
/// neuron followed by one value per output neuron.
#[derive(Debug, Parser)]
#[command(name = "neuron-graph", version, about)]
struct Cli {
    /// Training samples.
    data: PathBuf,

    /// Inference records, answered one line each on stdout.
    #[arg(long)]
    query: Option<PathBuf>,

    /// JSON experiment configuration; flags below override it.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Layer sizes, input first and output last.
    #[arg(long, value_delimiter = ',')]
    layers: Option<Vec<usize>>,

    #[arg(long)]
    learning_rate: Option<f64>,

    #[arg(long)]
    regularization: Option<f64>,

    #[arg(long, allow_hyphen_values = true)]
    weight_lower: Option<f64>,

    #[arg(long, allow_hyphen_values = true)]
    weight_upper: Option<f64>,

    #[arg(long)]
    seed: Option<u64>,

    /// Share of the samples used for training; the rest is the test split.
    #[arg(long)]
    train_ratio: Option<f64>,

    #[arg(long)]
    max_epochs: Option<usize>,

    #[arg(long)]
    epsilon: Option<f64>,

    /// Consecutive test-error increases that stop a session.
    #[arg(long)]
    test_window: Option<usize>,

    /// Restart sessions whose final train error stays above this threshold.
    #[arg(long)]
    restart_threshold: Option<f64>,

    #[arg(long)]
    max_restarts: Option<usize>,

    /// Never restart stuck sessions.
    #[arg(long, conflicts_with_all = ["restart_threshold", "max_restarts"])]
    no_restart: bool,

    /// One backward wave per epoch instead of one per sample.
    #[arg(long)]
    batch: bool,

    /// Use Rprop updates with default parameters unless the config sets them.
    #[arg(long)]
    rprop: bool,

    /// Separator between output values.
    #[arg(long, default_value = " ")]
    delimiter: String,
}

impl Cli {
    fn experiment(&self) -> Result<ExperimentConfig> {
        let mut config = match &self.config {
            Some(path) => {
                let path = path.to_str().context("config path is not valid UTF-8")?;
                ExperimentConfig::load_json(path).with_context(|| format!("loading {path}"))?
            }
            None => ExperimentConfig::default(),
        };

        if let Some(layers) = &self.layers {
            config.topology = TopologySpec::new(layers.clone());
        }
        let params = &mut config.network.params;
        if let Some(lr) = self.learning_rate {
            params.learning_rate = lr;
        }
        if let Some(reg) = self.regularization {
            params.regularization = reg;
        }
        if self.weight_lower.is_some() || self.weight_upper.is_some() {
            let current = config.network.weight_bounds;
            config.network.weight_bounds = neuron_graph::WeightBounds::new(
                self.weight_lower.unwrap_or(current.lower()),
                self.weight_upper.unwrap_or(current.upper()),
            )?;
        }
        if self.seed.is_some() {
            config.network.seed = self.seed;
        }

        let training = &mut config.training;
        if let Some(ratio) = self.train_ratio {
            training.train_ratio = ratio;
        }
        if let Some(max_epochs) = self.max_epochs {
            training.max_epochs = max_epochs;
        }
        if let Some(epsilon) = self.epsilon {
            training.epsilon = epsilon;
        }
        if let Some(window) = self.test_window {
            training.test_increase_window = window;
        }
        if let Some(threshold) = self.restart_threshold {
            training.restart.threshold = threshold;
        }
        if let Some(max_restarts) = self.max_restarts {
            training.restart.max_restarts = max_restarts;
        }
        if self.no_restart {
            training.restart = RestartPolicy::disabled();
        }
        if self.batch {
            training.mode = TrainMode::Batch;
        }
        if self.rprop && config.rprop.is_none() {
            config.rprop = Some(RpropConfig::default());
        }
        Ok(config)
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();
    let config = cli.experiment()?;
    let mut network = config.build_network()?;

    let data = File::open(&cli.data).with_context(|| format!("opening {}", cli.data.display()))?;
    let report = network
        .train_from_reader(BufReader::new(data), &config.training)
        .context("training failed")?;
    info!(
        train_error = report.train_error,
        test_error = ?report.test_error,
        epochs = report.epochs,
        sessions = report.sessions,
        restarts = report.restarts,
        divergence_resets = report.divergence_resets,
        stop_reason = ?report.stop_reason,
        "training done"
    );

    if let Some(query) = &cli.query {
        let file = File::open(query).with_context(|| format!("opening {}", query.display()))?;
        let stdout = io::stdout();
        let answered = network.test_from_reader(BufReader::new(file), stdout.lock(), &cli.delimiter)?;
        info!(records = answered, "inference done");
    }
    Ok(())
}
