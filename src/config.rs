use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::network::network::Network;
use crate::network::network_config::NetworkConfig;
use crate::network::topology::TopologySpec;
use crate::optim::rprop::RpropConfig;
use crate::train::train_config::TrainConfig;

/// Everything needed to build and train a network, as stored in a JSON file.
///
/// Every section is optional in the file; missing ones fall back to their
/// defaults. `rprop` switches the whole network to Rprop when present.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ExperimentConfig {
    pub topology: TopologySpec,
    pub network: NetworkConfig,
    pub training: TrainConfig,
    pub rprop: Option<RpropConfig>,
}

impl ExperimentConfig {
    /// Builds the configured topology and applies the update rule.
    pub fn build_network(&self) -> Result<Network> {
        let mut network = self.topology.build(self.network.clone())?;
        if let Some(rprop) = self.rprop {
            network.enable_rprop(rprop)?;
        }
        Ok(network)
    }

    /// Serializes the configuration to a pretty-printed JSON file.
    pub fn save_json(&self, path: &str) -> Result<()> {
        let file = std::fs::File::create(path)?;
        let writer = std::io::BufWriter::new(file);
        serde_json::to_writer_pretty(writer, self)?;
        Ok(())
    }

    /// Deserializes a configuration previously written by `save_json`, or
    /// written by hand.
    pub fn load_json(path: &str) -> Result<ExperimentConfig> {
        let file = std::fs::File::open(path)?;
        let reader = std::io::BufReader::new(file);
        let config: ExperimentConfig = serde_json::from_reader(reader)?;
        config.network.weight_bounds.validate()?;
        config.topology.validate()?;
        config.training.validate()?;
        Ok(config)
    }
}
