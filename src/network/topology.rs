use serde::{Deserialize, Serialize};

use crate::error::{NetworkError, Result};
use crate::network::network::Network;
use crate::network::network_config::NetworkConfig;
use crate::node::node::NodeKind;

/// Layer sizes of a fully connected feed-forward network.
///
/// The first entry is the number of input neurons, the last the number of
/// output neurons; anything in between is a hidden layer. Every neuron of a
/// layer feeds every neuron of the next.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopologySpec {
    pub layers: Vec<usize>,
}

impl Default for TopologySpec {
    fn default() -> Self {
        TopologySpec { layers: vec![2, 2, 1] }
    }
}

impl TopologySpec {
    pub fn new(layers: Vec<usize>) -> TopologySpec {
        TopologySpec { layers }
    }

    pub fn validate(&self) -> Result<()> {
        if self.layers.len() < 2 {
            return Err(NetworkError::InvalidConfig {
                reason: "a topology needs at least an input and an output layer",
            });
        }
        if self.layers.contains(&0) {
            return Err(NetworkError::InvalidConfig { reason: "layers must not be empty" });
        }
        Ok(())
    }

    pub fn build(&self, config: NetworkConfig) -> Result<Network> {
        self.validate()?;
        let mut network = Network::new(config)?;
        let last = self.layers.len() - 1;

        let mut previous = Vec::new();
        for (i, &size) in self.layers.iter().enumerate() {
            let kind = match i {
                0 => NodeKind::Input,
                i if i == last => NodeKind::Output,
                _ => NodeKind::Hidden,
            };
            let layer = network.add_layer(kind, size)?;
            network.connect_layers(&previous, &layer)?;
            previous = layer;
        }
        Ok(network)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_a_fully_connected_stack() {
        let network = TopologySpec::new(vec![3, 4, 2]).build(NetworkConfig::seeded(1)).unwrap();
        assert_eq!(network.input_ids().len(), 3);
        assert_eq!(network.output_ids().len(), 2);
        assert_eq!(network.neurons().count(), 9);

        let hidden: Vec<_> = network.neurons().filter(|n| n.kind() == NodeKind::Hidden).collect();
        assert!(hidden.iter().all(|n| n.input_edges().len() == 3 && n.output_edges().len() == 2));
        for &out in network.output_ids() {
            assert_eq!(network.node(out).unwrap().input_edges().len(), 4);
        }
    }

    #[test]
    fn direct_input_to_output_is_allowed() {
        let network = TopologySpec::new(vec![2, 1]).build(NetworkConfig::seeded(1)).unwrap();
        assert_eq!(network.neurons().count(), 3);
    }

    #[test]
    fn degenerate_shapes_are_rejected() {
        assert!(TopologySpec::new(vec![2]).validate().is_err());
        assert!(TopologySpec::new(vec![2, 0, 1]).validate().is_err());
    }
}
