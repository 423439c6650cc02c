use crate::error::Result;
use crate::network::network::Network;
use crate::node::node::{NodeId, NodeKind};

impl Network {
    /// Creates and registers `size` neurons of one kind.
    pub fn add_layer(&mut self, kind: NodeKind, size: usize) -> Result<Vec<NodeId>> {
        let mut layer = Vec::with_capacity(size);
        for _ in 0..size {
            let id = self.create_neuron(kind);
            self.add_neuron(id)?;
            layer.push(id);
        }
        Ok(layer)
    }

    /// Connects every neuron of `from` to every neuron of `to`.
    pub fn connect_layers(&mut self, from: &[NodeId], to: &[NodeId]) -> Result<()> {
        for &source in from {
            for &target in to {
                self.connect(source, target)?;
            }
        }
        Ok(())
    }
}
