use std::collections::VecDeque;
use std::io::{BufRead, Write};

use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::data::samples::SampleSet;
use crate::data::stream::{read_inference_records, read_training_samples, write_outputs};
use crate::error::{NetworkError, Result};
use crate::network::network_config::{NetworkConfig, NodeParams, WeightBounds};
use crate::node::node::{Node, NodeId, NodeKind, UpdateTiming};
use crate::optim::rprop::RpropConfig;
use crate::train::loop_fn::train_loop;
use crate::train::report::TrainReport;
use crate::train::train_config::TrainConfig;

/// Every bias and edge weight of a network, indexed like the arena.
#[derive(Debug, Clone, PartialEq)]
pub struct WeightSnapshot {
    entries: Vec<Option<(f64, Vec<f64>)>>,
}

/// A graph of neurons owned by one arena.
///
/// Neurons are created with `create_neuron`, wired with `connect` and
/// registered with `add_neuron`; registration order fixes the order in which
/// input values are fed and output values are read. Edges are index pairs,
/// so no neuron owns another.
#[derive(Debug, Clone)]
pub struct Network {
    nodes: Vec<Node>,
    registered: Vec<bool>,
    inputs: Vec<NodeId>,
    outputs: Vec<NodeId>,
    params: NodeParams,
    weight_bounds: WeightBounds,
    rprop: Option<RpropConfig>,
    rng: StdRng,
}

impl Network {
    pub fn new(config: NetworkConfig) -> Result<Network> {
        config.weight_bounds.validate()?;
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Ok(Network {
            nodes: Vec::new(),
            registered: Vec::new(),
            inputs: Vec::new(),
            outputs: Vec::new(),
            params: config.params,
            weight_bounds: config.weight_bounds,
            rprop: None,
            rng,
        })
    }

    /// Creates an unregistered neuron with a random bias.
    pub fn create_neuron(&mut self, kind: NodeKind) -> NodeId {
        let id = NodeId(self.nodes.len());
        let bias = self.weight_bounds.sample(&mut self.rng);
        let mut node = Node::new(id, kind, self.params, bias);
        if let Some(config) = self.rprop {
            node.enable_rprop(config);
        }
        self.nodes.push(node);
        self.registered.push(false);
        id
    }

    /// Registers a neuron. Input and output neurons are appended to the
    /// ordered input and output lists.
    pub fn add_neuron(&mut self, id: NodeId) -> Result<()> {
        let kind = self.node(id)?.kind();
        if self.registered[id.0] {
            return Err(NetworkError::DuplicateNeuron { id });
        }
        self.registered[id.0] = true;
        match kind {
            NodeKind::Input => self.inputs.push(id),
            NodeKind::Output => self.outputs.push(id),
            NodeKind::Hidden => {}
        }
        Ok(())
    }

    /// Adds the edge `from -> to` with a weight drawn from the current bounds.
    pub fn connect(&mut self, from: NodeId, to: NodeId) -> Result<()> {
        let from_kind = self.node(from)?.kind();
        let to_kind = self.node(to)?.kind();
        if from == to {
            return Err(NetworkError::InvalidEdge { from, to, reason: "self-loops are not allowed" });
        }
        if from_kind == NodeKind::Output {
            return Err(NetworkError::InvalidEdge {
                from,
                to,
                reason: "output neurons have no outgoing edges",
            });
        }
        if to_kind == NodeKind::Input {
            return Err(NetworkError::InvalidEdge {
                from,
                to,
                reason: "input neurons accept no incoming edges",
            });
        }
        let weight = self.weight_bounds.sample(&mut self.rng);
        self.nodes[to.0].add_input_edge(from, weight)?;
        self.nodes[from.0].add_output_edge(to)
    }

    pub fn node(&self, id: NodeId) -> Result<&Node> {
        self.nodes.get(id.0).ok_or(NetworkError::UnknownNeuron { id })
    }

    pub fn node_mut(&mut self, id: NodeId) -> Result<&mut Node> {
        self.nodes.get_mut(id.0).ok_or(NetworkError::UnknownNeuron { id })
    }

    /// Registered neurons, in arena order.
    pub fn neurons(&self) -> impl Iterator<Item = &Node> {
        self.nodes
            .iter()
            .zip(&self.registered)
            .filter_map(|(node, &registered)| registered.then_some(node))
    }

    pub fn is_registered(&self, id: NodeId) -> bool {
        self.registered.get(id.0).copied().unwrap_or(false)
    }

    pub fn input_ids(&self) -> &[NodeId] {
        &self.inputs
    }

    pub fn output_ids(&self) -> &[NodeId] {
        &self.outputs
    }

    pub fn params(&self) -> NodeParams {
        self.params
    }

    /// Applies `params` to every existing and future neuron.
    pub fn set_params(&mut self, params: NodeParams) {
        self.params = params;
        for node in &mut self.nodes {
            node.set_params(params);
        }
    }

    pub fn set_learning_rate(&mut self, learning_rate: f64) {
        self.set_params(NodeParams { learning_rate, ..self.params });
    }

    pub fn set_regularization(&mut self, regularization: f64) {
        self.set_params(NodeParams { regularization, ..self.params });
    }

    pub fn weight_bounds(&self) -> WeightBounds {
        self.weight_bounds
    }

    /// Bounds used by later `connect` and `reset_weights` calls.
    pub fn set_initial_weight_bounds(&mut self, lower: f64, upper: f64) -> Result<()> {
        self.weight_bounds = WeightBounds::new(lower, upper)?;
        Ok(())
    }

    /// Switches every neuron, present and future, to Rprop updates.
    pub fn enable_rprop(&mut self, config: RpropConfig) -> Result<()> {
        config.validate()?;
        self.rprop = Some(config);
        for node in &mut self.nodes {
            node.enable_rprop(config);
        }
        Ok(())
    }

    /// Back to fixed-rate descent; all Rprop state is discarded.
    pub fn disable_rprop(&mut self) {
        self.rprop = None;
        for node in &mut self.nodes {
            node.disable_rprop();
        }
    }

    pub fn rprop(&self) -> Option<&RpropConfig> {
        self.rprop.as_ref()
    }

    /// Redraws every weight and bias and clears all wave and Rprop state.
    pub fn reset_weights(&mut self) {
        let Network { nodes, weight_bounds, rng, .. } = self;
        for node in nodes.iter_mut() {
            node.reset_weights(weight_bounds, &mut *rng);
        }
    }

    pub fn clear_pending(&mut self) {
        for node in &mut self.nodes {
            node.clear_pending();
        }
    }

    pub fn weights_snapshot(&self) -> WeightSnapshot {
        WeightSnapshot { entries: self.nodes.iter().map(Node::weights).collect() }
    }

    pub fn restore_weights(&mut self, snapshot: &WeightSnapshot) -> Result<()> {
        if snapshot.entries.len() != self.nodes.len() {
            return Err(NetworkError::ArityMismatch {
                expected: self.nodes.len(),
                actual: snapshot.entries.len(),
            });
        }
        for (node, entry) in self.nodes.iter_mut().zip(&snapshot.entries) {
            if let Some((bias, weights)) = entry {
                node.set_weights(*bias, weights)?;
            }
            node.clear_pending();
        }
        Ok(())
    }

    /// Fails on the first neuron that carries edges but was never registered.
    pub fn check_registered(&self) -> Result<()> {
        let stray = self.nodes.iter().zip(&self.registered).find(|(node, registered)| {
            !**registered && !(node.input_edges().is_empty() && node.output_edges().is_empty())
        });
        match stray {
            Some((node, _)) => Err(NetworkError::UnregisteredNeuron { id: node.id() }),
            None => Ok(()),
        }
    }

    /// Runs one forward wave: feeds `input` to the input neurons in
    /// registration order and lets every neuron fire once its predecessors
    /// have delivered.
    ///
    /// A wave that fails leaves no pending values behind, so the next wave
    /// starts clean.
    pub fn forward(&mut self, input: &[f64]) -> Result<()> {
        if input.len() != self.inputs.len() {
            return Err(NetworkError::ArityMismatch {
                expected: self.inputs.len(),
                actual: input.len(),
            });
        }
        let result = self.forward_wave(input);
        if result.is_err() {
            self.clear_pending();
        }
        result
    }

    fn forward_wave(&mut self, input: &[f64]) -> Result<()> {
        let mut queue: VecDeque<(NodeId, NodeId, f64)> = VecDeque::new();
        for (&id, &value) in self.inputs.iter().zip(input) {
            let node = &mut self.nodes[id.0];
            let activation = node.feed(value)?;
            queue.extend(node.output_edges().iter().map(|&to| (to, id, activation)));
        }

        while let Some((to, from, value)) = queue.pop_front() {
            let node = &mut self.nodes[to.0];
            if let Some(activation) = node.receive_forward(from, value)? {
                queue.extend(node.output_edges().iter().map(|&next| (next, to, activation)));
            }
        }
        Ok(())
    }

    /// Runs one backward wave from the raw errors (`activation - desired`)
    /// of the output neurons, updating every reachable weight once.
    pub fn backward(&mut self, errors: &[f64]) -> Result<()> {
        self.backward_with(errors, UpdateTiming::Immediate)
    }

    /// Runs one backward wave that only collects gradients. The next
    /// `apply_gradients` moves every weight once, by the mean of the
    /// gradients collected since the previous update.
    pub fn accumulate_backward(&mut self, errors: &[f64]) -> Result<()> {
        self.backward_with(errors, UpdateTiming::Deferred)
    }

    /// Applies the gradients collected by `accumulate_backward`. Returns the
    /// number of neurons that changed.
    pub fn apply_gradients(&mut self) -> usize {
        self.nodes.iter_mut().map(Node::apply_deferred).filter(|&changed| changed).count()
    }

    fn backward_with(&mut self, errors: &[f64], timing: UpdateTiming) -> Result<()> {
        if errors.len() != self.outputs.len() {
            return Err(NetworkError::ArityMismatch {
                expected: self.outputs.len(),
                actual: errors.len(),
            });
        }
        let result = self.backward_wave(errors, timing);
        if result.is_err() {
            self.clear_pending();
        }
        result
    }

    fn backward_wave(&mut self, errors: &[f64], timing: UpdateTiming) -> Result<()> {
        let mut queue: VecDeque<(NodeId, NodeId, f64)> = VecDeque::new();
        for (&id, &raw_error) in self.outputs.iter().zip(errors) {
            let signals = self.nodes[id.0].inject_error(raw_error, timing)?;
            queue.extend(signals.into_iter().map(|(to, signal)| (to, id, signal)));
        }

        while let Some((to, from, signal)) = queue.pop_front() {
            if let Some(signals) = self.nodes[to.0].receive_backward(from, signal, timing)? {
                queue.extend(signals.into_iter().map(|(next, s)| (next, to, s)));
            }
        }
        Ok(())
    }

    /// Current activations of the output neurons, in registration order.
    pub fn output_activations(&self) -> Vec<f64> {
        self.outputs.iter().map(|id| self.nodes[id.0].activation()).collect()
    }

    /// Inference: one forward wave, then the output activations. Weights are
    /// left untouched.
    pub fn test(&mut self, input: &[f64]) -> Result<Vec<f64>> {
        self.forward(input)?;
        Ok(self.output_activations())
    }

    pub fn train(&mut self, samples: &SampleSet, config: &TrainConfig) -> Result<TrainReport> {
        train_loop(self, samples, config)
    }

    /// Trains on records read from `reader` (inputs then desired outputs).
    pub fn train_from_reader<R: BufRead>(&mut self, reader: R, config: &TrainConfig) -> Result<TrainReport> {
        let samples = read_training_samples(reader, self.inputs.len(), self.outputs.len())?;
        self.train(&samples, config)
    }

    /// Answers every inference record in `reader` with one line on `writer`.
    /// Returns the number of records answered.
    pub fn test_from_reader<R: BufRead, W: Write>(
        &mut self,
        reader: R,
        writer: W,
        delimiter: &str,
    ) -> Result<usize> {
        let records = read_inference_records(reader, self.inputs.len())?;
        let outputs = records
            .iter()
            .map(|record| self.test(record))
            .collect::<Result<Vec<_>>>()?;
        write_outputs(writer, &outputs, delimiter)?;
        Ok(outputs.len())
    }

    pub(crate) fn rng_mut(&mut self) -> &mut StdRng {
        &mut self.rng
    }
}
