use std::collections::HashMap;
use std::fmt;

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::activation::sigmoid::{sigmoid, sigmoid_derivative};
use crate::error::{NetworkError, Result};
use crate::network::network_config::{NodeParams, WeightBounds};
use crate::optim::rprop::{RpropConfig, RpropState};
use crate::optim::weight_update::WeightUpdate;

/// Handle of a neuron inside the network's arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeId(pub usize);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeKind {
    Input,
    Hidden,
    Output,
}

impl NodeKind {
    pub fn name(&self) -> &'static str {
        match self {
            NodeKind::Input => "input",
            NodeKind::Hidden => "hidden",
            NodeKind::Output => "output",
        }
    }
}

/// Weighted incoming edge.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InputEdge {
    pub source: NodeId,
    pub weight: f64,
}

/// Error credit a neuron hands back to one of its predecessors.
pub type BackSignal = (NodeId, f64);

/// When a completed backward wave changes a neuron's weights.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateTiming {
    /// Right away, from this wave's gradient.
    Immediate,
    /// Collected until `Node::apply_deferred`, which applies the mean.
    Deferred,
}

/// Gradient sums of the backward waves since the last applied update.
#[derive(Debug, Clone, Default)]
struct GradientSums {
    bias: f64,
    // input·delta per edge, in edge order.
    edges: Vec<f64>,
    waves: usize,
}

/// Receiving side of a neuron: bias, weighted edges and the forward-wave
/// accumulator.
#[derive(Debug, Clone)]
struct Fanin {
    bias_weight: f64,
    edges: Vec<InputEdge>,
    index: HashMap<NodeId, usize>,
    pending: HashMap<NodeId, f64>,
    // Values that completed the last forward wave, in edge order.
    last_inputs: Vec<f64>,
    params: NodeParams,
    update: WeightUpdate,
    deferred: Option<GradientSums>,
}

impl Fanin {
    fn new(bias_weight: f64, params: NodeParams) -> Fanin {
        Fanin {
            bias_weight,
            edges: Vec::new(),
            index: HashMap::new(),
            pending: HashMap::new(),
            last_inputs: Vec::new(),
            params,
            update: WeightUpdate::Fixed,
            deferred: None,
        }
    }

    fn store(&mut self, node: NodeId, source: NodeId, value: f64) -> Result<bool> {
        if !self.index.contains_key(&source) {
            return Err(NetworkError::UnconnectedSource { node, source_id: source });
        }
        if self.pending.contains_key(&source) {
            return Err(NetworkError::DuplicateDelivery { node, peer: source });
        }
        self.pending.insert(source, value);
        Ok(self.pending.len() == self.edges.len())
    }

    /// Consumes a complete set of pending inputs and returns the weighted sum.
    fn collect(&mut self) -> f64 {
        let pending = &self.pending;
        self.last_inputs = self
            .edges
            .iter()
            .map(|edge| pending.get(&edge.source).copied().unwrap_or(0.0))
            .collect();
        self.pending.clear();

        self.edges
            .iter()
            .zip(&self.last_inputs)
            .fold(self.bias_weight, |acc, (edge, input)| acc + edge.weight * input)
    }

    /// Takes the gradient for `delta` and returns the signals owed to every
    /// predecessor, computed with the pre-update weights.
    fn learn(&mut self, delta: f64, timing: UpdateTiming) -> Vec<BackSignal> {
        let signals = self
            .edges
            .iter()
            .map(|edge| (edge.source, delta * edge.weight))
            .collect();

        let input_terms: Vec<f64> = (0..self.edges.len())
            .map(|k| self.last_inputs.get(k).copied().unwrap_or(0.0) * delta)
            .collect();
        match timing {
            UpdateTiming::Immediate => self.apply(delta, &input_terms),
            UpdateTiming::Deferred => {
                let sums = self.deferred.get_or_insert_with(GradientSums::default);
                sums.edges.resize(input_terms.len(), 0.0);
                sums.bias += delta;
                for (sum, term) in sums.edges.iter_mut().zip(&input_terms) {
                    *sum += term;
                }
                sums.waves += 1;
            }
        }

        signals
    }

    /// One weight step. `input_terms[k]` is the loss gradient of edge `k`
    /// before the regularization term.
    fn apply(&mut self, bias_gradient: f64, input_terms: &[f64]) {
        let NodeParams { learning_rate, regularization } = self.params;
        self.bias_weight += self.update.bias_change(bias_gradient, learning_rate);
        for (k, edge) in self.edges.iter_mut().enumerate() {
            let term = input_terms.get(k).copied().unwrap_or(0.0);
            let gradient = term + regularization * edge.weight;
            edge.weight += self.update.edge_change(k, gradient, learning_rate);
        }
    }

    fn apply_deferred(&mut self) -> bool {
        let Some(sums) = self.deferred.take() else {
            return false;
        };
        let waves = sums.waves.max(1) as f64;
        let means: Vec<f64> = sums.edges.iter().map(|sum| sum / waves).collect();
        self.apply(sums.bias / waves, &means);
        true
    }

    fn reset<R: Rng + ?Sized>(&mut self, bounds: &WeightBounds, rng: &mut R) {
        self.bias_weight = bounds.sample(rng);
        for edge in &mut self.edges {
            edge.weight = bounds.sample(rng);
        }
        self.pending.clear();
        self.last_inputs.clear();
        self.deferred = None;
        self.update.reset();
    }
}

/// Sending side of a neuron: successors and the backward-wave accumulator.
#[derive(Debug, Clone, Default)]
struct Fanout {
    targets: Vec<NodeId>,
    pending: HashMap<NodeId, f64>,
}

impl Fanout {
    fn store(&mut self, node: NodeId, target: NodeId, signal: f64) -> Result<Option<f64>> {
        if !self.targets.contains(&target) {
            return Err(NetworkError::UnconnectedTarget { node, target });
        }
        if self.pending.contains_key(&target) {
            return Err(NetworkError::DuplicateDelivery { node, peer: target });
        }
        self.pending.insert(target, signal);
        if self.pending.len() < self.targets.len() {
            return Ok(None);
        }

        let pending = &self.pending;
        let delta = self
            .targets
            .iter()
            .map(|t| pending.get(t).copied().unwrap_or(0.0))
            .sum();
        self.pending.clear();
        Ok(Some(delta))
    }
}

#[derive(Debug, Clone)]
enum Role {
    Input { fanout: Fanout },
    Hidden { fanin: Fanin, fanout: Fanout },
    Output { fanin: Fanin },
}

/// A single neuron.
///
/// Forward: input neurons are fed a raw value; every other neuron collects
/// one value per incoming edge and fires `sigmoid(bias + Σ w·x)` once the set
/// is complete. Backward: output neurons take the raw error directly, every
/// other neuron collects one signal per outgoing edge, updates its own weights
/// and hands `delta·w` back to each predecessor.
#[derive(Debug, Clone)]
pub struct Node {
    id: NodeId,
    activation: f64,
    role: Role,
}

impl Node {
    pub fn new(id: NodeId, kind: NodeKind, params: NodeParams, bias_weight: f64) -> Node {
        let role = match kind {
            NodeKind::Input => Role::Input { fanout: Fanout::default() },
            NodeKind::Hidden => Role::Hidden {
                fanin: Fanin::new(bias_weight, params),
                fanout: Fanout::default(),
            },
            NodeKind::Output => Role::Output { fanin: Fanin::new(bias_weight, params) },
        };
        Node { id, activation: 0.0, role }
    }

    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn kind(&self) -> NodeKind {
        match self.role {
            Role::Input { .. } => NodeKind::Input,
            Role::Hidden { .. } => NodeKind::Hidden,
            Role::Output { .. } => NodeKind::Output,
        }
    }

    pub fn activation(&self) -> f64 {
        self.activation
    }

    fn fanin(&self) -> Option<&Fanin> {
        match &self.role {
            Role::Hidden { fanin, .. } | Role::Output { fanin } => Some(fanin),
            Role::Input { .. } => None,
        }
    }

    fn fanin_mut(&mut self) -> Option<&mut Fanin> {
        match &mut self.role {
            Role::Hidden { fanin, .. } | Role::Output { fanin } => Some(fanin),
            Role::Input { .. } => None,
        }
    }

    fn fanout(&self) -> Option<&Fanout> {
        match &self.role {
            Role::Input { fanout } | Role::Hidden { fanout, .. } => Some(fanout),
            Role::Output { .. } => None,
        }
    }

    pub fn bias_weight(&self) -> Option<f64> {
        self.fanin().map(|f| f.bias_weight)
    }

    pub fn input_edges(&self) -> &[InputEdge] {
        self.fanin().map(|f| f.edges.as_slice()).unwrap_or(&[])
    }

    pub fn output_edges(&self) -> &[NodeId] {
        self.fanout().map(|f| f.targets.as_slice()).unwrap_or(&[])
    }

    pub fn pending_input_count(&self) -> usize {
        self.fanin().map_or(0, |f| f.pending.len())
    }

    pub fn pending_error_count(&self) -> usize {
        self.fanout().map_or(0, |f| f.pending.len())
    }

    pub fn params(&self) -> Option<NodeParams> {
        self.fanin().map(|f| f.params)
    }

    pub fn set_params(&mut self, params: NodeParams) {
        if let Some(fanin) = self.fanin_mut() {
            fanin.params = params;
        }
    }

    pub fn rprop_state(&self) -> Option<&RpropState> {
        self.fanin().and_then(|f| f.update.rprop_state())
    }

    pub fn uses_rprop(&self) -> bool {
        self.fanin().map_or(false, |f| f.update.is_rprop())
    }

    /// Switches this neuron to Rprop, sized from its current edges.
    /// Input neurons own no weights and ignore the call.
    pub fn enable_rprop(&mut self, config: RpropConfig) {
        if let Some(fanin) = self.fanin_mut() {
            fanin.update = WeightUpdate::rprop(config, fanin.edges.len());
        }
    }

    pub fn disable_rprop(&mut self) {
        if let Some(fanin) = self.fanin_mut() {
            fanin.update = WeightUpdate::Fixed;
        }
    }

    pub(crate) fn add_input_edge(&mut self, source: NodeId, weight: f64) -> Result<()> {
        let to = self.id;
        let fanin = self.fanin_mut().ok_or(NetworkError::InvalidEdge {
            from: source,
            to,
            reason: "input neurons accept no incoming edges",
        })?;
        if fanin.index.contains_key(&source) {
            return Err(NetworkError::DuplicateConnection { from: source, to });
        }
        fanin.index.insert(source, fanin.edges.len());
        fanin.edges.push(InputEdge { source, weight });
        fanin.update.push_edge();
        Ok(())
    }

    pub(crate) fn add_output_edge(&mut self, target: NodeId) -> Result<()> {
        let from = self.id;
        let fanout = match &mut self.role {
            Role::Input { fanout } | Role::Hidden { fanout, .. } => fanout,
            Role::Output { .. } => {
                return Err(NetworkError::InvalidEdge {
                    from,
                    to: target,
                    reason: "output neurons have no outgoing edges",
                })
            }
        };
        if fanout.targets.contains(&target) {
            return Err(NetworkError::DuplicateConnection { from, to: target });
        }
        fanout.targets.push(target);
        Ok(())
    }

    /// Sets the activation of an input neuron directly and returns it so the
    /// caller can forward it.
    pub fn feed(&mut self, value: f64) -> Result<f64> {
        match self.role {
            Role::Input { .. } => {
                self.activation = value;
                Ok(value)
            }
            _ => Err(self.role_mismatch(NodeKind::Input)),
        }
    }

    /// Stores one forward value. Returns the new activation once every
    /// incoming edge has delivered, `None` while the wave is still partial.
    pub fn receive_forward(&mut self, source: NodeId, value: f64) -> Result<Option<f64>> {
        let node = self.id;
        let fanin = match &mut self.role {
            Role::Hidden { fanin, .. } | Role::Output { fanin } => fanin,
            Role::Input { .. } => {
                return Err(NetworkError::UnconnectedSource { node, source_id: source });
            }
        };
        if !fanin.store(node, source, value)? {
            return Ok(None);
        }

        let raw = fanin.collect();
        let activation = sigmoid(raw);
        if !raw.is_finite() || !activation.is_finite() {
            return Err(NetworkError::ActivationDiverged { node });
        }
        self.activation = activation;
        Ok(Some(activation))
    }

    /// Stores one backward signal. Once every outgoing edge has delivered,
    /// takes this neuron's gradient (applied or deferred per `timing`) and
    /// returns the signals for its predecessors (none for input neurons).
    pub fn receive_backward(
        &mut self,
        target: NodeId,
        signal: f64,
        timing: UpdateTiming,
    ) -> Result<Option<Vec<BackSignal>>> {
        let node = self.id;
        let activation = self.activation;
        match &mut self.role {
            Role::Input { fanout } => Ok(fanout.store(node, target, signal)?.map(|_| Vec::new())),
            Role::Hidden { fanin, fanout } => Ok(fanout
                .store(node, target, signal)?
                .map(|delta| fanin.learn(delta * sigmoid_derivative(activation), timing))),
            Role::Output { .. } => Err(NetworkError::UnconnectedTarget { node, target }),
        }
    }

    /// Starts the backward wave at an output neuron. `raw_error` is
    /// `activation - desired` and serves as the delta as-is.
    pub fn inject_error(&mut self, raw_error: f64, timing: UpdateTiming) -> Result<Vec<BackSignal>> {
        if let Role::Output { fanin } = &mut self.role {
            return Ok(fanin.learn(raw_error, timing));
        }
        Err(self.role_mismatch(NodeKind::Output))
    }

    /// Applies the mean of the gradients deferred since the last update as a
    /// single step. Returns false when nothing was deferred.
    pub fn apply_deferred(&mut self) -> bool {
        self.fanin_mut().map_or(false, Fanin::apply_deferred)
    }

    /// Redraws the bias and every edge weight, and drops all wave and Rprop state.
    pub fn reset_weights<R: Rng + ?Sized>(&mut self, bounds: &WeightBounds, rng: &mut R) {
        self.clear_pending();
        if let Some(fanin) = self.fanin_mut() {
            fanin.reset(bounds, rng);
        }
    }

    pub fn clear_pending(&mut self) {
        match &mut self.role {
            Role::Input { fanout } => fanout.pending.clear(),
            Role::Hidden { fanin, fanout } => {
                fanin.pending.clear();
                fanout.pending.clear();
            }
            Role::Output { fanin } => fanin.pending.clear(),
        }
    }

    /// Bias followed by the edge weights in edge order.
    pub fn weights(&self) -> Option<(f64, Vec<f64>)> {
        self.fanin()
            .map(|f| (f.bias_weight, f.edges.iter().map(|e| e.weight).collect()))
    }

    pub(crate) fn set_weights(&mut self, bias_weight: f64, weights: &[f64]) -> Result<()> {
        let Some(fanin) = self.fanin_mut() else {
            return Ok(());
        };
        if weights.len() != fanin.edges.len() {
            return Err(NetworkError::ArityMismatch {
                expected: fanin.edges.len(),
                actual: weights.len(),
            });
        }
        fanin.bias_weight = bias_weight;
        fanin.deferred = None;
        for (edge, &w) in fanin.edges.iter_mut().zip(weights) {
            edge.weight = w;
        }
        Ok(())
    }

    fn role_mismatch(&self, expected: NodeKind) -> NetworkError {
        NetworkError::RoleMismatch {
            id: self.id,
            expected: expected.name(),
            actual: self.kind().name(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::activation::sigmoid::sigmoid;

    fn hidden(id: usize, bias: f64, sources: &[(usize, f64)]) -> Node {
        let mut node = Node::new(NodeId(id), NodeKind::Hidden, NodeParams::default(), bias);
        for &(s, w) in sources {
            node.add_input_edge(NodeId(s), w).unwrap();
        }
        node
    }

    #[test]
    fn fires_only_after_the_last_predecessor() {
        let mut node = hidden(5, 0.1, &[(0, 0.5), (1, -0.25), (2, 1.0)]);
        assert_eq!(node.receive_forward(NodeId(0), 1.0).unwrap(), None);
        assert_eq!(node.receive_forward(NodeId(2), 0.5).unwrap(), None);
        assert_eq!(node.activation(), 0.0);
        assert_eq!(node.pending_input_count(), 2);

        let fired = node.receive_forward(NodeId(1), 2.0).unwrap();
        let expected = sigmoid(0.1 + 0.5 * 1.0 - 0.25 * 2.0 + 1.0 * 0.5);
        assert_eq!(fired, Some(expected));
        assert_eq!(node.activation(), expected);
        assert_eq!(node.pending_input_count(), 0);
    }

    #[test]
    fn redelivery_fails_without_double_counting() {
        let mut node = hidden(3, 0.0, &[(0, 1.0), (1, 1.0)]);
        node.receive_forward(NodeId(0), 0.4).unwrap();
        let err = node.receive_forward(NodeId(0), 0.4).unwrap_err();
        assert!(matches!(err, NetworkError::DuplicateDelivery { peer: NodeId(0), .. }));

        let fired = node.receive_forward(NodeId(1), 0.6).unwrap().unwrap();
        assert_eq!(fired, sigmoid(1.0));
    }

    #[test]
    fn unknown_source_is_rejected() {
        let mut node = hidden(3, 0.0, &[(0, 1.0)]);
        let err = node.receive_forward(NodeId(9), 1.0).unwrap_err();
        assert!(matches!(
            err,
            NetworkError::UnconnectedSource { node: NodeId(3), source_id: NodeId(9) }
        ));
        assert_eq!(node.pending_input_count(), 0);
    }

    #[test]
    fn runaway_weights_report_divergence() {
        let mut node = hidden(2, f64::MAX, &[(0, f64::MAX)]);
        let err = node.receive_forward(NodeId(0), 1.0).unwrap_err();
        assert!(err.is_recoverable());
        assert_eq!(node.pending_input_count(), 0);
    }

    #[test]
    fn input_neuron_only_accepts_feeding() {
        let mut input = Node::new(NodeId(0), NodeKind::Input, NodeParams::default(), 0.0);
        assert_eq!(input.feed(0.75).unwrap(), 0.75);
        assert_eq!(input.activation(), 0.75);
        assert!(input.receive_forward(NodeId(1), 1.0).is_err());
        assert!(input.add_input_edge(NodeId(1), 0.3).is_err());
        assert!(input.bias_weight().is_none());

        let mut out = Node::new(NodeId(1), NodeKind::Output, NodeParams::default(), 0.0);
        assert!(matches!(out.feed(1.0), Err(NetworkError::RoleMismatch { .. })));
    }

    #[test]
    fn output_gradient_skips_the_sigmoid_factor() {
        let params = NodeParams { learning_rate: 0.5, regularization: 0.0 };
        let mut out = Node::new(NodeId(2), NodeKind::Output, params, 0.2);
        out.add_input_edge(NodeId(1), 0.4).unwrap();
        out.receive_forward(NodeId(1), 0.5).unwrap();

        let signals = out.inject_error(0.3, UpdateTiming::Immediate).unwrap();
        assert_eq!(signals, vec![(NodeId(1), 0.3 * 0.4)]);
        let (bias, weights) = out.weights().unwrap();
        assert!((bias - (0.2 - 0.5 * 0.3)).abs() < 1e-12);
        assert!((weights[0] - (0.4 - 0.5 * 0.5 * 0.3)).abs() < 1e-12);
    }

    #[test]
    fn hidden_backward_waits_for_all_successors() {
        let params = NodeParams { learning_rate: 1.0, regularization: 0.1 };
        let mut node = Node::new(NodeId(4), NodeKind::Hidden, params, 0.0);
        node.add_input_edge(NodeId(0), 0.5).unwrap();
        node.add_output_edge(NodeId(7)).unwrap();
        node.add_output_edge(NodeId(8)).unwrap();
        node.receive_forward(NodeId(0), 1.0).unwrap();
        let a = node.activation();

        assert_eq!(node.receive_backward(NodeId(7), 0.2, UpdateTiming::Immediate).unwrap(), None);
        assert!(matches!(
            node.receive_backward(NodeId(7), 0.2, UpdateTiming::Immediate),
            Err(NetworkError::DuplicateDelivery { .. })
        ));
        let signals = node.receive_backward(NodeId(8), 0.1, UpdateTiming::Immediate).unwrap().unwrap();

        let delta = 0.3 * a * (1.0 - a);
        assert_eq!(signals.len(), 1);
        assert!((signals[0].1 - delta * 0.5).abs() < 1e-12);
        let (_, weights) = node.weights().unwrap();
        let gradient = 1.0 * delta + 0.1 * 0.5;
        assert!((weights[0] - (0.5 - gradient)).abs() < 1e-12);
        assert_eq!(node.pending_error_count(), 0);
    }

    #[test]
    fn backward_from_unconnected_target_fails() {
        let mut node = hidden(1, 0.0, &[(0, 1.0)]);
        node.add_output_edge(NodeId(2)).unwrap();
        assert!(matches!(
            node.receive_backward(NodeId(3), 1.0, UpdateTiming::Immediate),
            Err(NetworkError::UnconnectedTarget { .. })
        ));
    }

    #[test]
    fn deferred_waves_apply_their_mean_once() {
        let params = NodeParams { learning_rate: 0.5, regularization: 0.1 };
        let mut out = Node::new(NodeId(2), NodeKind::Output, params, 0.2);
        out.add_input_edge(NodeId(1), 0.4).unwrap();

        out.receive_forward(NodeId(1), 1.0).unwrap();
        let first = out.inject_error(0.3, UpdateTiming::Deferred).unwrap();
        out.receive_forward(NodeId(1), 0.5).unwrap();
        let second = out.inject_error(-0.1, UpdateTiming::Deferred).unwrap();

        // Nothing moves until the deferred step, and signals use the old weight.
        assert_eq!(out.weights().unwrap(), (0.2, vec![0.4]));
        assert_eq!(first, vec![(NodeId(1), 0.3 * 0.4)]);
        assert_eq!(second, vec![(NodeId(1), -0.1 * 0.4)]);

        assert!(out.apply_deferred());
        let (bias, weights) = out.weights().unwrap();
        let bias_gradient = (0.3 - 0.1) / 2.0;
        let edge_gradient = (1.0 * 0.3 + 0.5 * -0.1) / 2.0 + 0.1 * 0.4;
        assert!((bias - (0.2 - 0.5 * bias_gradient)).abs() < 1e-12);
        assert!((weights[0] - (0.4 - 0.5 * edge_gradient)).abs() < 1e-12);

        assert!(!out.apply_deferred(), "sums are consumed by the step");
    }

    #[test]
    fn late_edges_extend_rprop_state() {
        let mut node = hidden(1, 0.0, &[(0, 1.0)]);
        node.enable_rprop(RpropConfig::default());
        node.add_input_edge(NodeId(2), 0.5).unwrap();
        assert_eq!(node.rprop_state().unwrap().edge_count(), 2);
        node.disable_rprop();
        assert!(!node.uses_rprop());
    }
}
