use crate::data::stream::SampleError;
use crate::node::node::NodeId;

/// Everything that can go wrong while building, training or querying a network.
///
/// Topology and configuration variants point at a caller bug and are returned
/// to the immediate caller. `ActivationDiverged` is the single runtime
/// condition the training loop recovers from.
#[derive(Debug, thiserror::Error)]
pub enum NetworkError {
    #[error("neuron {id} is already registered with the network")]
    DuplicateNeuron { id: NodeId },

    #[error("neuron {id} does not exist")]
    UnknownNeuron { id: NodeId },

    #[error("neuron {id} is wired into the graph but was never registered with the network")]
    UnregisteredNeuron { id: NodeId },

    #[error("neuron {node} received a forward signal from {source_id}, which is not connected as its input")]
    UnconnectedSource { node: NodeId, source_id: NodeId },

    #[error("neuron {node} received an error signal from {target}, which is not connected as its output")]
    UnconnectedTarget { node: NodeId, target: NodeId },

    #[error("neuron {node} already holds a pending signal from {peer} for the current wave")]
    DuplicateDelivery { node: NodeId, peer: NodeId },

    #[error("neurons {from} -> {to} are already connected")]
    DuplicateConnection { from: NodeId, to: NodeId },

    #[error("cannot connect {from} -> {to}: {reason}")]
    InvalidEdge {
        from: NodeId,
        to: NodeId,
        reason: &'static str,
    },

    #[error("neuron {id} is a {actual} neuron, expected {expected}")]
    RoleMismatch {
        id: NodeId,
        expected: &'static str,
        actual: &'static str,
    },

    #[error("activation of neuron {node} has gone to infinity; weights are running away")]
    ActivationDiverged { node: NodeId },

    #[error("upper weight bound {upper} must be greater than lower bound {lower}")]
    InvalidWeightBounds { lower: f64, upper: f64 },

    #[error("invalid configuration: {reason}")]
    InvalidConfig { reason: &'static str },

    #[error("train ratio {ratio} must lie in (0, 1]")]
    InvalidTrainRatio { ratio: f64 },

    #[error("train ratio {ratio} leaves no training sample out of {samples}")]
    EmptyTrainingSet { samples: usize, ratio: f64 },

    #[error("expected {expected} values, got {actual}")]
    ArityMismatch { expected: usize, actual: usize },

    #[error("{inputs} input rows but {outputs} desired output rows")]
    SampleCountMismatch { inputs: usize, outputs: usize },

    #[error(transparent)]
    Samples(#[from] SampleError),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("malformed configuration file: {0}")]
    Config(#[from] serde_json::Error),
}

impl NetworkError {
    /// True only for numeric divergence, which training absorbs by resetting
    /// the weights.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, NetworkError::ActivationDiverged { .. })
    }
}

pub type Result<T> = std::result::Result<T, NetworkError>;
