pub mod activation;
pub mod config;
pub mod data;
pub mod error;
pub mod loss;
pub mod network;
pub mod node;
pub mod optim;
pub mod train;

// Convenience re-exports
pub use config::ExperimentConfig;
pub use data::samples::SampleSet;
pub use error::{NetworkError, Result};
pub use network::network::{Network, WeightSnapshot};
pub use network::network_config::{NetworkConfig, NodeParams, WeightBounds};
pub use network::topology::TopologySpec;
pub use node::node::{Node, NodeId, NodeKind};
pub use optim::rprop::RpropConfig;
pub use train::loop_fn::train_loop;
pub use train::report::{StopReason, TrainReport};
pub use train::train_config::{RestartPolicy, TrainConfig, TrainMode};
