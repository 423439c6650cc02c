pub mod builder;
pub mod network;
pub mod network_config;
pub mod topology;

pub use network::{Network, WeightSnapshot};
pub use network_config::{NetworkConfig, NodeParams, WeightBounds};
pub use topology::TopologySpec;
