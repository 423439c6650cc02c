pub mod node;

pub use node::{BackSignal, InputEdge, Node, NodeId, NodeKind, UpdateTiming};
