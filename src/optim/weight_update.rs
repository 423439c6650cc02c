use crate::optim::rprop::{RpropConfig, RpropState};
use crate::optim::sgd::Sgd;

/// Rule a neuron uses to turn gradients into weight changes.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum WeightUpdate {
    #[default]
    Fixed,
    Rprop(RpropState),
}

impl WeightUpdate {
    pub fn rprop(config: RpropConfig, edge_count: usize) -> WeightUpdate {
        WeightUpdate::Rprop(RpropState::new(config, edge_count))
    }

    pub fn is_rprop(&self) -> bool {
        matches!(self, WeightUpdate::Rprop(_))
    }

    pub fn rprop_state(&self) -> Option<&RpropState> {
        match self {
            WeightUpdate::Rprop(state) => Some(state),
            WeightUpdate::Fixed => None,
        }
    }

    pub fn bias_change(&mut self, gradient: f64, learning_rate: f64) -> f64 {
        match self {
            WeightUpdate::Fixed => Sgd::new(learning_rate).step(gradient),
            WeightUpdate::Rprop(state) => state.step_bias(gradient),
        }
    }

    pub fn edge_change(&mut self, edge: usize, gradient: f64, learning_rate: f64) -> f64 {
        match self {
            WeightUpdate::Fixed => Sgd::new(learning_rate).step(gradient),
            WeightUpdate::Rprop(state) => state.step_edge(edge, gradient),
        }
    }

    pub fn push_edge(&mut self) {
        if let WeightUpdate::Rprop(state) = self {
            state.push_edge();
        }
    }

    pub fn reset(&mut self) {
        if let WeightUpdate::Rprop(state) = self {
            state.reset();
        }
    }
}
