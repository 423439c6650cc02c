use serde::{Deserialize, Serialize};

use crate::error::{NetworkError, Result};

/// Hyperparameters of resilient backpropagation.
///
/// - `initial_step`: δ₀, the step every edge starts from
/// - `max_step`: δ_max, hard ceiling on any step
/// - `increase_factor`: growth when two consecutive gradients agree in sign
/// - `decrease_factor`: shrink when the gradient flips sign
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RpropConfig {
    pub initial_step: f64,
    pub max_step: f64,
    pub increase_factor: f64,
    pub decrease_factor: f64,
}

impl Default for RpropConfig {
    fn default() -> Self {
        RpropConfig {
            initial_step: 0.1,
            max_step: 50.0,
            increase_factor: 1.2,
            decrease_factor: 0.5,
        }
    }
}

impl RpropConfig {
    pub fn validate(&self) -> Result<()> {
        if !(self.initial_step > 0.0) {
            return Err(NetworkError::InvalidConfig { reason: "rprop initial step must be positive" });
        }
        if !(self.max_step >= self.initial_step) {
            return Err(NetworkError::InvalidConfig {
                reason: "rprop max step must not be below the initial step",
            });
        }
        if !(self.increase_factor > 1.0) {
            return Err(NetworkError::InvalidConfig { reason: "rprop increase factor must exceed 1" });
        }
        if !(self.decrease_factor > 0.0 && self.decrease_factor < 1.0) {
            return Err(NetworkError::InvalidConfig {
                reason: "rprop decrease factor must lie in (0, 1)",
            });
        }
        Ok(())
    }
}

/// Sign-adaptive step of a single weight.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RpropCell {
    previous_gradient: f64,
    step_size: f64,
}

impl RpropCell {
    fn new(config: &RpropConfig) -> RpropCell {
        RpropCell {
            previous_gradient: 0.0,
            step_size: config.initial_step.min(config.max_step),
        }
    }

    pub fn previous_gradient(&self) -> f64 {
        self.previous_gradient
    }

    pub fn step_size(&self) -> f64 {
        self.step_size
    }

    /// Adapts the step to the sign trend and returns the weight change.
    /// Only the sign of `gradient` moves the weight, never its magnitude.
    fn adapt(&mut self, gradient: f64, config: &RpropConfig) -> f64 {
        let trend = self.previous_gradient * gradient;
        if trend > 0.0 {
            self.step_size *= config.increase_factor;
        } else if trend < 0.0 {
            self.step_size *= config.decrease_factor;
        }
        self.step_size = self.step_size.min(config.max_step);
        self.previous_gradient = gradient;

        if gradient > 0.0 {
            -self.step_size
        } else if gradient < 0.0 {
            self.step_size
        } else {
            0.0
        }
    }
}

/// Rprop bookkeeping owned by one neuron: a cell per incoming edge, in edge
/// order, plus one for the bias.
#[derive(Debug, Clone, PartialEq)]
pub struct RpropState {
    config: RpropConfig,
    edges: Vec<RpropCell>,
    bias: RpropCell,
}

impl RpropState {
    pub fn new(config: RpropConfig, edge_count: usize) -> RpropState {
        RpropState {
            config,
            edges: vec![RpropCell::new(&config); edge_count],
            bias: RpropCell::new(&config),
        }
    }

    pub fn config(&self) -> &RpropConfig {
        &self.config
    }

    pub fn edge(&self, index: usize) -> Option<&RpropCell> {
        self.edges.get(index)
    }

    pub fn bias(&self) -> &RpropCell {
        &self.bias
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// Tracks an edge connected after Rprop was switched on.
    pub fn push_edge(&mut self) {
        self.edges.push(RpropCell::new(&self.config));
    }

    pub fn step_edge(&mut self, index: usize, gradient: f64) -> f64 {
        let config = self.config;
        match self.edges.get_mut(index) {
            Some(cell) => cell.adapt(gradient, &config),
            None => 0.0,
        }
    }

    pub fn step_bias(&mut self, gradient: f64) -> f64 {
        let config = self.config;
        self.bias.adapt(gradient, &config)
    }

    /// All gradients back to zero, all steps back to δ₀.
    pub fn reset(&mut self) {
        let fresh = RpropCell::new(&self.config);
        self.edges.iter_mut().for_each(|cell| *cell = fresh);
        self.bias = fresh;
    }
}
