use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::{NetworkError, Result};

/// Per-neuron learning hyperparameters.
///
/// - `learning_rate`: scale of the fixed-rate gradient step
/// - `regularization`: weight-decay coefficient added to every edge gradient
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NodeParams {
    pub learning_rate: f64,
    pub regularization: f64,
}

impl Default for NodeParams {
    fn default() -> Self {
        NodeParams {
            learning_rate: 0.7,
            regularization: 0.0,
        }
    }
}

/// Half-open range `[lower, upper)` initial weights are drawn from.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WeightBounds {
    lower: f64,
    upper: f64,
}

impl WeightBounds {
    pub fn new(lower: f64, upper: f64) -> Result<WeightBounds> {
        // Negated so NaN bounds are rejected as well.
        if !(upper > lower) || !(upper - lower).is_finite() {
            return Err(NetworkError::InvalidWeightBounds { lower, upper });
        }
        Ok(WeightBounds { lower, upper })
    }

    pub fn lower(&self) -> f64 {
        self.lower
    }

    pub fn upper(&self) -> f64 {
        self.upper
    }

    /// Re-checks bounds that bypassed `new`, e.g. ones read from JSON.
    pub fn validate(&self) -> Result<()> {
        WeightBounds::new(self.lower, self.upper).map(|_| ())
    }

    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> f64 {
        rng.gen_range(self.lower..self.upper)
    }
}

impl Default for WeightBounds {
    fn default() -> Self {
        WeightBounds {
            lower: -1.0,
            upper: 1.0,
        }
    }
}

/// Construction-time settings of a `Network`.
///
/// `seed` fixes the random stream used for weight initialization and sample
/// shuffling; `None` seeds from the operating system.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NetworkConfig {
    pub params: NodeParams,
    pub weight_bounds: WeightBounds,
    pub seed: Option<u64>,
}

impl NetworkConfig {
    pub fn seeded(seed: u64) -> Self {
        NetworkConfig {
            seed: Some(seed),
            ..NetworkConfig::default()
        }
    }
}
