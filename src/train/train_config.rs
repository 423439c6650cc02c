use std::sync::mpsc;

use serde::{Deserialize, Serialize};

use crate::error::{NetworkError, Result};
use crate::train::epoch_stats::EpochStats;

/// When the backward wave runs.
///
/// - `Online`: after every training sample
/// - `Batch`: gradients of every sample are collected and their mean is
///   applied once per epoch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrainMode {
    #[default]
    Online,
    Batch,
}

/// Restart-on-stuck policy: a finished session whose train error is still
/// above `threshold` starts over from fresh weights, at most `max_restarts`
/// times.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RestartPolicy {
    pub enabled: bool,
    pub threshold: f64,
    pub max_restarts: usize,
}

impl Default for RestartPolicy {
    fn default() -> Self {
        RestartPolicy {
            enabled: true,
            threshold: 0.05,
            max_restarts: 10,
        }
    }
}

impl RestartPolicy {
    pub fn disabled() -> Self {
        RestartPolicy { enabled: false, ..RestartPolicy::default() }
    }
}

/// Configuration for a `train_loop` run.
///
/// # Fields
/// - `train_ratio`: share of the samples used for training; the
///   rest is the test split
/// - `max_epochs`: epoch limit of a single session
/// - `epsilon`: a session converges once the train error
///   changes by at most this much between epochs
/// - `test_increase_window`: a session stops once the test error rose in
///   each of this many consecutive epochs
/// - `restart`: restart-on-stuck policy
/// - `max_divergence_resets`: weight resets a session may spend on
///   diverging activations before giving up
/// - `mode`: online or batch backward waves
/// - `shuffle_each_epoch`: reshuffle the training split every epoch
/// - `progress_tx`: optional channel receiving one `EpochStats`
///   per completed epoch
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainConfig {
    pub train_ratio: f64,
    pub max_epochs: usize,
    pub epsilon: f64,
    pub test_increase_window: usize,
    pub restart: RestartPolicy,
    pub max_divergence_resets: usize,
    pub mode: TrainMode,
    pub shuffle_each_epoch: bool,
    #[serde(skip)]
    pub progress_tx: Option<mpsc::Sender<EpochStats>>,
}

impl Default for TrainConfig {
    fn default() -> Self {
        TrainConfig {
            train_ratio: 0.8,
            max_epochs: 20_000,
            epsilon: 1e-8,
            test_increase_window: 10,
            restart: RestartPolicy::default(),
            max_divergence_resets: 100,
            mode: TrainMode::Online,
            shuffle_each_epoch: true,
            progress_tx: None,
        }
    }
}

impl TrainConfig {
    /// Creates a `TrainConfig` with default stopping and restart settings.
    pub fn new(train_ratio: f64, max_epochs: usize, mode: TrainMode) -> Self {
        TrainConfig {
            train_ratio,
            max_epochs,
            mode,
            ..TrainConfig::default()
        }
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.train_ratio > 0.0 && self.train_ratio <= 1.0) {
            return Err(NetworkError::InvalidTrainRatio { ratio: self.train_ratio });
        }
        if self.max_epochs == 0 {
            return Err(NetworkError::InvalidConfig { reason: "max_epochs must be at least 1" });
        }
        if !(self.epsilon >= 0.0) {
            return Err(NetworkError::InvalidConfig { reason: "epsilon must be non-negative" });
        }
        if self.test_increase_window == 0 {
            return Err(NetworkError::InvalidConfig {
                reason: "test_increase_window must be at least 1",
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_json_keeps_defaults() {
        let config: TrainConfig =
            serde_json::from_str(r#"{"max_epochs": 50, "mode": "batch", "restart": {"enabled": false}}"#)
                .unwrap();
        assert_eq!(config.max_epochs, 50);
        assert_eq!(config.mode, TrainMode::Batch);
        assert!(!config.restart.enabled);
        assert_eq!(config.restart.max_restarts, 10);
        assert_eq!(config.test_increase_window, 10);
        assert!(config.progress_tx.is_none());
    }

    #[test]
    fn rejects_out_of_range_settings() {
        assert!(TrainConfig::new(0.0, 10, TrainMode::Online).validate().is_err());
        assert!(TrainConfig::new(1.0, 0, TrainMode::Online).validate().is_err());
        assert!(TrainConfig { epsilon: f64::NAN, ..TrainConfig::default() }.validate().is_err());
        assert!(TrainConfig::default().validate().is_ok());
    }
}
