use serde::{Serialize, Deserialize};

/// Per-epoch training statistics emitted by `train_loop`.
///
/// One value is logged at debug level for every completed epoch and, when a
/// `progress_tx` channel is configured in `TrainConfig`, sent through it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EpochStats {
    /// 1-based restart session.
    pub session: usize,
    /// 1-based epoch within the session.
    pub epoch: usize,
    pub max_epochs: usize,
    /// Mean per-sample squared error over the training split.
    pub train_error: f64,
    /// Previous train error minus this one; positive means improvement.
    pub train_delta: f64,
    pub test_error: Option<f64>,
    pub test_delta: Option<f64>,
    /// Wall-clock duration of this epoch in milliseconds.
    pub elapsed_ms: u64,
}
