use serde::Serialize;

/// Why the final session stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
    /// Train error changed by no more than epsilon.
    Converged,
    MaxEpochs,
    /// Test error rose for a full window; weights were rolled back.
    Overfitting,
    /// Divergence resets ran out.
    Diverged,
}

/// Summary of a whole `train_loop` run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrainReport {
    /// Train error of the last completed epoch; infinite when the final
    /// session never completed one.
    pub train_error: f64,
    pub test_error: Option<f64>,
    /// Epochs completed in the final session.
    pub epochs: usize,
    pub sessions: usize,
    pub restarts: usize,
    /// Divergence resets over all sessions.
    pub divergence_resets: usize,
    pub stop_reason: StopReason,
}
