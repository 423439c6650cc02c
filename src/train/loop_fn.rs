use std::time::Instant;

use rand::seq::SliceRandom;
use tracing::{debug, info, warn};

use crate::data::samples::SampleSet;
use crate::error::Result;
use crate::network::network::{Network, WeightSnapshot};
use crate::train::early_stop::{IncreaseWindow, TestTrend};
use crate::train::epoch_stats::EpochStats;
use crate::train::report::{StopReason, TrainReport};
use crate::train::train_config::TrainConfig;
use crate::train::trainer::{evaluate, train_epoch};

// ---------------------------------------------------------------------------
// Public entry point
// ---------------------------------------------------------------------------

/// Trains `network` on `samples` and reports how the final session ended.
///
/// Each session shuffles all samples, splits them into a training prefix of
/// `⌊len · train_ratio⌋` samples and a test suffix, resets every weight and
/// runs epochs until one of:
/// - the train error changes by at most `config.epsilon`,
/// - `config.max_epochs` is reached,
/// - the test error rose in every epoch of the last
///   `config.test_increase_window` epochs (weights are rolled back to where
///   the rise began).
///
/// A diverging activation aborts the epoch, redraws the weights and restarts
/// the session's epoch count; it is not a restart. Once a session ends with
/// its train error above the restart threshold, a new session starts while
/// the restart budget lasts.
///
/// # Errors
/// Configuration and topology errors are returned immediately. Divergence is
/// only returned through `TrainReport::stop_reason` once the reset budget of
/// the final session is spent.
pub fn train_loop(network: &mut Network, samples: &SampleSet, config: &TrainConfig) -> Result<TrainReport> {
    config.validate()?;
    let train_len = samples.train_len(config.train_ratio)?;
    samples.check_arity(network.input_ids().len(), network.output_ids().len())?;
    network.check_registered()?;

    let mut order: Vec<usize> = (0..samples.len()).collect();
    let mut restarts = 0;
    let mut divergence_resets = 0;
    let mut session = 0;

    loop {
        session += 1;

        // Synchronized shuffle: inputs and desired outputs share the index.
        order.shuffle(network.rng_mut());
        let mut train_order = order[..train_len].to_vec();
        let test_order = &order[train_len..];
        network.reset_weights();
        info!(session, train = train_order.len(), test = test_order.len(), "starting training session");

        let outcome = run_session(network, samples, &mut train_order, test_order, config, session)?;
        divergence_resets += outcome.divergence_resets;
        info!(
            session,
            epochs = outcome.epochs,
            train_error = outcome.train_error,
            stop_reason = ?outcome.stop_reason,
            "training session finished"
        );

        // Negated so an infinite or NaN error counts as stuck.
        let stuck = !(outcome.train_error <= config.restart.threshold);
        if config.restart.enabled && stuck && restarts < config.restart.max_restarts {
            restarts += 1;
            warn!(
                session,
                train_error = outcome.train_error,
                threshold = config.restart.threshold,
                restarts,
                "training looks stuck; restarting from fresh weights"
            );
            continue;
        }

        return Ok(TrainReport {
            train_error: outcome.train_error,
            test_error: outcome.test_error,
            epochs: outcome.epochs,
            sessions: session,
            restarts,
            divergence_resets,
            stop_reason: outcome.stop_reason,
        });
    }
}

// ---------------------------------------------------------------------------
// Private helpers
// ---------------------------------------------------------------------------

struct SessionOutcome {
    train_error: f64,
    test_error: Option<f64>,
    epochs: usize,
    divergence_resets: usize,
    stop_reason: StopReason,
}

/// Epoch-loop state that a divergence reset throws away.
struct SessionState {
    epoch: usize,
    train_error: f64,
    test_error: Option<f64>,
    window: IncreaseWindow,
    // Weights evaluated in the last epoch whose test error did not rise.
    steady_weights: Option<WeightSnapshot>,
}

impl SessionState {
    fn new(window: usize) -> SessionState {
        SessionState {
            epoch: 0,
            train_error: f64::INFINITY,
            test_error: None,
            window: IncreaseWindow::new(window),
            steady_weights: None,
        }
    }
}

fn run_session(
    network: &mut Network,
    samples: &SampleSet,
    train_order: &mut [usize],
    test_order: &[usize],
    config: &TrainConfig,
    session: usize,
) -> Result<SessionOutcome> {
    let mut state = SessionState::new(config.test_increase_window);
    let mut divergence_resets = 0;

    loop {
        match run_epoch(network, samples, train_order, test_order, config, session, &mut state) {
            Ok(None) => {}
            Ok(Some(stop_reason)) => {
                return Ok(SessionOutcome {
                    train_error: state.train_error,
                    test_error: state.test_error,
                    epochs: state.epoch,
                    divergence_resets,
                    stop_reason,
                });
            }
            Err(err) if err.is_recoverable() => {
                divergence_resets += 1;
                if divergence_resets > config.max_divergence_resets {
                    warn!(session, divergence_resets, "divergence reset budget exhausted; ending session");
                    return Ok(SessionOutcome {
                        train_error: f64::INFINITY,
                        test_error: None,
                        epochs: state.epoch,
                        divergence_resets,
                        stop_reason: StopReason::Diverged,
                    });
                }
                warn!(session, epoch = state.epoch, %err, "resetting weights and restarting the epoch count");
                network.reset_weights();
                state = SessionState::new(config.test_increase_window);
            }
            Err(err) => return Err(err),
        }
    }
}

/// Runs one epoch. Returns the reason to stop the session, if any.
fn run_epoch(
    network: &mut Network,
    samples: &SampleSet,
    train_order: &mut [usize],
    test_order: &[usize],
    config: &TrainConfig,
    session: usize,
    state: &mut SessionState,
) -> Result<Option<StopReason>> {
    state.epoch += 1;
    let t_start = Instant::now();

    if config.shuffle_each_epoch {
        train_order.shuffle(network.rng_mut());
    }

    // ── Test split, before this epoch's updates ───────────────────────────
    let mut test_delta = None;
    if !test_order.is_empty() {
        let test_error = evaluate(network, samples, test_order)?;
        test_delta = state.test_error.map(|prev| prev - test_error);
        state.test_error = Some(test_error);

        match state.window.record(test_error) {
            TestTrend::Steady => state.steady_weights = Some(network.weights_snapshot()),
            TestTrend::Increased => {}
            TestTrend::Overfitting => {
                if let Some(weights) = &state.steady_weights {
                    network.restore_weights(weights)?;
                    // Report what the restored weights achieve.
                    state.train_error = evaluate(network, samples, train_order)?;
                    state.test_error = Some(evaluate(network, samples, test_order)?);
                }
                warn!(
                    session,
                    epoch = state.epoch,
                    test_error,
                    window = config.test_increase_window,
                    "test error kept rising; restored weights from before the rise"
                );
                // Nothing was trained this epoch.
                state.epoch -= 1;
                return Ok(Some(StopReason::Overfitting));
            }
        }
    }

    // ── Training split ────────────────────────────────────────────────────
    let train_error = train_epoch(network, samples, train_order, config.mode)?;
    let train_delta = state.train_error - train_error;
    state.train_error = train_error;

    let stats = EpochStats {
        session,
        epoch: state.epoch,
        max_epochs: config.max_epochs,
        train_error,
        train_delta,
        test_error: state.test_error,
        test_delta,
        elapsed_ms: t_start.elapsed().as_millis() as u64,
    };
    debug!(
        session,
        epoch = stats.epoch,
        train_error,
        train_delta,
        test_error = ?stats.test_error,
        test_delta = ?stats.test_delta,
        "epoch complete"
    );
    if let Some(ref tx) = config.progress_tx {
        // A dropped receiver only silences reporting.
        let _ = tx.send(stats);
    }

    if train_delta.abs() <= config.epsilon {
        return Ok(Some(StopReason::Converged));
    }
    if state.epoch >= config.max_epochs {
        return Ok(Some(StopReason::MaxEpochs));
    }
    Ok(None)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::NetworkError;
    use crate::loss::mse::MseLoss;
    use crate::network::network_config::NetworkConfig;
    use crate::network::topology::TopologySpec;
    use rand::seq::SliceRandom;
    use crate::train::train_config::{RestartPolicy, TrainMode};
    use std::sync::mpsc;

    fn identity_samples(n: usize) -> SampleSet {
        let inputs: Vec<Vec<f64>> = (0..n).map(|i| vec![(i % 2) as f64]).collect();
        let desired = inputs.clone();
        SampleSet::new(inputs, desired).unwrap()
    }

    #[test]
    fn ratio_without_training_samples_fails_up_front() {
        let mut network = TopologySpec::new(vec![1, 1]).build(NetworkConfig::seeded(3)).unwrap();
        let config = TrainConfig::new(0.1, 10, TrainMode::Online);
        let err = train_loop(&mut network, &identity_samples(4), &config).unwrap_err();
        assert!(matches!(err, crate::error::NetworkError::EmptyTrainingSet { .. }));
    }

    #[test]
    fn epoch_limit_ends_a_single_session() {
        let mut network = TopologySpec::new(vec![1, 1]).build(NetworkConfig::seeded(3)).unwrap();
        let config = TrainConfig {
            epsilon: 0.0,
            restart: RestartPolicy::disabled(),
            ..TrainConfig::new(1.0, 25, TrainMode::Online)
        };
        let report = train_loop(&mut network, &identity_samples(4), &config).unwrap();
        assert_eq!(report.sessions, 1);
        assert_eq!(report.restarts, 0);
        assert!(report.epochs <= 25);
        assert!(report.test_error.is_none());
        assert!(report.train_error.is_finite());
    }

    #[test]
    fn progress_channel_receives_every_epoch() {
        let mut network = TopologySpec::new(vec![1, 1]).build(NetworkConfig::seeded(5)).unwrap();
        let (tx, rx) = mpsc::channel();
        let config = TrainConfig {
            epsilon: 0.0,
            restart: RestartPolicy::disabled(),
            progress_tx: Some(tx),
            ..TrainConfig::new(0.5, 12, TrainMode::Batch)
        };
        let report = train_loop(&mut network, &identity_samples(8), &config).unwrap();
        drop(config);

        let stats: Vec<EpochStats> = rx.iter().collect();
        assert_eq!(stats.len(), report.epochs);
        assert!(stats.iter().all(|s| s.session == 1 && s.test_error.is_some()));
        assert_eq!(stats.last().unwrap().train_error, report.train_error);
    }

    #[test]
    fn rising_test_error_restores_the_steady_weights() {
        // Same input, opposite targets: training on either sample pushes the
        // other one's error up in every epoch.
        let samples = SampleSet::new(vec![vec![1.0], vec![1.0]], vec![vec![1.0], vec![0.0]]).unwrap();
        let mut network = TopologySpec::new(vec![1, 1]).build(NetworkConfig::seeded(17)).unwrap();

        // Replay the session start: shuffle, then fresh weights.
        let mut steady = network.clone();
        let mut order = vec![0, 1];
        order.shuffle(steady.rng_mut());
        steady.reset_weights();

        let config = TrainConfig {
            test_increase_window: 1,
            restart: RestartPolicy::disabled(),
            ..TrainConfig::new(0.5, 1000, TrainMode::Online)
        };
        let report = train_loop(&mut network, &samples, &config).unwrap();

        assert_eq!(report.stop_reason, StopReason::Overfitting);
        assert_eq!(report.sessions, 1);
        assert_eq!(report.epochs, 1);
        assert_eq!(network.weights_snapshot(), steady.weights_snapshot());

        let trained = order[0];
        let out = steady.test(samples.input(trained)).unwrap();
        assert_eq!(report.train_error, MseLoss::loss(&out, samples.desired(trained)));
    }

    #[test]
    fn training_resumes_after_a_diverging_draw() {
        // Both weighted terms together overflow for about one draw in five.
        // Any other draw saturates the output at 0 or 1; at 1 the error is
        // zero and training converges, at 0 the next update overflows.
        let samples = SampleSet::new(vec![vec![1.7e308, 1.7e308]], vec![vec![1.0]]).unwrap();
        let build = |seed| TopologySpec::new(vec![2, 1]).build(NetworkConfig::seeded(seed)).unwrap();
        let diverges_on_first_draw = |network: &Network| {
            let mut replay = network.clone();
            let mut order = vec![0];
            order.shuffle(replay.rng_mut());
            replay.reset_weights();
            matches!(replay.test(samples.input(0)), Err(NetworkError::ActivationDiverged { .. }))
        };
        let mut network = (0..500u64)
            .map(build)
            .find(|network| diverges_on_first_draw(network))
            .expect("some seed diverges on its first draw");

        let report = train_loop(&mut network, &samples, &TrainConfig::new(1.0, 100, TrainMode::Online)).unwrap();
        assert!(report.divergence_resets >= 1);
        assert_eq!(report.sessions, 1);
        assert_eq!(report.restarts, 0);
        assert_eq!(report.stop_reason, StopReason::Converged);
        assert_eq!(report.train_error, 0.0);
    }
}
