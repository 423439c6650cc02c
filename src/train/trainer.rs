use crate::{
    data::samples::SampleSet,
    error::Result,
    loss::mse::MseLoss,
    network::network::Network,
    train::train_config::TrainMode,
};

/// Runs one epoch over the samples picked by `order` and returns the mean
/// per-sample error measured on the forward waves.
///
/// Online mode updates the weights after every sample. Batch mode collects
/// every sample's gradients and applies their mean once, at the end of the
/// epoch.
pub fn train_epoch(
    network: &mut Network,
    samples: &SampleSet,
    order: &[usize],
    mode: TrainMode,
) -> Result<f64> {
    let mut total_error = 0.0;

    for &idx in order {
        // Forward pass
        network.forward(samples.input(idx))?;
        let output = network.output_activations();
        let raw_errors = MseLoss::raw_errors(&output, samples.desired(idx));
        total_error += MseLoss::mean_squared(&raw_errors);

        // Backward pass
        match mode {
            TrainMode::Online => network.backward(&raw_errors)?,
            TrainMode::Batch => network.accumulate_backward(&raw_errors)?,
        }
    }

    if mode == TrainMode::Batch {
        network.apply_gradients();
    }

    Ok(total_error / order.len().max(1) as f64)
}

/// Mean per-sample error over the samples picked by `order`, forward waves
/// only.
pub fn evaluate(network: &mut Network, samples: &SampleSet, order: &[usize]) -> Result<f64> {
    if order.is_empty() {
        return Ok(0.0);
    }
    let mut total = 0.0;
    for &idx in order {
        let output = network.test(samples.input(idx))?;
        total += MseLoss::loss(&output, samples.desired(idx));
    }
    Ok(total / order.len() as f64)
}
