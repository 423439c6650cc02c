/// Squared-error measurement of one forward wave against its desired outputs.
pub struct MseLoss;

impl MseLoss {
    /// Raw error injected at each output neuron: `activation - desired`.
    pub fn raw_errors(outputs: &[f64], desired: &[f64]) -> Vec<f64> {
        outputs.iter().zip(desired).map(|(a, d)| a - d).collect()
    }

    /// Mean of the squared raw errors; zero when there are no outputs.
    pub fn mean_squared(raw_errors: &[f64]) -> f64 {
        if raw_errors.is_empty() {
            return 0.0;
        }
        raw_errors.iter().map(|e| e * e).sum::<f64>() / raw_errors.len() as f64
    }

    /// Per-sample performance: mean over the outputs of `(activation - desired)²`.
    pub fn loss(outputs: &[f64], desired: &[f64]) -> f64 {
        MseLoss::mean_squared(&MseLoss::raw_errors(outputs, desired))
    }
}
