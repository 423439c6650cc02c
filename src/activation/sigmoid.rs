use std::f64::consts::E;

/// Logistic squashing function `1 / (1 + e^-x)`.
pub fn sigmoid(x: f64) -> f64 {
    1.0 / (1.0 + E.powf(-x))
}

/// Derivative of the sigmoid expressed through its own output:
/// σ'(z) = σ(z)·(1 − σ(z)).
///
/// Taking the activation instead of the pre-activation `z` means a neuron
/// only has to remember what it emitted on the forward wave.
pub fn sigmoid_derivative(activation: f64) -> f64 {
    activation * (1.0 - activation)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn centre_and_symmetry() {
        assert_eq!(sigmoid(0.0), 0.5);
        assert!((sigmoid(2.0) + sigmoid(-2.0) - 1.0).abs() < 1e-12);
        assert_eq!(sigmoid_derivative(0.5), 0.25);
    }

    #[test]
    fn infinite_sums_saturate_instead_of_failing() {
        assert_eq!(sigmoid(f64::INFINITY), 1.0);
        assert_eq!(sigmoid(f64::NEG_INFINITY), 0.0);
        assert!(sigmoid(f64::NAN).is_nan());
    }

    proptest! {
        #[test]
        fn output_stays_in_open_unit_interval(x in -30.0f64..30.0f64) {
            let y = sigmoid(x);
            prop_assert!(y > 0.0 && y < 1.0, "sigmoid({}) = {}", x, y);
        }

        #[test]
        fn derivative_peaks_at_one_quarter(x in -30.0f64..30.0f64) {
            let d = sigmoid_derivative(sigmoid(x));
            prop_assert!(d > 0.0 && d <= 0.25);
        }
    }
}
