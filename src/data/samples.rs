use crate::error::{NetworkError, Result};

/// Paired training data: `inputs[i]` is expected to produce `desired[i]`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SampleSet {
    inputs: Vec<Vec<f64>>,
    desired: Vec<Vec<f64>>,
}

impl SampleSet {
    pub fn new(inputs: Vec<Vec<f64>>, desired: Vec<Vec<f64>>) -> Result<SampleSet> {
        if inputs.len() != desired.len() {
            return Err(NetworkError::SampleCountMismatch {
                inputs: inputs.len(),
                outputs: desired.len(),
            });
        }
        Ok(SampleSet { inputs, desired })
    }

    pub fn len(&self) -> usize {
        self.inputs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inputs.is_empty()
    }

    pub fn input(&self, index: usize) -> &[f64] {
        &self.inputs[index]
    }

    pub fn desired(&self, index: usize) -> &[f64] {
        &self.desired[index]
    }

    pub fn push(&mut self, input: Vec<f64>, desired: Vec<f64>) {
        self.inputs.push(input);
        self.desired.push(desired);
    }

    /// Checks that every row fits a network with the given input and output
    /// counts.
    pub fn check_arity(&self, input_len: usize, output_len: usize) -> Result<()> {
        for (input, desired) in self.inputs.iter().zip(&self.desired) {
            if input.len() != input_len {
                return Err(NetworkError::ArityMismatch { expected: input_len, actual: input.len() });
            }
            if desired.len() != output_len {
                return Err(NetworkError::ArityMismatch {
                    expected: output_len,
                    actual: desired.len(),
                });
            }
        }
        Ok(())
    }

    /// Size of the training prefix for `train_ratio`: `⌊len · ratio⌋`.
    pub fn train_len(&self, train_ratio: f64) -> Result<usize> {
        if !(train_ratio > 0.0 && train_ratio <= 1.0) {
            return Err(NetworkError::InvalidTrainRatio { ratio: train_ratio });
        }
        let n = (self.len() as f64 * train_ratio).floor() as usize;
        if n == 0 {
            return Err(NetworkError::EmptyTrainingSet { samples: self.len(), ratio: train_ratio });
        }
        Ok(n)
    }
}
