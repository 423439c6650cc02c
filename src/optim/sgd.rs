/// Fixed-rate gradient descent.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sgd {
    pub learning_rate: f64,
}

impl Sgd {
    pub fn new(learning_rate: f64) -> Sgd {
        Sgd { learning_rate }
    }

    /// Weight change for one gradient: `-learning_rate * gradient`.
    pub fn step(&self, gradient: f64) -> f64 {
        -self.learning_rate * gradient
    }
}
