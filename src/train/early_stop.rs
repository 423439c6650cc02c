use std::collections::VecDeque;

/// How the test error moved in the latest epoch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TestTrend {
    /// Not higher than the previous epoch (or the first measurement).
    Steady,
    Increased,
    /// Increased in every epoch of the full window.
    Overfitting,
}

/// Sliding window over the last `size` epochs recording whether the test
/// error went up.
#[derive(Debug, Clone)]
pub struct IncreaseWindow {
    size: usize,
    history: VecDeque<bool>,
    previous: Option<f64>,
}

impl IncreaseWindow {
    pub fn new(size: usize) -> IncreaseWindow {
        IncreaseWindow {
            size: size.max(1),
            history: VecDeque::with_capacity(size.max(1)),
            previous: None,
        }
    }

    pub fn record(&mut self, test_error: f64) -> TestTrend {
        let increased = self.previous.map_or(false, |prev| test_error > prev);
        self.previous = Some(test_error);

        if self.history.len() == self.size {
            self.history.pop_front();
        }
        self.history.push_back(increased);

        if self.history.len() == self.size && self.history.iter().all(|&up| up) {
            TestTrend::Overfitting
        } else if increased {
            TestTrend::Increased
        } else {
            TestTrend::Steady
        }
    }
}
