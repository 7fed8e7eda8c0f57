//! Single-variable Kalman-style filter for raw station pressure.
//!
//! The filter is never retained across power cycles.  A fresh one is
//! seeded every wake from the rolling history (see [`crate::cycle`]).

/// Error covariance of a freshly seeded filter.
const INITIAL_COVARIANCE: f64 = 1.0;

#[derive(Debug, Clone, PartialEq)]
pub struct Estimator {
    process_noise: f64,
    measurement_noise: f64,
    estimate: f64,
    covariance: f64,
    gain: f64,
}

impl Estimator {
    pub fn new(process_noise: f64, measurement_noise: f64, seed: f64) -> Self {
        Self {
            process_noise,
            measurement_noise,
            estimate: seed,
            covariance: INITIAL_COVARIANCE,
            gain: 0.0,
        }
    }

    /// Fold one measurement into the estimate and return the new estimate.
    pub fn update(&mut self, measurement: f64) -> f64 {
        // Predict.
        self.covariance += self.process_noise;

        // Correct.
        self.gain = self.covariance / (self.covariance + self.measurement_noise);
        self.estimate += self.gain * (measurement - self.estimate);
        self.covariance *= 1.0 - self.gain;

        self.estimate
    }

    pub fn estimate(&self) -> f64 {
        self.estimate
    }

    pub fn covariance(&self) -> f64 {
        self.covariance
    }

    pub fn gain(&self) -> f64 {
        self.gain
    }
}

// ===========================================================================
// Tests
// ===========================================================================
