//! Fixed site configuration for the decision core, with validation.

use anyhow::{bail, Result};
use serde::Deserialize;

use crate::history::{HISTORY_LEN, SAMPLE_INTERVAL_MIN};

/// Lowest and highest site altitudes accepted (meters).
const MIN_ALTITUDE_M: f64 = -500.0;
const MAX_ALTITUDE_M: f64 = 9000.0;

const DEFAULT_PROCESS_NOISE: f64 = 0.01;
const DEFAULT_MEASUREMENT_NOISE: f64 = 0.25;

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SiteConfig {
    /// Height of the sensor above sea level.
    pub altitude_m: f64,
    /// Estimator process noise `q`.
    pub process_noise: f64,
    /// Estimator measurement noise `r`.
    pub measurement_noise: f64,
    /// Minutes between wakes.  The history window is `12 * sample_interval_min`.
    pub sample_interval_min: u32,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            altitude_m: 0.0,
            process_noise: DEFAULT_PROCESS_NOISE,
            measurement_noise: DEFAULT_MEASUREMENT_NOISE,
            sample_interval_min: SAMPLE_INTERVAL_MIN,
        }
    }
}

impl SiteConfig {
    /// Time covered by the full rolling history.
    pub fn window_minutes(&self) -> u32 {
        HISTORY_LEN as u32 * self.sample_interval_min
    }

    /// Validate every field.  Returns an error listing all violations.
    pub fn validate(&self) -> Result<()> {
        let mut errors: Vec<String> = Vec::new();

        if !self.altitude_m.is_finite()
            || !(MIN_ALTITUDE_M..=MAX_ALTITUDE_M).contains(&self.altitude_m)
        {
            errors.push(format!(
                "altitude_m {} out of range [{MIN_ALTITUDE_M}, {MAX_ALTITUDE_M}]",
                self.altitude_m
            ));
        }

        if !(self.process_noise.is_finite() && self.process_noise > 0.0) {
            errors.push(format!(
                "process_noise must be positive, got {}",
                self.process_noise
            ));
        }
        if !(self.measurement_noise.is_finite() && self.measurement_noise > 0.0) {
            errors.push(format!(
                "measurement_noise must be positive, got {}",
                self.measurement_noise
            ));
        }

        if self.sample_interval_min == 0 {
            errors.push("sample_interval_min must be positive, got 0".to_string());
        }

        if errors.is_empty() {
            Ok(())
        } else {
            bail!(
                "site config validation failed ({} error{}):\n  - {}",
                errors.len(),
                if errors.len() == 1 { "" } else { "s" },
                errors.join("\n  - ")
            );
        }
    }
}

// ===========================================================================
// Tests
// ===========================================================================
