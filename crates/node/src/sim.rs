//! Time-driven weather simulator for local development.
//!
//! The node process restarts every wake, so the simulator keeps no state
//! between samples.  Each reading is a function of wall-clock time plus
//! fresh noise:
//! - Slow sea-level pressure swing (weather systems passing)
//! - Diurnal temperature cycle
//! - Per-reading sensor noise and occasional spikes
//! - Battery sag over a weekly discharge cycle
//!
//! Sea-level pressure is converted to station pressure with the site
//! altitude, so the decision core sees what a real sensor would report.

use irrigation_forecast::altitude::to_station_level;
use std::f64::consts::PI;
use std::fmt;

const DAY_S: f64 = 86_400.0;
const WEEK_S: f64 = 7.0 * DAY_S;

const BATTERY_FULL_V: f64 = 4.15;
const BATTERY_EMPTY_V: f64 = 3.55;

// ---------------------------------------------------------------------------
// Gaussian approximation (no extra dependency)
// ---------------------------------------------------------------------------

/// Approximate a sample from N(0,1) using the Irwin-Hall method:
/// sum of 12 uniform [0,1) values minus 6.
fn approx_std_normal() -> f64 {
    let mut sum: f64 = 0.0;
    for _ in 0..12 {
        sum += fastrand::f64();
    }
    sum - 6.0
}

/// Sample from N(mean, sigma).
fn gaussian(mean: f64, sigma: f64) -> f64 {
    mean + sigma * approx_std_normal()
}

// ---------------------------------------------------------------------------
// Scenario presets
// ---------------------------------------------------------------------------

/// Pre-configured weather profiles selectable via `SIM_SCENARIO` env var.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scenario {
    /// High pressure with a gentle two-day swing.  Mostly stable trends.
    Fair,
    /// Almost flat pressure, low noise.  Good for checking the fallback
    /// window on a fresh node.
    Stable,
    /// Deep, fast 12 hour swing around low pressure.  Regularly drives the
    /// 3 hour tendency into the rain band.
    Storm,
    /// Moderate weather with heavy noise and ~10% spikes.  Exercises the
    /// estimator.
    Flaky,
}

impl Scenario {
    pub fn from_str_lossy(s: &str) -> Self {
        match s.to_ascii_lowercase().as_str() {
            "stable" => Self::Stable,
            "storm" => Self::Storm,
            "flaky" => Self::Flaky,
            _ => Self::Fair, // default
        }
    }
}

impl fmt::Display for Scenario {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Fair => write!(f, "fair"),
            Self::Stable => write!(f, "stable"),
            Self::Storm => write!(f, "storm"),
            Self::Flaky => write!(f, "flaky"),
        }
    }
}

// ---------------------------------------------------------------------------
// Simulator
// ---------------------------------------------------------------------------

/// One simulated sensor read.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SimReading {
    pub temperature_c: f64,
    pub pressure_hpa: f64,
    pub battery_v: f32,
}

pub struct WeatherSim {
    altitude_m: f64,

    // Sea-level pressure model
    base_hpa: f64,
    swing_hpa: f64,
    swing_period_s: f64,

    // Temperature model
    temp_mean_c: f64,
    temp_amplitude_c: f64,

    // Sensor imperfections
    pressure_noise_sigma: f64,
    temp_noise_sigma: f64,
    spike_prob: f32,
    spike_sigma: f64,
}

impl WeatherSim {
    pub fn new(scenario: Scenario, altitude_m: f64) -> Self {
        let (base, swing, period_h, noise, spike_prob, spike_sigma) = match scenario {
            Scenario::Fair => (1020.0, 3.0, 48.0, 0.15, 0.01_f32, 1.5),
            Scenario::Stable => (1016.0, 0.4, 24.0, 0.05, 0.0, 0.0),
            Scenario::Storm => (1008.0, 9.0, 12.0, 0.2, 0.02, 2.0),
            Scenario::Flaky => (1013.0, 2.0, 24.0, 0.8, 0.10, 4.0),
        };

        Self {
            altitude_m,
            base_hpa: base,
            swing_hpa: swing,
            swing_period_s: period_h * 3600.0,
            temp_mean_c: 17.0,
            temp_amplitude_c: 7.0,
            pressure_noise_sigma: noise,
            temp_noise_sigma: 0.2,
            spike_prob,
            spike_sigma,
        }
    }

    /// Noise-free sea-level pressure at `now_s` (seconds since the epoch).
    pub fn sea_level_at(&self, now_s: f64) -> f64 {
        let phase = 2.0 * PI * now_s / self.swing_period_s;
        self.base_hpa + self.swing_hpa * phase.sin()
    }

    /// Noise-free temperature at `now_s`.  Peaks mid-afternoon UTC.
    pub fn temperature_at(&self, now_s: f64) -> f64 {
        let phase = 2.0 * PI * (now_s - 9.0 * 3600.0) / DAY_S;
        self.temp_mean_c + self.temp_amplitude_c * phase.sin()
    }

    /// Produce one reading for wall-clock time `now_s`.
    pub fn sample(&self, now_s: f64) -> SimReading {
        let temperature_c = self.temperature_at(now_s) + gaussian(0.0, self.temp_noise_sigma);

        let station = to_station_level(self.sea_level_at(now_s), temperature_c, self.altitude_m);
        let noise = gaussian(0.0, self.pressure_noise_sigma);
        let spike = if fastrand::f32() < self.spike_prob {
            gaussian(0.0, self.spike_sigma)
        } else {
            0.0
        };

        // Sawtooth discharge, recharged once a week.
        let discharged = (now_s % WEEK_S) / WEEK_S;
        let battery_v = BATTERY_FULL_V - (BATTERY_FULL_V - BATTERY_EMPTY_V) * discharged;

        SimReading {
            temperature_c,
            pressure_hpa: station + noise + spike,
            battery_v: battery_v as f32,
        }
    }
}

// ===========================================================================
// Tests
// ===========================================================================
