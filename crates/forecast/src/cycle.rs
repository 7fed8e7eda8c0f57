//! One wake cycle: raw reading in, forecast and irrigation decision out.
//!
//! Order of operations against retained state is fixed:
//!
//! ```text
//! init-once -> resolve month -> seed from history -> estimate -> correct
//!   -> push -> read reference (lag 1 from the slot just written)
//!   -> classify -> decide
//! ```
//!
//! The reference is read relative to the index returned by the push, so the
//! sample written this cycle is never its own "3 hours ago".

use anyhow::{ensure, Result};

use crate::altitude::{is_plausible_temperature, to_sea_level, to_station_level};
use crate::config::SiteConfig;
use crate::decision::{decide, Decision};
use crate::estimator::Estimator;
use crate::history::REFERENCE_LAG;
use crate::retained::RetainedState;
use crate::trend::{classify, Trend};

/// Per-wake inputs supplied by the sensor and time collaborators.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CycleInputs {
    pub temperature_c: f64,
    pub pressure_hpa: f64,
    /// Calendar month from a time source, if one answered this cycle.
    pub month: Option<u8>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CycleResult {
    /// Smoothed station pressure before altitude correction.
    pub smoothed_station_hpa: f64,
    /// Smoothed, altitude-corrected pressure.  Pushed into the history.
    pub sea_level_hpa: f64,
    /// Pressure compared against to get the 3 hour tendency.
    pub reference_hpa: f64,
    /// True when the history was not yet full and the current value stood in
    /// for the reference.
    pub reference_fallback: bool,
    /// Month used for classification (0 when unknown).
    pub month: u8,
    pub trend: Trend,
    pub decision: Decision,
}

/// Run the forecast pipeline once, mutating `state` in place.
///
/// Rejects non-finite readings and temperatures outside the range where
/// the altitude correction is defined.  On error `state` is untouched.
pub fn run_cycle(
    state: &mut RetainedState,
    site: &SiteConfig,
    inputs: CycleInputs,
) -> Result<CycleResult> {
    let CycleInputs {
        temperature_c,
        pressure_hpa,
        month,
    } = inputs;

    ensure!(
        pressure_hpa.is_finite() && pressure_hpa > 0.0,
        "invalid pressure reading: {pressure_hpa}"
    );
    ensure!(
        is_plausible_temperature(temperature_c, site.altitude_m),
        "invalid temperature reading: {temperature_c}"
    );

    state.ensure_initialized();
    let month = state.season.resolve(month);

    // Filter state is not retained; seed it from history every wake.
    let seed = state
        .history
        .oldest()
        .map(|sea| to_station_level(sea, temperature_c, site.altitude_m))
        .unwrap_or(pressure_hpa);
    let mut estimator = Estimator::new(site.process_noise, site.measurement_noise, seed);
    let smoothed_station_hpa = estimator.update(pressure_hpa);

    let sea_level_hpa = to_sea_level(smoothed_station_hpa, temperature_c, site.altitude_m);

    let current = state.history.push(sea_level_hpa);
    let lagged = state.history.read_lagged_by(current, REFERENCE_LAG);
    let reference_fallback = lagged.is_none();
    let reference_hpa = lagged.unwrap_or(sea_level_hpa);

    let trend = classify(sea_level_hpa, reference_hpa, month);
    let decision = decide(trend);

    tracing::info!(
        temperature_c,
        raw_hpa = pressure_hpa,
        sea_level_hpa,
        reference_hpa,
        reference_fallback,
        month,
        %trend,
        %decision,
        "cycle complete"
    );

    Ok(CycleResult {
        smoothed_station_hpa,
        sea_level_hpa,
        reference_hpa,
        reference_fallback,
        month,
        trend,
        decision,
    })
}

// ===========================================================================
// Tests
// ===========================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::history::{RollingHistory, HISTORY_LEN};

    fn site(altitude_m: f64) -> SiteConfig {
        SiteConfig {
            altitude_m,
            ..SiteConfig::default()
        }
    }

    fn inputs(temperature_c: f64, pressure_hpa: f64, month: Option<u8>) -> CycleInputs {
        CycleInputs {
            temperature_c,
            pressure_hpa,
            month,
        }
    }

    // -- End-to-end scenarios -----------------------------------------------

    #[test]
    fn first_boot_at_reference_site() {
        let mut state = RetainedState::default();
        let r = run_cycle(&mut state, &site(524.0), inputs(25.0, 950.0, None)).unwrap();

        // Seeded from the raw reading, so one update leaves it unchanged.
        assert_eq!(r.smoothed_station_hpa, 950.0);
        assert!((r.sea_level_hpa - 1008.4566).abs() < 1e-3, "{}", r.sea_level_hpa);
        assert!(r.reference_fallback);
        assert_eq!(r.reference_hpa, r.sea_level_hpa);
        assert_eq!(r.month, 0);
        // Flat trend below 1015 hPa.
        assert_eq!(r.trend, Trend::Unsettled);
        assert_eq!(r.trend.code(), 1);
        assert_eq!(r.decision.code(), 1);

        assert!(state.initialized);
        assert_eq!(state.history.len(), 1);
        assert_eq!(state.history.cursor(), 1);
    }

    #[test]
    fn falling_pressure_with_full_window_forbids_irrigation() {
        let samples = [
            1013.0, 1012.0, 1011.5, 1011.0, 1010.5, 1010.0, 1009.5, 1009.0, 1008.8, 1008.5,
            1008.2, 1008.0,
        ];
        let mut slots = [None; HISTORY_LEN];
        for (slot, v) in slots.iter_mut().zip(samples) {
            *slot = Some(v);
        }
        let mut state = RetainedState {
            history: RollingHistory::from_parts(slots, 0).unwrap(),
            initialized: true,
            ..RetainedState::default()
        };

        let r = run_cycle(&mut state, &site(0.0), inputs(18.0, 1008.0, Some(6))).unwrap();

        // Seed is the oldest sample (1013), pulled most of the way to 1008.
        assert!((r.sea_level_hpa - 1008.992).abs() < 1e-2, "{}", r.sea_level_hpa);
        assert!(!r.reference_fallback);
        assert_eq!(r.reference_hpa, 1012.0);
        assert_eq!(r.trend, Trend::RainLikely);
        assert_eq!(r.decision, Decision::Forbid);
        assert_eq!(r.month, 6);

        // The oldest slot was overwritten with this cycle's value.
        assert_eq!(state.history.slots()[0], Some(r.sea_level_hpa));
        assert_eq!(state.history.cursor(), 1);
    }

    #[test]
    fn steady_decline_over_thirteen_wakes() {
        let mut state = RetainedState::default();
        let site = site(0.0);
        let mut results = Vec::new();
        for i in 0..13 {
            let raw = 1020.0 - i as f64 * 15.0 / 12.0;
            results.push(run_cycle(&mut state, &site, inputs(15.0, raw, None)).unwrap());
        }

        // Window not yet populated: every reference is a fallback.
        for r in &results[..11] {
            assert!(r.reference_fallback);
            assert_ne!(r.trend, Trend::RainLikely);
        }
        assert_eq!(results[0].trend, Trend::Stable);
        assert_eq!(results[10].trend, Trend::Unsettled);

        // Twelfth and thirteenth wakes see a real 3 hour reference.
        for r in &results[11..] {
            assert!(!r.reference_fallback);
            assert_eq!(r.trend, Trend::RainLikely);
            assert_eq!(r.decision, Decision::Forbid);
        }
        assert_eq!(results[11].reference_hpa, 1020.0);
    }

    // -- Retained-state handling --------------------------------------------

    #[test]
    fn warm_restart_keeps_history() {
        let mut state = RetainedState::default();
        let site = site(0.0);
        run_cycle(&mut state, &site, inputs(20.0, 1015.0, None)).unwrap();
        run_cycle(&mut state, &site, inputs(20.0, 1015.0, None)).unwrap();
        assert_eq!(state.history.len(), 2);
    }

    #[test]
    fn seed_comes_from_history_not_raw_reading() {
        let mut state = RetainedState::default();
        let site = site(524.0);
        run_cycle(&mut state, &site, inputs(25.0, 950.0, None)).unwrap();

        // A spike is damped because the filter starts from the stored value.
        let r = run_cycle(&mut state, &site, inputs(25.0, 960.0, None)).unwrap();
        assert!(r.smoothed_station_hpa > 950.0);
        assert!(r.smoothed_station_hpa < 960.0);
    }

    #[test]
    fn seed_converted_back_to_station_level() {
        let mut state = RetainedState::default();
        let site = site(524.0);
        run_cycle(&mut state, &site, inputs(25.0, 950.0, None)).unwrap();
        let r = run_cycle(&mut state, &site, inputs(25.0, 950.0, None)).unwrap();
        assert!((r.smoothed_station_hpa - 950.0).abs() < 1e-9);
    }

    #[test]
    fn month_cached_between_wakes() {
        let mut state = RetainedState::default();
        let site = site(0.0);
        run_cycle(&mut state, &site, inputs(20.0, 1015.0, Some(4))).unwrap();
        let r = run_cycle(&mut state, &site, inputs(20.0, 1015.0, None)).unwrap();
        assert_eq!(r.month, 4);
        assert_eq!(state.season.last_known_month(), 4);
    }

    // -- Input validation ---------------------------------------------------

    #[test]
    fn non_finite_reading_rejected_without_touching_state() {
        let mut state = RetainedState::default();
        let site = site(524.0);
        run_cycle(&mut state, &site, inputs(25.0, 950.0, None)).unwrap();
        let before = state.clone();

        assert!(run_cycle(&mut state, &site, inputs(f64::NAN, 950.0, None)).is_err());
        assert!(run_cycle(&mut state, &site, inputs(25.0, f64::INFINITY, None)).is_err());
        assert!(run_cycle(&mut state, &site, inputs(25.0, 0.0, None)).is_err());
        assert_eq!(state, before);
    }

    #[test]
    fn implausible_temperature_rejected() {
        let mut state = RetainedState::default();
        let err = run_cycle(&mut state, &site(524.0), inputs(-400.0, 950.0, None)).unwrap_err();
        assert!(err.to_string().contains("temperature"), "{err}");
        assert!(!state.initialized);
    }
}
