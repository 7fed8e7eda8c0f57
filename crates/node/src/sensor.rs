//! Raw reading acquisition for one wake cycle.
//!
//! `SENSOR_READING="<temp_c>,<pressure_hpa>"` always wins.  Otherwise the
//! `sim` feature samples the weather simulator; without it the variable is
//! required.  `BATTERY_V` supplies the battery sense value when set.

use anyhow::{ensure, Context, Result};

#[cfg(feature = "sim")]
use crate::sim::{Scenario, WeatherSim};

/// Raw station values handed to the decision core.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RawReading {
    pub temperature_c: f64,
    pub pressure_hpa: f64,
    /// Pass-through for the report.  Not used by the core.
    pub battery_v: Option<f32>,
}

/// Acquire this cycle's reading.  `altitude_m` shapes simulated values.
pub fn acquire(altitude_m: f64, now_s: f64) -> Result<RawReading> {
    let battery_override = match std::env::var("BATTERY_V") {
        Ok(v) => Some(parse_battery(&v)?),
        Err(_) => None,
    };

    if let Ok(v) = std::env::var("SENSOR_READING") {
        let (temperature_c, pressure_hpa) = parse_reading(&v)?;
        return Ok(RawReading {
            temperature_c,
            pressure_hpa,
            battery_v: battery_override,
        });
    }

    fallback_source(altitude_m, now_s, battery_override)
}

#[cfg(feature = "sim")]
fn fallback_source(altitude_m: f64, now_s: f64, battery_v: Option<f32>) -> Result<RawReading> {
    let scenario = Scenario::from_str_lossy(&std::env::var("SIM_SCENARIO").unwrap_or_default());
    let r = WeatherSim::new(scenario, altitude_m).sample(now_s);
    tracing::debug!(
        %scenario,
        temperature_c = r.temperature_c,
        pressure_hpa = r.pressure_hpa,
        "simulated reading"
    );
    Ok(RawReading {
        temperature_c: r.temperature_c,
        pressure_hpa: r.pressure_hpa,
        battery_v: battery_v.or(Some(r.battery_v)),
    })
}

#[cfg(not(feature = "sim"))]
fn fallback_source(_altitude_m: f64, _now_s: f64, _battery_v: Option<f32>) -> Result<RawReading> {
    anyhow::bail!("no sensor available: set SENSOR_READING=<temp_c>,<pressure_hpa>")
}

/// Parse `"<temp_c>,<pressure_hpa>"`.  Rejects non-finite values so NaN never
/// reaches the estimator.
pub fn parse_reading(s: &str) -> Result<(f64, f64)> {
    let mut parts = s.split(',');
    let (Some(t), Some(p), None) = (parts.next(), parts.next(), parts.next()) else {
        anyhow::bail!("expected <temp_c>,<pressure_hpa>, got {s:?}");
    };

    let temperature_c: f64 = t
        .trim()
        .parse()
        .with_context(|| format!("invalid temperature in {s:?}"))?;
    let pressure_hpa: f64 = p
        .trim()
        .parse()
        .with_context(|| format!("invalid pressure in {s:?}"))?;

    ensure!(temperature_c.is_finite(), "temperature is not finite: {temperature_c}");
    ensure!(
        pressure_hpa.is_finite() && pressure_hpa > 0.0,
        "pressure must be finite and positive: {pressure_hpa}"
    );

    Ok((temperature_c, pressure_hpa))
}

fn parse_battery(s: &str) -> Result<f32> {
    let v: f32 = s
        .trim()
        .parse()
        .with_context(|| format!("invalid BATTERY_V: {s:?}"))?;
    ensure!(v.is_finite() && v >= 0.0, "BATTERY_V out of range: {v}");
    Ok(v)
}

// ===========================================================================
// Tests
// ===========================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_reading_valid() {
        assert_eq!(parse_reading("25.0,950.0").unwrap(), (25.0, 950.0));
    }

    #[test]
    fn parse_reading_with_whitespace() {
        assert_eq!(parse_reading(" -3.5 , 1001.25 ").unwrap(), (-3.5, 1001.25));
    }

    #[test]
    fn parse_reading_missing_pressure() {
        assert!(parse_reading("25.0").is_err());
    }

    #[test]
    fn parse_reading_extra_field() {
        assert!(parse_reading("25.0,950.0,1").is_err());
    }

    #[test]
    fn parse_reading_garbage() {
        assert!(parse_reading("warm,high").is_err());
    }

    #[test]
    fn parse_reading_rejects_nan() {
        assert!(parse_reading("NaN,950").is_err());
        assert!(parse_reading("25,inf").is_err());
    }

    #[test]
    fn parse_reading_rejects_non_positive_pressure() {
        assert!(parse_reading("25,0").is_err());
        assert!(parse_reading("25,-950").is_err());
    }

    #[test]
    fn parse_battery_valid() {
        assert_eq!(parse_battery("3.92").unwrap(), 3.92);
    }

    #[test]
    fn parse_battery_invalid() {
        assert!(parse_battery("full").is_err());
        assert!(parse_battery("-1").is_err());
    }
}
