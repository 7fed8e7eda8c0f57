//! Station-to-sea-level pressure correction (hypsometric formula).
//!
//! ```text
//! P_sea = P_station * (1 - L*h / (T + L*h + 273.15)) ^ -5.257
//! ```
//!
//! with `L` the standard temperature lapse rate (K/m), `h` the site
//! altitude in meters and `T` the station temperature in Celsius.

/// Standard temperature lapse rate in K/m.
const LAPSE_RATE: f64 = 0.0065;

/// Offset between Celsius and Kelvin.
const KELVIN_OFFSET: f64 = 273.15;

/// Barometric exponent (g*M / R*L).
const EXPONENT: f64 = 5.257;

fn denominator(t_celsius: f64, altitude_m: f64) -> f64 {
    t_celsius + LAPSE_RATE * altitude_m + KELVIN_OFFSET
}

/// Multiplier taking station pressure to sea-level pressure.
fn sea_level_factor(t_celsius: f64, altitude_m: f64) -> f64 {
    let lh = LAPSE_RATE * altitude_m;
    (1.0 - lh / denominator(t_celsius, altitude_m)).powf(-EXPONENT)
}

/// True when `t_celsius` keeps the correction defined at `altitude_m`.
pub fn is_plausible_temperature(t_celsius: f64, altitude_m: f64) -> bool {
    t_celsius.is_finite() && denominator(t_celsius, altitude_m) > 0.0
}

/// Convert a station pressure (hPa) to the equivalent sea-level pressure.
///
/// Callers must check [`is_plausible_temperature`] first; the result is
/// meaningless for a non-positive denominator.
pub fn to_sea_level(p_station_hpa: f64, t_celsius: f64, altitude_m: f64) -> f64 {
    p_station_hpa * sea_level_factor(t_celsius, altitude_m)
}

/// Inverse of [`to_sea_level`] for the same temperature and altitude.
pub fn to_station_level(p_sea_hpa: f64, t_celsius: f64, altitude_m: f64) -> f64 {
    p_sea_hpa / sea_level_factor(t_celsius, altitude_m)
}

// ===========================================================================
// Tests
// ===========================================================================
