//! Short-term weather trend from the current sea-level pressure and its
//! value three hours ago.
//!
//! Rules, first match wins (`d = now - 3h_ago`, hPa):
//!
//! ```text
//! 1. now < 1010 and d <= -2        -> RainLikely
//! 2. d <= -1 and now < 1015        -> RainLikely
//! 3. -1 < d < 1                    -> Stable if now >= 1015, else Unsettled
//! 4. d >= 1                        -> Stable if now >= 1013, else Unsettled
//! 5. otherwise                     -> Unsettled
//! ```

use serde::{Serialize, Serializer};
use std::fmt;

/// Below this a sharp fall means rain (rule 1).
const LOW_PRESSURE_HPA: f64 = 1010.0;
/// Ceiling for the moderate-fall rain rule and floor for a stable flat trend.
const FAIR_PRESSURE_HPA: f64 = 1015.0;
/// Floor for a stable rising trend.
const RISING_FAIR_PRESSURE_HPA: f64 = 1013.0;

const SHARP_FALL_HPA: f64 = -2.0;
const FALL_HPA: f64 = -1.0;
const RISE_HPA: f64 = 1.0;

/// Month value meaning "unknown".
pub const MONTH_UNKNOWN: u8 = 0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trend {
    Stable,
    Unsettled,
    RainLikely,
}

impl Trend {
    /// Wire code: 0 stable, 1 unsettled, 2 rain likely.
    pub fn code(self) -> u8 {
        match self {
            Self::Stable => 0,
            Self::Unsettled => 1,
            Self::RainLikely => 2,
        }
    }
}

impl fmt::Display for Trend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Stable => write!(f, "stable"),
            Self::Unsettled => write!(f, "unsettled"),
            Self::RainLikely => write!(f, "rain-likely"),
        }
    }
}

impl Serialize for Trend {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u8(self.code())
    }
}

/// Classify the 3 hour pressure tendency.
///
/// `month` is 1-12, or [`MONTH_UNKNOWN`].  It is accepted so a seasonal
/// adjustment can be added later, but no rule currently depends on it.
pub fn classify(p_now: f64, p_3h_ago: f64, month: u8) -> Trend {
    let delta = p_now - p_3h_ago;
    tracing::trace!(p_now, delta, month, "classifying pressure trend");

    if p_now < LOW_PRESSURE_HPA && delta <= SHARP_FALL_HPA {
        return Trend::RainLikely;
    }

    if delta <= FALL_HPA && p_now < FAIR_PRESSURE_HPA {
        // Seasonal and non-seasonal cases agree here for now.
        return Trend::RainLikely;
    }

    if delta > FALL_HPA && delta < RISE_HPA {
        return if p_now >= FAIR_PRESSURE_HPA {
            Trend::Stable
        } else {
            Trend::Unsettled
        };
    }

    if delta >= RISE_HPA {
        return if p_now >= RISING_FAIR_PRESSURE_HPA {
            Trend::Stable
        } else {
            Trend::Unsettled
        };
    }

    Trend::Unsettled
}

// ===========================================================================
// Tests
// ===========================================================================
