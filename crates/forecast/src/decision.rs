//! Irrigation recommendation derived from the weather trend.

use serde::{Serialize, Serializer};
use std::fmt;

use crate::trend::Trend;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    /// Rain is likely; skip watering.
    Forbid,
    Allow,
}

impl Decision {
    /// Wire code: 0 forbid, 1 allow.
    pub fn code(self) -> u8 {
        match self {
            Self::Forbid => 0,
            Self::Allow => 1,
        }
    }

    pub fn allows_irrigation(self) -> bool {
        self == Self::Allow
    }
}

impl fmt::Display for Decision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Forbid => write!(f, "forbid"),
            Self::Allow => write!(f, "allow"),
        }
    }
}

impl Serialize for Decision {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u8(self.code())
    }
}

pub fn decide(trend: Trend) -> Decision {
    match trend {
        Trend::RainLikely => Decision::Forbid,
        Trend::Stable | Trend::Unsettled => Decision::Allow,
    }
}

// ===========================================================================
// Tests
// ===========================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::trend::classify;

    #[test]
    fn rain_forbids_irrigation() {
        assert_eq!(decide(Trend::RainLikely), Decision::Forbid);
        assert_eq!(decide(Trend::RainLikely).code(), 0);
    }

    #[test]
    fn stable_and_unsettled_allow_irrigation() {
        assert_eq!(decide(Trend::Stable).code(), 1);
        assert_eq!(decide(Trend::Unsettled).code(), 1);
        assert!(decide(Trend::Unsettled).allows_irrigation());
    }

    #[test]
    fn rain_forbids_for_every_month_and_pressure() {
        for month in 0..=12 {
            for p in [990.0, 1000.0, 1009.0, 1012.0, 1014.0] {
                let trend = classify(p, p + 3.0, month);
                assert_eq!(trend, Trend::RainLikely);
                assert_eq!(decide(trend), Decision::Forbid, "p={p} month={month}");
            }
        }
    }

    #[test]
    fn display_and_serialize() {
        assert_eq!(Decision::Allow.to_string(), "allow");
        assert_eq!(serde_json::to_string(&Decision::Forbid).unwrap(), "0");
    }
}
