//! State that survives power-off between wake cycles.
//!
//! Persisted as a flat record:
//!
//! ```text
//! { pressure_history: [f64 | null; 12], cursor, initialized, last_known_month }
//! ```
//!
//! Loading and saving the record is the host's job; the core only reads
//! and mutates it through [`crate::run_cycle`].

use anyhow::{ensure, Error};
use serde::{Deserialize, Serialize};

use crate::history::{RollingHistory, HISTORY_LEN};
use crate::trend::MONTH_UNKNOWN;

// ---------------------------------------------------------------------------
// Season cache
// ---------------------------------------------------------------------------

/// Last calendar month confirmed by a time source, or 0 when never known.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SeasonContext {
    last_known_month: u8,
}

impl SeasonContext {
    pub fn last_known_month(&self) -> u8 {
        self.last_known_month
    }

    /// Month to use this cycle.  A valid observed month refreshes the cache;
    /// anything else falls back to the cached value.
    pub fn resolve(&mut self, observed: Option<u8>) -> u8 {
        match observed {
            Some(m) if (1..=12).contains(&m) => {
                self.last_known_month = m;
            }
            Some(m) => {
                tracing::warn!(
                    month = m,
                    cached = self.last_known_month,
                    "ignoring out-of-range month"
                );
            }
            None => {}
        }
        self.last_known_month
    }
}

// ---------------------------------------------------------------------------
// Retained record
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(try_from = "RetainedRecord", into = "RetainedRecord")]
pub struct RetainedState {
    pub history: RollingHistory,
    pub initialized: bool,
    pub season: SeasonContext,
}

/// On-disk layout of [`RetainedState`].
#[derive(Serialize, Deserialize)]
struct RetainedRecord {
    pressure_history: [Option<f64>; HISTORY_LEN],
    cursor: usize,
    initialized: bool,
    last_known_month: u8,
}

impl RetainedState {
    /// Clear the history the first time the node ever boots.  Later calls are
    /// no-ops so a warm restart keeps its samples.  Returns whether the state
    /// was cleared.
    pub fn ensure_initialized(&mut self) -> bool {
        if self.initialized {
            return false;
        }
        self.history.clear();
        self.season = SeasonContext::default();
        self.initialized = true;
        tracing::info!(slots = HISTORY_LEN, "retained state initialised");
        true
    }
}

impl TryFrom<RetainedRecord> for RetainedState {
    type Error = Error;

    fn try_from(rec: RetainedRecord) -> Result<Self, Self::Error> {
        ensure!(
            rec.last_known_month <= 12,
            "last_known_month {} out of range [0, 12]",
            rec.last_known_month
        );
        ensure!(
            rec.pressure_history
                .iter()
                .flatten()
                .all(|v| v.is_finite()),
            "pressure_history holds a non-finite sample"
        );
        let history = RollingHistory::from_parts(rec.pressure_history, rec.cursor)
            .ok_or_else(|| {
                anyhow::anyhow!("cursor {} out of range [0, {HISTORY_LEN})", rec.cursor)
            })?;

        let last_known_month = if rec.initialized {
            rec.last_known_month
        } else {
            MONTH_UNKNOWN
        };

        Ok(Self {
            history,
            initialized: rec.initialized,
            season: SeasonContext { last_known_month },
        })
    }
}

impl From<RetainedState> for RetainedRecord {
    fn from(state: RetainedState) -> Self {
        Self {
            pressure_history: *state.history.slots(),
            cursor: state.history.cursor(),
            initialized: state.initialized,
            last_known_month: state.season.last_known_month,
        }
    }
}

// ===========================================================================
// Tests
// ===========================================================================

#[cfg(test)]
mod tests {
    use super::*;

    // -- SeasonContext ----------------------------------------------------

    #[test]
    fn unknown_season_resolves_to_zero() {
        let mut s = SeasonContext::default();
        assert_eq!(s.resolve(None), 0);
    }

    #[test]
    fn observed_month_is_cached() {
        let mut s = SeasonContext::default();
        assert_eq!(s.resolve(Some(7)), 7);
        assert_eq!(s.resolve(None), 7);
        assert_eq!(s.resolve(Some(8)), 8);
        assert_eq!(s.last_known_month(), 8);
    }

    #[test]
    fn invalid_month_keeps_cache() {
        let mut s = SeasonContext::default();
        s.resolve(Some(3));
        assert_eq!(s.resolve(Some(13)), 3);
        assert_eq!(s.resolve(Some(0)), 3);
    }

    // -- Initialisation ---------------------------------------------------

    #[test]
    fn first_boot_clears_once() {
        let mut st = RetainedState::default();
        assert!(st.ensure_initialized());
        st.history.push(1012.0);
        assert!(!st.ensure_initialized());
        assert_eq!(st.history.len(), 1, "warm restart must keep samples");
    }

    // -- Serialization ----------------------------------------------------

    #[test]
    fn serializes_as_flat_record() {
        let mut st = RetainedState::default();
        st.ensure_initialized();
        st.history.push(1013.5);
        st.season.resolve(Some(5));

        let json = serde_json::to_value(&st).unwrap();
        let obj = json.as_object().unwrap();
        assert_eq!(obj.len(), 4);
        assert_eq!(json["cursor"], 1);
        assert_eq!(json["initialized"], true);
        assert_eq!(json["last_known_month"], 5);
        assert_eq!(json["pressure_history"][0], 1013.5);
        assert!(json["pressure_history"][1].is_null());
        assert_eq!(json["pressure_history"].as_array().unwrap().len(), 12);
    }

    #[test]
    fn survives_save_and_load() {
        let mut st = RetainedState::default();
        st.ensure_initialized();
        for v in [1010.0, 1011.0, 1012.5] {
            st.history.push(v);
        }
        st.season.resolve(Some(11));

        let text = serde_json::to_string(&st).unwrap();
        let back: RetainedState = serde_json::from_str(&text).unwrap();
        assert_eq!(back, st);
    }

    #[test]
    fn rejects_cursor_out_of_range() {
        let json = r#"{"pressure_history":[null,null,null,null,null,null,null,null,null,null,null,null],
                       "cursor":12,"initialized":true,"last_known_month":0}"#;
        let err = serde_json::from_str::<RetainedState>(json).unwrap_err();
        assert!(err.to_string().contains("cursor"), "{err}");
    }

    #[test]
    fn rejects_month_out_of_range() {
        let json = r#"{"pressure_history":[null,null,null,null,null,null,null,null,null,null,null,null],
                       "cursor":0,"initialized":true,"last_known_month":13}"#;
        assert!(serde_json::from_str::<RetainedState>(json).is_err());
    }

    #[test]
    fn rejects_wrong_slot_count() {
        let json = r#"{"pressure_history":[null,null],"cursor":0,"initialized":true,"last_known_month":0}"#;
        assert!(serde_json::from_str::<RetainedState>(json).is_err());
    }
}
