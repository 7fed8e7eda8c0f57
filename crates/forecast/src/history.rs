//! Fixed-size rolling history of corrected pressure samples.
//!
//! The ring lives in retained memory and never grows.  One sample is
//! pushed per wake, so with a 15 minute wake interval the 12 slots span
//! three hours.  Unset slots are `None`.

/// Number of slots in the ring.
pub const HISTORY_LEN: usize = 12;

/// Assumed time between wakes.  Only documents what the window means.
pub const SAMPLE_INTERVAL_MIN: u32 = 15;

/// Lag from the just-written slot to the 3 hour reference slot.
pub const REFERENCE_LAG: usize = 1;

#[derive(Debug, Clone, PartialEq)]
pub struct RollingHistory {
    slots: [Option<f64>; HISTORY_LEN],
    cursor: usize,
}

impl Default for RollingHistory {
    fn default() -> Self {
        Self::new()
    }
}

impl RollingHistory {
    pub fn new() -> Self {
        Self {
            slots: [None; HISTORY_LEN],
            cursor: 0,
        }
    }

    /// Rebuild a ring from persisted parts.  Returns `None` when the cursor
    /// is out of range.
    pub fn from_parts(slots: [Option<f64>; HISTORY_LEN], cursor: usize) -> Option<Self> {
        (cursor < HISTORY_LEN).then_some(Self { slots, cursor })
    }

    pub fn slots(&self) -> &[Option<f64>; HISTORY_LEN] {
        &self.slots
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Write `value` at the cursor, advance the cursor and return the index
    /// just written.
    pub fn push(&mut self, value: f64) -> usize {
        let written = self.cursor;
        self.slots[written] = Some(value);
        self.cursor = (written + 1) % HISTORY_LEN;
        written
    }

    /// Value `lag_slots` after `current_index` (mod ring size), or `None` if
    /// that slot has never been written.
    pub fn read_lagged_by(&self, current_index: usize, lag_slots: usize) -> Option<f64> {
        self.slots[(current_index % HISTORY_LEN + lag_slots % HISTORY_LEN) % HISTORY_LEN]
    }

    /// Oldest written sample, walking the ring from the cursor.
    pub fn oldest(&self) -> Option<f64> {
        (0..HISTORY_LEN)
            .map(|i| self.slots[(self.cursor + i) % HISTORY_LEN])
            .find_map(|s| s)
    }

    /// Most recently written sample.
    pub fn latest(&self) -> Option<f64> {
        self.slots[(self.cursor + HISTORY_LEN - 1) % HISTORY_LEN]
    }

    /// Number of slots holding a sample.
    pub fn len(&self) -> usize {
        self.slots.iter().filter(|s| s.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_full(&self) -> bool {
        self.len() == HISTORY_LEN
    }

    /// Reset every slot to unset and the cursor to zero.
    pub fn clear(&mut self) {
        *self = Self::new();
    }
}

// ===========================================================================
// Tests
// ===========================================================================
