//! Wall-clock access: unix time and the calendar month for the core.

use time::OffsetDateTime;

use crate::config::TimeSource;

/// 2024-01-01T00:00:00Z.  Anything earlier means the clock was never set
/// (e.g. an RTC that lost power) and cannot be trusted for the month.
const EARLIEST_VALID_UNIX: i64 = 1_704_067_200;

pub fn now_unix() -> i64 {
    OffsetDateTime::now_utc().unix_timestamp()
}

/// Calendar month (1-12) for `ts`, or `None` when the clock looks unset.
pub fn month_from_unix(ts: i64) -> Option<u8> {
    if ts < EARLIEST_VALID_UNIX {
        return None;
    }
    OffsetDateTime::from_unix_timestamp(ts)
        .ok()
        .map(|dt| u8::from(dt.month()))
}

/// Month reported by the configured time source this cycle.
pub fn current_month(source: TimeSource, now: i64) -> Option<u8> {
    match source {
        TimeSource::System => {
            let month = month_from_unix(now);
            if month.is_none() {
                tracing::warn!(ts = now, "system clock not synchronised; month unknown");
            }
            month
        }
        TimeSource::Disabled => None,
    }
}

// ===========================================================================
// Tests
// ===========================================================================
