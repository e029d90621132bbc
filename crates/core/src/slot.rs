//! Time-slot model
//!
//! A booking occupies a whole number of 30-minute blocks inside the daily
//! operating window `[08:00, 22:00]`. Times are court-local wall-clock
//! values; the store never converts them.

use std::fmt;

use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime, Timelike};
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// Length of one block in minutes
pub const BLOCK_MINUTES: i64 = 30;
/// Fewest blocks a booking may span
pub const MIN_BLOCKS: u8 = 1;
/// Most blocks a booking may span (3 hours)
pub const MAX_BLOCKS: u8 = 6;
/// First hour a booking may start
pub const OPENING_HOUR: u32 = 8;
/// Hour by which every booking must have ended
pub const CLOSING_HOUR: u32 = 22;

/// Longest possible booking, used to bound range scans
pub fn max_booking_length() -> Duration {
    Duration::minutes(BLOCK_MINUTES * MAX_BLOCKS as i64)
}

/// Half-open interval `[start, end)` occupied by a booking
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TimeWindow {
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
}

impl TimeWindow {
    pub fn new(start: NaiveDateTime, end: NaiveDateTime) -> Self {
        debug_assert!(start < end, "empty window {start} .. {end}");
        Self { start, end }
    }

    /// Window starting at `start` spanning `blocks` blocks.
    ///
    /// Panics if the end falls outside chrono's range; untrusted input goes
    /// through [`validate_footprint`].
    pub fn from_blocks(start: NaiveDateTime, blocks: u8) -> Self {
        Self::new(start, start + Duration::minutes(BLOCK_MINUTES * blocks as i64))
    }

    /// The single overlap primitive used by every conflict check.
    ///
    /// Adjacent windows (`a.end == b.start`) do not overlap.
    pub fn overlaps(&self, other: &TimeWindow) -> bool {
        self.start < other.end && other.start < self.end
    }

    pub fn duration(&self) -> Duration {
        self.end - self.start
    }

    /// Whole blocks covered by this window
    pub fn blocks(&self) -> i64 {
        self.duration().num_minutes() / BLOCK_MINUTES
    }

}

impl fmt::Display for TimeWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {}-{}",
            self.start.format("%Y-%m-%d"),
            self.start.format("%H:%M"),
            self.end.format("%H:%M")
        )
    }
}

/// Validate a proposed footprint and produce its canonical window.
///
/// Seconds and sub-seconds of `start` are dropped. Violations are reported,
/// never clamped.
pub fn validate_footprint(
    start: NaiveDateTime,
    duration_blocks: u8,
) -> Result<TimeWindow, ValidationError> {
    if !(MIN_BLOCKS..=MAX_BLOCKS).contains(&duration_blocks) {
        return Err(ValidationError::InvalidDuration {
            blocks: duration_blocks,
        });
    }

    let start = truncate_to_minute(start);

    if start.minute() != 0 && start.minute() != 30 {
        return Err(ValidationError::MisalignedStart { start });
    }

    let day = start.date();
    if start < opening_time(day) || start >= closing_time(day) {
        return Err(ValidationError::StartOutsideHours { start });
    }

    // On the last representable day the end may not exist at all
    let end = start
        .checked_add_signed(Duration::minutes(BLOCK_MINUTES * duration_blocks as i64))
        .ok_or(ValidationError::EndsAfterClose {
            end: NaiveDateTime::MAX,
        })?;

    // Closing is measured on the start's own day, so a window that
    // wraps past midnight is rejected too.
    if end > closing_time(day) {
        return Err(ValidationError::EndsAfterClose { end });
    }

    Ok(TimeWindow::new(start, end))
}

/// Opening instant of the given day
pub fn opening_time(date: NaiveDate) -> NaiveDateTime {
    date.and_time(NaiveTime::MIN) + Duration::hours(OPENING_HOUR as i64)
}

/// Closing instant of the given day
pub fn closing_time(date: NaiveDate) -> NaiveDateTime {
    date.and_time(NaiveTime::MIN) + Duration::hours(CLOSING_HOUR as i64)
}

fn truncate_to_minute(t: NaiveDateTime) -> NaiveDateTime {
    t.with_nanosecond(0)
        .and_then(|t| t.with_second(0))
        .unwrap_or(t)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn at(s: &str) -> NaiveDateTime {
        NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S").unwrap()
    }

    #[test]
    fn test_valid_footprint() {
        let window = validate_footprint(at("2026-10-20 10:00:00"), 2).unwrap();
        assert_eq!(window.start, at("2026-10-20 10:00:00"));
        assert_eq!(window.end, at("2026-10-20 11:00:00"));
        assert_eq!(window.blocks(), 2);
    }

    #[test]
    fn test_seconds_truncated() {
        let window = validate_footprint(at("2026-10-20 10:30:45"), 1).unwrap();
        assert_eq!(window.start, at("2026-10-20 10:30:00"));
        assert_eq!(window.end, at("2026-10-20 11:00:00"));
    }

    #[test]
    fn test_duration_bounds() {
        assert!(matches!(
            validate_footprint(at("2026-10-20 10:00:00"), 0),
            Err(ValidationError::InvalidDuration { blocks: 0 })
        ));
        assert!(matches!(
            validate_footprint(at("2026-10-20 10:00:00"), 7),
            Err(ValidationError::InvalidDuration { blocks: 7 })
        ));
        assert!(validate_footprint(at("2026-10-20 10:00:00"), 6).is_ok());
    }

    #[test]
    fn test_misaligned_start() {
        assert!(matches!(
            validate_footprint(at("2026-10-20 10:15:00"), 2),
            Err(ValidationError::MisalignedStart { .. })
        ));
    }

    #[test]
    fn test_before_opening() {
        assert!(matches!(
            validate_footprint(at("2026-10-20 07:30:00"), 2),
            Err(ValidationError::StartOutsideHours { .. })
        ));
    }

    #[test]
    fn test_end_exactly_at_close_allowed() {
        let window = validate_footprint(at("2026-10-20 21:00:00"), 2).unwrap();
        assert_eq!(window.end, at("2026-10-20 22:00:00"));
    }

    #[test]
    fn test_end_past_close_rejected() {
        assert!(matches!(
            validate_footprint(at("2026-10-20 21:00:00"), 3),
            Err(ValidationError::EndsAfterClose { .. })
        ));
        assert!(matches!(
            validate_footprint(at("2026-10-20 22:00:00"), 1),
            Err(ValidationError::StartOutsideHours { .. })
        ));
    }

    #[test]
    fn test_adjacent_windows_do_not_overlap() {
        let a = TimeWindow::from_blocks(at("2026-10-20 10:00:00"), 2);
        let b = TimeWindow::from_blocks(at("2026-10-20 11:00:00"), 2);
        assert!(!a.overlaps(&b));
        assert!(!b.overlaps(&a));
    }

    #[test]
    fn test_partial_overlap() {
        let a = TimeWindow::from_blocks(at("2026-10-20 10:00:00"), 2);
        let b = TimeWindow::from_blocks(at("2026-10-20 10:30:00"), 2);
        assert!(a.overlaps(&b));
    }

    #[test]
    fn test_last_representable_day() {
        let start = NaiveDate::MAX.and_hms_opt(21, 0, 0).unwrap();
        assert!(matches!(
            validate_footprint(start, 6),
            Err(ValidationError::EndsAfterClose { .. })
        ));
        let window = validate_footprint(start, 2).unwrap();
        assert_eq!(window.end, NaiveDate::MAX.and_hms_opt(22, 0, 0).unwrap());
    }

    #[test]
    fn test_display() {
        let w = TimeWindow::from_blocks(at("2026-10-20 09:30:00"), 3);
        assert_eq!(w.to_string(), "2026-10-20 09:30-11:00");
    }

    fn arb_window() -> impl Strategy<Value = TimeWindow> {
        (0i64..2_000, 1u8..=6).prop_map(|(offset, blocks)| {
            let base = at("2026-01-01 00:00:00");
            TimeWindow::from_blocks(base + Duration::minutes(offset * 15), blocks)
        })
    }

    proptest! {
        #[test]
        fn prop_overlap_symmetric(a in arb_window(), b in arb_window()) {
            prop_assert_eq!(a.overlaps(&b), b.overlaps(&a));
        }

        #[test]
        fn prop_overlap_reflexive(a in arb_window()) {
            prop_assert!(a.overlaps(&a));
        }

        #[test]
        fn prop_adjacent_never_overlaps(a in arb_window(), blocks in 1u8..=6) {
            let b = TimeWindow::from_blocks(a.end, blocks);
            prop_assert!(!a.overlaps(&b));
        }

        #[test]
        fn prop_accepted_footprints_obey_rules(
            day in 0i64..365,
            minute_of_day in 0i64..(24 * 60),
            blocks in 0u8..10,
        ) {
            let start = at("2026-01-01 00:00:00") + Duration::days(day) + Duration::minutes(minute_of_day);
            if let Ok(w) = validate_footprint(start, blocks) {
                prop_assert!((MIN_BLOCKS..=MAX_BLOCKS).contains(&blocks));
                prop_assert!(w.start.minute() == 0 || w.start.minute() == 30);
                prop_assert!(w.start.hour() >= OPENING_HOUR);
                prop_assert!(w.end <= closing_time(w.start.date()));
                prop_assert_eq!(w.blocks(), blocks as i64);
            }
        }
    }
}
