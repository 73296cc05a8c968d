//! Query windows from a calendar date and fractional hours.
//!
//! `10.5` means 10:30. The hour part is truncated toward zero and the
//! remaining fraction is multiplied by 60 and truncated, so windows have
//! whole-minute granularity. Windows never wrap past midnight: an end hour
//! of 24 is the midnight that closes the selected date, anything reversed
//! is rejected.

use chrono::{NaiveDate, NaiveDateTime, NaiveTime, TimeDelta};
use serde::{Deserialize, Serialize};

use crate::{Result, Trajectory, TrajectoryError};

/// A closed time interval `[from, to]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct QueryWindow {
    pub from: NaiveDateTime,
    pub to: NaiveDateTime,
}

impl QueryWindow {
    /// Create a window, rejecting empty or reversed intervals.
    pub fn new(from: NaiveDateTime, to: NaiveDateTime) -> Result<Self> {
        if from >= to {
            return Err(TrajectoryError::InvalidRange { from, to });
        }
        Ok(Self { from, to })
    }

    /// Inclusive overlap test between `[start, end]` and this window.
    pub fn overlaps(&self, start: NaiveDateTime, end: NaiveDateTime) -> bool {
        start <= self.to && end >= self.from
    }

    pub fn overlaps_trajectory(&self, trajectory: &Trajectory) -> bool {
        self.overlaps(trajectory.start_time(), trajectory.end_time())
    }

    pub fn contains(&self, instant: NaiveDateTime) -> bool {
        instant >= self.from && instant <= self.to
    }
}

/// Translate `date` plus `[start_hour, end_hour)` into absolute instants.
///
/// `start_hour` must lie in `[0, 24)` and `end_hour` in `(0, 24]`.
pub fn window(date: NaiveDate, start_hour: f64, end_hour: f64) -> Result<QueryWindow> {
    if !(0.0..24.0).contains(&start_hour) {
        return Err(TrajectoryError::InvalidHour {
            name: "start",
            value: start_hour,
            allowed: "[0, 24)",
        });
    }
    if !(end_hour > 0.0 && end_hour <= 24.0) {
        return Err(TrajectoryError::InvalidHour {
            name: "end",
            value: end_hour,
            allowed: "(0, 24]",
        });
    }
    let midnight = date.and_time(NaiveTime::MIN);
    match (instant_at(date, start_hour), instant_at(date, end_hour)) {
        (Some(from), Some(to)) => QueryWindow::new(from, to),
        // The closing midnight of the last representable date.
        (from, _) => Err(TrajectoryError::InvalidRange {
            from: from.unwrap_or(midnight),
            to: NaiveDateTime::MAX,
        }),
    }
}

/// Split a fractional hour into whole hours and whole minutes.
pub fn hour_minute(hour: f64) -> (u32, u32) {
    let hours = hour.trunc();
    let minutes = ((hour - hours) * 60.0).trunc();
    (hours as u32, minutes as u32)
}

/// `None` when the instant is past the last representable date.
fn instant_at(date: NaiveDate, hour: f64) -> Option<NaiveDateTime> {
    let (hours, minutes) = hour_minute(hour);
    date.and_time(NaiveTime::MIN)
        .checked_add_signed(TimeDelta::hours(i64::from(hours)))?
        .checked_add_signed(TimeDelta::minutes(i64::from(minutes)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hour_minute_truncates() {
        assert_eq!(hour_minute(10.5), (10, 30));
        assert_eq!(hour_minute(0.0), (0, 0));
        assert_eq!(hour_minute(23.999), (23, 59));
    }

    #[test]
    fn test_instant_past_last_date() {
        assert_eq!(instant_at(NaiveDate::MAX, 24.0), None);
        assert!(instant_at(NaiveDate::MAX, 23.5).is_some());
    }
}
