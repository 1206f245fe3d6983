//! Schedule time handling.
//!
//! Feeds provide times as `H:MM:SS` strings counted from local midnight of
//! the service date. Trips crossing midnight carry hours ≥ 24 (`25:13:00`),
//! which `chrono` cannot represent, so schedule times live in a dedicated
//! seconds-from-midnight newtype and only service *dates* use `chrono`.

use std::fmt;
use std::ops::{Add, Sub};

use serde::{Deserialize, Serialize};

/// Error returned when parsing an invalid time string.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid time: {reason}")]
pub struct TimeError {
    reason: &'static str,
}

impl TimeError {
    fn new(reason: &'static str) -> Self {
        Self { reason }
    }
}

/// A schedule time in seconds from local midnight of the service date.
///
/// Values at or past 86 400 denote the small hours of the *next* calendar
/// day, as is conventional in schedule feeds.
///
/// # Examples
///
/// ```
/// use rail_planner::domain::DayTime;
///
/// let t = DayTime::parse("7:05:30").unwrap();
/// assert_eq!(t.seconds(), 7 * 3600 + 5 * 60 + 30);
///
/// // Hours past midnight are allowed
/// let late = DayTime::parse("25:13:00").unwrap();
/// assert_eq!(late.seconds(), 25 * 3600 + 13 * 60);
/// assert_eq!(late.to_string(), "01:13");
/// ```
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DayTime(i32);

impl DayTime {
    /// Construct from raw seconds since midnight.
    pub const fn from_seconds(seconds: i32) -> Self {
        Self(seconds)
    }

    /// Construct from an hour/minute pair.
    pub const fn from_hm(hour: i32, minute: i32) -> Self {
        Self(hour * 3600 + minute * 60)
    }

    /// Seconds since local midnight.
    pub const fn seconds(self) -> i32 {
        self.0
    }

    /// Parse `H:MM:SS` or `HH:MM:SS`, allowing hours ≥ 24.
    pub fn parse(s: &str) -> Result<Self, TimeError> {
        let mut parts = s.split(':');
        let hour = parse_component(parts.next(), 1)?;
        let minute = parse_component(parts.next(), 2)?;
        let second = parse_component(parts.next(), 2)?;
        if parts.next().is_some() {
            return Err(TimeError::new("expected H:MM:SS"));
        }
        if minute > 59 {
            return Err(TimeError::new("minute must be 0-59"));
        }
        if second > 59 {
            return Err(TimeError::new("second must be 0-59"));
        }
        Ok(Self(hour * 3600 + minute * 60 + second))
    }

    /// Parse `HH:MM` (query-parameter form). Hours ≥ 24 are rejected here:
    /// a request names a clock time, not a schedule offset.
    pub fn parse_hhmm(s: &str) -> Result<Self, TimeError> {
        let (h, m) = s.split_once(':').ok_or(TimeError::new("expected HH:MM"))?;
        let hour: i32 = h.parse().map_err(|_| TimeError::new("invalid hour"))?;
        let minute: i32 = m.parse().map_err(|_| TimeError::new("invalid minute"))?;
        if !(0..24).contains(&hour) {
            return Err(TimeError::new("hour must be 0-23"));
        }
        if !(0..60).contains(&minute) {
            return Err(TimeError::new("minute must be 0-59"));
        }
        Ok(Self(hour * 3600 + minute * 60))
    }

    /// Hour component (may be ≥ 24).
    pub const fn hour(self) -> i32 {
        self.0 / 3600
    }

    /// Minute component.
    pub const fn minute(self) -> i32 {
        (self.0 % 3600) / 60
    }
}

fn parse_component(part: Option<&str>, min_digits: usize) -> Result<i32, TimeError> {
    let part = part.ok_or(TimeError::new("expected H:MM:SS"))?;
    if part.len() < min_digits || !part.bytes().all(|b| b.is_ascii_digit()) {
        return Err(TimeError::new("invalid digits"));
    }
    part.parse().map_err(|_| TimeError::new("invalid digits"))
}

impl Add<i32> for DayTime {
    type Output = Self;

    /// Shift by a number of seconds.
    fn add(self, rhs: i32) -> Self {
        Self(self.0 + rhs)
    }
}

impl Sub<DayTime> for DayTime {
    type Output = i32;

    /// Difference in seconds.
    fn sub(self, rhs: DayTime) -> i32 {
        self.0 - rhs.0
    }
}

impl fmt::Display for DayTime {
    /// Clock-face rendering: hours are shown modulo 24.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}", self.hour().rem_euclid(24), self.minute())
    }
}

impl fmt::Debug for DayTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "DayTime({:02}:{:02}:{:02})",
            self.hour(),
            self.minute(),
            self.0 % 60
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_valid_times() {
        assert_eq!(DayTime::parse("0:00:00").unwrap().seconds(), 0);
        assert_eq!(DayTime::parse("7:05:30").unwrap().seconds(), 25530);
        assert_eq!(DayTime::parse("23:59:59").unwrap().seconds(), 86399);
    }

    #[test]
    fn parse_past_midnight() {
        let t = DayTime::parse("25:13:00").unwrap();
        assert_eq!(t.seconds(), 25 * 3600 + 13 * 60);
        assert_eq!(t.hour(), 25);

        // Some rotations run well past 24h
        assert!(DayTime::parse("47:59:00").is_ok());
    }

    #[test]
    fn parse_invalid() {
        assert!(DayTime::parse("").is_err());
        assert!(DayTime::parse("12").is_err());
        assert!(DayTime::parse("12:00").is_err());
        assert!(DayTime::parse("12:60:00").is_err());
        assert!(DayTime::parse("12:00:60").is_err());
        assert!(DayTime::parse("ab:00:00").is_err());
        assert!(DayTime::parse("12:00:00:00").is_err());
        assert!(DayTime::parse("-1:00:00").is_err());
    }

    #[test]
    fn parse_hhmm_rejects_past_midnight() {
        assert!(DayTime::parse_hhmm("23:59").is_ok());
        assert!(DayTime::parse_hhmm("24:00").is_err());
        assert!(DayTime::parse_hhmm("12:60").is_err());
        assert!(DayTime::parse_hhmm("1200").is_err());
    }

    #[test]
    fn display_wraps_at_midnight() {
        assert_eq!(DayTime::parse("25:13:00").unwrap().to_string(), "01:13");
        assert_eq!(DayTime::parse("09:05:00").unwrap().to_string(), "09:05");
    }

    #[test]
    fn arithmetic() {
        let t = DayTime::from_hm(8, 0);
        assert_eq!((t + 180).to_string(), "08:03");
        assert_eq!(DayTime::from_hm(9, 0) - t, 3600);
    }

    #[test]
    fn serde_as_integer_seconds() {
        let t = DayTime::from_hm(7, 0);
        assert_eq!(serde_json::to_string(&t).unwrap(), "25200");
        let back: DayTime = serde_json::from_str("25200").unwrap();
        assert_eq!(back, t);
    }
}
