//! Availability windows and candidate meeting slots.
//!
//! A [`TimeSlot`] is a half-open window `[start, end)` on a single calendar date,
//! with both bounds expressed as minute offsets from midnight. The same type is
//! used for a participant's declared availability and for candidate/accepted
//! meeting windows.

use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Number of minutes in a calendar day; the largest valid `end` offset.
pub const MINUTES_PER_DAY: u32 = 24 * 60;

/// A window `[start, end)` on `date`, in minutes from midnight.
///
/// Serialized with `start`/`end` as `"HH:MM"` strings (`"24:00"` is accepted as
/// the end of the day). Plain minute integers are also accepted on input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TimeSlot {
    pub date: NaiveDate,
    #[serde(with = "clock")]
    pub start: u32,
    #[serde(with = "clock")]
    pub end: u32,
}

impl TimeSlot {
    /// Build a window from minute offsets. No validation is performed; see
    /// [`TimeSlot::defect`].
    pub const fn new(date: NaiveDate, start: u32, end: u32) -> Self {
        Self { date, start, end }
    }

    /// Build a window from whole-hour offsets, e.g. `hours(date, 9, 12)` for 09:00-12:00.
    ///
    /// Offsets saturate at `u32::MAX`; anything past 24 yields a window that
    /// [`TimeSlot::defect`] reports as malformed.
    pub const fn hours(date: NaiveDate, start_hour: u32, end_hour: u32) -> Self {
        Self::new(date, start_hour.saturating_mul(60), end_hour.saturating_mul(60))
    }

    /// The window of `duration_minutes` beginning at `start`. The end saturates
    /// at `u32::MAX`.
    pub const fn starting_at(date: NaiveDate, start: u32, duration_minutes: u32) -> Self {
        Self::new(date, start, start.saturating_add(duration_minutes))
    }

    pub const fn duration_minutes(&self) -> u32 {
        self.end.saturating_sub(self.start)
    }

    /// Why this window cannot be used, or `None` if it is well-formed.
    ///
    /// A window is well-formed when `start < end` and it ends no later than
    /// midnight of the following day (`end <= 24:00`).
    pub fn defect(&self) -> Option<String> {
        if self.start >= self.end {
            Some(format!(
                "window {} has start {} not before end {}",
                self,
                clock::format(self.start),
                clock::format(self.end)
            ))
        } else if self.end > MINUTES_PER_DAY {
            Some(format!("window {} extends past the end of {}", self, self.date))
        } else {
            None
        }
    }

    pub fn is_valid(&self) -> bool {
        self.defect().is_none()
    }

    /// True iff `window` lies entirely inside this window on the same date.
    pub fn contains(&self, window: &TimeSlot) -> bool {
        window.date == self.date && self.start <= window.start && self.end >= window.end
    }

    /// True iff the two windows share at least one minute.
    ///
    /// Adjacent windows (one ends exactly when the other starts) do not overlap.
    pub fn overlaps(&self, other: &TimeSlot) -> bool {
        self.date == other.date && self.start < other.end && other.start < self.end
    }
}

impl fmt::Display for TimeSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {}-{}",
            self.date,
            clock::format(self.start),
            clock::format(self.end)
        )
    }
}

/// Candidate start points for a meeting of `duration_minutes` across `windows`.
///
/// For every window `[s, e)` the points `s` and `max(s, e - duration)` are
/// candidates: the set of windows covering `[t, t + duration)` only changes when
/// `t` crosses a window boundary, so the earliest feasible start is always one of
/// these points. Points whose slot would run past midnight are dropped. The
/// result is sorted ascending and deduplicated.
pub fn candidate_start_points(windows: &[TimeSlot], duration_minutes: u32) -> Vec<u32> {
    let mut points: Vec<u32> = windows
        .iter()
        .flat_map(|w| [w.start, w.start.max(w.end.saturating_sub(duration_minutes))])
        .filter(|&t| t.saturating_add(duration_minutes) <= MINUTES_PER_DAY)
        .collect();

    points.sort_unstable();
    points.dedup();
    points
}

/// `"HH:MM"` (de)serialization for minute offsets.
pub(crate) mod clock {
    use serde::de::{self, Visitor};
    use serde::{Deserializer, Serializer};
    use std::fmt;

    pub fn format(minutes: u32) -> String {
        format!("{:02}:{:02}", minutes / 60, minutes % 60)
    }

    pub fn parse(text: &str) -> Option<u32> {
        let (h, m) = text.trim().split_once(':')?;
        let hours: u32 = h.parse().ok()?;
        let minutes: u32 = m.parse().ok()?;
        if minutes >= 60 {
            return None;
        }
        hours.checked_mul(60)?.checked_add(minutes)
    }

    pub fn serialize<S: Serializer>(minutes: &u32, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&format(*minutes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u32, D::Error> {
        struct ClockVisitor;

        impl Visitor<'_> for ClockVisitor {
            type Value = u32;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a \"HH:MM\" time of day or a number of minutes since midnight")
            }

            fn visit_str<E: de::Error>(self, v: &str) -> Result<u32, E> {
                parse(v).ok_or_else(|| E::custom(format!("invalid time of day: '{}'", v)))
            }

            fn visit_u64<E: de::Error>(self, v: u64) -> Result<u32, E> {
                u32::try_from(v).map_err(|_| E::custom(format!("minute offset out of range: {}", v)))
            }

            fn visit_i64<E: de::Error>(self, v: i64) -> Result<u32, E> {
                u32::try_from(v).map_err(|_| E::custom(format!("minute offset out of range: {}", v)))
            }
        }

        deserializer.deserialize_any(ClockVisitor)
    }
}
