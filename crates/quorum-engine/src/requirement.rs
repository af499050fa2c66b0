//! The meeting being negotiated.

use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::{Result, ScheduleError};
use crate::slot::MINUTES_PER_DAY;

/// What the caller wants scheduled: a meeting of `duration_minutes` on `date`
/// that at least `minimum_participants` distinct participants can attend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MeetingRequirement {
    pub name: String,
    pub date: NaiveDate,
    pub duration_minutes: i64,
    pub minimum_participants: usize,
}

impl MeetingRequirement {
    pub fn new(
        name: impl Into<String>,
        date: NaiveDate,
        duration_minutes: i64,
        minimum_participants: usize,
    ) -> Self {
        Self {
            name: name.into(),
            date,
            duration_minutes,
            minimum_participants,
        }
    }

    /// Check the structural constraints of the requirement.
    ///
    /// # Errors
    /// Returns `ScheduleError::InvalidRequirement` if the duration is not positive,
    /// longer than a day, or if the quorum is zero.
    pub fn validate(&self) -> Result<()> {
        if self.duration_minutes <= 0 {
            return Err(ScheduleError::InvalidRequirement(format!(
                "duration must be positive, got {} minutes",
                self.duration_minutes
            )));
        }
        if self.duration_minutes > i64::from(MINUTES_PER_DAY) {
            return Err(ScheduleError::InvalidRequirement(format!(
                "duration of {} minutes does not fit in a single day",
                self.duration_minutes
            )));
        }
        if self.minimum_participants == 0 {
            return Err(ScheduleError::InvalidRequirement(
                "minimum_participants must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    /// The validated duration in minutes.
    ///
    /// # Errors
    /// Same as [`MeetingRequirement::validate`].
    pub fn duration(&self) -> Result<u32> {
        self.validate()?;
        u32::try_from(self.duration_minutes).map_err(|_| {
            ScheduleError::InvalidRequirement(format!(
                "duration of {} minutes is out of range",
                self.duration_minutes
            ))
        })
    }
}

impl fmt::Display for MeetingRequirement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} {}min quorum={}",
            self.name, self.date, self.duration_minutes, self.minimum_participants
        )
    }
}
