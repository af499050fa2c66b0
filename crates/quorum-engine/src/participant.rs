//! Participants, their declared availability, and the agent seam the
//! coordinator fans out over.

use std::future::{self, Future};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::{Result, ScheduleError};
use crate::requirement::MeetingRequirement;
use crate::slot::TimeSlot;

/// One participant and the windows they declared themselves free.
///
/// A participant may declare several disjoint windows, possibly on different
/// dates; only windows on the requirement's date take part in matching.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Participant {
    pub id: String,
    #[serde(default)]
    pub availability: Vec<TimeSlot>,
}

/// A participant's answer to "can you attend this candidate slot?".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AvailabilityResponse {
    pub participant_id: String,
    pub can_attend: bool,
    pub offered_slot: Option<TimeSlot>,
}

/// Result of screening a participant's windows against a meeting date.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Screening {
    /// Well-formed windows on the meeting date, sorted ascending.
    pub usable: Vec<TimeSlot>,
    /// One `MalformedAvailability` per rejected window (or for an empty set).
    pub malformed: Vec<ScheduleError>,
    /// Number of well-formed windows that fall on another date.
    pub off_date: usize,
}

impl Participant {
    pub fn new(id: impl Into<String>, availability: Vec<TimeSlot>) -> Self {
        Self {
            id: id.into(),
            availability,
        }
    }

    /// True iff one of this participant's windows fully contains `candidate`.
    pub fn can_attend(&self, candidate: &TimeSlot) -> bool {
        self.availability.iter().any(|w| w.contains(candidate))
    }

    /// Answer a single candidate-slot query.
    ///
    /// Stateless: each call only reads the declared availability, so calls may be
    /// issued concurrently.
    ///
    /// # Errors
    /// Returns `ScheduleError::InvalidRequirement` if the requirement's duration is
    /// not positive (or otherwise fails [`MeetingRequirement::validate`]).
    pub fn respond(
        &self,
        requirement: &MeetingRequirement,
        candidate: &TimeSlot,
    ) -> Result<AvailabilityResponse> {
        requirement.validate()?;

        let can_attend = self.can_attend(candidate);
        Ok(AvailabilityResponse {
            participant_id: self.id.clone(),
            can_attend,
            offered_slot: can_attend.then_some(*candidate),
        })
    }

    /// Split the declared windows into those usable on `date` and those that are
    /// malformed.
    pub fn screen(&self, date: NaiveDate) -> Screening {
        let mut screening = Screening::default();

        if self.availability.is_empty() {
            screening.malformed.push(ScheduleError::MalformedAvailability {
                participant: self.id.clone(),
                reason: "no availability windows declared".to_string(),
            });
            return screening;
        }

        for window in &self.availability {
            if let Some(reason) = window.defect() {
                screening.malformed.push(ScheduleError::MalformedAvailability {
                    participant: self.id.clone(),
                    reason,
                });
            } else if window.date != date {
                screening.off_date += 1;
            } else {
                screening.usable.push(*window);
            }
        }

        screening.usable.sort();
        screening.usable.dedup();
        screening
    }
}

/// Anything that can declare a participant's availability for a meeting.
///
/// The coordinator calls [`ParticipantAgent::report`] exactly once per
/// negotiation round, concurrently across agents. Implementations backed by a
/// remote calendar may suspend; the round timeout bounds how long they are
/// waited for.
pub trait ParticipantAgent: Send + Sync + 'static {
    /// Stable identifier used in progress lines and match results.
    fn id(&self) -> &str;

    /// Declare availability for `requirement`.
    fn report(
        &self,
        requirement: &MeetingRequirement,
    ) -> impl Future<Output = Result<Participant>> + Send;
}

impl ParticipantAgent for Participant {
    fn id(&self) -> &str {
        &self.id
    }

    /// Answers immediately with the declared availability.
    fn report(
        &self,
        requirement: &MeetingRequirement,
    ) -> impl Future<Output = Result<Participant>> + Send {
        future::ready(requirement.validate().map(|()| self.clone()))
    }
}
