//! Earliest-feasible quorum matching.
//!
//! Given a requirement and every participant's availability, finds the
//! earliest-starting slot of the required length that at least
//! `minimum_participants` distinct participants can attend in full.
//!
//! Only the boundary points produced by [`candidate_start_points`] are probed,
//! in ascending order, so the first feasible probe is the earliest feasible
//! slot. Cost is O(P log P + P * N) for P candidate points and N participants.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::participant::Participant;
use crate::requirement::MeetingRequirement;
use crate::slot::{candidate_start_points, TimeSlot};

/// Terminal value of a negotiation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchResult {
    pub accepted: bool,
    pub slot: Option<TimeSlot>,
    /// Every participant whose availability contains `slot`, ordered by id.
    pub attendees: BTreeSet<String>,
}

impl MatchResult {
    pub fn accepted(slot: TimeSlot, attendees: BTreeSet<String>) -> Self {
        Self {
            accepted: true,
            slot: Some(slot),
            attendees,
        }
    }

    pub fn infeasible() -> Self {
        Self {
            accepted: false,
            slot: None,
            attendees: BTreeSet::new(),
        }
    }
}

/// One candidate slot and the participants able to attend it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Probe {
    pub slot: TimeSlot,
    pub available: BTreeSet<String>,
}

/// The match result plus the probes evaluated to reach it, in probe order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchOutcome {
    pub result: MatchResult,
    pub probes: Vec<Probe>,
}

impl MatchOutcome {
    fn rejected(probes: Vec<Probe>) -> Self {
        Self {
            result: MatchResult::infeasible(),
            probes,
        }
    }
}

/// Find the earliest slot on `requirement.date` that satisfies the quorum.
///
/// Malformed windows and windows on other dates are ignored. Participants
/// sharing an id count once toward the quorum. If fewer distinct participants
/// exist than the quorum requires, the result is infeasible and no candidate is
/// probed.
///
/// # Errors
/// Returns `ScheduleError::InvalidRequirement` if the requirement fails
/// validation.
pub fn find_earliest_slot(
    requirement: &MeetingRequirement,
    participants: &[Participant],
) -> Result<MatchOutcome> {
    let duration = requirement.duration()?;

    let distinct: BTreeSet<&str> = participants.iter().map(|p| p.id.as_str()).collect();
    if requirement.minimum_participants > distinct.len() {
        return Ok(MatchOutcome::rejected(Vec::new()));
    }

    let screened: Vec<Participant> = participants
        .iter()
        .map(|p| Participant::new(p.id.clone(), p.screen(requirement.date).usable))
        .collect();

    let windows: Vec<TimeSlot> = screened
        .iter()
        .flat_map(|p| p.availability.iter().copied())
        .collect();

    let mut probes = Vec::new();
    for start in candidate_start_points(&windows, duration) {
        let slot = TimeSlot::starting_at(requirement.date, start, duration);

        let mut available = BTreeSet::new();
        for participant in &screened {
            if participant.respond(requirement, &slot)?.can_attend {
                available.insert(participant.id.clone());
            }
        }

        let feasible = available.len() >= requirement.minimum_participants;
        probes.push(Probe {
            slot,
            available: available.clone(),
        });

        if feasible {
            return Ok(MatchOutcome {
                result: MatchResult::accepted(slot, available),
                probes,
            });
        }
    }

    Ok(MatchOutcome::rejected(probes))
}
