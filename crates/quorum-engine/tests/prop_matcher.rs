//! Property-based tests for quorum matching using proptest.
//!
//! These check invariants that must hold for *any* set of availability windows,
//! not just the fixed scenarios in `matcher_tests.rs`. The reference oracle is a
//! brute-force sweep over every minute of the day.

use chrono::NaiveDate;
use proptest::prelude::*;
use quorum_engine::{find_earliest_slot, MeetingRequirement, Participant, TimeSlot, MINUTES_PER_DAY};

// ---------------------------------------------------------------------------
// Strategies
// ---------------------------------------------------------------------------

fn day() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 3, 16).unwrap()
}

/// A window aligned to quarter hours, possibly malformed (start >= end).
fn arb_window() -> impl Strategy<Value = TimeSlot> {
    (0u32..=96, 0u32..=96).prop_map(|(a, b)| TimeSlot::new(day(), a * 15, b * 15))
}

fn arb_participants() -> impl Strategy<Value = Vec<Participant>> {
    prop::collection::vec(prop::collection::vec(arb_window(), 0..4), 1..7).prop_map(|sets| {
        sets.into_iter()
            .enumerate()
            .map(|(i, windows)| Participant::new(format!("P{}", i + 1), windows))
            .collect()
    })
}

/// Duration in quarter-hour steps, 15 minutes to 4 hours.
fn arb_duration() -> impl Strategy<Value = i64> {
    (1i64..=16).prop_map(|q| q * 15)
}

fn requirement(duration_minutes: i64, minimum_participants: usize) -> MeetingRequirement {
    MeetingRequirement::new("Prop Sync", day(), duration_minutes, minimum_participants)
}

/// Participants able to attend `slot`, counting only well-formed windows.
fn attending(participants: &[Participant], slot: &TimeSlot) -> usize {
    participants
        .iter()
        .filter(|p| {
            p.availability
                .iter()
                .any(|w| w.is_valid() && w.contains(slot))
        })
        .count()
}

/// Earliest start found by checking every minute of the day.
fn brute_force_earliest(
    participants: &[Participant],
    duration: u32,
    minimum_participants: usize,
) -> Option<u32> {
    (0..=MINUTES_PER_DAY - duration).find(|&t| {
        attending(participants, &TimeSlot::starting_at(day(), t, duration)) >= minimum_participants
    })
}

// ---------------------------------------------------------------------------
// Properties
// ---------------------------------------------------------------------------

proptest! {
    #[test]
    fn accepted_results_satisfy_quorum(
        participants in arb_participants(),
        duration in arb_duration(),
        quorum in 1usize..5,
    ) {
        let outcome = find_earliest_slot(&requirement(duration, quorum), &participants).unwrap();
        let result = outcome.result;

        if result.accepted {
            let slot = result.slot.expect("accepted result carries a slot");
            prop_assert!(result.attendees.len() >= quorum);
            prop_assert_eq!(slot.duration_minutes() as i64, duration);
            prop_assert_eq!(slot.date, day());
            for id in &result.attendees {
                let p = participants.iter().find(|p| &p.id == id).unwrap();
                prop_assert!(
                    p.availability.iter().any(|w| w.is_valid() && w.contains(&slot)),
                    "{} cannot attend {}", id, slot
                );
            }
        } else {
            prop_assert!(result.slot.is_none());
            prop_assert!(result.attendees.is_empty());
        }
    }

    #[test]
    fn matches_brute_force_earliest_start(
        participants in arb_participants(),
        duration in arb_duration(),
        quorum in 1usize..5,
    ) {
        let outcome = find_earliest_slot(&requirement(duration, quorum), &participants).unwrap();
        let expected = if quorum > participants.len() {
            None
        } else {
            brute_force_earliest(&participants, duration as u32, quorum)
        };

        prop_assert_eq!(outcome.result.slot.map(|s| s.start), expected);
    }

    #[test]
    fn quorum_above_participant_count_never_probes(
        participants in arb_participants(),
        duration in arb_duration(),
        extra in 1usize..4,
    ) {
        let quorum = participants.len() + extra;
        let outcome = find_earliest_slot(&requirement(duration, quorum), &participants).unwrap();

        prop_assert!(!outcome.result.accepted);
        prop_assert!(outcome.probes.is_empty());
    }

    #[test]
    fn probes_are_strictly_ascending(
        participants in arb_participants(),
        duration in arb_duration(),
        quorum in 1usize..5,
    ) {
        let outcome = find_earliest_slot(&requirement(duration, quorum), &participants).unwrap();
        for pair in outcome.probes.windows(2) {
            prop_assert!(pair[0].slot.start < pair[1].slot.start);
        }
    }

    #[test]
    fn matching_is_idempotent(
        participants in arb_participants(),
        duration in arb_duration(),
        quorum in 1usize..5,
    ) {
        let req = requirement(duration, quorum);
        let first = find_earliest_slot(&req, &participants).unwrap();
        let second = find_earliest_slot(&req, &participants).unwrap();
        prop_assert_eq!(first, second);
    }

    #[test]
    fn participant_order_does_not_change_result(
        participants in arb_participants(),
        duration in arb_duration(),
        quorum in 1usize..5,
    ) {
        let req = requirement(duration, quorum);
        let mut reversed = participants.clone();
        reversed.reverse();

        let forward = find_earliest_slot(&req, &participants).unwrap().result;
        let backward = find_earliest_slot(&req, &reversed).unwrap().result;
        prop_assert_eq!(forward, backward);
    }
}
