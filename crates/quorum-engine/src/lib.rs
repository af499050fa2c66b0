//! # quorum-engine
//!
//! Quorum-aware meeting negotiation over independently declared availability.
//!
//! Each participant declares the windows during which they are free. The
//! coordinator gathers those declarations concurrently, tolerating slow or
//! failing participants, and the matcher picks the earliest slot of the
//! requested length that enough participants can attend in full.
//!
//! ## Modules
//!
//! - [`slot`] — availability windows, containment, candidate start points
//! - [`requirement`] — the meeting being negotiated
//! - [`participant`] — participants, single-slot queries, the agent seam
//! - [`matcher`] — earliest-feasible quorum matching
//! - [`coordinator`] — one negotiation round with timeout and cancellation
//! - [`progress`] — the ordered progress-line stream
//! - [`config`] — coordinator settings
//! - [`error`] — Error types

pub mod config;
pub mod coordinator;
pub mod error;
pub mod matcher;
pub mod participant;
pub mod progress;
pub mod requirement;
pub mod slot;

pub use config::CoordinatorConfig;
pub use coordinator::{Coordinator, Negotiation, RoundState};
pub use error::ScheduleError;
pub use matcher::{find_earliest_slot, MatchOutcome, MatchResult, Probe};
pub use participant::{AvailabilityResponse, Participant, ParticipantAgent, Screening};
pub use progress::{ProgressLevel, ProgressLine, ProgressSink, ProgressStream, SCHEDULED_MARKER};
pub use requirement::MeetingRequirement;
pub use slot::{candidate_start_points, TimeSlot, MINUTES_PER_DAY};
