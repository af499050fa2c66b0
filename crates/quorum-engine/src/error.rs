//! Error types for quorum-engine operations.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ScheduleError {
    #[error("Invalid requirement: {0}")]
    InvalidRequirement(String),

    #[error("Malformed availability for {participant}: {reason}")]
    MalformedAvailability { participant: String, reason: String },

    #[error("Participant {participant} failed: {reason}")]
    ParticipantFailed { participant: String, reason: String },

    #[error("Negotiation cancelled")]
    Cancelled,
}

pub type Result<T> = std::result::Result<T, ScheduleError>;
