//! Configuration for the negotiation coordinator.

use std::time::Duration;

use serde::Deserialize;

/// Default bound on how long a round waits for participant reports.
pub const DEFAULT_ROUND_TIMEOUT_MS: u64 = 5_000;

/// Default number of progress lines buffered ahead of a slow consumer.
pub const DEFAULT_PROGRESS_CAPACITY: usize = 64;

/// Coordinator settings.
///
/// Deserializable from JSON/TOML with `round_timeout_ms` and
/// `progress_capacity` keys; missing keys take their defaults.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct CoordinatorConfig {
    /// Upper bound on the awaiting-responses phase. Participants that have not
    /// reported by then are treated as unable to attend.
    #[serde(rename = "round_timeout_ms", with = "millis")]
    pub round_timeout: Duration,

    /// Progress lines buffered before the coordinator waits on the consumer.
    pub progress_capacity: usize,
}

impl Default for CoordinatorConfig {
    fn default() -> Self {
        Self {
            round_timeout: Duration::from_millis(DEFAULT_ROUND_TIMEOUT_MS),
            progress_capacity: DEFAULT_PROGRESS_CAPACITY,
        }
    }
}

impl CoordinatorConfig {
    pub fn with_round_timeout(mut self, round_timeout: Duration) -> Self {
        self.round_timeout = round_timeout;
        self
    }
}

mod millis {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer};

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_millis)
    }
}
