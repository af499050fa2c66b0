//! The ordered, append-only stream of human-readable progress lines a
//! negotiation produces.
//!
//! The coordinator is the only writer. Lines are delivered over a bounded
//! channel as they are produced, so a consumer sees them before the round
//! finishes.

use std::fmt;

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

use crate::error::{Result, ScheduleError};

/// Substring carried by the line announcing an accepted slot. Presentation
/// layers key off this literal to switch to a success state.
pub const SCHEDULED_MARKER: &str = "Meeting scheduled:";

/// Severity class of a progress line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProgressLevel {
    Info,
    Warning,
    Success,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressLine {
    pub level: ProgressLevel,
    pub text: String,
}

impl ProgressLine {
    pub fn info(text: impl Into<String>) -> Self {
        Self {
            level: ProgressLevel::Info,
            text: text.into(),
        }
    }

    pub fn warning(text: impl Into<String>) -> Self {
        Self {
            level: ProgressLevel::Warning,
            text: text.into(),
        }
    }

    pub fn success(text: impl Into<String>) -> Self {
        Self {
            level: ProgressLevel::Success,
            text: text.into(),
        }
    }

    /// True iff this is the line announcing an accepted slot.
    pub fn is_scheduled(&self) -> bool {
        self.text.contains(SCHEDULED_MARKER)
    }
}

impl fmt::Display for ProgressLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

/// Write half of the progress stream.
#[derive(Debug)]
pub struct ProgressSink {
    tx: mpsc::Sender<ProgressLine>,
}

/// Read half of the progress stream.
#[derive(Debug)]
pub struct ProgressStream {
    rx: mpsc::Receiver<ProgressLine>,
}

/// Create a connected sink/stream pair buffering up to `capacity` lines.
pub fn channel(capacity: usize) -> (ProgressSink, ProgressStream) {
    let (tx, rx) = mpsc::channel(capacity.max(1));
    (ProgressSink { tx }, ProgressStream { rx })
}

impl ProgressSink {
    /// Append a line, waiting for buffer space if the consumer is behind.
    ///
    /// # Errors
    /// Returns `ScheduleError::Cancelled` once the consumer has gone away.
    pub async fn emit(&self, line: ProgressLine) -> Result<()> {
        self.tx.send(line).await.map_err(|_| ScheduleError::Cancelled)
    }
}

impl ProgressStream {
    /// The next line, or `None` once the writer has finished.
    pub async fn next(&mut self) -> Option<ProgressLine> {
        self.rx.recv().await
    }

    /// Drain every remaining line until the writer finishes.
    pub async fn collect(mut self) -> Vec<ProgressLine> {
        let mut lines = Vec::new();
        while let Some(line) = self.rx.recv().await {
            lines.push(line);
        }
        lines
    }
}
