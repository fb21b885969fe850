use crate::model::TerminalSize;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Default deadline for each flow of a run.
pub const DEFAULT_TIMEOUT_MS: u64 = 3_000;
/// Default pause inserted between queued steps and after a cursor handshake.
pub const DEFAULT_REACTION_TIME_MS: u64 = 10;

/// Settings for a [`Survey`](crate::Survey) run.
///
/// Every field has a default, so a partial JSON document deserializes into a
/// complete configuration.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SurveyConfig {
    /// Deadline for each of the two flows, in milliseconds.
    pub timeout_ms: u64,
    /// Pause between queue iterations, in milliseconds.
    pub reaction_time_ms: u64,
    /// Wait for two cursor-position queries before answering a prompt.
    pub cursor_handshake: bool,
    /// Tell the code under test that colored output is allowed.
    pub color: bool,
    /// Pseudo-terminal size.
    pub size: TerminalSize,
    /// Optional upper bound for a single `expect_string`, in milliseconds.
    pub expect_timeout_ms: Option<u64>,
}

impl Default for SurveyConfig {
    fn default() -> Self {
        Self {
            timeout_ms: DEFAULT_TIMEOUT_MS,
            reaction_time_ms: DEFAULT_REACTION_TIME_MS,
            cursor_handshake: false,
            color: false,
            size: TerminalSize::default(),
            expect_timeout_ms: None,
        }
    }
}

impl SurveyConfig {
    /// Run deadline as a [`Duration`].
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Pacing handed to every executed step.
    pub fn pacing(&self) -> Pacing {
        Pacing {
            reaction_time: Duration::from_millis(self.reaction_time_ms),
            cursor_handshake: self.cursor_handshake,
        }
    }

    /// Console settings derived from this configuration.
    ///
    /// Cursor-position queries are answered whenever the handshake is
    /// expected, otherwise the code under test would block on them.
    pub fn console(&self) -> ConsoleConfig {
        ConsoleConfig {
            size: self.size,
            color: self.color,
            answer_cursor_queries: self.cursor_handshake,
            expect_timeout: self.expect_timeout_ms.map(Duration::from_millis),
        }
    }
}

/// Timing knobs passed down to steps while they execute.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Pacing {
    /// Pause between steps and after a cursor handshake.
    pub reaction_time: Duration,
    /// Whether prompts wait for the cursor-position round trip.
    pub cursor_handshake: bool,
}

impl Default for Pacing {
    fn default() -> Self {
        SurveyConfig::default().pacing()
    }
}

impl Pacing {
    /// No delays and no handshake; handy with an in-memory console.
    pub fn immediate() -> Self {
        Self {
            reaction_time: Duration::ZERO,
            cursor_handshake: false,
        }
    }
}

/// Settings for a [`PtyConsole`](crate::console::PtyConsole).
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ConsoleConfig {
    /// Pseudo-terminal size.
    pub size: TerminalSize,
    /// Whether the code under test may emit color.
    pub color: bool,
    /// Reply to `ESC[6n` with the emulated cursor position.
    pub answer_cursor_queries: bool,
    /// Upper bound for a single `expect_string`.
    pub expect_timeout: Option<Duration>,
}
