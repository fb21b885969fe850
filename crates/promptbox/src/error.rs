//! Error taxonomy for steps, queues and consoles.
//!
//! Two of the [`ExpectError`] variants are control-flow sentinels rather than
//! failures: [`ExpectError::NothingToDo`] means the consumer has caught up with
//! the queue and [`ExpectError::NotFinished`] means a prompt still expects more
//! rounds. Neither ever reaches the test reporter. [`ExpectError::Interrupted`]
//! is returned to the immediate caller but does not halt the outer queue.
//!
//! # Key Types
//!
//! - [`ExpectError`] - Outcome of running a step or a queue head
//! - [`ConsoleError`] - Failure of the terminal channel itself
//! - [`UnmetExpectations`] - Reconciliation failure listing the pending steps

use miette::Diagnostic;
use std::fmt;
use std::time::Duration;

/// Result alias for step and queue operations.
pub type ExpectResult<T = ()> = Result<T, ExpectError>;

/// Result alias for console operations.
pub type ConsoleResult<T = ()> = Result<T, ConsoleError>;

/// Banner that prefixes every reconciliation failure.
pub const UNMET_BANNER: &str = "there are remaining expectations that were not met:\n\n";

/// Which of the two concurrent flows exceeded its deadline.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Flow {
    /// The code under test.
    Ask,
    /// The queue consumer that plays the scripted answers.
    Answer,
}

impl fmt::Display for Flow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ask => f.write_str("ask"),
            Self::Answer => f.write_str("answer"),
        }
    }
}

/// Outcome of executing a step, a queue head or a whole queue.
#[derive(Debug, thiserror::Error, Diagnostic)]
pub enum ExpectError {
    /// The queue is empty.
    #[error("nothing to do")]
    #[diagnostic(code(promptbox::nothing_to_do))]
    NothingToDo,

    /// A prompt has been answered but expects more rounds.
    #[error("step is not finished")]
    #[diagnostic(code(promptbox::not_finished))]
    NotFinished,

    /// The step deliberately cancelled the prompt.
    #[error("interrupt")]
    #[diagnostic(code(promptbox::interrupted))]
    Interrupted,

    /// The console did not produce what was expected, or failed outright.
    #[error(transparent)]
    #[diagnostic(transparent)]
    Console(#[from] ConsoleError),

    /// A flow did not finish before the run deadline.
    #[error("{flow} timeout exceeded")]
    #[diagnostic(
        code(promptbox::timeout),
        help("raise the deadline with Survey::with_timeout if the program is just slow")
    )]
    Timeout {
        /// The flow that timed out.
        flow: Flow,
        /// The configured deadline.
        after: Duration,
    },
}

impl ExpectError {
    /// `true` for the empty-queue sentinel.
    pub fn is_nothing_to_do(&self) -> bool {
        matches!(self, Self::NothingToDo)
    }

    /// `true` for the repeat-pending sentinel.
    pub fn is_not_finished(&self) -> bool {
        matches!(self, Self::NotFinished)
    }

    /// `true` when a step was deliberately interrupted.
    pub fn is_interrupted(&self) -> bool {
        matches!(self, Self::Interrupted)
    }

    /// Errors the outer consumer loop keeps going after.
    pub fn is_ignored(&self) -> bool {
        self.is_interrupted()
    }
}

/// Failures of a [`Console`](crate::console::Console).
#[derive(Debug, thiserror::Error, Diagnostic)]
pub enum ConsoleError {
    /// The output stream ended before the pattern appeared.
    #[error("unexpected end of output while waiting for {expected:?}")]
    #[diagnostic(code(promptbox::console::eof))]
    Eof {
        /// Pattern that was being waited for.
        expected: String,
    },

    /// The console was closed by the harness.
    #[error("console is closed")]
    #[diagnostic(code(promptbox::console::closed))]
    Closed,

    /// The pattern did not appear within the match timeout.
    #[error("timed out after {}ms waiting for {:?}", .after.as_millis(), .expected)]
    #[diagnostic(code(promptbox::console::timeout))]
    Timeout {
        /// Pattern that was being waited for.
        expected: String,
        /// The match timeout.
        after: Duration,
    },

    /// Opening the pseudo-terminal or spawning the program failed.
    #[error("failed to {operation}: {reason}")]
    #[diagnostic(code(promptbox::console::open))]
    Open {
        /// What was being attempted.
        operation: &'static str,
        /// Underlying cause.
        reason: String,
    },

    /// A read or write on the terminal failed.
    #[error("failed to {operation}")]
    #[diagnostic(code(promptbox::console::io))]
    Io {
        /// What was being attempted.
        operation: &'static str,
        /// Underlying cause.
        #[source]
        source: std::io::Error,
    },
}

impl ConsoleError {
    pub(crate) fn open(operation: &'static str, err: impl fmt::Display) -> Self {
        Self::Open {
            operation,
            reason: err.to_string(),
        }
    }

    pub(crate) fn io(operation: &'static str, source: std::io::Error) -> Self {
        Self::Io { operation, source }
    }
}

/// Returned by [`Survey::expectations_were_met`](crate::Survey::expectations_were_met)
/// when steps are still queued.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error, Diagnostic)]
#[error("{}{}", UNMET_BANNER, .pending)]
#[diagnostic(code(promptbox::unmet_expectations))]
pub struct UnmetExpectations {
    /// Rendered descriptions of every pending step.
    pub pending: String,
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;

    #[test]
    fn sentinel_predicates() {
        assert!(ExpectError::NothingToDo.is_nothing_to_do());
        assert!(ExpectError::NotFinished.is_not_finished());
        assert!(ExpectError::Interrupted.is_ignored());
        assert!(!ExpectError::NotFinished.is_ignored());
        assert!(!ExpectError::from(ConsoleError::Closed).is_ignored());
    }

    #[test]
    fn timeout_message_names_the_flow() {
        let err = ExpectError::Timeout {
            flow: Flow::Ask,
            after: Duration::from_millis(50),
        };
        assert_eq!(err.to_string(), "ask timeout exceeded");
    }

    #[test]
    fn unmet_expectations_prefixes_banner() {
        let err = UnmetExpectations {
            pending: "Expect : Input Prompt\n".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "there are remaining expectations that were not met:\n\nExpect : Input Prompt\n"
        );
    }
}
