//! Prompt expectations: "this question will be asked, answer it like so".
//!
//! A [`PromptExpectation`] waits for the announced prompt text, optionally
//! waits for the cursor-position handshake, then runs its scripted answer.
//! It counts rounds so the same prompt can be answered several times before
//! it leaves the queue.
//!
//! The typed handles in [`builder`] configure an expectation after it has been
//! queued. They share the expectation through an `Arc`; the queue never points
//! back at the survey that owns it.

pub mod builder;

pub use builder::{
    ConfirmPrompt, InputPrompt, MultiSelectPrompt, MultilinePrompt, PasswordPrompt,
    ScriptedAnswer, SelectPrompt,
};

use crate::console::Console;
use crate::error::{ExpectError, ExpectResult};
use crate::model::Pacing;
use crate::report;
use crate::step::{wait_for_cursor, Completion, ReplyMode, Step, Steps};
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Kind of prompt, as shown in reports.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PromptKind {
    /// Yes/no question.
    Confirm,
    /// Single line of text.
    Input,
    /// Masked single line.
    Password,
    /// Several lines ended by an empty one.
    Multiline,
    /// Pick one option from a list.
    Select,
    /// Pick any number of options from a list.
    MultiSelect,
}

impl PromptKind {
    /// Line prompts read input only after asking where the cursor is.
    fn uses_cursor_handshake(self) -> bool {
        !matches!(self, Self::Select | Self::MultiSelect)
    }
}

impl fmt::Display for PromptKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Confirm => "Confirm Prompt",
            Self::Input => "Input Prompt",
            Self::Password => "Password Prompt",
            Self::Multiline => "Multiline Prompt",
            Self::Select => "Select Prompt",
            Self::MultiSelect => "MultiSelect Prompt",
        };
        f.write_str(name)
    }
}

/// Lifecycle of an expectation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PromptState {
    /// Not attempted yet.
    Pending,
    /// Answered at least once, more rounds expected.
    InProgress,
    /// All rounds answered.
    Satisfied,
    /// A scripted interrupt ran.
    Aborted,
}

/// Scripted answer of a prompt.
#[derive(Clone, Debug)]
pub(crate) enum Answer {
    /// One step.
    Single(Step),
    /// An inline keystroke sequence, replayed in full every round.
    ///
    /// While a round is under way the report shows only the steps that round
    /// has not played yet.
    Sequence(Arc<Steps>),
}

impl Answer {
    fn describe(&self) -> String {
        match self {
            Self::Single(step) => step.describe(),
            Self::Sequence(steps) if steps.is_empty() => report::NO_ANSWER.to_string(),
            Self::Sequence(steps) => steps.describe(),
        }
    }
}

#[derive(Debug)]
struct Progress {
    answer: Answer,
    /// Copy of the inline sequence being played in the current round.
    round: Option<Arc<Steps>>,
    remaining: usize,
    calls: usize,
    aborted: bool,
}

/// A prompt the program under test is expected to show, with its answer.
#[derive(Debug)]
pub struct PromptExpectation {
    kind: PromptKind,
    message: String,
    progress: Mutex<Progress>,
}

impl PromptExpectation {
    pub(crate) fn new(kind: PromptKind, message: String, answer: Answer) -> Self {
        Self {
            kind,
            message,
            progress: Mutex::new(Progress {
                answer,
                round: None,
                remaining: 1,
                calls: 0,
                aborted: false,
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Progress> {
        self.progress.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Kind of prompt.
    pub fn kind(&self) -> PromptKind {
        self.kind
    }

    /// Prompt text that is waited for.
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Rounds still expected.
    pub fn remaining(&self) -> usize {
        self.lock().remaining
    }

    /// Rounds answered so far.
    pub fn calls(&self) -> usize {
        self.lock().calls
    }

    /// Current lifecycle state.
    pub fn state(&self) -> PromptState {
        let progress = self.lock();
        if progress.aborted {
            PromptState::Aborted
        } else if progress.remaining == 0 {
            PromptState::Satisfied
        } else if progress.calls == 0 {
            PromptState::Pending
        } else {
            PromptState::InProgress
        }
    }

    /// Zero is treated as one round.
    pub(crate) fn set_times(&self, times: usize) {
        self.lock().remaining = times.max(1);
    }

    pub(crate) fn set_answer(&self, step: Step) {
        self.lock().answer = Answer::Single(step);
    }

    /// Replace the answer with one that ends the prompt after a single round.
    pub(crate) fn answer_once(&self, step: Step) {
        let mut progress = self.lock();
        progress.answer = Answer::Single(step);
        progress.remaining = 1;
    }

    /// Switch a scripted reply to "type it, then expect the program to quit".
    pub(crate) fn mark_interrupted(&self) {
        if let Answer::Single(Step::Reply(reply)) = &mut self.lock().answer {
            reply.mode = ReplyMode::Interrupted;
        }
    }

    pub(crate) fn sequence(&self) -> Option<Arc<Steps>> {
        match &self.lock().answer {
            Answer::Sequence(steps) => Some(Arc::clone(steps)),
            Answer::Single(_) => None,
        }
    }

    /// Answer one round of the prompt.
    ///
    /// Returns [`ExpectError::NotFinished`] while more rounds are expected and
    /// [`ExpectError::Interrupted`] when the answer was an interrupt. Other
    /// errors leave the counters untouched.
    pub fn execute(&self, console: &dyn Console, pacing: &Pacing) -> ExpectResult {
        console.expect_string(&self.message)?;
        if pacing.cursor_handshake && self.kind.uses_cursor_handshake() {
            wait_for_cursor(console, pacing)?;
        }

        let outcome = match self.round_answer() {
            Answer::Single(step) => step.execute(console, pacing),
            Answer::Sequence(round) => match round.run_all(console, pacing, None)? {
                Completion::Interrupted => Err(ExpectError::Interrupted),
                Completion::Drained | Completion::Stopped => Ok(()),
            },
        };
        let interrupted = match outcome {
            Ok(()) => false,
            Err(ExpectError::Interrupted) => true,
            Err(err) => return Err(err),
        };

        let mut progress = self.lock();
        progress.round = None;
        progress.remaining = progress.remaining.saturating_sub(1);
        progress.calls += 1;
        if interrupted {
            progress.aborted = true;
            return Err(ExpectError::Interrupted);
        }
        if progress.remaining == 0 {
            Ok(())
        } else {
            Err(ExpectError::NotFinished)
        }
    }

    /// Answer to play in this round. A sequence resumes the unfinished round
    /// or starts a fresh copy of the script.
    fn round_answer(&self) -> Answer {
        let mut progress = self.lock();
        let script = match &progress.answer {
            Answer::Single(step) => return Answer::Single(step.clone()),
            Answer::Sequence(script) => Arc::clone(script),
        };
        let round = progress
            .round
            .get_or_insert_with(|| Arc::new(script.fork()));
        Answer::Sequence(Arc::clone(round))
    }

    /// Report block for this prompt.
    pub fn describe(&self) -> String {
        let progress = self.lock();
        let answer = match &progress.round {
            Some(round) => Answer::Sequence(Arc::clone(round)).describe(),
            None => progress.answer.describe(),
        };
        let mut out = String::new();
        report::label_line(&mut out, "Expect", self.kind);
        report::label_line(&mut out, "Message", report::quoted(&self.message));
        report::label_line(&mut out, "Answer", answer);
        report::repeat_line(&mut out, progress.remaining, progress.calls);
        out
    }
}
