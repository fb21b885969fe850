//! The orchestrator that plays a scripted user against a program.
//!
//! [`Survey`] owns the top-level step queue. [`Survey::start`] opens a
//! pseudo-terminal and runs two flows against it at the same time:
//!
//! - the *ask* flow runs the code under test with its standard streams bound
//!   to the terminal, then closes the terminal;
//! - the *answer* flow consumes the queue, playing each scripted answer as
//!   soon as the prompt it belongs to appears, then waits for end of output.
//!
//! Both flows share one deadline. When it passes the failure is reported, the
//! terminal is closed so blocked matchers return, and `start` comes back.
//! Failures never escape as return values; they go to the [`Reporter`], and
//! [`Survey::expectations_were_met`] tells afterwards what was left unanswered.
//!
//! # Example
//!
//! ```no_run
//! use promptbox::reporter::RecordingReporter;
//! use promptbox::Survey;
//! use std::io::{BufRead, BufReader, Write};
//! use std::sync::Arc;
//!
//! let reporter = Arc::new(RecordingReporter::new());
//! let survey = Survey::new().with_reporter(reporter.clone());
//! survey.expect_input("Enter your name:").answer("Ada");
//!
//! survey.start(|mut stdio| {
//!     write!(stdio.output, "? Enter your name: ").unwrap();
//!     let mut line = String::new();
//!     BufReader::new(stdio.input).read_line(&mut line).unwrap();
//! });
//!
//! assert!(reporter.errors().is_empty());
//! survey.expectations_were_met().unwrap();
//! ```

mod checked;

pub use checked::CheckedSurvey;

use crate::console::{CommandSpec, Console, PtyConsole, Stdio};
use crate::error::{ExpectError, ExpectResult, Flow, UnmetExpectations};
use crate::model::SurveyConfig;
use crate::prompt::builder::{
    ConfirmPrompt, InputPrompt, MultiSelectPrompt, MultilinePrompt, PasswordPrompt, SelectPrompt,
};
use crate::prompt::{Answer, PromptExpectation, PromptKind};
use crate::reporter::{Reporter, TracingReporter};
use crate::signal::Signal;
use crate::step::{Step, Steps};
use crossbeam_channel::{after, select};
use portable_pty::ChildKiller;
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread;
use std::time::{Duration, Instant};

/// Extra time the answer flow gets once the code under test is done.
const ANSWER_GRACE: Duration = Duration::from_millis(250);

type Killer = Box<dyn ChildKiller + Send + Sync>;

/// Scripted expectations for an interactive program, and the run loop that checks them.
///
/// An instance is meant for a single test case: queue the expected prompts,
/// call [`start`](Self::start) once, then reconcile.
pub struct Survey {
    steps: Arc<Steps>,
    config: SurveyConfig,
    reporter: Arc<dyn Reporter>,
    start_lock: Mutex<()>,
    started: AtomicBool,
}

impl Default for Survey {
    fn default() -> Self {
        Self::new()
    }
}

impl Survey {
    /// Survey with the default configuration, reporting through `tracing`.
    pub fn new() -> Self {
        Self {
            steps: Arc::new(Steps::report()),
            config: SurveyConfig::default(),
            reporter: Arc::new(TracingReporter),
            start_lock: Mutex::new(()),
            started: AtomicBool::new(false),
        }
    }

    /// Replace the whole configuration.
    #[must_use]
    pub fn with_config(mut self, config: SurveyConfig) -> Self {
        self.config = config;
        self
    }

    /// Override the run deadline.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.config.timeout_ms = u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX);
        self
    }

    /// Send failures and diagnostics to `reporter`.
    #[must_use]
    pub fn with_reporter(mut self, reporter: Arc<dyn Reporter>) -> Self {
        self.reporter = reporter;
        self
    }

    /// Configuration in effect.
    pub fn config(&self) -> &SurveyConfig {
        &self.config
    }

    // =========================================================================
    // Expectations
    // =========================================================================

    /// Expect a yes/no question.
    ///
    /// # Panics
    ///
    /// Panics if [`start`](Self::start) has already been called.
    pub fn expect_confirm(&self, message: impl Into<String>) -> ConfirmPrompt {
        ConfirmPrompt::new(self.enqueue(PromptKind::Confirm, message.into(), single()))
    }

    /// Expect a single-line text prompt.
    ///
    /// # Panics
    ///
    /// Panics if [`start`](Self::start) has already been called.
    pub fn expect_input(&self, message: impl Into<String>) -> InputPrompt {
        InputPrompt::new(self.enqueue(PromptKind::Input, message.into(), single()))
    }

    /// Expect a password prompt.
    ///
    /// # Panics
    ///
    /// Panics if [`start`](Self::start) has already been called.
    pub fn expect_password(&self, message: impl Into<String>) -> PasswordPrompt {
        PasswordPrompt::new(self.enqueue(PromptKind::Password, message.into(), single()))
    }

    /// Expect a multi-line text prompt.
    ///
    /// # Panics
    ///
    /// Panics if [`start`](Self::start) has already been called.
    pub fn expect_multiline(&self, message: impl Into<String>) -> MultilinePrompt {
        MultilinePrompt::new(self.enqueue(PromptKind::Multiline, message.into(), single()))
    }

    /// Expect a single-choice list.
    ///
    /// # Panics
    ///
    /// Panics if [`start`](Self::start) has already been called.
    pub fn expect_select(&self, message: impl Into<String>) -> SelectPrompt {
        SelectPrompt::new(self.enqueue(PromptKind::Select, message.into(), sequence()))
    }

    /// Expect a multiple-choice list.
    ///
    /// # Panics
    ///
    /// Panics if [`start`](Self::start) has already been called.
    pub fn expect_multi_select(&self, message: impl Into<String>) -> MultiSelectPrompt {
        MultiSelectPrompt::new(self.enqueue(PromptKind::MultiSelect, message.into(), sequence()))
    }

    #[allow(clippy::panic)]
    fn enqueue(&self, kind: PromptKind, message: String, answer: Answer) -> Arc<PromptExpectation> {
        if self.started.load(Ordering::Acquire) {
            panic!("cannot expect {kind:?} {message:?}: the survey has already started");
        }
        let expectation = Arc::new(PromptExpectation::new(kind, message, answer));
        self.steps.append([Step::Prompt(Arc::clone(&expectation))]);
        expectation
    }

    /// Number of queued steps.
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    /// Whether nothing is queued.
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Drop every queued expectation.
    pub fn reset_expectations(&self) {
        self.steps.reset();
    }

    /// Fail with a report of everything still queued.
    pub fn expectations_were_met(&self) -> Result<(), UnmetExpectations> {
        if self.steps.is_empty() {
            return Ok(());
        }
        Err(UnmetExpectations {
            pending: self.steps.describe(),
        })
    }

    /// Run the head step once against `console`, tolerating interrupts.
    ///
    /// Useful to drive a console by hand instead of through [`start`](Self::start).
    pub fn expect(&self, console: &dyn Console) -> ExpectResult {
        match self.steps.run_head(console, &self.config.pacing()) {
            Err(err) if err.is_ignored() => Ok(()),
            result => result,
        }
    }

    // =========================================================================
    // Running
    // =========================================================================

    /// Run `run_under_test` on a fresh pseudo-terminal while playing the queue.
    ///
    /// Blocks until both flows finish or the deadline passes.
    pub fn start<F>(&self, run_under_test: F)
    where
        F: FnOnce(Stdio) + Send + 'static,
    {
        let _guard = self.begin();
        let console = match PtyConsole::open(self.config.console()) {
            Ok(console) => Arc::new(console),
            Err(err) => {
                self.reporter.error(&err.to_string());
                return;
            }
        };

        let reporter = Arc::clone(&self.reporter);
        let tty_console = Arc::clone(&console);
        let ask = move || {
            let stdio = match tty_console.tty() {
                Ok(stdio) => stdio,
                Err(err) => {
                    reporter.error(&err.to_string());
                    return;
                }
            };
            if let Err(payload) = panic::catch_unwind(AssertUnwindSafe(move || run_under_test(stdio)))
            {
                reporter.error(&format!(
                    "code under test panicked: {}",
                    panic_message(payload.as_ref())
                ));
            }
        };
        self.run(&console, Box::new(ask), None);
    }

    /// Spawn `command` on a fresh pseudo-terminal while playing the queue.
    ///
    /// The program is killed when the deadline passes.
    pub fn start_command(&self, command: &CommandSpec) {
        let _guard = self.begin();
        let (console, mut child) = match PtyConsole::spawn(command, self.config.console()) {
            Ok(spawned) => spawned,
            Err(err) => {
                self.reporter.error(&err.to_string());
                return;
            }
        };

        let killer = child.clone_killer();
        let reporter = Arc::clone(&self.reporter);
        let ask = move || match child.wait() {
            Ok(status) if status.success() => tracing::debug!("program exited"),
            Ok(status) => {
                reporter.log(&format!("program exited with code {}", status.exit_code()));
            }
            Err(err) => reporter.error(&format!("failed to wait for program: {err}")),
        };
        self.run(&Arc::new(console), Box::new(ask), Some(killer));
    }

    fn begin(&self) -> MutexGuard<'_, ()> {
        let guard = self
            .start_lock
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        self.started.store(true, Ordering::Release);
        guard
    }

    fn run(
        &self,
        console: &Arc<PtyConsole>,
        ask: Box<dyn FnOnce() + Send>,
        mut killer: Option<Killer>,
    ) {
        let timeout = self.config.timeout();
        let deadline = Instant::now() + timeout;
        let ask_done = Signal::new();
        let answer_done = Signal::new();
        let stop = Signal::new();
        tracing::info!(
            steps = self.steps.len(),
            timeout_ms = self.config.timeout_ms,
            "survey started"
        );

        let flow_console = Arc::clone(console);
        let done = ask_done.clone();
        self.spawn_flow(Flow::Ask, &ask_done, move || {
            ask();
            tracing::debug!("close console");
            flow_console.close_tty();
            flow_console.close();
            done.notify();
        });

        let answer = AnswerFlow {
            steps: Arc::clone(&self.steps),
            console: Arc::clone(console),
            reporter: Arc::clone(&self.reporter),
            config: self.config.clone(),
            stop: stop.clone(),
            done: answer_done.clone(),
        };
        self.spawn_flow(Flow::Answer, &answer_done, move || answer.run());

        if !watch(&ask_done, deadline) {
            self.timed_out(Flow::Ask, timeout, &stop, console);
            if let Some(killer) = killer.as_mut() {
                if let Err(err) = killer.kill() {
                    tracing::debug!(error = %err, "failed to kill program");
                }
            }
        }
        if !watch(&answer_done, deadline.max(Instant::now() + ANSWER_GRACE)) {
            self.timed_out(Flow::Answer, timeout, &stop, console);
        }
        console.close();

        self.reporter
            .log(&format!("Raw output: {:?}", console.raw_output()));
        self.reporter
            .log(&format!("State:\n{}", console.screen().dump()));
        tracing::info!(remaining = self.steps.len(), "survey finished");
    }

    fn spawn_flow(&self, flow: Flow, done: &Signal, body: impl FnOnce() + Send + 'static) {
        let spawned = thread::Builder::new()
            .name(format!("promptbox-{flow}"))
            .spawn(body);
        if let Err(err) = spawned {
            self.reporter
                .error(&format!("failed to start the {flow} flow: {err}"));
            done.notify();
        }
    }

    fn timed_out(&self, flow: Flow, after: Duration, stop: &Signal, console: &PtyConsole) {
        self.reporter
            .error(&ExpectError::Timeout { flow, after }.to_string());
        stop.notify();
        console.close();
    }
}

/// The queue consumer, moved onto its own thread.
struct AnswerFlow {
    steps: Arc<Steps>,
    console: Arc<PtyConsole>,
    reporter: Arc<dyn Reporter>,
    config: SurveyConfig,
    stop: Signal,
    done: Signal,
}

impl AnswerFlow {
    fn run(self) {
        let pacing = self.config.pacing();
        match self.steps.run_all(self.console.as_ref(), &pacing, Some(&self.stop)) {
            Ok(completion) => {
                tracing::debug!(?completion, "answers finished");
                if let Err(err) = self.console.expect_eof() {
                    tracing::debug!(error = %err, "no end of output");
                }
            }
            Err(err) if self.stop.is_notified() => {
                tracing::debug!(error = %err, "answer flow stopped");
            }
            Err(err) => {
                self.reporter.error(&err.to_string());
                self.console.close();
            }
        }
        self.done.notify();
    }
}

fn single() -> Answer {
    Answer::Single(Step::NoAnswer)
}

fn sequence() -> Answer {
    Answer::Sequence(Arc::new(Steps::inline()))
}

/// Wait for `done` until `deadline`. Returns whether it fired.
fn watch(done: &Signal, deadline: Instant) -> bool {
    let finished = done.wait();
    select! {
        recv(finished) -> _ => true,
        recv(after(deadline.saturating_duration_since(Instant::now()))) -> _ => done.is_notified(),
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "non-string panic payload".to_string()
    }
}
