//! Promptbox: scripted expectations for interactive terminal prompts.
//!
//! A test declares the prompts it expects a program to ask, in order, together
//! with the answers a user would type. [`Survey::start`] then runs the program
//! on a pseudo-terminal and plays those answers as the prompts appear. After
//! the run, [`Survey::expectations_were_met`] reports whatever was never asked.
//!
//! ```no_run
//! use promptbox::reporter::RecordingReporter;
//! use promptbox::Survey;
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! let reporter = Arc::new(RecordingReporter::new());
//! let survey = Survey::new()
//!     .with_timeout(Duration::from_secs(1))
//!     .with_reporter(reporter.clone());
//! survey.expect_confirm("Proceed?").yes();
//! survey.expect_password("Password:").answer("hunter2");
//!
//! survey.start(|stdio| {
//!     // run the prompts under test against `stdio`
//!     drop(stdio);
//! });
//!
//! for failure in reporter.errors() {
//!     eprintln!("{failure}");
//! }
//! if let Err(unmet) = survey.expectations_were_met() {
//!     eprintln!("{unmet}");
//! }
//! ```

#![forbid(unsafe_code)]

pub mod console;
pub mod error;
pub mod key;
pub mod model;
pub mod prompt;
mod report;
pub mod reporter;
pub mod signal;
pub mod step;
pub mod survey;
pub mod terminal;

pub use crate::console::{CommandSpec, Console, MemoryConsole, PtyConsole, Stdio};
pub use crate::error::{ConsoleError, ExpectError, Flow, UnmetExpectations};
pub use crate::key::Key;
pub use crate::model::{Pacing, SurveyConfig, TerminalSize};
pub use crate::prompt::{PromptExpectation, PromptKind, PromptState};
pub use crate::reporter::{RecordingReporter, Reporter, TracingReporter};
pub use crate::signal::Signal;
pub use crate::step::{Step, Steps};
pub use crate::survey::{CheckedSurvey, Survey};
