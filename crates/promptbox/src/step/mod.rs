//! Atomic interactions and the queue that sequences them.
//!
//! A [`Step`] does one thing against a [`Console`] and reports whether it
//! succeeded, still expects more rounds ([`ExpectError::NotFinished`]), was
//! deliberately interrupted ([`ExpectError::Interrupted`]) or failed.
//! [`Steps`] is the FIFO that runs them.
//!
//! # Key Types
//!
//! - [`Step`] - Closed set of interactions
//! - [`Reply`] / [`ReplyMode`] - Literal text sent in answer to a prompt
//! - [`OptionList`] - Rendered list of select or multi-select options
//! - [`Steps`] - Closable, mutex-guarded step queue
//!
//! # Key Operations
//!
//! - [`Step::execute`] - Run one interaction
//! - [`Step::describe`] - What the step still expects, for failure reports
//! - [`Steps::run_head`] / [`Steps::run_all`] - Consume the queue

mod queue;

pub use queue::{Completion, QueueStyle, Steps};

use crate::console::Console;
use crate::error::{ExpectError, ExpectResult};
use crate::key::Key;
use crate::model::Pacing;
use crate::prompt::PromptExpectation;
use crate::report;
use crate::terminal::CURSOR_QUERY;
use std::fmt;
use std::sync::Arc;
use std::thread;

/// Help trigger understood by interactive prompts.
pub const HELP_TRIGGER: &str = "?";

/// One interaction with the program under test.
#[derive(Clone, Debug)]
pub enum Step {
    /// Accept the default by sending an empty line.
    NoAnswer,
    /// Cancel the prompt with Ctrl+C followed by a newline.
    Interrupt,
    /// Ask for help and wait for the help text.
    Help(Help),
    /// Send literal text.
    Reply(Reply),
    /// Press a single key.
    Key(Key),
    /// Wait for text to appear.
    ExpectText(String),
    /// Wait for a rendered option list.
    ExpectOptions(OptionList),
    /// A whole prompt with its own answer and repeat count.
    Prompt(Arc<PromptExpectation>),
}

/// Request for prompt help.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Help {
    /// Text the prompt is expected to show.
    pub text: String,
    /// Send a newline after the trigger (line prompts) or not (list prompts).
    pub submit: bool,
}

/// How a [`Reply`] is typed and what is checked afterwards.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ReplyMode {
    /// Send the text as one line.
    Line,
    /// Type the text without submitting it.
    Typed,
    /// Type the text, expect one `*` per character, then submit.
    Masked,
    /// Send each line separately, then the terminating empty line.
    Multiline,
    /// Type the text and wait for the program to give up.
    Interrupted,
}

/// Literal text sent to the program under test.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Reply {
    /// Text to send.
    pub text: String,
    /// Typing mode.
    pub mode: ReplyMode,
    /// Text the program is expected to print in response.
    pub feedback: Option<String>,
}

impl Reply {
    /// Reply sent as a single line.
    pub fn line(text: impl Into<String>) -> Self {
        Self::with_mode(text, ReplyMode::Line)
    }

    /// Reply with the given mode and no feedback.
    pub fn with_mode(text: impl Into<String>, mode: ReplyMode) -> Self {
        Self {
            text: text.into(),
            mode,
            feedback: None,
        }
    }

    fn execute(&self, console: &dyn Console, pacing: &Pacing) -> ExpectResult {
        match self.mode {
            ReplyMode::Line => console.send_line(&self.text),
            ReplyMode::Typed => console.send(&self.text),
            ReplyMode::Interrupted => {
                console.send(&self.text);
                console.expect_eof()?;
                return Ok(());
            }
            ReplyMode::Masked => {
                if !self.text.is_empty() {
                    console.send(&self.text);
                    console.expect_string(&"*".repeat(self.text.chars().count()))?;
                }
                console.send_line("");
            }
            ReplyMode::Multiline => {
                let mut lines: Vec<&str> = self.text.split('\n').collect();
                if !self.text.is_empty() {
                    lines.push("");
                }
                lines.push("");
                for (idx, line) in lines.iter().enumerate() {
                    if idx > 0 && pacing.cursor_handshake {
                        wait_for_cursor(console, pacing)?;
                    }
                    console.send_line(line);
                }
            }
        }
        if let Some(feedback) = &self.feedback {
            console.expect_string(feedback)?;
        }
        Ok(())
    }
}

impl fmt::Display for Reply {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.mode == ReplyMode::Typed {
            return write!(f, "type {}", report::quoted(&self.text));
        }
        f.write_str(&report::quoted(&self.text))?;
        if self.mode == ReplyMode::Interrupted {
            f.write_str(" and get interrupted")?;
        } else if let Some(feedback) = &self.feedback {
            write!(f, " and get feedback {}", report::quoted(feedback))?;
        }
        Ok(())
    }
}

/// Which list a prompt renders.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ListKind {
    /// Single choice.
    Select,
    /// Multiple choice.
    MultiSelect,
}

/// Options as the prompt renders them, in order.
///
/// The highlighted option carries the `> ` indicator; every other option is
/// matched with two spaces of padding in its place.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OptionList {
    /// Kind of list.
    pub kind: ListKind,
    /// Options, highlighted one prefixed with `> `.
    pub options: Vec<String>,
}

/// Prefix marking the highlighted option.
pub const INDICATOR: &str = "> ";

impl OptionList {
    /// Lines to look for, padded when not highlighted.
    pub fn rendered(&self) -> Vec<String> {
        self.options
            .iter()
            .map(|option| {
                if option.starts_with(INDICATOR) {
                    option.clone()
                } else {
                    format!("  {option}")
                }
            })
            .collect()
    }
}

impl fmt::Display for OptionList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = match self.kind {
            ListKind::Select => "select",
            ListKind::MultiSelect => "multiselect",
        };
        write!(f, "expect {kind} list {:?}", self.rendered())
    }
}

impl Step {
    /// Run the step against `console`.
    pub fn execute(&self, console: &dyn Console, pacing: &Pacing) -> ExpectResult {
        match self {
            Self::NoAnswer => {
                console.send_line("");
                Ok(())
            }
            Self::Interrupt => {
                console.send_line(Key::Interrupt.sequence());
                Err(ExpectError::Interrupted)
            }
            Self::Help(help) => {
                if help.submit {
                    console.send_line(HELP_TRIGGER);
                } else {
                    console.send(HELP_TRIGGER);
                }
                console.expect_string(&help.text)?;
                Ok(())
            }
            Self::Reply(reply) => reply.execute(console, pacing),
            Self::Key(key) => {
                console.send(key.sequence());
                if *key == Key::Interrupt {
                    return Err(ExpectError::Interrupted);
                }
                Ok(())
            }
            Self::ExpectText(text) => {
                console.expect_string(text)?;
                Ok(())
            }
            Self::ExpectOptions(list) => {
                for line in list.rendered() {
                    console.expect_string(&line)?;
                }
                Ok(())
            }
            Self::Prompt(prompt) => prompt.execute(console, pacing),
        }
    }

    /// Human-readable rendering of what this step expects.
    pub fn describe(&self) -> String {
        match self {
            Self::NoAnswer => report::NO_ANSWER.to_string(),
            Self::Interrupt => report::INTERRUPT.to_string(),
            Self::Help(help) => format!(
                "press {} and see {}",
                report::quoted(HELP_TRIGGER),
                report::quoted(&help.text)
            ),
            Self::Reply(reply) => reply.to_string(),
            Self::Key(key) => key.to_string(),
            Self::ExpectText(text) => format!("expect {}", report::quoted(text)),
            Self::ExpectOptions(list) => list.to_string(),
            Self::Prompt(prompt) => prompt.describe(),
        }
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.describe())
    }
}

/// Wait for the two cursor-position queries a prompt sends before reading input.
pub(crate) fn wait_for_cursor(console: &dyn Console, pacing: &Pacing) -> ExpectResult {
    for _ in 0..2 {
        console.expect_string(CURSOR_QUERY)?;
    }
    if !pacing.reaction_time.is_zero() {
        thread::sleep(pacing.reaction_time);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::console::MemoryConsole;

    fn run(step: &Step, output: &str) -> (ExpectResult, MemoryConsole) {
        let console = MemoryConsole::new();
        console.emit(output);
        console.finish();
        let result = step.execute(&console, &Pacing::immediate());
        (result, console)
    }

    #[test]
    fn masked_reply_waits_for_stars() {
        let step = Step::Reply(Reply::with_mode("secret", ReplyMode::Masked));
        let (result, console) = run(&step, "******");
        result.unwrap();
        assert_eq!(console.sent(), vec!["secret", "\n"]);
    }

    #[test]
    fn empty_masked_reply_only_submits() {
        let step = Step::Reply(Reply::with_mode("", ReplyMode::Masked));
        let (result, console) = run(&step, "");
        result.unwrap();
        assert_eq!(console.sent(), vec!["\n"]);
    }

    #[test]
    fn multiline_reply_terminates_with_blank_lines() {
        let step = Step::Reply(Reply::with_mode("first\nsecond", ReplyMode::Multiline));
        let (result, console) = run(&step, "");
        result.unwrap();
        assert_eq!(console.sent_text(), "first\nsecond\n\n\n");

        let empty = Step::Reply(Reply::with_mode("", ReplyMode::Multiline));
        let (result, console) = run(&empty, "");
        result.unwrap();
        assert_eq!(console.sent_text(), "\n\n");
    }

    #[test]
    fn interrupted_reply_waits_for_eof() {
        let step = Step::Reply(Reply::with_mode("half", ReplyMode::Interrupted));
        let (result, console) = run(&step, "^C");
        result.unwrap();
        assert_eq!(console.sent_text(), "half");
    }

    #[test]
    fn interrupt_key_and_step_report_interrupted() {
        let (result, console) = run(&Step::Key(Key::Interrupt), "");
        assert!(result.unwrap_err().is_interrupted());
        assert_eq!(console.sent_text(), "\x03");

        let (result, console) = run(&Step::Interrupt, "");
        assert!(result.unwrap_err().is_interrupted());
        assert_eq!(console.sent_text(), "\x03\n");
    }

    #[test]
    fn option_list_pads_unselected_options() {
        let list = OptionList {
            kind: ListKind::Select,
            options: vec!["> United Kingdom".to_string(), "United States".to_string()],
        };
        let (result, _) = run(
            &Step::ExpectOptions(list.clone()),
            "> United Kingdom\r\n  United States\r\n",
        );
        result.unwrap();
        assert_eq!(
            list.to_string(),
            r#"expect select list ["> United Kingdom", "  United States"]"#
        );
    }

    #[test]
    fn missing_help_is_a_hard_failure() {
        let step = Step::Help(Help {
            text: "It is your email".to_string(),
            submit: true,
        });
        let (result, console) = run(&step, "no help here");
        assert!(matches!(
            result.unwrap_err(),
            ExpectError::Console(crate::error::ConsoleError::Eof { .. })
        ));
        assert_eq!(console.sent_text(), "?\n");
    }

    #[test]
    fn descriptions() {
        let mut reply = Reply::line("yes");
        assert_eq!(Step::Reply(reply.clone()).describe(), r#""yes""#);
        reply.feedback = Some("Sorry".to_string());
        assert_eq!(
            Step::Reply(reply).describe(),
            r#""yes" and get feedback "Sorry""#
        );
        assert_eq!(
            Step::Reply(Reply::with_mode("no", ReplyMode::Interrupted)).describe(),
            r#""no" and get interrupted"#
        );
        assert_eq!(
            Step::Reply(Reply::with_mode("Uni", ReplyMode::Typed)).describe(),
            r#"type "Uni""#
        );
        assert_eq!(Step::Key(Key::ArrowDown).describe(), "press ARROW DOWN");
        assert_eq!(Step::NoAnswer.describe(), "<no answer>");
        assert_eq!(Step::Interrupt.describe(), "<interrupt>");
    }
}
