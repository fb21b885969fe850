//! Typed handles returned by the `Survey::expect_*` methods.
//!
//! Handles are cheap to clone and consume `self` so calls chain:
//!
//! ```
//! use promptbox::Survey;
//!
//! let survey = Survey::new();
//! survey.expect_input("Enter your name:").times(2).answer("Ada");
//! survey
//!     .expect_select("Select a country")
//!     .type_text("United")
//!     .move_down(1)
//!     .enter();
//! assert_eq!(survey.len(), 2);
//! ```

use crate::key::Key;
use crate::prompt::PromptExpectation;
use crate::prompt::PromptState;
use crate::report;
use crate::step::{Help, ListKind, OptionList, Reply, ReplyMode, Step, Steps};
use std::iter;
use std::sync::Arc;

/// Repeat count and inspection methods shared by every prompt handle.
macro_rules! prompt_handle {
    ($name:ident) => {
        impl $name {
            pub(crate) fn new(expectation: Arc<PromptExpectation>) -> Self {
                Self { expectation }
            }

            /// Expect the prompt exactly `times` times.
            #[must_use]
            pub fn times(self, times: usize) -> Self {
                self.expectation.set_times(times);
                self
            }

            /// Expect the prompt once.
            #[must_use]
            pub fn once(self) -> Self {
                self.times(1)
            }

            /// Expect the prompt twice.
            #[must_use]
            pub fn twice(self) -> Self {
                self.times(2)
            }

            /// Rounds still expected.
            pub fn remaining(&self) -> usize {
                self.expectation.remaining()
            }

            /// Rounds answered so far.
            pub fn calls(&self) -> usize {
                self.expectation.calls()
            }

            /// Current lifecycle state.
            pub fn state(&self) -> PromptState {
                self.expectation.state()
            }

            /// Report block for this prompt.
            pub fn describe(&self) -> String {
                self.expectation.describe()
            }
        }
    };
}

/// A scripted reply that can still be turned into an interrupted one.
#[derive(Clone, Debug)]
pub struct ScriptedAnswer {
    expectation: Arc<PromptExpectation>,
}

impl ScriptedAnswer {
    /// Type the answer without submitting it and expect the program to end.
    pub fn interrupted(self) {
        self.expectation.mark_interrupted();
    }
}

/// Expectation for a yes/no question.
#[derive(Clone, Debug)]
pub struct ConfirmPrompt {
    expectation: Arc<PromptExpectation>,
}

prompt_handle!(ConfirmPrompt);

impl ConfirmPrompt {
    /// Answer `yes`.
    pub fn yes(self) -> ScriptedAnswer {
        self.reply(Reply::line("yes"))
    }

    /// Answer `no`.
    pub fn no(self) -> ScriptedAnswer {
        self.reply(Reply::line("no"))
    }

    /// Answer with arbitrary text.
    ///
    /// Anything other than an empty line is expected to be rejected with the
    /// prompt's "not a valid answer" feedback.
    pub fn answer(self, answer: impl Into<String>) -> ScriptedAnswer {
        let mut reply = Reply::line(answer);
        if !reply.text.is_empty() {
            reply.feedback = Some(invalid_confirm_feedback(&reply.text));
        }
        self.reply(reply)
    }

    /// Ask for help and expect `help`. Collapses the repeat count to one.
    pub fn show_help(self, help: impl Into<String>) {
        self.expectation.answer_once(line_help(help));
    }

    /// Interrupt the prompt. Collapses the repeat count to one.
    pub fn interrupt(self) {
        self.expectation.answer_once(Step::Interrupt);
    }

    fn reply(self, reply: Reply) -> ScriptedAnswer {
        self.expectation.set_answer(Step::Reply(reply));
        ScriptedAnswer {
            expectation: self.expectation,
        }
    }
}

/// Feedback printed by a confirm prompt for an unrecognised answer.
pub fn invalid_confirm_feedback(answer: &str) -> String {
    format!(
        "Sorry, your reply was invalid: {} is not a valid answer, please try again.",
        report::quoted(answer)
    )
}

/// Expectation for a single line of text.
#[derive(Clone, Debug)]
pub struct InputPrompt {
    expectation: Arc<PromptExpectation>,
}

prompt_handle!(InputPrompt);

impl InputPrompt {
    /// Send `answer` as a line.
    pub fn answer(self, answer: impl Into<String>) -> ScriptedAnswer {
        self.expectation.set_answer(Step::Reply(Reply::line(answer)));
        ScriptedAnswer {
            expectation: self.expectation,
        }
    }

    /// Ask for help and expect `help`. Collapses the repeat count to one.
    pub fn show_help(self, help: impl Into<String>) {
        self.expectation.answer_once(line_help(help));
    }

    /// Interrupt the prompt. Collapses the repeat count to one.
    pub fn interrupt(self) {
        self.expectation.answer_once(Step::Interrupt);
    }
}

/// Expectation for a masked line.
#[derive(Clone, Debug)]
pub struct PasswordPrompt {
    expectation: Arc<PromptExpectation>,
}

prompt_handle!(PasswordPrompt);

impl PasswordPrompt {
    /// Type `answer`, expect it echoed as asterisks, then submit.
    pub fn answer(self, answer: impl Into<String>) -> ScriptedAnswer {
        self.expectation
            .set_answer(Step::Reply(Reply::with_mode(answer, ReplyMode::Masked)));
        ScriptedAnswer {
            expectation: self.expectation,
        }
    }

    /// Ask for help and expect `help`. Collapses the repeat count to one.
    pub fn show_help(self, help: impl Into<String>) {
        self.expectation.answer_once(line_help(help));
    }

    /// Interrupt the prompt. Collapses the repeat count to one.
    pub fn interrupt(self) {
        self.expectation.answer_once(Step::Interrupt);
    }
}

/// Expectation for several lines of text.
#[derive(Clone, Debug)]
pub struct MultilinePrompt {
    expectation: Arc<PromptExpectation>,
}

prompt_handle!(MultilinePrompt);

impl MultilinePrompt {
    /// Send each line of `answer`, then the terminating empty line.
    pub fn answer(self, answer: impl Into<String>) -> ScriptedAnswer {
        self.expectation
            .set_answer(Step::Reply(Reply::with_mode(answer, ReplyMode::Multiline)));
        ScriptedAnswer {
            expectation: self.expectation,
        }
    }

    /// Interrupt the prompt. Collapses the repeat count to one.
    pub fn interrupt(self) {
        self.expectation.answer_once(Step::Interrupt);
    }
}

fn line_help(help: impl Into<String>) -> Step {
    Step::Help(Help {
        text: help.into(),
        submit: true,
    })
}

/// Keystroke script shared by the list prompts.
macro_rules! list_script {
    ($name:ident, $kind:expr) => {
        impl $name {
            fn push(self, steps: impl IntoIterator<Item = Step>) -> Self {
                if let Some(sequence) = self.expectation.sequence() {
                    sequence.append(steps);
                }
                self
            }

            fn press(self, key: Key, times: usize) -> Self {
                self.push(iter::repeat(Step::Key(key)).take(times))
            }

            /// Toggle help with `?` and expect `help` to be shown.
            ///
            /// # Panics
            ///
            /// Panics if the sequence was already ended with
            /// [`enter`](Self::enter) or [`interrupt`](Self::interrupt).
            #[must_use]
            pub fn show_help(self, help: impl Into<String>) -> Self {
                self.push([Step::Help(Help {
                    text: help.into(),
                    submit: false,
                })])
            }

            /// Type text into the filter.
            ///
            /// # Panics
            ///
            /// Panics if the sequence was already ended.
            #[must_use]
            pub fn type_text(self, text: impl Into<String>) -> Self {
                self.push([Step::Reply(Reply::with_mode(text, ReplyMode::Typed))])
            }

            /// Press TAB `times` times.
            ///
            /// # Panics
            ///
            /// Panics if the sequence was already ended.
            #[must_use]
            pub fn tab(self, times: usize) -> Self {
                self.press(Key::Tab, times)
            }

            /// Press DELETE `times` times.
            ///
            /// # Panics
            ///
            /// Panics if the sequence was already ended.
            #[must_use]
            pub fn delete(self, times: usize) -> Self {
                self.press(Key::Delete, times)
            }

            /// Press ARROW UP `times` times.
            ///
            /// # Panics
            ///
            /// Panics if the sequence was already ended.
            #[must_use]
            pub fn move_up(self, times: usize) -> Self {
                self.press(Key::ArrowUp, times)
            }

            /// Press ARROW DOWN `times` times.
            ///
            /// # Panics
            ///
            /// Panics if the sequence was already ended.
            #[must_use]
            pub fn move_down(self, times: usize) -> Self {
                self.press(Key::ArrowDown, times)
            }

            /// Expect the options to be rendered in this order.
            ///
            /// The highlighted option is written with its `> ` indicator.
            ///
            /// # Panics
            ///
            /// Panics if the sequence was already ended.
            #[must_use]
            pub fn expect_options<S: Into<String>>(
                self,
                options: impl IntoIterator<Item = S>,
            ) -> Self {
                self.push([Step::ExpectOptions(OptionList {
                    kind: $kind,
                    options: options.into_iter().map(Into::into).collect(),
                })])
            }

            /// Press ENTER and end the sequence.
            ///
            /// # Panics
            ///
            /// Panics if the sequence was already ended.
            pub fn enter(self) {
                self.end(Key::Enter);
            }

            /// Press Ctrl+C and end the sequence. Collapses the repeat count
            /// to one.
            ///
            /// # Panics
            ///
            /// Panics if the sequence was already ended.
            pub fn interrupt(self) {
                self.end(Key::Interrupt);
            }

            fn end(self, key: Key) {
                if key == Key::Interrupt {
                    self.expectation.set_times(1);
                }
                let sequence = self.expectation.sequence();
                self.press(key, 1);
                if let Some(sequence) = sequence {
                    sequence.close();
                }
            }

            /// The inline sequence, for inspection.
            pub fn steps(&self) -> Option<Arc<Steps>> {
                self.expectation.sequence()
            }
        }
    };
}

/// Expectation for a single-choice list.
#[derive(Clone, Debug)]
pub struct SelectPrompt {
    expectation: Arc<PromptExpectation>,
}

prompt_handle!(SelectPrompt);
list_script!(SelectPrompt, ListKind::Select);

/// Expectation for a multiple-choice list.
#[derive(Clone, Debug)]
pub struct MultiSelectPrompt {
    expectation: Arc<PromptExpectation>,
}

prompt_handle!(MultiSelectPrompt);
list_script!(MultiSelectPrompt, ListKind::MultiSelect);

impl MultiSelectPrompt {
    /// Toggle the highlighted option with SPACE.
    ///
    /// # Panics
    ///
    /// Panics if the sequence was already ended.
    #[must_use]
    pub fn select(self) -> Self {
        self.press(Key::Space, 1)
    }

    /// Select every option with ARROW RIGHT.
    ///
    /// # Panics
    ///
    /// Panics if the sequence was already ended.
    #[must_use]
    pub fn select_all(self) -> Self {
        self.press(Key::ArrowRight, 1)
    }

    /// Clear the selection with ARROW LEFT.
    ///
    /// # Panics
    ///
    /// Panics if the sequence was already ended.
    #[must_use]
    pub fn select_none(self) -> Self {
        self.press(Key::ArrowLeft, 1)
    }
}
