//! Interactive prompts used as the program under test.
//!
//! [`prompts::Prompter`] implements confirm, input, password, multiline,
//! select and multi-select prompts over a raw-mode terminal, close enough to
//! what an interactive prompt library prints and reads for the harness to be
//! exercised end to end.

pub mod helpers;
pub mod prompts;

pub use helpers::init_tracing;
pub use prompts::{PromptError, Prompter};
