//! Prompt fixture: a short sign-up form.
//! Asks for a name, a password and newsletter consent, then prints a summary.
//!
//! Pass `--cursor-handshake` to query the cursor position before each line.

// Test fixtures require special allowances - they are not production code
#![allow(clippy::print_stdout)] // Fixtures must print to the terminal
#![allow(clippy::print_stderr)]

use promptbox_fixtures::{PromptError, Prompter};
use std::process::ExitCode;

fn main() -> ExitCode {
    let handshake = std::env::args().any(|arg| arg == "--cursor-handshake");
    match run(handshake) {
        Ok(summary) => {
            print!("{summary}\r\n");
            ExitCode::SUCCESS
        }
        Err(PromptError::Interrupted) => ExitCode::from(130),
        Err(err) => {
            eprint!("{err}\r\n");
            ExitCode::FAILURE
        }
    }
}

fn run(handshake: bool) -> Result<String, PromptError> {
    let mut prompter = Prompter::from_process()?.with_cursor_handshake(handshake);
    let name = prompter.input("What is your name?", Some("Your first name is enough"))?;
    let password = prompter.password("Choose a password:", None)?;
    let newsletter = prompter.confirm("Subscribe to the newsletter?", false, None)?;
    Ok(format!(
        "Welcome, {name}! password: {} chars, newsletter: {}",
        password.chars().count(),
        if newsletter { "yes" } else { "no" }
    ))
}
