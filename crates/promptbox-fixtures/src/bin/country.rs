//! Prompt fixture: asks for a country and prints the choice.
//! Used for testing surveys against a spawned program.

// Test fixtures require special allowances - they are not production code
#![allow(clippy::print_stdout)] // Fixtures must print to the terminal
#![allow(clippy::print_stderr)]

use promptbox_fixtures::{PromptError, Prompter};
use std::process::ExitCode;

const COUNTRIES: [&str; 4] = ["Germany", "United Kingdom", "United States", "Vietnam"];

fn main() -> ExitCode {
    match run() {
        Ok(country) => {
            print!("You picked {country}\r\n");
            ExitCode::SUCCESS
        }
        Err(PromptError::Interrupted) => ExitCode::from(130),
        Err(err) => {
            eprint!("{err}\r\n");
            ExitCode::FAILURE
        }
    }
}

fn run() -> Result<String, PromptError> {
    let mut prompter = Prompter::from_process()?;
    prompter.select("Select a country", &COUNTRIES, Some("Where you live"))
}
