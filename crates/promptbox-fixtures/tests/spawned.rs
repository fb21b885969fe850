// Test module - relaxed lint rules
#![allow(clippy::panic)]
#![allow(clippy::manual_assert)]
#![allow(clippy::uninlined_format_args)]
#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(missing_docs)]

//! Survey integration tests against spawned fixture programs
//!
//! Runs the fixture binaries through `Survey::start_command`, so the prompts
//! talk to a controlling terminal of their own.

use promptbox::{CommandSpec, RecordingReporter, Survey, SurveyConfig};
use promptbox_fixtures::init_tracing;
use std::sync::Arc;

const SIGNUP: &str = env!("CARGO_BIN_EXE_promptbox-signup-fixture");
const COUNTRY: &str = env!("CARGO_BIN_EXE_promptbox-country-fixture");

fn survey_with(config: SurveyConfig) -> (Survey, Arc<RecordingReporter>) {
    init_tracing();
    let reporter = Arc::new(RecordingReporter::new());
    let survey = Survey::new()
        .with_config(config)
        .with_reporter(reporter.clone());
    (survey, reporter)
}

fn survey() -> (Survey, Arc<RecordingReporter>) {
    survey_with(SurveyConfig {
        timeout_ms: 10_000,
        ..SurveyConfig::default()
    })
}

fn raw_output(reporter: &RecordingReporter) -> String {
    reporter
        .logs()
        .into_iter()
        .find(|log| log.starts_with("Raw output:"))
        .expect("raw output was not logged")
}

#[test]
fn signup_form_completes() {
    let (survey, reporter) = survey();
    survey.expect_input("What is your name?").answer("Ada");
    survey.expect_password("Choose a password:").answer("hunter2");
    survey.expect_confirm("Subscribe to the newsletter?").yes();

    survey.start_command(&CommandSpec::new(SIGNUP));

    assert!(reporter.errors().is_empty(), "{:?}", reporter.errors());
    survey.expectations_were_met().unwrap();
    assert!(raw_output(&reporter).contains("Welcome, Ada! password: 7 chars, newsletter: yes"));
}

#[test]
fn signup_form_with_cursor_handshake() {
    let (survey, reporter) = survey_with(SurveyConfig {
        timeout_ms: 10_000,
        cursor_handshake: true,
        ..SurveyConfig::default()
    });
    survey
        .expect_input("What is your name?")
        .show_help("Your first name is enough");
    survey.expect_input("What is your name?").answer("Grace");
    survey.expect_password("Choose a password:").answer("");
    survey.expect_confirm("Subscribe to the newsletter?").no();

    survey.start_command(&CommandSpec::new(SIGNUP).arg("--cursor-handshake"));

    assert!(reporter.errors().is_empty(), "{:?}", reporter.errors());
    survey.expectations_were_met().unwrap();
    assert!(raw_output(&reporter).contains("Welcome, Grace! password: 0 chars, newsletter: no"));
}

#[test]
fn interrupted_program_exits() {
    let (survey, reporter) = survey();
    survey.expect_input("What is your name?").interrupt();

    survey.start_command(&CommandSpec::new(SIGNUP));

    assert!(reporter.errors().is_empty(), "{:?}", reporter.errors());
    survey.expectations_were_met().unwrap();
    assert!(reporter
        .logs()
        .iter()
        .any(|log| log == "program exited with code 130"));
}

#[test]
fn country_is_selected() {
    let (survey, reporter) = survey();
    survey
        .expect_select("Select a country")
        .show_help("Where you live")
        .move_down(3)
        .expect_options(["United States", "> Vietnam"])
        .enter();

    survey.start_command(&CommandSpec::new(COUNTRY));

    assert!(reporter.errors().is_empty(), "{:?}", reporter.errors());
    survey.expectations_were_met().unwrap();
    assert!(raw_output(&reporter).contains("You picked Vietnam"));
}

#[test]
fn hanging_program_is_killed_at_the_deadline() {
    let (survey, reporter) = survey_with(SurveyConfig {
        timeout_ms: 1_000,
        ..SurveyConfig::default()
    });
    survey.expect_input("What is your name?").answer("Ada");
    survey.expect_input("What is your quest?").answer("To test");

    survey.start_command(&CommandSpec::new(SIGNUP));

    assert_eq!(reporter.errors(), vec!["ask timeout exceeded".to_string()]);
    let unmet = survey.expectations_were_met().unwrap_err();
    assert!(unmet.pending.contains("What is your quest?"));
    assert!(!unmet.pending.contains("What is your name?"));
}

#[test]
fn missing_program_is_reported() {
    let (survey, reporter) = survey();
    survey.expect_confirm("Proceed?").yes();

    survey.start_command(&CommandSpec::new("/nonexistent/promptbox-fixture"));

    assert_eq!(reporter.errors().len(), 1);
    assert!(survey.expectations_were_met().is_err());
}
