// Test module - relaxed lint rules
#![allow(clippy::indexing_slicing)]
#![allow(clippy::panic)]
#![allow(clippy::manual_assert)]
#![allow(clippy::uninlined_format_args)]
#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(missing_docs)]

//! Survey integration tests against prompts running in this process
//!
//! Every test runs the fixture prompts on a fresh pseudo-terminal and checks
//! what they returned, what the survey reported and what is left unmet.

use promptbox::{RecordingReporter, Survey, SurveyConfig};
use promptbox_fixtures::{init_tracing, PromptError, Prompter};
use std::io;
use std::sync::mpsc;
use std::sync::Arc;
use std::time::{Duration, Instant};

const COUNTRIES: [&str; 4] = ["Germany", "United Kingdom", "United States", "Vietnam"];

// =============================================================================
// Helper Functions
// =============================================================================

fn survey() -> (Survey, Arc<RecordingReporter>) {
    survey_with(SurveyConfig {
        timeout_ms: 5_000,
        ..SurveyConfig::default()
    })
}

fn survey_with(config: SurveyConfig) -> (Survey, Arc<RecordingReporter>) {
    init_tracing();
    let reporter = Arc::new(RecordingReporter::new());
    let survey = Survey::new()
        .with_config(config)
        .with_reporter(reporter.clone());
    (survey, reporter)
}

/// Run `body` as the code under test and hand back what it returned.
fn run_prompts<T, F>(survey: &Survey, body: F) -> Result<T, PromptError>
where
    T: Send + 'static,
    F: FnOnce(&mut Prompter) -> Result<T, PromptError> + Send + 'static,
{
    let handshake = survey.config().cursor_handshake;
    let (tx, rx) = mpsc::channel();
    survey.start(move |stdio| {
        let result = Prompter::from_stdio(stdio)
            .and_then(|prompter| body(&mut prompter.with_cursor_handshake(handshake)));
        tx.send(result).unwrap();
    });
    rx.try_recv().expect("code under test did not finish")
}

fn assert_clean(survey: &Survey, reporter: &RecordingReporter) {
    assert!(
        reporter.errors().is_empty(),
        "unexpected failures: {:?}",
        reporter.errors()
    );
    survey.expectations_were_met().unwrap();
}

// =============================================================================
// Line prompts
// =============================================================================

#[test]
fn confirm_is_answered() {
    let (survey, reporter) = survey();
    survey.expect_confirm("Proceed?").yes();

    let answer = run_prompts(&survey, |p| p.confirm("Proceed?", false, None)).unwrap();

    assert!(answer);
    assert_clean(&survey, &reporter);
}

#[test]
fn form_with_several_prompts() {
    let (survey, reporter) = survey();
    survey.expect_input("What is your name?").answer("Ada");
    survey.expect_password("Choose a password:").answer("hunter2");
    survey.expect_confirm("Subscribe?").no();

    let (name, password, subscribe) = run_prompts(&survey, |p| {
        let name = p.input("What is your name?", None)?;
        let password = p.password("Choose a password:", None)?;
        let subscribe = p.confirm("Subscribe?", true, None)?;
        Ok((name, password, subscribe))
    })
    .unwrap();

    assert_eq!(name, "Ada");
    assert_eq!(password, "hunter2");
    assert!(!subscribe);
    assert_clean(&survey, &reporter);
}

#[test]
fn repeated_prompt_is_answered_every_time() {
    let (survey, reporter) = survey();
    survey.expect_input("Enter a number:").times(3).answer("7");

    let numbers = run_prompts(&survey, |p| {
        (0..3)
            .map(|_| p.input("Enter a number:", None))
            .collect::<Result<Vec<_>, _>>()
    })
    .unwrap();

    assert_eq!(numbers, vec!["7"; 3]);
    assert_clean(&survey, &reporter);
}

#[test]
fn help_is_shown_before_answering() {
    let (survey, reporter) = survey();
    survey
        .expect_input("Enter your email:")
        .show_help("We never share it");
    survey.expect_input("Enter your email:").answer("ada@example.com");

    let email =
        run_prompts(&survey, |p| p.input("Enter your email:", Some("We never share it"))).unwrap();

    assert_eq!(email, "ada@example.com");
    assert_clean(&survey, &reporter);
}

#[test]
fn invalid_confirm_answer_gets_feedback() {
    let (survey, reporter) = survey();
    survey.expect_confirm("Proceed?").answer("maybe");
    survey.expect_confirm("Proceed?").yes();

    let answer = run_prompts(&survey, |p| p.confirm("Proceed?", false, None)).unwrap();

    assert!(answer);
    assert_clean(&survey, &reporter);
}

#[test]
fn multiline_answer_is_sent_line_by_line() {
    let (survey, reporter) = survey();
    survey.expect_multiline("Tell us about yourself").answer("first\nsecond");

    let bio = run_prompts(&survey, |p| p.multiline("Tell us about yourself")).unwrap();

    assert_eq!(bio, "first\nsecond");
    assert_clean(&survey, &reporter);
}

#[test]
fn interrupt_reaches_the_program() {
    let (survey, reporter) = survey();
    survey.expect_input("What is your name?").interrupt();

    let result = run_prompts(&survey, |p| p.input("What is your name?", None));

    assert!(matches!(result, Err(PromptError::Interrupted)));
    assert_clean(&survey, &reporter);
}

// =============================================================================
// List prompts
// =============================================================================

#[test]
fn select_with_help_filter_and_arrows() {
    let (survey, reporter) = survey();
    survey
        .expect_select("Select a country")
        .show_help("Where you live")
        .type_text("united")
        .expect_options(["> United Kingdom", "United States"])
        .move_down(1)
        .enter();

    let country = run_prompts(&survey, |p| {
        p.select("Select a country", &COUNTRIES, Some("Where you live"))
    })
    .unwrap();

    assert_eq!(country, "United States");
    assert_clean(&survey, &reporter);
}

#[test]
fn select_filter_can_be_corrected() {
    let (survey, reporter) = survey();
    survey
        .expect_select("Select a country")
        .type_text("Viet")
        .delete(4)
        .tab(1)
        .enter();

    let country = run_prompts(&survey, |p| p.select("Select a country", &COUNTRIES, None)).unwrap();

    assert_eq!(country, "United Kingdom");
    assert_clean(&survey, &reporter);
}

#[test]
fn multi_select_toggles_options() {
    let (survey, reporter) = survey();
    survey
        .expect_multi_select("Select destinations")
        .select_all()
        .select_none()
        .move_down(1)
        .select()
        .expect_options(["[ ] Germany", "> [x] United Kingdom"])
        .move_down(2)
        .select()
        .enter();

    let chosen = run_prompts(&survey, |p| {
        p.multi_select("Select destinations", &COUNTRIES, None)
    })
    .unwrap();

    assert_eq!(chosen, vec!["United Kingdom", "Vietnam"]);
    assert_clean(&survey, &reporter);
}

#[test]
fn multi_select_can_be_interrupted() {
    let (survey, reporter) = survey();
    survey
        .expect_multi_select("Select destinations")
        .move_down(1)
        .interrupt();

    let result = run_prompts(&survey, |p| {
        p.multi_select("Select destinations", &COUNTRIES, None)
    });

    assert!(matches!(result, Err(PromptError::Interrupted)));
    assert_clean(&survey, &reporter);
}

// =============================================================================
// Terminal behavior
// =============================================================================

#[test]
fn cursor_handshake_is_answered() {
    let (survey, reporter) = survey_with(SurveyConfig {
        timeout_ms: 5_000,
        cursor_handshake: true,
        ..SurveyConfig::default()
    });
    survey.expect_input("What is your name?").answer("Ada");
    survey.expect_multiline("Bio").answer("line one\nline two");

    let (name, bio) = run_prompts(&survey, |p| {
        let name = p.input("What is your name?", None)?;
        let bio = p.multiline("Bio")?;
        Ok((name, bio))
    })
    .unwrap();

    assert_eq!(name, "Ada");
    assert_eq!(bio, "line one\nline two");
    assert_clean(&survey, &reporter);
}

#[test]
fn color_is_offered_when_enabled() {
    let (survey, reporter) = survey_with(SurveyConfig {
        timeout_ms: 5_000,
        color: true,
        ..SurveyConfig::default()
    });
    survey.expect_confirm("Proceed?").yes();

    let (tx, rx) = mpsc::channel();
    survey.start(move |stdio| {
        tx.send(stdio.color).unwrap();
        let mut prompter = Prompter::from_stdio(stdio).unwrap();
        prompter.confirm("Proceed?", false, None).unwrap();
    });

    assert!(rx.try_recv().unwrap());
    assert_clean(&survey, &reporter);
}

#[test]
fn output_and_screen_are_logged() {
    let (survey, reporter) = survey();
    survey.expect_input("What is your name?").answer("Ada");

    run_prompts(&survey, |p| p.input("What is your name?", None)).unwrap();

    let logs = reporter.logs();
    assert!(logs
        .iter()
        .any(|log| log.starts_with("Raw output:") && log.contains("What is your name?")));
    assert!(logs
        .iter()
        .any(|log| log.starts_with("State:") && log.contains("? What is your name? Ada")));
}

// =============================================================================
// Failures
// =============================================================================

#[test]
fn unanswered_help_times_out() {
    let (survey, reporter) = survey_with(SurveyConfig {
        timeout_ms: 50,
        ..SurveyConfig::default()
    });
    survey.expect_input("Need help?").show_help("secret help");

    let started = Instant::now();
    survey.start(|mut stdio| {
        // never prompts, just waits for input until the terminal goes away
        let _ = io::copy(&mut stdio.input, &mut io::sink());
    });

    assert!(started.elapsed() < Duration::from_secs(2));
    assert_eq!(reporter.errors(), vec!["ask timeout exceeded".to_string()]);
    assert_eq!(
        survey.expectations_were_met().unwrap_err().to_string(),
        "there are remaining expectations that were not met:\n\n\
         Expect : Input Prompt\n\
         Message: \"Need help?\"\n\
         Answer : press \"?\" and see \"secret help\"\n"
    );
}

#[test]
fn program_ending_early_is_reported() {
    let (survey, reporter) = survey();
    survey.expect_input("First:").answer("a");
    survey.expect_input("Second:").answer("b");

    let first = run_prompts(&survey, |p| p.input("First:", None)).unwrap();

    assert_eq!(first, "a");
    let errors = reporter.errors();
    assert_eq!(errors.len(), 1, "{:?}", errors);
    assert!(errors[0].contains("\"Second:\""));
    let unmet = survey.expectations_were_met().unwrap_err();
    assert!(unmet.pending.contains("Message: \"Second:\""));
    assert!(!unmet.pending.contains("First:"));
}

#[test]
fn panic_in_code_under_test_is_reported() {
    let (survey, reporter) = survey();

    survey.start(|_stdio| panic!("boom"));

    assert_eq!(
        reporter.errors(),
        vec!["code under test panicked: boom".to_string()]
    );
    survey.expectations_were_met().unwrap();
}

#[test]
#[should_panic(expected = "already started")]
fn expecting_after_start_panics() {
    let (survey, _reporter) = survey();
    survey.start(drop);
    let _ = survey.expect_input("Too late");
}

#[test]
fn checked_survey_accepts_a_clean_run() {
    init_tracing();
    let survey = Survey::new()
        .with_timeout(Duration::from_secs(5))
        .checked();
    survey.expect_password("Password:").answer("s3cret");

    survey.start(|stdio| {
        let mut prompter = Prompter::from_stdio(stdio).unwrap();
        assert_eq!(prompter.password("Password:", None).unwrap(), "s3cret");
    });

    assert!(survey.problems().is_empty());
}
