//! A survey that checks itself when it goes out of scope.

use super::Survey;
use crate::reporter::RecordingReporter;
use std::ops::Deref;
use std::sync::Arc;
use std::thread;

/// A [`Survey`] that fails the test on drop.
///
/// Dropping it panics when the run reported failures or expectations are
/// left unmet, so a test only has to queue prompts and call
/// [`start`](Survey::start). Nothing is checked while the thread is already
/// panicking.
///
/// ```no_run
/// use promptbox::Survey;
///
/// let survey = Survey::new().checked();
/// survey.expect_confirm("Proceed?").yes();
/// survey.start(|stdio| drop(stdio));
/// // the unanswered confirm fails the test here
/// ```
pub struct CheckedSurvey {
    survey: Survey,
    recorder: Arc<RecordingReporter>,
}

impl Survey {
    /// Wrap the survey so it reconciles itself on drop.
    ///
    /// Failures are recorded instead of going to the configured reporter.
    pub fn checked(self) -> CheckedSurvey {
        let recorder = Arc::new(RecordingReporter::new());
        CheckedSurvey {
            survey: self.with_reporter(recorder.clone()),
            recorder,
        }
    }
}

impl CheckedSurvey {
    /// Failures reported so far.
    pub fn errors(&self) -> Vec<String> {
        self.recorder.errors()
    }

    /// Everything that would fail the drop check right now.
    pub fn problems(&self) -> Vec<String> {
        let mut problems = self.recorder.errors();
        if let Err(unmet) = self.survey.expectations_were_met() {
            problems.push(unmet.to_string());
        }
        problems
    }
}

impl Deref for CheckedSurvey {
    type Target = Survey;

    fn deref(&self) -> &Survey {
        &self.survey
    }
}

impl Drop for CheckedSurvey {
    #[allow(clippy::panic)]
    fn drop(&mut self) {
        if thread::panicking() {
            return;
        }
        let problems = self.problems();
        if !problems.is_empty() {
            panic!("{}", problems.join("\n"));
        }
    }
}
