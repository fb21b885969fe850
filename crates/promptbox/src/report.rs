//! Text rendering of pending expectations.
//!
//! Reconciliation failures are asserted against literal strings, so every
//! label and separator is produced here.

use std::fmt::{Display, Write};

/// Separator between top-level steps in a report.
pub(crate) const REPORT_SEPARATOR: &str = "\n";
/// Separator between steps of an inline sequence.
pub(crate) const INLINE_SEPARATOR: &str = ", ";
/// Rendering of an answer that sends nothing but an empty line.
pub(crate) const NO_ANSWER: &str = "<no answer>";
/// Rendering of a scripted interrupt.
pub(crate) const INTERRUPT: &str = "<interrupt>";

/// Append `label: value` with the label padded to seven columns.
pub(crate) fn label_line(out: &mut String, label: &str, value: impl Display) {
    let _ = writeln!(out, "{label:<7}: {value}");
}

/// Append the repeat counters, unless they carry no information.
pub(crate) fn repeat_line(out: &mut String, remaining: usize, calls: usize) {
    if remaining > 0 && (calls != 0 || remaining != 1) {
        let _ = writeln!(
            out,
            "(called: {calls} time(s), remaining: {remaining} time(s))"
        );
    }
}

/// Quote text the way it is shown in reports.
pub(crate) fn quoted(text: &str) -> String {
    format!("{text:?}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn labels_are_padded() {
        let mut out = String::new();
        label_line(&mut out, "Expect", "Input Prompt");
        label_line(&mut out, "Message", quoted("Name?"));
        assert_eq!(out, "Expect : Input Prompt\nMessage: \"Name?\"\n");
    }

    #[test]
    fn repeat_line_only_when_informative() {
        let mut out = String::new();
        repeat_line(&mut out, 0, 4);
        repeat_line(&mut out, 1, 0);
        assert!(out.is_empty());
        repeat_line(&mut out, 3, 1);
        assert_eq!(out, "(called: 1 time(s), remaining: 3 time(s))\n");
    }
}
