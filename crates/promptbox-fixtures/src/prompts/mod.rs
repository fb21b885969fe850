//! Interactive prompts over a raw terminal.
//!
//! The prompts render like a typical interactive prompt library: a `? `
//! marker, the question, a hint, then the user's input echoed back. Line
//! prompts optionally ask for the cursor position twice before reading, the
//! way prompt libraries do to lay out their answer.
//!
//! # Key Types
//!
//! - [`Prompter`] - Reads keys and renders prompts on one terminal
//! - [`PromptError`] - Interrupts, hang-ups and I/O failures
//!
//! # Key Operations
//!
//! - [`Prompter::confirm`], [`Prompter::input`], [`Prompter::password`]
//! - [`Prompter::multiline`]
//! - [`Prompter::select`], [`Prompter::multi_select`]

mod keys;
mod raw;

pub use keys::{read_input, Input};
pub use raw::RawMode;

use promptbox::prompt::builder::invalid_confirm_feedback;
use promptbox::terminal::CURSOR_QUERY;
use promptbox::Stdio;
use std::collections::BTreeSet;
use std::io::{self, Read, Write};
use thiserror::Error;

/// Why a prompt returned without an answer.
#[derive(Debug, Error)]
pub enum PromptError {
    /// The user pressed Ctrl+C.
    #[error("interrupt")]
    Interrupted,
    /// The terminal went away before an answer was submitted.
    #[error("input closed before an answer was submitted")]
    Eof,
    /// Reading or writing the terminal failed.
    #[error("terminal I/O failed: {0}")]
    Io(#[from] io::Error),
    /// Changing the terminal mode failed.
    #[error("terminal mode change failed: {0}")]
    Terminal(#[from] nix::Error),
}

/// Hint printed by line prompts that carry help.
const HELP_HINT: &str = "[? for help]";

/// Renders prompts and reads answers on one terminal.
pub struct Prompter {
    input: Box<dyn Read + Send>,
    output: Box<dyn Write + Send>,
    color: bool,
    cursor_handshake: bool,
    _raw: Option<RawMode>,
}

impl Prompter {
    /// Prompter over arbitrary streams, leaving terminal modes alone.
    pub fn new(input: impl Read + Send + 'static, output: impl Write + Send + 'static) -> Self {
        Self {
            input: Box::new(input),
            output: Box::new(output),
            color: false,
            cursor_handshake: false,
            _raw: None,
        }
    }

    /// Prompter over the streams handed out by a survey, in raw mode.
    pub fn from_stdio(stdio: Stdio) -> Result<Self, PromptError> {
        let raw = RawMode::enable(&stdio.input)?;
        Ok(Self {
            input: Box::new(stdio.input),
            output: Box::new(stdio.output),
            color: stdio.color,
            cursor_handshake: false,
            _raw: Some(raw),
        })
    }

    /// Prompter over this process's stdin and stdout, in raw mode.
    ///
    /// Color is used unless `NO_COLOR` is set.
    pub fn from_process() -> Result<Self, PromptError> {
        let stdin = io::stdin();
        let raw = RawMode::enable(&stdin)?;
        Ok(Self {
            input: Box::new(stdin),
            output: Box::new(io::stdout()),
            color: std::env::var_os("NO_COLOR").is_none(),
            cursor_handshake: false,
            _raw: Some(raw),
        })
    }

    /// Query the cursor position twice before each line is read.
    #[must_use]
    pub fn with_cursor_handshake(mut self, enabled: bool) -> Self {
        self.cursor_handshake = enabled;
        self
    }

    /// Force colored output on or off.
    #[must_use]
    pub fn with_color(mut self, enabled: bool) -> Self {
        self.color = enabled;
        self
    }

    // =========================================================================
    // Line prompts
    // =========================================================================

    /// Ask a yes/no question. An empty answer picks `default`.
    ///
    /// Unrecognized answers are rejected and the question is asked again.
    pub fn confirm(
        &mut self,
        message: &str,
        default: bool,
        help: Option<&str>,
    ) -> Result<bool, PromptError> {
        let mut help_shown = false;
        loop {
            let mut prompt = self.question(message);
            if help.is_some() && !help_shown {
                prompt.push_str(HELP_HINT);
                prompt.push(' ');
            }
            prompt.push_str(if default { "(Y/n) " } else { "(y/N) " });
            self.write(&prompt)?;
            self.cursor_handshake()?;

            let answer = self.read_line(None)?;
            match answer.trim().to_lowercase().as_str() {
                "" => return Ok(default),
                "y" | "yes" => return Ok(true),
                "n" | "no" => return Ok(false),
                "?" if help.is_some() => {
                    help_shown = true;
                    self.show_help(help.unwrap_or_default())?;
                }
                _ => {
                    let feedback = self.error_line(&invalid_confirm_feedback(&answer));
                    self.write(&feedback)?;
                }
            }
        }
    }

    /// Ask for one line of text. `?` shows `help` when there is some.
    pub fn input(&mut self, message: &str, help: Option<&str>) -> Result<String, PromptError> {
        self.ask_line(message, help, None)
    }

    /// Ask for one line of text, echoing `*` for every character.
    pub fn password(&mut self, message: &str, help: Option<&str>) -> Result<String, PromptError> {
        self.ask_line(message, help, Some('*'))
    }

    /// Ask for several lines, ended by two empty lines in a row.
    pub fn multiline(&mut self, message: &str) -> Result<String, PromptError> {
        let prompt = format!("{}[Enter 2 empty lines to finish]\r\n", self.question(message));
        self.write(&prompt)?;

        let mut lines: Vec<String> = Vec::new();
        loop {
            self.cursor_handshake()?;
            let line = self.read_line(None)?;
            if line.is_empty() && lines.last().is_some_and(String::is_empty) {
                lines.pop();
                return Ok(lines.join("\n"));
            }
            lines.push(line);
        }
    }

    fn ask_line(
        &mut self,
        message: &str,
        help: Option<&str>,
        mask: Option<char>,
    ) -> Result<String, PromptError> {
        let mut help_shown = false;
        loop {
            let mut prompt = self.question(message);
            if help.is_some() && !help_shown {
                prompt.push_str(HELP_HINT);
                prompt.push(' ');
            }
            self.write(&prompt)?;
            self.cursor_handshake()?;

            let answer = self.read_line(mask)?;
            match help {
                Some(help) if answer == "?" => {
                    help_shown = true;
                    self.show_help(help)?;
                }
                _ => return Ok(answer),
            }
        }
    }

    /// Read keys until ENTER, echoing each character or `mask`.
    fn read_line(&mut self, mask: Option<char>) -> Result<String, PromptError> {
        let mut line = String::new();
        loop {
            match read_input(&mut self.input)? {
                Input::Enter => {
                    self.write("\r\n")?;
                    return Ok(line);
                }
                Input::Interrupt => return self.interrupted(),
                Input::Backspace => {
                    if line.pop().is_some() {
                        self.write("\x08 \x08")?;
                    }
                }
                Input::Char(ch) => {
                    line.push(ch);
                    self.write(mask.unwrap_or(ch).encode_utf8(&mut [0; 4]))?;
                }
                _ => {}
            }
        }
    }

    // =========================================================================
    // List prompts
    // =========================================================================

    /// Pick one of `options`.
    ///
    /// Typing filters the list, arrows and TAB move the highlight, ENTER
    /// picks the highlighted option.
    pub fn select(
        &mut self,
        message: &str,
        options: &[&str],
        help: Option<&str>,
    ) -> Result<String, PromptError> {
        let mut list = ListState::new(options, help);
        loop {
            self.render_list(message, &list, None)?;
            let key = read_input(&mut self.input)?;
            if key == Input::Enter {
                if let Some(choice) = list.highlighted() {
                    let summary = format!("{}{choice}\r\n", self.question(message));
                    self.write(&summary)?;
                    return Ok(choice.to_string());
                }
                continue;
            }
            if !list.navigate(key) {
                return self.interrupted();
            }
        }
    }

    /// Pick any number of `options`.
    ///
    /// SPACE toggles the highlighted option, ARROW RIGHT selects every visible
    /// option and ARROW LEFT clears them. ENTER returns the selection in list
    /// order.
    pub fn multi_select(
        &mut self,
        message: &str,
        options: &[&str],
        help: Option<&str>,
    ) -> Result<Vec<String>, PromptError> {
        let mut list = ListState::new(options, help);
        let mut checked = BTreeSet::new();
        loop {
            self.render_list(message, &list, Some(&checked))?;
            match read_input(&mut self.input)? {
                Input::Enter => {
                    let chosen: Vec<String> = checked
                        .iter()
                        .filter_map(|&index| options.get(index))
                        .map(|option| (*option).to_string())
                        .collect();
                    let summary = format!("{}{}\r\n", self.question(message), chosen.join(", "));
                    self.write(&summary)?;
                    return Ok(chosen);
                }
                Input::Char(' ') => {
                    if let Some(index) = list.highlighted_index() {
                        if !checked.remove(&index) {
                            checked.insert(index);
                        }
                    }
                }
                Input::Right => checked.extend(list.visible()),
                Input::Left => {
                    for index in list.visible() {
                        checked.remove(&index);
                    }
                }
                key => {
                    if !list.navigate(key) {
                        return self.interrupted();
                    }
                }
            }
        }
    }

    fn render_list(
        &mut self,
        message: &str,
        list: &ListState<'_>,
        checked: Option<&BTreeSet<usize>>,
    ) -> Result<(), PromptError> {
        let mut out = self.question(message);
        if list.help.is_some() && !list.help_shown {
            out.push_str("[Use arrows to move, type to filter, ? for more help]");
        } else {
            out.push_str("[Use arrows to move, type to filter]");
        }
        out.push_str("\r\n");
        if let (Some(help), true) = (list.help, list.help_shown) {
            out.push_str(&self.help_line(help));
        }
        for (row, index) in list.visible().into_iter().enumerate() {
            out.push_str(if row == list.cursor { "> " } else { "  " });
            if let Some(checked) = checked {
                out.push_str(if checked.contains(&index) { "[x] " } else { "[ ] " });
            }
            out.push_str(list.options.get(index).copied().unwrap_or_default());
            out.push_str("\r\n");
        }
        self.write(&out)
    }

    // =========================================================================
    // Rendering
    // =========================================================================

    fn question(&self, message: &str) -> String {
        if self.color {
            format!("\x1b[1;32m?\x1b[0m \x1b[1m{message}\x1b[0m ")
        } else {
            format!("? {message} ")
        }
    }

    fn help_line(&self, help: &str) -> String {
        if self.color {
            format!("\x1b[36m? {help}\x1b[0m\r\n")
        } else {
            format!("? {help}\r\n")
        }
    }

    fn error_line(&self, text: &str) -> String {
        if self.color {
            format!("\x1b[31mX {text}\x1b[0m\r\n")
        } else {
            format!("X {text}\r\n")
        }
    }

    fn show_help(&mut self, help: &str) -> Result<(), PromptError> {
        let line = self.help_line(help);
        self.write(&line)
    }

    fn interrupted<T>(&mut self) -> Result<T, PromptError> {
        self.write("^C\r\n")?;
        Err(PromptError::Interrupted)
    }

    /// Ask where the cursor is, twice, and swallow the reports.
    fn cursor_handshake(&mut self) -> Result<(), PromptError> {
        if !self.cursor_handshake {
            return Ok(());
        }
        for _ in 0..2 {
            self.write(CURSOR_QUERY)?;
            while keys::read_byte(&mut self.input)? != b'R' {}
        }
        Ok(())
    }

    fn write(&mut self, text: &str) -> Result<(), PromptError> {
        self.output.write_all(text.as_bytes())?;
        self.output.flush()?;
        Ok(())
    }
}

/// Filter and highlight of a list prompt.
struct ListState<'a> {
    options: &'a [&'a str],
    help: Option<&'a str>,
    help_shown: bool,
    filter: String,
    cursor: usize,
}

impl<'a> ListState<'a> {
    fn new(options: &'a [&'a str], help: Option<&'a str>) -> Self {
        Self {
            options,
            help,
            help_shown: false,
            filter: String::new(),
            cursor: 0,
        }
    }

    /// Indices of the options matching the filter, case-insensitively.
    fn visible(&self) -> Vec<usize> {
        let filter = self.filter.to_lowercase();
        self.options
            .iter()
            .enumerate()
            .filter(|(_, option)| option.to_lowercase().contains(&filter))
            .map(|(index, _)| index)
            .collect()
    }

    fn highlighted_index(&self) -> Option<usize> {
        self.visible().get(self.cursor).copied()
    }

    fn highlighted(&self) -> Option<&'a str> {
        self.highlighted_index()
            .and_then(|index| self.options.get(index).copied())
    }

    /// Apply a navigation or filter key. Returns `false` on Ctrl+C.
    fn navigate(&mut self, key: Input) -> bool {
        let visible = self.visible().len();
        match key {
            Input::Interrupt => return false,
            Input::Up if visible > 0 => self.cursor = (self.cursor + visible - 1) % visible,
            Input::Down | Input::Tab if visible > 0 => self.cursor = (self.cursor + 1) % visible,
            Input::Backspace => {
                self.filter.pop();
                self.cursor = 0;
            }
            Input::Char('?') if self.help.is_some() && !self.help_shown => self.help_shown = true,
            Input::Char(ch) => {
                self.filter.push(ch);
                self.cursor = 0;
            }
            _ => {}
        }
        true
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use std::sync::{Arc, Mutex};

    #[derive(Clone, Default)]
    struct Screen(Arc<Mutex<Vec<u8>>>);

    impl Write for Screen {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    impl Screen {
        fn text(&self) -> String {
            String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
        }
    }

    fn prompter(keys: &'static str) -> (Prompter, Screen) {
        let screen = Screen::default();
        (Prompter::new(keys.as_bytes(), screen.clone()), screen)
    }

    #[test]
    fn confirm_accepts_yes_and_default() {
        let (mut p, _) = prompter("yes\r\r");
        assert!(p.confirm("Proceed?", false, None).unwrap());
        assert!(!p.confirm("Proceed?", false, None).unwrap());
    }

    #[test]
    fn confirm_rejects_unknown_answers() {
        let (mut p, screen) = prompter("maybe\rn\r");
        assert!(!p.confirm("Proceed?", true, None).unwrap());
        assert!(screen.text().contains(&invalid_confirm_feedback("maybe")));
        assert_eq!(screen.text().matches("(Y/n)").count(), 2);
    }

    #[test]
    fn input_shows_help_and_asks_again() {
        let (mut p, screen) = prompter("?\rAda\r");
        let name = p.input("Name:", Some("Your first name")).unwrap();
        assert_eq!(name, "Ada");
        let text = screen.text();
        assert!(text.starts_with("? Name: [? for help] ?\r\n? Your first name\r\n"));
        assert!(text.ends_with("? Name: Ada\r\n"));
    }

    #[test]
    fn password_echoes_mask() {
        let (mut p, screen) = prompter("secret\r");
        assert_eq!(p.password("Password:", None).unwrap(), "secret");
        assert_eq!(screen.text(), "? Password: ******\r\n");
    }

    #[test]
    fn backspace_erases_last_character() {
        let (mut p, _) = prompter("Adx\x7fa\r");
        assert_eq!(p.input("Name:", None).unwrap(), "Ada");
    }

    #[test]
    fn multiline_ends_on_two_empty_lines() {
        let (mut p, _) = prompter("first\r\rsecond\r\r\r");
        assert_eq!(p.multiline("Bio:").unwrap(), "first\n\nsecond");
        let (mut p, _) = prompter("\r\r");
        assert_eq!(p.multiline("Bio:").unwrap(), "");
    }

    #[test]
    fn interrupt_is_an_error() {
        let (mut p, screen) = prompter("Ad\x03");
        assert!(matches!(p.input("Name:", None), Err(PromptError::Interrupted)));
        assert!(screen.text().ends_with("^C\r\n"));
    }

    #[test]
    fn select_filters_and_moves() {
        let (mut p, screen) = prompter("united\x1b[B\r");
        let options = ["France", "United Kingdom", "United States"];
        assert_eq!(p.select("Country", &options, None).unwrap(), "United States");
        assert!(screen.text().contains("> United Kingdom\r\n  United States\r\n"));
    }

    #[test]
    fn select_wraps_around() {
        let (mut p, _) = prompter("\x1b[A\r");
        assert_eq!(p.select("Pick", &["a", "b", "c"], None).unwrap(), "c");
    }

    #[test]
    fn multi_select_toggles() {
        let (mut p, screen) = prompter("\x1b[C\x1b[D\x1b[B \t \r");
        let chosen = p.multi_select("Pick", &["a", "b", "c"], None).unwrap();
        assert_eq!(chosen, vec!["b".to_string(), "c".to_string()]);
        assert!(screen.text().contains("> [x] a\r\n  [x] b\r\n  [x] c\r\n"));
        assert!(screen.text().ends_with("? Pick b, c\r\n"));
    }

    #[test]
    fn list_help_is_toggled_by_question_mark() {
        let (mut p, screen) = prompter("?\r");
        p.select("Pick", &["a"], Some("Pick a letter")).unwrap();
        assert!(screen.text().contains("? Pick a letter\r\n> a\r\n"));
    }

    #[test]
    fn cursor_handshake_consumes_reports() {
        let (p, screen) = prompter("\x1b[1;8R\x1b[1;8RAda\r");
        let mut p = p.with_cursor_handshake(true);
        assert_eq!(p.input("Name:", None).unwrap(), "Ada");
        assert_eq!(screen.text().matches(CURSOR_QUERY).count(), 2);
    }
}
