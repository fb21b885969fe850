use crate::console::buffer::{Closed, OutputBuffer};
use crate::console::{Console, Stdio};
use crate::error::{ConsoleError, ConsoleResult};
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

/// Console whose output is scripted by the test and whose input is recorded.
///
/// # Example
///
/// ```
/// use promptbox::console::{Console, MemoryConsole};
///
/// let console = MemoryConsole::new();
/// console.emit("? Proceed? (y/N) ");
/// console.expect_string("Proceed?").unwrap();
/// console.send_line("yes");
/// assert_eq!(console.sent(), vec!["yes\n".to_string()]);
/// ```
#[derive(Default)]
pub struct MemoryConsole {
    output: OutputBuffer,
    sent: Mutex<Vec<String>>,
    expect_timeout: Option<Duration>,
}

impl MemoryConsole {
    /// Empty console that waits forever for output.
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail matches that take longer than `timeout` instead of waiting forever.
    #[must_use]
    pub fn with_expect_timeout(mut self, timeout: Duration) -> Self {
        self.expect_timeout = Some(timeout);
        self
    }

    /// Append text as if the program under test had printed it.
    pub fn emit(&self, text: &str) {
        self.output.push(text.as_bytes());
    }

    /// End the output stream, as when the program exits.
    pub fn finish(&self) {
        self.output.close(Closed::Eof);
    }

    /// Every send, in order.
    pub fn sent(&self) -> Vec<String> {
        self.sent
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// All sends concatenated.
    pub fn sent_text(&self) -> String {
        self.sent().concat()
    }

    /// Everything emitted so far.
    pub fn raw_output(&self) -> String {
        self.output.raw()
    }
}

impl Console for MemoryConsole {
    fn send(&self, text: &str) {
        if self.output.is_closed() {
            tracing::warn!(text, "send on a closed memory console");
        }
        self.sent
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(text.to_string());
    }

    fn expect_string(&self, pattern: &str) -> ConsoleResult<String> {
        self.output.expect(pattern, self.expect_timeout)
    }

    fn expect_eof(&self) -> ConsoleResult<String> {
        self.output.expect_eof(self.expect_timeout)
    }

    fn tty(&self) -> ConsoleResult<Stdio> {
        Err(ConsoleError::open(
            "open tty",
            "a memory console has no terminal device",
        ))
    }

    fn close_tty(&self) {}

    fn close(&self) {
        self.output.close(Closed::Harness);
    }
}
