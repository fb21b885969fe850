//! Screen emulation for console diagnostics.
//!
//! Every byte the code under test writes is fed through a `vt100` parser so
//! that a failing run can log what a human would have seen, and so that
//! cursor-position queries can be answered with a believable position.
//!
//! # Key Operations
//!
//! - [`Terminal::process_bytes`] - Feed raw pseudo-terminal output
//! - [`Terminal::cursor`] - Current emulated cursor position
//! - [`Terminal::snapshot`] - Capture the visible screen as plain text
//!
//! # Example
//!
//! ```
//! use promptbox::model::TerminalSize;
//! use promptbox::terminal::Terminal;
//!
//! let mut terminal = Terminal::new(TerminalSize { rows: 4, cols: 20 });
//! terminal.process_bytes(b"? Proceed? \x1b[1m(y/N)\x1b[0m ");
//! assert_eq!(terminal.snapshot().dump(), "? Proceed? (y/N)");
//! ```

use crate::model::{Cursor, ScreenSnapshot, TerminalSize};
use vt100::Parser;

/// Occurrences of this sequence in the output ask the terminal where its cursor is.
pub const CURSOR_QUERY: &str = "\x1b[6n";

/// Terminal emulator wrapper using vt100.
pub struct Terminal {
    parser: Parser,
    pending: Vec<u8>,
}

impl Terminal {
    /// Create a new terminal with the given size.
    pub fn new(size: TerminalSize) -> Self {
        Self {
            parser: Parser::new(size.rows, size.cols, 0),
            pending: Vec::new(),
        }
    }

    /// Process incoming bytes.
    ///
    /// Returns the number of complete cursor-position queries seen, including
    /// one split across the previous chunk.
    pub fn process_bytes(&mut self, bytes: &[u8]) -> usize {
        self.parser.process(bytes);

        let query = CURSOR_QUERY.as_bytes();
        self.pending.extend_from_slice(bytes);
        let count = self
            .pending
            .windows(query.len())
            .filter(|window| *window == query)
            .count();
        let keep = self.pending.len().min(query.len() - 1);
        self.pending.drain(..self.pending.len() - keep);
        count
    }

    /// Current cursor position.
    pub fn cursor(&self) -> Cursor {
        let (row, col) = self.parser.screen().cursor_position();
        Cursor { row, col }
    }

    /// Take a plain-text snapshot of the screen.
    pub fn snapshot(&self) -> ScreenSnapshot {
        let screen = self.parser.screen();
        let (rows, cols) = screen.size();
        let lines = screen
            .rows(0, cols)
            .map(|line| line.trim_end().to_string())
            .collect();
        ScreenSnapshot {
            rows,
            cols,
            cursor: self.cursor(),
            lines,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_queries_split_across_chunks() {
        let mut terminal = Terminal::new(TerminalSize::default());
        assert_eq!(terminal.process_bytes(b"? Name \x1b["), 0);
        assert_eq!(terminal.process_bytes(b"6n\x1b[6n"), 2);
        assert_eq!(terminal.process_bytes(b"plain"), 0);
    }

    #[test]
    fn cursor_follows_output() {
        let mut terminal = Terminal::new(TerminalSize { rows: 5, cols: 20 });
        terminal.process_bytes(b"line one\r\nab");
        let cursor = terminal.cursor();
        assert_eq!((cursor.row, cursor.col), (1, 2));
        assert_eq!(cursor.position_report(), "\x1b[2;3R");
    }

    #[test]
    fn dump_trims_trailing_blank_rows() {
        let mut terminal = Terminal::new(TerminalSize { rows: 5, cols: 20 });
        terminal.process_bytes(b"first\r\n\r\nthird   ");
        assert_eq!(terminal.snapshot().dump(), "first\n\nthird");
    }
}
