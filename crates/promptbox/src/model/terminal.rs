use serde::{Deserialize, Serialize};

/// Terminal dimensions in rows and columns.
///
/// Default is 24 rows by 80 columns (standard VT100 size).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TerminalSize {
    /// Number of rows (height).
    pub rows: u16,
    /// Number of columns (width).
    pub cols: u16,
}

impl Default for TerminalSize {
    fn default() -> Self {
        Self { rows: 24, cols: 80 }
    }
}

/// Cursor position, 0-based (row 0 is top, col 0 is left).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cursor {
    /// Row position.
    pub row: u16,
    /// Column position.
    pub col: u16,
}

impl Cursor {
    /// Cursor position report (`ESC [ row ; col R`), 1-based as terminals send it.
    pub fn position_report(self) -> String {
        format!(
            "\x1b[{};{}R",
            u32::from(self.row) + 1,
            u32::from(self.col) + 1
        )
    }
}

/// Plain-text rendering of the visible screen.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScreenSnapshot {
    /// Number of rows in the terminal.
    pub rows: u16,
    /// Number of columns in the terminal.
    pub cols: u16,
    /// Current cursor position.
    pub cursor: Cursor,
    /// Text lines, one per row, trailing spaces trimmed.
    pub lines: Vec<String>,
}

impl ScreenSnapshot {
    /// Screen text with trailing blank lines removed.
    pub fn dump(&self) -> String {
        let end = self
            .lines
            .iter()
            .rposition(|line| !line.trim().is_empty())
            .map_or(0, |idx| idx + 1);
        self.lines
            .iter()
            .take(end)
            .map(String::as_str)
            .collect::<Vec<_>>()
            .join("\n")
    }
}
