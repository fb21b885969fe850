//! Keys a scripted user can press.

use std::fmt;

/// A single keystroke sent to the program under test.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Key {
    /// Carriage return.
    Enter,
    /// Horizontal tab.
    Tab,
    /// Escape.
    Escape,
    /// Space bar.
    Space,
    /// Delete the character before the cursor (DEL, `0x7f`).
    Delete,
    /// Cursor up.
    ArrowUp,
    /// Cursor down.
    ArrowDown,
    /// Cursor left.
    ArrowLeft,
    /// Cursor right.
    ArrowRight,
    /// Ctrl+C (`0x03`).
    Interrupt,
}

impl Key {
    /// Bytes a terminal sends for this key.
    pub fn sequence(self) -> &'static str {
        match self {
            Self::Enter => "\r",
            Self::Tab => "\t",
            Self::Escape => "\x1b",
            Self::Space => " ",
            Self::Delete => "\x7f",
            Self::ArrowUp => "\x1b[A",
            Self::ArrowDown => "\x1b[B",
            Self::ArrowRight => "\x1b[C",
            Self::ArrowLeft => "\x1b[D",
            Self::Interrupt => "\x03",
        }
    }

    fn name(self) -> &'static str {
        match self {
            Self::Enter => "ENTER",
            Self::Tab => "TAB",
            Self::Escape => "ESC",
            Self::Space => "SPACE",
            Self::Delete => "DELETE",
            Self::ArrowUp => "ARROW UP",
            Self::ArrowDown => "ARROW DOWN",
            Self::ArrowLeft => "ARROW LEFT",
            Self::ArrowRight => "ARROW RIGHT",
            Self::Interrupt => "INTERRUPT",
        }
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "press {}", self.name())
    }
}
