//! Terminal channels that steps run against.
//!
//! A [`Console`] is the harness side of an interactive terminal: steps send
//! keystrokes through it and block until the program under test prints what
//! they expect. Sends are fire-and-forget, since the terminal may already be
//! shutting down when the last answer goes out; failed sends are logged.
//!
//! # Key Types
//!
//! - [`Console`] - The byte-duplex contract consumed by steps
//! - [`PtyConsole`] - Pseudo-terminal backed console (in process or spawned)
//! - [`MemoryConsole`] - In-memory console for exercising steps without a pty
//! - [`Stdio`] - Slave-side file handles given to the code under test
//! - [`CommandSpec`] - Program to spawn on a pseudo-terminal

mod buffer;
mod memory;
mod pty;

pub use memory::MemoryConsole;
pub use pty::{CommandSpec, PtyConsole};

use crate::error::ConsoleResult;
use std::fs::File;
use std::os::fd::OwnedFd;

/// Harness end of an interactive terminal.
///
/// Implementations must be usable from the consumer flow and the code under
/// test at the same time.
pub trait Console: Send + Sync {
    /// Write `text` as typed input.
    fn send(&self, text: &str);

    /// Write `text` followed by a newline.
    fn send_line(&self, text: &str) {
        self.send(&format!("{text}\n"));
    }

    /// Block until `pattern` appears in the output, consuming everything up to it.
    fn expect_string(&self, pattern: &str) -> ConsoleResult<String>;

    /// Block until the output stream ends, consuming the rest.
    fn expect_eof(&self) -> ConsoleResult<String>;

    /// Standard streams bound to the terminal, for code running in process.
    fn tty(&self) -> ConsoleResult<Stdio>;

    /// Release the harness's own handle on the terminal device.
    fn close_tty(&self);

    /// Shut the console down, waking every blocked matcher.
    fn close(&self);
}

/// Standard streams of the terminal the code under test talks to.
#[derive(Debug)]
pub struct Stdio {
    /// Keyboard side.
    pub input: File,
    /// Screen side.
    pub output: File,
    /// Error stream, the same device as `output`.
    pub error: File,
    /// Whether colored output is wanted.
    pub color: bool,
}

impl Stdio {
    pub(crate) fn from_device(device: &OwnedFd, color: bool) -> std::io::Result<Self> {
        Ok(Self {
            input: File::from(device.try_clone()?),
            output: File::from(device.try_clone()?),
            error: File::from(device.try_clone()?),
            color,
        })
    }
}
