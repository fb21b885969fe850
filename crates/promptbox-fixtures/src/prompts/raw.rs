//! Raw terminal mode with automatic restore.

use nix::sys::termios::{cfmakeraw, tcgetattr, tcsetattr, SetArg, Termios};
use std::os::fd::{AsFd, OwnedFd};

use super::PromptError;

/// Keeps a terminal in raw mode until dropped.
#[derive(Debug)]
pub struct RawMode {
    fd: OwnedFd,
    original: Termios,
}

impl RawMode {
    /// Switch the terminal behind `fd` to raw mode.
    ///
    /// The descriptor is duplicated so the guard can restore the previous
    /// settings even after the caller closed its own handle.
    pub fn enable(fd: impl AsFd) -> Result<Self, PromptError> {
        let fd = fd.as_fd().try_clone_to_owned()?;
        let original = tcgetattr(&fd)?;
        let mut raw = original.clone();
        cfmakeraw(&mut raw);
        tcsetattr(&fd, SetArg::TCSANOW, &raw)?;
        Ok(Self { fd, original })
    }
}

impl Drop for RawMode {
    fn drop(&mut self) {
        // The other side may already be gone.
        let _ = tcsetattr(&self.fd, SetArg::TCSANOW, &self.original);
    }
}
