//! Accumulated output shared between a console's reader and its matchers.

use crate::error::{ConsoleError, ConsoleResult};
use std::sync::{Condvar, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

/// Why the output stream stopped.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Closed {
    /// The writing side went away.
    Eof,
    /// The harness closed the console.
    Harness,
}

#[derive(Default)]
struct State {
    data: Vec<u8>,
    cursor: usize,
    closed: Option<Closed>,
}

/// Append-only byte log with a match cursor.
///
/// Matching consumes everything up to and including the match, so repeated
/// prompts are matched one occurrence at a time.
#[derive(Default)]
pub(crate) struct OutputBuffer {
    state: Mutex<State>,
    changed: Condvar,
}

impl OutputBuffer {
    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub(crate) fn push(&self, bytes: &[u8]) {
        self.lock().data.extend_from_slice(bytes);
        self.changed.notify_all();
    }

    /// Mark the stream as finished. The first reason wins.
    pub(crate) fn close(&self, reason: Closed) {
        let mut state = self.lock();
        if state.closed.is_none() {
            state.closed = Some(reason);
        }
        drop(state);
        self.changed.notify_all();
    }

    pub(crate) fn is_closed(&self) -> bool {
        self.lock().closed.is_some()
    }

    /// Everything received so far, lossily decoded.
    pub(crate) fn raw(&self) -> String {
        String::from_utf8_lossy(&self.lock().data).into_owned()
    }

    /// Block until `pattern` shows up after the cursor and return the consumed text.
    pub(crate) fn expect(&self, pattern: &str, timeout: Option<Duration>) -> ConsoleResult<String> {
        let needle = pattern.as_bytes();
        let deadline = timeout.map(|after| (Instant::now() + after, after));
        let mut state = self.lock();
        loop {
            let unread = state.data.get(state.cursor..).unwrap_or_default();
            if let Some(end) = find(unread, needle) {
                let consumed = String::from_utf8_lossy(unread.get(..end).unwrap_or_default())
                    .into_owned();
                state.cursor += end;
                return Ok(consumed);
            }
            match state.closed {
                Some(Closed::Eof) => {
                    return Err(ConsoleError::Eof {
                        expected: pattern.to_string(),
                    })
                }
                Some(Closed::Harness) => return Err(ConsoleError::Closed),
                None => {}
            }
            state = match deadline {
                None => self
                    .changed
                    .wait(state)
                    .unwrap_or_else(PoisonError::into_inner),
                Some((at, after)) => {
                    let now = Instant::now();
                    if now >= at {
                        return Err(ConsoleError::Timeout {
                            expected: pattern.to_string(),
                            after,
                        });
                    }
                    self.changed
                        .wait_timeout(state, at - now)
                        .unwrap_or_else(PoisonError::into_inner)
                        .0
                }
            };
        }
    }

    /// Block until the stream closes and return whatever was left unread.
    pub(crate) fn expect_eof(&self, timeout: Option<Duration>) -> ConsoleResult<String> {
        let deadline = timeout.map(|after| (Instant::now() + after, after));
        let mut state = self.lock();
        loop {
            if state.closed.is_some() {
                let rest = state.data.get(state.cursor..).unwrap_or_default();
                let consumed = String::from_utf8_lossy(rest).into_owned();
                state.cursor = state.data.len();
                return Ok(consumed);
            }
            state = match deadline {
                None => self
                    .changed
                    .wait(state)
                    .unwrap_or_else(PoisonError::into_inner),
                Some((at, after)) => {
                    let now = Instant::now();
                    if now >= at {
                        return Err(ConsoleError::Timeout {
                            expected: "end of output".to_string(),
                            after,
                        });
                    }
                    self.changed
                        .wait_timeout(state, at - now)
                        .unwrap_or_else(PoisonError::into_inner)
                        .0
                }
            };
        }
    }
}

/// End offset of the first occurrence of `needle` in `haystack`.
fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    if needle.is_empty() {
        return Some(0);
    }
    haystack
        .windows(needle.len())
        .position(|window| window == needle)
        .map(|start| start + needle.len())
}
