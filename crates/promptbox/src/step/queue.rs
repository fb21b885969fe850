use crate::console::Console;
use crate::error::{ExpectError, ExpectResult};
use crate::model::Pacing;
use crate::report;
use crate::signal::Signal;
use crate::step::Step;
use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::thread;

/// How a queue renders its pending steps.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum QueueStyle {
    /// Top-level queue: one step per line.
    Report,
    /// Inline keystroke sequence of a prompt: comma separated.
    Inline,
}

/// Why [`Steps::run_all`] stopped without an error.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Completion {
    /// Every step ran.
    Drained,
    /// Every step ran and at least one of them was an interrupt.
    Interrupted,
    /// The stop signal fired first.
    Stopped,
}

#[derive(Debug)]
struct Entry {
    id: u64,
    step: Step,
}

#[derive(Debug, Default)]
struct Inner {
    entries: VecDeque<Entry>,
    closed: bool,
    next_id: u64,
}

/// Ordered, closable queue of steps.
///
/// The lock is held only to read or remove the head, never while a step runs,
/// so a slow step cannot block reconciliation or appends from other threads.
#[derive(Debug)]
pub struct Steps {
    inner: Mutex<Inner>,
    style: QueueStyle,
}

impl Steps {
    /// Empty queue rendered with `style`.
    pub fn new(style: QueueStyle) -> Self {
        Self {
            inner: Mutex::new(Inner::default()),
            style,
        }
    }

    /// Empty top-level queue.
    pub fn report() -> Self {
        Self::new(QueueStyle::Report)
    }

    /// Empty inline sequence.
    pub fn inline() -> Self {
        Self::new(QueueStyle::Inline)
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Add steps at the tail.
    ///
    /// # Panics
    ///
    /// Panics if the queue has been closed. A closed queue is a finished
    /// interaction, so appending to it is a bug in the test.
    #[allow(clippy::panic)]
    pub fn append(&self, steps: impl IntoIterator<Item = Step>) {
        let mut inner = self.lock();
        if inner.closed {
            drop(inner);
            panic!("cannot append steps: the sequence is already closed");
        }
        for step in steps {
            let id = inner.next_id;
            inner.next_id += 1;
            inner.entries.push_back(Entry { id, step });
        }
    }

    /// Mark the queue closed. Irreversible.
    pub fn close(&self) {
        self.lock().closed = true;
    }

    /// Whether [`close`](Self::close) was called.
    pub fn is_closed(&self) -> bool {
        self.lock().closed
    }

    /// Number of pending steps.
    pub fn len(&self) -> usize {
        self.lock().entries.len()
    }

    /// Whether no step is pending.
    pub fn is_empty(&self) -> bool {
        self.lock().entries.is_empty()
    }

    /// Independent queue holding copies of the pending steps.
    pub fn fork(&self) -> Self {
        let inner = self.lock();
        let entries = inner
            .entries
            .iter()
            .map(|entry| Entry {
                id: entry.id,
                step: entry.step.clone(),
            })
            .collect();
        Self {
            inner: Mutex::new(Inner {
                entries,
                closed: inner.closed,
                next_id: inner.next_id,
            }),
            style: self.style,
        }
    }

    /// Drop every pending step. The closed flag is kept.
    pub fn reset(&self) {
        self.lock().entries.clear();
    }

    /// Execute the head step.
    ///
    /// On success or interrupt the head is removed. A prompt that still
    /// expects more rounds stays at the head and `Ok` is returned so the
    /// caller keeps consuming. Interrupts are still reported to the caller.
    pub fn run_head(&self, console: &dyn Console, pacing: &Pacing) -> ExpectResult {
        let (id, step) = {
            let inner = self.lock();
            let Some(head) = inner.entries.front() else {
                return Err(ExpectError::NothingToDo);
            };
            (head.id, head.step.clone())
        };

        tracing::debug!(step = %step, "running step");
        match step.execute(console, pacing) {
            Ok(()) => {
                self.remove(id);
                Ok(())
            }
            Err(ExpectError::NotFinished) => Ok(()),
            Err(ExpectError::Interrupted) => {
                self.remove(id);
                Err(ExpectError::Interrupted)
            }
            Err(err) => Err(err),
        }
    }

    /// Run heads until the queue is empty, a hard error occurs or `stop` fires.
    ///
    /// Interrupts do not stop the loop; they are reported through the
    /// returned [`Completion`].
    pub fn run_all(
        &self,
        console: &dyn Console,
        pacing: &Pacing,
        stop: Option<&Signal>,
    ) -> ExpectResult<Completion> {
        let mut interrupted = false;
        loop {
            if stop.is_some_and(Signal::is_notified) {
                return Ok(Completion::Stopped);
            }
            match self.run_head(console, pacing) {
                Ok(()) => {}
                Err(ExpectError::NothingToDo) if interrupted => return Ok(Completion::Interrupted),
                Err(ExpectError::NothingToDo) => return Ok(Completion::Drained),
                Err(ExpectError::Interrupted) => interrupted = true,
                Err(err) => return Err(err),
            }
            if !pacing.reaction_time.is_zero() {
                thread::sleep(pacing.reaction_time);
            }
        }
    }

    /// Render every pending step.
    pub fn describe(&self) -> String {
        let steps: Vec<Step> = self
            .lock()
            .entries
            .iter()
            .map(|entry| entry.step.clone())
            .collect();
        let separator = match self.style {
            QueueStyle::Report => report::REPORT_SEPARATOR,
            QueueStyle::Inline => report::INLINE_SEPARATOR,
        };
        steps
            .iter()
            .map(Step::describe)
            .collect::<Vec<_>>()
            .join(separator)
    }

    /// Remove the head if it is still the entry that was executed.
    fn remove(&self, id: u64) {
        let mut inner = self.lock();
        if inner.entries.front().is_some_and(|head| head.id == id) {
            inner.entries.pop_front();
        }
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::console::MemoryConsole;
    use crate::key::Key;

    #[test]
    fn empty_queue_has_nothing_to_do() {
        let steps = Steps::report();
        let console = MemoryConsole::new();
        assert!(steps
            .run_head(&console, &Pacing::immediate())
            .unwrap_err()
            .is_nothing_to_do());
        assert_eq!(
            steps.run_all(&console, &Pacing::immediate(), None).unwrap(),
            Completion::Drained
        );
    }

    #[test]
    #[should_panic(expected = "already closed")]
    fn append_after_close_panics() {
        let steps = Steps::inline();
        steps.append([Step::Key(Key::Tab)]);
        steps.close();
        steps.append([Step::Key(Key::Tab)]);
    }

    #[test]
    fn interrupt_is_removed_and_reported() {
        let steps = Steps::inline();
        steps.append([Step::Key(Key::Interrupt)]);
        let console = MemoryConsole::new();
        let err = steps
            .run_head(&console, &Pacing::immediate())
            .unwrap_err();
        assert!(err.is_interrupted());
        assert!(steps.is_empty());
    }

    #[test]
    fn run_all_keeps_going_after_interrupt() {
        let steps = Steps::report();
        steps.append([Step::Interrupt, Step::NoAnswer]);
        let console = MemoryConsole::new();
        let completion = steps.run_all(&console, &Pacing::immediate(), None).unwrap();
        assert_eq!(completion, Completion::Interrupted);
        assert_eq!(console.sent_text(), "\x03\n\n");
    }

    #[test]
    fn hard_failure_keeps_head() {
        let steps = Steps::report();
        steps.append([Step::ExpectText("never".to_string()), Step::NoAnswer]);
        let console = MemoryConsole::new();
        console.finish();
        assert!(steps.run_all(&console, &Pacing::immediate(), None).is_err());
        assert_eq!(steps.len(), 2);
    }

    #[test]
    fn stop_signal_halts_before_next_step() {
        let steps = Steps::report();
        steps.append([Step::NoAnswer]);
        let stop = Signal::new();
        stop.notify();
        let console = MemoryConsole::new();
        let completion = steps
            .run_all(&console, &Pacing::immediate(), Some(&stop))
            .unwrap();
        assert_eq!(completion, Completion::Stopped);
        assert_eq!(steps.len(), 1);
    }

    #[test]
    fn fork_is_consumed_independently() {
        let steps = Steps::inline();
        steps.append([Step::Key(Key::Tab), Step::Key(Key::Enter)]);
        steps.close();

        let round = steps.fork();
        assert!(round.is_closed());
        let console = MemoryConsole::new();
        round.run_all(&console, &Pacing::immediate(), None).unwrap();

        assert!(round.is_empty());
        assert_eq!(steps.len(), 2);
        assert_eq!(console.sent_text(), "\t\r");
    }

    #[test]
    fn inline_describe_is_comma_joined() {
        let steps = Steps::inline();
        steps.append([Step::Key(Key::Tab), Step::Key(Key::Enter)]);
        assert_eq!(steps.describe(), "press TAB, press ENTER");
    }
}
