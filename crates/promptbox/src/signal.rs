//! One-shot cancellation signal.
//!
//! A [`Signal`] starts armed and becomes ready the first time
//! [`Signal::notify`] is called. It never re-arms. Readiness is modelled by
//! dropping the only sender of a zero-capacity channel, so every receiver
//! handed out by [`Signal::wait`] observes a disconnect and can be used in
//! `crossbeam_channel::select!` next to a deadline.

use crossbeam_channel::{bounded, Receiver, RecvTimeoutError, Sender, TryRecvError};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Idempotent, clonable "close once" notification.
#[derive(Clone, Debug)]
pub struct Signal {
    inner: Arc<Inner>,
}

#[derive(Debug)]
struct Inner {
    sender: Mutex<Option<Sender<()>>>,
    receiver: Receiver<()>,
}

impl Default for Signal {
    fn default() -> Self {
        Self::new()
    }
}

impl Signal {
    /// Create an armed signal.
    pub fn new() -> Self {
        let (sender, receiver) = bounded(0);
        Self {
            inner: Arc::new(Inner {
                sender: Mutex::new(Some(sender)),
                receiver,
            }),
        }
    }

    /// Fire the signal. Safe to call any number of times from any thread.
    pub fn notify(&self) {
        let sender = self
            .inner
            .sender
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .take();
        drop(sender);
    }

    /// Handle that becomes ready (disconnected) once the signal fires.
    pub fn wait(&self) -> Receiver<()> {
        self.inner.receiver.clone()
    }

    /// Whether [`notify`](Self::notify) has been called.
    pub fn is_notified(&self) -> bool {
        matches!(
            self.inner.receiver.try_recv(),
            Err(TryRecvError::Disconnected)
        )
    }

    /// Block until notified or `timeout` elapses. Returns `true` if notified.
    pub fn wait_timeout(&self, timeout: Duration) -> bool {
        matches!(
            self.inner.receiver.recv_timeout(timeout),
            Err(RecvTimeoutError::Disconnected)
        )
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use std::thread;

    #[test]
    fn starts_armed() {
        let signal = Signal::new();
        assert!(!signal.is_notified());
        assert!(!signal.wait_timeout(Duration::from_millis(10)));
    }

    #[test]
    fn notify_is_idempotent_across_threads() {
        let signal = Signal::new();
        let handles: Vec<_> = (0..100)
            .map(|_| {
                let signal = signal.clone();
                thread::spawn(move || signal.notify())
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
        assert!(signal.is_notified());
        signal.notify();
        assert!(signal.is_notified());
    }

    #[test]
    fn waiters_stay_ready_after_notify() {
        let signal = Signal::new();
        let waiter = signal.wait();
        let notifier = signal.clone();
        let handle = thread::spawn(move || notifier.notify());
        assert!(waiter.recv().is_err());
        handle.join().unwrap();
        assert!(waiter.recv().is_err());
        assert!(signal.wait().recv().is_err());
        assert!(signal.wait_timeout(Duration::from_millis(1)));
    }
}
