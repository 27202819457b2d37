//! Hierarchical cancellation token.
//!
//! A token is a cheap cloneable handle. Cancelling it wakes every blocked
//! waiter at once (the `done` channel disconnects) and cancels all of its
//! children. Cancellation is one-way and cooperative: nothing is killed,
//! tasks observe the token at their blocking points.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError, Weak};
use std::time::{Duration, Instant};

use crossbeam_channel::{bounded, Receiver, RecvTimeoutError, Sender};

struct Inner {
    cancelled: AtomicBool,
    /// Dropped on cancel, which disconnects `done`.
    trigger: Mutex<Option<Sender<()>>>,
    done: Receiver<()>,
    children: Mutex<Vec<Weak<Inner>>>,
}

impl Inner {
    fn new() -> Self {
        let (trigger, done) = bounded(0);
        Self {
            cancelled: AtomicBool::new(false),
            trigger: Mutex::new(Some(trigger)),
            done,
            children: Mutex::new(Vec::new()),
        }
    }

    fn cancel(&self) {
        if self.cancelled.swap(true, Ordering::AcqRel) {
            return;
        }
        self.trigger
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        let children =
            std::mem::take(&mut *self.children.lock().unwrap_or_else(PoisonError::into_inner));
        for child in children.iter().filter_map(Weak::upgrade) {
            child.cancel();
        }
    }
}

/// A cancellation token shared between a parent and its tasks.
#[derive(Clone)]
pub struct CancelToken {
    inner: Arc<Inner>,
}

impl CancelToken {
    /// A fresh root token.
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Inner::new()),
        }
    }

    /// A token cancelled together with `self` but cancellable on its own.
    ///
    /// If `self` is already cancelled the child starts cancelled.
    pub fn child(&self) -> Self {
        let child = Self::new();
        {
            let mut children = self
                .inner
                .children
                .lock()
                .unwrap_or_else(PoisonError::into_inner);
            if !self.is_cancelled() {
                children.retain(|weak| weak.strong_count() > 0);
                children.push(Arc::downgrade(&child.inner));
                return child;
            }
        }
        child.cancel();
        child
    }

    /// Cancel this token and all of its descendants. Idempotent.
    pub fn cancel(&self) {
        self.inner.cancel();
    }

    /// Whether the token has been cancelled.
    pub fn is_cancelled(&self) -> bool {
        self.inner.cancelled.load(Ordering::Acquire)
    }

    /// A receiver that becomes ready (disconnected) once cancelled.
    ///
    /// Intended for `crossbeam_channel::select!`; it never yields a value.
    pub fn done(&self) -> &Receiver<()> {
        &self.inner.done
    }

    /// Sleep for `duration` unless cancelled first.
    ///
    /// Returns `true` if the full duration elapsed, `false` on cancellation.
    pub fn sleep(&self, duration: Duration) -> bool {
        if self.is_cancelled() {
            return false;
        }
        matches!(self.inner.done.recv_timeout(duration), Err(RecvTimeoutError::Timeout))
    }

    /// Sleep until `deadline` unless cancelled first.
    pub fn sleep_until(&self, deadline: Instant) -> bool {
        self.sleep(deadline.saturating_duration_since(Instant::now()))
    }
}

impl Default for CancelToken {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for CancelToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CancelToken")
            .field("cancelled", &self.is_cancelled())
            .finish()
    }
}
