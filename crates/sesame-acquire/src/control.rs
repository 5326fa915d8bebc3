//! Cooperative cancellation and pause for the acquisition thread.

use parking_lot::{Condvar, Mutex};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

#[derive(Debug, Default)]
struct Inner {
    cancelled: AtomicBool,
    paused: Mutex<bool>,
    wake: Condvar,
}

/// Shared handle for cancelling or pausing a running acquisition.
///
/// Cancellation is a single flag checked at the top of every tick and inside
/// the trigger wait. Sleeps and pauses block on a condition variable, so a
/// cancel wakes them immediately.
#[derive(Debug, Clone, Default)]
pub struct AcquisitionControl(Arc<Inner>);

impl AcquisitionControl {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.cancelled.store(true, Ordering::SeqCst);
        let _guard = self.0.paused.lock();
        self.0.wake.notify_all();
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.cancelled.load(Ordering::SeqCst)
    }

    pub fn pause(&self) {
        *self.0.paused.lock() = true;
    }

    pub fn resume(&self) {
        *self.0.paused.lock() = false;
        self.0.wake.notify_all();
    }

    pub fn is_paused(&self) -> bool {
        *self.0.paused.lock()
    }

    /// Block while paused. Returns `false` if cancelled.
    pub fn wait_while_paused(&self) -> bool {
        let mut paused = self.0.paused.lock();
        while *paused && !self.is_cancelled() {
            self.0.wake.wait(&mut paused);
        }
        !self.is_cancelled()
    }

    /// Sleep for `duration` unless cancelled first. Returns `false` if cancelled.
    pub fn sleep(&self, duration: Duration) -> bool {
        let deadline = Instant::now() + duration;
        let mut guard = self.0.paused.lock();
        while !self.is_cancelled() {
            if self.0.wake.wait_until(&mut guard, deadline).timed_out() {
                break;
            }
        }
        !self.is_cancelled()
    }
}
