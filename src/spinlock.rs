use std::fmt;

use crate::{
    backoff::{Backoff, Spinner},
    sync::{AtomicU32, Ordering},
};

const UNLOCKED: u32 = 0;
const LOCKED: u32 = 1;

/// A non-reentrant, unfair spinlock.
///
/// The lock does not own the data it protects and does not track which thread
/// holds it. One thread may acquire it and arrange for another to release it.
///
/// Only worth using when the critical section is about as cheap as a couple of
/// atomic operations. Waiters never block in the kernel; they spin and, per
/// the configured [`Backoff`], periodically yield to the scheduler.
pub struct SpinLock {
    state: AtomicU32,
    backoff: Backoff,
}

impl SpinLock {
    /// A constant initializer. Unlocked, with the default backoff.
    #[cfg(not(feature = "loom"))]
    pub const INIT: SpinLock = SpinLock::new();

    /// Create an unlocked lock with the default backoff.
    #[cfg(not(feature = "loom"))]
    pub const fn new() -> Self {
        Self::with_backoff(Backoff::DEFAULT)
    }

    /// Create an unlocked lock that waits according to `backoff`.
    #[cfg(not(feature = "loom"))]
    pub const fn with_backoff(backoff: Backoff) -> Self {
        Self {
            state: AtomicU32::new(UNLOCKED),
            backoff,
        }
    }

    // Loom atomics can't be built in a const context.
    #[cfg(feature = "loom")]
    pub fn new() -> Self {
        Self::with_backoff(Backoff::DEFAULT)
    }

    #[cfg(feature = "loom")]
    pub fn with_backoff(backoff: Backoff) -> Self {
        Self {
            state: AtomicU32::new(UNLOCKED),
            backoff,
        }
    }

    /// Spin until the lock is held by the caller.
    ///
    /// Everything written by the previous holder before its `release` is
    /// visible once this returns. Calling this again before releasing
    /// deadlocks the caller.
    #[inline]
    pub fn acquire(&self) {
        if self.try_acquire() {
            return;
        }

        let mut spinner = Spinner::new(self.backoff);

        while self
            .state
            .compare_exchange_weak(UNLOCKED, LOCKED, Ordering::Acquire, Ordering::Relaxed)
            .is_err()
        {
            spinner.snooze();
        }
    }

    /// Take the lock if it is free. Never spins.
    #[inline]
    pub fn try_acquire(&self) -> bool {
        self.state
            .compare_exchange(UNLOCKED, LOCKED, Ordering::Acquire, Ordering::Relaxed)
            .is_ok()
    }

    /// Release the lock, publishing the critical section's writes to the next
    /// acquirer.
    ///
    /// The caller need not be the thread that acquired it.
    ///
    /// # Panics
    ///
    /// Panics if the lock is not held. Releasing twice is a bug in the caller
    /// and the lock can no longer vouch for mutual exclusion.
    #[inline]
    #[track_caller]
    pub fn release(&self) {
        if self
            .state
            .compare_exchange(LOCKED, UNLOCKED, Ordering::Release, Ordering::Relaxed)
            .is_err()
        {
            panic!("release of unlocked SpinLock");
        }
    }

    /// Acquire the lock and release it when the guard goes out of scope.
    ///
    /// ```
    /// use spin_yield::SpinLock;
    ///
    /// let lock = SpinLock::new();
    /// {
    ///     let _guard = lock.lock();
    ///     assert!(lock.is_locked());
    /// }
    /// assert!(!lock.is_locked());
    /// ```
    pub fn lock(&self) -> SpinGuard<'_> {
        self.acquire();
        SpinGuard { lock: self }
    }

    /// Whether the lock is held right now. The answer may be stale by the
    /// time it is returned; do not synchronize on it.
    pub fn is_locked(&self) -> bool {
        self.state.load(Ordering::Relaxed) == LOCKED
    }

    /// The policy waiters on this lock follow.
    pub fn backoff(&self) -> Backoff {
        self.backoff
    }
}

impl Default for SpinLock {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for SpinLock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SpinLock")
            .field("locked", &self.is_locked())
            .field("backoff", &self.backoff)
            .finish()
    }
}

/// Holds a [`SpinLock`] until dropped.
#[must_use = "if unused the SpinLock will immediately unlock"]
pub struct SpinGuard<'a> {
    lock: &'a SpinLock,
}

impl<'a> SpinGuard<'a> {
    /// Give up the guard without releasing. Someone must later call
    /// [`SpinLock::release`] on the returned lock.
    pub fn into_raw(self) -> &'a SpinLock {
        let lock = self.lock;
        std::mem::forget(self);
        lock
    }
}

impl Drop for SpinGuard<'_> {
    fn drop(&mut self) {
        self.lock.release();
    }
}

impl fmt::Debug for SpinGuard<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SpinGuard").field("lock", self.lock).finish()
    }
}
