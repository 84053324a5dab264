//! A minimal spinlock for critical sections too short to be worth blocking
//! on.
//!
//! [`SpinLock`] busy-waits instead of descheduling the waiting thread. It is
//! not reentrant, not fair, and not tied to an owner: any thread may release a
//! lock that another thread acquired. Waiters spin on a compare-and-swap and,
//! per the lock's [`Backoff`] policy, periodically yield to the scheduler so an
//! oversubscribed machine still makes progress.
//!
//! The usual shape is a lock embedded next to the value it guards:
//!
//! ```
//! use std::cell::UnsafeCell;
//! use spin_yield::SpinLock;
//!
//! struct Counter {
//!     lock: SpinLock,
//!     count: UnsafeCell<u64>,
//! }
//!
//! unsafe impl Sync for Counter {}
//!
//! impl Counter {
//!     fn inc(&self) {
//!         self.lock.acquire();
//!         unsafe { *self.count.get() += 1 };
//!         self.lock.release();
//!     }
//! }
//!
//! let counter = Counter { lock: SpinLock::INIT, count: UnsafeCell::new(0) };
//! counter.inc();
//! counter.inc();
//! assert_eq!(unsafe { *counter.count.get() }, 2);
//! ```
//!
//! Releasing a lock that is not held panics:
//!
//! ```should_panic
//! use spin_yield::SpinLock;
//!
//! let lock = SpinLock::new();
//! lock.acquire();
//! lock.release();
//! lock.release();
//! ```

mod backoff;
mod spinlock;
mod sync;

pub use backoff::{Backoff, ParseBackoffError, DEFAULT_YIELD_THRESHOLD};
pub use spinlock::{SpinGuard, SpinLock};
