//! Atomics and scheduler hooks, swapped for loom's when model checking.

#[cfg(not(feature = "loom"))]
pub(crate) use std::sync::atomic::{AtomicU32, Ordering};

#[cfg(feature = "loom")]
pub(crate) use loom::sync::atomic::{AtomicU32, Ordering};

/// Processor hint for a busy-wait iteration.
#[inline]
pub(crate) fn spin_loop() {
    #[cfg(not(feature = "loom"))]
    std::hint::spin_loop();

    // Loom must be told about every spin or it never schedules the holder.
    #[cfg(feature = "loom")]
    loom::thread::yield_now();
}

/// Give the rest of this thread's time slice back to the scheduler.
#[inline]
pub(crate) fn yield_now() {
    #[cfg(not(feature = "loom"))]
    std::thread::yield_now();

    #[cfg(feature = "loom")]
    loom::thread::yield_now();
}
