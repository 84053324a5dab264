//! What a waiter does between failed acquisition attempts.

use std::{
    fmt,
    num::{NonZeroU32, ParseIntError},
    str::FromStr,
};

use log::trace;

use crate::sync;

/// Failed attempts a waiter makes before it yields, unless configured otherwise.
pub const DEFAULT_YIELD_THRESHOLD: u32 = 1024;

/// Backoff policy of a [`SpinLock`](crate::SpinLock).
///
/// Every failed attempt is followed by a processor spin hint. With `Yield`,
/// every `n`th consecutive failure additionally hands the time slice back to
/// the scheduler, which keeps spinning waiters from starving the holder when
/// there are more runnable threads than processors.
///
/// The threshold is a tuning knob, not an invariant. The best value depends
/// on the platform and the workload.
///
/// ```
/// use spin_yield::Backoff;
///
/// assert_eq!(Backoff::default().threshold(), Some(1024));
/// assert_eq!("spin".parse::<Backoff>().unwrap(), Backoff::Spin);
/// assert_eq!("64".parse::<Backoff>().unwrap(), Backoff::yield_after(64));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Backoff {
    /// Retry forever without ever yielding.
    Spin,
    /// Yield after this many consecutive failed attempts, then start counting
    /// again.
    Yield(NonZeroU32),
}

impl Backoff {
    /// Yield every [`DEFAULT_YIELD_THRESHOLD`] failed attempts.
    pub const DEFAULT: Backoff = Backoff::yield_after(DEFAULT_YIELD_THRESHOLD);

    /// Yield after `n` consecutive failed attempts. Zero never yields.
    pub const fn yield_after(n: u32) -> Backoff {
        match NonZeroU32::new(n) {
            Some(n) => Backoff::Yield(n),
            None => Backoff::Spin,
        }
    }

    /// The yield threshold, or `None` if this policy never yields.
    pub const fn threshold(&self) -> Option<u32> {
        match self {
            Backoff::Spin => None,
            Backoff::Yield(n) => Some(n.get()),
        }
    }
}

impl Default for Backoff {
    fn default() -> Self {
        Backoff::DEFAULT
    }
}

impl fmt::Display for Backoff {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Backoff::Spin => f.write_str("spin"),
            Backoff::Yield(n) => write!(f, "{}", n),
        }
    }
}

/// Error returned when a [`Backoff`] cannot be parsed from text.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseBackoffError {
    /// Not a known policy name or a number.
    #[error("invalid backoff policy '{0}' (expected 'spin', 'yield', or a yield threshold)")]
    Invalid(String),
    /// Numeric, but not a valid threshold.
    #[error("invalid yield threshold '{value}'")]
    Threshold {
        value: String,
        #[source]
        source: ParseIntError,
    },
}

impl FromStr for Backoff {
    type Err = ParseBackoffError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();

        match s.to_ascii_lowercase().as_str() {
            "spin" | "never" => Ok(Backoff::Spin),
            "yield" | "default" => Ok(Backoff::DEFAULT),
            _ if !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit()) => s
                .parse::<u32>()
                .map(Backoff::yield_after)
                .map_err(|source| ParseBackoffError::Threshold {
                    value: s.to_string(),
                    source,
                }),
            _ => Err(ParseBackoffError::Invalid(s.to_string())),
        }
    }
}

#[cfg(feature = "serde")]
impl<'de> serde::Deserialize<'de> for Backoff {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        #[derive(serde::Deserialize)]
        #[serde(untagged)]
        enum BackoffValue {
            Threshold(u32),
            Name(String),
        }

        match BackoffValue::deserialize(deserializer)? {
            BackoffValue::Threshold(n) => Ok(Backoff::yield_after(n)),
            BackoffValue::Name(s) => s.parse().map_err(serde::de::Error::custom),
        }
    }
}

/// Per-call waiter state. Lives on the waiting thread's stack, so the lock
/// itself stays a single state word plus its policy.
pub(crate) struct Spinner {
    backoff: Backoff,
    failures: u32,
    yields: u64,
}

impl Spinner {
    pub(crate) fn new(backoff: Backoff) -> Self {
        Self {
            backoff,
            failures: 0,
            yields: 0,
        }
    }

    /// Record one failed attempt and back off accordingly.
    #[inline]
    pub(crate) fn snooze(&mut self) {
        sync::spin_loop();

        if let Backoff::Yield(threshold) = self.backoff {
            self.failures += 1;

            if self.failures == threshold.get() {
                self.failures = 0;
                self.yields += 1;
                trace!(
                    "spin waiter yielding after {} failed attempts (yield #{})",
                    threshold,
                    self.yields
                );
                sync::yield_now();
            }
        }
    }

    #[cfg(all(test, not(feature = "loom")))]
    fn yields(&self) -> u64 {
        self.yields
    }
}
