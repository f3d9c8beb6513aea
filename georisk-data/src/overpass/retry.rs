//! Bounded retry policy and the clock it waits on.

use std::time::Duration;

use super::TransportError;

/// Attempts made when the caller does not choose.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;

/// Linear backoff step used by [`Backoff::default`].
pub const DEFAULT_BACKOFF_STEP: Duration = Duration::from_secs(5);

/// Delay schedule between failed attempts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backoff {
    /// Wait the same duration after every failure.
    Fixed(Duration),
    /// Wait `failures × step`.
    Linear {
        /// Increment per failed attempt.
        step: Duration,
    },
    /// Wait `initial × factor^(failures − 1)`, capped at `max`.
    Exponential {
        /// Delay after the first failure.
        initial: Duration,
        /// Growth factor per failure.
        factor: u32,
        /// Upper bound on any single delay.
        max: Duration,
    },
}

impl Default for Backoff {
    fn default() -> Self {
        Self::Linear {
            step: DEFAULT_BACKOFF_STEP,
        }
    }
}

impl Backoff {
    /// Delay to wait after `failures` failed attempts (starting at 1).
    ///
    /// # Examples
    /// ```
    /// use std::time::Duration;
    /// use georisk_data::overpass::Backoff;
    ///
    /// let backoff = Backoff::default();
    /// assert_eq!(backoff.delay(1), Duration::from_secs(5));
    /// assert_eq!(backoff.delay(2), Duration::from_secs(10));
    /// ```
    #[must_use]
    pub fn delay(&self, failures: u32) -> Duration {
        let failures = failures.max(1);
        match *self {
            Self::Fixed(delay) => delay,
            Self::Linear { step } => step.saturating_mul(failures),
            Self::Exponential {
                initial,
                factor,
                max,
            } => initial
                .saturating_mul(factor.saturating_pow(failures - 1))
                .min(max),
        }
    }
}

/// Decides which errors are worth another attempt.
pub type RetryPredicate = fn(&TransportError) -> bool;

/// Bounded retry policy: attempt budget, backoff schedule and retry predicate.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    max_attempts: u32,
    backoff: Backoff,
    retryable: RetryPredicate,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_ATTEMPTS)
    }
}

impl RetryPolicy {
    /// Policy allowing `max_attempts` attempts (at least one) with the
    /// default backoff and [`TransportError::is_transient`] as predicate.
    #[must_use]
    pub fn new(max_attempts: u32) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            backoff: Backoff::default(),
            retryable: TransportError::is_transient,
        }
    }

    /// Policy that never retries.
    #[must_use]
    pub fn no_retry() -> Self {
        Self::new(1)
    }

    /// Replace the backoff schedule.
    #[must_use]
    pub const fn with_backoff(mut self, backoff: Backoff) -> Self {
        self.backoff = backoff;
        self
    }

    /// Replace the retry predicate.
    #[must_use]
    pub const fn with_retryable(mut self, retryable: RetryPredicate) -> Self {
        self.retryable = retryable;
        self
    }

    /// Total attempts permitted.
    #[must_use]
    pub const fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Backoff schedule.
    #[must_use]
    pub const fn backoff(&self) -> Backoff {
        self.backoff
    }

    /// Whether `error` should be retried.
    #[must_use]
    pub fn is_retryable(&self, error: &TransportError) -> bool {
        (self.retryable)(error)
    }
}

/// Blocking clock used for backoff and batch pacing.
pub trait Sleeper {
    /// Block the current thread for `duration`.
    fn sleep(&self, duration: Duration);
}

impl<T: Sleeper + ?Sized> Sleeper for &T {
    fn sleep(&self, duration: Duration) {
        (**self).sleep(duration);
    }
}

/// [`Sleeper`] backed by [`std::thread::sleep`].
#[derive(Debug, Clone, Copy, Default)]
pub struct ThreadSleeper;

impl Sleeper for ThreadSleeper {
    fn sleep(&self, duration: Duration) {
        if !duration.is_zero() {
            std::thread::sleep(duration);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(1, 5)]
    #[case(2, 10)]
    #[case(3, 15)]
    fn linear_backoff_grows_by_step(#[case] failures: u32, #[case] secs: u64) {
        assert_eq!(Backoff::default().delay(failures), Duration::from_secs(secs));
    }

    #[rstest]
    fn fixed_backoff_is_constant() {
        let backoff = Backoff::Fixed(Duration::from_secs(2));
        assert_eq!(backoff.delay(1), backoff.delay(7));
    }

    #[rstest]
    #[case(1, 1)]
    #[case(2, 2)]
    #[case(3, 4)]
    #[case(6, 30)]
    fn exponential_backoff_is_capped(#[case] failures: u32, #[case] secs: u64) {
        let backoff = Backoff::Exponential {
            initial: Duration::from_secs(1),
            factor: 2,
            max: Duration::from_secs(30),
        };
        assert_eq!(backoff.delay(failures), Duration::from_secs(secs));
    }

    #[rstest]
    fn zero_attempts_clamp_to_one() {
        assert_eq!(RetryPolicy::new(0).max_attempts(), 1);
    }

    #[rstest]
    fn custom_predicate_overrides_default() {
        let policy = RetryPolicy::default().with_retryable(|_| false);
        let timeout = TransportError::Timeout {
            url: String::new(),
            timeout_secs: 1,
        };
        assert!(!policy.is_retryable(&timeout));
        assert!(RetryPolicy::default().is_retryable(&timeout));
    }
}
