use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backoff {
    /// Re-send immediately.
    None,
    Fixed(Duration),
    /// Doubles from `initial` after every failure, capped at `max`.
    Exponential { initial: Duration, max: Duration },
}

/// How an upload reacts to failed attempts.
///
/// The default never gives up and never waits, which is what the collection
/// service expects from clients. Bounded policies exist so callers (and tests)
/// can put a ceiling on it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts including the first. `None` retries forever.
    pub max_attempts: Option<u32>,
    pub backoff: Backoff,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::unbounded()
    }
}

impl RetryPolicy {
    pub const fn unbounded() -> Self {
        Self {
            max_attempts: None,
            backoff: Backoff::None,
        }
    }

    pub const fn bounded(max_attempts: u32) -> Self {
        Self {
            max_attempts: Some(max_attempts),
            backoff: Backoff::None,
        }
    }

    pub const fn with_backoff(mut self, backoff: Backoff) -> Self {
        self.backoff = backoff;
        self
    }

    /// Delay before the next attempt after `failed_attempts` consecutive
    /// failures, or `None` once the policy is exhausted.
    pub fn next_delay(&self, failed_attempts: u32) -> Option<Duration> {
        if let Some(max) = self.max_attempts {
            if failed_attempts >= max {
                return None;
            }
        }

        let delay = match self.backoff {
            Backoff::None => Duration::ZERO,
            Backoff::Fixed(delay) => delay,
            Backoff::Exponential { initial, max } => {
                let shift = failed_attempts.saturating_sub(1).min(31);
                initial.saturating_mul(1u32 << shift).min(max)
            }
        };
        Some(delay)
    }
}
