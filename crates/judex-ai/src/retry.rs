//! Bounded retry on service throttling.
//!
//! The policy is a pure transition function over [`RetryState`]; the caller
//! owns the sleeping.

use std::sync::LazyLock;
use std::time::Duration;

use regex::Regex;

use crate::ServiceError;

/// `Please retry in 38.402350949s.` as embedded in throttling messages.
static RETRY_HINT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"Please retry in ([\d.]+)s").expect("static retry hint pattern"));

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Retries allowed after the first attempt.
    pub max_retries: u32,
    /// Wait used when the service suggests none.
    pub default_backoff: Duration,
    /// Added to a service-suggested wait.
    pub margin: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 5,
            default_backoff: Duration::from_millis(10_000),
            margin: Duration::from_millis(1_000),
        }
    }
}

/// Where one document's request sequence stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryState {
    /// A request is due; `retries` throttled attempts came before it.
    Attempting { retries: u32 },
    /// Throttled; the next attempt is due after `delay`.
    Waiting { retries: u32, delay: Duration },
    Succeeded,
    /// A non-retryable error.
    FailedPermanently,
    /// Still throttled after the last allowed retry.
    FailedAfterRetries,
}

impl RetryState {
    pub fn start() -> Self {
        Self::Attempting { retries: 0 }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            Self::Succeeded | Self::FailedPermanently | Self::FailedAfterRetries
        )
    }

    /// Leave `Waiting` once the delay has elapsed. Other states are returned
    /// unchanged.
    pub fn resume(self) -> Self {
        match self {
            Self::Waiting { retries, .. } => Self::Attempting { retries },
            other => other,
        }
    }
}

impl RetryPolicy {
    /// The state after an attempt made in `Attempting { retries }` ended with
    /// `outcome`.
    pub fn step<T>(&self, retries: u32, outcome: &Result<T, ServiceError>) -> RetryState {
        match outcome {
            Ok(_) => RetryState::Succeeded,
            Err(ServiceError::RateLimited {
                message,
                retry_after,
            }) => {
                let retries = retries + 1;
                if retries > self.max_retries {
                    RetryState::FailedAfterRetries
                } else {
                    RetryState::Waiting {
                        retries,
                        delay: self.backoff(message, *retry_after),
                    }
                }
            }
            Err(_) => RetryState::FailedPermanently,
        }
    }

    /// Wait before retrying a throttled request: the suggested wait rounded up
    /// to the millisecond plus the margin, or the default backoff when the
    /// service suggests nothing. A hint in the message wins over the
    /// structured `retry_after`.
    pub fn backoff(&self, message: &str, retry_after: Option<Duration>) -> Duration {
        retry_hint(message)
            .or(retry_after)
            .map(|hint| ceil_millis(hint) + self.margin)
            .unwrap_or(self.default_backoff)
    }
}

fn retry_hint(message: &str) -> Option<Duration> {
    let caps = RETRY_HINT_RE.captures(message)?;
    let secs: f64 = caps[1].parse().ok()?;
    Duration::try_from_secs_f64(secs).ok()
}

fn ceil_millis(d: Duration) -> Duration {
    let millis = d.as_nanos().div_ceil(1_000_000);
    Duration::from_millis(u64::try_from(millis).unwrap_or(u64::MAX))
}
