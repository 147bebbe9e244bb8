use std::time::Duration;

use crate::error::LlmError;

/// Explicit retry/backoff policy, replacing exception-driven retry
/// (`spec.md` §9 REDESIGN FLAGS: "Exception-driven retry → explicit policy
/// object").
#[derive(Clone, Debug)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_wait: Duration,
    pub backoff_factor: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            base_wait: Duration::from_secs_f64(1.0),
            backoff_factor: 2.0,
        }
    }
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, base_wait: Duration, backoff_factor: f64) -> Self {
        Self {
            max_attempts,
            base_wait,
            backoff_factor,
        }
    }

    /// Whether `err` is worth retrying. Invalid-request errors are not:
    /// retrying a malformed request just reproduces the same failure.
    pub fn is_retryable(&self, err: &LlmError) -> bool {
        !matches!(err, LlmError::InvalidRequest(_))
    }

    /// The wait duration before attempt `attempt_index` (0-based), applying
    /// the backoff factor `attempt_index` times to `base_wait`.
    pub fn wait_for(&self, attempt_index: u32) -> Duration {
        let factor = self.backoff_factor.powi(attempt_index as i32);
        Duration::from_secs_f64(self.base_wait.as_secs_f64() * factor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wait_for_applies_exponential_backoff() {
        let policy = RetryPolicy::new(5, Duration::from_secs(1), 2.0);
        assert_eq!(policy.wait_for(0), Duration::from_secs(1));
        assert_eq!(policy.wait_for(1), Duration::from_secs(2));
        assert_eq!(policy.wait_for(2), Duration::from_secs(4));
    }

    #[test]
    fn invalid_request_is_never_retryable() {
        let policy = RetryPolicy::default();
        assert!(!policy.is_retryable(&LlmError::InvalidRequest("bad".into())));
        assert!(policy.is_retryable(&LlmError::Transport("timeout".into())));
    }
}
