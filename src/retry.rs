//! Retry policy for rate-limited exchanges.
//!
//! When the endpoint answers with HTTP 429 the client asks a [`RetryPolicy`]
//! how long to wait and whether to try again at all. Both the number of
//! attempts and the worst-case single wait are bounded.

/// Default cap on a single wait, in seconds.
pub const DEFAULT_MAX_WAIT_SECS: u64 = 5;

/// Default number of retries after the original attempt.
pub const DEFAULT_MAX_RETRIES: u32 = 6;

/// Decides how long to wait after a rate-limit signal and whether to retry.
///
/// # Examples
///
/// ```
/// use rpclink::RetryPolicy;
///
/// let policy = RetryPolicy::default();
///
/// // A numeric hint from the server is used verbatim
/// assert_eq!(policy.compute_wait_seconds(Some("2"), 0), 2);
///
/// // Without a usable hint: 1s, 2s, 4s, then capped at 5s
/// assert_eq!(policy.compute_wait_seconds(None, 2), 4);
/// assert_eq!(policy.compute_wait_seconds(Some("soon"), 3), 5);
///
/// // Waits above the cap are never honored
/// assert!(!policy.should_retry(6, 0));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Whether rate-limited calls are retried at all.
    pub enabled: bool,

    /// Maximum single wait in seconds. Also the cap for exponential backoff.
    pub max_wait_secs: u64,

    /// Maximum retry count that may still be retried.
    pub max_retries: u32,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            enabled: true,
            max_wait_secs: DEFAULT_MAX_WAIT_SECS,
            max_retries: DEFAULT_MAX_RETRIES,
        }
    }
}

impl RetryPolicy {
    /// Creates a new builder for configuring the policy.
    pub fn builder() -> RetryPolicyBuilder {
        RetryPolicyBuilder::default()
    }

    /// Creates a policy that never retries.
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            ..Default::default()
        }
    }

    /// Returns the number of seconds to wait before the next attempt.
    ///
    /// A hint that parses as an integer is returned verbatim, even above the
    /// cap; negative integers mean "retry now" and become 0. Otherwise falls
    /// back to `min(2^retry_count, max_wait_secs)`.
    pub fn compute_wait_seconds(&self, retry_after_hint: Option<&str>, retry_count: u32) -> u64 {
        if let Some(seconds) = retry_after_hint.and_then(|hint| hint.trim().parse::<i64>().ok()) {
            return seconds.max(0) as u64;
        }

        2u64.saturating_pow(retry_count).min(self.max_wait_secs)
    }

    /// Returns `true` if the call should be retried after waiting `wait_secs`.
    pub fn should_retry(&self, wait_secs: u64, retry_count: u32) -> bool {
        self.enabled && retry_count <= self.max_retries && wait_secs <= self.max_wait_secs
    }
}

/// Builder for `RetryPolicy`.
#[derive(Default)]
pub struct RetryPolicyBuilder {
    enabled: Option<bool>,
    max_wait_secs: Option<u64>,
    max_retries: Option<u32>,
}

impl RetryPolicyBuilder {
    /// Sets whether rate-limited calls are retried.
    pub fn enabled(mut self, enabled: bool) -> Self {
        self.enabled = Some(enabled);
        self
    }

    /// Sets the maximum single wait, in seconds.
    pub fn max_wait_secs(mut self, max_wait_secs: u64) -> Self {
        self.max_wait_secs = Some(max_wait_secs);
        self
    }

    /// Sets the maximum number of retries.
    pub fn max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = Some(max_retries);
        self
    }

    /// Builds the `RetryPolicy`.
    pub fn build(self) -> RetryPolicy {
        let default = RetryPolicy::default();
        RetryPolicy {
            enabled: self.enabled.unwrap_or(default.enabled),
            max_wait_secs: self.max_wait_secs.unwrap_or(default.max_wait_secs),
            max_retries: self.max_retries.unwrap_or(default.max_retries),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exponential_backoff_without_hint() {
        let policy = RetryPolicy::default();
        let expected = [1, 2, 4, 5, 5, 5, 5];

        for (retry_count, wait) in expected.iter().enumerate() {
            assert_eq!(policy.compute_wait_seconds(None, retry_count as u32), *wait);
            assert_eq!(
                policy.compute_wait_seconds(Some("later"), retry_count as u32),
                *wait
            );
        }
    }

    #[test]
    fn test_numeric_hint_used_verbatim() {
        let policy = RetryPolicy::default();

        assert_eq!(policy.compute_wait_seconds(Some("2"), 0), 2);
        assert_eq!(policy.compute_wait_seconds(Some("0"), 4), 0);
        assert_eq!(policy.compute_wait_seconds(Some("30"), 0), 30);
        assert_eq!(policy.compute_wait_seconds(Some(" 3 "), 6), 3);
    }

    #[test]
    fn test_negative_hint_retries_immediately() {
        let policy = RetryPolicy::default();

        assert_eq!(policy.compute_wait_seconds(Some("-1"), 1), 0);
        assert_eq!(policy.compute_wait_seconds(Some("-30"), 3), 0);
        assert!(policy.should_retry(policy.compute_wait_seconds(Some("-1"), 0), 0));
    }

    #[test]
    fn test_non_integer_hints_fall_back_to_backoff() {
        let policy = RetryPolicy::default();

        assert_eq!(policy.compute_wait_seconds(Some("1.5"), 0), 1);
        assert_eq!(policy.compute_wait_seconds(Some("99999999999999999999"), 1), 2);
        assert_eq!(
            policy.compute_wait_seconds(Some("Wed, 21 Oct 2015 07:28:00 GMT"), 2),
            4
        );
    }

    #[test]
    fn test_large_retry_count_does_not_overflow() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.compute_wait_seconds(None, 200), DEFAULT_MAX_WAIT_SECS);
    }

    #[test]
    fn test_should_retry_bounds() {
        let policy = RetryPolicy::default();

        assert!(policy.should_retry(1, 0));
        assert!(policy.should_retry(5, 6));
        assert!(!policy.should_retry(0, 7));
        assert!(!policy.should_retry(1, 7));
        for retry_count in 0..=6 {
            assert!(!policy.should_retry(6, retry_count));
        }
    }

    #[test]
    fn test_disabled_never_retries() {
        let policy = RetryPolicy::disabled();
        assert!(!policy.should_retry(0, 0));
    }

    #[test]
    fn test_builder_overrides() {
        let policy = RetryPolicy::builder().max_wait_secs(60).max_retries(2).build();

        assert!(policy.enabled);
        assert_eq!(policy.compute_wait_seconds(None, 5), 32);
        assert!(policy.should_retry(30, 2));
        assert!(!policy.should_retry(30, 3));
    }
}
