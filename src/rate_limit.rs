//! Rate-limit signal extracted from a throttled response.

use http::{HeaderMap, StatusCode};

/// The information a 429 response carries for the retry policy.
///
/// The `Retry-After` value is kept as the raw header text; interpreting it is
/// up to [`RetryPolicy::compute_wait_seconds`](crate::RetryPolicy::compute_wait_seconds).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RateLimitSignal {
    /// Raw `Retry-After` header value, if the server sent one.
    pub retry_after: Option<String>,
}

impl RateLimitSignal {
    /// Extracts the rate-limit signal from response headers.
    ///
    /// # Examples
    ///
    /// ```
    /// use rpclink::rate_limit::RateLimitSignal;
    /// use http::HeaderMap;
    ///
    /// let mut headers = HeaderMap::new();
    /// headers.insert("retry-after", "2".parse().unwrap());
    ///
    /// let signal = RateLimitSignal::from_headers(&headers);
    /// assert_eq!(signal.retry_after.as_deref(), Some("2"));
    /// ```
    pub fn from_headers(headers: &HeaderMap) -> Self {
        Self {
            retry_after: parse_retry_after(headers),
        }
    }

    /// Returns `true` if `status` is the too-many-requests status.
    pub fn is_rate_limited(status: StatusCode) -> bool {
        status == StatusCode::TOO_MANY_REQUESTS
    }
}

fn parse_retry_after(headers: &HeaderMap) -> Option<String> {
    let header = headers.get(http::header::RETRY_AFTER)?.to_str().ok()?;
    Some(header.to_string())
}
