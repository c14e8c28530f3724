//! Caller notification hooks.

use crate::codec::Call;

/// Receives notifications about a client's exchanges.
///
/// All methods default to doing nothing, so implementors only override what
/// they need. Observers run inline on the calling task and should be quick.
///
/// # Examples
///
/// ```
/// use rpclink::{Call, RequestObserver};
/// use std::sync::atomic::{AtomicUsize, Ordering};
///
/// #[derive(Default)]
/// struct RetryCounter(AtomicUsize);
///
/// impl RequestObserver for RetryCounter {
///     fn on_retry(&self, _calls: &[Call], _retry_count: u32, _wait_secs: u64) {
///         self.0.fetch_add(1, Ordering::Relaxed);
///     }
/// }
/// ```
pub trait RequestObserver: Send + Sync {
    /// Called before the first attempt of a call or batch.
    fn on_request(&self, _calls: &[Call]) {}

    /// Called before waiting `wait_secs` to resend rate-limited calls.
    fn on_retry(&self, _calls: &[Call], _retry_count: u32, _wait_secs: u64) {}

    /// Called with the raw body once the exchange succeeds at the transport level.
    fn on_response(&self, _calls: &[Call], _raw_body: &str) {}
}
