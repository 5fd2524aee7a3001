//! Backoff Request Executor - retries transient HTTP failures with
//! exponentially growing waits.
//!
//! One call sends the request, and on a retriable outcome (network error,
//! 429, 5xx) waits `initial_delay`, then `2 * initial_delay`, `4 *
//! initial_delay`, ... until the retry budget is spent. A budget of `N`
//! therefore allows `N + 1` attempts. Non-retriable failures return at once
//! and cost nothing from the budget. The attempt counter and the delay live
//! in the call; nothing is shared between calls.
//!
//! ## Example
//!
//! ```ignore
//! use bike_catalog::backoff::{BackoffExecutor, HttpRequest, ReqwestTransport, RetryPolicy};
//!
//! let executor = BackoffExecutor::new(ReqwestTransport::new(timeout)?);
//! let response = executor
//!     .execute(&HttpRequest::post_json(url, body), RetryPolicy::default())
//!     .await?;
//! ```

mod transport;

use std::fmt;
use std::time::Duration;

use tracing::warn;

pub use transport::{
    HttpRequest, HttpResponse, Method, ReqwestTransport, Transport, TransportError,
};

/// Retry budget and first wait.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub initial_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            initial_delay: Duration::from_millis(1000),
        }
    }
}

impl RetryPolicy {
    pub fn new(max_retries: u32, initial_delay: Duration) -> Self {
        Self {
            max_retries,
            initial_delay,
        }
    }

    /// Wait before retry `k` (zero-based): `initial_delay * 2^k`.
    pub fn delay_for(&self, retry: u32) -> Duration {
        self.initial_delay
            .saturating_mul(2u32.saturating_pow(retry))
    }
}

/// Why an attempt was judged retriable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RetryReason {
    /// Transport-level failure.
    Network(String),
    /// Rate limited or server error, with the status and body received.
    Status { status: u16, body: String },
}

impl fmt::Display for RetryReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RetryReason::Network(msg) => write!(f, "network error: {}", msg),
            RetryReason::Status { status, .. } => write!(f, "status {}", status),
        }
    }
}

/// Error type for the executor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackoffError {
    /// Every attempt was retriable and the budget ran out.
    RetryExhausted { attempts: u32, last: RetryReason },
    /// The request could not be sent at all.
    InvalidRequest(String),
}

impl fmt::Display for BackoffError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BackoffError::RetryExhausted { attempts, last } => write!(
                f,
                "retries exhausted after {} attempts (last: {})",
                attempts, last
            ),
            BackoffError::InvalidRequest(msg) => write!(f, "invalid request: {}", msg),
        }
    }
}

impl std::error::Error for BackoffError {}

/// Sends requests through a [`Transport`], retrying transient failures.
#[derive(Debug, Clone)]
pub struct BackoffExecutor<T> {
    transport: T,
}

impl<T: Transport> BackoffExecutor<T> {
    pub fn new(transport: T) -> Self {
        Self { transport }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Send `request`, retrying per `policy`.
    ///
    /// Returns the first non-retriable response unchanged, whatever its status.
    pub async fn execute(
        &self,
        request: &HttpRequest,
        policy: RetryPolicy,
    ) -> Result<HttpResponse, BackoffError> {
        let mut remaining = policy.max_retries;
        let mut delay = policy.initial_delay;
        let mut attempts = 0u32;

        loop {
            attempts += 1;
            let reason = match self.transport.send(request).await {
                Ok(response) if !response.is_retriable() => return Ok(response),
                Ok(response) => RetryReason::Status {
                    status: response.status,
                    body: response.body_text(),
                },
                Err(TransportError::Network(msg)) => RetryReason::Network(msg),
                Err(TransportError::InvalidRequest(msg)) => {
                    return Err(BackoffError::InvalidRequest(msg))
                }
            };

            if remaining == 0 {
                return Err(BackoffError::RetryExhausted {
                    attempts,
                    last: reason,
                });
            }

            warn!(
                url = %request.url,
                attempt = attempts,
                delay_ms = delay.as_millis() as u64,
                %reason,
                "request failed, retrying"
            );
            tokio::time::sleep(delay).await;
            remaining -= 1;
            delay = delay.saturating_mul(2);
        }
    }
}
