//! Backoff policy shared by the Readwise client and the repository client.
//!
//! Upstream enforces a request budget per rolling minute. Rate-limit
//! responses honour the `Retry-After` header when present and otherwise fall
//! back to exponential backoff; timeouts and 5xx responses use the same
//! backoff under a smaller retry ceiling.

use std::future::Future;
use std::time::Duration;

use reqwest::StatusCode;
use tracing::warn;

use crate::error::DigestError;

/// Explicit retry policy injected into every networked component, so tests
/// can substitute millisecond delays.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub base_delay: Duration,
    pub multiplier: u32,
    pub max_delay: Duration,
    /// Ceiling for rate-limit responses.
    pub max_attempts: u32,
    /// Smaller ceiling for timeouts and 5xx responses.
    pub transient_attempts: u32,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            base_delay: Duration::from_secs(1),
            multiplier: 2,
            max_delay: Duration::from_secs(60),
            max_attempts: 5,
            transient_attempts: 3,
        }
    }
}

impl RetryPolicy {
    /// Delay before the retry following failure number `attempt` (0-based),
    /// capped at `max_delay`.
    pub fn delay_for(&self, attempt: u32) -> Duration {
        self.base_delay
            .saturating_mul(self.multiplier.saturating_pow(attempt))
            .min(self.max_delay)
    }
}

/// Issues a request until it yields a response that is neither rate-limited
/// nor transient, retrying per the policy. Non-retryable responses (success
/// and plain 4xx alike) are returned for the caller to interpret.
pub(crate) async fn send_with_retry<F, Fut>(
    policy: &RetryPolicy,
    mut request: F,
) -> Result<reqwest::Response, DigestError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<reqwest::Response, reqwest::Error>>,
{
    let mut rate_limited: u32 = 0;
    let mut transient: u32 = 0;
    loop {
        match request().await {
            Ok(response) => {
                let status = response.status();
                if status == StatusCode::TOO_MANY_REQUESTS {
                    rate_limited += 1;
                    if rate_limited >= policy.max_attempts {
                        return Err(DigestError::RateLimitExceeded {
                            attempts: rate_limited,
                        });
                    }
                    let delay = retry_after(&response)
                        .unwrap_or_else(|| policy.delay_for(rate_limited - 1))
                        .min(policy.max_delay);
                    warn!(
                        attempt = rate_limited,
                        delay_ms = delay.as_millis() as u64,
                        "rate limited, backing off"
                    );
                    tokio::time::sleep(delay).await;
                    continue;
                }
                if status.is_server_error() {
                    transient += 1;
                    if transient >= policy.transient_attempts {
                        return Err(DigestError::TransientNetwork {
                            attempts: transient,
                            detail: format!("server returned {status}"),
                        });
                    }
                    let delay = policy.delay_for(transient - 1);
                    warn!(
                        attempt = transient,
                        status = status.as_u16(),
                        delay_ms = delay.as_millis() as u64,
                        "transient upstream failure, retrying"
                    );
                    tokio::time::sleep(delay).await;
                    continue;
                }
                return Ok(response);
            }
            Err(e) if e.is_timeout() || e.is_connect() => {
                transient += 1;
                if transient >= policy.transient_attempts {
                    return Err(DigestError::TransientNetwork {
                        attempts: transient,
                        detail: e.to_string(),
                    });
                }
                let delay = policy.delay_for(transient - 1);
                warn!(
                    attempt = transient,
                    error = %e,
                    delay_ms = delay.as_millis() as u64,
                    "request failed, retrying"
                );
                tokio::time::sleep(delay).await;
            }
            Err(e) => return Err(DigestError::Http(e)),
        }
    }
}

fn retry_after(response: &reqwest::Response) -> Option<Duration> {
    response
        .headers()
        .get(reqwest::header::RETRY_AFTER)?
        .to_str()
        .ok()?
        .parse::<u64>()
        .ok()
        .map(Duration::from_secs)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn delays_grow_exponentially_up_to_the_cap() {
        let policy = RetryPolicy {
            base_delay: Duration::from_secs(1),
            multiplier: 2,
            max_delay: Duration::from_secs(10),
            max_attempts: 5,
            transient_attempts: 3,
        };
        assert_eq!(policy.delay_for(0), Duration::from_secs(1));
        assert_eq!(policy.delay_for(1), Duration::from_secs(2));
        assert_eq!(policy.delay_for(2), Duration::from_secs(4));
        assert_eq!(policy.delay_for(3), Duration::from_secs(8));
        assert_eq!(policy.delay_for(4), Duration::from_secs(10));
        assert_eq!(policy.delay_for(30), Duration::from_secs(10));
    }

    #[test]
    fn default_policy_has_a_smaller_transient_ceiling() {
        let policy = RetryPolicy::default();
        assert!(policy.transient_attempts < policy.max_attempts);
    }
}
