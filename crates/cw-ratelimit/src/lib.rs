// SPDX-License-Identifier: MIT OR Apache-2.0
#![doc = include_str!("../README.md")]
#![deny(unsafe_code)]
#![warn(missing_docs)]

//! Host-bound token-bucket rate limiting.

use std::sync::Mutex;
use std::time::{Duration, Instant};

use cw_core::ScanContext;
use cw_error::{CwError, ErrorCode};

/// A single rate-limiting policy. Implementors inspect an outgoing
/// request before it's sent (`maybe_wait`) and the response after it
/// completes (`update`), so a policy can adapt to `Retry-After` headers
/// or HTTP 429s without the caller knowing its internals.
pub trait RateLimitPolicy: Send + Sync {
    /// Returns how long the caller should wait before sending a request
    /// at `now`, or `None` if it may proceed immediately.
    fn maybe_wait(&self, now: Instant) -> Option<Duration>;

    /// Record the outcome of a request that just completed, so future
    /// `maybe_wait` calls can react to throttling signals.
    fn update(&self, status: u16, now: Instant);
}

struct TokenBucketState {
    tokens: f64,
    last_refill: Instant,
}

/// A token bucket with a burst capacity of exactly one token: a policy
/// never allows two requests back to back no matter how much unused
/// quota has accumulated, only a steady rate of `refill_interval`.
pub struct TokenBucket {
    refill_interval: Duration,
    state: Mutex<TokenBucketState>,
}

impl TokenBucket {
    /// Construct a bucket that allows one request every `refill_interval`.
    #[must_use]
    pub fn new(refill_interval: Duration) -> Self {
        Self {
            refill_interval,
            state: Mutex::new(TokenBucketState {
                tokens: 1.0,
                last_refill: Instant::now(),
            }),
        }
    }

    fn refill(&self, state: &mut TokenBucketState, now: Instant) {
        if self.refill_interval.is_zero() {
            state.tokens = 1.0;
            return;
        }
        let elapsed = now.saturating_duration_since(state.last_refill);
        let refilled = elapsed.as_secs_f64() / self.refill_interval.as_secs_f64();
        state.tokens = (state.tokens + refilled).min(1.0);
        state.last_refill = now;
    }
}

impl RateLimitPolicy for TokenBucket {
    fn maybe_wait(&self, now: Instant) -> Option<Duration> {
        let mut state = self.state.lock().expect("token bucket mutex poisoned");
        self.refill(&mut state, now);
        if state.tokens >= 1.0 {
            state.tokens -= 1.0;
            None
        } else {
            let deficit = 1.0 - state.tokens;
            state.tokens = 0.0;
            Some(Duration::from_secs_f64(deficit * self.refill_interval.as_secs_f64()))
        }
    }

    fn update(&self, _status: u16, _now: Instant) {}
}

/// A policy that forces a wait after an HTTP 429, honoring a
/// server-advised backoff on top of whatever the base policy already
/// enforces.
pub struct BackoffOn429 {
    backoff: Duration,
    until: Mutex<Option<Instant>>,
}

impl BackoffOn429 {
    /// Construct a policy that backs off by `backoff` after any 429.
    #[must_use]
    pub fn new(backoff: Duration) -> Self {
        Self {
            backoff,
            until: Mutex::new(None),
        }
    }
}

impl RateLimitPolicy for BackoffOn429 {
    fn maybe_wait(&self, now: Instant) -> Option<Duration> {
        let until = self.until.lock().expect("backoff mutex poisoned");
        until.and_then(|deadline| {
            if now < deadline {
                Some(deadline - now)
            } else {
                None
            }
        })
    }

    fn update(&self, status: u16, now: Instant) {
        if status == 429 {
            let mut until = self.until.lock().expect("backoff mutex poisoned");
            *until = Some(now + self.backoff);
        }
    }
}

/// A rate limiter bound to exactly one host. Verifiers obtain one per
/// issuing service and must never share it across hosts; calling
/// [`ApiRateLimiter::maybe_wait`] with a mismatched host is a
/// programming error, not a rate-limit condition, and returns
/// [`ErrorCode::RateLimiterHostMismatch`].
pub struct ApiRateLimiter {
    host: String,
    policies: Vec<Box<dyn RateLimitPolicy>>,
}

impl ApiRateLimiter {
    /// Construct a limiter bound to `host`, evaluating `policies` in
    /// order and waiting for the maximum of whatever they each report.
    #[must_use]
    pub fn new(host: impl Into<String>, policies: Vec<Box<dyn RateLimitPolicy>>) -> Self {
        Self {
            host: host.into(),
            policies,
        }
    }

    /// Compute how long to wait before issuing a request to `host`, or
    /// `Ok(None)` if it may proceed now. All policies run concurrently
    /// on the same snapshot of "now" (fail-slow: a slow policy doesn't
    /// block evaluating the others) and the longest wait wins.
    pub fn maybe_wait(&self, host: &str, now: Instant) -> Result<Option<Duration>, CwError> {
        if host != self.host {
            return Err(CwError::new(
                ErrorCode::RateLimiterHostMismatch,
                format!("rate limiter bound to {}, got request for {host}", self.host),
            ));
        }
        let longest = self
            .policies
            .iter()
            .filter_map(|p| p.maybe_wait(now))
            .max();
        Ok(longest)
    }

    /// Sleep for whatever [`ApiRateLimiter::maybe_wait`] reports, if
    /// anything, returning the context's cancellation error immediately
    /// if `ctx` is cancelled before or during the wait rather than
    /// sleeping it out.
    pub async fn wait(&self, ctx: &ScanContext, host: &str, now: Instant) -> Result<(), CwError> {
        if let Some(delay) = self.maybe_wait(host, now)? {
            tokio::select! {
                biased;
                () = ctx.cancelled() => {
                    return Err(CwError::new(ErrorCode::ScanCancelled, "rate limiter wait cancelled"));
                }
                () = tokio::time::sleep(delay) => {}
            }
        }
        Ok(())
    }

    /// Feed a response status back to every policy.
    pub fn update(&self, host: &str, status: u16, now: Instant) -> Result<(), CwError> {
        if host != self.host {
            return Err(CwError::new(
                ErrorCode::RateLimiterHostMismatch,
                format!("rate limiter bound to {}, got response for {host}", self.host),
            ));
        }
        for policy in &self.policies {
            policy.update(status, now);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_bucket_allows_first_request_immediately() {
        let bucket = TokenBucket::new(Duration::from_secs(1));
        assert!(bucket.maybe_wait(Instant::now()).is_none());
    }

    #[test]
    fn token_bucket_denies_back_to_back_burst() {
        let bucket = TokenBucket::new(Duration::from_secs(1));
        let now = Instant::now();
        assert!(bucket.maybe_wait(now).is_none());
        assert!(bucket.maybe_wait(now).is_some());
    }

    #[test]
    fn token_bucket_refills_after_interval() {
        let bucket = TokenBucket::new(Duration::from_millis(100));
        let now = Instant::now();
        assert!(bucket.maybe_wait(now).is_none());
        let later = now + Duration::from_millis(150);
        assert!(bucket.maybe_wait(later).is_none());
    }

    #[test]
    fn limiter_rejects_mismatched_host() {
        let limiter = ApiRateLimiter::new("sts.amazonaws.com", vec![]);
        let err = limiter.maybe_wait("evil.example.com", Instant::now()).unwrap_err();
        assert_eq!(err.code, ErrorCode::RateLimiterHostMismatch);
    }

    #[test]
    fn backoff_policy_forces_wait_after_429() {
        let policy = BackoffOn429::new(Duration::from_secs(5));
        let now = Instant::now();
        assert!(policy.maybe_wait(now).is_none());
        policy.update(429, now);
        assert!(policy.maybe_wait(now).is_some());
    }

    #[tokio::test]
    async fn wait_returns_cancelled_error_instead_of_sleeping_out_a_long_wait() {
        let bucket = TokenBucket::new(Duration::from_secs(3600));
        let limiter = ApiRateLimiter::new("host", vec![Box::new(bucket)]);
        let now = Instant::now();
        limiter.maybe_wait("host", now).unwrap();
        assert!(limiter.maybe_wait("host", now).unwrap().is_some());

        let ctx = ScanContext::new(1, 1);
        ctx.cancel();
        let err = limiter.wait(&ctx, "host", now).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::ScanCancelled);
    }

    #[test]
    fn limiter_combines_max_of_all_policy_waits() {
        let short = TokenBucket::new(Duration::from_millis(10));
        let long = BackoffOn429::new(Duration::from_secs(10));
        let now = Instant::now();
        long.update(429, now);
        let limiter = ApiRateLimiter::new(
            "host",
            vec![Box::new(short), Box::new(long)],
        );
        let wait = limiter.maybe_wait("host", now).unwrap();
        assert!(wait.unwrap() >= Duration::from_secs(9));
    }
}
