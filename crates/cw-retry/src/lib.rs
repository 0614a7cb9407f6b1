// SPDX-License-Identifier: MIT OR Apache-2.0
#![doc = include_str!("../README.md")]
#![deny(unsafe_code)]
#![warn(missing_docs)]

//! Narrow retry middleware: exactly one retry, only on HTTP 403, and
//! only when the caller can produce a fresh request each attempt.

use std::future::Future;

use cw_error::{CwError, ErrorCode};

/// A response the retry executor can inspect without owning the body,
/// so callers decide how to read their own response type.
pub trait HasStatus {
    /// The HTTP status code of the response.
    fn status(&self) -> u16;
}

/// Maximum number of attempts `retry_once_on_403` will make: the
/// original request plus one retry.
pub const MAX_ATTEMPTS: u32 = 2;

/// Execute `make_request`, retrying exactly once if the response's
/// status is 403.
///
/// `make_request` is called fresh for every attempt — it must build and
/// send a brand new request rather than resend a consumed body, since
/// a multi-part credential's signature may depend on a timestamp that
/// needs to be regenerated on retry.
pub async fn retry_once_on_403<F, Fut, R, E>(mut make_request: F) -> Result<R, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<R, E>>,
    R: HasStatus,
{
    let mut attempt = 0;
    loop {
        attempt += 1;
        let result = make_request().await;
        match &result {
            Ok(response) if response.status() == 403 && attempt < MAX_ATTEMPTS => {
                tracing::debug!(attempt, "retrying verification request after 403");
                continue;
            }
            _ => return result,
        }
    }
}

/// Classify a final HTTP status into a verification error code, for
/// callers that don't treat the status as success and need to record
/// why.
#[must_use]
pub fn classify_unexpected_status(status: u16) -> CwError {
    CwError::verification(
        ErrorCode::VerificationUnexpectedStatus,
        format!("issuing service returned unexpected status {status}"),
    )
    .with_context("status", status)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    struct FakeResponse(u16);

    impl HasStatus for FakeResponse {
        fn status(&self) -> u16 {
            self.0
        }
    }

    #[tokio::test]
    async fn succeeds_without_retry_when_first_attempt_ok() {
        let calls = AtomicU32::new(0);
        let result: Result<FakeResponse, ()> = retry_once_on_403(|| async {
            calls.fetch_add(1, Ordering::SeqCst);
            Ok(FakeResponse(200))
        })
        .await;
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(result.unwrap().status(), 200);
    }

    #[tokio::test]
    async fn retries_exactly_once_on_403() {
        let calls = AtomicU32::new(0);
        let result: Result<FakeResponse, ()> = retry_once_on_403(|| async {
            let n = calls.fetch_add(1, Ordering::SeqCst);
            if n == 0 {
                Ok(FakeResponse(403))
            } else {
                Ok(FakeResponse(200))
            }
        })
        .await;
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert_eq!(result.unwrap().status(), 200);
    }

    #[tokio::test]
    async fn does_not_retry_a_second_time_on_persistent_403() {
        let calls = AtomicU32::new(0);
        let result: Result<FakeResponse, ()> = retry_once_on_403(|| async {
            calls.fetch_add(1, Ordering::SeqCst);
            Ok(FakeResponse(403))
        })
        .await;
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert_eq!(result.unwrap().status(), 403);
    }

    #[tokio::test]
    async fn does_not_retry_non_403_error_statuses() {
        let calls = AtomicU32::new(0);
        let result: Result<FakeResponse, ()> = retry_once_on_403(|| async {
            calls.fetch_add(1, Ordering::SeqCst);
            Ok(FakeResponse(500))
        })
        .await;
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(result.unwrap().status(), 500);
    }
}
