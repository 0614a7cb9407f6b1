// SPDX-License-Identifier: MIT OR Apache-2.0
//! Cancellation + identity, threaded through every long-running call.
//!
//! Design note (spec §9): never use process-global state for cancellation
//! or logging. A [`ScanContext`] is cheap to clone (an `Arc`-backed
//! [`CancellationToken`]) and is passed by value down every call chain
//! from the source through the worker pool to the verifier harness.

use tokio_util::sync::CancellationToken;

/// Cancellable context carrying scan identity, threaded through every
/// source, detector, and verifier call.
#[derive(Debug, Clone)]
pub struct ScanContext {
    cancel: CancellationToken,
    job_id: i64,
    source_id: i64,
}

impl ScanContext {
    /// Create a fresh context for a new scan.
    #[must_use]
    pub fn new(job_id: i64, source_id: i64) -> Self {
        Self {
            cancel: CancellationToken::new(),
            job_id,
            source_id,
        }
    }

    /// Derive a child context that is cancelled whenever `self` is, but
    /// can also be cancelled independently (used to scope a single
    /// source unit without tearing down the whole scan).
    #[must_use]
    pub fn child(&self) -> Self {
        Self {
            cancel: self.cancel.child_token(),
            job_id: self.job_id,
            source_id: self.source_id,
        }
    }

    /// The job ID this context belongs to.
    #[must_use]
    pub fn job_id(&self) -> i64 {
        self.job_id
    }

    /// The source ID this context belongs to.
    #[must_use]
    pub fn source_id(&self) -> i64 {
        self.source_id
    }

    /// Request cancellation. Idempotent.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// `true` if cancellation has been requested.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Resolves once cancellation is requested. Await this in a `select!`
    /// alongside I/O so suspension points return promptly (spec §5).
    pub async fn cancelled(&self) {
        self.cancel.cancelled().await;
    }
}
