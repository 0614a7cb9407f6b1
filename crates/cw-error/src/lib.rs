// SPDX-License-Identifier: MIT OR Apache-2.0
#![doc = include_str!("../README.md")]
//! cw-error
#![deny(unsafe_code)]
#![warn(missing_docs)]

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

// ---------------------------------------------------------------------------
// ErrorCategory
// ---------------------------------------------------------------------------

/// Broad family an [`ErrorCode`] belongs to — mirrors the taxonomy in spec §7.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    /// Should abort the scan: context cancellation, source init failure,
    /// a source's `Chunks` method returning an error.
    Fatal,
    /// Scoped to one source unit (a repository, a collection). The scan
    /// continues; the unit is recorded as failed.
    Chunk,
    /// Recorded on an individual finding's `VerificationError` field.
    /// Never aborts the scan.
    Verification,
    /// Configuration loading or validation problems.
    Config,
    /// Rate-limiter / HTTP transport plumbing errors not tied to a
    /// specific verification attempt.
    Transport,
    /// Catch-all for unexpected internal errors.
    Internal,
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Fatal => "fatal",
            Self::Chunk => "chunk",
            Self::Verification => "verification",
            Self::Config => "config",
            Self::Transport => "transport",
            Self::Internal => "internal",
        };
        f.write_str(s)
    }
}

// ---------------------------------------------------------------------------
// ErrorCode
// ---------------------------------------------------------------------------

/// Machine-readable, stable error code.
///
/// Each variant serializes to a `SCREAMING_SNAKE_CASE` string guaranteed
/// not to change across patch releases.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    // -- Fatal --
    /// The scan context was cancelled.
    ScanCancelled,
    /// A source failed to initialize.
    SourceInitFailed,
    /// A source's `Chunks` method returned an error.
    SourceChunksFailed,

    // -- Chunk (unit-scoped, recoverable) --
    /// Chunking a single source unit failed (unreachable API, malformed
    /// archive member, unreadable file).
    UnitChunkingFailed,
    /// A detector's `from_data` call returned an error (exceptionally
    /// rare — regex extraction never fails).
    DetectorExtractionFailed,

    // -- Verification --
    /// The verification HTTP call failed at the transport layer.
    VerificationTransportFailed,
    /// The issuing service returned an unexpected (non-2xx, non-invalid-token) status.
    VerificationUnexpectedStatus,
    /// The response body could not be decoded.
    VerificationBodyDecodeFailed,
    /// The account derived from the credential is on the deny list.
    VerificationAccountDenied,
    /// The account derived from the credential is not on the allow list.
    VerificationAccountNotAllowed,
    /// The verification call timed out.
    VerificationTimedOut,

    // -- Config --
    /// Configuration file or value is invalid.
    ConfigInvalid,
    /// The requested configuration file was not found.
    ConfigNotFound,

    // -- Transport --
    /// Rate limiter rejected a request bound for the wrong hostname.
    RateLimiterHostMismatch,
    /// A rate-limiter policy failed to update its state from a response.
    RateLimiterUpdateFailed,

    // -- Internal --
    /// Catch-all for unexpected internal errors.
    Internal,
}

impl ErrorCode {
    /// Returns the broad [`ErrorCategory`] this code belongs to.
    #[must_use]
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::ScanCancelled | Self::SourceInitFailed | Self::SourceChunksFailed => {
                ErrorCategory::Fatal
            }
            Self::UnitChunkingFailed | Self::DetectorExtractionFailed => ErrorCategory::Chunk,
            Self::VerificationTransportFailed
            | Self::VerificationUnexpectedStatus
            | Self::VerificationBodyDecodeFailed
            | Self::VerificationAccountDenied
            | Self::VerificationAccountNotAllowed
            | Self::VerificationTimedOut => ErrorCategory::Verification,
            Self::ConfigInvalid | Self::ConfigNotFound => ErrorCategory::Config,
            Self::RateLimiterHostMismatch | Self::RateLimiterUpdateFailed => {
                ErrorCategory::Transport
            }
            Self::Internal => ErrorCategory::Internal,
        }
    }

    /// Stable `&'static str` representation (e.g. `"SCAN_CANCELLED"`).
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ScanCancelled => "SCAN_CANCELLED",
            Self::SourceInitFailed => "SOURCE_INIT_FAILED",
            Self::SourceChunksFailed => "SOURCE_CHUNKS_FAILED",
            Self::UnitChunkingFailed => "UNIT_CHUNKING_FAILED",
            Self::DetectorExtractionFailed => "DETECTOR_EXTRACTION_FAILED",
            Self::VerificationTransportFailed => "VERIFICATION_TRANSPORT_FAILED",
            Self::VerificationUnexpectedStatus => "VERIFICATION_UNEXPECTED_STATUS",
            Self::VerificationBodyDecodeFailed => "VERIFICATION_BODY_DECODE_FAILED",
            Self::VerificationAccountDenied => "VERIFICATION_ACCOUNT_DENIED",
            Self::VerificationAccountNotAllowed => "VERIFICATION_ACCOUNT_NOT_ALLOWED",
            Self::VerificationTimedOut => "VERIFICATION_TIMED_OUT",
            Self::ConfigInvalid => "CONFIG_INVALID",
            Self::ConfigNotFound => "CONFIG_NOT_FOUND",
            Self::RateLimiterHostMismatch => "RATE_LIMITER_HOST_MISMATCH",
            Self::RateLimiterUpdateFailed => "RATE_LIMITER_UPDATE_FAILED",
            Self::Internal => "INTERNAL",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// CwError
// ---------------------------------------------------------------------------

/// Unified credsweep error.
///
/// Carries a stable [`ErrorCode`], a human-readable message, an optional
/// source error for cause-chaining, and arbitrary structured context.
///
/// # Builder usage
///
/// ```
/// use cw_error::{CwError, ErrorCode};
///
/// let err = CwError::chunk("postman collection enumeration failed")
///     .with_context("workspace_id", "abc123")
///     .with_context("collection_id", "def456");
/// assert_eq!(err.code, ErrorCode::UnitChunkingFailed);
/// ```
pub struct CwError {
    /// Machine-readable error code.
    pub code: ErrorCode,
    /// Human-readable description.
    pub message: String,
    /// Optional underlying cause.
    pub source: Option<Box<dyn std::error::Error + Send + Sync>>,
    /// Arbitrary structured context for diagnostics.
    pub context: BTreeMap<String, serde_json::Value>,
}

impl CwError {
    /// Create a new error with the given code and message.
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            source: None,
            context: BTreeMap::new(),
        }
    }

    /// Construct a fatal (scan-aborting) error.
    pub fn fatal(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::SourceChunksFailed, message)
    }

    /// Construct a unit-scoped chunk error (scan continues).
    pub fn chunk(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::UnitChunkingFailed, message)
    }

    /// Construct a verification error with the given code.
    ///
    /// Panics in debug builds if `code` is not in the `Verification`
    /// category — callers should use one of the `Verification*` codes.
    pub fn verification(code: ErrorCode, message: impl Into<String>) -> Self {
        debug_assert_eq!(code.category(), ErrorCategory::Verification);
        Self::new(code, message)
    }

    /// Attach a key-value pair to the diagnostic context.
    ///
    /// The value is converted via [`serde_json::to_value`]; if
    /// serialization fails, the entry is silently skipped.
    pub fn with_context(mut self, key: impl Into<String>, value: impl Serialize) -> Self {
        if let Ok(v) = serde_json::to_value(value) {
            self.context.insert(key.into(), v);
        }
        self
    }

    /// Attach an underlying cause.
    pub fn with_source(mut self, source: impl std::error::Error + Send + Sync + 'static) -> Self {
        self.source = Some(Box::new(source));
        self
    }

    /// Shorthand for `self.code.category()`.
    #[must_use]
    pub fn category(&self) -> ErrorCategory {
        self.code.category()
    }

    /// `true` if this error should abort the scan.
    #[must_use]
    pub fn is_fatal(&self) -> bool {
        self.category() == ErrorCategory::Fatal
    }
}

impl fmt::Debug for CwError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut d = f.debug_struct("CwError");
        d.field("code", &self.code);
        d.field("message", &self.message);
        if let Some(ref src) = self.source {
            d.field("source", &src.to_string());
        }
        if !self.context.is_empty() {
            d.field("context", &self.context);
        }
        d.finish()
    }
}

impl fmt::Display for CwError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.code.as_str(), self.message)?;
        if !self.context.is_empty() {
            if let Ok(ctx) = serde_json::to_string(&self.context) {
                write!(f, " {ctx}")?;
            }
        }
        Ok(())
    }
}

impl std::error::Error for CwError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source
            .as_ref()
            .map(|e| e.as_ref() as &(dyn std::error::Error + 'static))
    }
}

// ---------------------------------------------------------------------------
// Serialization support
// ---------------------------------------------------------------------------

/// Serializable snapshot of a [`CwError`] (without the opaque source).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CwErrorDto {
    /// Error code.
    pub code: ErrorCode,
    /// Human-readable message.
    pub message: String,
    /// Structured context.
    pub context: BTreeMap<String, serde_json::Value>,
    /// String representation of the source error, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_message: Option<String>,
}

impl From<&CwError> for CwErrorDto {
    fn from(err: &CwError) -> Self {
        Self {
            code: err.code,
            message: err.message.clone(),
            context: err.context.clone(),
            source_message: err.source.as_ref().map(|s| s.to_string()),
        }
    }
}

impl From<CwErrorDto> for CwError {
    fn from(dto: CwErrorDto) -> Self {
        Self {
            code: dto.code,
            message: dto.message,
            source: None,
            context: dto.context,
        }
    }
}
