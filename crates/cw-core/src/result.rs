// SPDX-License-Identifier: MIT OR Apache-2.0
//! The finding record.
//!
//! Named `Finding` rather than `Result` to avoid colliding with
//! `std::result::Result`. Two shapes exist: [`RawFinding`] is what a
//! detector hands back from `from_data`, before verification or
//! provenance attachment; [`Finding`] is the final record the pipeline
//! emits, with chunk provenance and verification status attached.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::chunk::MetaData;
use crate::detector::DetectorType;

/// What a detector extracted from a chunk, before provenance or
/// verification are attached. `raw` is the exact matched bytes; `raw_v2`
/// is populated by multi-part detectors that pair two matches (e.g. an
/// AWS key ID plus its secret) into one candidate credential.
#[derive(Debug, Clone, Default)]
pub struct RawFinding {
    /// The primary matched bytes (e.g. the full regex match).
    pub raw: Vec<u8>,
    /// A second matched value, for multi-part credentials. Absent for
    /// single-token detectors.
    pub raw_v2: Option<Vec<u8>>,
    /// Redacted rendering safe to log or display, already truncated or
    /// masked by the detector.
    pub redacted: String,
    /// Free-form detector-specific data, carried through to the final
    /// finding's `extra_data`.
    pub extra_data: BTreeMap<String, Value>,
    /// Arbitrary structured payload a detector wants attached verbatim
    /// (e.g. a parsed JWT's claims).
    pub structured_data: Option<Value>,
}

impl RawFinding {
    /// Construct a raw finding from matched bytes and a redacted form.
    #[must_use]
    pub fn new(raw: Vec<u8>, redacted: impl Into<String>) -> Self {
        Self {
            raw,
            redacted: redacted.into(),
            ..Default::default()
        }
    }
}

/// Verification outcome for a finding. Tri-state plus a fourth "errored"
/// case so a transport failure is distinguishable from a confirmed-dead
/// credential.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum VerificationStatus {
    /// Verification was not attempted (chunk's `verify` flag was unset,
    /// or the detector has no verifier).
    Unverified,
    /// The credential was confirmed live against the issuing service.
    Verified,
    /// The credential was confirmed dead (e.g. a canary account, or an
    /// explicit invalid-token response).
    Dead,
    /// Verification was attempted but failed for a reason unrelated to
    /// the credential's validity (network error, unexpected status,
    /// rate limited past retry budget).
    Error {
        /// Stable error code from `cw-error`, as a string for
        /// serialization stability independent of the enum's repr.
        code: String,
        /// Human-readable detail.
        message: String,
    },
}

impl VerificationStatus {
    /// `true` if this status represents a confirmed-live credential.
    #[must_use]
    pub fn is_verified(&self) -> bool {
        matches!(self, Self::Verified)
    }
}

/// Analysis metadata attached by the resolver, independent of what the
/// detector itself produced (spec §4.4: dedup, suppression decisions).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AnalysisInfo {
    /// `true` if this finding was identified as a duplicate of another
    /// finding in the same unit and suppressed from the final report.
    pub is_duplicate: bool,
    /// `true` if a false-positive heuristic (entropy, hash-pattern,
    /// detector-specific check) flagged this finding for suppression.
    pub is_false_positive: bool,
    /// `true` if the derived account (where applicable) matched a known
    /// canary/honeypot account.
    pub is_canary: bool,
}

/// The final finding record, combining a detector's raw output with
/// chunk provenance and verification status.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Finding {
    /// Which detector produced this finding.
    pub detector_type: DetectorType,
    /// Exact matched bytes, lossily rendered as UTF-8 for serialization.
    /// Binary-unsafe matches are not expected from text-oriented
    /// detectors; a detector that needs raw bytes should base64-encode
    /// into `extra_data` instead.
    pub raw: String,
    /// Second matched value for multi-part credentials.
    pub raw_v2: Option<String>,
    /// Redacted rendering safe to display or log.
    pub redacted: String,
    /// Verification outcome.
    pub verification: VerificationStatus,
    /// Provenance of the chunk this finding was extracted from.
    pub meta: MetaData,
    /// Source name the chunk came from.
    pub source_name: String,
    /// Source ID the chunk came from.
    pub source_id: i64,
    /// Job this finding belongs to.
    pub job_id: i64,
    /// Detector-specific free-form data.
    pub extra_data: BTreeMap<String, Value>,
    /// Optional structured payload from the detector.
    pub structured_data: Option<Value>,
    /// Resolver-assigned analysis metadata.
    pub analysis: AnalysisInfo,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verification_status_serde_tag() {
        let v = VerificationStatus::Error {
            code: "VERIFICATION_TRANSPORT_FAILED".into(),
            message: "timeout".into(),
        };
        let json = serde_json::to_value(&v).unwrap();
        assert_eq!(json["status"], "error");
        assert_eq!(json["code"], "VERIFICATION_TRANSPORT_FAILED");
    }

    #[test]
    fn is_verified_only_true_for_verified_variant() {
        assert!(VerificationStatus::Verified.is_verified());
        assert!(!VerificationStatus::Unverified.is_verified());
        assert!(!VerificationStatus::Dead.is_verified());
    }

    #[test]
    fn raw_finding_new_defaults_extra_fields() {
        let f = RawFinding::new(b"secret".to_vec(), "sec***");
        assert!(f.raw_v2.is_none());
        assert!(f.extra_data.is_empty());
    }
}
