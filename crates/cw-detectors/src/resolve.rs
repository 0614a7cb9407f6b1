// SPDX-License-Identifier: MIT OR Apache-2.0
//! Multi-match resolution: pairing, dedup, and false-positive
//! suppression applied to a detector's raw output before verification.

use std::collections::BTreeSet;
use std::sync::Arc;

use cw_core::{AnalysisInfo, Chunk, Detector, Finding, RawFinding, VerificationStatus};

use crate::clean::looks_like_hash;

/// Resolve one detector's raw findings for one chunk into final
/// [`Finding`] records: multi-part pairing, detector cleanup,
/// within-chunk dedup, and false-positive suppression, in that order.
#[must_use]
pub fn resolve(detector: &Arc<dyn Detector>, findings: Vec<RawFinding>, chunk: &Chunk) -> Vec<Finding> {
    let findings = match detector.as_multipart() {
        Some(provider) => provider.pair_candidates(findings),
        None => findings,
    };
    let findings = match detector.as_cleaner() {
        Some(cleaner) => cleaner.clean_results(findings),
        None => findings,
    };
    let findings = dedup_by_raw(findings);

    findings
        .into_iter()
        .map(|raw| {
            let is_fp = looks_like_hash(&raw.raw)
                || raw.raw_v2.as_deref().is_some_and(looks_like_hash)
                || detector
                    .as_fp_checker()
                    .is_some_and(|checker| checker.is_false_positive(&raw));
            Finding {
                detector_type: detector.detector_type(),
                raw: String::from_utf8_lossy(&raw.raw).into_owned(),
                raw_v2: raw
                    .raw_v2
                    .as_ref()
                    .map(|v| String::from_utf8_lossy(v).into_owned()),
                redacted: raw.redacted,
                verification: VerificationStatus::Unverified,
                meta: chunk.meta.clone(),
                source_name: chunk.source_name.clone(),
                source_id: chunk.source_id,
                job_id: chunk.job_id,
                extra_data: raw.extra_data,
                structured_data: raw.structured_data,
                analysis: AnalysisInfo {
                    is_duplicate: false,
                    is_false_positive: is_fp,
                    is_canary: false,
                },
            }
        })
        .collect()
}

/// Deduplicate findings that matched the exact same raw bytes (and, for
/// multi-part credentials, the same paired secondary value) within one
/// chunk's worth of output.
fn dedup_by_raw(findings: Vec<RawFinding>) -> Vec<RawFinding> {
    let mut seen = BTreeSet::new();
    findings
        .into_iter()
        .filter(|f| {
            let key = (f.raw.clone(), f.raw_v2.clone());
            seen.insert(key)
        })
        .collect()
}

/// Merge findings for the same (detector, raw, raw_v2) key across an
/// entire unit's chunks, keeping the first verified occurrence and
/// marking the rest as duplicates rather than dropping them outright —
/// provenance from every occurrence stays available even though only
/// one copy is reported (spec §4.4).
#[must_use]
pub fn merge_unit_findings(mut findings: Vec<Finding>) -> Vec<Finding> {
    let mut first_index: std::collections::HashMap<(String, Option<String>, String), usize> =
        std::collections::HashMap::new();
    let mut keep = vec![true; findings.len()];

    for (i, f) in findings.iter().enumerate() {
        let key = (f.raw.clone(), f.raw_v2.clone(), f.detector_type.to_string());
        match first_index.get(&key) {
            None => {
                first_index.insert(key, i);
            }
            Some(&first) => {
                if findings[i].verification.is_verified() && !findings[first].verification.is_verified() {
                    keep[first] = false;
                    findings[i].analysis.is_duplicate = false;
                } else {
                    keep[i] = false;
                    findings[i].analysis.is_duplicate = true;
                }
            }
        }
    }

    findings
        .into_iter()
        .zip(keep)
        .filter_map(|(f, keep)| keep.then_some(f))
        .collect()
}
