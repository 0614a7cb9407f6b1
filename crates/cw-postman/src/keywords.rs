// SPDX-License-Identifier: MIT OR Apache-2.0
//! Keyword accumulation from workspace/collection/folder names.
//!
//! A request whose auth block references `{{aws_secret}}` gives the
//! keyword prefilter nothing to match until that variable is
//! substituted — but the *name* `aws_secret`, or a sibling folder named
//! "AWS Credentials", is often itself keyword-bearing. Accumulating
//! these names alongside a chunk's body text raises the chance a
//! relevant detector is even considered.

use std::collections::BTreeSet;

/// Collects lowercase keyword candidates drawn from structural names
/// (workspace, collection, folder, variable names) encountered while
/// walking a workspace.
#[derive(Debug, Clone, Default)]
pub struct KeywordAccumulator {
    seen: BTreeSet<String>,
}

impl KeywordAccumulator {
    /// Construct an empty accumulator.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a structural name, splitting on non-alphanumeric
    /// boundaries so `"AWS Credentials"` yields `"aws"` and
    /// `"credentials"` as separate candidates.
    pub fn record(&mut self, name: &str) {
        for word in name.split(|c: char| !c.is_alphanumeric()) {
            if word.len() >= 3 {
                self.seen.insert(word.to_ascii_lowercase());
            }
        }
    }

    /// All accumulated keyword candidates, sorted.
    #[must_use]
    pub fn candidates(&self) -> Vec<&str> {
        self.seen.iter().map(String::as_str).collect()
    }

    /// Which of `detector_keywords` overlap with an accumulated
    /// structural name, by substring in either direction. Returned in
    /// `detector_keywords` order, deduplicated.
    #[must_use]
    pub fn hits<'a>(&self, detector_keywords: &[&'a str]) -> Vec<&'a str> {
        let mut out: Vec<&'a str> = Vec::new();
        for &dk in detector_keywords {
            let overlaps = self.seen.iter().any(|k| k.contains(dk) || dk.contains(k.as_str()));
            if overlaps && !out.contains(&dk) {
                out.push(dk);
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_on_non_alphanumeric_boundaries() {
        let mut acc = KeywordAccumulator::new();
        acc.record("AWS Credentials - prod");
        assert!(acc.candidates().contains(&"aws"));
        assert!(acc.candidates().contains(&"credentials"));
        assert!(acc.candidates().contains(&"prod"));
    }

    #[test]
    fn short_words_are_dropped() {
        let mut acc = KeywordAccumulator::new();
        acc.record("a to be");
        assert!(acc.candidates().is_empty());
    }

    #[test]
    fn hits_keeps_only_overlapping_detector_keywords_deduped() {
        let mut acc = KeywordAccumulator::new();
        acc.record("AWS Credentials");
        acc.record("AWS Credentials");
        assert_eq!(acc.hits(&["akia", "asia", "aws", "slack"]), vec!["aws"]);
    }
}
