// SPDX-License-Identifier: MIT OR Apache-2.0
#![doc = include_str!("../README.md")]
#![deny(unsafe_code)]
#![warn(missing_docs)]

//! Single-pass keyword prefiltering ahead of per-detector regex work.

use aho_corasick::{AhoCorasick, AhoCorasickBuilder, MatchKind};

/// Compiled keyword prefilter over every registered detector's keyword
/// set. Built once per registry; cheap to clone (it's an `Arc` inside).
#[derive(Clone)]
pub struct Prefilter {
    automaton: AhoCorasick,
    /// `owners[pattern_index]` is the detector index that registered
    /// the keyword at `pattern_index`.
    owners: Vec<usize>,
}

/// Error building the underlying automaton (only possible with a
/// pathological number of patterns).
#[derive(Debug, thiserror::Error)]
pub enum PrefilterError {
    /// The Aho-Corasick builder rejected the pattern set.
    #[error("failed to build prefilter automaton: {0}")]
    Build(#[from] aho_corasick::BuildError),
}

impl Prefilter {
    /// Build a prefilter from each detector's keyword list. `keywords_by_detector[i]`
    /// is the keyword set for detector index `i`; that index is what
    /// [`Prefilter::matching_detectors`] returns.
    pub fn build<I, K>(keywords_by_detector: I) -> Result<Self, PrefilterError>
    where
        I: IntoIterator<Item = K>,
        K: IntoIterator<Item = &'static str>,
    {
        let mut patterns = Vec::new();
        let mut owners = Vec::new();
        for (detector_idx, keywords) in keywords_by_detector.into_iter().enumerate() {
            for kw in keywords {
                patterns.push(kw.to_ascii_lowercase());
                owners.push(detector_idx);
            }
        }
        let automaton = AhoCorasickBuilder::new()
            .ascii_case_insensitive(true)
            .match_kind(MatchKind::LeftmostFirst)
            .build(&patterns)?;
        Ok(Self { automaton, owners })
    }

    /// Scan `data` once and return the sorted, deduplicated set of
    /// detector indices whose keywords matched.
    #[must_use]
    pub fn matching_detectors(&self, data: &[u8]) -> Vec<usize> {
        let mut hits: Vec<usize> = self
            .automaton
            .find_iter(data)
            .map(|m| self.owners[m.pattern().as_usize()])
            .collect();
        hits.sort_unstable();
        hits.dedup();
        hits
    }
}
