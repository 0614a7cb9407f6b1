// SPDX-License-Identifier: MIT OR Apache-2.0
//! Keyword-prefiltered dispatch across registered detectors.

use std::sync::Arc;

use cw_core::{Chunk, Detector, RawFinding};
use cw_prefilter::Prefilter;

/// Owns every registered detector plus the compiled keyword prefilter
/// over their combined keyword sets.
pub struct Registry {
    detectors: Vec<Arc<dyn Detector>>,
    prefilter: Prefilter,
}

impl Registry {
    /// Build a registry from a list of detectors, compiling the
    /// prefilter once.
    ///
    /// # Panics
    ///
    /// Panics if the combined keyword set is too large for the
    /// underlying automaton to build — in practice unreachable with the
    /// handful of detectors a deployment registers.
    #[must_use]
    pub fn new(detectors: Vec<Arc<dyn Detector>>) -> Self {
        let prefilter = Prefilter::build(detectors.iter().map(|d| d.keywords().to_vec()))
            .expect("detector keyword set failed to compile");
        Self {
            detectors,
            prefilter,
        }
    }

    /// Number of registered detectors.
    #[must_use]
    pub fn len(&self) -> usize {
        self.detectors.len()
    }

    /// `true` if no detectors are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.detectors.is_empty()
    }

    /// Every registered detector's keyword set, flattened. Callers that
    /// need to judge relevance against the real keyword vocabulary
    /// (rather than the prefilter's automaton) use this, e.g. the
    /// Postman adapter deciding which structural names are worth
    /// amplifying.
    #[must_use]
    pub fn detector_keywords(&self) -> Vec<&'static str> {
        self.detectors.iter().flat_map(|d| d.keywords().iter().copied()).collect()
    }

    /// Run every detector whose keywords matched `chunk` against it,
    /// returning the raw findings grouped by detector index.
    #[must_use]
    pub fn scan(&self, chunk: &Chunk) -> Vec<(Arc<dyn Detector>, Vec<RawFinding>)> {
        let matched = self.prefilter.matching_detectors(&chunk.data);
        matched
            .into_iter()
            .filter_map(|idx| self.detectors.get(idx))
            .map(|detector| {
                let findings = detector.from_data(chunk);
                (Arc::clone(detector), findings)
            })
            .filter(|(_, findings)| !findings.is_empty())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cw_core::{DetectorType, SourceType};

    struct EchoDetector;

    impl Detector for EchoDetector {
        fn detector_type(&self) -> DetectorType {
            DetectorType::new(1)
        }
        fn keywords(&self) -> &[&'static str] {
            &["echo"]
        }
        fn from_data(&self, chunk: &Chunk) -> Vec<RawFinding> {
            vec![RawFinding::new(chunk.data.clone(), "ec***")]
        }
    }

    #[test]
    fn scan_runs_only_matched_detectors() {
        let registry = Registry::new(vec![Arc::new(EchoDetector)]);
        let chunk = Chunk::new(b"an echo in here".to_vec(), SourceType::Other, "t");
        let hits = registry.scan(&chunk);
        assert_eq!(hits.len(), 1);

        let miss = Chunk::new(b"nothing relevant".to_vec(), SourceType::Other, "t");
        assert!(registry.scan(&miss).is_empty());
    }

    #[test]
    fn detector_keywords_flattens_every_registered_detector() {
        let registry = Registry::new(vec![Arc::new(EchoDetector)]);
        assert_eq!(registry.detector_keywords(), vec!["echo"]);
    }
}
