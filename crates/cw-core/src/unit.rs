// SPDX-License-Identifier: MIT OR Apache-2.0
//! Reporter hooks a [`crate::Source`] uses to narrate its own progress.
//!
//! Splitting reporting into two small traits (unit-level, chunk-level)
//! instead of one fat `Reporter` lets a source that never chunks
//! sub-units (stdin) skip implementing chunk reporting entirely.

use crate::chunk::SourceUnit;

/// Called as a source discovers the units of work it intends to chunk
/// (repositories in an org, collections in a workspace).
pub trait UnitReporter: Send + Sync {
    /// A unit was discovered and will be chunked.
    fn unit_discovered(&self, unit: &SourceUnit);

    /// A previously discovered unit finished chunking, successfully or
    /// not. `error` carries a human-readable reason on failure.
    fn unit_finished(&self, unit: &SourceUnit, error: Option<&str>);
}

/// Called as a source emits chunks within a unit, for progress metrics
/// independent of the pipeline's own bookkeeping.
pub trait ChunkReporter: Send + Sync {
    /// A chunk of `bytes` length was emitted for `unit`.
    fn chunk_emitted(&self, unit: &SourceUnit, bytes: usize);
}

/// A [`UnitReporter`]/[`ChunkReporter`] that discards everything, for
/// sources and tests that don't care about progress narration.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullReporter;

impl UnitReporter for NullReporter {
    fn unit_discovered(&self, _unit: &SourceUnit) {}
    fn unit_finished(&self, _unit: &SourceUnit, _error: Option<&str>) {}
}

impl ChunkReporter for NullReporter {
    fn chunk_emitted(&self, _unit: &SourceUnit, _bytes: usize) {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chunk::SourceUnitId;

    #[test]
    fn null_reporter_accepts_all_calls() {
        let unit = SourceUnit {
            id: SourceUnitId::new("u1"),
            label: "test unit".into(),
        };
        let reporter = NullReporter;
        reporter.unit_discovered(&unit);
        reporter.unit_finished(&unit, Some("boom"));
        reporter.chunk_emitted(&unit, 128);
    }
}
