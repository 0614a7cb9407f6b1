// SPDX-License-Identifier: MIT OR Apache-2.0
//! The source contract: anything that can enumerate work and emit
//! chunks of bytes for detectors to scan.

use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::chunk::{Chunk, SourceUnit};
use crate::context::ScanContext;

/// Errors a source can report back to the pipeline. Chunk-level errors
/// are scoped to one unit and do not abort the scan; init errors are
/// fatal.
pub type SourceResult<T> = std::result::Result<T, cw_error::CwError>;

/// A producer of chunks. Implementors cover git history walking, plain
/// filesystem trees, stdin, and the Postman-style adapter.
///
/// `enumerate` and `chunk_unit` are optional: a source with a single
/// implicit unit (stdin) can skip enumeration and chunk everything in
/// `chunks` directly.
#[async_trait]
pub trait Source: Send + Sync {
    /// Human-readable source type name, used in findings' provenance
    /// and in logging.
    fn source_type(&self) -> &'static str;

    /// Stable integer ID for this source instance within the job.
    fn source_id(&self) -> i64;

    /// The job this source instance belongs to.
    fn job_id(&self) -> i64;

    /// One-time setup (opening a repository, authenticating to an API).
    /// Called once before `chunks`.
    async fn init(&mut self, ctx: &ScanContext) -> SourceResult<()>;

    /// Emit chunks onto `tx` until the source is exhausted or `ctx` is
    /// cancelled. Must respect cancellation promptly rather than
    /// draining to completion.
    async fn chunks(&mut self, ctx: &ScanContext, tx: mpsc::Sender<Chunk>) -> SourceResult<()>;

    /// List the units this source intends to chunk, if the source
    /// tracks discrete units (repos, collections). Sources without a
    /// natural notion of sub-units may leave this unimplemented.
    async fn enumerate(&mut self, _ctx: &ScanContext) -> SourceResult<Vec<SourceUnit>> {
        Ok(Vec::new())
    }

    /// Chunk a single previously enumerated unit. Only called for
    /// sources that implement `enumerate` with a non-empty result.
    async fn chunk_unit(
        &mut self,
        _ctx: &ScanContext,
        _unit: &SourceUnit,
        _tx: mpsc::Sender<Chunk>,
    ) -> SourceResult<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chunk::SourceType;

    struct StaticSource {
        id: i64,
        job: i64,
        lines: Vec<&'static str>,
    }

    #[async_trait]
    impl Source for StaticSource {
        fn source_type(&self) -> &'static str {
            "static"
        }

        fn source_id(&self) -> i64 {
            self.id
        }

        fn job_id(&self) -> i64 {
            self.job
        }

        async fn init(&mut self, _ctx: &ScanContext) -> SourceResult<()> {
            Ok(())
        }

        async fn chunks(&mut self, ctx: &ScanContext, tx: mpsc::Sender<Chunk>) -> SourceResult<()> {
            for line in &self.lines {
                if ctx.is_cancelled() {
                    break;
                }
                let chunk = Chunk::new(line.as_bytes().to_vec(), SourceType::Other, "static")
                    .with_ids(self.id, self.job);
                let _ = tx.send(chunk).await;
            }
            Ok(())
        }
    }

    #[tokio::test]
    async fn static_source_emits_all_lines() {
        let mut source = StaticSource {
            id: 1,
            job: 1,
            lines: vec!["a", "b", "c"],
        };
        let ctx = ScanContext::new(1, 1);
        let (tx, mut rx) = mpsc::channel(8);
        source.init(&ctx).await.unwrap();
        source.chunks(&ctx, tx).await.unwrap();

        let mut seen = Vec::new();
        while let Some(chunk) = rx.recv().await {
            seen.push(String::from_utf8(chunk.data).unwrap());
        }
        assert_eq!(seen, vec!["a", "b", "c"]);
    }

    #[tokio::test]
    async fn cancelled_context_stops_emission_early() {
        let mut source = StaticSource {
            id: 1,
            job: 1,
            lines: vec!["a", "b", "c"],
        };
        let ctx = ScanContext::new(1, 1);
        ctx.cancel();
        let (tx, mut rx) = mpsc::channel(8);
        source.chunks(&ctx, tx).await.unwrap();
        assert!(rx.recv().await.is_none());
    }
}
