// SPDX-License-Identifier: MIT OR Apache-2.0
//! Filesystem and stdin source implementations. Neither has a home in
//! `cw-core` itself (that crate only defines the contract); a Postman
//! export has `cw-postman`, but a plain local scan is simple enough to
//! live directly in the binary that needs it.

use std::path::PathBuf;

use async_trait::async_trait;
use tokio::sync::mpsc;
use walkdir::WalkDir;

use cw_core::{Chunk, MetaData, ScanContext, Source, SourceResult, SourceType};
use cw_error::CwError;
use cw_glob::PathFilter;
use cw_report::JobReport;

/// Walks a directory tree, emitting one chunk per included file.
pub struct FilesystemSource {
    root: PathBuf,
    filter: PathFilter,
    source_id: i64,
    job_id: i64,
    report: JobReport,
}

impl FilesystemSource {
    /// Construct a source rooted at `root`, scanning only files that
    /// pass `filter`. Per-file read failures are unit-scoped and
    /// recorded on `report` rather than aborting the walk.
    #[must_use]
    pub fn new(root: PathBuf, filter: PathFilter, source_id: i64, job_id: i64, report: JobReport) -> Self {
        Self {
            root,
            filter,
            source_id,
            job_id,
            report,
        }
    }
}

#[async_trait]
impl Source for FilesystemSource {
    fn source_type(&self) -> &'static str {
        "filesystem"
    }

    fn source_id(&self) -> i64 {
        self.source_id
    }

    fn job_id(&self) -> i64 {
        self.job_id
    }

    async fn init(&mut self, _ctx: &ScanContext) -> SourceResult<()> {
        Ok(())
    }

    async fn chunks(&mut self, ctx: &ScanContext, tx: mpsc::Sender<Chunk>) -> SourceResult<()> {
        for entry in WalkDir::new(&self.root).into_iter().filter_map(Result::ok) {
            if ctx.is_cancelled() {
                break;
            }
            if !entry.file_type().is_file() {
                continue;
            }
            let relative = entry.path().strip_prefix(&self.root).unwrap_or(entry.path());
            let relative_str = relative.to_string_lossy();
            if !self.filter.is_included(&relative_str) {
                continue;
            }

            let data = match tokio::fs::read(entry.path()).await {
                Ok(data) => data,
                Err(e) => {
                    tracing::warn!(path = %entry.path().display(), error = %e, "skipping unreadable file");
                    self.report.report_error(
                        Some(relative_str.into_owned()),
                        &CwError::chunk(format!("failed to read {}: {e}", entry.path().display())),
                    );
                    continue;
                }
            };

            let chunk = Chunk::new(data, SourceType::Filesystem, self.root.to_string_lossy())
                .with_ids(self.source_id, self.job_id)
                .with_verify(true)
                .with_meta(MetaData::Filesystem {
                    path: relative_str.into_owned(),
                    line: None,
                });

            if tx.send(chunk).await.is_err() {
                break;
            }
        }
        Ok(())
    }
}

/// Reads the entirety of stdin as a single chunk.
pub struct StdinSource {
    source_id: i64,
    job_id: i64,
}

impl StdinSource {
    /// Construct a stdin source.
    #[must_use]
    pub fn new(source_id: i64, job_id: i64) -> Self {
        Self { source_id, job_id }
    }
}

#[async_trait]
impl Source for StdinSource {
    fn source_type(&self) -> &'static str {
        "stdin"
    }

    fn source_id(&self) -> i64 {
        self.source_id
    }

    fn job_id(&self) -> i64 {
        self.job_id
    }

    async fn init(&mut self, _ctx: &ScanContext) -> SourceResult<()> {
        Ok(())
    }

    async fn chunks(&mut self, _ctx: &ScanContext, tx: mpsc::Sender<Chunk>) -> SourceResult<()> {
        use std::io::Read;
        let mut data = Vec::new();
        std::io::stdin()
            .lock()
            .read_to_end(&mut data)
            .map_err(|e| CwError::fatal(format!("failed to read stdin: {e}")))?;

        let chunk = Chunk::new(data, SourceType::Stdin, "stdin")
            .with_ids(self.source_id, self.job_id)
            .with_verify(true)
            .with_meta(MetaData::Unknown);

        let _ = tx.send(chunk).await;
        Ok(())
    }
}
