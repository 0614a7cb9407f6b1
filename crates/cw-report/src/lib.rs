// SPDX-License-Identifier: MIT OR Apache-2.0
#![doc = include_str!("../README.md")]
#![deny(unsafe_code)]
#![warn(missing_docs)]

//! Job-level progress aggregation.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Instant;

use chrono::{DateTime, Utc};
use serde::Serialize;

use cw_error::{CwError, ErrorCategory, ErrorCode};

/// A named phase of the run (enumeration, unit chunking, verification)
/// with its start and end time, for reporting how long each stage took.
#[derive(Debug, Clone, Serialize)]
pub struct PhaseTiming {
    /// Phase name.
    pub name: String,
    /// When the phase started.
    pub started_at: DateTime<Utc>,
    /// When the phase ended, if it has.
    pub ended_at: Option<DateTime<Utc>>,
}

/// A recorded error, attributed to the unit it occurred in where known.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorRecord {
    /// Unit label the error is attributed to, if any.
    pub unit: Option<String>,
    /// Broad family this error belongs to, used by
    /// [`JobReport::fatal_errors`]/[`JobReport::enumeration_errors`]/
    /// [`JobReport::chunk_errors`] to filter the stored list.
    pub category: ErrorCategory,
    /// Error code string from `cw-error`.
    pub code: String,
    /// Human-readable message.
    pub message: String,
}

#[derive(Default)]
struct Counters {
    total_units: AtomicU64,
    finished_units: AtomicU64,
    total_chunks: AtomicU64,
    total_findings: AtomicU64,
    verified_findings: AtomicU64,
    done: AtomicBool,
}

/// Aggregates progress for one job. Cheap to clone (an `Arc` inside);
/// every pipeline stage holds a clone and calls its hook methods
/// directly rather than routing through a central actor.
#[derive(Clone)]
pub struct JobReport {
    inner: Arc<Inner>,
}

struct Inner {
    job_id: i64,
    counters: Counters,
    phases: Mutex<Vec<PhaseTiming>>,
    errors: Mutex<Vec<ErrorRecord>>,
    started_at: Instant,
}

impl JobReport {
    /// Start a fresh report for `job_id`.
    #[must_use]
    pub fn start(job_id: i64) -> Self {
        Self {
            inner: Arc::new(Inner {
                job_id,
                counters: Counters::default(),
                phases: Mutex::new(Vec::new()),
                errors: Mutex::new(Vec::new()),
                started_at: Instant::now(),
            }),
        }
    }

    /// Record the start of a named phase.
    pub fn start_phase(&self, name: impl Into<String>) {
        let mut phases = self.inner.phases.lock().expect("report mutex poisoned");
        phases.push(PhaseTiming {
            name: name.into(),
            started_at: Utc::now(),
            ended_at: None,
        });
    }

    /// Record the end of the most recently started phase with this
    /// name that hasn't ended yet.
    pub fn end_phase(&self, name: &str) {
        let mut phases = self.inner.phases.lock().expect("report mutex poisoned");
        if let Some(phase) = phases.iter_mut().rev().find(|p| p.name == name && p.ended_at.is_none()) {
            phase.ended_at = Some(Utc::now());
        }
    }

    /// A unit was discovered and will be chunked.
    pub fn report_unit(&self) {
        self.inner.counters.total_units.fetch_add(1, Ordering::Relaxed);
    }

    /// A unit finished chunking.
    pub fn report_unit_finished(&self) {
        self.inner.counters.finished_units.fetch_add(1, Ordering::Relaxed);
    }

    /// A chunk was emitted.
    pub fn report_chunk(&self) {
        self.inner.counters.total_chunks.fetch_add(1, Ordering::Relaxed);
    }

    /// A finding was produced; `verified` if it was confirmed live.
    pub fn report_finding(&self, verified: bool) {
        self.inner.counters.total_findings.fetch_add(1, Ordering::Relaxed);
        if verified {
            self.inner.counters.verified_findings.fetch_add(1, Ordering::Relaxed);
        }
    }

    /// Record an error, attributing it to `unit` where known. The
    /// error's own [`ErrorCode::category`] is stored alongside it so
    /// callers can later filter by severity without re-parsing the
    /// code string.
    pub fn report_error(&self, unit: Option<String>, error: &CwError) {
        let mut errors = self.inner.errors.lock().expect("report mutex poisoned");
        errors.push(ErrorRecord {
            unit,
            category: error.category(),
            code: error.code.as_str().to_string(),
            message: error.message.clone(),
        });
    }

    /// Errors that should abort the scan (context cancellation, a
    /// source's `init`/`chunks` failing outright).
    #[must_use]
    pub fn fatal_errors(&self) -> Vec<ErrorRecord> {
        self.errors_in_category(ErrorCategory::Fatal)
    }

    /// Errors scoped to discovering or chunking a single source unit —
    /// the scan continues past these, but the unit is incomplete.
    #[must_use]
    pub fn enumeration_errors(&self) -> Vec<ErrorRecord> {
        self.errors_with_code(ErrorCode::UnitChunkingFailed)
    }

    /// Errors scoped to extracting findings from a single chunk once
    /// its unit was already enumerated successfully.
    #[must_use]
    pub fn chunk_errors(&self) -> Vec<ErrorRecord> {
        self.errors_with_code(ErrorCode::DetectorExtractionFailed)
    }

    fn errors_in_category(&self, category: ErrorCategory) -> Vec<ErrorRecord> {
        self.inner
            .errors
            .lock()
            .expect("report mutex poisoned")
            .iter()
            .filter(|e| e.category == category)
            .cloned()
            .collect()
    }

    fn errors_with_code(&self, code: ErrorCode) -> Vec<ErrorRecord> {
        self.inner
            .errors
            .lock()
            .expect("report mutex poisoned")
            .iter()
            .filter(|e| e.code == code.as_str())
            .cloned()
            .collect()
    }

    /// Mark the job as finished. Idempotent.
    pub fn finish(&self) {
        self.inner.counters.done.store(true, Ordering::Release);
    }

    /// `true` once [`JobReport::finish`] has been called.
    #[must_use]
    pub fn is_done(&self) -> bool {
        self.inner.counters.done.load(Ordering::Acquire)
    }

    /// Point-in-time snapshot of every counter, phase, and error.
    #[must_use]
    pub fn snapshot(&self) -> JobReportSnapshot {
        let c = &self.inner.counters;
        JobReportSnapshot {
            job_id: self.inner.job_id,
            total_units: c.total_units.load(Ordering::Relaxed),
            finished_units: c.finished_units.load(Ordering::Relaxed),
            total_chunks: c.total_chunks.load(Ordering::Relaxed),
            total_findings: c.total_findings.load(Ordering::Relaxed),
            verified_findings: c.verified_findings.load(Ordering::Relaxed),
            elapsed_ms: self.inner.started_at.elapsed().as_millis() as u64,
            phases: self.inner.phases.lock().expect("report mutex poisoned").clone(),
            errors: self.inner.errors.lock().expect("report mutex poisoned").clone(),
            done: self.is_done(),
        }
    }
}

/// A serializable, immutable snapshot of a [`JobReport`] at one instant.
#[derive(Debug, Clone, Serialize)]
pub struct JobReportSnapshot {
    /// The job this snapshot belongs to.
    pub job_id: i64,
    /// Total units discovered so far.
    pub total_units: u64,
    /// Units that have finished chunking.
    pub finished_units: u64,
    /// Total chunks emitted so far.
    pub total_chunks: u64,
    /// Total findings produced so far (pre- and post-verification).
    pub total_findings: u64,
    /// Findings confirmed live.
    pub verified_findings: u64,
    /// Milliseconds since the report was started.
    pub elapsed_ms: u64,
    /// Phase timing records.
    pub phases: Vec<PhaseTiming>,
    /// Non-fatal errors recorded during the run.
    pub errors: Vec<ErrorRecord>,
    /// `true` once the job has finished.
    pub done: bool,
}
