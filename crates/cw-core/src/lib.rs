// SPDX-License-Identifier: MIT OR Apache-2.0
#![doc = include_str!("../README.md")]
#![deny(unsafe_code)]
#![warn(missing_docs)]

//! Stable contract types shared by every crate in the workspace.
//!
//! This crate intentionally contains no pipeline logic, no network
//! code, and no detector implementations — only the data model and
//! trait contracts that let those pieces be built and tested
//! independently of one another.

mod chunk;
mod context;
mod detector;
mod result;
mod source;
mod unit;

pub use chunk::{ApiLocationType, Chunk, MetaData, SourceType, SourceUnit, SourceUnitId};
pub use context::ScanContext;
pub use detector::{
    shannon_entropy, CustomFalsePositiveChecker, CustomResultsCleaner, Detector, DetectorType,
    MultiPartCredentialProvider,
};
pub use result::{AnalysisInfo, Finding, RawFinding, VerificationStatus};
pub use source::{Source, SourceResult};
pub use unit::{ChunkReporter, NullReporter, UnitReporter};

/// Version of the in-process contract covered by this crate. Bumped
/// whenever a breaking change is made to [`Chunk`], [`Finding`], or any
/// of the trait contracts above, so callers can assert compatibility
/// across crate boundaries at build time rather than discovering a
/// mismatch at runtime.
///
/// ```
/// assert_eq!(cw_core::CONTRACT_VERSION, 1);
/// ```
pub const CONTRACT_VERSION: u32 = 1;
