// SPDX-License-Identifier: MIT OR Apache-2.0
#![doc = include_str!("../README.md")]
#![deny(unsafe_code)]
#![warn(missing_docs)]

//! Detector registry, resolver, and the reference AWS detector.

mod aws;
mod clean;
mod registry;
mod resolve;

pub use aws::{derive_account_id, AwsDetector, AWS_DETECTOR_TYPE};
pub use clean::looks_like_hash;
pub use registry::Registry;
pub use resolve::{merge_unit_findings, resolve};
