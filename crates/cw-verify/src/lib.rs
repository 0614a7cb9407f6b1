// SPDX-License-Identifier: MIT OR Apache-2.0
#![doc = include_str!("../README.md")]
#![deny(unsafe_code)]
#![warn(missing_docs)]

//! Network verification: account filtering, canary routing, rate
//! limiting, and retry, composed around a per-detector probe.

mod aws_account;
mod aws_verifier;
mod harness;

pub use aws_verifier::AwsVerifier;
pub use harness::{AccountFilter, ProbeOutcome, Verifier, VerifierHarness};
