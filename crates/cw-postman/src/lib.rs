// SPDX-License-Identifier: MIT OR Apache-2.0
#![doc = include_str!("../README.md")]
#![deny(unsafe_code)]
#![warn(missing_docs)]

//! Substitution-aware Postman workspace adapter.

mod amplify;
mod auth;
mod keywords;
mod model;
mod substitution;
mod walk;
mod workspace;

pub use amplify::{amplify, amplify_all, MIN_PADDING};
pub use auth::{normalize, AuthBlock};
pub use keywords::KeywordAccumulator;
pub use model::{Collection, Item, Request, Variable, Workspace};
pub use substitution::{Scope, SubstitutionStore, DEFAULT_MAX_DEPTH};
pub use walk::{walk_workspace, ExtractedText};
pub use workspace::PostmanSource;
