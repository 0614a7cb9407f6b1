// SPDX-License-Identifier: MIT OR Apache-2.0
#![doc = include_str!("../README.md")]
#![deny(unsafe_code)]
#![warn(missing_docs)]

//! Compiled include/exclude glob sets.

use globset::{Glob, GlobSet, GlobSetBuilder};

/// A compiled include/exclude filter. A path matches the filter if it
/// matches at least one include pattern (or there are no include
/// patterns at all) and matches no exclude pattern.
pub struct PathFilter {
    include: Option<GlobSet>,
    exclude: GlobSet,
}

impl PathFilter {
    /// Compile a filter from raw glob pattern strings.
    pub fn build<I, E>(includes: I, excludes: E) -> anyhow::Result<Self>
    where
        I: IntoIterator,
        I::Item: AsRef<str>,
        E: IntoIterator,
        E::Item: AsRef<str>,
    {
        let include = build_set(includes)?;
        let include = if include.is_empty() { None } else { Some(include) };
        let exclude = build_set(excludes)?;
        Ok(Self { include, exclude })
    }

    /// `true` if `path` should be scanned.
    #[must_use]
    pub fn is_included(&self, path: &str) -> bool {
        if self.exclude.is_match(path) {
            return false;
        }
        match &self.include {
            Some(include) => include.is_match(path),
            None => true,
        }
    }
}

fn build_set<I>(patterns: I) -> anyhow::Result<GlobSet>
where
    I: IntoIterator,
    I::Item: AsRef<str>,
{
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        builder.add(Glob::new(pattern.as_ref())?);
    }
    Ok(builder.build()?)
}
