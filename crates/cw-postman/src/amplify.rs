// SPDX-License-Identifier: MIT OR Apache-2.0
//! Keyword-prefix synthesis ("amplification") for substituted values.
//!
//! Once a variable is expanded in place, the resulting chunk text may
//! contain the secret itself with no nearby keyword at all — the
//! keyword lived on the variable's *name*, which the expansion discards.
//! Amplification re-attaches it: the variable name is prepended as a
//! keyword, padded with enough whitespace that a detector's regex,
//! which typically looks for a keyword within a bounded window, still
//! finds the value.

/// Minimum padding, in spaces, inserted between a synthesized keyword
/// prefix and the value it's amplifying. Chosen to sit comfortably
/// outside most detectors' keyword-proximity windows, so amplification
/// doesn't itself trigger a keyword-adjacency false positive.
pub const MIN_PADDING: usize = 50;

/// Build an amplified probe string: `"{keyword}" + padding + value`.
#[must_use]
pub fn amplify(keyword: &str, value: &str) -> String {
    let mut out = String::with_capacity(keyword.len() + MIN_PADDING + value.len());
    out.push_str(keyword);
    out.push_str(&" ".repeat(MIN_PADDING));
    out.push_str(value);
    out
}

/// Build one amplified probe string per variable name associated with
/// `value`, used when a value was substituted from more than one
/// differently-named variable across scopes.
#[must_use]
pub fn amplify_all<'a>(keywords: impl IntoIterator<Item = &'a str>, value: &str) -> Vec<String> {
    keywords.into_iter().map(|k| amplify(k, value)).collect()
}
