// SPDX-License-Identifier: MIT OR Apache-2.0
//! Configuration loading, validation, and merging for the secret-scanning
//! engine.
//!
//! This crate provides [`ScanConfig`] — the top-level runtime settings —
//! together with helpers for loading from TOML files, merging overlays, and
//! producing advisory [`ConfigWarning`]s.
#![deny(unsafe_code)]
#![warn(missing_docs)]

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Errors that can occur during configuration loading or validation.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The requested configuration file was not found.
    #[error("config file not found: {path}")]
    FileNotFound {
        /// Path that was requested.
        path: String,
    },

    /// The file could not be parsed as valid TOML.
    #[error("failed to parse config: {reason}")]
    ParseError {
        /// Human-readable parse error detail.
        reason: String,
    },

    /// Semantic validation failed (one or more problems).
    #[error("config validation failed: {reasons:?}")]
    ValidationError {
        /// Individual validation failure messages.
        reasons: Vec<String>,
    },

    /// Two configs could not be merged because of conflicting constraints.
    #[error("merge conflict: {reason}")]
    MergeConflict {
        /// Description of the conflict.
        reason: String,
    },
}

// ---------------------------------------------------------------------------
// Warnings
// ---------------------------------------------------------------------------

/// Advisory-level issues that do not prevent operation but deserve attention.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigWarning {
    /// A deprecated field was used in the configuration.
    DeprecatedField {
        /// Name of the deprecated field.
        field: String,
        /// Suggested replacement, if any.
        suggestion: Option<String>,
    },
    /// A recommended optional field is missing.
    MissingOptionalField {
        /// Name of the missing field.
        field: String,
        /// Why it matters.
        hint: String,
    },
    /// A detector timeout override is unusually large.
    LargeTimeout {
        /// Detector name the override applies to.
        detector: String,
        /// Timeout value in milliseconds.
        millis: u64,
    },
    /// An account appears in both the allow-list and the deny-list.
    ConflictingAccountFilter {
        /// The account ID.
        account: String,
    },
}

impl std::fmt::Display for ConfigWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigWarning::DeprecatedField { field, suggestion } => {
                write!(f, "deprecated field '{field}'")?;
                if let Some(s) = suggestion {
                    write!(f, " — use '{s}' instead")?;
                }
                Ok(())
            }
            ConfigWarning::MissingOptionalField { field, hint } => {
                write!(f, "missing optional field '{field}': {hint}")
            }
            ConfigWarning::LargeTimeout { detector, millis } => {
                write!(f, "detector '{detector}' has a large timeout override ({millis}ms)")
            }
            ConfigWarning::ConflictingAccountFilter { account } => {
                write!(f, "account '{account}' is both allowed and denied; deny wins")
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Config types
// ---------------------------------------------------------------------------

/// Top-level runtime configuration for a scan job.
#[derive(Debug, Clone, Deserialize, Serialize, JsonSchema, PartialEq, Eq)]
pub struct ScanConfig {
    /// Log level override (e.g. `"debug"`, `"info"`, `"warn"`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log_level: Option<String>,

    /// Number of concurrent pipeline workers. Defaults to available
    /// parallelism when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub worker_count: Option<usize>,

    /// Buffer pool default checkout capacity, in bytes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub buffer_pool_capacity: Option<usize>,

    /// Whether to run live verification against issuing services by
    /// default.
    #[serde(default = "default_verify")]
    pub verify: bool,

    /// Account IDs allowed to be reported as verified; empty means no
    /// restriction. Ignored for an account found in `deny`.
    #[serde(default)]
    pub account_allow: Vec<String>,

    /// Account IDs whose findings are always reported dead regardless of
    /// probe outcome.
    #[serde(default)]
    pub account_deny: Vec<String>,

    /// Account IDs treated as intentional canaries: surfaced as findings
    /// but never run through live verification.
    #[serde(default)]
    pub canary_accounts: Vec<String>,

    /// Detector type IDs to skip entirely during a scan.
    #[serde(default)]
    pub skip_detector_ids: Vec<u32>,

    /// Exact raw credential values to suppress regardless of context
    /// (e.g. a known-fine fixture checked into a test tree).
    #[serde(default)]
    pub skip_ids: Vec<String>,

    /// Per-detector timeout overrides, keyed by detector name, in
    /// milliseconds.
    #[serde(default)]
    pub detector_timeouts_ms: BTreeMap<String, u64>,

    /// Glob patterns restricting which paths/folders are scanned. Empty
    /// means everything is included.
    #[serde(default)]
    pub include_globs: Vec<String>,

    /// Glob patterns excluding paths/folders from scanning.
    #[serde(default)]
    pub exclude_globs: Vec<String>,
}

fn default_verify() -> bool {
    true
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            log_level: Some("info".into()),
            worker_count: None,
            buffer_pool_capacity: None,
            verify: default_verify(),
            account_allow: Vec::new(),
            account_deny: Vec::new(),
            canary_accounts: Vec::new(),
            skip_detector_ids: Vec::new(),
            skip_ids: Vec::new(),
            detector_timeouts_ms: BTreeMap::new(),
            include_globs: Vec::new(),
            exclude_globs: Vec::new(),
        }
    }
}

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Maximum allowed per-detector timeout override, in milliseconds (5 minutes).
const MAX_DETECTOR_TIMEOUT_MS: u64 = 300_000;

/// Threshold above which a detector timeout override generates a warning.
const LARGE_TIMEOUT_THRESHOLD_MS: u64 = 30_000;

/// Recognised log levels.
const VALID_LOG_LEVELS: &[&str] = &["error", "warn", "info", "debug", "trace"];

// ---------------------------------------------------------------------------
// Loading
// ---------------------------------------------------------------------------

/// Load a [`ScanConfig`] from an optional TOML file path.
///
/// * If `path` is `Some`, reads and parses the file.
/// * If `path` is `None`, returns [`ScanConfig::default()`].
///
/// Environment variable overrides are applied on top in both cases.
pub fn load_config(path: Option<&Path>) -> Result<ScanConfig, ConfigError> {
    let mut config = match path {
        Some(p) => {
            let content = std::fs::read_to_string(p).map_err(|_| ConfigError::FileNotFound {
                path: p.display().to_string(),
            })?;
            parse_toml(&content)?
        }
        None => ScanConfig::default(),
    };
    apply_env_overrides(&mut config);
    Ok(config)
}

/// Parse a TOML string into a [`ScanConfig`].
pub fn parse_toml(content: &str) -> Result<ScanConfig, ConfigError> {
    toml::from_str::<ScanConfig>(content).map_err(|e| ConfigError::ParseError {
        reason: e.to_string(),
    })
}

// ---------------------------------------------------------------------------
// Env overrides
// ---------------------------------------------------------------------------

/// Apply environment variable overrides.
///
/// Recognised variables:
/// - `CW_LOG_LEVEL`
/// - `CW_WORKER_COUNT`
/// - `CW_VERIFY` (`"true"`/`"false"`)
pub fn apply_env_overrides(config: &mut ScanConfig) {
    if let Ok(val) = std::env::var("CW_LOG_LEVEL") {
        config.log_level = Some(val);
    }
    if let Ok(val) = std::env::var("CW_WORKER_COUNT") {
        if let Ok(n) = val.parse::<usize>() {
            config.worker_count = Some(n);
        }
    }
    if let Ok(val) = std::env::var("CW_VERIFY") {
        if let Ok(b) = val.parse::<bool>() {
            config.verify = b;
        }
    }
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

/// Validate a parsed configuration, returning advisory warnings.
///
/// Hard errors (zero worker count, out-of-range detector timeouts) are
/// returned as a [`ConfigError::ValidationError`]; soft issues come back
/// as warnings.
pub fn validate_config(config: &ScanConfig) -> Result<Vec<ConfigWarning>, ConfigError> {
    let mut errors: Vec<String> = Vec::new();
    let mut warnings: Vec<ConfigWarning> = Vec::new();

    if let Some(ref level) = config.log_level
        && !VALID_LOG_LEVELS.contains(&level.as_str())
    {
        errors.push(format!("invalid log_level '{level}'"));
    }

    if let Some(0) = config.worker_count {
        errors.push("worker_count must be greater than zero".into());
    }

    if let Some(0) = config.buffer_pool_capacity {
        errors.push("buffer_pool_capacity must be greater than zero".into());
    }

    for (detector, millis) in &config.detector_timeouts_ms {
        if *millis == 0 || *millis > MAX_DETECTOR_TIMEOUT_MS {
            errors.push(format!(
                "detector '{detector}': timeout {millis}ms out of range (1..{MAX_DETECTOR_TIMEOUT_MS})"
            ));
        } else if *millis > LARGE_TIMEOUT_THRESHOLD_MS {
            warnings.push(ConfigWarning::LargeTimeout {
                detector: detector.clone(),
                millis: *millis,
            });
        }
    }

    for account in &config.account_allow {
        if config.account_deny.contains(account) {
            warnings.push(ConfigWarning::ConflictingAccountFilter {
                account: account.clone(),
            });
        }
    }

    if config.worker_count.is_none() {
        warnings.push(ConfigWarning::MissingOptionalField {
            field: "worker_count".into(),
            hint: "defaulting to available parallelism".into(),
        });
    }

    if errors.is_empty() {
        Ok(warnings)
    } else {
        Err(ConfigError::ValidationError { reasons: errors })
    }
}

// ---------------------------------------------------------------------------
// Merging
// ---------------------------------------------------------------------------

/// Merge two configurations. Values in `overlay` take precedence over
/// `base`.
///
/// List and map fields are combined; on detector-timeout name collisions
/// the overlay entry wins.
pub fn merge_configs(base: ScanConfig, overlay: ScanConfig) -> ScanConfig {
    let mut detector_timeouts_ms = base.detector_timeouts_ms;
    detector_timeouts_ms.extend(overlay.detector_timeouts_ms);

    let mut account_allow = base.account_allow;
    account_allow.extend(overlay.account_allow);
    account_allow.sort();
    account_allow.dedup();

    let mut account_deny = base.account_deny;
    account_deny.extend(overlay.account_deny);
    account_deny.sort();
    account_deny.dedup();

    let mut canary_accounts = base.canary_accounts;
    canary_accounts.extend(overlay.canary_accounts);
    canary_accounts.sort();
    canary_accounts.dedup();

    let mut skip_detector_ids = base.skip_detector_ids;
    skip_detector_ids.extend(overlay.skip_detector_ids);
    skip_detector_ids.sort_unstable();
    skip_detector_ids.dedup();

    let skip_ids = extend_unique(base.skip_ids, overlay.skip_ids);

    ScanConfig {
        log_level: overlay.log_level.or(base.log_level),
        worker_count: overlay.worker_count.or(base.worker_count),
        buffer_pool_capacity: overlay.buffer_pool_capacity.or(base.buffer_pool_capacity),
        verify: overlay.verify,
        account_allow,
        account_deny,
        canary_accounts,
        skip_detector_ids,
        skip_ids,
        detector_timeouts_ms,
        include_globs: extend_unique(base.include_globs, overlay.include_globs),
        exclude_globs: extend_unique(base.exclude_globs, overlay.exclude_globs),
    }
}

fn extend_unique(mut base: Vec<String>, overlay: Vec<String>) -> Vec<String> {
    base.extend(overlay);
    base.sort();
    base.dedup();
    base
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
#[allow(clippy::field_reassign_with_default)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn default_config_is_valid() {
        let cfg = ScanConfig::default();
        let warnings = validate_config(&cfg).expect("default config should be valid");
        assert!(!warnings.is_empty(), "should have advisory warnings");
    }

    #[test]
    fn default_config_has_sensible_defaults() {
        let cfg = ScanConfig::default();
        assert_eq!(cfg.log_level.as_deref(), Some("info"));
        assert!(cfg.verify);
        assert!(cfg.skip_detector_ids.is_empty());
    }

    #[test]
    fn parse_valid_toml_string() {
        let toml = r#"
            log_level = "debug"
            worker_count = 4
            account_deny = ["123456789012"]
        "#;
        let cfg = parse_toml(toml).unwrap();
        assert_eq!(cfg.log_level.as_deref(), Some("debug"));
        assert_eq!(cfg.worker_count, Some(4));
        assert_eq!(cfg.account_deny, vec!["123456789012".to_string()]);
    }

    #[test]
    fn parse_invalid_toml_gives_parse_error() {
        let bad = "this is [not valid toml =";
        let err = parse_toml(bad).unwrap_err();
        assert!(matches!(err, ConfigError::ParseError { .. }));
    }

    #[test]
    fn parse_wrong_types_gives_parse_error() {
        let toml = r#"worker_count = "many""#;
        let err = parse_toml(toml).unwrap_err();
        assert!(matches!(err, ConfigError::ParseError { .. }));
    }

    #[test]
    fn validation_catches_invalid_log_level() {
        let cfg = ScanConfig {
            log_level: Some("verbose".into()),
            ..Default::default()
        };
        let err = validate_config(&cfg).unwrap_err();
        assert!(matches!(err, ConfigError::ValidationError { .. }));
    }

    #[test]
    fn validation_catches_zero_worker_count() {
        let cfg = ScanConfig {
            worker_count: Some(0),
            ..Default::default()
        };
        let err = validate_config(&cfg).unwrap_err();
        assert!(matches!(err, ConfigError::ValidationError { .. }));
    }

    #[test]
    fn validation_catches_out_of_range_detector_timeout() {
        let mut cfg = ScanConfig::default();
        cfg.detector_timeouts_ms.insert("aws".into(), 0);
        let err = validate_config(&cfg).unwrap_err();
        match err {
            ConfigError::ValidationError { reasons } => {
                assert!(reasons.iter().any(|r| r.contains("out of range")));
            }
            other => panic!("expected ValidationError, got {other:?}"),
        }
    }

    #[test]
    fn large_detector_timeout_produces_warning() {
        let mut cfg = ScanConfig::default();
        cfg.worker_count = Some(4);
        cfg.detector_timeouts_ms.insert("aws".into(), 60_000);
        let warnings = validate_config(&cfg).unwrap();
        assert!(warnings.iter().any(|w| matches!(w, ConfigWarning::LargeTimeout { .. })));
    }

    #[test]
    fn conflicting_account_filter_produces_warning() {
        let mut cfg = ScanConfig::default();
        cfg.worker_count = Some(4);
        cfg.account_allow.push("111111111111".into());
        cfg.account_deny.push("111111111111".into());
        let warnings = validate_config(&cfg).unwrap();
        assert!(warnings.iter().any(|w| matches!(w, ConfigWarning::ConflictingAccountFilter { .. })));
    }

    #[test]
    fn merge_overlay_overrides_base() {
        let base = ScanConfig {
            log_level: Some("info".into()),
            verify: true,
            ..Default::default()
        };
        let overlay = ScanConfig {
            log_level: Some("debug".into()),
            verify: false,
            ..Default::default()
        };
        let merged = merge_configs(base, overlay);
        assert_eq!(merged.log_level.as_deref(), Some("debug"));
        assert!(!merged.verify);
    }

    #[test]
    fn merge_combines_account_lists_without_duplicates() {
        let base = ScanConfig {
            account_deny: vec!["a".into(), "b".into()],
            ..Default::default()
        };
        let overlay = ScanConfig {
            account_deny: vec!["b".into(), "c".into()],
            ..Default::default()
        };
        let merged = merge_configs(base, overlay);
        assert_eq!(merged.account_deny, vec!["a".to_string(), "b".to_string(), "c".to_string()]);
    }

    #[test]
    fn merge_detector_timeout_overlay_wins_on_collision() {
        let mut base = ScanConfig::default();
        base.detector_timeouts_ms.insert("aws".into(), 1_000);
        let mut overlay = ScanConfig::default();
        overlay.detector_timeouts_ms.insert("aws".into(), 2_000);
        let merged = merge_configs(base, overlay);
        assert_eq!(merged.detector_timeouts_ms["aws"], 2_000);
    }

    #[test]
    fn toml_roundtrip() {
        let mut cfg = ScanConfig {
            log_level: Some("debug".into()),
            worker_count: Some(2),
            ..Default::default()
        };
        cfg.skip_detector_ids.push(7);
        let serialized = toml::to_string(&cfg).unwrap();
        let deserialized: ScanConfig = toml::from_str(&serialized).unwrap();
        assert_eq!(cfg, deserialized);
    }

    #[test]
    fn load_config_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("credsweep.toml");
        let mut f = std::fs::File::create(&path).unwrap();
        writeln!(f, "log_level = \"warn\"\nworker_count = 8").unwrap();
        let cfg = load_config(Some(&path)).unwrap();
        assert_eq!(cfg.log_level.as_deref(), Some("warn"));
        assert_eq!(cfg.worker_count, Some(8));
    }

    #[test]
    fn load_missing_file_gives_file_not_found() {
        let err = load_config(Some(Path::new("/nonexistent/credsweep.toml"))).unwrap_err();
        assert!(matches!(err, ConfigError::FileNotFound { .. }));
    }

    #[test]
    fn load_none_returns_default() {
        let cfg = load_config(None).unwrap();
        assert_eq!(cfg.log_level.as_deref(), Some("info"));
    }

    #[test]
    fn config_error_display() {
        let e = ConfigError::FileNotFound { path: "/foo".into() };
        assert!(e.to_string().contains("/foo"));

        let e = ConfigError::ParseError { reason: "bad toml".into() };
        assert!(e.to_string().contains("bad toml"));

        let e = ConfigError::MergeConflict { reason: "oops".into() };
        assert!(e.to_string().contains("oops"));
    }

    #[test]
    fn config_warning_display() {
        let w = ConfigWarning::DeprecatedField {
            field: "old_field".into(),
            suggestion: Some("new_field".into()),
        };
        let s = w.to_string();
        assert!(s.contains("old_field"));
        assert!(s.contains("new_field"));

        let w = ConfigWarning::LargeTimeout {
            detector: "aws".into(),
            millis: 60_000,
        };
        assert!(w.to_string().contains("aws"));
    }
}
