// SPDX-License-Identifier: MIT OR Apache-2.0
#![deny(unsafe_code)]

//! The `credsweep` binary: CLI argument parsing and top-level wiring.
//! Everything reusable lives in the library crates; this file only
//! assembles them for one command-line invocation.

mod sources;

use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::EnvFilter;

use cw_config::ScanConfig;
use cw_core::{Chunk, Detector, Finding, ScanContext, Source};
use cw_detectors::{merge_unit_findings, resolve, AwsDetector, Registry, AWS_DETECTOR_TYPE};
use cw_glob::PathFilter;
use cw_pipeline::{ChunkHandler, FindingSink, Pipeline};
use cw_postman::PostmanSource;
use cw_ratelimit::{ApiRateLimiter, BackoffOn429, RateLimitPolicy, TokenBucket};
use cw_report::{JobReport, JobReportSnapshot};
use cw_verify::{AccountFilter, AwsVerifier, Verifier, VerifierHarness};

use sources::{FilesystemSource, StdinSource};

/// At least one finding survived resolution.
const EXIT_FINDINGS_PRESENT: i32 = 1;
/// Configuration, source, or I/O error — not a scan outcome.
const EXIT_RUNTIME_ERROR: i32 = 2;

#[derive(Parser, Debug)]
#[command(name = "credsweep", version, about = "Secret-scanning engine")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable debug logging.
    #[arg(long, global = true)]
    debug: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Scan a source for credentials.
    Scan {
        /// Which kind of source to read from.
        #[arg(long, value_enum, default_value_t = SourceArg::Filesystem)]
        source: SourceArg,

        /// Root directory for a filesystem scan.
        #[arg(long, default_value = ".")]
        root: PathBuf,

        /// Path to a Postman-style workspace export (JSON), required
        /// when `--source postman` is given.
        #[arg(long)]
        postman_export: Option<PathBuf>,

        /// Path to a TOML config file layered under the CLI flags.
        #[arg(long)]
        config: Option<PathBuf>,

        /// Force live verification on, overriding config.
        #[arg(long, conflicts_with = "no_verify")]
        verify: bool,

        /// Force live verification off, overriding config.
        #[arg(long)]
        no_verify: bool,

        /// Account ID allowed to be verified against. Repeatable; if
        /// any are given, only these accounts are verified.
        #[arg(long = "allow-account")]
        allow_account: Vec<String>,

        /// Account ID that must never be verified against. Repeatable.
        #[arg(long = "deny-account")]
        deny_account: Vec<String>,

        /// Account ID that should always resolve as dead (honeypot).
        /// Repeatable.
        #[arg(long = "canary-account")]
        canary_account: Vec<String>,

        /// Glob of paths to include. Repeatable; everything is
        /// included when none are given.
        #[arg(long = "include")]
        include: Vec<String>,

        /// Glob of paths to exclude. Repeatable.
        #[arg(long = "exclude")]
        exclude: Vec<String>,

        /// Print a JSON summary instead of plain text.
        #[arg(long)]
        json: bool,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum SourceArg {
    /// Walk a local directory tree.
    Filesystem,
    /// Read a single payload from stdin.
    Stdin,
    /// Read a Postman-style workspace export.
    Postman,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let filter = if cli.debug {
        EnvFilter::new("credsweep=debug,cw_pipeline=debug,cw_verify=debug")
    } else {
        EnvFilter::new("credsweep=info,cw_pipeline=info,cw_verify=info")
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let exit_code = match cli.command {
        Commands::Scan {
            source,
            root,
            postman_export,
            config,
            verify,
            no_verify,
            allow_account,
            deny_account,
            canary_account,
            include,
            exclude,
            json,
        } => {
            let args = ScanArgs {
                source,
                root,
                postman_export,
                config,
                verify,
                no_verify,
                allow_account,
                deny_account,
                canary_account,
                include,
                exclude,
                json,
            };
            match cmd_scan(args).await {
                Ok(code) => code,
                Err(e) => {
                    eprintln!("error: {e:#}");
                    EXIT_RUNTIME_ERROR
                }
            }
        }
    };

    std::process::exit(exit_code);
}

struct ScanArgs {
    source: SourceArg,
    root: PathBuf,
    postman_export: Option<PathBuf>,
    config: Option<PathBuf>,
    verify: bool,
    no_verify: bool,
    allow_account: Vec<String>,
    deny_account: Vec<String>,
    canary_account: Vec<String>,
    include: Vec<String>,
    exclude: Vec<String>,
    json: bool,
}

async fn cmd_scan(args: ScanArgs) -> anyhow::Result<i32> {
    let config = load_effective_config(&args)?;

    let job_id: i64 = 1;
    let source_id: i64 = 1;
    let ctx = ScanContext::new(job_id, source_id);
    let report = JobReport::start(job_id);

    let path_filter = PathFilter::build(&config.include_globs, &config.exclude_globs)?;

    let mut detectors: Vec<Arc<dyn Detector>> = Vec::new();
    if !config.skip_detector_ids.contains(&AWS_DETECTOR_TYPE.0) {
        detectors.push(Arc::new(AwsDetector));
    }
    let registry = Arc::new(Registry::new(detectors));

    let verifier = AwsVerifier::new();
    let host = verifier.host().to_string();
    let limiter = ApiRateLimiter::new(
        host,
        vec![
            Box::new(TokenBucket::new(Duration::from_millis(200))) as Box<dyn RateLimitPolicy>,
            Box::new(BackoffOn429::new(Duration::from_secs(60))),
        ],
    );
    let account_filter = AccountFilter::new(
        to_account_set(&config.account_allow),
        config.account_deny.iter().cloned().collect::<HashSet<_>>(),
        config.canary_accounts.iter().cloned().collect::<HashSet<_>>(),
    );
    let harness = VerifierHarness::new(verifier, limiter, account_filter);

    let mut source: Box<dyn Source> = match args.source {
        SourceArg::Filesystem => Box::new(FilesystemSource::new(
            args.root.clone(),
            path_filter,
            source_id,
            job_id,
            report.clone(),
        )),
        SourceArg::Stdin => Box::new(StdinSource::new(source_id, job_id)),
        SourceArg::Postman => {
            let path = args
                .postman_export
                .as_ref()
                .ok_or_else(|| anyhow::anyhow!("--postman-export is required with --source postman"))?;
            let json = std::fs::read_to_string(path)?;
            Box::new(PostmanSource::from_json(
                &json,
                source_id,
                job_id,
                path_filter,
                registry.detector_keywords(),
            )?)
        }
    };
    source.init(&ctx).await?;

    let pipeline = match config.worker_count {
        Some(n) => Pipeline::new(n, cw_pipeline::DEFAULT_CHANNEL_CAPACITY),
        None => Pipeline::default(),
    };

    let findings: Arc<Mutex<Vec<Finding>>> = Arc::new(Mutex::new(Vec::new()));

    let handler_registry = Arc::clone(&registry);
    let handler_report = report.clone();
    let handler_harness = Arc::new(harness);
    let verify_enabled = config.verify;
    let handler: ChunkHandler = Arc::new(move |chunk: Chunk, chunk_ctx: ScanContext| {
        let registry = Arc::clone(&handler_registry);
        let report = handler_report.clone();
        let harness = Arc::clone(&handler_harness);
        Box::pin(async move {
            report.report_chunk();
            let mut findings: Vec<Finding> = registry
                .scan(&chunk)
                .into_iter()
                .flat_map(|(detector, raw)| resolve(&detector, raw, &chunk))
                .collect();

            if verify_enabled {
                for finding in &mut findings {
                    if finding.detector_type != AWS_DETECTOR_TYPE {
                        continue;
                    }
                    let Some(raw_v2) = finding.raw_v2.clone() else {
                        continue;
                    };
                    let (status, extra) = harness
                        .verify(&chunk_ctx, finding.raw.as_bytes(), Some(raw_v2.as_bytes()))
                        .await;
                    finding.analysis.is_canary = extra.contains_key("is_canary");
                    finding.extra_data.extend(extra);
                    finding.verification = status;
                }
            }

            findings
        })
    });

    let sink_findings = Arc::clone(&findings);
    let sink: FindingSink = Arc::new(move |finding: Finding| {
        sink_findings.lock().expect("findings mutex poisoned").push(finding);
    });

    report.start_phase("chunk");
    let produce_ctx = ctx.clone();
    let pipeline_result = pipeline
        .run(ctx.clone(), handler, sink, move |tx| async move {
            source.chunks(&produce_ctx, tx).await
        })
        .await;
    report.end_phase("chunk");
    if let Err(err) = &pipeline_result {
        report.report_error(None, err);
    }
    pipeline_result?;

    let mut all_findings = Arc::try_unwrap(findings)
        .map_err(|_| anyhow::anyhow!("findings still shared after pipeline completion"))?
        .into_inner()
        .expect("findings mutex poisoned");

    if !config.skip_ids.is_empty() {
        all_findings.retain(|f| !config.skip_ids.iter().any(|id| id == &f.raw));
    }

    for finding in &all_findings {
        report.report_finding(finding.verification.is_verified());
    }

    // A false-positive-suppressed candidate is only worth reporting if
    // verification overrode the heuristic and confirmed it live.
    all_findings.retain(|f| !f.analysis.is_false_positive || f.verification.is_verified());

    let all_findings = merge_unit_findings(all_findings);
    report.finish();

    print_summary(&report.snapshot(), &all_findings, args.json);

    Ok(if all_findings.is_empty() {
        0
    } else {
        EXIT_FINDINGS_PRESENT
    })
}

fn load_effective_config(args: &ScanArgs) -> anyhow::Result<ScanConfig> {
    let mut config = cw_config::load_config(args.config.as_deref())?;
    cw_config::apply_env_overrides(&mut config);

    let mut overlay = ScanConfig {
        verify: config.verify,
        ..ScanConfig::default()
    };
    if args.verify {
        overlay.verify = true;
    }
    if args.no_verify {
        overlay.verify = false;
    }
    overlay.account_allow = args.allow_account.clone();
    overlay.account_deny = args.deny_account.clone();
    overlay.canary_accounts = args.canary_account.clone();
    overlay.include_globs = args.include.clone();
    overlay.exclude_globs = args.exclude.clone();

    let config = cw_config::merge_configs(config, overlay);
    for warning in cw_config::validate_config(&config)? {
        tracing::warn!("{warning}");
    }
    Ok(config)
}

fn to_account_set(accounts: &[String]) -> Option<HashSet<String>> {
    if accounts.is_empty() {
        None
    } else {
        Some(accounts.iter().cloned().collect())
    }
}

#[derive(serde::Serialize)]
struct ScanOutput<'a> {
    summary: JobReportSnapshot,
    findings: &'a [Finding],
}

fn print_summary(snapshot: &JobReportSnapshot, findings: &[Finding], json: bool) {
    if json {
        let output = ScanOutput {
            summary: snapshot.clone(),
            findings,
        };
        match serde_json::to_string_pretty(&output) {
            Ok(s) => println!("{s}"),
            Err(e) => eprintln!("error: failed to serialize scan output: {e}"),
        }
        return;
    }

    println!(
        "scanned {} chunk(s) across {} unit(s), {} finding(s) ({} verified) in {}ms",
        snapshot.total_chunks,
        snapshot.total_units,
        snapshot.total_findings,
        snapshot.verified_findings,
        snapshot.elapsed_ms
    );
    for finding in findings {
        println!(
            "[{}] {} ({:?}) in {}",
            finding.detector_type, finding.redacted, finding.verification, finding.source_name
        );
    }
    for error in &snapshot.errors {
        println!("error: {} {}", error.code, error.message);
    }
}
