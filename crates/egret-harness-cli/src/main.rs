//! EGRET Harness - batch test-string generation for regular expressions
//!
//! The `egret-harness` command runs a pattern corpus (or one ad hoc pattern)
//! through an external generation engine, re-validates every generated
//! string locally and writes the records as sharded JSON.
//!
//! ```text
//! egret-harness --engine ./egret-engine -f corpus.json -o data/output
//! egret-harness --engine ./egret-engine -r '^(a|aa)+$' -g
//! ```

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::Parser;
use tracing::{info, Level};

use egret_harness_core::{
    init_tracing, load_patterns, write_shards, write_summary, BatchOrchestrator, BatchSummary,
    CommandEngine, EngineFlags, GroupMode, HarnessConfig, PatternEntry, PatternRecord,
    RegexMatcher, DEFAULT_SHARD_PREFIX, SUMMARY_FILE_NAME,
};

#[derive(Parser, Debug)]
#[command(name = "egret-harness")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Generate and validate test strings for a corpus of regular expressions", long_about = None)]
struct Cli {
    /// JSON file of `{"pattern": ...}` / `{"patterns": [...]}` objects
    #[arg(short, long)]
    file: Option<PathBuf>,

    /// A single regular expression
    #[arg(short, long)]
    regex: Option<String>,

    /// Base substring for generated strings
    #[arg(short, long, env = "EGRET_BASE_SUBSTRING", default_value = "evil")]
    base_substring: String,

    /// Directory receiving shard files and summary.json
    #[arg(short, long, env = "EGRET_OUTPUT_DIR", default_value = "data/output")]
    output_dir: PathBuf,

    /// Shard file stem: shards are written as `<prefix>_<i>.json`
    #[arg(long, env = "EGRET_SHARD_PREFIX", default_value = DEFAULT_SHARD_PREFIX)]
    shard_prefix: String,

    /// Number of shard files
    #[arg(long, env = "EGRET_SHARDS", default_value_t = 10)]
    shards: usize,

    /// Generation engine program
    #[arg(long, env = "EGRET_ENGINE")]
    engine: PathBuf,

    /// Extra leading argument for the engine program (repeatable)
    #[arg(long = "engine-arg", allow_hyphen_values = true)]
    engine_args: Vec<String>,

    /// Deadline for compiling and generating one pattern (milliseconds)
    #[arg(long, env = "EGRET_GENERATION_TIMEOUT_MS", default_value_t = 10_000)]
    generation_timeout_ms: u64,

    /// Deadline for matching one generated string (milliseconds)
    #[arg(long, env = "EGRET_VALIDATION_TIMEOUT_MS", default_value_t = 10_000)]
    validation_timeout_ms: u64,

    /// Patterns processed concurrently
    #[arg(long, env = "EGRET_JOBS", default_value_t = 1)]
    jobs: usize,

    /// Forward --debug to the engine and log at debug level
    #[arg(short, long)]
    debug: bool,

    /// Forward --stat to the engine
    #[arg(short, long)]
    stat: bool,

    /// Report capture groups of fully matching strings
    #[arg(short, long)]
    groups: bool,

    /// Report named capture groups only
    #[arg(short = 'n', long)]
    named_groups: bool,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Emit JSON-formatted log lines
    #[arg(long)]
    json: bool,
}

impl Cli {
    fn group_mode(&self) -> GroupMode {
        if self.named_groups {
            GroupMode::NamedOnly
        } else if self.groups {
            GroupMode::All
        } else {
            GroupMode::Off
        }
    }

    fn harness_config(&self) -> HarnessConfig {
        HarnessConfig {
            generation_timeout_ms: self.generation_timeout_ms,
            validation_timeout_ms: self.validation_timeout_ms,
            base_substring: self.base_substring.clone(),
            shard_count: self.shards,
            jobs: self.jobs,
            groups: self.group_mode(),
            engine_flags: EngineFlags {
                debug: self.debug,
                stat: self.stat,
            },
            ..HarnessConfig::default()
        }
    }

    fn log_level(&self) -> Level {
        if self.debug || self.verbose {
            Level::DEBUG
        } else {
            Level::INFO
        }
    }
}

/// Exit code when both `--file` and `--regex` are given.
const CONFLICTING_INPUTS_EXIT: i32 = -1;

/// The exit code for an invocation naming both input kinds, if it does.
fn input_conflict_exit_code(cli: &Cli) -> Option<i32> {
    (cli.file.is_some() && cli.regex.is_some()).then_some(CONFLICTING_INPUTS_EXIT)
}

/// Entries to process plus the input digest, when they came from a file.
fn load_entries(cli: &Cli) -> Result<(Vec<PatternEntry>, Option<String>)> {
    match (&cli.file, &cli.regex) {
        (Some(path), None) => {
            let loaded =
                load_patterns(path).with_context(|| format!("load {}", path.display()))?;
            Ok((loaded.entries, Some(loaded.digest)))
        }
        (None, Some(regex)) => Ok((vec![PatternEntry::from(regex.as_str())], None)),
        (None, None) => bail!("one of --file or --regex is required"),
        (Some(_), Some(_)) => bail!("cannot specify both a regular expression and input file"),
    }
}

fn write_outputs(
    cli: &Cli,
    dir: &Path,
    summary: &BatchSummary,
    records: &[PatternRecord],
) -> Result<()> {
    let paths = write_shards(dir, &cli.shard_prefix, records, cli.shards)?;
    write_summary(&dir.join(SUMMARY_FILE_NAME), summary)?;
    info!(shards = paths.len(), dir = %dir.display(), "output written");
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    if let Some(code) = input_conflict_exit_code(&cli) {
        eprintln!("Cannot specify both a regular expression and input file");
        std::process::exit(code);
    }

    init_tracing(cli.json, cli.log_level());

    let (entries, digest) = load_entries(&cli)?;
    let config = cli.harness_config();

    let engine = CommandEngine::new(&cli.engine).with_args(cli.engine_args.clone());
    let orchestrator =
        BatchOrchestrator::new(Arc::new(engine), Arc::new(RegexMatcher::new()), &config)
            .context("invalid harness configuration")?;

    let report = orchestrator.run(entries).await;
    let summary = match digest {
        Some(digest) => report.summary.with_input_digest(digest),
        None => report.summary,
    };

    write_outputs(&cli, &cli.output_dir, &summary, &report.records)?;

    println!(
        "{} record(s), {} failed, {} truncated, {} rejected ({} ms)",
        summary.records,
        summary.failed(),
        summary.truncated,
        summary.rejected,
        summary.duration_ms
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Cli {
        let mut argv = vec!["egret-harness", "--engine", "egret-engine"];
        argv.extend_from_slice(args);
        Cli::try_parse_from(argv).expect("parse")
    }

    #[test]
    fn test_defaults_match_harness_config() {
        let cli = parse(&["-r", "a+"]);
        let config = cli.harness_config();
        assert_eq!(config, HarnessConfig::default());
        assert_eq!(cli.output_dir, PathBuf::from("data/output"));
        assert_eq!(cli.shard_prefix, "output");
        assert_eq!(cli.log_level(), Level::INFO);
    }

    #[test]
    fn test_flags_map_onto_config() {
        let cli = parse(&[
            "-r",
            "a+",
            "-b",
            "xyz",
            "-d",
            "-s",
            "-g",
            "--jobs",
            "4",
            "--shards",
            "3",
            "--generation-timeout-ms",
            "250",
        ]);
        let config = cli.harness_config();
        assert_eq!(config.base_substring, "xyz");
        assert!(config.engine_flags.debug && config.engine_flags.stat);
        assert_eq!(config.groups, GroupMode::All);
        assert_eq!(config.jobs, 4);
        assert_eq!(config.shard_count, 3);
        assert_eq!(config.generation_timeout_ms, 250);
        assert_eq!(cli.log_level(), Level::DEBUG);
    }

    #[test]
    fn test_named_groups_wins_over_groups() {
        let cli = parse(&["-r", "a", "-g", "-n"]);
        assert_eq!(cli.group_mode(), GroupMode::NamedOnly);
    }

    #[test]
    fn test_engine_args_are_repeatable() {
        let cli = parse(&["-r", "a", "--engine-arg", "-m", "--engine-arg", "egret"]);
        assert_eq!(cli.engine_args, vec!["-m", "egret"]);
    }

    #[test]
    fn test_load_entries_from_regex() {
        let cli = parse(&["-r", "^a+$"]);
        let (entries, digest) = load_entries(&cli).unwrap();
        assert_eq!(entries, vec![PatternEntry::from("^a+$")]);
        assert!(digest.is_none());
    }

    #[test]
    fn test_load_entries_from_file_has_digest() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("corpus.json");
        std::fs::write(&path, r#"[{"pattern": "a"}, {"pattern": "b"}]"#).unwrap();

        let cli = parse(&["-f", path.to_str().unwrap()]);
        let (entries, digest) = load_entries(&cli).unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(digest.map(|d| d.len()), Some(64));
    }

    #[test]
    fn test_load_entries_requires_an_input() {
        let cli = parse(&[]);
        assert!(load_entries(&cli).is_err());
    }

    #[test]
    fn test_file_and_regex_together_exit_negative() {
        let cli = parse(&["-f", "corpus.json", "-r", "a+"]);
        assert_eq!(input_conflict_exit_code(&cli), Some(-1));
        assert!(load_entries(&cli).is_err());
    }

    #[test]
    fn test_single_input_does_not_conflict() {
        assert_eq!(input_conflict_exit_code(&parse(&["-r", "a+"])), None);
        assert_eq!(input_conflict_exit_code(&parse(&["-f", "corpus.json"])), None);
    }

    #[test]
    fn test_file_is_never_read_from_the_environment() {
        use clap::CommandFactory;

        let command = Cli::command();
        let file = command
            .get_arguments()
            .find(|arg| arg.get_id() == "file")
            .expect("file argument");
        assert!(file.get_env().is_none());
        assert!(parse(&["-r", "a+"]).file.is_none());
    }

    #[test]
    fn test_write_outputs_creates_shards_and_summary() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("out");
        let cli = parse(&["-r", "a", "--shards", "2", "--shard-prefix", "run"]);
        let summary = BatchSummary::new("run-1", 0);

        write_outputs(&cli, &out, &summary, &[]).unwrap();
        assert!(out.join("run_0.json").exists());
        assert!(out.join("run_1.json").exists());
        assert!(out.join(SUMMARY_FILE_NAME).exists());
    }
}
