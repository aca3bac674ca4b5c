//! Command-line plumbing shared by the binaries

use crate::quality::QcThresholds;
use crate::reporting::BatchSummary;
use anyhow::{Context, Result};
use clap::{Arg, ArgAction, ArgMatches, Command};
use std::str::FromStr;

/// Exit status when every sample passed
pub const EXIT_PASS: i32 = 0;
/// Exit status when at least one sample failed
pub const EXIT_FAIL: i32 = 1;
/// Exit status for fatal errors (missing input, nothing found, bad configuration).
/// The pipeline report also uses it, after writing its metrics, when no FastQC
/// report could be evaluated.
pub const EXIT_FATAL: i32 = 2;

/// Exit status for a finished batch: nothing evaluated is fatal, otherwise
/// any FAIL fails the run
pub fn exit_code(summary: &BatchSummary) -> i32 {
    if summary.total_samples == 0 {
        EXIT_FATAL
    } else if summary.all_passed() {
        EXIT_PASS
    } else {
        EXIT_FAIL
    }
}

/// (flag id, long name, help) for each threshold override
const THRESHOLD_FLAGS: [(&str, &str, &str); 8] = [
    ("min_mean_quality", "min-mean-quality", "Per-base mean quality floor [default: 28]"),
    (
        "min_passing_quality_fraction",
        "min-passing-quality",
        "Fraction of positions that must meet the floor [default: 0.8]",
    ),
    ("max_adapter_content", "max-adapter-content", "Adapter content ceiling in percent [default: 10]"),
    ("max_duplication_pct", "max-duplication", "Duplication ceiling in percent [default: 85]"),
    ("min_sequence_length", "min-length", "Minimum read length in bp [default: 50]"),
    ("min_gc_content", "min-gc", "Minimum GC content in percent [default: 30]"),
    ("max_gc_content", "max-gc", "Maximum GC content in percent [default: 65]"),
    ("max_n_content", "max-n-content", "N content ceiling in percent [default: 5]"),
];

/// Add `--thresholds`, one flag per threshold and `-v/--verbose`
pub fn with_common_args(command: Command) -> Command {
    let command = command
        .arg(
            Arg::new("thresholds")
                .long("thresholds")
                .value_name("JSON")
                .help("JSON file with threshold overrides; explicit flags take precedence"),
        )
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .help("Verbose output")
                .action(ArgAction::SetTrue),
        );

    THRESHOLD_FLAGS
        .iter()
        .fold(command, |command, (id, long, help)| {
            command.arg(Arg::new(*id).long(*long).value_name("VALUE").help(*help))
        })
}

/// Thresholds from `--thresholds` (or defaults) with explicit flags applied on top
pub fn thresholds_from_matches(matches: &ArgMatches) -> Result<QcThresholds> {
    let mut t = match matches.get_one::<String>("thresholds") {
        Some(path) => QcThresholds::from_json_file(path)
            .with_context(|| format!("Failed to load thresholds from {path}"))?,
        None => QcThresholds::default(),
    };

    override_with(matches, "min_mean_quality", &mut t.min_mean_quality)?;
    override_with(
        matches,
        "min_passing_quality_fraction",
        &mut t.min_passing_quality_fraction,
    )?;
    override_with(matches, "max_adapter_content", &mut t.max_adapter_content)?;
    override_with(matches, "max_duplication_pct", &mut t.max_duplication_pct)?;
    override_with(matches, "min_sequence_length", &mut t.min_sequence_length)?;
    override_with(matches, "min_gc_content", &mut t.min_gc_content)?;
    override_with(matches, "max_gc_content", &mut t.max_gc_content)?;
    override_with(matches, "max_n_content", &mut t.max_n_content)?;

    t.validate()?;
    Ok(t)
}

fn override_with<T>(matches: &ArgMatches, id: &str, slot: &mut T) -> Result<()>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    if let Some(raw) = matches.get_one::<String>(id) {
        *slot = raw
            .parse()
            .with_context(|| format!("Invalid value for {id}: {raw}"))?;
    }
    Ok(())
}

/// Logger on stderr at `info`, or `debug` with `--verbose`; `RUST_LOG` wins
pub fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default))
        .format_timestamp(None)
        .init();
}
