//! ATAC-seq FastQC Checker
//!
//! Evaluates every fastqc_data.txt under a directory against ATAC-seq aware
//! rules and flags samples that need review

use anyhow::Result;
use atacseq_qc_tools::cli::{self, EXIT_FATAL};
use atacseq_qc_tools::{ExpectedAnomalies, QcReporter, QcStatus, QualityChecker};
use clap::{Arg, Command};
use std::path::PathBuf;

fn main() {
    let code = match run() {
        Ok(code) => code,
        Err(e) => {
            eprintln!("❌ Error: {e:#}");
            EXIT_FATAL
        }
    };
    std::process::exit(code);
}

fn run() -> Result<i32> {
    let command = Command::new("atacseq-qc-check")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Analyze FastQC reports for ATAC-seq specific quality metrics")
        .arg(
            Arg::new("fastqc_dir")
                .value_name("FASTQC_DIR")
                .help("Directory containing FastQC results")
                .required(true),
        )
        .arg(
            Arg::new("output_json")
                .value_name("OUTPUT_JSON")
                .help("Output JSON file for summary")
                .required(true),
        );
    let matches = cli::with_common_args(command).get_matches();

    let fastqc_dir: PathBuf = matches
        .get_one::<String>("fastqc_dir")
        .map(PathBuf::from)
        .unwrap_or_default();
    let output_file: PathBuf = matches
        .get_one::<String>("output_json")
        .map(PathBuf::from)
        .unwrap_or_default();
    let verbose = matches.get_flag("verbose");

    cli::init_logging(verbose);
    let thresholds = cli::thresholds_from_matches(&matches)?;

    println!("🧬 ATAC-seq FastQC Checker");
    println!("Input: {}", fastqc_dir.display());
    println!("Output: {}", output_file.display());

    let reporter = QcReporter {
        checker: QualityChecker::new(thresholds, ExpectedAnomalies::atac_seq()),
        ..Default::default()
    };
    let summary = reporter.check_fastqc_dir(&fastqc_dir)?;

    if verbose {
        for verdict in &summary.all_verdicts {
            let icon = if verdict.status == QcStatus::Pass { "✅" } else { "❌" };
            println!("{icon} {}: {}", verdict.sample_id, verdict.status);
        }
    }

    reporter.export_json(&summary, &output_file)?;

    print!("{summary}");
    println!("💾 Results saved to: {}", output_file.display());

    Ok(cli::exit_code(&summary))
}
