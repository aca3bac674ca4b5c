//! ATAC-seq Pipeline Report
//!
//! Collects trimming, alignment, duplicate, peak, FRiP and fragment size
//! metrics for every sample in a results tree, evaluates the FastQC reports,
//! and writes one JSON report for the HTML renderer

use anyhow::{Context, Result};
use atacseq_qc_tools::cli::{self, EXIT_FATAL};
use atacseq_qc_tools::reporting::peak_line;
use atacseq_qc_tools::{ExpectedAnomalies, PipelineLayout, QcReporter, QualityChecker};
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
    let command = Command::new("atacseq-pipeline-report")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Comprehensive ATAC-seq pipeline QC metrics")
        .arg(
            Arg::new("results_dir")
                .value_name("RESULTS_DIR")
                .help("Results directory (usually \"results\")")
                .required(true),
        )
        .arg(
            Arg::new("output_json")
                .value_name("OUTPUT_JSON")
                .help("Output JSON file for the report")
                .required(true),
        )
        .arg(
            Arg::new("fastqc_dir")
                .long("fastqc-dir")
                .value_name("DIRECTORY")
                .help("Directory with extracted FastQC results [default: <RESULTS_DIR>/fastqc]"),
        )
        .arg(
            Arg::new("layout")
                .long("layout")
                .value_name("JSON")
                .help("JSON file describing where each output lives under RESULTS_DIR"),
        );
    let matches = cli::with_common_args(command).get_matches();

    let results_dir: PathBuf = matches
        .get_one::<String>("results_dir")
        .map(PathBuf::from)
        .unwrap_or_default();
    let output_file: PathBuf = matches
        .get_one::<String>("output_json")
        .map(PathBuf::from)
        .unwrap_or_default();

    cli::init_logging(matches.get_flag("verbose"));
    let thresholds = cli::thresholds_from_matches(&matches)?;
    let layout = match matches.get_one::<String>("layout") {
        Some(path) => PipelineLayout::from_json_file(path)
            .with_context(|| format!("Failed to load layout from {path}"))?,
        None => PipelineLayout::default(),
    };
    let fastqc_dir = matches
        .get_one::<String>("fastqc_dir")
        .map(PathBuf::from)
        .unwrap_or_else(|| layout.fastqc_dir(&results_dir));

    println!("🔬 ATAC-seq Pipeline QC Report");
    println!("{}", "=".repeat(70));
    println!("Results directory: {}", results_dir.display());
    println!("FastQC directory: {}", fastqc_dir.display());
    println!("Output file: {}", output_file.display());

    let reporter = QcReporter::new(
        QualityChecker::new(thresholds, ExpectedAnomalies::atac_seq()),
        layout,
    );
    let report = reporter.pipeline_report(&results_dir, &fastqc_dir)?;

    println!("\n📊 {} samples", report.cohort.sample_count);
    for sample in &report.samples {
        println!("   {}", peak_line(sample));
    }
    if let (Some(frip), Some(tier)) = (report.cohort.mean_frip, report.cohort.mean_frip_tier) {
        println!("🎯 Mean FRiP: {:.1}% ({tier})", frip * 100.0);
    }

    reporter.export_json(&report, &output_file)?;

    print!("{}", report.qc);
    println!("💾 Report saved to: {}", output_file.display());

    if report.qc.total_samples == 0 {
        println!("⚠️  No FastQC reports evaluated in {}", fastqc_dir.display());
    }
    Ok(cli::exit_code(&report.qc))
}
