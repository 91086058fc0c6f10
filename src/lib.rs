pub mod address;
pub mod aggregate;
pub mod chart;
pub mod clean;
pub mod cli;
pub mod config;
pub mod data;
pub mod io_utils;
pub mod merge;
pub mod record;
pub mod reduce;
pub mod report;
pub mod standardize;
pub mod table;

use std::{env, path::Path, sync::OnceLock};

use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::Parser;
use log::{LevelFilter, debug, info};

use crate::{
    address::AddressNormalizer,
    cli::{Cli, Commands, RunArgs, SourceArgs},
    config::{MERGED_OUTPUT, ReportConfig, STANDARDIZED_OUTPUT},
    merge::MergeReport,
    report::ReportOutcome,
    standardize::StandardizeReport,
};

static LOGGER: OnceLock<()> = OnceLock::new();

fn init_logging() {
    LOGGER.get_or_init(|| {
        let mut builder = env_logger::Builder::from_env(env_logger::Env::default());
        if env::var("RUST_LOG").is_err() {
            builder.filter_module("ware_review", LevelFilter::Info);
        }
        let _ = builder.format_timestamp_millis().try_init();
    });
}

pub fn run() -> Result<()> {
    init_logging();
    let cli = Cli::parse();
    match cli.command {
        Commands::Merge(args) => merge::execute(&args),
        Commands::Standardize(args) => standardize::execute(&args),
        Commands::Report(args) => report::execute(&args),
        Commands::Run(args) => handle_run(&args),
    }
}

fn handle_run(args: &RunArgs) -> Result<()> {
    let config = ReportConfig::load_or_default(args.config.as_deref())?;
    let as_of = report::resolve_cutoff(args.as_of);
    let outcome = run_pipeline(&args.sources, &config, as_of, &args.output_dir)?;
    report::print_console_summary(&outcome.report.document);
    Ok(())
}

/// Everything one end-to-end run produced.
#[derive(Debug, Clone)]
pub struct PipelineOutcome {
    pub merge: MergeReport,
    pub standardize: StandardizeReport,
    pub report: ReportOutcome,
}

/// Merges, standardizes and reports in order, checkpointing each stage under `output_dir`.
pub fn run_pipeline(
    sources: &SourceArgs,
    config: &ReportConfig,
    as_of: NaiveDate,
    output_dir: &Path,
) -> Result<PipelineOutcome> {
    let inputs = sources.source_paths();
    info!(
        "Running review over {} source(s) with delimiter '{}' as of {}",
        inputs.len(),
        sources
            .delimiter
            .map(printable_delimiter)
            .unwrap_or_else(|| "auto".to_string()),
        as_of
    );
    let encoding = io_utils::resolve_encoding(sources.input_encoding.as_deref())?;
    let normalizer = AddressNormalizer::with_corrections(&config.effective_corrections())?;
    debug!("Address normalizer carries {} correction(s)", normalizer.correction_count());

    let merged_path = io_utils::output_path(output_dir, MERGED_OUTPUT)?;
    let (merged, merge) = merge::merge_to_file(&inputs, sources.delimiter, encoding, &merged_path)
        .context("Merge stage")?;

    let standardized_path = io_utils::output_path(output_dir, STANDARDIZED_OUTPUT)?;
    let (standardized, standardize) =
        standardize::standardize_to_file(&merged, &normalizer, &standardized_path)
            .context("Standardize stage")?;

    let report = report::write_report(&standardized, config, as_of, output_dir)
        .context("Report stage")?;
    Ok(PipelineOutcome {
        merge,
        standardize,
        report,
    })
}

pub(crate) fn printable_delimiter(delimiter: u8) -> String {
    match delimiter {
        b',' => ",".to_string(),
        b'\t' => "\\t".to_string(),
        b'\n' => "\\n".to_string(),
        other => (other as char).to_string(),
    }
}
