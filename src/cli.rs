use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};

use crate::config::{DEFAULT_SOURCES, MERGED_OUTPUT, STANDARDIZED_OUTPUT};

#[derive(Debug, Parser)]
#[command(
    author,
    version,
    about = "Merge purchase-order exports, normalize shipping addresses and report spending",
    long_about = None
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Concatenate the source exports into the merged table
    Merge(MergeArgs),
    /// Normalize shipping addresses in the merged table
    Standardize(StandardizeArgs),
    /// Clean the standardized table and write charts, tables and the summary
    Report(ReportArgs),
    /// Run merge, standardize and report in order
    Run(RunArgs),
}

#[derive(Debug, Clone, Default, Args)]
pub struct SourceArgs {
    /// Source CSV exports, merged in the given order (defaults to the four review exports)
    #[arg(short = 'i', long = "input", action = clap::ArgAction::Append)]
    pub inputs: Vec<PathBuf>,
    /// CSV delimiter character (supports ',', 'tab', ';', '|')
    #[arg(long, value_parser = parse_delimiter)]
    pub delimiter: Option<u8>,
    /// Character encoding of the input files (defaults to utf-8)
    #[arg(long = "input-encoding")]
    pub input_encoding: Option<String>,
}

impl SourceArgs {
    /// Explicit inputs, or the default source list when none were given.
    pub fn source_paths(&self) -> Vec<PathBuf> {
        if self.inputs.is_empty() {
            DEFAULT_SOURCES.iter().map(PathBuf::from).collect()
        } else {
            self.inputs.clone()
        }
    }
}

#[derive(Debug, Args)]
pub struct MergeArgs {
    #[command(flatten)]
    pub sources: SourceArgs,
    /// Directory receiving every output file
    #[arg(short = 'o', long = "output-dir", default_value = ".")]
    pub output_dir: PathBuf,
    /// File name of the merged table
    #[arg(long, default_value = MERGED_OUTPUT)]
    pub merged: String,
}

#[derive(Debug, Args)]
pub struct StandardizeArgs {
    /// Directory holding the merged table and receiving the standardized one
    #[arg(short = 'o', long = "output-dir", default_value = ".")]
    pub output_dir: PathBuf,
    /// File name of the merged table to read
    #[arg(long, default_value = MERGED_OUTPUT)]
    pub merged: String,
    /// File name of the standardized table to write
    #[arg(long, default_value = STANDARDIZED_OUTPUT)]
    pub standardized: String,
    /// YAML file overriding thresholds and address corrections
    #[arg(short = 'c', long)]
    pub config: Option<PathBuf>,
}

#[derive(Debug, Args)]
pub struct ReportArgs {
    /// Directory holding the standardized table and receiving report outputs
    #[arg(short = 'o', long = "output-dir", default_value = ".")]
    pub output_dir: PathBuf,
    /// File name of the standardized table to read
    #[arg(long, default_value = STANDARDIZED_OUTPUT)]
    pub standardized: String,
    /// YAML file overriding thresholds and address corrections
    #[arg(short = 'c', long)]
    pub config: Option<PathBuf>,
    /// Orders dated after this day (YYYY-MM-DD) are dropped; defaults to today
    #[arg(long = "as-of", value_parser = parse_as_of)]
    pub as_of: Option<NaiveDate>,
}

#[derive(Debug, Args)]
pub struct RunArgs {
    #[command(flatten)]
    pub sources: SourceArgs,
    /// Directory receiving every output file
    #[arg(short = 'o', long = "output-dir", default_value = ".")]
    pub output_dir: PathBuf,
    /// YAML file overriding thresholds and address corrections
    #[arg(short = 'c', long)]
    pub config: Option<PathBuf>,
    /// Orders dated after this day (YYYY-MM-DD) are dropped; defaults to today
    #[arg(long = "as-of", value_parser = parse_as_of)]
    pub as_of: Option<NaiveDate>,
}

pub fn parse_delimiter(value: &str) -> Result<u8, String> {
    match value {
        "tab" | "\t" => Ok(b'\t'),
        "comma" | "," => Ok(b','),
        "|" | "pipe" => Ok(b'|'),
        ";" | "semicolon" => Ok(b';'),
        other => {
            let mut chars = other.chars();
            let first = chars
                .next()
                .ok_or_else(|| "Delimiter cannot be empty".to_string())?;
            if chars.next().is_some() {
                return Err("Delimiter must be a single character".to_string());
            }
            if !first.is_ascii() {
                return Err("Delimiter must be ASCII".to_string());
            }
            Ok(first as u8)
        }
    }
}

pub fn parse_as_of(value: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d")
        .map_err(|err| format!("Expected YYYY-MM-DD, got '{value}': {err}"))
}
