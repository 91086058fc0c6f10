use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow, bail};
use encoding_rs::Encoding;
use log::{info, warn};

use crate::{cli::MergeArgs, io_utils, record::RawTable};

/// Row accounting for one merge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergeReport {
    pub sources: Vec<(PathBuf, usize)>,
    pub total_rows: usize,
}

impl MergeReport {
    pub fn expected_rows(&self) -> usize {
        self.sources.iter().map(|(_, rows)| rows).sum()
    }
}

pub fn execute(args: &MergeArgs) -> Result<()> {
    let encoding = io_utils::resolve_encoding(args.sources.input_encoding.as_deref())?;
    let output = io_utils::output_path(&args.output_dir, &args.merged)?;
    merge_to_file(
        &args.sources.source_paths(),
        args.sources.delimiter,
        encoding,
        &output,
    )?;
    Ok(())
}

/// Merges `inputs` and checkpoints the result to `output`.
pub fn merge_to_file(
    inputs: &[PathBuf],
    delimiter: Option<u8>,
    encoding: &'static Encoding,
    output: &Path,
) -> Result<(RawTable, MergeReport)> {
    let (table, report) = merge_sources(inputs, delimiter, encoding)?;
    table
        .write(output)
        .with_context(|| format!("Writing merged table to {output:?}"))?;
    info!(
        "Merged {} row(s) from {} source(s) -> {:?}",
        report.total_rows,
        report.sources.len(),
        output
    );
    Ok((table, report))
}

/// Concatenates `inputs` in order; every source must share the first one's header row.
pub fn merge_sources(
    inputs: &[PathBuf],
    delimiter: Option<u8>,
    encoding: &'static Encoding,
) -> Result<(RawTable, MergeReport)> {
    if inputs.is_empty() {
        return Err(anyhow!("At least one input file must be provided"));
    }

    let mut merged: Option<RawTable> = None;
    let mut sources = Vec::with_capacity(inputs.len());

    for input in inputs {
        let source_delimiter = io_utils::resolve_input_delimiter(input, delimiter);
        let table = RawTable::read(input, source_delimiter, encoding)
            .with_context(|| format!("Loading source {input:?}"))?;
        if table.is_empty() {
            warn!("Source {input:?} has no data rows");
        }
        let rows = table.len();
        match merged.as_mut() {
            None => merged = Some(table),
            Some(baseline) => {
                if baseline.headers != table.headers {
                    bail!(
                        "Header mismatch between {:?} ({:?}) and baseline ({:?})",
                        input,
                        table.headers,
                        baseline.headers
                    );
                }
                baseline.rows.extend(table.rows);
            }
        }
        info!("✓ Loaded {rows} row(s) from {input:?}");
        sources.push((input.clone(), rows));
    }

    let merged = merged.unwrap_or_default();
    let report = MergeReport {
        total_rows: merged.len(),
        sources,
    };
    debug_assert_eq!(report.total_rows, report.expected_rows());
    Ok((merged, report))
}
