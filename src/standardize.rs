use std::{collections::HashSet, path::Path};

use anyhow::{Context, Result};
use encoding_rs::UTF_8;
use log::{debug, info};

use crate::{
    address::AddressNormalizer,
    cli::StandardizeArgs,
    config::{COL_SHIPPING_ADDRESS, ReportConfig},
    io_utils,
    record::RawTable,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StandardizeReport {
    pub rows: usize,
    pub null_addresses: usize,
    pub distinct_before: usize,
    pub distinct_after: usize,
    pub all_uppercase: bool,
}

pub fn execute(args: &StandardizeArgs) -> Result<()> {
    let config = ReportConfig::load_or_default(args.config.as_deref())?;
    let normalizer = AddressNormalizer::with_corrections(&config.effective_corrections())?;
    let input = args.output_dir.join(&args.merged);
    let merged = RawTable::read(&input, io_utils::DEFAULT_CSV_DELIMITER, UTF_8)
        .with_context(|| format!("Loading merged table {input:?}"))?;
    let output = io_utils::output_path(&args.output_dir, &args.standardized)?;
    standardize_to_file(&merged, &normalizer, &output)?;
    Ok(())
}

pub fn standardize_to_file(
    merged: &RawTable,
    normalizer: &AddressNormalizer,
    output: &Path,
) -> Result<(RawTable, StandardizeReport)> {
    let (table, report) = standardize_table(merged, normalizer)?;
    table
        .write(output)
        .with_context(|| format!("Writing standardized table to {output:?}"))?;
    info!(
        "Standardized {} address(es): {} distinct before, {} after, {} null -> {:?}",
        report.rows, report.distinct_before, report.distinct_after, report.null_addresses, output
    );
    info!("All addresses uppercase: {}", report.all_uppercase);
    Ok((table, report))
}

/// Rewrites the shipping-address column; every other cell is copied untouched.
pub fn standardize_table(
    merged: &RawTable,
    normalizer: &AddressNormalizer,
) -> Result<(RawTable, StandardizeReport)> {
    let column = merged.require_column(COL_SHIPPING_ADDRESS)?;
    let mut before = HashSet::new();
    let mut after = HashSet::new();
    let mut null_addresses = 0usize;
    let mut table = merged.clone();

    for (idx, row) in table.rows.iter_mut().enumerate() {
        let Some(cell) = row.get_mut(column) else {
            null_addresses += 1;
            continue;
        };
        before.insert(cell.clone());
        match normalizer.normalize(Some(cell.as_str())) {
            Some(normalized) => {
                if *cell != normalized {
                    debug!("Row {}: '{}' -> '{}'", idx + 2, cell, normalized);
                }
                after.insert(normalized.clone());
                *cell = normalized;
            }
            None => {
                null_addresses += 1;
                cell.clear();
            }
        }
    }

    let all_uppercase = table.rows.iter().all(|row| {
        row.get(column)
            .is_none_or(|value| *value == value.to_uppercase())
    });
    let report = StandardizeReport {
        rows: table.len(),
        null_addresses,
        distinct_before: before.len(),
        distinct_after: after.len(),
        all_uppercase,
    };
    Ok((table, report))
}
