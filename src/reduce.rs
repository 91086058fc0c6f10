use std::path::Path;

use anyhow::{Context, Result};
use log::info;
use rust_decimal::Decimal;

use crate::{
    config::{COL_ITEM_DESCRIPTION, COL_QUANTITY, COL_TOTAL_PRICE, COL_UNIT_PRICE},
    data::{format_amount, parse_currency},
    record::RawTable,
};

const REDUCED_COLUMNS: [&str; 4] = [COL_QUANTITY, COL_ITEM_DESCRIPTION, COL_UNIT_PRICE, COL_TOTAL_PRICE];

/// Projects the standardized table onto quantity, description, unit and total
/// price, then appends a trailer row carrying the summed total under `label`.
///
/// Cells whose total cannot be parsed are copied through but left out of the sum.
pub fn reduce_table(standardized: &RawTable, label: &str) -> Result<(RawTable, Decimal)> {
    let total_column = standardized.require_column(COL_TOTAL_PRICE)?;
    let indices = REDUCED_COLUMNS
        .iter()
        .map(|name| standardized.column_index(name))
        .collect::<Vec<_>>();

    let mut reduced = RawTable::new(REDUCED_COLUMNS.iter().map(|name| name.to_string()).collect());
    let mut total = Decimal::ZERO;
    for (row_idx, row) in standardized.rows.iter().enumerate() {
        let projected = indices
            .iter()
            .map(|idx| idx.and_then(|idx| row.get(idx)).cloned().unwrap_or_default())
            .collect();
        reduced.rows.push(projected);
        if let Some(Ok(value)) = standardized
            .cell(row_idx, Some(total_column))
            .map(parse_currency)
        {
            total += value;
        }
    }
    reduced.rows.push(vec![
        String::new(),
        label.to_string(),
        String::new(),
        format_amount(total),
    ]);
    Ok((reduced, total))
}

pub fn write_reduced(standardized: &RawTable, label: &str, output: &Path) -> Result<Decimal> {
    let (reduced, total) = reduce_table(standardized, label)?;
    reduced
        .write(output)
        .with_context(|| format!("Writing reduced table to {output:?}"))?;
    info!(
        "Reduced {} row(s) with {} {} -> {:?}",
        reduced.len() - 1,
        label,
        format_amount(total),
        output
    );
    Ok(total)
}
