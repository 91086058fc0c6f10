//! Typing and filtering of standardized rows into [`OrderRecord`]s.
//!
//! A row is dropped, never fatal, when its date or total cannot be coerced,
//! when the total is negative, when it is dated after the cutoff, or when
//! its shipping address is null. Each drop is tallied under the first check
//! it fails, in that order, so the report can say where rows went.

use std::fmt;

use anyhow::Result;
use chrono::NaiveDate;
use log::{debug, info};
use serde::Serialize;

use crate::{
    data::{FieldError, parse_amount, parse_currency, parse_order_date, parse_quantity},
    record::{OrderColumns, OrderRecord, RawTable},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DropReason {
    UnparseableDate,
    UnparseableTotal,
    NegativeTotal,
    FutureDate,
    MissingAddress,
}

impl fmt::Display for DropReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            DropReason::UnparseableDate => "unparseable date",
            DropReason::UnparseableTotal => "unparseable total",
            DropReason::NegativeTotal => "negative total",
            DropReason::FutureDate => "future date",
            DropReason::MissingAddress => "missing address",
        };
        f.write_str(label)
    }
}

/// Per-reason drop counts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DropTally {
    pub unparseable_date: usize,
    pub unparseable_total: usize,
    pub negative_total: usize,
    pub future_date: usize,
    pub missing_address: usize,
}

impl DropTally {
    pub fn record(&mut self, reason: DropReason) {
        let slot = match reason {
            DropReason::UnparseableDate => &mut self.unparseable_date,
            DropReason::UnparseableTotal => &mut self.unparseable_total,
            DropReason::NegativeTotal => &mut self.negative_total,
            DropReason::FutureDate => &mut self.future_date,
            DropReason::MissingAddress => &mut self.missing_address,
        };
        *slot += 1;
    }

    pub fn get(&self, reason: DropReason) -> usize {
        match reason {
            DropReason::UnparseableDate => self.unparseable_date,
            DropReason::UnparseableTotal => self.unparseable_total,
            DropReason::NegativeTotal => self.negative_total,
            DropReason::FutureDate => self.future_date,
            DropReason::MissingAddress => self.missing_address,
        }
    }

    pub fn total(&self) -> usize {
        self.unparseable_date
            + self.unparseable_total
            + self.negative_total
            + self.future_date
            + self.missing_address
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct CleanOutcome {
    pub input_rows: usize,
    pub records: Vec<OrderRecord>,
    pub dropped: DropTally,
}

/// Types every row of `table`, dropping rows dated after `cutoff`.
pub fn clean_table(
    table: &RawTable,
    cutoff: NaiveDate,
    uncategorized: &str,
) -> Result<CleanOutcome> {
    let columns = OrderColumns::resolve(table)?;
    let mut dropped = DropTally::default();
    let mut records = Vec::with_capacity(table.len());

    for row in 0..table.len() {
        match type_row(table, &columns, row, cutoff) {
            Ok(partial) => records.push(partial.finish(uncategorized)),
            Err((reason, detail)) => {
                debug!("Dropping row {} ({reason}): {detail}", row + 2);
                dropped.record(reason);
            }
        }
    }

    info!(
        "Kept {} of {} row(s) as of {}; dropped {} (date {}, total {}, negative {}, future {}, address {})",
        records.len(),
        table.len(),
        cutoff,
        dropped.total(),
        dropped.unparseable_date,
        dropped.unparseable_total,
        dropped.negative_total,
        dropped.future_date,
        dropped.missing_address,
    );
    Ok(CleanOutcome {
        input_rows: table.len(),
        records,
        dropped,
    })
}

/// A typed row whose category has not been backfilled yet.
struct PartialRecord {
    record: OrderRecord,
    category: Option<String>,
}

impl PartialRecord {
    fn finish(mut self, uncategorized: &str) -> OrderRecord {
        self.record.category = self
            .category
            .unwrap_or_else(|| uncategorized.to_string());
        self.record
    }
}

fn type_row(
    table: &RawTable,
    columns: &OrderColumns,
    row: usize,
    cutoff: NaiveDate,
) -> Result<PartialRecord, (DropReason, String)> {
    let order_date = table
        .cell(row, Some(columns.order_date))
        .ok_or_else(|| FieldError::InvalidDate(String::new()))
        .and_then(parse_order_date)
        .map_err(|err| (DropReason::UnparseableDate, err.to_string()))?;

    let total_price = table
        .cell(row, Some(columns.total_price))
        .ok_or_else(|| FieldError::InvalidCurrency(String::new()))
        .and_then(parse_amount)
        .map_err(|err| match err {
            FieldError::NegativeAmount(_) => (DropReason::NegativeTotal, err.to_string()),
            other => (DropReason::UnparseableTotal, other.to_string()),
        })?;

    if order_date > cutoff {
        return Err((
            DropReason::FutureDate,
            format!("{order_date} is after {cutoff}"),
        ));
    }

    let shipping_address = table
        .cell(row, Some(columns.shipping_address))
        .map(|value| value.trim().to_string())
        .ok_or_else(|| (DropReason::MissingAddress, "empty shipping address".to_string()))?;

    let quantity = table
        .cell(row, columns.quantity)
        .and_then(|value| parse_quantity(value).ok());
    let unit_price = table
        .cell(row, columns.unit_price)
        .and_then(|value| parse_currency(value).ok());
    let item_description = table
        .cell(row, columns.item_description)
        .unwrap_or_default()
        .to_string();
    let category = table
        .cell(row, columns.category)
        .map(|value| value.trim().to_string());

    Ok(PartialRecord {
        record: OrderRecord {
            order_date,
            shipping_address,
            item_description,
            category: String::new(),
            quantity,
            unit_price,
            total_price,
        },
        category,
    })
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;

    use super::*;

    fn table(rows: &[[&str; 4]]) -> RawTable {
        RawTable {
            headers: vec![
                "Order Date".into(),
                "Shipping Address".into(),
                "Category".into(),
                "Total Price".into(),
            ],
            rows: rows
                .iter()
                .map(|row| row.iter().map(|cell| cell.to_string()).collect())
                .collect(),
        }
    }

    fn cutoff() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 6, 30).unwrap()
    }

    #[test]
    fn drops_are_classified_by_first_failing_check() {
        let table = table(&[
            ["2025-01-05", "1 A ST", "Laptop", "10.00"],
            ["someday", "1 A ST", "Laptop", "10.00"],
            ["2025-01-05", "1 A ST", "Laptop", "n/a"],
            ["2025-01-05", "1 A ST", "Laptop", "-4"],
            ["2026-06-30", "1 A ST", "Laptop", "4"],
            ["2025-01-05", "", "Laptop", "4"],
            ["garbage", "", "", "garbage"],
        ]);
        let outcome = clean_table(&table, cutoff(), "Uncategorized").expect("clean");
        assert_eq!(outcome.records.len(), 1);
        assert_eq!(outcome.dropped.unparseable_date, 2);
        assert_eq!(outcome.dropped.unparseable_total, 1);
        assert_eq!(outcome.dropped.negative_total, 1);
        assert_eq!(outcome.dropped.future_date, 1);
        assert_eq!(outcome.dropped.missing_address, 1);
        assert_eq!(outcome.records.len() + outcome.dropped.total(), outcome.input_rows);
    }

    #[test]
    fn out_of_range_totals_are_dropped_as_unparseable() {
        let table = table(&[
            ["2025-01-05", "1 A ST", "Laptop", "50000000000000000000000000000"],
            ["2025-01-06", "1 A ST", "Laptop", "50000000000000000000000000000"],
            ["2025-01-07", "1 A ST", "Laptop", "10"],
        ]);
        let outcome = clean_table(&table, cutoff(), "Uncategorized").expect("clean");
        assert_eq!(outcome.records.len(), 1);
        assert_eq!(outcome.dropped.unparseable_total, 2);
    }

    #[test]
    fn cutoff_day_itself_is_kept() {
        let table = table(&[["2025-06-30", "1 A ST", "X", "1"]]);
        let outcome = clean_table(&table, cutoff(), "Uncategorized").expect("clean");
        assert_eq!(outcome.records.len(), 1);
    }

    #[test]
    fn missing_category_is_backfilled() {
        let table = table(&[
            ["2025-01-05", "1 A ST", "", "1"],
            ["2025-01-06", "1 A ST", "Monitor", "$1,200.50"],
        ]);
        let outcome = clean_table(&table, cutoff(), "Uncategorized").expect("clean");
        assert_eq!(outcome.records[0].category, "Uncategorized");
        assert_eq!(outcome.records[1].category, "Monitor");
        assert_eq!(outcome.records[1].total_price, Decimal::new(120050, 2));
    }

    #[test]
    fn optional_fields_are_best_effort() {
        let table = RawTable {
            headers: vec![
                "Order Date".into(),
                "Shipping Address".into(),
                "Quantity".into(),
                "Unit Price".into(),
                "Total Price".into(),
            ],
            rows: vec![vec![
                "2025-01-05".into(),
                "1 A ST".into(),
                "a few".into(),
                "$3.50".into(),
                "7".into(),
            ]],
        };
        let outcome = clean_table(&table, cutoff(), "Uncategorized").expect("clean");
        let record = &outcome.records[0];
        assert_eq!(record.quantity, None);
        assert_eq!(record.unit_price, Some(Decimal::new(350, 2)));
        assert_eq!(record.item_description, "");
    }

    #[test]
    fn drop_reason_display_is_readable() {
        assert_eq!(DropReason::FutureDate.to_string(), "future date");
        let mut tally = DropTally::default();
        tally.record(DropReason::FutureDate);
        assert_eq!(tally.get(DropReason::FutureDate), 1);
    }
}
