//! Untyped tables and typed order records.

use std::path::Path;

use anyhow::{Context, Result, anyhow};
use chrono::NaiveDate;
use encoding_rs::Encoding;
use rust_decimal::Decimal;
use serde::Serialize;

use crate::{
    config::{
        COL_CATEGORY, COL_ITEM_DESCRIPTION, COL_ORDER_DATE, COL_QUANTITY, COL_SHIPPING_ADDRESS,
        COL_TOTAL_PRICE, COL_UNIT_PRICE,
    },
    io_utils,
};

/// Header plus decoded rows, exactly as read. An empty cell is null.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawTable {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl RawTable {
    pub fn new(headers: Vec<String>) -> Self {
        Self {
            headers,
            rows: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|header| header.trim() == name)
    }

    pub fn require_column(&self, name: &str) -> Result<usize> {
        self.column_index(name)
            .ok_or_else(|| anyhow!("Required column '{name}' not found in headers {:?}", self.headers))
    }

    /// Returns the cell, or `None` when it is missing or blank.
    pub fn cell(&self, row: usize, column: Option<usize>) -> Option<&str> {
        let value = self.rows.get(row)?.get(column?)?;
        if value.trim().is_empty() {
            None
        } else {
            Some(value.as_str())
        }
    }

    pub fn read(path: &Path, delimiter: u8, encoding: &'static Encoding) -> Result<Self> {
        let mut reader = io_utils::open_csv_reader_from_path(path, delimiter)?;
        let headers = io_utils::reader_headers(&mut reader, encoding)
            .with_context(|| format!("Reading headers from {path:?}"))?;
        let mut table = RawTable::new(headers);
        for (row_idx, record) in reader.byte_records().enumerate() {
            let record =
                record.with_context(|| format!("Reading row {} in {:?}", row_idx + 2, path))?;
            let decoded = io_utils::decode_record(&record, encoding)
                .with_context(|| format!("Decoding row {} in {:?}", row_idx + 2, path))?;
            table.rows.push(decoded);
        }
        Ok(table)
    }

    pub fn write(&self, path: &Path) -> Result<()> {
        let mut writer = io_utils::open_csv_writer(path)?;
        writer
            .write_record(self.headers.iter())
            .with_context(|| format!("Writing headers to {path:?}"))?;
        for (idx, row) in self.rows.iter().enumerate() {
            writer
                .write_record(row.iter())
                .with_context(|| format!("Writing row {} to {:?}", idx + 2, path))?;
        }
        writer
            .flush()
            .with_context(|| format!("Flushing {path:?}"))?;
        Ok(())
    }
}

/// Positions of the order columns inside a [`RawTable`].
#[derive(Debug, Clone, Copy)]
pub struct OrderColumns {
    pub order_date: usize,
    pub shipping_address: usize,
    pub total_price: usize,
    pub item_description: Option<usize>,
    pub category: Option<usize>,
    pub quantity: Option<usize>,
    pub unit_price: Option<usize>,
}

impl OrderColumns {
    pub fn resolve(table: &RawTable) -> Result<Self> {
        Ok(Self {
            order_date: table.require_column(COL_ORDER_DATE)?,
            shipping_address: table.require_column(COL_SHIPPING_ADDRESS)?,
            total_price: table.require_column(COL_TOTAL_PRICE)?,
            item_description: table.column_index(COL_ITEM_DESCRIPTION),
            category: table.column_index(COL_CATEGORY),
            quantity: table.column_index(COL_QUANTITY),
            unit_price: table.column_index(COL_UNIT_PRICE),
        })
    }
}

/// One purchase line item that survived cleaning.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OrderRecord {
    pub order_date: NaiveDate,
    pub shipping_address: String,
    pub item_description: String,
    pub category: String,
    pub quantity: Option<i64>,
    pub unit_price: Option<Decimal>,
    pub total_price: Decimal,
}
