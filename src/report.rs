use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use chrono::{Local, NaiveDate};
use encoding_rs::UTF_8;
use log::info;
use rust_decimal::Decimal;
use serde::Serialize;

use crate::{
    aggregate::{self, Summary},
    chart,
    clean::{self, DropReason, DropTally},
    cli::ReportArgs,
    config::{REDUCED_OUTPUT, ReportConfig, STATIC_SUMMARY_OUTPUT, SUMMARY_JSON_OUTPUT},
    data::{format_amount, format_dollars, truncate_label},
    io_utils, reduce,
    record::RawTable,
    table::{self, Align},
};

/// Literal category summary shipped with the review; copied, never derived.
pub const STATIC_SUMMARY: &str = include_str!("../assets/electronics_summary.csv");

#[derive(Debug, Clone, Serialize)]
pub struct ReportDocument {
    pub as_of: NaiveDate,
    pub input_rows: usize,
    pub cleaned_rows: usize,
    pub dropped: DropTally,
    pub reduced_table_total: Decimal,
    pub summary: Summary,
}

#[derive(Debug, Clone)]
pub struct ReportOutcome {
    pub document: ReportDocument,
    pub outputs: Vec<PathBuf>,
}

pub fn execute(args: &ReportArgs) -> Result<()> {
    let config = ReportConfig::load_or_default(args.config.as_deref())?;
    let input = args.output_dir.join(&args.standardized);
    let standardized = RawTable::read(&input, io_utils::DEFAULT_CSV_DELIMITER, UTF_8)
        .with_context(|| format!("Loading standardized table {input:?}"))?;
    let as_of = resolve_cutoff(args.as_of);
    let outcome = write_report(&standardized, &config, as_of, &args.output_dir)?;
    print_console_summary(&outcome.document);
    Ok(())
}

/// The explicit cutoff, or today's local date.
pub fn resolve_cutoff(as_of: Option<NaiveDate>) -> NaiveDate {
    as_of.unwrap_or_else(|| Local::now().date_naive())
}

/// Cleans `standardized`, aggregates it and writes every report artifact into `dir`.
pub fn write_report(
    standardized: &RawTable,
    config: &ReportConfig,
    as_of: NaiveDate,
    dir: &Path,
) -> Result<ReportOutcome> {
    let mut outputs = Vec::new();

    let reduced_path = io_utils::output_path(dir, REDUCED_OUTPUT)?;
    let reduced_table_total = reduce::write_reduced(standardized, &config.total_label, &reduced_path)?;
    outputs.push(reduced_path);

    let cleaned = clean::clean_table(standardized, as_of, &config.uncategorized_label)?;
    let summary = aggregate::summarize(&cleaned.records, config);
    outputs.extend(chart::write_charts(&summary, dir)?);

    let document = ReportDocument {
        as_of,
        input_rows: cleaned.input_rows,
        cleaned_rows: cleaned.records.len(),
        dropped: cleaned.dropped,
        reduced_table_total,
        summary,
    };
    let json_path = io_utils::output_path(dir, SUMMARY_JSON_OUTPUT)?;
    let mut json = serde_json::to_string_pretty(&document).context("Serializing report summary")?;
    json.push('\n');
    fs::write(&json_path, json).with_context(|| format!("Writing {json_path:?}"))?;
    outputs.push(json_path);

    let static_path = io_utils::output_path(dir, STATIC_SUMMARY_OUTPUT)?;
    fs::write(&static_path, STATIC_SUMMARY).with_context(|| format!("Writing {static_path:?}"))?;
    outputs.push(static_path);

    info!(
        "Report for {} order(s) totalling {} written to {:?}",
        document.cleaned_rows,
        format_amount(document.summary.grand_total),
        dir
    );
    Ok(ReportOutcome { document, outputs })
}

pub fn print_console_summary(document: &ReportDocument) {
    let summary = &document.summary;
    for line in chart::summary_lines(summary) {
        println!("{line}");
    }
    println!();

    let drops = [
        DropReason::UnparseableDate,
        DropReason::UnparseableTotal,
        DropReason::NegativeTotal,
        DropReason::FutureDate,
        DropReason::MissingAddress,
    ]
    .iter()
    .map(|reason| vec![reason.to_string(), document.dropped.get(*reason).to_string()])
    .collect::<Vec<_>>();
    table::print_table(
        &format!("Dropped rows (as of {})", document.as_of),
        &["reason", "rows"],
        &drops,
        &[Align::Left, Align::Right],
    );

    let months = summary
        .monthly
        .iter()
        .map(|month| {
            vec![
                month.label.clone(),
                format_dollars(month.total),
                month.orders.to_string(),
            ]
        })
        .collect::<Vec<_>>();
    table::print_table(
        "Monthly spending",
        &["month", "total", "orders"],
        &months,
        &[Align::Left, Align::Right, Align::Right],
    );

    let categories = summary
        .top_categories
        .iter()
        .map(|group| vec![group.key.clone(), format_dollars(group.total)])
        .collect::<Vec<_>>();
    table::print_table(
        "Top categories",
        &["category", "total"],
        &categories,
        &[Align::Left, Align::Right],
    );

    let large = summary
        .large_orders
        .iter()
        .map(|order| {
            vec![
                order.order_date.format("%b %d, %Y").to_string(),
                format_dollars(order.total_price),
                order.category.clone(),
                truncate_label(&order.item_description, 50),
            ]
        })
        .collect::<Vec<_>>();
    table::print_table(
        "Largest orders",
        &["date", "amount", "category", "item"],
        &large,
        &[Align::Left, Align::Right],
    );

    let bands = summary
        .order_sizes
        .iter()
        .map(|band| vec![band.label.clone(), band.orders.to_string()])
        .collect::<Vec<_>>();
    table::print_table(
        "Order sizes",
        &["band", "orders"],
        &bands,
        &[Align::Left, Align::Right],
    );
}
