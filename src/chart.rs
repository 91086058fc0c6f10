//! SVG charts for the spending review, one file per summary.

use std::path::{Path, PathBuf};

use anyhow::{Result, anyhow};
use log::info;
use plotters::coord::ranged1d::SegmentValue;
use plotters::prelude::*;
use rust_decimal::{Decimal, prelude::ToPrimitive};

use crate::{
    aggregate::Summary,
    config::{
        LARGE_ORDERS_CHART, MONTHLY_SPENDING_CHART, ORDER_SIZES_CHART, ORDERS_PER_MONTH_CHART,
        SHIPPING_ADDRESSES_CHART, SUMMARY_CHART, TOP_CATEGORIES_CHART, TOTAL_SPENDING_CHART,
    },
    data::{format_dollars, truncate_label},
    io_utils,
};

const CHART_SIZE: (u32, u32) = (1200, 800);
const DARK_RED: RGBColor = RGBColor(139, 0, 0);
const ORANGE: RGBColor = RGBColor(255, 165, 0);
const PURPLE: RGBColor = RGBColor(128, 0, 128);
const TEAL: RGBColor = RGBColor(0, 128, 128);

/// Writes every chart into `dir` and returns the paths in chart order.
pub fn write_charts(summary: &Summary, dir: &Path) -> Result<Vec<PathBuf>> {
    let mut written = Vec::new();

    let path = io_utils::output_path(dir, TOTAL_SPENDING_CHART)?;
    bar_chart(
        &path,
        "Total Amount Spent",
        "Amount ($)",
        &[("Total Money Spent".to_string(), to_f64(summary.grand_total))],
        RED,
        &|value| format_dollars(from_f64(value)),
    )?;
    written.push(path);

    let monthly_totals = summary
        .monthly
        .iter()
        .map(|month| (month.label.clone(), to_f64(month.total)))
        .collect::<Vec<_>>();
    let path = io_utils::output_path(dir, MONTHLY_SPENDING_CHART)?;
    line_chart(&path, "Monthly Spending Pattern", "Amount Spent ($)", &monthly_totals)?;
    written.push(path);

    let categories = summary
        .top_categories
        .iter()
        .map(|group| (group.key.clone(), to_f64(group.total)))
        .collect::<Vec<_>>();
    let path = io_utils::output_path(dir, TOP_CATEGORIES_CHART)?;
    bar_chart(
        &path,
        "Where the Money Went - Top Spending Categories",
        "Total Amount ($)",
        &categories,
        DARK_RED,
        &|value| format_dollars(from_f64(value)),
    )?;
    written.push(path);

    let mut large_lines = vec![format!(
        "{:<14}{:>10}  {:<24}{}",
        "Date", "Amount", "Category", "Item Description"
    )];
    large_lines.extend(summary.large_orders.iter().map(|order| {
        format!(
            "{:<14}{:>10}  {:<24}{}",
            order.order_date.format("%b %d, %Y").to_string(),
            format_dollars(order.total_price),
            truncate_label(&order.category, 22),
            truncate_label(&order.item_description, 50)
        )
    }));
    let path = io_utils::output_path(dir, LARGE_ORDERS_CHART)?;
    text_panel(
        &path,
        &format!(
            "Largest Individual Orders (Over {})",
            format_dollars(summary.stats.large_threshold)
        ),
        &large_lines,
    )?;
    written.push(path);

    let monthly_counts = summary
        .monthly
        .iter()
        .map(|month| (month.label.clone(), month.orders as f64))
        .collect::<Vec<_>>();
    let path = io_utils::output_path(dir, ORDERS_PER_MONTH_CHART)?;
    bar_chart(
        &path,
        "Number of Orders Per Month",
        "Number of Orders",
        &monthly_counts,
        ORANGE,
        &|value| format!("{value:.0}"),
    )?;
    written.push(path);

    let order_count = summary.order_count.max(1) as f64;
    let sizes = summary
        .order_sizes
        .iter()
        .map(|band| (band.label.clone(), band.orders as f64))
        .collect::<Vec<_>>();
    let path = io_utils::output_path(dir, ORDER_SIZES_CHART)?;
    bar_chart(
        &path,
        "Distribution of Order Sizes",
        "Number of Orders",
        &sizes,
        TEAL,
        &|value| format!("{value:.0} ({:.1}%)", value / order_count * 100.0),
    )?;
    written.push(path);

    let addresses = summary
        .addresses
        .iter()
        .map(|group| (short_address(&group.key), to_f64(group.total)))
        .collect::<Vec<_>>();
    let path = io_utils::output_path(dir, SHIPPING_ADDRESSES_CHART)?;
    bar_chart(
        &path,
        "Total Spending by Shipping Address",
        "Total Amount ($)",
        &addresses,
        PURPLE,
        &|value| format_dollars(from_f64(value)),
    )?;
    written.push(path);

    let path = io_utils::output_path(dir, SUMMARY_CHART)?;
    text_panel(&path, "Investigation Summary", &summary_lines(summary))?;
    written.push(path);

    info!("Wrote {} chart(s) to {:?}", written.len(), dir);
    Ok(written)
}

/// Key findings, one line each, shared by the summary chart and the console.
pub fn summary_lines(summary: &Summary) -> Vec<String> {
    let stats = &summary.stats;
    let period = match (stats.first_order, stats.last_order) {
        (Some(first), Some(last)) => {
            format!("{} - {}", first.format("%b %Y"), last.format("%b %Y"))
        }
        _ => "n/a".to_string(),
    };
    let money = |value: Option<Decimal>| value.map(format_dollars).unwrap_or_else(|| "n/a".into());
    vec![
        "KEY FINDINGS - EMPLOYEE SPENDING INVESTIGATION".to_string(),
        String::new(),
        format!("Time Period: {period}"),
        format!("TOTAL MONEY SPENT: {}", format_dollars(stats.total_spent)),
        format!("Total Number of Orders: {}", stats.order_count),
        format!("Average Order Amount: {}", money(stats.mean_order)),
        format!("Largest Single Order: {}", money(stats.largest_order)),
        format!(
            "Number of Different Shipping Addresses: {}",
            stats.distinct_addresses
        ),
        format!(
            "Orders Over {}: {}",
            format_dollars(stats.large_threshold),
            stats.orders_over_large
        ),
        format!(
            "Orders Over {}: {}",
            format_dollars(stats.very_large_threshold),
            stats.orders_over_very_large
        ),
    ]
}

/// Street part of an address, shortened for axis labels.
pub fn short_address(address: &str) -> String {
    let street = address.split(',').next().unwrap_or(address);
    truncate_label(street, 25)
}

fn bar_chart(
    path: &Path,
    title: &str,
    y_desc: &str,
    bars: &[(String, f64)],
    color: RGBColor,
    value_label: &dyn Fn(f64) -> String,
) -> Result<()> {
    let root = SVGBackend::new(path, CHART_SIZE).into_drawing_area();
    root.fill(&WHITE).map_err(draw_error)?;
    let segments = bars.len().max(1) as u32;
    let mut chart = ChartBuilder::on(&root)
        .caption(title, ("sans-serif", 32))
        .margin(20)
        .x_label_area_size(80)
        .y_label_area_size(100)
        .build_cartesian_2d(
            (0u32..segments).into_segmented(),
            0f64..y_ceiling(bars.iter().map(|(_, value)| *value)),
        )
        .map_err(draw_error)?;
    chart
        .configure_mesh()
        .disable_x_mesh()
        .x_labels(bars.len().max(1))
        .x_label_formatter(&|segment| segment_label(segment, bars))
        .y_desc(y_desc)
        .draw()
        .map_err(draw_error)?;
    chart
        .draw_series(
            Histogram::vertical(&chart)
                .style(color.filled())
                .margin(12)
                .data(
                    bars.iter()
                        .enumerate()
                        .map(|(idx, (_, value))| (idx as u32, *value)),
                ),
        )
        .map_err(draw_error)?;
    chart
        .draw_series(bars.iter().enumerate().map(|(idx, (_, value))| {
            Text::new(
                value_label(*value),
                (SegmentValue::CenterOf(idx as u32), *value),
                ("sans-serif", 16),
            )
        }))
        .map_err(draw_error)?;
    root.present().map_err(draw_error)?;
    Ok(())
}

fn line_chart(path: &Path, title: &str, y_desc: &str, points: &[(String, f64)]) -> Result<()> {
    let root = SVGBackend::new(path, CHART_SIZE).into_drawing_area();
    root.fill(&WHITE).map_err(draw_error)?;
    let segments = points.len().max(1) as u32;
    let mut chart = ChartBuilder::on(&root)
        .caption(title, ("sans-serif", 32))
        .margin(20)
        .x_label_area_size(80)
        .y_label_area_size(100)
        .build_cartesian_2d(
            (0u32..segments).into_segmented(),
            0f64..y_ceiling(points.iter().map(|(_, value)| *value)),
        )
        .map_err(draw_error)?;
    chart
        .configure_mesh()
        .x_labels(points.len().max(1))
        .x_label_formatter(&|segment| segment_label(segment, points))
        .x_desc("Month")
        .y_desc(y_desc)
        .draw()
        .map_err(draw_error)?;
    let coords = points
        .iter()
        .enumerate()
        .map(|(idx, (_, value))| (SegmentValue::CenterOf(idx as u32), *value))
        .collect::<Vec<_>>();
    chart
        .draw_series(LineSeries::new(coords.iter().cloned(), RED.stroke_width(4)))
        .map_err(draw_error)?;
    chart
        .draw_series(
            coords
                .iter()
                .map(|coord| Circle::new(coord.clone(), 6, RED.filled())),
        )
        .map_err(draw_error)?;
    chart
        .draw_series(coords.iter().map(|(segment, value)| {
            Text::new(
                format_dollars(from_f64(*value)),
                (segment.clone(), *value),
                ("sans-serif", 14),
            )
        }))
        .map_err(draw_error)?;
    root.present().map_err(draw_error)?;
    Ok(())
}

fn text_panel(path: &Path, title: &str, lines: &[String]) -> Result<()> {
    let height = 140 + 34 * lines.len() as u32;
    let root = SVGBackend::new(path, (CHART_SIZE.0, height)).into_drawing_area();
    root.fill(&WHITE).map_err(draw_error)?;
    let body = root
        .titled(title, ("sans-serif", 32))
        .map_err(draw_error)?;
    for (idx, line) in lines.iter().enumerate() {
        body.draw(&Text::new(
            line.clone(),
            (40, 20 + 34 * idx as i32),
            ("monospace", 20),
        ))
        .map_err(draw_error)?;
    }
    root.present().map_err(draw_error)?;
    Ok(())
}

fn segment_label(segment: &SegmentValue<u32>, labels: &[(String, f64)]) -> String {
    match segment {
        SegmentValue::CenterOf(idx) => labels
            .get(*idx as usize)
            .map(|(label, _)| label.clone())
            .unwrap_or_default(),
        _ => String::new(),
    }
}

fn y_ceiling(values: impl Iterator<Item = f64>) -> f64 {
    let max = values.fold(0f64, f64::max);
    if max > 0.0 { max * 1.15 } else { 1.0 }
}

fn to_f64(value: Decimal) -> f64 {
    value.to_f64().unwrap_or_default()
}

fn from_f64(value: f64) -> Decimal {
    Decimal::from_f64_retain(value).unwrap_or_default()
}

fn draw_error<E: std::fmt::Display>(err: E) -> anyhow::Error {
    anyhow!("Rendering chart failed: {err}")
}
