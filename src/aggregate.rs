//! Read-only reductions over the cleaned record set.
//!
//! Each function here is independent of the others; [`summarize`] just
//! runs all of them with one [`ReportConfig`].

use std::collections::{HashMap, HashSet};

use chrono::{Datelike, NaiveDate};
use itertools::Itertools;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::Serialize;

use crate::{config::ReportConfig, data::format_dollars, record::OrderRecord};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthBucket {
    pub label: String,
    pub year: i32,
    pub month: u32,
    pub first_date: NaiveDate,
    pub total: Decimal,
    pub orders: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupTotal {
    pub key: String,
    pub total: Decimal,
    pub orders: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LargeOrder {
    pub order_date: NaiveDate,
    pub total_price: Decimal,
    pub category: String,
    pub item_description: String,
    pub shipping_address: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SizeBand {
    pub label: String,
    pub lower: Decimal,
    /// Exclusive; `None` for the open-ended top band.
    pub upper: Option<Decimal>,
    pub orders: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScalarStats {
    pub total_spent: Decimal,
    pub order_count: usize,
    pub mean_order: Option<Decimal>,
    pub largest_order: Option<Decimal>,
    pub distinct_addresses: usize,
    pub first_order: Option<NaiveDate>,
    pub last_order: Option<NaiveDate>,
    pub large_threshold: Decimal,
    pub orders_over_large: usize,
    pub very_large_threshold: Decimal,
    pub orders_over_very_large: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Summary {
    pub grand_total: Decimal,
    pub order_count: usize,
    pub monthly: Vec<MonthBucket>,
    pub categories: Vec<GroupTotal>,
    pub top_categories: Vec<GroupTotal>,
    pub large_orders: Vec<LargeOrder>,
    pub order_sizes: Vec<SizeBand>,
    pub addresses: Vec<GroupTotal>,
    pub stats: ScalarStats,
}

pub fn summarize(records: &[OrderRecord], config: &ReportConfig) -> Summary {
    let categories = category_totals(records);
    let top_categories = categories
        .iter()
        .take(config.top_categories)
        .cloned()
        .collect();
    Summary {
        grand_total: grand_total(records),
        order_count: records.len(),
        monthly: monthly_totals(records),
        categories,
        top_categories,
        large_orders: large_orders(
            records,
            config.large_order_threshold,
            config.top_large_orders,
        ),
        order_sizes: order_size_histogram(records, &config.band_edges),
        addresses: address_totals(records),
        stats: scalar_stats(
            records,
            config.large_order_threshold,
            config.very_large_order_threshold,
        ),
    }
}

pub fn grand_total(records: &[OrderRecord]) -> Decimal {
    records.iter().map(|record| record.total_price).sum()
}

/// Calendar-month buckets ordered by each bucket's earliest order date.
pub fn monthly_totals(records: &[OrderRecord]) -> Vec<MonthBucket> {
    let mut buckets: HashMap<(i32, u32), MonthBucket> = HashMap::new();
    for record in records {
        let date = record.order_date;
        let bucket = buckets
            .entry((date.year(), date.month()))
            .or_insert_with(|| MonthBucket {
                label: date.format("%b %Y").to_string(),
                year: date.year(),
                month: date.month(),
                first_date: date,
                total: Decimal::ZERO,
                orders: 0,
            });
        bucket.first_date = bucket.first_date.min(date);
        bucket.total += record.total_price;
        bucket.orders += 1;
    }
    buckets
        .into_values()
        .sorted_by_key(|bucket| bucket.first_date)
        .collect()
}

/// Per-category totals, largest first.
pub fn category_totals(records: &[OrderRecord]) -> Vec<GroupTotal> {
    group_totals(records, |record| record.category.as_str())
}

/// Per-address totals, largest first.
pub fn address_totals(records: &[OrderRecord]) -> Vec<GroupTotal> {
    group_totals(records, |record| record.shipping_address.as_str())
}

fn group_totals<'a, F>(records: &'a [OrderRecord], key: F) -> Vec<GroupTotal>
where
    F: Fn(&'a OrderRecord) -> &'a str,
{
    let mut groups: HashMap<&str, (Decimal, usize)> = HashMap::new();
    for record in records {
        let entry = groups.entry(key(record)).or_insert((Decimal::ZERO, 0));
        entry.0 += record.total_price;
        entry.1 += 1;
    }
    groups
        .into_iter()
        .map(|(key, (total, orders))| GroupTotal {
            key: key.to_string(),
            total,
            orders,
        })
        .sorted_by(|a, b| b.total.cmp(&a.total).then_with(|| a.key.cmp(&b.key)))
        .collect()
}

/// Up to `limit` orders strictly above `threshold`, largest first.
pub fn large_orders(records: &[OrderRecord], threshold: Decimal, limit: usize) -> Vec<LargeOrder> {
    let mut large = records
        .iter()
        .filter(|record| record.total_price > threshold)
        .collect::<Vec<_>>();
    large.sort_by(|a, b| b.total_price.cmp(&a.total_price));
    large
        .into_iter()
        .take(limit)
        .map(|record| LargeOrder {
            order_date: record.order_date,
            total_price: record.total_price,
            category: record.category.clone(),
            item_description: record.item_description.clone(),
            shipping_address: record.shipping_address.clone(),
        })
        .collect()
}

/// Counts orders per half-open band `[edges[i], edges[i + 1])`.
pub fn order_size_histogram(records: &[OrderRecord], edges: &[Decimal]) -> Vec<SizeBand> {
    let mut bands = edges
        .iter()
        .enumerate()
        .map(|(idx, lower)| {
            let upper = edges.get(idx + 1).copied();
            SizeBand {
                label: band_label(*lower, upper),
                lower: *lower,
                upper,
                orders: 0,
            }
        })
        .collect::<Vec<_>>();
    for record in records {
        let slot = edges
            .iter()
            .rposition(|edge| record.total_price >= *edge)
            .unwrap_or(0);
        if let Some(band) = bands.get_mut(slot) {
            band.orders += 1;
        }
    }
    bands
}

fn band_label(lower: Decimal, upper: Option<Decimal>) -> String {
    match upper {
        None => format!("Over {}", format_dollars(lower)),
        Some(upper) if lower.is_zero() => format!("Under {}", format_dollars(upper)),
        Some(upper) => format!("{}-{}", format_dollars(lower), format_dollars(upper)),
    }
}

pub fn scalar_stats(
    records: &[OrderRecord],
    large_threshold: Decimal,
    very_large_threshold: Decimal,
) -> ScalarStats {
    let total_spent = grand_total(records);
    let mean_order = (!records.is_empty()).then(|| {
        (total_spent / Decimal::from(records.len()))
            .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
    });
    let distinct_addresses = records
        .iter()
        .map(|record| record.shipping_address.as_str())
        .collect::<HashSet<_>>()
        .len();
    ScalarStats {
        total_spent,
        order_count: records.len(),
        mean_order,
        largest_order: records.iter().map(|record| record.total_price).max(),
        distinct_addresses,
        first_order: records.iter().map(|record| record.order_date).min(),
        last_order: records.iter().map(|record| record.order_date).max(),
        large_threshold,
        orders_over_large: records
            .iter()
            .filter(|record| record.total_price > large_threshold)
            .count(),
        very_large_threshold,
        orders_over_very_large: records
            .iter()
            .filter(|record| record.total_price > very_large_threshold)
            .count(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(date: (i32, u32, u32), address: &str, category: &str, total: i64) -> OrderRecord {
        OrderRecord {
            order_date: NaiveDate::from_ymd_opt(date.0, date.1, date.2).unwrap(),
            shipping_address: address.to_string(),
            item_description: format!("{category} item"),
            category: category.to_string(),
            quantity: Some(1),
            unit_price: None,
            total_price: Decimal::from(total),
        }
    }

    fn sample() -> Vec<OrderRecord> {
        vec![
            record((2025, 1, 15), "A", "Laptop", 1200),
            record((2024, 12, 3), "B", "Cable", 20),
            record((2025, 1, 2), "A", "Monitor", 600),
            record((2025, 2, 1), "C", "Cable", 50),
            record((2024, 12, 20), "B", "Laptop", 500),
        ]
    }

    #[test]
    fn monthly_totals_are_chronological_across_years() {
        let months = monthly_totals(&sample());
        let labels: Vec<&str> = months.iter().map(|m| m.label.as_str()).collect();
        assert_eq!(labels, vec!["Dec 2024", "Jan 2025", "Feb 2025"]);
        assert_eq!(months[0].total, Decimal::from(520));
        assert_eq!(months[0].first_date, NaiveDate::from_ymd_opt(2024, 12, 3).unwrap());
        assert_eq!(months[1].orders, 2);
        let monthly_sum: Decimal = months.iter().map(|m| m.total).sum();
        assert_eq!(monthly_sum, grand_total(&sample()));
    }

    #[test]
    fn category_totals_sort_descending_with_name_ties() {
        let mut records = sample();
        records.push(record((2025, 2, 2), "C", "Mouse", 70));
        let totals = category_totals(&records);
        let keys: Vec<&str> = totals.iter().map(|t| t.key.as_str()).collect();
        assert_eq!(keys, vec!["Laptop", "Monitor", "Cable", "Mouse"]);
        assert_eq!(totals[2].total, Decimal::from(70));
    }

    #[test]
    fn large_orders_use_strict_threshold_and_limit() {
        let large = large_orders(&sample(), Decimal::from(500), 10);
        let totals: Vec<Decimal> = large.iter().map(|o| o.total_price).collect();
        assert_eq!(totals, vec![Decimal::from(1200), Decimal::from(600)]);
        assert_eq!(large_orders(&sample(), Decimal::from(500), 1).len(), 1);
    }

    #[test]
    fn histogram_bands_are_half_open() {
        let edges: Vec<Decimal> = [0, 50, 200, 500, 1000].into_iter().map(Decimal::from).collect();
        let bands = order_size_histogram(&sample(), &edges);
        let counts: Vec<usize> = bands.iter().map(|b| b.orders).collect();
        // 20 | 50 | - | 500, 600 | 1200
        assert_eq!(counts, vec![1, 1, 0, 2, 1]);
        let labels: Vec<&str> = bands.iter().map(|b| b.label.as_str()).collect();
        assert_eq!(
            labels,
            vec!["Under $50", "$50-$200", "$200-$500", "$500-$1,000", "Over $1,000"]
        );
        assert_eq!(counts.iter().sum::<usize>(), sample().len());
    }

    #[test]
    fn histogram_edge_values_open_the_next_band() {
        let edges: Vec<Decimal> = [0, 50, 200, 500, 1000].into_iter().map(Decimal::from).collect();
        let mut records = sample();
        records.push(record((2025, 2, 3), "C", "Desk", 200));
        records.push(record((2025, 2, 4), "C", "Desk", 1000));
        records.push(record((2025, 2, 5), "C", "Desk", 0));
        let bands = order_size_histogram(&records, &edges);
        let counts: Vec<usize> = bands.iter().map(|b| b.orders).collect();
        // 0, 20 | 50 | 200 | 500, 600 | 1000, 1200
        assert_eq!(counts, vec![2, 1, 1, 2, 2]);
        assert_eq!(bands[4].label, "Over $1,000");
        assert_eq!(bands[4].upper, None);
    }

    #[test]
    fn sums_of_largest_accepted_amounts_stay_finite() {
        let mut records = sample();
        for record in records.iter_mut().take(2) {
            record.total_price = crate::data::MAX_CURRENCY_MAGNITUDE;
        }
        let summary = summarize(&records, &ReportConfig::default());
        assert_eq!(
            summary.grand_total,
            crate::data::MAX_CURRENCY_MAGNITUDE * Decimal::from(2) + Decimal::from(1150)
        );
    }

    #[test]
    fn scalar_stats_cover_thresholds_and_range() {
        let stats = scalar_stats(&sample(), Decimal::from(500), Decimal::from(1000));
        assert_eq!(stats.total_spent, Decimal::from(2370));
        assert_eq!(stats.mean_order, Some(Decimal::from(474)));
        assert_eq!(stats.largest_order, Some(Decimal::from(1200)));
        assert_eq!(stats.distinct_addresses, 3);
        assert_eq!(stats.first_order, NaiveDate::from_ymd_opt(2024, 12, 3));
        assert_eq!(stats.last_order, NaiveDate::from_ymd_opt(2025, 2, 1));
        assert_eq!(stats.orders_over_large, 2);
        assert_eq!(stats.orders_over_very_large, 1);
    }

    #[test]
    fn empty_input_yields_empty_summary() {
        let summary = summarize(&[], &ReportConfig::default());
        assert_eq!(summary.grand_total, Decimal::ZERO);
        assert!(summary.monthly.is_empty());
        assert_eq!(summary.stats.mean_order, None);
        assert_eq!(summary.order_sizes.len(), 5);
    }

    #[test]
    fn summarize_truncates_top_categories() {
        let config = ReportConfig {
            top_categories: 2,
            ..ReportConfig::default()
        };
        let summary = summarize(&sample(), &config);
        assert_eq!(summary.categories.len(), 3);
        assert_eq!(summary.top_categories.len(), 2);
        assert_eq!(summary.addresses[0].key, "A");
    }
}
