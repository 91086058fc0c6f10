//! Named policy constants and the optional YAML override layer.
//!
//! Every file name, threshold, band edge and display limit the pipeline
//! uses lives here so the review's policy decisions can be audited (and
//! tested) in one place. [`ReportConfig::default`] reproduces the constants;
//! `--config <file.yml>` overlays a partial YAML document on top of them.

use std::{fs, path::Path};

use anyhow::{Context, Result, anyhow, bail};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::address::AddressCorrection;

/// Source exports, merged in exactly this order.
pub const DEFAULT_SOURCES: &[&str] = &[
    "February2_simplified.csv",
    "BigMomma.csv",
    "EvenBetterJanuary.csv",
    "JanMar_corrected.csv",
];

pub const MERGED_OUTPUT: &str = "all_orders_combined.csv";
pub const STANDARDIZED_OUTPUT: &str = "all_orders_standardized.csv";
pub const REDUCED_OUTPUT: &str = "processed_orders.csv";
pub const SUMMARY_JSON_OUTPUT: &str = "report_summary.json";
pub const STATIC_SUMMARY_OUTPUT: &str = "Electronics.csv";

pub const TOTAL_SPENDING_CHART: &str = "1_total_spending.svg";
pub const MONTHLY_SPENDING_CHART: &str = "2_monthly_spending.svg";
pub const TOP_CATEGORIES_CHART: &str = "3_top_categories.svg";
pub const LARGE_ORDERS_CHART: &str = "4_large_orders.svg";
pub const ORDERS_PER_MONTH_CHART: &str = "5_orders_per_month.svg";
pub const ORDER_SIZES_CHART: &str = "6_order_sizes.svg";
pub const SHIPPING_ADDRESSES_CHART: &str = "7_shipping_addresses.svg";
pub const SUMMARY_CHART: &str = "8_summary.svg";

pub const COL_ORDER_DATE: &str = "Order Date";
pub const COL_SHIPPING_ADDRESS: &str = "Shipping Address";
pub const COL_ITEM_DESCRIPTION: &str = "Item Description";
pub const COL_CATEGORY: &str = "Category";
pub const COL_QUANTITY: &str = "Quantity";
pub const COL_UNIT_PRICE: &str = "Unit Price";
pub const COL_TOTAL_PRICE: &str = "Total Price";

pub const UNCATEGORIZED: &str = "Uncategorized";
pub const TOTAL_LABEL: &str = "TOTAL";

pub const LARGE_ORDER_THRESHOLD: i64 = 500;
pub const VERY_LARGE_ORDER_THRESHOLD: i64 = 1000;
/// Lower edges of the order-size bands; the last band is open-ended.
pub const BAND_EDGES: [i64; 5] = [0, 50, 200, 500, 1000];
pub const TOP_CATEGORIES: usize = 8;
pub const TOP_LARGE_ORDERS: usize = 10;

/// Runtime view of the reporting policy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ReportConfig {
    pub uncategorized_label: String,
    pub total_label: String,
    pub large_order_threshold: Decimal,
    pub very_large_order_threshold: Decimal,
    pub band_edges: Vec<Decimal>,
    pub top_categories: usize,
    pub top_large_orders: usize,
    pub corrections: Vec<AddressCorrection>,
    /// When set, `corrections` replaces the built-in table instead of extending it.
    pub replace_corrections: bool,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            uncategorized_label: UNCATEGORIZED.to_string(),
            total_label: TOTAL_LABEL.to_string(),
            large_order_threshold: Decimal::from(LARGE_ORDER_THRESHOLD),
            very_large_order_threshold: Decimal::from(VERY_LARGE_ORDER_THRESHOLD),
            band_edges: BAND_EDGES.iter().copied().map(Decimal::from).collect(),
            top_categories: TOP_CATEGORIES,
            top_large_orders: TOP_LARGE_ORDERS,
            corrections: Vec::new(),
            replace_corrections: false,
        }
    }
}

impl ReportConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path).with_context(|| format!("Reading config {path:?}"))?;
        let config = Self::from_yaml_str(&text).with_context(|| format!("Parsing config {path:?}"))?;
        Ok(config)
    }

    pub fn from_yaml_str(text: &str) -> Result<Self> {
        let config: ReportConfig = serde_yaml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Loads `path` when given, otherwise the built-in defaults.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::load(path),
            None => Ok(Self::default()),
        }
    }

    pub fn validate(&self) -> Result<()> {
        let Some(first) = self.band_edges.first() else {
            bail!("band_edges must not be empty");
        };
        if !first.is_zero() {
            return Err(anyhow!("band_edges must start at 0 (found {first})"));
        }
        if self.band_edges.windows(2).any(|pair| pair[0] >= pair[1]) {
            bail!("band_edges must be strictly increasing");
        }
        if self.large_order_threshold.is_sign_negative()
            || self.very_large_order_threshold.is_sign_negative()
        {
            bail!("order thresholds must be non-negative");
        }
        if self.top_categories == 0 || self.top_large_orders == 0 {
            bail!("top_categories and top_large_orders must be at least 1");
        }
        Ok(())
    }

    /// Correction table the normalizer should run with.
    pub fn effective_corrections(&self) -> Vec<AddressCorrection> {
        if self.replace_corrections {
            self.corrections.clone()
        } else {
            let mut table = AddressCorrection::builtin();
            table.extend(self.corrections.iter().cloned());
            table
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_named_constants() {
        let config = ReportConfig::default();
        assert_eq!(config.large_order_threshold, Decimal::from(500));
        assert_eq!(config.very_large_order_threshold, Decimal::from(1000));
        assert_eq!(config.band_edges.len(), 5);
        assert_eq!(config.top_categories, 8);
        assert_eq!(config.top_large_orders, 10);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn partial_yaml_keeps_remaining_defaults() {
        let config = ReportConfig::from_yaml_str("top_categories: 3\n").expect("parse");
        assert_eq!(config.top_categories, 3);
        assert_eq!(config.top_large_orders, TOP_LARGE_ORDERS);
        assert_eq!(config.total_label, TOTAL_LABEL);
    }

    #[test]
    fn extra_corrections_extend_builtin_table() {
        let yaml = "corrections:\n  - pattern: '12 ELM ST\\s*#\\s*5'\n    replacement: '12 ELM ST APT 5'\n";
        let config = ReportConfig::from_yaml_str(yaml).expect("parse");
        let table = config.effective_corrections();
        assert_eq!(table.len(), AddressCorrection::builtin().len() + 1);
        assert_eq!(table.last().unwrap().replacement, "12 ELM ST APT 5");
    }

    #[test]
    fn replace_corrections_drops_builtin_table() {
        let yaml = "replace_corrections: true\ncorrections: []\n";
        let config = ReportConfig::from_yaml_str(yaml).expect("parse");
        assert!(config.effective_corrections().is_empty());
    }

    #[test]
    fn rejects_unsorted_band_edges() {
        let err = ReportConfig::from_yaml_str("band_edges: [0, 200, 50]\n").unwrap_err();
        assert!(err.to_string().contains("strictly increasing"));
    }

    #[test]
    fn rejects_band_edges_not_starting_at_zero() {
        assert!(ReportConfig::from_yaml_str("band_edges: [10, 50]\n").is_err());
    }
}
