//! Shipping-address normalization.
//!
//! An [`AddressNormalizer`] rewrites one free-text address through a fixed
//! sequence of rules. The order is load-bearing: token matching is
//! case-sensitive so upper-casing runs first, and the unit-designator pass
//! relies on comma spacing already being canonical.
//!
//! 1. upper-case
//! 2. collapse whitespace runs to one space
//! 3. canonical `", "` comma spacing
//! 4. unit designators (`SUITE` -> `STE`, `APARTMENT` -> `APT`)
//! 5. targeted corrections from an [`AddressCorrection`] table
//! 6. `, <state>` -> `, <STATE>` for two-letter USPS codes
//! 7. trim surrounding whitespace and dangling commas
//!
//! Null stays null: [`AddressNormalizer::normalize`] maps `None` (and blank
//! text, which is how a CSV spells null) to `None`. Text left empty once dangling
//! commas are trimmed maps to `None` too.

use std::borrow::Cow;

use anyhow::{Context, Result};
use regex::Regex;
use serde::{Deserialize, Serialize};

/// One known-bad spelling and the single canonical string it becomes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddressCorrection {
    /// Regular expression matched case-insensitively against upper-cased text.
    pub pattern: String,
    pub replacement: String,
}

impl AddressCorrection {
    pub fn new(pattern: impl Into<String>, replacement: impl Into<String>) -> Self {
        Self {
            pattern: pattern.into(),
            replacement: replacement.into(),
        }
    }

    /// Corrections shipped with the tool.
    pub fn builtin() -> Vec<AddressCorrection> {
        vec![AddressCorrection::new(
            r"3700 BEACON AVE\s*(?:APT\s*140|A\s*140|140)",
            "3700 BEACON AVE APT 140",
        )]
    }
}

const UNIT_DESIGNATORS: &[(&str, &str)] = &[
    (r"\bAPARTMENT\b", "APT"),
    (r"\bSUITE\b", "STE"),
];

const STATE_CODES: &[&str] = &[
    "AL", "AK", "AZ", "AR", "CA", "CO", "CT", "DE", "DC", "FL", "GA", "HI", "ID", "IL", "IN",
    "IA", "KS", "KY", "LA", "ME", "MD", "MA", "MI", "MN", "MS", "MO", "MT", "NE", "NV", "NH",
    "NJ", "NM", "NY", "NC", "ND", "OH", "OK", "OR", "PA", "RI", "SC", "SD", "TN", "TX", "UT",
    "VT", "VA", "WA", "WV", "WI", "WY", "AS", "GU", "MP", "PR", "VI",
];

struct CompiledCorrection {
    regex: Regex,
    replacement: String,
}

pub struct AddressNormalizer {
    whitespace: Regex,
    comma: Regex,
    units: Vec<(Regex, &'static str)>,
    corrections: Vec<CompiledCorrection>,
    state: Regex,
}

impl AddressNormalizer {
    /// Builds a normalizer with the built-in correction table.
    pub fn new() -> Result<Self> {
        Self::with_corrections(&AddressCorrection::builtin())
    }

    pub fn with_corrections(corrections: &[AddressCorrection]) -> Result<Self> {
        let units = UNIT_DESIGNATORS
            .iter()
            .map(|(pattern, canonical)| Ok((Regex::new(pattern)?, *canonical)))
            .collect::<Result<Vec<_>>>()?;
        let corrections = corrections
            .iter()
            .map(|correction| {
                let regex = Regex::new(&format!("(?i){}", correction.pattern)).with_context(
                    || format!("Compiling address correction '{}'", correction.pattern),
                )?;
                Ok(CompiledCorrection {
                    regex,
                    replacement: correction.replacement.clone(),
                })
            })
            .collect::<Result<Vec<_>>>()?;
        let state = Regex::new(&format!(r"(?i),\s*({})\b", STATE_CODES.join("|")))?;
        Ok(Self {
            whitespace: Regex::new(r"\s+")?,
            comma: Regex::new(r"\s*(?:,\s*)+")?,
            units,
            corrections,
            state,
        })
    }

    pub fn correction_count(&self) -> usize {
        self.corrections.len()
    }

    /// Normalizes an optional address. Input that is blank, or only commas
    /// and whitespace, is treated as null.
    pub fn normalize(&self, address: Option<&str>) -> Option<String> {
        let normalized = self.normalize_str(address?);
        (!normalized.is_empty()).then_some(normalized)
    }

    /// Applies every rule to a present address.
    pub fn normalize_str(&self, address: &str) -> String {
        let upper = address.to_uppercase();
        let collapsed = self.whitespace.replace_all(&upper, " ");
        let mut text: String = self.comma.replace_all(&collapsed, ", ").into_owned();
        for (regex, canonical) in &self.units {
            text = replace_owned(text, regex, canonical);
        }
        for correction in &self.corrections {
            text = replace_owned(text, &correction.regex, &correction.replacement);
        }
        text = self
            .state
            .replace_all(&text, |caps: &regex::Captures| {
                format!(", {}", caps[1].to_ascii_uppercase())
            })
            .into_owned();
        text.trim_matches(|ch: char| ch == ',' || ch.is_whitespace())
            .to_string()
    }
}

fn replace_owned(text: String, regex: &Regex, replacement: &str) -> String {
    match regex.replace_all(&text, regex::NoExpand(replacement)) {
        Cow::Borrowed(_) => text,
        Cow::Owned(rewritten) => rewritten,
    }
}

/// Checks the shape every normalized address must have.
pub fn is_canonical(address: &str) -> bool {
    if address.contains("  ") || address.contains(" ,") {
        return false;
    }
    let bytes = address.as_bytes();
    for (idx, byte) in bytes.iter().enumerate() {
        if *byte == b',' {
            let one_space = bytes.get(idx + 1) == Some(&b' ');
            let not_two = bytes.get(idx + 2) != Some(&b' ');
            if !(one_space && not_two) {
                return false;
            }
        }
    }
    address == address.to_uppercase()
}
