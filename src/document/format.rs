//! Value formatting for resolved placeholders.
//!
//! Currency and date conventions are carried by [`FormatConfig`] and handed to the
//! resolver explicitly, so two renders with different settings never interfere.

use chrono::NaiveDate;
use std::fmt::Write;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::Deserialize;

/// How the integer part of an amount is grouped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DigitGrouping {
    /// `12,34,56,789`
    Indian,
    /// `123,456,789`
    Western,
}

impl DigitGrouping {
    pub fn from_str(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "indian" | "en-in" => Some(Self::Indian),
            "western" | "international" | "en-us" => Some(Self::Western),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormatConfig {
    pub currency_symbol: String,
    pub grouping: DigitGrouping,
    /// chrono format string for short dates.
    pub date_format: String,
}

impl Default for FormatConfig {
    fn default() -> Self {
        Self {
            currency_symbol: "₹".to_string(),
            grouping: DigitGrouping::Indian,
            date_format: "%d/%m/%Y".to_string(),
        }
    }
}

impl FormatConfig {
    /// Amount with exactly two decimals, e.g. `₹1,000.00`.
    pub fn amount(&self, value: Decimal) -> String {
        self.currency(value, 2)
    }

    /// Price without decimals when whole (`₹5,00,000`), otherwise two decimals.
    pub fn price(&self, value: Decimal) -> String {
        if value.fract().is_zero() {
            self.currency(value, 0)
        } else {
            self.currency(value, 2)
        }
    }

    /// Date in the configured pattern. An unusable pattern falls back to ISO 8601.
    pub fn date(&self, value: NaiveDate) -> String {
        let mut out = String::new();
        if write!(out, "{}", value.format(&self.date_format)).is_err() {
            log::warn!("Unusable date format {:?}, using ISO 8601", self.date_format);
            return value.format("%Y-%m-%d").to_string();
        }
        out
    }

    fn currency(&self, value: Decimal, decimals: u32) -> String {
        let rounded = value.round_dp_with_strategy(decimals, RoundingStrategy::MidpointAwayFromZero);
        let sign = if rounded.is_sign_negative() && !rounded.is_zero() {
            "-"
        } else {
            ""
        };
        let digits = format!("{:.*}", decimals as usize, rounded.abs());
        let (int_part, frac_part) = match digits.split_once('.') {
            Some((int_part, frac_part)) => (int_part, Some(frac_part)),
            None => (digits.as_str(), None),
        };

        let mut out = format!(
            "{sign}{}{}",
            self.currency_symbol,
            group_digits(int_part, self.grouping)
        );
        if let Some(frac) = frac_part {
            out.push('.');
            out.push_str(frac);
        }
        out
    }
}

/// Insert thousands separators into a run of ASCII digits.
pub fn group_digits(digits: &str, grouping: DigitGrouping) -> String {
    if digits.len() <= 3 {
        return digits.to_string();
    }

    let (head, tail) = digits.split_at(digits.len() - 3);
    let step = match grouping {
        DigitGrouping::Indian => 2,
        DigitGrouping::Western => 3,
    };

    let mut groups = Vec::new();
    let mut end = head.len();
    while end > 0 {
        let start = end.saturating_sub(step);
        groups.push(&head[start..end]);
        end = start;
    }
    groups.reverse();

    format!("{},{}", groups.join(","), tail)
}

/// Decimal without trailing zeros, e.g. `12.50` -> `12.5`.
pub fn plain_number(value: Decimal) -> String {
    value.normalize().to_string()
}
