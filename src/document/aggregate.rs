//! Aggregate calculator for `TOTAL_<COLLECTION>_AMOUNT` and `<COLLECTION>_COUNT`.

use rust_decimal::Decimal;

use super::catalog::Collection;
use super::format::FormatConfig;
use super::scanner::AggregateKind;

/// Sum of the AMOUNT column. Elements without an amount count as zero.
pub fn sum_amount(collection: &Collection) -> Decimal {
    let Some(column) = collection.kind.amount_column() else {
        return Decimal::ZERO;
    };
    collection
        .rows
        .iter()
        .filter_map(|row| row.get(column).and_then(|v| v.as_decimal()))
        .sum()
}

pub fn aggregate(kind: AggregateKind, collection: &Collection, format: &FormatConfig) -> String {
    match kind {
        AggregateKind::Sum => format.amount(sum_amount(collection)),
        AggregateKind::Count => collection.len().to_string(),
    }
}
