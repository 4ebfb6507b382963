//! Table generator for `{{<COLLECTION>_TABLE}}` placeholders.

use super::catalog::Collection;
use super::format::FormatConfig;
use super::markup::escape_cell;

/// A collection rendered as text cells, header first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedTable {
    pub header: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl GeneratedTable {
    /// Inline pipe-table markup, one line per row, understood by the markup formatter.
    pub fn to_markup(&self) -> String {
        std::iter::once(&self.header)
            .chain(self.rows.iter())
            .map(|cells| markup_row(cells))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

fn markup_row(cells: &[String]) -> String {
    let inner = cells
        .iter()
        .map(|c| escape_cell(c))
        .collect::<Vec<_>>()
        .join(" | ");
    format!("| {} |", inner)
}

/// Expand a collection into its fixed column set, one row per element in order.
///
/// An empty collection still yields the header row.
pub fn expand_table(collection: &Collection, format: &FormatConfig) -> GeneratedTable {
    let columns: Vec<usize> = collection
        .kind
        .columns()
        .iter()
        .enumerate()
        .filter(|(_, col)| col.in_table)
        .map(|(i, _)| i)
        .collect();

    let header = columns
        .iter()
        .map(|&i| collection.kind.columns()[i].header.to_string())
        .collect();

    let rows = collection
        .rows
        .iter()
        .map(|row| {
            columns
                .iter()
                .map(|&i| row.get(i).map(|v| v.display(format)).unwrap_or_default())
                .collect()
        })
        .collect();

    GeneratedTable { header, rows }
}
