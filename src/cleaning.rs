//! Table Normalizer
//!
//! Turns a raw spreadsheet extract into a normalized table ready for
//! compliance evaluation. The six stages run in a fixed order; each takes
//! an immutable table and returns a new one, so every stage is testable in
//! isolation and the ordering (e.g. duplicates removed after gap filling)
//! is explicit. Malformed data never makes the pipeline fail: unparseable
//! cells become gaps and an empty input yields an empty output.
pub mod file_rules;
pub mod gaps;
pub mod labels;
pub mod numeric;

use tracing::debug;

use crate::config::{FileType, GapFill};
use crate::table::Table;

/// Run the full cleaning pipeline.
pub fn clean(table: &Table, file_type: &FileType, gap_fill: GapFill) -> Table {
    if table.is_empty() {
        return Table::new();
    }

    let labelled = labels::normalize_labels(table);
    let pruned = prune_blank(&labelled);
    let coerced = numeric::coerce_numeric_columns(&pruned, file_type);
    let filled = gaps::fill_gaps(&coerced, gap_fill);
    let deduped = filled.dedup_rows();
    let cleaned = file_rules::apply(&deduped, file_type);

    debug!(
        rows_in = table.row_count(),
        rows_out = cleaned.row_count(),
        cols_in = table.column_count(),
        cols_out = cleaned.column_count(),
        file_type = file_type.as_tag(),
        "cleaning pipeline complete"
    );
    cleaned
}

/// Drop columns, then rows, that are entirely missing or blank text.
fn prune_blank(table: &Table) -> Table {
    let cols_pruned = table.retain_columns(|col| !col.is_blank());
    let rows = cols_pruned.row_count();
    let keep: Vec<bool> = (0..rows)
        .map(|row| {
            cols_pruned
                .columns()
                .iter()
                .any(|col| !col.cells[row].is_blank())
        })
        .collect();
    cols_pruned.retain_rows(&keep)
}
