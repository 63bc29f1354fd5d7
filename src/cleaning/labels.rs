//! Column label normalization
//!
//! Raw meter exports carry labels like "U L1 avg. 10 min [V]" plus
//! auto-generated placeholders for blank header cells. Normalization makes
//! labels safe for substring-based channel resolution: punctuation stripped,
//! whitespace collapsed to single underscores, lower-cased.
use regex::Regex;
use std::sync::OnceLock;

use crate::table::Table;

/// Normalize a single raw label.
///
/// "THD U L1 avg. 10 min [%]" becomes "thd_u_l1_avg_10_min".
pub fn normalize_label(raw: &str) -> String {
    static STRIP: OnceLock<Regex> = OnceLock::new();
    static SPACES: OnceLock<Regex> = OnceLock::new();
    let strip = STRIP.get_or_init(|| Regex::new(r"[^\w\s]").unwrap());
    let spaces = SPACES.get_or_init(|| Regex::new(r"\s+").unwrap());

    let stripped = strip.replace_all(raw, "");
    let trimmed = stripped.trim();
    spaces.replace_all(trimmed, "_").to_lowercase()
}

/// Placeholder labels produced by spreadsheet readers for blank header cells.
pub fn is_placeholder(normalized: &str) -> bool {
    normalized.starts_with("unnamed")
}

/// Rewrite every label to its normalized form, drop placeholder columns,
/// and disambiguate collisions with `_2`, `_3`, ... suffixes so the
/// normalized table has unique labels.
pub fn normalize_labels(table: &Table) -> Table {
    let normalized: Vec<String> = table.labels().map(normalize_label).collect();
    let relabelled = table.with_labels(normalized);
    let pruned = relabelled.retain_columns(|col| !is_placeholder(&col.label));

    let mut unique = Vec::with_capacity(pruned.column_count());
    for col in pruned.columns() {
        let mut candidate = col.label.clone();
        let mut n = 1;
        while unique.contains(&candidate) {
            n += 1;
            candidate = format!("{}_{}", col.label, n);
        }
        unique.push(candidate);
    }
    pruned.with_labels(unique)
}
