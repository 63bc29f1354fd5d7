//! File-type-specific validity rules, applied last in the pipeline
//!
//! Trend exports are sorted chronologically and stripped of physically
//! impossible readings; harmonic exports get order, amplitude, and phase
//! sanity rules. All rules are data-quality filters: they drop or rewrite
//! rows, they never fail.
use chrono::{NaiveDate, NaiveDateTime};
use tracing::debug;

use crate::config::FileType;
use crate::table::{Cell, Table};

pub fn apply(table: &Table, file_type: &FileType) -> Table {
    match file_type {
        FileType::Tendencia => clean_trend(table),
        FileType::ArmonicosPotencia => clean_power_harmonics(table),
        FileType::ArmonicosVoltaje => clean_voltage_harmonics(table),
        FileType::Other(_) => table.clone(),
    }
}

fn clean_trend(table: &Table) -> Table {
    let sorted = sort_by_timestamp(table);

    // AC RMS voltage cannot be negative; rows with a present negative
    // reading in any volt column are measurement glitches.
    drop_rows_where(&sorted, |label| label.contains("volt"), |v| v < 0.0)
}

fn clean_power_harmonics(table: &Table) -> Table {
    let ordered = enforce_harmonic_orders(table);
    wrap_phase_columns(&ordered)
}

fn clean_voltage_harmonics(table: &Table) -> Table {
    let ordered = enforce_harmonic_orders(table);
    let positive = drop_rows_where(
        &ordered,
        |label| label.contains("amplitude") || label.contains("magnitude"),
        |v| v < 0.0,
    );
    wrap_phase_columns(&positive)
}

/// Harmonic order must be a positive integer: non-positive rows are
/// dropped, the survivors rounded to the nearest integer.
fn enforce_harmonic_orders(table: &Table) -> Table {
    let filtered = drop_rows_where(table, |label| label.contains("harmonic"), |v| v <= 0.0);
    let targets: Vec<String> = filtered
        .labels()
        .filter(|l| l.contains("harmonic"))
        .map(str::to_string)
        .collect();
    let mut out = filtered;
    for label in targets {
        if out.column(&label).map(|c| c.is_numeric()).unwrap_or(false) {
            out = out.map_column(&label, |cell| match cell {
                Cell::Number(n) => Cell::Number(n.round()),
                other => other.clone(),
            });
        }
    }
    out
}

/// Wrap phase/angle values into [-180, 180) degrees.
fn wrap_phase_columns(table: &Table) -> Table {
    let targets: Vec<String> = table
        .labels()
        .filter(|l| l.contains("phase") || l.contains("angle"))
        .map(str::to_string)
        .collect();
    let mut out = table.clone();
    for label in targets {
        if out.column(&label).map(|c| c.is_numeric()).unwrap_or(false) {
            out = out.map_column(&label, |cell| match cell {
                Cell::Number(n) => Cell::Number((n + 180.0).rem_euclid(360.0) - 180.0),
                other => other.clone(),
            });
        }
    }
    out
}

/// Drop rows where any matching numeric column holds a present value the
/// predicate rejects. Missing cells survive.
fn drop_rows_where(
    table: &Table,
    label_matches: impl Fn(&str) -> bool,
    reject: impl Fn(f64) -> bool,
) -> Table {
    let targets: Vec<&str> = table
        .labels()
        .filter(|l| label_matches(l))
        .collect();
    let numeric_targets: Vec<String> = targets
        .into_iter()
        .filter(|l| table.column(l).map(|c| c.is_numeric()).unwrap_or(false))
        .map(str::to_string)
        .collect();
    if numeric_targets.is_empty() {
        return table.clone();
    }

    let rows = table.row_count();
    let keep: Vec<bool> = (0..rows)
        .map(|row| {
            numeric_targets.iter().all(|label| {
                match table.cell(row, label).and_then(Cell::as_number) {
                    Some(v) => !reject(v),
                    None => true,
                }
            })
        })
        .collect();
    table.retain_rows(&keep)
}

/// Sort trend rows chronologically by the first time/date column.
///
/// Sort keys come from numeric cells (spreadsheet date serials) or from a
/// handful of common timestamp text formats. Rows whose key cannot be
/// parsed keep their relative order at the end; if nothing parses the
/// table is returned unchanged.
fn sort_by_timestamp(table: &Table) -> Table {
    let Some(ts_label) = table
        .labels()
        .find(|l| l.contains("time") || l.contains("date"))
        .map(str::to_string)
    else {
        return table.clone();
    };

    let Some(column) = table.column(&ts_label) else {
        return table.clone();
    };
    let keys: Vec<Option<f64>> = column.cells.iter().map(timestamp_key).collect();
    if keys.iter().all(Option::is_none) {
        debug!("timestamp column '{}' unparseable, keeping row order", ts_label);
        return table.clone();
    }

    let mut order: Vec<usize> = (0..table.row_count()).collect();
    // Stable: unparseable keys sink to the end without reshuffling.
    order.sort_by(|&a, &b| match (keys[a], keys[b]) {
        (Some(x), Some(y)) => x.partial_cmp(&y).unwrap_or(std::cmp::Ordering::Equal),
        (Some(_), None) => std::cmp::Ordering::Less,
        (None, Some(_)) => std::cmp::Ordering::Greater,
        (None, None) => std::cmp::Ordering::Equal,
    });
    table.reorder_rows(&order)
}

fn timestamp_key(cell: &Cell) -> Option<f64> {
    match cell {
        Cell::Number(n) => Some(*n),
        Cell::Empty => None,
        Cell::Text(s) => parse_timestamp_text(s.trim()),
    }
}

fn parse_timestamp_text(s: &str) -> Option<f64> {
    const DATETIME_FORMATS: &[&str] = &[
        "%Y-%m-%d %H:%M:%S",
        "%Y-%m-%dT%H:%M:%S",
        "%d/%m/%Y %H:%M:%S",
        "%d/%m/%Y %H:%M",
    ];
    for format in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, format) {
            return Some(dt.and_utc().timestamp() as f64);
        }
    }
    const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%d/%m/%Y"];
    for format in DATE_FORMATS {
        if let Ok(d) = NaiveDate::parse_from_str(s, format) {
            return Some(d.and_hms_opt(0, 0, 0)?.and_utc().timestamp() as f64);
        }
    }
    None
}
