//! Gap handling for missing measurements
//!
//! Meters drop samples; the regulation analysis still wants evenly shaped
//! channels. Four strategies are supported, selected per run. Linear
//! interpolation (the default) only touches numeric columns: interior gaps
//! are interpolated between their neighbors, leading gaps stay missing, and
//! trailing gaps repeat the last known value.
use crate::config::GapFill;
use crate::table::{Cell, Column, Table};

pub fn fill_gaps(table: &Table, strategy: GapFill) -> Table {
    match strategy {
        GapFill::LinearInterpolation => interpolate_numeric(table),
        GapFill::ForwardFill => directional_fill(table, true),
        GapFill::BackwardFill => directional_fill(table, false),
        GapFill::Remove => drop_gap_rows(table),
    }
}

fn interpolate_numeric(table: &Table) -> Table {
    let columns = table
        .columns()
        .iter()
        .map(|col| {
            if col.is_numeric() {
                Column::new(col.label.clone(), interpolate_cells(&col.cells))
            } else {
                col.clone()
            }
        })
        .collect();
    Table::from_columns(columns)
}

fn interpolate_cells(cells: &[Cell]) -> Vec<Cell> {
    let mut out = cells.to_vec();
    let known: Vec<(usize, f64)> = cells
        .iter()
        .enumerate()
        .filter_map(|(i, c)| c.as_number().map(|n| (i, n)))
        .collect();
    if known.is_empty() {
        return out;
    }

    for window in known.windows(2) {
        let (start, v0) = window[0];
        let (end, v1) = window[1];
        for (row, slot) in out.iter_mut().enumerate().take(end).skip(start + 1) {
            let t = (row - start) as f64 / (end - start) as f64;
            *slot = Cell::Number(v0 + (v1 - v0) * t);
        }
    }

    // Trailing gaps repeat the last known value; leading gaps stay missing.
    let (last_idx, last_val) = *known.last().unwrap();
    for slot in out.iter_mut().skip(last_idx + 1) {
        *slot = Cell::Number(last_val);
    }
    out
}

fn directional_fill(table: &Table, forward: bool) -> Table {
    let columns = table
        .columns()
        .iter()
        .map(|col| {
            let mut cells = col.cells.clone();
            if forward {
                let mut last: Option<Cell> = None;
                for cell in cells.iter_mut() {
                    if matches!(cell, Cell::Empty) {
                        if let Some(fill) = &last {
                            *cell = fill.clone();
                        }
                    } else {
                        last = Some(cell.clone());
                    }
                }
            } else {
                let mut next: Option<Cell> = None;
                for cell in cells.iter_mut().rev() {
                    if matches!(cell, Cell::Empty) {
                        if let Some(fill) = &next {
                            *cell = fill.clone();
                        }
                    } else {
                        next = Some(cell.clone());
                    }
                }
            }
            Column::new(col.label.clone(), cells)
        })
        .collect();
    Table::from_columns(columns)
}

fn drop_gap_rows(table: &Table) -> Table {
    let rows = table.row_count();
    let keep: Vec<bool> = (0..rows)
        .map(|row| {
            table
                .columns()
                .iter()
                .all(|col| !matches!(col.cells[row], Cell::Empty))
        })
        .collect();
    table.retain_rows(&keep)
}
