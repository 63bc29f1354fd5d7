//! Columnar table model shared by the normalizer and the evaluator
//!
//! A `Table` straight from the spreadsheet reader is "raw": labels may be
//! duplicated or malformed and cells may hold arbitrary text. The cleaning
//! pipeline turns it into a normalized table (unique lower-case labels,
//! keyword-matched value columns holding only numbers or gaps). Both states
//! share this one type; every transformation returns a fresh `Table`.
use std::collections::HashSet;

/// A single spreadsheet cell after reading, before or after coercion.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Number(f64),
    Text(String),
    Empty,
}

impl Cell {
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Cell::Number(n) => Some(*n),
            _ => None,
        }
    }

    /// True for `Empty` and for text that is blank after trimming.
    pub fn is_blank(&self) -> bool {
        match self {
            Cell::Empty => true,
            Cell::Text(s) => s.trim().is_empty(),
            Cell::Number(_) => false,
        }
    }

    /// Stable byte key used for exact duplicate-row detection.
    ///
    /// Numbers compare by bit pattern so identical values (including
    /// signed zeros and NaNs) hash consistently.
    fn key(&self, out: &mut Vec<u8>) {
        match self {
            Cell::Number(n) => {
                out.push(b'n');
                out.extend_from_slice(&n.to_bits().to_le_bytes());
            }
            Cell::Text(s) => {
                out.push(b't');
                out.extend_from_slice(s.as_bytes());
            }
            Cell::Empty => out.push(b'e'),
        }
        out.push(0);
    }
}

/// One labelled column of cells.
#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    pub label: String,
    pub cells: Vec<Cell>,
}

impl Column {
    pub fn new(label: impl Into<String>, cells: Vec<Cell>) -> Self {
        Self {
            label: label.into(),
            cells,
        }
    }

    /// Non-missing numeric values in row order.
    pub fn numbers(&self) -> Vec<f64> {
        self.cells.iter().filter_map(Cell::as_number).collect()
    }

    /// True when every cell is blank.
    pub fn is_blank(&self) -> bool {
        self.cells.iter().all(Cell::is_blank)
    }

    /// True when every non-missing cell is a number.
    pub fn is_numeric(&self) -> bool {
        self.cells
            .iter()
            .all(|c| matches!(c, Cell::Number(_) | Cell::Empty))
    }
}

/// An ordered collection of equally sized columns.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Table {
    columns: Vec<Column>,
}

impl Table {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from columns; all columns are padded with `Empty` to the
    /// longest length so the row count is well defined.
    pub fn from_columns(mut columns: Vec<Column>) -> Self {
        let rows = columns.iter().map(|c| c.cells.len()).max().unwrap_or(0);
        for col in &mut columns {
            col.cells.resize(rows, Cell::Empty);
        }
        Self { columns }
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn column(&self, label: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.label == label)
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    pub fn row_count(&self) -> usize {
        self.columns.first().map(|c| c.cells.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty() || self.row_count() == 0
    }

    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|c| c.label.as_str())
    }

    /// New table with the labels rewritten positionally.
    pub fn with_labels(&self, labels: Vec<String>) -> Self {
        debug_assert_eq!(labels.len(), self.columns.len());
        let columns = self
            .columns
            .iter()
            .zip(labels)
            .map(|(col, label)| Column::new(label, col.cells.clone()))
            .collect();
        Self { columns }
    }

    /// New table keeping only the columns the predicate accepts.
    pub fn retain_columns(&self, mut keep: impl FnMut(&Column) -> bool) -> Self {
        Self {
            columns: self.columns.iter().filter(|c| keep(c)).cloned().collect(),
        }
    }

    /// New table keeping only the rows whose mask entry is true.
    pub fn retain_rows(&self, keep: &[bool]) -> Self {
        debug_assert_eq!(keep.len(), self.row_count());
        let columns = self
            .columns
            .iter()
            .map(|col| {
                let cells = col
                    .cells
                    .iter()
                    .zip(keep)
                    .filter(|(_, k)| **k)
                    .map(|(c, _)| c.clone())
                    .collect();
                Column::new(col.label.clone(), cells)
            })
            .collect();
        Self { columns }
    }

    /// New table with one column's cells rewritten through `f`.
    pub fn map_column(&self, label: &str, f: impl Fn(&Cell) -> Cell) -> Self {
        let columns = self
            .columns
            .iter()
            .map(|col| {
                if col.label == label {
                    Column::new(col.label.clone(), col.cells.iter().map(&f).collect())
                } else {
                    col.clone()
                }
            })
            .collect();
        Self { columns }
    }

    /// Cell at (row, label), if both exist.
    pub fn cell(&self, row: usize, label: &str) -> Option<&Cell> {
        self.column(label).and_then(|c| c.cells.get(row))
    }

    /// New table with exact duplicate rows collapsed to the first occurrence.
    pub fn dedup_rows(&self) -> Self {
        let rows = self.row_count();
        let mut seen = HashSet::new();
        let mut keep = Vec::with_capacity(rows);
        for row in 0..rows {
            let mut key = Vec::new();
            for col in &self.columns {
                col.cells[row].key(&mut key);
            }
            keep.push(seen.insert(key));
        }
        self.retain_rows(&keep)
    }

    /// New table with rows reordered by the given row indices.
    pub fn reorder_rows(&self, order: &[usize]) -> Self {
        debug_assert_eq!(order.len(), self.row_count());
        let columns = self
            .columns
            .iter()
            .map(|col| {
                let cells = order.iter().map(|&i| col.cells[i].clone()).collect();
                Column::new(col.label.clone(), cells)
            })
            .collect();
        Self { columns }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn num(n: f64) -> Cell {
        Cell::Number(n)
    }

    #[test]
    fn test_from_columns_pads_ragged_input() {
        let table = Table::from_columns(vec![
            Column::new("a", vec![num(1.0), num(2.0)]),
            Column::new("b", vec![num(3.0)]),
        ]);
        assert_eq!(table.row_count(), 2);
        assert_eq!(table.cell(1, "b"), Some(&Cell::Empty));
    }

    #[test]
    fn test_retain_rows_filters_all_columns() {
        let table = Table::from_columns(vec![
            Column::new("a", vec![num(1.0), num(2.0), num(3.0)]),
            Column::new("b", vec![num(4.0), num(5.0), num(6.0)]),
        ]);
        let filtered = table.retain_rows(&[true, false, true]);
        assert_eq!(filtered.row_count(), 2);
        assert_eq!(filtered.cell(1, "b"), Some(&num(6.0)));
    }

    #[test]
    fn test_dedup_rows_keeps_first_occurrence() {
        let table = Table::from_columns(vec![
            Column::new("a", vec![num(1.0), num(1.0), num(2.0), num(1.0)]),
            Column::new(
                "b",
                vec![
                    Cell::Text("x".into()),
                    Cell::Text("x".into()),
                    Cell::Empty,
                    Cell::Text("x".into()),
                ],
            ),
        ]);
        let deduped = table.dedup_rows();
        assert_eq!(deduped.row_count(), 2);
        assert_eq!(deduped.cell(0, "a"), Some(&num(1.0)));
        assert_eq!(deduped.cell(1, "a"), Some(&num(2.0)));
    }

    #[test]
    fn test_dedup_distinguishes_empty_and_blank_text() {
        let table = Table::from_columns(vec![Column::new(
            "a",
            vec![Cell::Empty, Cell::Text(String::new())],
        )]);
        assert_eq!(table.dedup_rows().row_count(), 2);
    }

    #[test]
    fn test_blank_column_detection() {
        let blank = Column::new("x", vec![Cell::Empty, Cell::Text("  ".into())]);
        assert!(blank.is_blank());
        let not_blank = Column::new("y", vec![Cell::Empty, num(0.0)]);
        assert!(!not_blank.is_blank());
    }

    #[test]
    fn test_reorder_rows() {
        let table =
            Table::from_columns(vec![Column::new("a", vec![num(3.0), num(1.0), num(2.0)])]);
        let sorted = table.reorder_rows(&[1, 2, 0]);
        assert_eq!(sorted.column("a").unwrap().numbers(), vec![1.0, 2.0, 3.0]);
    }

    #[test]
    fn test_empty_table() {
        let table = Table::new();
        assert!(table.is_empty());
        assert_eq!(table.row_count(), 0);
    }
}
