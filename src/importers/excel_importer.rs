//! Meter Export Reader
//!
//! Reads power-quality meter exports (.xlsx) into a raw [`Table`].
//! The meter firmware writes 16 rows of device metadata before the column
//! header, so the header row is fixed at worksheet row 17 (index 16).
//! Everything below it is data; interpretation is left entirely to the
//! cleaning pipeline.
use calamine::{open_workbook, Data, Range, Reader, Xlsx};
use regex::Regex;
use std::fs::File;
use std::io::BufReader;
use std::sync::OnceLock;
use thiserror::Error;
use tracing::{debug, info};

use crate::config::FileType;
use crate::table::{Cell, Column, Table};

/// Zero-based index of the column-header row in every meter export.
pub const HEADER_ROW: usize = 16;

#[derive(Error, Debug)]
pub enum ExcelImportError {
    #[error("Failed to open workbook: {0}")]
    WorkbookOpen(String),

    #[error("Sheet not found: {0}")]
    SheetNotFound(String),

    #[error("Workbook has no sheets")]
    NoSheets,
}

/// Outcome of checking a worksheet against the expected file type.
///
/// Issues are advisory: a sheet with issues can still be analyzed, the
/// dashboard just warns before accepting it.
#[derive(Debug, Clone)]
pub struct FormatValidation {
    pub is_valid: bool,
    pub detected_type: FileType,
    pub total_rows: usize,
    pub total_columns: usize,
    pub issues: Vec<String>,
}

/// Reader for power-quality meter exports.
pub struct ExcelImporter {
    workbook_path: String,
}

impl ExcelImporter {
    pub fn new(workbook_path: impl Into<String>) -> Self {
        Self {
            workbook_path: workbook_path.into(),
        }
    }

    /// Read one worksheet into a raw table.
    ///
    /// Uses the first sheet when `sheet_name` is `None`. Blank header
    /// cells become `unnamed_<col>` placeholders, which the normalizer
    /// later drops.
    pub fn read_raw_table(&self, sheet_name: Option<&str>) -> Result<Table, ExcelImportError> {
        let range = self.open_range(sheet_name)?;

        if range.height() <= HEADER_ROW {
            debug!(
                "worksheet has {} rows, header expected at {}; treating as empty",
                range.height(),
                HEADER_ROW + 1
            );
            return Ok(Table::new());
        }

        let width = range.width();
        let mut columns = Vec::with_capacity(width);
        for col in 0..width {
            let label = match range.get((HEADER_ROW, col)) {
                Some(Data::String(s)) if !s.trim().is_empty() => s.trim().to_string(),
                Some(Data::Float(f)) => f.to_string(),
                Some(Data::Int(i)) => i.to_string(),
                _ => format!("unnamed_{col}"),
            };

            let cells = (HEADER_ROW + 1..range.height())
                .map(|row| convert_cell(range.get((row, col))))
                .collect();
            columns.push(Column::new(label, cells));
        }

        let table = Table::from_columns(columns);
        info!(
            rows = table.row_count(),
            columns = table.column_count(),
            path = %self.workbook_path,
            "read meter export"
        );
        Ok(table)
    }

    /// Check that a worksheet looks like the expected file type.
    pub fn validate_format(
        &self,
        sheet_name: Option<&str>,
        expected: &FileType,
    ) -> Result<FormatValidation, ExcelImportError> {
        let table = self.read_raw_table(sheet_name)?;
        let labels: Vec<String> = table.labels().map(|l| l.to_lowercase()).collect();
        let issues = format_issues(&labels, expected);

        Ok(FormatValidation {
            is_valid: issues.is_empty(),
            detected_type: expected.clone(),
            total_rows: table.row_count(),
            total_columns: table.column_count(),
            issues,
        })
    }

    fn open_range(&self, sheet_name: Option<&str>) -> Result<Range<Data>, ExcelImportError> {
        let mut workbook: Xlsx<BufReader<File>> = match open_workbook(&self.workbook_path) {
            Ok(wb) => wb,
            Err(e) => return Err(ExcelImportError::WorkbookOpen(e.to_string())),
        };

        let sheet = match sheet_name {
            Some(name) => name.to_string(),
            None => workbook
                .sheet_names()
                .first()
                .cloned()
                .ok_or(ExcelImportError::NoSheets)?,
        };

        workbook
            .worksheet_range(&sheet)
            .map_err(|_| ExcelImportError::SheetNotFound(sheet))
    }
}

/// Header-pattern checks for one expected file type, over lower-cased
/// raw labels. Trend sheets need voltage, Pst, and THD columns; a
/// power-harmonic sheet needs at least three `P H <n> L<p>` columns.
fn format_issues(labels: &[String], expected: &FileType) -> Vec<String> {
    static HARMONIC: OnceLock<Regex> = OnceLock::new();
    let mut issues = Vec::new();

    match expected {
        FileType::Tendencia => {
            for pattern in ["u l", "pst", "thd"] {
                if !labels.iter().any(|l| l.contains(pattern)) {
                    issues.push(format!("pattern '{pattern}' not found in headers"));
                }
            }
        }
        FileType::ArmonicosPotencia => {
            let harmonic =
                HARMONIC.get_or_init(|| Regex::new(r"p h \d+ l[123]").unwrap());
            let found = labels.iter().filter(|l| harmonic.is_match(l)).count();
            if found < 3 {
                issues.push(format!(
                    "only {found} power-harmonic columns found, expected at least 3"
                ));
            }
        }
        _ => {}
    }
    issues
}

fn convert_cell(data: Option<&Data>) -> Cell {
    match data {
        Some(Data::Float(f)) => Cell::Number(*f),
        Some(Data::Int(i)) => Cell::Number(*i as f64),
        Some(Data::DateTime(dt)) => Cell::Number(dt.as_f64()),
        Some(Data::Bool(b)) => Cell::Number(if *b { 1.0 } else { 0.0 }),
        Some(Data::String(s)) => Cell::Text(s.clone()),
        Some(Data::DateTimeIso(s)) | Some(Data::DurationIso(s)) => Cell::Text(s.clone()),
        Some(Data::Error(_)) | Some(Data::Empty) | None => Cell::Empty,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_importer_creation() {
        let importer = ExcelImporter::new("meters/site_a_tendencia.xlsx");
        assert_eq!(importer.workbook_path, "meters/site_a_tendencia.xlsx");
    }

    #[test]
    fn test_workbook_not_found() {
        let importer = ExcelImporter::new("/nonexistent/export.xlsx");
        let result = importer.read_raw_table(None);
        assert!(matches!(result, Err(ExcelImportError::WorkbookOpen(_))));
    }

    fn lowered(labels: &[&str]) -> Vec<String> {
        labels.iter().map(|l| l.to_lowercase()).collect()
    }

    #[test]
    fn test_trend_format_requires_voltage_pst_and_thd() {
        let labels = lowered(&["Time", "U L1 avg. 10 min [V]", "THD U L1 avg. 10 min [%]"]);
        let issues = format_issues(&labels, &FileType::Tendencia);
        assert_eq!(issues.len(), 1);
        assert!(issues[0].contains("pst"));
    }

    #[test]
    fn test_complete_trend_format_has_no_issues() {
        let labels = lowered(&[
            "U L1 avg. 10 min [V]",
            "Pst L1 instant. 10 min",
            "THD U L1 avg. 10 min [%]",
        ]);
        assert!(format_issues(&labels, &FileType::Tendencia).is_empty());
    }

    #[test]
    fn test_power_harmonic_format_needs_three_harmonic_columns() {
        let labels = lowered(&["P H 3 L1", "P H 5 L1", "Potencia total"]);
        let issues = format_issues(&labels, &FileType::ArmonicosPotencia);
        assert_eq!(issues.len(), 1);
        assert!(issues[0].contains("only 2"));

        let enough = lowered(&["P H 3 L1", "P H 5 L1", "P H 7 L1"]);
        assert!(format_issues(&enough, &FileType::ArmonicosPotencia).is_empty());
    }

    #[test]
    fn test_unknown_type_is_never_flagged() {
        let labels = lowered(&["whatever"]);
        assert!(format_issues(&labels, &FileType::Other("x".into())).is_empty());
    }

    #[test]
    fn test_convert_cell_variants() {
        assert_eq!(convert_cell(Some(&Data::Float(1.5))), Cell::Number(1.5));
        assert_eq!(convert_cell(Some(&Data::Int(3))), Cell::Number(3.0));
        assert_eq!(
            convert_cell(Some(&Data::String("abc".into()))),
            Cell::Text("abc".into())
        );
        assert_eq!(convert_cell(Some(&Data::Empty)), Cell::Empty);
        assert_eq!(convert_cell(None), Cell::Empty);
        assert_eq!(convert_cell(Some(&Data::Bool(true))), Cell::Number(1.0));
    }
}
