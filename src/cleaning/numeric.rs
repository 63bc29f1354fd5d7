//! Numeric-column identification and cell coercion
//!
//! Whether a column is treated as a measurement value column is decided by
//! its normalized label: each file type contributes its own keyword set, on
//! top of a generic list of numeric indicators. Coercion is lossy:
//! anything that cannot be read as a number becomes a gap, never an
//! error.
use crate::config::FileType;
use crate::table::{Cell, Table};

/// Keywords marking value columns in trend exports.
const TREND_KEYWORDS: &[&str] = &["voltage", "current", "power", "frequency", "thd"];

/// Keywords marking value columns in power-harmonic exports.
const POWER_HARMONIC_KEYWORDS: &[&str] = &["harmonic", "magnitude", "phase", "distortion"];

/// Keywords marking value columns in voltage-harmonic exports.
const VOLTAGE_HARMONIC_KEYWORDS: &[&str] = &["voltage", "harmonic", "amplitude", "phase"];

/// File-type-independent numeric indicators.
const GENERIC_KEYWORDS: &[&str] = &[
    "value",
    "val",
    "measurement",
    "reading",
    "level",
    "amplitude",
    "magnitude",
    "rms",
    "avg",
    "min",
    "max",
    "std",
    "mean",
    "percent",
    "ratio",
    "factor",
    "time",
    "date",
    "timestamp",
];

/// Decide whether a column holds numeric measurements, by label.
pub fn is_numeric_column(label: &str, file_type: &FileType) -> bool {
    let label = label.to_lowercase();
    let type_keywords: &[&str] = match file_type {
        FileType::Tendencia => TREND_KEYWORDS,
        FileType::ArmonicosPotencia => POWER_HARMONIC_KEYWORDS,
        FileType::ArmonicosVoltaje => VOLTAGE_HARMONIC_KEYWORDS,
        FileType::Other(_) => &[],
    };
    type_keywords
        .iter()
        .chain(GENERIC_KEYWORDS)
        .any(|kw| label.contains(kw))
}

/// Coerce one cell to a number or a gap.
///
/// Text is reduced to the characters a float literal can contain
/// (digits, `.`, `-`, `+`, `e`, `E`) before parsing; an empty residue or a
/// parse failure becomes `Empty`.
pub fn coerce_cell(cell: &Cell) -> Cell {
    match cell {
        Cell::Number(n) => Cell::Number(*n),
        Cell::Empty => Cell::Empty,
        Cell::Text(s) => {
            let filtered: String = s
                .chars()
                .filter(|c| c.is_ascii_digit() || matches!(c, '.' | '-' | '+' | 'e' | 'E'))
                .collect();
            if filtered.is_empty() {
                return Cell::Empty;
            }
            match filtered.parse::<f64>() {
                Ok(n) => Cell::Number(n),
                Err(_) => Cell::Empty,
            }
        }
    }
}

/// Coerce every keyword-matched column of the table.
pub fn coerce_numeric_columns(table: &Table, file_type: &FileType) -> Table {
    let targets: Vec<String> = table
        .labels()
        .filter(|label| is_numeric_column(label, file_type))
        .map(str::to_string)
        .collect();
    let mut out = table.clone();
    for label in targets {
        out = out.map_column(&label, coerce_cell);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::Column;

    #[test]
    fn test_trend_keywords_match() {
        assert!(is_numeric_column("thd_u_l1_avg_10_min", &FileType::Tendencia));
        assert!(is_numeric_column("voltage_rms", &FileType::Tendencia));
        assert!(!is_numeric_column("observaciones", &FileType::Tendencia));
    }

    #[test]
    fn test_generic_keywords_apply_to_unknown_type() {
        let other = FileType::Other("desconocido".to_string());
        assert!(!is_numeric_column("pst_l2", &other));
        assert!(is_numeric_column("avg_reading", &other));
        assert!(is_numeric_column("timestamp", &other));
        // "10 min" aggregation windows carry the generic "min" indicator
        assert!(is_numeric_column("pst_l2_instant_10_min", &other));
    }

    #[test]
    fn test_harmonic_keywords() {
        assert!(is_numeric_column(
            "harmonic_magnitude",
            &FileType::ArmonicosPotencia
        ));
        assert!(is_numeric_column(
            "phase_angle_deg",
            &FileType::ArmonicosVoltaje
        ));
    }

    #[test]
    fn test_coerce_plain_number_text() {
        assert_eq!(coerce_cell(&Cell::Text("120.5".into())), Cell::Number(120.5));
        assert_eq!(
            coerce_cell(&Cell::Text(" 120,5 V".into())),
            Cell::Number(1205.0)
        );
    }

    #[test]
    fn test_coerce_scientific_notation() {
        assert_eq!(
            coerce_cell(&Cell::Text("1.2e3".into())),
            Cell::Number(1200.0)
        );
    }

    #[test]
    fn test_coerce_garbage_becomes_gap() {
        assert_eq!(coerce_cell(&Cell::Text("n/a".into())), Cell::Empty);
        assert_eq!(coerce_cell(&Cell::Text("---".into())), Cell::Empty);
        assert_eq!(coerce_cell(&Cell::Text("2024-01-15".into())), Cell::Empty);
        assert_eq!(coerce_cell(&Cell::Empty), Cell::Empty);
    }

    #[test]
    fn test_coerce_preserves_numbers() {
        assert_eq!(coerce_cell(&Cell::Number(-3.5)), Cell::Number(-3.5));
    }

    #[test]
    fn test_only_keyword_columns_are_coerced() {
        let table = Table::from_columns(vec![
            Column::new("voltage_l1", vec![Cell::Text("118.2".into())]),
            Column::new("notas", vec![Cell::Text("ok".into())]),
        ]);
        let out = coerce_numeric_columns(&table, &FileType::Tendencia);
        assert_eq!(out.cell(0, "voltage_l1"), Some(&Cell::Number(118.2)));
        assert_eq!(out.cell(0, "notas"), Some(&Cell::Text("ok".into())));
    }
}
