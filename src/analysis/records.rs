//! Typed analysis records
//!
//! Serialized field names keep the regulation report vocabulary
//! (`fase`, `violaciones`, `excede_limite`, ...) so the persistence layer
//! and the spreadsheet export can select them positionally; the Rust field
//! names stay idiomatic.
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Electrical phase a channel belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Phase {
    L1,
    L2,
    L3,
    #[serde(rename = "GENERAL")]
    General,
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Phase::L1 => write!(f, "L1"),
            Phase::L2 => write!(f, "L2"),
            Phase::L3 => write!(f, "L3"),
            Phase::General => write!(f, "GENERAL"),
        }
    }
}

/// One voltage channel evaluated against the ±8% band around its own mean.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VoltageDeviation {
    #[serde(rename = "fase")]
    pub phase: Phase,
    #[serde(rename = "parametro")]
    pub parameter: String,
    #[serde(rename = "voltaje_promedio")]
    pub mean_voltage: f64,
    #[serde(rename = "limite_superior")]
    pub upper_limit: f64,
    #[serde(rename = "limite_inferior")]
    pub lower_limit: f64,
    #[serde(rename = "violaciones")]
    pub violations: usize,
    #[serde(rename = "total_mediciones")]
    pub total_measurements: usize,
    #[serde(rename = "porcentaje_desviacion")]
    pub deviation_pct: f64,
    #[serde(rename = "excede_limite")]
    pub exceeds_limit: bool,
}

/// One Pst channel evaluated against the fixed flicker limit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlickerRecord {
    #[serde(rename = "fase")]
    pub phase: Phase,
    #[serde(rename = "parametro")]
    pub parameter: String,
    #[serde(rename = "valor_promedio")]
    pub mean_value: f64,
    #[serde(rename = "valor_maximo")]
    pub max_value: f64,
    #[serde(rename = "limite")]
    pub limit: f64,
    #[serde(rename = "violaciones")]
    pub violations: usize,
    #[serde(rename = "total_mediciones")]
    pub total_measurements: usize,
    #[serde(rename = "porcentaje_flicker")]
    pub flicker_pct: f64,
    #[serde(rename = "excede_limite")]
    pub exceeds_limit: bool,
}

/// One THD channel evaluated against the fixed distortion limit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThdRecord {
    #[serde(rename = "fase")]
    pub phase: Phase,
    #[serde(rename = "parametro")]
    pub parameter: String,
    #[serde(rename = "thd_promedio")]
    pub mean_thd: f64,
    #[serde(rename = "thd_maximo")]
    pub max_thd: f64,
    #[serde(rename = "limite")]
    pub limit: f64,
    #[serde(rename = "violaciones")]
    pub violations: usize,
    #[serde(rename = "total_mediciones")]
    pub total_measurements: usize,
    #[serde(rename = "porcentaje_thd")]
    pub thd_pct: f64,
    #[serde(rename = "excede_limite")]
    pub exceeds_limit: bool,
}

/// One power-harmonic channel checked for sign anomalies.
///
/// `total_measurements` is the fixed regulatory base (2150 by default),
/// never the file's row count; `sample_count` keeps the channel's own
/// non-missing count as a diagnostic.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HarmonicRecord {
    #[serde(rename = "orden_armonico")]
    pub harmonic_order: u32,
    #[serde(rename = "fase")]
    pub phase: Phase,
    #[serde(rename = "parametro")]
    pub parameter: String,
    #[serde(rename = "valores_negativos")]
    pub negative_values: usize,
    #[serde(rename = "total_mediciones")]
    pub total_measurements: u64,
    #[serde(rename = "porcentaje")]
    pub percentage: f64,
    #[serde(rename = "valor_promedio")]
    pub mean_value: f64,
    #[serde(rename = "valor_minimo")]
    pub min_value: f64,
    #[serde(rename = "total_valores_archivo")]
    pub sample_count: usize,
}

/// Aggregate result for one analyzed table.
///
/// Immutable once produced; ownership passes to the persistence layer.
/// A structural load failure fills `error` and leaves every record
/// collection empty.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub file_type: String,
    pub filename: Option<String>,
    pub total_measurements: usize,
    pub data_loaded: bool,
    pub processing_timestamp: DateTime<Utc>,
    pub voltage_deviations: Vec<VoltageDeviation>,
    pub flickers: Vec<FlickerRecord>,
    pub thd_analysis: Vec<ThdRecord>,
    pub harmonics_analysis: Vec<HarmonicRecord>,
    pub harmonic_base_measurements: Option<u64>,
    pub error: Option<String>,
}

impl AnalysisResult {
    pub fn empty(file_type: &str) -> Self {
        Self {
            file_type: file_type.to_string(),
            filename: None,
            total_measurements: 0,
            data_loaded: false,
            processing_timestamp: Utc::now(),
            voltage_deviations: Vec::new(),
            flickers: Vec::new(),
            thd_analysis: Vec::new(),
            harmonics_analysis: Vec::new(),
            harmonic_base_measurements: None,
            error: None,
        }
    }

    /// Error-tagged result: no records, just the failure indicator.
    pub fn load_failure(file_type: &str, message: impl Into<String>) -> Self {
        Self {
            error: Some(message.into()),
            ..Self::empty(file_type)
        }
    }
}

/// Round to a fixed number of decimal places, matching the report
/// precision of the regulation workbooks.
pub(crate) fn round_to(value: f64, places: i32) -> f64 {
    let factor = 10f64.powi(places);
    (value * factor).round() / factor
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_phase_display() {
        assert_eq!(Phase::L2.to_string(), "L2");
        assert_eq!(Phase::General.to_string(), "GENERAL");
    }

    #[test]
    fn test_record_serializes_with_report_field_names() {
        let record = VoltageDeviation {
            phase: Phase::L1,
            parameter: "u_l1_avg_10_min_v".to_string(),
            mean_voltage: 120.0,
            upper_limit: 129.6,
            lower_limit: 110.4,
            violations: 5,
            total_measurements: 100,
            deviation_pct: 5.0,
            exceeds_limit: true,
        };
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["fase"], "L1");
        assert_eq!(json["voltaje_promedio"], 120.0);
        assert_eq!(json["violaciones"], 5);
        assert_eq!(json["total_mediciones"], 100);
        assert_eq!(json["porcentaje_desviacion"], 5.0);
        assert_eq!(json["excede_limite"], true);
    }

    #[test]
    fn test_harmonic_record_field_names() {
        let record = HarmonicRecord {
            harmonic_order: 3,
            phase: Phase::L2,
            parameter: "p_h_3_l2".to_string(),
            negative_values: 10,
            total_measurements: 2150,
            percentage: 0.46511628,
            mean_value: 1.2,
            min_value: -0.5,
            sample_count: 500,
        };
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["orden_armonico"], 3);
        assert_eq!(json["valores_negativos"], 10);
        assert_eq!(json["total_valores_archivo"], 500);
    }

    #[test]
    fn test_load_failure_has_no_records() {
        let result = AnalysisResult::load_failure("tendencia", "unreadable workbook");
        assert_eq!(result.error.as_deref(), Some("unreadable workbook"));
        assert!(result.voltage_deviations.is_empty());
        assert!(!result.data_loaded);
    }

    #[test]
    fn test_round_to() {
        assert_eq!(round_to(0.123456789, 6), 0.123457);
        assert_eq!(round_to(120.0004, 3), 120.0);
    }
}
