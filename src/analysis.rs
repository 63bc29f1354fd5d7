//! Compliance Evaluator
//!
//! Consumes a normalized table and produces one `AnalysisResult` with the
//! violation records for every resolvable channel. Data-quality problems
//! never abort the evaluation: a channel that cannot be resolved simply
//! contributes nothing, and only a fundamentally unusable input yields an
//! error-tagged result.
pub mod harmonics;
pub mod records;
pub mod resolver;
pub mod trend;

use chrono::Utc;
use tracing::info;

use crate::config::{AnalysisConfig, FileType};
use crate::table::Table;
pub use records::AnalysisResult;

/// Evaluate a cleaned table against the regulatory thresholds.
///
/// Dispatch is by file type: power-harmonic files get the sign-anomaly
/// analysis, every other tag (voltage harmonics and unknown types
/// included) goes down the trend path.
pub fn analyze(table: &Table, file_type: &FileType, config: &AnalysisConfig) -> AnalysisResult {
    if table.is_empty() {
        return AnalysisResult::load_failure(
            file_type.as_tag(),
            "no usable rows after cleaning",
        );
    }

    let total_measurements = table.row_count();
    let mut result = AnalysisResult {
        file_type: file_type.as_tag().to_string(),
        filename: None,
        total_measurements,
        data_loaded: true,
        processing_timestamp: Utc::now(),
        voltage_deviations: Vec::new(),
        flickers: Vec::new(),
        thd_analysis: Vec::new(),
        harmonics_analysis: Vec::new(),
        harmonic_base_measurements: None,
        error: None,
    };

    if file_type.uses_harmonic_analysis() {
        result.harmonics_analysis = harmonics::analyze_harmonics(table, config);
        result.harmonic_base_measurements = Some(config.harmonic_base_measurements);
    } else {
        result.voltage_deviations = trend::analyze_voltage(table, total_measurements, config);
        result.flickers = trend::analyze_flicker(table, total_measurements, config);
        result.thd_analysis = trend::analyze_thd(table, total_measurements, config);
    }

    info!(
        file_type = file_type.as_tag(),
        total_measurements,
        voltage_records = result.voltage_deviations.len(),
        flicker_records = result.flickers.len(),
        thd_records = result.thd_analysis.len(),
        harmonic_records = result.harmonics_analysis.len(),
        "analysis complete"
    );
    result
}
