//! Harmonic sign-anomaly rule for power-harmonic files
//!
//! Negative per-harmonic power indicates reverse energy flow on that
//! order. The fundamental (order 1) is excluded entirely, and the
//! percentage denominator is the fixed regulatory base (2150 by default),
//! independent of the file's actual row count.
use crate::analysis::records::{round_to, HarmonicRecord};
use crate::analysis::resolver::resolve_harmonics;
use crate::config::AnalysisConfig;
use crate::table::Table;

/// Harmonic order excluded from sign-anomaly evaluation.
const FUNDAMENTAL_ORDER: u32 = 1;

pub fn analyze_harmonics(table: &Table, config: &AnalysisConfig) -> Vec<HarmonicRecord> {
    let base = config.harmonic_base_measurements;
    let mut records = Vec::new();

    for channel in resolve_harmonics(table) {
        if channel.order == FUNDAMENTAL_ORDER {
            continue;
        }
        let values = match table.column(&channel.label) {
            Some(col) => col.numbers(),
            None => continue,
        };
        if values.is_empty() {
            continue;
        }

        let negative_values = values.iter().filter(|&&v| v < 0.0).count();
        let percentage = round_to(negative_values as f64 / base as f64 * 100.0, 8);
        let mean = values.iter().sum::<f64>() / values.len() as f64;
        let min = values.iter().copied().fold(f64::INFINITY, f64::min);

        records.push(HarmonicRecord {
            harmonic_order: channel.order,
            phase: channel.phase,
            parameter: channel.label,
            negative_values,
            total_measurements: base,
            percentage,
            mean_value: round_to(mean, 6),
            min_value: round_to(min, 6),
            sample_count: values.len(),
        });
    }
    records
}
