//! Per-category report export
//!
//! Writes one CSV file per record category, flattening every stored
//! analysis and re-attaching filename/timestamp metadata, so auditors can
//! open the regulation evidence without the dashboard.
use std::path::{Path, PathBuf};
use tracing::info;

use crate::store::json_store::{JsonStore, StoreError};

/// Export all four category views into `dir`.
///
/// Returns the paths written. Categories with no records still produce a
/// header-only file, so the report set is always complete.
pub fn export_reports(store: &JsonStore, dir: &Path) -> Result<Vec<PathBuf>, StoreError> {
    std::fs::create_dir_all(dir)?;
    let mut written = Vec::new();

    let path = dir.join("voltage_deviations.csv");
    let mut writer = csv::Writer::from_path(&path)?;
    writer.write_record([
        "analysis_id",
        "filename",
        "timestamp",
        "fase",
        "parametro",
        "voltaje_promedio",
        "limite_superior",
        "limite_inferior",
        "violaciones",
        "total_mediciones",
        "porcentaje_desviacion",
        "excede_limite",
    ])?;
    for row in store.voltage_rows()? {
        let r = &row.record;
        writer.write_record([
            row.analysis_id.to_string(),
            row.filename.clone(),
            row.timestamp.to_rfc3339(),
            r.phase.to_string(),
            r.parameter.clone(),
            r.mean_voltage.to_string(),
            r.upper_limit.to_string(),
            r.lower_limit.to_string(),
            r.violations.to_string(),
            r.total_measurements.to_string(),
            r.deviation_pct.to_string(),
            r.exceeds_limit.to_string(),
        ])?;
    }
    writer.flush()?;
    written.push(path);

    let path = dir.join("flickers.csv");
    let mut writer = csv::Writer::from_path(&path)?;
    writer.write_record([
        "analysis_id",
        "filename",
        "timestamp",
        "fase",
        "parametro",
        "valor_promedio",
        "valor_maximo",
        "limite",
        "violaciones",
        "total_mediciones",
        "porcentaje_flicker",
        "excede_limite",
    ])?;
    for row in store.flicker_rows()? {
        let r = &row.record;
        writer.write_record([
            row.analysis_id.to_string(),
            row.filename.clone(),
            row.timestamp.to_rfc3339(),
            r.phase.to_string(),
            r.parameter.clone(),
            r.mean_value.to_string(),
            r.max_value.to_string(),
            r.limit.to_string(),
            r.violations.to_string(),
            r.total_measurements.to_string(),
            r.flicker_pct.to_string(),
            r.exceeds_limit.to_string(),
        ])?;
    }
    writer.flush()?;
    written.push(path);

    let path = dir.join("thd_analysis.csv");
    let mut writer = csv::Writer::from_path(&path)?;
    writer.write_record([
        "analysis_id",
        "filename",
        "timestamp",
        "fase",
        "parametro",
        "thd_promedio",
        "thd_maximo",
        "limite",
        "violaciones",
        "total_mediciones",
        "porcentaje_thd",
        "excede_limite",
    ])?;
    for row in store.thd_rows()? {
        let r = &row.record;
        writer.write_record([
            row.analysis_id.to_string(),
            row.filename.clone(),
            row.timestamp.to_rfc3339(),
            r.phase.to_string(),
            r.parameter.clone(),
            r.mean_thd.to_string(),
            r.max_thd.to_string(),
            r.limit.to_string(),
            r.violations.to_string(),
            r.total_measurements.to_string(),
            r.thd_pct.to_string(),
            r.exceeds_limit.to_string(),
        ])?;
    }
    writer.flush()?;
    written.push(path);

    let path = dir.join("harmonics_analysis.csv");
    let mut writer = csv::Writer::from_path(&path)?;
    writer.write_record([
        "analysis_id",
        "filename",
        "timestamp",
        "orden_armonico",
        "fase",
        "parametro",
        "valores_negativos",
        "total_mediciones",
        "porcentaje",
        "valor_promedio",
        "valor_minimo",
        "total_valores_archivo",
    ])?;
    for row in store.harmonic_rows()? {
        let r = &row.record;
        writer.write_record([
            row.analysis_id.to_string(),
            row.filename.clone(),
            row.timestamp.to_rfc3339(),
            r.harmonic_order.to_string(),
            r.phase.to_string(),
            r.parameter.clone(),
            r.negative_values.to_string(),
            r.total_measurements.to_string(),
            r.percentage.to_string(),
            r.mean_value.to_string(),
            r.min_value.to_string(),
            r.sample_count.to_string(),
        ])?;
    }
    writer.flush()?;
    written.push(path);

    info!(dir = %dir.display(), files = written.len(), "report export complete");
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::records::{AnalysisResult, Phase, VoltageDeviation};

    #[test]
    fn test_export_writes_all_four_categories() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonStore::new(dir.path().join("analyses.json"));

        let mut result = AnalysisResult::empty("tendencia");
        result.voltage_deviations.push(VoltageDeviation {
            phase: Phase::L1,
            parameter: "u_l1_avg_10_min_v".into(),
            mean_voltage: 120.0,
            upper_limit: 129.6,
            lower_limit: 110.4,
            violations: 5,
            total_measurements: 100,
            deviation_pct: 5.0,
            exceeds_limit: true,
        });
        store.save("site_a.xlsx", &result).unwrap();

        let out_dir = dir.path().join("reports");
        let written = export_reports(&store, &out_dir).unwrap();
        assert_eq!(written.len(), 4);

        let voltage_csv = std::fs::read_to_string(&written[0]).unwrap();
        assert!(voltage_csv.contains("porcentaje_desviacion"));
        assert!(voltage_csv.contains("site_a.xlsx"));
        assert!(voltage_csv.contains("129.6"));

        // empty categories still produce header-only files
        let flicker_csv = std::fs::read_to_string(&written[1]).unwrap();
        assert_eq!(flicker_csv.lines().count(), 1);
    }
}
