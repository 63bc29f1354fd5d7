//! Trend-file rules: voltage deviation, flicker, THD
//!
//! Each rule resolves its channels, drops gaps, and counts measurements
//! strictly outside the limit. The percentage denominator is always the
//! row count of the normalized table, not the channel's own sample count.
//! Voltage limits are self-referential: the nominal is the channel's own
//! mean, with the tolerance band taken around it.
use crate::analysis::records::{round_to, FlickerRecord, ThdRecord, VoltageDeviation};
use crate::analysis::resolver::{resolve, FLICKER_CHANNELS, THD_CHANNELS, VOLTAGE_CHANNELS};
use crate::config::AnalysisConfig;
use crate::table::Table;

pub fn analyze_voltage(
    table: &Table,
    total_measurements: usize,
    config: &AnalysisConfig,
) -> Vec<VoltageDeviation> {
    let (lower_factor, upper_factor) = config.voltage_band();
    let mut records = Vec::new();

    for spec in VOLTAGE_CHANNELS {
        for channel in resolve(table, spec.template) {
            let values = match table.column(&channel.label) {
                Some(col) => col.numbers(),
                None => continue,
            };
            if values.is_empty() {
                continue;
            }

            let nominal = mean(&values);
            let upper_limit = nominal * upper_factor;
            let lower_limit = nominal * lower_factor;
            let violations = values
                .iter()
                .filter(|&&v| v > upper_limit || v < lower_limit)
                .count();

            records.push(VoltageDeviation {
                phase: channel.phase,
                parameter: channel.label,
                mean_voltage: round_to(nominal, 3),
                upper_limit: round_to(upper_limit, 3),
                lower_limit: round_to(lower_limit, 3),
                violations,
                total_measurements,
                deviation_pct: percentage(violations, total_measurements),
                exceeds_limit: violations > 0,
            });
        }
    }
    records
}

pub fn analyze_flicker(
    table: &Table,
    total_measurements: usize,
    config: &AnalysisConfig,
) -> Vec<FlickerRecord> {
    let mut records = Vec::new();

    for spec in FLICKER_CHANNELS {
        for channel in resolve(table, spec.template) {
            let values = match table.column(&channel.label) {
                Some(col) => col.numbers(),
                None => continue,
            };
            if values.is_empty() {
                continue;
            }

            let violations = values.iter().filter(|&&v| v > config.flicker_limit).count();
            records.push(FlickerRecord {
                phase: channel.phase,
                parameter: channel.label,
                mean_value: round_to(mean(&values), 6),
                max_value: round_to(max(&values), 6),
                limit: config.flicker_limit,
                violations,
                total_measurements,
                flicker_pct: percentage(violations, total_measurements),
                exceeds_limit: violations > 0,
            });
        }
    }
    records
}

pub fn analyze_thd(
    table: &Table,
    total_measurements: usize,
    config: &AnalysisConfig,
) -> Vec<ThdRecord> {
    let mut records = Vec::new();

    for spec in THD_CHANNELS {
        for channel in resolve(table, spec.template) {
            let values = match table.column(&channel.label) {
                Some(col) => col.numbers(),
                None => continue,
            };
            if values.is_empty() {
                continue;
            }

            let violations = values.iter().filter(|&&v| v > config.thd_limit).count();
            records.push(ThdRecord {
                phase: channel.phase,
                parameter: channel.label,
                mean_thd: round_to(mean(&values), 6),
                max_thd: round_to(max(&values), 6),
                limit: config.thd_limit,
                violations,
                total_measurements,
                thd_pct: percentage(violations, total_measurements),
                exceeds_limit: violations > 0,
            });
        }
    }
    records
}

fn mean(values: &[f64]) -> f64 {
    values.iter().sum::<f64>() / values.len() as f64
}

fn max(values: &[f64]) -> f64 {
    values.iter().copied().fold(f64::NEG_INFINITY, f64::max)
}

fn percentage(violations: usize, total: usize) -> f64 {
    if total == 0 {
        return 0.0;
    }
    round_to(violations as f64 / total as f64 * 100.0, 6)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::records::Phase;
    use crate::table::{Cell, Column};

    fn voltage_table(values: &[f64]) -> Table {
        let cells = values.iter().map(|&v| Cell::Number(v)).collect();
        Table::from_columns(vec![Column::new("u_l1_avg_10_min_v", cells)])
    }

    #[test]
    fn test_voltage_limits_derive_from_channel_mean() {
        // 10 values averaging exactly 120.0
        let values = vec![118.0, 122.0, 119.0, 121.0, 120.0, 120.0, 117.0, 123.0, 118.5, 121.5];
        let table = voltage_table(&values);
        let records = analyze_voltage(&table, table.row_count(), &AnalysisConfig::default());

        assert_eq!(records.len(), 1);
        let record = &records[0];
        assert_eq!(record.mean_voltage, 120.0);
        assert_eq!(record.upper_limit, round_to(120.0 * 1.08, 3));
        assert_eq!(record.lower_limit, round_to(120.0 * 0.92, 3));
        assert_eq!(record.violations, 0);
        assert!(!record.exceeds_limit);
        assert_eq!(record.phase, Phase::L1);
    }

    #[test]
    fn test_voltage_strict_inequality_at_limits() {
        // mean 100 exactly; limits 92 / 108; boundary values do not violate
        let values = vec![92.0, 108.0, 100.0, 100.0];
        let table = voltage_table(&values);
        let records = analyze_voltage(&table, 4, &AnalysisConfig::default());
        assert_eq!(records[0].violations, 0);
    }

    #[test]
    fn test_voltage_counts_both_sides_of_band() {
        // mean 100; 115 above, 85 below
        let values = vec![115.0, 85.0, 100.0, 100.0];
        let table = voltage_table(&values);
        let records = analyze_voltage(&table, 4, &AnalysisConfig::default());
        assert_eq!(records[0].violations, 2);
        assert_eq!(records[0].deviation_pct, 50.0);
        assert!(records[0].exceeds_limit);
    }

    #[test]
    fn test_voltage_gaps_excluded_from_stats_not_denominator() {
        let table = Table::from_columns(vec![Column::new(
            "u_l1_avg_10_min_v",
            vec![Cell::Number(100.0), Cell::Empty, Cell::Number(100.0)],
        )]);
        let records = analyze_voltage(&table, 3, &AnalysisConfig::default());
        assert_eq!(records[0].mean_voltage, 100.0);
        assert_eq!(records[0].total_measurements, 3);
    }

    #[test]
    fn test_flicker_violations_above_one() {
        let cells = vec![0.4, 0.9, 1.0, 1.1, 2.5]
            .into_iter()
            .map(Cell::Number)
            .collect();
        let table = Table::from_columns(vec![Column::new("pst_l2_instant_10_min", cells)]);
        let records = analyze_flicker(&table, 5, &AnalysisConfig::default());

        assert_eq!(records.len(), 1);
        let record = &records[0];
        assert_eq!(record.phase, Phase::L2);
        // 1.0 is not a violation, strictly-greater applies
        assert_eq!(record.violations, 2);
        assert_eq!(record.max_value, 2.5);
        assert_eq!(record.flicker_pct, 40.0);
        assert!(record.exceeds_limit);
    }

    #[test]
    fn test_flicker_all_compliant() {
        let cells = vec![0.2, 0.5, 1.0].into_iter().map(Cell::Number).collect();
        let table = Table::from_columns(vec![Column::new("pst_l1_instant_10_min", cells)]);
        let records = analyze_flicker(&table, 3, &AnalysisConfig::default());
        assert_eq!(records[0].violations, 0);
        assert!(!records[0].exceeds_limit);
    }

    #[test]
    fn test_thd_violations_above_five_percent() {
        let cells = vec![2.0, 5.0, 5.1, 8.0].into_iter().map(Cell::Number).collect();
        let table = Table::from_columns(vec![Column::new("thd_u_l3_avg_10_min", cells)]);
        let records = analyze_thd(&table, 4, &AnalysisConfig::default());

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].phase, Phase::L3);
        assert_eq!(records[0].violations, 2);
        assert_eq!(records[0].limit, 5.0);
        assert_eq!(records[0].thd_pct, 50.0);
    }

    #[test]
    fn test_missing_channels_produce_no_records() {
        let table = Table::from_columns(vec![Column::new(
            "frecuencia_hz",
            vec![Cell::Number(60.0)],
        )]);
        let config = AnalysisConfig::default();
        assert!(analyze_voltage(&table, 1, &config).is_empty());
        assert!(analyze_flicker(&table, 1, &config).is_empty());
        assert!(analyze_thd(&table, 1, &config).is_empty());
    }
}
