//! Typed channel resolver
//!
//! Regulation-relevant columns are found by name pattern, not position:
//! each logical channel carries a label template, and every normalized
//! column whose label contains the normalized template is an independent
//! channel (duplicate or alternately labelled columns all get evaluated).
//! A template with zero matches simply contributes no records.
use regex::Regex;
use std::sync::OnceLock;

use crate::analysis::records::Phase;
use crate::cleaning::labels::normalize_label;
use crate::table::Table;

/// A logical channel and the label template that locates it.
#[derive(Debug, Clone, Copy)]
pub struct ChannelSpec {
    pub logical: &'static str,
    pub template: &'static str,
}

/// Voltage channels of a trend file, one per phase.
pub const VOLTAGE_CHANNELS: &[ChannelSpec] = &[
    ChannelSpec { logical: "voltage_l1", template: "U L1 avg. 10 min [V]" },
    ChannelSpec { logical: "voltage_l2", template: "U L2 avg. 10 min [V]" },
    ChannelSpec { logical: "voltage_l3", template: "U L3 avg. 10 min [V]" },
];

/// Short-term flicker severity channels, one per phase.
pub const FLICKER_CHANNELS: &[ChannelSpec] = &[
    ChannelSpec { logical: "pst_l1", template: "Pst L1 instant. 10 min" },
    ChannelSpec { logical: "pst_l2", template: "Pst L2 instant. 10 min" },
    ChannelSpec { logical: "pst_l3", template: "Pst L3 instant. 10 min" },
];

/// Voltage THD channels, one per phase.
pub const THD_CHANNELS: &[ChannelSpec] = &[
    ChannelSpec { logical: "thd_l1", template: "THD U L1 avg. 10 min [%]" },
    ChannelSpec { logical: "thd_l2", template: "THD U L2 avg. 10 min [%]" },
    ChannelSpec { logical: "thd_l3", template: "THD U L3 avg. 10 min [%]" },
];

/// Fallback order assigned when a harmonic label does not parse.
///
/// Order 1 is the fundamental, which the sign-anomaly rule excludes, so an
/// unparseable label conservatively produces no record.
pub const FALLBACK_HARMONIC_ORDER: u32 = 1;

/// One resolved measurement column.
#[derive(Debug, Clone, PartialEq)]
pub struct Channel {
    pub label: String,
    pub phase: Phase,
}

/// One resolved power-harmonic column.
#[derive(Debug, Clone, PartialEq)]
pub struct HarmonicChannel {
    pub label: String,
    pub phase: Phase,
    pub order: u32,
}

/// Find every numeric column whose normalized label contains the
/// template as a case-insensitive substring.
pub fn resolve(table: &Table, template: &str) -> Vec<Channel> {
    let needle = normalize_label(template);
    table
        .columns()
        .iter()
        .filter(|col| col.is_numeric() && col.label.to_lowercase().contains(&needle))
        .map(|col| Channel {
            label: col.label.clone(),
            phase: extract_phase(&col.label),
        })
        .collect()
}

/// Find every power-harmonic column (`P H <order> L<phase>` in the raw
/// export, `p_h_<order>_l<phase>` once normalized).
pub fn resolve_harmonics(table: &Table) -> Vec<HarmonicChannel> {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    let pattern = PATTERN.get_or_init(|| Regex::new(r"p[_\s]h[_\s]\d+[_\s]l[123]").unwrap());
    table
        .columns()
        .iter()
        .filter(|col| col.is_numeric() && pattern.is_match(&col.label.to_lowercase()))
        .map(|col| HarmonicChannel {
            label: col.label.clone(),
            phase: extract_phase(&col.label),
            order: extract_harmonic_order(&col.label),
        })
        .collect()
}

/// Scan a label for `l1`/`l2`/`l3`, in that priority order.
pub fn extract_phase(label: &str) -> Phase {
    let label = label.to_lowercase();
    if label.contains("l1") {
        Phase::L1
    } else if label.contains("l2") {
        Phase::L2
    } else if label.contains("l3") {
        Phase::L3
    } else {
        Phase::General
    }
}

/// Pull the harmonic order out of a `p_h_<order>` label; defaults to the
/// fundamental when the label does not parse.
pub fn extract_harmonic_order(label: &str) -> u32 {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    let pattern = PATTERN.get_or_init(|| Regex::new(r"p[_\s]h[_\s](\d+)").unwrap());
    pattern
        .captures(&label.to_lowercase())
        .and_then(|cap| cap.get(1))
        .and_then(|m| m.as_str().parse().ok())
        .unwrap_or(FALLBACK_HARMONIC_ORDER)
}
