use serde::{Deserialize, Serialize};
use std::env;

/// Measurement file types recognized by the pipeline.
///
/// The tag travels with each uploaded file. Anything that is not one of the
/// three known tags is preserved verbatim and analyzed down the trend path
/// (see [`FileType::uses_harmonic_analysis`]).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum FileType {
    Tendencia,
    ArmonicosPotencia,
    ArmonicosVoltaje,
    Other(String),
}

impl FileType {
    pub fn from_tag(tag: &str) -> Self {
        match tag {
            "tendencia" => FileType::Tendencia,
            "armonicos_potencia" => FileType::ArmonicosPotencia,
            "armonicos_voltaje" => FileType::ArmonicosVoltaje,
            other => FileType::Other(other.to_string()),
        }
    }

    pub fn as_tag(&self) -> &str {
        match self {
            FileType::Tendencia => "tendencia",
            FileType::ArmonicosPotencia => "armonicos_potencia",
            FileType::ArmonicosVoltaje => "armonicos_voltaje",
            FileType::Other(tag) => tag,
        }
    }

    /// Named default policy: only power-harmonic files get the harmonic
    /// analysis path. Everything else, unknown tags included, is analyzed
    /// as a trend file.
    pub fn uses_harmonic_analysis(&self) -> bool {
        matches!(self, FileType::ArmonicosPotencia)
    }
}

/// Strategy for filling measurement gaps during cleaning.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum GapFill {
    /// Linear interpolation across numeric columns (regulation default).
    #[default]
    LinearInterpolation,
    ForwardFill,
    BackwardFill,
    /// Drop every row that still contains a missing value.
    Remove,
}

impl GapFill {
    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "linear_interpolation" => Some(GapFill::LinearInterpolation),
            "forward_fill" => Some(GapFill::ForwardFill),
            "backward_fill" => Some(GapFill::BackwardFill),
            "remove" => Some(GapFill::Remove),
            _ => None,
        }
    }
}

/// Regulatory limits from Ecuador Regulation 009/2024.
///
/// Defaults are the regulation values; each can be overridden from the
/// environment for what-if runs, never silently hard-wired elsewhere.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisConfig {
    /// Allowed voltage deviation around the channel mean, in percent.
    pub voltage_tolerance_pct: f64,
    /// Short-term flicker severity (Pst) limit.
    pub flicker_limit: f64,
    /// Total harmonic distortion limit, in percent.
    pub thd_limit: f64,
    /// Fixed denominator for harmonic sign-anomaly percentages. A
    /// regulatory convention, deliberately independent of the actual
    /// row count of the analyzed file.
    pub harmonic_base_measurements: u64,
    /// Gap-fill strategy applied during cleaning.
    pub gap_fill: GapFill,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            voltage_tolerance_pct: 8.0,
            flicker_limit: 1.0,
            thd_limit: 5.0,
            harmonic_base_measurements: 2150,
            gap_fill: GapFill::LinearInterpolation,
        }
    }
}

impl AnalysisConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            voltage_tolerance_pct: env::var("VOLTAGE_TOLERANCE_PCT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.voltage_tolerance_pct),
            flicker_limit: env::var("FLICKER_LIMIT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.flicker_limit),
            thd_limit: env::var("THD_LIMIT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.thd_limit),
            harmonic_base_measurements: env::var("HARMONIC_BASE_MEASUREMENTS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.harmonic_base_measurements),
            gap_fill: env::var("GAP_FILL_STRATEGY")
                .ok()
                .and_then(|v| GapFill::from_tag(&v))
                .unwrap_or(defaults.gap_fill),
        }
    }

    /// Multiplier pair for the voltage deviation band, e.g. (0.92, 1.08).
    pub fn voltage_band(&self) -> (f64, f64) {
        let tolerance = self.voltage_tolerance_pct / 100.0;
        (1.0 - tolerance, 1.0 + tolerance)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_type_round_trip() {
        assert_eq!(FileType::from_tag("tendencia"), FileType::Tendencia);
        assert_eq!(
            FileType::from_tag("armonicos_potencia").as_tag(),
            "armonicos_potencia"
        );
        assert_eq!(
            FileType::from_tag("mediciones_custom"),
            FileType::Other("mediciones_custom".to_string())
        );
    }

    #[test]
    fn test_unknown_file_type_uses_trend_path() {
        assert!(!FileType::from_tag("desconocido").uses_harmonic_analysis());
        assert!(!FileType::ArmonicosVoltaje.uses_harmonic_analysis());
        assert!(FileType::ArmonicosPotencia.uses_harmonic_analysis());
    }

    #[test]
    fn test_default_limits_match_regulation() {
        let config = AnalysisConfig::default();
        assert_eq!(config.voltage_tolerance_pct, 8.0);
        assert_eq!(config.flicker_limit, 1.0);
        assert_eq!(config.thd_limit, 5.0);
        assert_eq!(config.harmonic_base_measurements, 2150);
        assert_eq!(config.gap_fill, GapFill::LinearInterpolation);
    }

    #[test]
    fn test_voltage_band() {
        let (lower, upper) = AnalysisConfig::default().voltage_band();
        assert!((lower - 0.92).abs() < 1e-12);
        assert!((upper - 1.08).abs() < 1e-12);
    }

    #[test]
    fn test_gap_fill_tags() {
        assert_eq!(
            GapFill::from_tag("linear_interpolation"),
            Some(GapFill::LinearInterpolation)
        );
        assert_eq!(GapFill::from_tag("remove"), Some(GapFill::Remove));
        assert_eq!(GapFill::from_tag("bogus"), None);
    }
}
