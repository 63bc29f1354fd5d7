use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info};

use crate::analysis::records::{
    AnalysisResult, FlickerRecord, HarmonicRecord, ThdRecord, VoltageDeviation,
};

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

/// A stored analysis with its assigned metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredAnalysis {
    pub id: u64,
    pub filename: String,
    pub file_type: String,
    pub total_measurements: usize,
    pub validation_score: f64,
    pub processing_status: String,
    pub timestamp: DateTime<Utc>,
    pub analysis: AnalysisResult,
}

/// One category record re-attached to its analysis metadata, for the
/// flattened per-category views.
#[derive(Debug, Clone, Serialize)]
pub struct CategoryRow<T> {
    pub analysis_id: u64,
    pub filename: String,
    pub timestamp: DateTime<Utc>,
    pub validation_score: f64,
    pub record: T,
}

/// Aggregate store statistics.
#[derive(Debug, Clone, Serialize)]
pub struct StoreStatistics {
    pub total_analyses: usize,
    pub by_type: BTreeMap<String, usize>,
    pub average_validation_score: f64,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct StoreFile {
    next_id: u64,
    analyses: Vec<StoredAnalysis>,
}

/// JSON-file-backed analysis store.
pub struct JsonStore {
    path: PathBuf,
}

impl JsonStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Store a result, assigning the next sequential id.
    pub fn save(&self, filename: &str, result: &AnalysisResult) -> Result<u64, StoreError> {
        let mut file = self.load()?;
        file.next_id += 1;
        let id = file.next_id;

        let stored = StoredAnalysis {
            id,
            filename: filename.to_string(),
            file_type: result.file_type.clone(),
            total_measurements: result.total_measurements,
            validation_score: validation_score(result),
            processing_status: "completed".to_string(),
            timestamp: Utc::now(),
            analysis: result.clone(),
        };
        info!(
            id,
            filename,
            score = stored.validation_score,
            "storing analysis"
        );
        file.analyses.push(stored);
        self.persist(&file)?;
        Ok(id)
    }

    /// All stored analyses, newest first.
    pub fn get_all(&self) -> Result<Vec<StoredAnalysis>, StoreError> {
        let mut analyses = self.load()?.analyses;
        analyses.sort_by(|a, b| b.timestamp.cmp(&a.timestamp).then(b.id.cmp(&a.id)));
        Ok(analyses)
    }

    pub fn get_by_id(&self, id: u64) -> Result<Option<StoredAnalysis>, StoreError> {
        Ok(self.load()?.analyses.into_iter().find(|a| a.id == id))
    }

    /// Delete one analysis; returns whether anything was removed.
    pub fn delete(&self, id: u64) -> Result<bool, StoreError> {
        let mut file = self.load()?;
        let before = file.analyses.len();
        file.analyses.retain(|a| a.id != id);
        let removed = file.analyses.len() < before;
        if removed {
            self.persist(&file)?;
        }
        Ok(removed)
    }

    pub fn clear(&self) -> Result<(), StoreError> {
        self.persist(&StoreFile::default())
    }

    pub fn statistics(&self) -> Result<StoreStatistics, StoreError> {
        let analyses = self.load()?.analyses;
        let mut by_type = BTreeMap::new();
        for analysis in &analyses {
            *by_type.entry(analysis.file_type.clone()).or_insert(0) += 1;
        }
        let average_validation_score = if analyses.is_empty() {
            0.0
        } else {
            let sum: f64 = analyses.iter().map(|a| a.validation_score).sum();
            (sum / analyses.len() as f64 * 100.0).round() / 100.0
        };
        Ok(StoreStatistics {
            total_analyses: analyses.len(),
            by_type,
            average_validation_score,
        })
    }

    /// Flattened voltage-deviation view across all stored analyses.
    pub fn voltage_rows(&self) -> Result<Vec<CategoryRow<VoltageDeviation>>, StoreError> {
        self.category_rows(|a| a.voltage_deviations.clone())
    }

    pub fn flicker_rows(&self) -> Result<Vec<CategoryRow<FlickerRecord>>, StoreError> {
        self.category_rows(|a| a.flickers.clone())
    }

    pub fn thd_rows(&self) -> Result<Vec<CategoryRow<ThdRecord>>, StoreError> {
        self.category_rows(|a| a.thd_analysis.clone())
    }

    pub fn harmonic_rows(&self) -> Result<Vec<CategoryRow<HarmonicRecord>>, StoreError> {
        self.category_rows(|a| a.harmonics_analysis.clone())
    }

    fn category_rows<T>(
        &self,
        select: impl Fn(&AnalysisResult) -> Vec<T>,
    ) -> Result<Vec<CategoryRow<T>>, StoreError> {
        let mut rows = Vec::new();
        for stored in self.get_all()? {
            for record in select(&stored.analysis) {
                rows.push(CategoryRow {
                    analysis_id: stored.id,
                    filename: stored.filename.clone(),
                    timestamp: stored.timestamp,
                    validation_score: stored.validation_score,
                    record,
                });
            }
        }
        Ok(rows)
    }

    fn load(&self) -> Result<StoreFile, StoreError> {
        if !self.path.exists() {
            debug!(path = %self.path.display(), "store file missing, starting empty");
            return Ok(StoreFile::default());
        }
        let contents = std::fs::read_to_string(&self.path)?;
        if contents.trim().is_empty() {
            return Ok(StoreFile::default());
        }
        Ok(serde_json::from_str(&contents)?)
    }

    fn persist(&self, file: &StoreFile) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let contents = serde_json::to_string_pretty(file)?;
        std::fs::write(&self.path, contents)?;
        Ok(())
    }
}

/// Score an analysis for completeness: 100 scaled by how many of the four
/// record sections are populated, minus a 50-point penalty for an
/// error-tagged result, clamped to 0..=100.
pub fn validation_score(result: &AnalysisResult) -> f64 {
    let mut score = 100.0;
    if result.error.is_some() {
        score -= 50.0;
    }

    let sections = [
        !result.voltage_deviations.is_empty(),
        !result.flickers.is_empty(),
        !result.thd_analysis.is_empty(),
        !result.harmonics_analysis.is_empty(),
    ];
    let completeness = sections.iter().filter(|&&s| s).count() as f64 * 25.0;

    (score * completeness / 100.0).clamp(0.0, 100.0)
}
