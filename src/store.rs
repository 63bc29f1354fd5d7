//! Persistence collaborator
//!
//! The analysis engine hands each `AnalysisResult` to this layer, which
//! assigns an identifier, computes a validation score, stores the result,
//! and later reconstructs per-category tabular views for the dashboard
//! and the report export. Storage is a single JSON file; the engine
//! contract only requires id assignment and retrieval.
pub mod json_store;
pub mod report;

pub use json_store::{
    validation_score, CategoryRow, JsonStore, StoreError, StoreStatistics, StoredAnalysis,
};
