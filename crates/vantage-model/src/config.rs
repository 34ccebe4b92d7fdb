//! Cleaning configuration documents.
//!
//! A configuration covers all four pipeline stages. Unknown strategy tokens
//! are fatal at parse time; a `null` imputation entry skips the column, and
//! missing keys inherit the auto-configured defaults.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::enums::{ImputationStrategy, StandardizationRule};
use crate::error::PipelineError;

pub const DEFAULT_IQR_THRESHOLD: f64 = 1.5;

/// Outlier detection method. IQR is the only supported method.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum OutlierMethod {
    #[default]
    Iqr,
}

/// Duplicate resolution strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum DedupStrategy {
    #[default]
    KeepFirst,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutlierConfig {
    pub enabled: bool,
    #[serde(default)]
    pub method: OutlierMethod,
    #[serde(default = "default_threshold")]
    pub threshold: f64,
    #[serde(default)]
    pub remove: bool,
}

fn default_threshold() -> f64 {
    DEFAULT_IQR_THRESHOLD
}

impl Default for OutlierConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            method: OutlierMethod::Iqr,
            threshold: DEFAULT_IQR_THRESHOLD,
            remove: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DeduplicationConfig {
    pub enabled: bool,
    #[serde(default)]
    pub strategy: DedupStrategy,
    /// Key columns considered for equality. Empty means all columns.
    #[serde(default, rename = "keyColumns")]
    pub key_columns: Vec<String>,
}

/// The full cleaning configuration document.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct CleaningConfig {
    /// Per-column null replacement. `None` skips the column.
    #[serde(default)]
    pub imputation: BTreeMap<String, Option<ImputationStrategy>>,
    #[serde(default)]
    pub outliers: OutlierConfig,
    #[serde(default)]
    pub deduplication: DeduplicationConfig,
    /// Per-column output format rules.
    #[serde(default)]
    pub standardization: BTreeMap<String, StandardizationRule>,
}

impl CleaningConfig {
    /// Parses a configuration document, rejecting unknown strategy tokens
    /// and out-of-range thresholds.
    pub fn from_json(value: serde_json::Value) -> Result<Self, PipelineError> {
        let config: CleaningConfig = serde_json::from_value(value)
            .map_err(|err| PipelineError::Config(err.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Checks numeric ranges that serde cannot express.
    pub fn validate(&self) -> Result<(), PipelineError> {
        if !self.outliers.threshold.is_finite() || self.outliers.threshold <= 0.0 {
            return Err(PipelineError::Config(format!(
                "outlier threshold must be a positive finite number, got {}",
                self.outliers.threshold
            )));
        }
        Ok(())
    }
}
