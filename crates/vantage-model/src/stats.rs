//! Snapshot statistics recorded around every cleaning operation.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::enums::CleaningOperation;

/// Aggregate statistics over one table snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SnapshotStats {
    pub total_rows: u64,
    pub total_columns: u64,
    pub null_count: u64,
    pub duplicate_count: u64,
    pub flagged_outliers: u64,
    /// Leading nulls that forward-fill could not replace, per column.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub leading_nulls: BTreeMap<String, u64>,
    /// Values a standardisation rule left unchanged, per column.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub standardization_failures: BTreeMap<String, u64>,
}

/// Progress of a running cleaning job, monotonic across stages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct JobProgress {
    /// Stage currently running or most recently finished.
    pub stage: Option<CleaningOperation>,
    pub percent: u8,
}

impl JobProgress {
    pub fn at_stage(stage: CleaningOperation, finished: bool) -> Self {
        let percent = if finished {
            stage.completion_percent()
        } else {
            stage.completion_percent().saturating_sub(25)
        };
        Self {
            stage: Some(stage),
            percent,
        }
    }

    pub fn done() -> Self {
        Self {
            stage: Some(CleaningOperation::Standardization),
            percent: 100,
        }
    }
}
