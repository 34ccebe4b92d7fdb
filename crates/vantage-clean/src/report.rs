//! Aggregate report over a job's audit log.
//!
//! The report is derived purely from the ordered log entries; it carries no
//! information of its own.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use vantage_model::{CleaningJobId, CleaningLogEntry, CleaningOperation, LogStatus};

/// Summary of one logged operation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OperationSummary {
    pub operation: CleaningOperation,
    pub status: LogStatus,
    pub duration_ms: u64,
    pub rows_before: u64,
    pub rows_after: u64,
    pub error: Option<String>,
}

/// Aggregate view of everything a cleaning job did.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CleaningReport {
    pub job_id: CleaningJobId,
    pub generated_at: DateTime<Utc>,
    pub total_duration_ms: u64,
    pub operations: Vec<OperationSummary>,
    pub rows_before: u64,
    pub rows_after: u64,
    /// Net row change across the whole pipeline; never positive.
    pub row_delta: i64,
    pub success: bool,
}

/// Folds the ordered log entries of one job into a report.
pub fn generate_report(job_id: CleaningJobId, logs: &[CleaningLogEntry]) -> CleaningReport {
    let operations: Vec<OperationSummary> = logs
        .iter()
        .map(|log| OperationSummary {
            operation: log.operation,
            status: log.status,
            duration_ms: log.duration_ms,
            rows_before: log.before_stats.total_rows,
            rows_after: log.after_stats.total_rows,
            error: log.error.clone(),
        })
        .collect();
    let rows_before = logs
        .first()
        .map(|log| log.before_stats.total_rows)
        .unwrap_or(0);
    let rows_after = logs
        .last()
        .map(|log| log.after_stats.total_rows)
        .unwrap_or(0);
    CleaningReport {
        job_id,
        generated_at: Utc::now(),
        total_duration_ms: logs.iter().map(|log| log.duration_ms).sum(),
        operations,
        rows_before,
        rows_after,
        row_delta: rows_after as i64 - rows_before as i64,
        success: logs.iter().all(|log| log.status == LogStatus::Success),
    }
}
