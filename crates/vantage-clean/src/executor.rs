//! Ordered stage execution with audit logging.

use std::collections::BTreeSet;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use chrono::Utc;
use tracing::{debug, info};

use vantage_model::{
    CleaningConfig, CleaningJobId, CleaningLogEntry, LogStatus, PipelineError, Result,
    SnapshotStats, SourceTable, TableProfile,
};

use crate::dedupe::DedupStage;
use crate::impute::ImputationStage;
use crate::outliers::OutlierStage;
use crate::stage::{CleaningStage, StageContext, StageOutcome};
use crate::standardize::StandardizationStage;
use crate::stats::snapshot;

/// Default per-stage timeout of ten minutes.
pub const DEFAULT_STAGE_TIMEOUT: Duration = Duration::from_secs(600);

/// Execution options for one pipeline run.
#[derive(Debug, Clone, Default)]
pub struct ExecutorOptions {
    /// Per-stage wall-clock budget; `None` uses [`DEFAULT_STAGE_TIMEOUT`].
    pub stage_timeout: Option<Duration>,
    /// Observed between stages; a set flag fails the job with reason
    /// `cancelled`.
    pub cancel: Option<Arc<AtomicBool>>,
    /// Country code for phone standardisation.
    pub default_country_code: String,
}

/// Result of a completed pipeline run.
#[derive(Debug, Clone)]
pub struct CleaningOutcome {
    pub table: SourceTable,
    pub logs: Vec<CleaningLogEntry>,
    pub final_stats: SnapshotStats,
    pub flagged_rows: BTreeSet<u64>,
}

/// Runs the four stages in their fixed order over a working copy of the
/// table. Each stage emits one log entry through `on_log` as soon as it
/// finishes, so observers see progress while the job runs. The first stage
/// error stops the pipeline; partial results are dropped and only the logs
/// remain as diagnostics.
pub fn run_pipeline(
    job_id: CleaningJobId,
    input: &SourceTable,
    config: &CleaningConfig,
    profile: &TableProfile,
    options: &ExecutorOptions,
    mut on_log: impl FnMut(&CleaningLogEntry),
) -> Result<CleaningOutcome> {
    config.validate()?;

    let stages: [Box<dyn CleaningStage>; 4] = [
        Box::new(ImputationStage),
        Box::new(OutlierStage),
        Box::new(DedupStage),
        Box::new(StandardizationStage),
    ];
    let timeout = options.stage_timeout.unwrap_or(DEFAULT_STAGE_TIMEOUT);
    let country = if options.default_country_code.is_empty() {
        "1"
    } else {
        options.default_country_code.as_str()
    };
    let ctx = StageContext {
        config,
        profile,
        default_country_code: country,
    };

    let mut table = input.clone();
    let mut logs = Vec::with_capacity(stages.len());
    let mut flagged: BTreeSet<u64> = BTreeSet::new();
    let mut carried = StageOutcome::default();

    for stage in &stages {
        let operation = stage.operation();
        if let Some(cancel) = &options.cancel
            && cancel.load(Ordering::Acquire)
        {
            return Err(PipelineError::Stage {
                operation,
                message: "cancelled".to_string(),
            });
        }

        let before = with_findings(snapshot(&table, profile, flagged.len() as u64), &carried);
        let started = Instant::now();
        let result = stage.apply(&mut table, &ctx);
        let duration = started.elapsed();

        match result {
            Ok(outcome) => {
                if duration > timeout {
                    let entry = log_entry(
                        job_id,
                        stage.as_ref(),
                        &ctx,
                        &before,
                        &before,
                        duration,
                        LogStatus::Error,
                        Some(format!("stage timeout after {}ms", duration.as_millis())),
                    );
                    on_log(&entry);
                    logs.push(entry);
                    return Err(PipelineError::Stage {
                        operation,
                        message: "timeout".to_string(),
                    });
                }
                flagged.extend(outcome.flagged_rows.iter().copied());
                carried.leading_nulls.extend(outcome.leading_nulls.clone());
                carried
                    .standardization_failures
                    .extend(outcome.standardization_failures.clone());
                let after =
                    with_findings(snapshot(&table, profile, flagged.len() as u64), &carried);
                let entry = log_entry(
                    job_id,
                    stage.as_ref(),
                    &ctx,
                    &before,
                    &after,
                    duration,
                    LogStatus::Success,
                    None,
                );
                debug!(
                    job_id = %job_id,
                    operation = %operation,
                    input_rows = before.total_rows,
                    output_rows = after.total_rows,
                    duration_ms = duration.as_millis() as u64,
                    "stage complete"
                );
                on_log(&entry);
                logs.push(entry);
            }
            Err(error) => {
                let entry = log_entry(
                    job_id,
                    stage.as_ref(),
                    &ctx,
                    &before,
                    &before,
                    duration,
                    LogStatus::Error,
                    Some(error.to_string()),
                );
                on_log(&entry);
                logs.push(entry);
                return Err(PipelineError::Stage {
                    operation,
                    message: error.to_string(),
                });
            }
        }
    }

    let final_stats = with_findings(snapshot(&table, profile, flagged.len() as u64), &carried);
    info!(
        job_id = %job_id,
        input_rows = input.height(),
        output_rows = table.height(),
        flagged = flagged.len(),
        "cleaning pipeline complete"
    );
    Ok(CleaningOutcome {
        table,
        logs,
        final_stats,
        flagged_rows: flagged,
    })
}

fn with_findings(mut stats: SnapshotStats, carried: &StageOutcome) -> SnapshotStats {
    stats.leading_nulls = carried.leading_nulls.clone();
    stats.standardization_failures = carried.standardization_failures.clone();
    stats
}

#[allow(clippy::too_many_arguments)]
fn log_entry(
    job_id: CleaningJobId,
    stage: &dyn CleaningStage,
    ctx: &StageContext<'_>,
    before: &SnapshotStats,
    after: &SnapshotStats,
    duration: Duration,
    status: LogStatus,
    error: Option<String>,
) -> CleaningLogEntry {
    CleaningLogEntry {
        job_id,
        timestamp: Utc::now(),
        operation: stage.operation(),
        before_stats: before.clone(),
        after_stats: after.clone(),
        config: stage.config_snapshot(ctx),
        duration_ms: duration.as_millis() as u64,
        status,
        error,
    }
}
