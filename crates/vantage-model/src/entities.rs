//! Persisted entity records.
//!
//! The project is the root aggregate: every other entity carries the id of
//! its owning project (directly or through its parent) and is removed when
//! the project is deleted.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::config::CleaningConfig;
use crate::enums::{
    ChartKind, CleaningOperation, DomainDecision, DomainJobStatus, JobStatus, LogStatus,
    ProjectStatus, RelationshipKind, RelationshipStatus, UploadStatus,
};
use crate::ids::{
    CleaningJobId, DashboardId, DomainJobId, KpiJobId, ProjectId, RelationshipId, SelectionId,
    UploadId, ViewId,
};
use crate::stats::{JobProgress, SnapshotStats};
use crate::table::Record;

/// The root aggregate: one or more related files analysed as a whole.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Project {
    pub id: ProjectId,
    pub name: String,
    pub description: Option<String>,
    pub status: ProjectStatus,
    pub file_count: u64,
    pub total_records: u64,
    pub detected_domain: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Free-form metadata inferred from an uploaded file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UploadMetadata {
    pub columns: Vec<String>,
    /// Worksheet names beyond the first, for spreadsheet uploads.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub extra_sheets: Vec<String>,
}

/// One source file within a project.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Upload {
    pub id: UploadId,
    pub project_id: ProjectId,
    pub original_filename: String,
    pub stored_filename: String,
    pub content_type: String,
    pub size_bytes: u64,
    pub status: UploadStatus,
    pub records_processed: u64,
    pub total_records: u64,
    /// Dynamic table identifier assigned at ingestion.
    pub table_name: String,
    pub error: Option<String>,
    pub metadata: UploadMetadata,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// One parsed record of an upload, exposed through pagination.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataRow {
    pub upload_id: UploadId,
    pub payload: Record,
}

/// One execution of the cleaning pipeline for one upload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CleaningJob {
    pub id: CleaningJobId,
    pub project_id: ProjectId,
    pub upload_id: UploadId,
    pub config: CleaningConfig,
    pub status: JobStatus,
    pub progress: JobProgress,
    pub before_stats: SnapshotStats,
    pub after_stats: Option<SnapshotStats>,
    /// Name of the produced cleaned table.
    pub cleaned_table: String,
    pub error: Option<String>,
    pub created_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

/// One append-only audit entry per stage operation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CleaningLogEntry {
    pub job_id: CleaningJobId,
    pub timestamp: DateTime<Utc>,
    pub operation: CleaningOperation,
    pub before_stats: SnapshotStats,
    pub after_stats: SnapshotStats,
    /// Configuration slice the stage ran with.
    pub config: serde_json::Value,
    pub duration_ms: u64,
    pub status: LogStatus,
    pub error: Option<String>,
}

/// Materialised cleaned rows under a unique table name.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CleanedTable {
    pub table_name: String,
    pub job_id: CleaningJobId,
    pub project_id: ProjectId,
    pub columns: Vec<String>,
    pub rows: Vec<Record>,
    pub created_at: DateTime<Utc>,
}

/// Score of one candidate domain.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DomainScore {
    pub score: u32,
    pub max_score: u32,
    /// Percentage in [0, 100].
    pub confidence: u8,
}

/// Project-level classification outcome.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DomainDetectionJob {
    pub id: DomainJobId,
    pub project_id: ProjectId,
    pub cleaning_job_ids: Vec<CleaningJobId>,
    pub detected_domain: String,
    pub confidence: u8,
    pub decision: DomainDecision,
    pub primary_matches: Vec<String>,
    pub keyword_matches: Vec<String>,
    /// Top three alternatives offered when confidence is in the review band.
    pub top_alternatives: Vec<String>,
    /// Complete score map over the signature library.
    pub all_scores: BTreeMap<String, DomainScore>,
    pub status: DomainJobStatus,
    pub created_at: DateTime<Utc>,
}

/// One detected or user-specified link between two cleaned tables.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Relationship {
    pub id: RelationshipId,
    pub project_id: ProjectId,
    /// Table holding the referencing column (the many side).
    pub source_table: String,
    pub source_column: String,
    /// Table holding the referenced column (the one side).
    pub target_table: String,
    pub target_column: String,
    /// Fraction of distinct source values present on the target side.
    pub match_rate: f64,
    pub status: RelationshipStatus,
    pub kind: RelationshipKind,
    pub created_at: DateTime<Utc>,
}

/// A SQL view definition over the project's cleaned tables.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UnifiedView {
    pub id: ViewId,
    pub project_id: ProjectId,
    pub view_name: String,
    pub view_sql: String,
    pub active: bool,
    /// Tables the view reads from; deleting any of them invalidates it.
    pub source_tables: Vec<String>,
    pub created_at: DateTime<Utc>,
}

/// A feasible KPI with its ranking outcome.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RankedKpi {
    pub kpi_id: String,
    pub name: String,
    pub category: String,
    pub priority: u8,
    pub formula_expr: String,
    pub completeness: f64,
    pub score: f64,
    /// Canonical column name to actual user column.
    pub resolved_columns: BTreeMap<String, String>,
    pub chart_hint: Option<String>,
    pub unit: Option<String>,
    pub description: Option<String>,
}

/// A KPI that failed the feasibility threshold, with the reason.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InfeasibleKpi {
    pub kpi_id: String,
    pub name: String,
    pub completeness: f64,
    pub missing_columns: Vec<String>,
    pub reason: String,
}

/// One ranking pass over the KPI library for a confirmed domain.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KpiExtractionJob {
    pub id: KpiJobId,
    pub project_id: ProjectId,
    pub domain: String,
    pub total_kpis: u64,
    pub feasible_count: u64,
    pub infeasible_count: u64,
    pub avg_completeness: f64,
    /// Pre-selection of at most ten KPIs, ranked.
    pub top_kpis: Vec<RankedKpi>,
    pub feasible: Vec<RankedKpi>,
    pub infeasible: Vec<InfeasibleKpi>,
    /// User columns no canonical name claimed.
    pub unresolved_columns: Vec<String>,
    /// Canonical column name to actual user column.
    pub column_mapping: BTreeMap<String, String>,
    pub created_at: DateTime<Utc>,
}

/// A user-confirmed KPI.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SelectedKpi {
    pub kpi_id: String,
    pub name: String,
    pub formula_expr: String,
    pub required_columns: Vec<String>,
    pub resolved_columns: BTreeMap<String, String>,
    pub priority: u8,
    pub category: String,
}

/// A confirmed set of KPIs from one extraction job.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KpiSelection {
    pub id: SelectionId,
    pub kpi_job_id: KpiJobId,
    pub project_id: ProjectId,
    pub selected: Vec<SelectedKpi>,
    pub created_at: DateTime<Utc>,
}

/// One KPI card of a dashboard.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KpiCardSpec {
    pub kpi_id: String,
    pub title: String,
    pub formula_expr: String,
    pub unit: Option<String>,
}

/// One dataset drawn inside a chart.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatasetSpec {
    pub label: String,
    pub source_column: String,
    pub color: String,
}

/// One typed chart specification.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChartSpec {
    pub kind: ChartKind,
    pub title: String,
    /// Columns supplying the category or x axis.
    pub labels: Vec<String>,
    pub datasets: Vec<DatasetSpec>,
}

/// Dashboard metadata block.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DashboardMetadata {
    pub generated_at: DateTime<Utc>,
    pub domain: String,
    pub source_view: Option<String>,
}

/// The assembled dashboard configuration document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DashboardConfig {
    pub kpis: Vec<KpiCardSpec>,
    pub charts: Vec<ChartSpec>,
    pub metadata: DashboardMetadata,
}

/// The assembled presentation plan for a project.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Dashboard {
    pub id: DashboardId,
    pub project_id: ProjectId,
    pub title: String,
    pub description: Option<String>,
    pub config: DashboardConfig,
    pub status: JobStatus,
    pub created_at: DateTime<Utc>,
}
