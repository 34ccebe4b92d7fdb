//! Core data model for the Vantage analytics pipeline.
//!
//! This crate defines the shared vocabulary used by every other workspace
//! crate: entity records and their identifiers, the loosely typed cell model,
//! closed enumerations for statuses and decisions, cleaning configuration
//! documents, snapshot statistics, and the shared error taxonomy.

pub mod cell;
pub mod config;
pub mod entities;
pub mod enums;
pub mod envelope;
pub mod error;
pub mod ids;
pub mod profile;
pub mod stats;
pub mod table;

pub use cell::CellValue;
pub use config::{
    CleaningConfig, DedupStrategy, DeduplicationConfig, OutlierConfig, OutlierMethod,
};
pub use entities::{
    CleanedTable, CleaningJob, CleaningLogEntry, Dashboard, DataRow, DomainDetectionJob,
    DomainScore, InfeasibleKpi, KpiExtractionJob, KpiSelection, Project, RankedKpi, Relationship,
    SelectedKpi, UnifiedView, Upload, UploadMetadata,
};
pub use enums::{
    ChartKind, CleaningOperation, ColumnType, DomainDecision, DomainJobStatus, ImputationStrategy,
    JobStatus, LogStatus, ProjectStatus, RelationshipKind, RelationshipStatus,
    StandardizationRule, UploadStatus,
};
pub use envelope::ApiEnvelope;
pub use error::{PipelineError, Result};
pub use ids::{
    CleaningJobId, DashboardId, DomainJobId, KpiJobId, ProjectId, RelationshipId, SelectionId,
    UploadId, ViewId,
};
pub use profile::{ColumnProfile, TableProfile};
pub use stats::{JobProgress, SnapshotStats};
pub use table::{Record, SourceTable};
