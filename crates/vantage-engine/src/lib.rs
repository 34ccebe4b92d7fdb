//! Project orchestration.
//!
//! [`engine::ProjectEngine`] stages the pipeline over the record store and
//! exposes the operations behind the external boundary: project lifecycle,
//! per-upload cleaning with a pluggable [`runner::JobRunner`], domain
//! detection and confirmation, relationship detection, unified view
//! generation, KPI extraction and selection, dashboard assembly, and the
//! end-to-end auto-complete path.

pub mod config;
pub mod engine;
pub mod export;
pub mod runner;

pub use config::{EngineConfig, QueueMode};
pub use engine::{
    ALLOWED_UPLOAD_EXTENSIONS, AutoCompleteResult, DataPage, JobReport, JobStatusView,
    MAX_FILES_PER_CALL, MAX_UPLOAD_BYTES, NewProjectFile, ProjectCreation, ProjectEngine,
    ViewBundle,
};
pub use export::ExportFormat;
pub use runner::{InlineRunner, JobRunner, WorkerPool};
