//! The project orchestrator.
//!
//! Exposes the typed operations behind the external boundary and enforces
//! the stage preconditions: cleaning is per-upload and may run in
//! parallel, domain detection waits for every cleaning job in its set,
//! relationship detection and view generation run sequentially after it,
//! and auto-complete chains domain, relationships, view, KPI extraction
//! and dashboard assembly, failing fast with the first stage's error.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Instant;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{info, info_span, warn};

use vantage_clean::{
    CleaningReport, ExecutorOptions, build_auto_config, generate_report, merge_with_defaults,
    run_pipeline,
};
use vantage_classify::{Classification, classify};
use vantage_dashboard::{AssemblyInput, assemble_dashboard};
use vantage_ingest::{parse_file, profile_table};
use vantage_kpi::{extract_kpis as run_extraction, select_kpis as confirm_kpis};
use vantage_link::{DetectedRelationship, JoinEdge, TableRef, ViewTable, build_views,
    detect_relationships};
use vantage_model::{
    CleanedTable, CleaningConfig, CleaningJob, CleaningJobId, CleaningLogEntry, ColumnProfile,
    Dashboard, DashboardId, DataRow, DomainDecision, DomainDetectionJob, DomainJobId,
    DomainJobStatus, DomainScore, JobProgress, JobStatus, KpiExtractionJob, KpiJobId,
    KpiSelection, PipelineError, Project, ProjectId, ProjectStatus, RankedKpi, Record,
    Relationship, RelationshipId, RelationshipStatus, Result, SelectionId, SourceTable,
    TableProfile, UnifiedView, Upload, UploadId, UploadMetadata, UploadStatus, ViewId,
};
use vantage_standards::StandardsRegistry;
use vantage_store::{CleanedEntry, DataStore, LogSink, UploadVault, cleaned_table_name};

use crate::config::{EngineConfig, QueueMode};
use crate::export::{ExportFormat, export_table};
use crate::runner::{InlineRunner, JobRunner, WorkerPool};

/// Upload ingress limits.
pub const MAX_UPLOAD_BYTES: u64 = 100 * 1024 * 1024;
pub const MAX_FILES_PER_CALL: usize = 10;
pub const ALLOWED_UPLOAD_EXTENSIONS: [&str; 4] = ["csv", "xlsx", "xls", "json"];

/// One file offered to project creation.
#[derive(Debug, Clone)]
pub struct NewProjectFile {
    pub original_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

/// Result of project creation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectCreation {
    pub project: Project,
    pub uploads: Vec<Upload>,
}

/// Polled view of a cleaning job.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobStatusView {
    pub status: JobStatus,
    pub progress: JobProgress,
    pub stats: Option<vantage_model::SnapshotStats>,
    pub error: Option<String>,
}

/// Audit log plus aggregate summary for one job.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobReport {
    pub logs: Vec<CleaningLogEntry>,
    pub summary: CleaningReport,
}

/// One page of cleaned rows.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataPage {
    pub columns: Vec<String>,
    pub rows: Vec<Record>,
    pub total: u64,
    pub page: u64,
    pub limit: u64,
}

/// Views plus the artefacts the composite view call produces.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ViewBundle {
    pub views: Vec<UnifiedView>,
    pub kpi_job: Option<KpiExtractionJob>,
    pub dashboard: Option<Dashboard>,
}

/// Composite payload of the end-to-end run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AutoCompleteResult {
    pub domain_job: DomainDetectionJob,
    pub relationships: Vec<Relationship>,
    pub views: Vec<UnifiedView>,
    pub kpi_job: KpiExtractionJob,
    pub dashboard: Dashboard,
}

/// The orchestrator. Cheap to share behind an [`Arc`]; all state lives in
/// the record store.
pub struct ProjectEngine {
    store: Arc<DataStore>,
    registry: Arc<StandardsRegistry>,
    config: EngineConfig,
    vault: UploadVault,
    log_sink: LogSink,
    runner: Box<dyn JobRunner>,
    cancel_flags: Mutex<BTreeMap<CleaningJobId, Arc<AtomicBool>>>,
}

impl ProjectEngine {
    pub fn new(
        config: EngineConfig,
        store: Arc<DataStore>,
        registry: Arc<StandardsRegistry>,
    ) -> Result<Self> {
        config.validate()?;
        let vault = UploadVault::new(&config.upload_dir)?;
        let log_sink = LogSink::new(&config.logs_dir)?;
        let runner: Box<dyn JobRunner> = match config.queue {
            QueueMode::Inline => Box::new(InlineRunner),
            QueueMode::WorkerPool => Box::new(WorkerPool::new(config.max_parallel_cleans)),
        };
        Ok(Self {
            store,
            registry,
            config,
            vault,
            log_sink,
            runner,
            cancel_flags: Mutex::new(BTreeMap::new()),
        })
    }

    pub fn store(&self) -> &Arc<DataStore> {
        &self.store
    }

    pub fn registry(&self) -> &Arc<StandardsRegistry> {
        &self.registry
    }

    // ==================================================================
    // Project lifecycle
    // ==================================================================

    /// Creates a project and one upload per file. Individual files that
    /// fail to parse become failed uploads; the project itself survives.
    pub fn create_project(
        &self,
        name: &str,
        description: Option<&str>,
        files: Vec<NewProjectFile>,
    ) -> Result<ProjectCreation> {
        let name = name.trim();
        if name.is_empty() {
            return Err(PipelineError::PreconditionFailed(
                "project name is required".to_string(),
            ));
        }
        if files.is_empty() {
            return Err(PipelineError::PreconditionFailed(
                "at least one file is required".to_string(),
            ));
        }
        if files.len() > MAX_FILES_PER_CALL {
            return Err(PipelineError::PreconditionFailed(format!(
                "at most {MAX_FILES_PER_CALL} files per call, got {}",
                files.len()
            )));
        }
        for file in &files {
            if file.bytes.len() as u64 > MAX_UPLOAD_BYTES {
                return Err(PipelineError::PreconditionFailed(format!(
                    "{} exceeds the {MAX_UPLOAD_BYTES} byte limit",
                    file.original_name
                )));
            }
            let extension = file
                .original_name
                .rsplit_once('.')
                .map(|(_, ext)| ext.to_lowercase())
                .unwrap_or_default();
            if !ALLOWED_UPLOAD_EXTENSIONS.contains(&extension.as_str()) {
                return Err(PipelineError::UnsupportedFormat(format!(
                    "{} is not an accepted upload type",
                    file.original_name
                )));
            }
        }

        let span = info_span!("create_project", project_name = %name, file_count = files.len());
        let _guard = span.enter();
        let started = Instant::now();

        let project = Project {
            id: ProjectId::new(),
            name: name.to_string(),
            description: description.map(str::to_string),
            status: ProjectStatus::Active,
            file_count: 0,
            total_records: 0,
            detected_domain: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        self.store.insert_project(project.clone());

        let mut uploads = Vec::with_capacity(files.len());
        for file in files {
            uploads.push(self.ingest_file(project.id, file));
        }

        let project = self.store.project(project.id)?;
        info!(
            project = %project.id,
            file_count = project.file_count,
            record_count = project.total_records,
            duration_ms = started.elapsed().as_millis() as u64,
            "project created"
        );
        Ok(ProjectCreation { project, uploads })
    }

    fn ingest_file(&self, project_id: ProjectId, file: NewProjectFile) -> Upload {
        let upload_id = UploadId::new();
        let size_bytes = file.bytes.len() as u64;
        let now = Utc::now();
        let table_name = cleaned_table_name(upload_id, now.timestamp_millis());

        let stored = match self.vault.store(&file.original_name, &file.bytes) {
            Ok(stored) => stored,
            Err(err) => {
                let upload = Upload {
                    id: upload_id,
                    project_id,
                    original_filename: file.original_name.clone(),
                    stored_filename: String::new(),
                    content_type: file.content_type.clone(),
                    size_bytes,
                    status: UploadStatus::Failed,
                    records_processed: 0,
                    total_records: 0,
                    table_name,
                    error: Some(format!("{}: could not store upload", err.tag())),
                    metadata: UploadMetadata::default(),
                    created_at: now,
                    updated_at: now,
                };
                self.store.insert_upload(
                    upload.clone(),
                    SourceTable::new(Vec::new()),
                    TableProfile::default(),
                );
                return upload;
            }
        };

        match parse_file(&stored.path, &file.original_name, &file.content_type) {
            Ok(parsed) => {
                let profile = profile_table(&parsed.table);
                let total = parsed.table.height() as u64;
                let upload = Upload {
                    id: upload_id,
                    project_id,
                    original_filename: file.original_name,
                    stored_filename: stored.stored_filename,
                    content_type: file.content_type,
                    size_bytes,
                    status: UploadStatus::Completed,
                    records_processed: total,
                    total_records: total,
                    table_name,
                    error: None,
                    metadata: UploadMetadata {
                        columns: parsed.table.columns.clone(),
                        extra_sheets: parsed.extra_sheets,
                    },
                    created_at: now,
                    updated_at: Utc::now(),
                };
                self.store.insert_upload(upload.clone(), parsed.table, profile);
                upload
            }
            Err(err) => {
                let upload = Upload {
                    id: upload_id,
                    project_id,
                    original_filename: file.original_name,
                    stored_filename: stored.stored_filename,
                    content_type: file.content_type,
                    size_bytes,
                    status: UploadStatus::Failed,
                    records_processed: 0,
                    total_records: 0,
                    table_name,
                    error: Some(err.to_string()),
                    metadata: UploadMetadata::default(),
                    created_at: now,
                    updated_at: Utc::now(),
                };
                self.store.insert_upload(
                    upload.clone(),
                    SourceTable::new(Vec::new()),
                    TableProfile::default(),
                );
                upload
            }
        }
    }

    pub fn list_projects(&self) -> Vec<Project> {
        self.store.projects()
    }

    pub fn project(&self, id: ProjectId) -> Result<Project> {
        self.store.project(id)
    }

    pub fn delete_project(&self, id: ProjectId) -> Result<()> {
        self.store.delete_project(id)
    }

    /// Paginated view of an upload's parsed source rows, as ingested.
    pub fn upload_rows(&self, upload_id: UploadId, page: u64, limit: u64) -> Result<Vec<DataRow>> {
        let table = self.store.upload_table(upload_id)?;
        let limit = limit.clamp(1, 1000);
        let start = ((page.max(1) - 1) * limit) as usize;
        Ok(table
            .rows
            .into_iter()
            .skip(start)
            .take(limit as usize)
            .map(|payload| DataRow { upload_id, payload })
            .collect())
    }

    /// Union of columns across the project's uploads.
    pub fn project_columns(&self, id: ProjectId) -> Result<Vec<String>> {
        self.store.project(id)?;
        let mut seen = BTreeSet::new();
        let mut columns = Vec::new();
        for upload in self.store.uploads_for_project(id) {
            for column in upload.metadata.columns {
                if seen.insert(column.clone()) {
                    columns.push(column);
                }
            }
        }
        Ok(columns)
    }

    // ==================================================================
    // Cleaning
    // ==================================================================

    /// Auto-configuration prefilled from the detector. Deterministic for
    /// an unchanged upload.
    pub fn auto_config(&self, upload_id: UploadId) -> Result<CleaningConfig> {
        let table = self.store.upload_table(upload_id)?;
        let profile = self.store.upload_profile(upload_id)?;
        Ok(build_auto_config(&table, &profile))
    }

    /// Starts cleaning one upload. Submission is idempotent on the upload
    /// id: a running job is returned as-is instead of starting another.
    pub fn start_cleaning(
        &self,
        upload_id: UploadId,
        config: Option<CleaningConfig>,
    ) -> Result<CleaningJob> {
        if let Some(running) = self.store.running_job_for_upload(upload_id) {
            return Ok(running);
        }
        let upload = self.store.upload(upload_id)?;
        if upload.status != UploadStatus::Completed {
            return Err(PipelineError::PreconditionFailed(format!(
                "upload {upload_id} is not ready for cleaning"
            )));
        }
        let table = self.store.upload_table(upload_id)?;
        let profile = self.store.upload_profile(upload_id)?;
        let defaults = build_auto_config(&table, &profile);
        let config = match config {
            Some(config) => {
                config.validate()?;
                // Columns the caller never mentioned inherit the
                // auto-configured strategies.
                merge_with_defaults(config, &defaults)
            }
            None => defaults,
        };

        let job_id = CleaningJobId::new();
        let cleaned_table = cleaned_table_name(upload_id, Utc::now().timestamp_millis());
        let before_stats = vantage_clean::snapshot(&table, &profile, 0);
        let job = CleaningJob {
            id: job_id,
            project_id: upload.project_id,
            upload_id,
            config: config.clone(),
            status: JobStatus::Running,
            progress: JobProgress::default(),
            before_stats,
            after_stats: None,
            cleaned_table: cleaned_table.clone(),
            error: None,
            created_at: Utc::now(),
            completed_at: None,
        };
        self.store.insert_job(job.clone());

        let cancel = Arc::new(AtomicBool::new(false));
        self.cancel_flags
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .insert(job_id, Arc::clone(&cancel));

        let store = Arc::clone(&self.store);
        let log_sink = self.log_sink.clone();
        let options = ExecutorOptions {
            stage_timeout: Some(self.config.stage_timeout()),
            cancel: Some(cancel),
            default_country_code: self.config.default_country_code.clone(),
        };
        let project_id = upload.project_id;

        self.runner.submit(Box::new(move || {
            let span = info_span!("cleaning_job", job_id = %job_id, upload_id = %upload_id);
            let _guard = span.enter();
            let result = run_pipeline(job_id, &table, &config, &profile, &options, |entry| {
                store.append_log(entry.clone());
                let _ = store.set_job_progress(
                    job_id,
                    JobProgress::at_stage(entry.operation, true),
                );
                if let Err(err) = log_sink.write_operation(entry) {
                    warn!(job_id = %job_id, error = %err, "operation log write failed");
                }
            });
            match result {
                Ok(outcome) => {
                    let cleaned_profile = profile_table(&outcome.table);
                    let cleaned = CleanedTable {
                        table_name: cleaned_table.clone(),
                        job_id,
                        project_id,
                        columns: outcome.table.columns.clone(),
                        rows: outcome.table.rows.clone(),
                        created_at: Utc::now(),
                    };
                    store.insert_cleaned(cleaned, cleaned_profile);
                    let _ = store.complete_job(job_id, outcome.final_stats.clone());
                    let report = generate_report(job_id, &outcome.logs);
                    if let Err(err) = log_sink.write_comprehensive(job_id, &report) {
                        warn!(job_id = %job_id, error = %err, "report write failed");
                    }
                }
                Err(err) => {
                    let _ = store.fail_job(job_id, err.to_string());
                }
            }
        }));

        self.store.job(job_id)
    }

    /// Starts cleaning for every completed upload in the project.
    pub fn clean_project(&self, project_id: ProjectId) -> Result<Vec<CleaningJob>> {
        self.store.project(project_id)?;
        let uploads = self.store.uploads_for_project(project_id);
        if uploads.is_empty() {
            return Err(PipelineError::PreconditionFailed(
                "project has no uploads".to_string(),
            ));
        }
        let mut jobs = Vec::new();
        for upload in uploads {
            if upload.status == UploadStatus::Completed {
                jobs.push(self.start_cleaning(upload.id, None)?);
            }
        }
        Ok(jobs)
    }

    /// Requests cancellation; the job observes the flag at its next stage
    /// boundary.
    pub fn cancel_cleaning(&self, job_id: CleaningJobId) -> Result<()> {
        self.store.job(job_id)?;
        let flags = self.cancel_flags.lock().unwrap_or_else(|p| p.into_inner());
        match flags.get(&job_id) {
            Some(flag) => {
                flag.store(true, Ordering::Release);
                Ok(())
            }
            None => Err(PipelineError::NotFound(format!(
                "cancellation handle for job {job_id}"
            ))),
        }
    }

    pub fn job_status(&self, job_id: CleaningJobId) -> Result<JobStatusView> {
        let job = self.store.job(job_id)?;
        Ok(JobStatusView {
            status: job.status,
            progress: job.progress,
            stats: job.after_stats,
            error: job.error,
        })
    }

    pub fn job_report(&self, job_id: CleaningJobId) -> Result<JobReport> {
        self.store.job(job_id)?;
        let logs = self.store.logs(job_id);
        let summary = generate_report(job_id, &logs);
        Ok(JobReport { logs, summary })
    }

    /// Paginated cleaned rows. Pages are 1-based.
    pub fn cleaned_page(&self, job_id: CleaningJobId, page: u64, limit: u64) -> Result<DataPage> {
        let job = self.completed_job(job_id)?;
        let entry = self.store.cleaned(&job.cleaned_table)?;
        let limit = limit.clamp(1, 1000);
        let page = page.max(1);
        let start = ((page - 1) * limit) as usize;
        let rows: Vec<Record> = entry
            .table
            .rows
            .iter()
            .skip(start)
            .take(limit as usize)
            .cloned()
            .collect();
        Ok(DataPage {
            columns: entry.table.columns.clone(),
            total: entry.table.rows.len() as u64,
            rows,
            page,
            limit,
        })
    }

    /// Full cleaned dataset in the requested format, with the surrogate
    /// `id` and `created_at` columns of the dynamic table schema.
    pub fn export_cleaned(&self, job_id: CleaningJobId, format: ExportFormat) -> Result<String> {
        let job = self.completed_job(job_id)?;
        let entry = self.store.cleaned(&job.cleaned_table)?;
        let table = SourceTable {
            columns: entry.table.columns.clone(),
            rows: entry.table.rows.clone(),
        };
        export_table(&table, format)
    }

    fn completed_job(&self, job_id: CleaningJobId) -> Result<CleaningJob> {
        let job = self.store.job(job_id)?;
        if job.status != JobStatus::Completed {
            return Err(PipelineError::PreconditionFailed(format!(
                "cleaning job {job_id} is {}",
                job.status
            )));
        }
        Ok(job)
    }

    // ==================================================================
    // Domain detection
    // ==================================================================

    /// Project-level classification over the union of cleaned columns.
    /// Every cleaning job in the set must be completed first.
    pub fn detect_domain_project(
        &self,
        project_id: ProjectId,
        cleaning_job_ids: Option<Vec<CleaningJobId>>,
    ) -> Result<DomainDetectionJob> {
        self.store.project(project_id)?;
        let jobs: Vec<CleaningJob> = match cleaning_job_ids {
            Some(ids) => ids
                .into_iter()
                .map(|id| self.store.job(id))
                .collect::<Result<Vec<_>>>()?,
            None => self.store.jobs_for_project(project_id),
        };
        if jobs.is_empty() {
            return Err(PipelineError::PreconditionFailed(
                "no cleaning jobs to classify".to_string(),
            ));
        }
        for job in &jobs {
            if job.status != JobStatus::Completed {
                return Err(PipelineError::PreconditionFailed(format!(
                    "cleaning job {} is {}",
                    job.id, job.status
                )));
            }
        }

        let mut universe = Vec::new();
        let mut seen = BTreeSet::new();
        for job in &jobs {
            let entry = self.store.cleaned(&job.cleaned_table)?;
            for column in entry.table.columns {
                if seen.insert(column.clone()) {
                    universe.push(column);
                }
            }
        }

        let classification = classify(&universe, &self.registry.signatures);
        let job = self.persist_classification(project_id, &jobs, classification)?;
        Ok(job)
    }

    /// Single-file variant over one cleaning job.
    pub fn detect_domain(&self, cleaning_job_id: CleaningJobId) -> Result<DomainDetectionJob> {
        let job = self.store.job(cleaning_job_id)?;
        self.detect_domain_project(job.project_id, Some(vec![cleaning_job_id]))
    }

    fn persist_classification(
        &self,
        project_id: ProjectId,
        jobs: &[CleaningJob],
        classification: Classification,
    ) -> Result<DomainDetectionJob> {
        let all_scores: BTreeMap<String, DomainScore> = classification.all_scores;
        let job = DomainDetectionJob {
            id: DomainJobId::new(),
            project_id,
            cleaning_job_ids: jobs.iter().map(|job| job.id).collect(),
            detected_domain: classification.domain.clone(),
            confidence: classification.confidence,
            decision: classification.decision,
            primary_matches: classification.primary_matches,
            keyword_matches: classification.keyword_matches,
            top_alternatives: classification.top_alternatives,
            all_scores,
            status: DomainJobStatus::Completed,
            created_at: Utc::now(),
        };
        self.store.insert_domain_job(job.clone());
        if job.decision == DomainDecision::AutoDetect {
            self.store.set_project_domain(project_id, &job.detected_domain)?;
        }
        Ok(job)
    }

    /// Confirms a domain choice, which may differ from the detected one.
    pub fn confirm_domain(
        &self,
        domain_job_id: DomainJobId,
        selected_domain: &str,
    ) -> Result<DomainDetectionJob> {
        if !self.registry.signatures.contains(selected_domain) {
            return Err(PipelineError::UnknownDomain(selected_domain.to_string()));
        }
        let job = self.store.confirm_domain_job(domain_job_id, selected_domain)?;
        self.store.set_project_domain(job.project_id, selected_domain)?;
        Ok(job)
    }

    pub fn domain_job(&self, id: DomainJobId) -> Result<DomainDetectionJob> {
        self.store.domain_job(id)
    }

    pub fn domain_jobs(&self) -> Vec<DomainDetectionJob> {
        self.store.domain_jobs()
    }

    // ==================================================================
    // Relationships and unified views
    // ==================================================================

    /// Detects relationships across the project's cleaned tables.
    pub fn detect_project_relationships(&self, project_id: ProjectId) -> Result<Vec<Relationship>> {
        self.store.project(project_id)?;
        if self.store.uploads_for_project(project_id).len() < 2 {
            return Err(PipelineError::PreconditionFailed(
                "relationship detection needs at least two uploads".to_string(),
            ));
        }
        let entries = self.store.cleaned_for_project(project_id);
        if entries.len() < 2 {
            return Err(PipelineError::PreconditionFailed(
                "relationship detection needs at least two cleaned tables".to_string(),
            ));
        }

        let sources: Vec<(String, SourceTable, TableProfile, chrono::DateTime<Utc>)> = entries
            .iter()
            .map(|entry| {
                let table = SourceTable {
                    columns: entry.table.columns.clone(),
                    rows: entry.table.rows.clone(),
                };
                (
                    entry.table.table_name.clone(),
                    table,
                    entry.profile.clone(),
                    entry.table.created_at,
                )
            })
            .collect();
        let refs: Vec<TableRef<'_>> = sources
            .iter()
            .map(|(name, table, profile, created_at)| TableRef {
                name,
                table,
                profile,
                created_at: *created_at,
            })
            .collect();

        let detected = detect_relationships(&refs);
        let relationships: Vec<Relationship> = detected
            .into_iter()
            .map(|found| to_relationship(project_id, found))
            .collect();
        info!(
            project = %project_id,
            count = relationships.len(),
            "relationship detection complete"
        );
        self.store
            .replace_relationships(project_id, relationships.clone());
        Ok(relationships)
    }

    /// Generates the unified view(s) and, when a confirmed domain exists,
    /// chains KPI extraction and dashboard assembly.
    pub fn create_unified_view(&self, project_id: ProjectId) -> Result<ViewBundle> {
        self.store.project(project_id)?;
        let valid: Vec<Relationship> = self
            .store
            .relationships_for_project(project_id)
            .into_iter()
            .filter(|rel| rel.status == RelationshipStatus::Valid)
            .collect();
        if valid.is_empty() {
            return Err(PipelineError::NoRelationshipsFound);
        }

        let entries = self.store.cleaned_for_project(project_id);
        let tables: Vec<ViewTable> = entries
            .iter()
            .map(|entry| ViewTable {
                name: entry.table.table_name.clone(),
                columns: entry.table.columns.clone(),
                row_count: entry.table.rows.len(),
                created_at: entry.table.created_at,
            })
            .collect();
        let edges: Vec<JoinEdge> = valid.iter().map(to_edge).collect();
        let generated = build_views(&tables, &edges, Utc::now().timestamp_millis())?;

        let views: Vec<UnifiedView> = generated
            .iter()
            .map(|view| UnifiedView {
                id: ViewId::new(),
                project_id,
                view_name: view.view_name.clone(),
                view_sql: view.sql.clone(),
                active: true,
                source_tables: view.tables.clone(),
                created_at: Utc::now(),
            })
            .collect();
        self.store.replace_views(project_id, views.clone());

        // The composite call chains extraction and assembly once a domain
        // has been confirmed; before that, the views alone are returned.
        let domain = self.confirmed_domain(project_id);
        let (kpi_job, dashboard) = match domain {
            Some(domain) => {
                let kpi_job = self.extract_project_kpis(project_id, &domain)?;
                let dashboard = self.build_dashboard(project_id, &domain, &kpi_job, None)?;
                (Some(kpi_job), Some(dashboard))
            }
            None => (None, None),
        };

        Ok(ViewBundle {
            views,
            kpi_job,
            dashboard,
        })
    }

    fn confirmed_domain(&self, project_id: ProjectId) -> Option<String> {
        if let Some(job) = self.store.confirmed_domain_job(project_id) {
            return Some(job.detected_domain);
        }
        self.store
            .project(project_id)
            .ok()
            .and_then(|project| project.detected_domain)
    }

    // ==================================================================
    // KPIs and dashboards
    // ==================================================================

    /// Extraction for an explicit cleaning job + domain job pair.
    pub fn extract_kpis(
        &self,
        cleaning_job_id: CleaningJobId,
        domain_job_id: DomainJobId,
    ) -> Result<KpiExtractionJob> {
        let domain_job = self.store.domain_job(domain_job_id)?;
        let confirmed = domain_job.status == DomainJobStatus::Confirmed
            || domain_job.decision == DomainDecision::AutoDetect;
        if !confirmed {
            return Err(PipelineError::PreconditionFailed(
                "domain must be confirmed before KPI extraction".to_string(),
            ));
        }
        let job = self.completed_job(cleaning_job_id)?;
        let entry = self.store.cleaned(&job.cleaned_table)?;
        self.run_kpi_extraction(
            job.project_id,
            &domain_job.detected_domain,
            entry.table.columns.clone(),
            &entry.profile,
        )
    }

    /// Project-level extraction over the unified view's column set when a
    /// view exists, otherwise over the cleaned tables' union.
    fn extract_project_kpis(&self, project_id: ProjectId, domain: &str) -> Result<KpiExtractionJob> {
        let (columns, profile) = self.kpi_universe(project_id)?;
        self.run_kpi_extraction(project_id, domain, columns, &profile)
    }

    /// Column universe for extraction: the active view's columns (fact
    /// columns unprefixed, dimension columns table-prefixed) when a view
    /// exists, otherwise the union across cleaned tables.
    fn kpi_universe(&self, project_id: ProjectId) -> Result<(Vec<String>, TableProfile)> {
        let entries = self.store.cleaned_for_project(project_id);
        if entries.is_empty() {
            return Err(PipelineError::PreconditionFailed(
                "no cleaned data to extract KPIs from".to_string(),
            ));
        }
        let by_name: BTreeMap<&str, &CleanedEntry> = entries
            .iter()
            .map(|entry| (entry.table.table_name.as_str(), entry))
            .collect();

        let views: Vec<UnifiedView> = self
            .store
            .views_for_project(project_id)
            .into_iter()
            .filter(|view| view.active)
            .collect();

        let mut columns = Vec::new();
        let mut profiles: Vec<ColumnProfile> = Vec::new();
        let mut seen = BTreeSet::new();

        if views.is_empty() {
            for entry in &entries {
                for profile in &entry.profile.columns {
                    if seen.insert(profile.name.clone()) {
                        columns.push(profile.name.clone());
                        profiles.push(profile.clone());
                    }
                }
            }
        } else {
            let edges: Vec<Relationship> = self
                .store
                .relationships_for_project(project_id)
                .into_iter()
                .filter(|rel| rel.status == RelationshipStatus::Valid)
                .collect();
            for view in &views {
                let fact = fact_table_of(view, &edges);
                for table_name in &view.source_tables {
                    let Some(entry) = by_name.get(table_name.as_str()) else {
                        continue;
                    };
                    let is_fact = fact.as_deref() == Some(table_name.as_str());
                    let join_column = edges.iter().find_map(|edge| {
                        if &edge.target_table == table_name {
                            Some(edge.target_column.clone())
                        } else {
                            None
                        }
                    });
                    for profile in &entry.profile.columns {
                        if !is_fact && Some(&profile.name) == join_column.as_ref() {
                            continue;
                        }
                        let name = if is_fact {
                            profile.name.clone()
                        } else {
                            format!("{table_name}_{}", profile.name)
                        };
                        if seen.insert(name.clone()) {
                            columns.push(name.clone());
                            let mut renamed = profile.clone();
                            renamed.name = name;
                            profiles.push(renamed);
                        }
                    }
                }
            }
        }

        Ok((columns, TableProfile { columns: profiles }))
    }

    fn run_kpi_extraction(
        &self,
        project_id: ProjectId,
        domain: &str,
        columns: Vec<String>,
        profile: &TableProfile,
    ) -> Result<KpiExtractionJob> {
        let extraction = run_extraction(
            &self.registry,
            domain,
            &columns,
            profile.has_date_column(),
        )?;
        let job = KpiExtractionJob {
            id: KpiJobId::new(),
            project_id,
            domain: extraction.domain,
            total_kpis: extraction.total_kpis,
            feasible_count: extraction.feasible_count,
            infeasible_count: extraction.infeasible_count,
            avg_completeness: extraction.avg_completeness,
            top_kpis: extraction.top_kpis,
            feasible: extraction.feasible,
            infeasible: extraction.infeasible,
            unresolved_columns: extraction.unresolved_columns,
            column_mapping: extraction.column_mapping,
            created_at: Utc::now(),
        };
        self.store.insert_kpi_job(job.clone());
        Ok(job)
    }

    pub fn kpi_job(&self, id: KpiJobId) -> Result<KpiExtractionJob> {
        self.store.kpi_job(id)
    }

    /// KPI library listing for one domain.
    pub fn kpi_library(&self, domain: &str) -> Result<Vec<vantage_standards::KpiDefinition>> {
        self.registry
            .kpis
            .for_domain(domain)
            .map(<[vantage_standards::KpiDefinition]>::to_vec)
            .ok_or_else(|| PipelineError::UnknownDomain(domain.to_string()))
    }

    /// Confirms a KPI selection out of an extraction job's feasible set.
    pub fn select_kpis(
        &self,
        kpi_job_id: KpiJobId,
        selected_ids: &[String],
    ) -> Result<KpiSelection> {
        let job = self.store.kpi_job(kpi_job_id)?;
        let selected = confirm_kpis(&self.registry.kpis, &job.domain, &job.feasible, selected_ids)?;
        let selection = KpiSelection {
            id: SelectionId::new(),
            kpi_job_id,
            project_id: job.project_id,
            selected,
            created_at: Utc::now(),
        };
        self.store.insert_selection(selection.clone());
        Ok(selection)
    }

    /// Assembles and persists a dashboard from a selection, or from the
    /// extraction's pre-selection when none was confirmed.
    pub fn generate_dashboard(
        &self,
        kpi_job_id: KpiJobId,
        selection_id: Option<SelectionId>,
    ) -> Result<Dashboard> {
        let job = self.store.kpi_job(kpi_job_id)?;
        let domain = job.domain.clone();
        let selection = match selection_id {
            Some(id) => Some(self.store.selection(id)?),
            None => None,
        };
        self.build_dashboard(job.project_id, &domain, &job, selection)
    }

    fn build_dashboard(
        &self,
        project_id: ProjectId,
        domain: &str,
        kpi_job: &KpiExtractionJob,
        selection: Option<KpiSelection>,
    ) -> Result<Dashboard> {
        let selected = match &selection {
            Some(selection) => selection.selected.clone(),
            None => {
                // The pre-selection stands in until the user confirms.
                let ids: Vec<String> = kpi_job
                    .top_kpis
                    .iter()
                    .map(|kpi| kpi.kpi_id.clone())
                    .collect();
                confirm_kpis(&self.registry.kpis, domain, &kpi_job.feasible, &ids)?
            }
        };
        let (_, profile) = self.kpi_universe(project_id)?;
        let view_name = self
            .store
            .views_for_project(project_id)
            .into_iter()
            .find(|view| view.active)
            .map(|view| view.view_name);
        let ranked: Vec<RankedKpi> = kpi_job.feasible.clone();
        let config = assemble_dashboard(&AssemblyInput {
            domain,
            source_view: view_name.as_deref(),
            selected: &selected,
            ranked: &ranked,
            profile: &profile,
        });
        let project = self.store.project(project_id)?;
        let dashboard = Dashboard {
            id: DashboardId::new(),
            project_id,
            title: format!("{} dashboard", project.name),
            description: Some(format!("Generated for the {domain} domain")),
            config,
            status: JobStatus::Completed,
            created_at: Utc::now(),
        };
        self.store.insert_dashboard(dashboard.clone());
        Ok(dashboard)
    }

    pub fn dashboard(&self, id: DashboardId) -> Result<Dashboard> {
        self.store.dashboard(id)
    }

    pub fn latest_dashboard(&self, project_id: ProjectId) -> Option<Dashboard> {
        self.store.latest_dashboard(project_id)
    }

    // ==================================================================
    // Auto-complete
    // ==================================================================

    /// Runs domain detection, relationship detection, view generation,
    /// KPI extraction and dashboard assembly in that exact order, failing
    /// fast with the first stage's error. Prior artefacts stay intact so
    /// the caller can resume from the failed stage.
    pub fn auto_complete(&self, project_id: ProjectId) -> Result<AutoCompleteResult> {
        let project = self.store.project(project_id)?;
        if project.status == ProjectStatus::Processing {
            return Err(PipelineError::PreconditionFailed(
                "project is already processing".to_string(),
            ));
        }
        self.store
            .set_project_status(project_id, ProjectStatus::Processing)?;

        let result = self.auto_complete_stages(project_id);
        match &result {
            Ok(_) => {
                self.store
                    .set_project_status(project_id, ProjectStatus::Completed)?;
            }
            Err(_) => {
                self.store
                    .set_project_status(project_id, ProjectStatus::Failed)?;
            }
        }
        result
    }

    fn auto_complete_stages(&self, project_id: ProjectId) -> Result<AutoCompleteResult> {
        let span = info_span!("auto_complete", project = %project_id);
        let _guard = span.enter();
        let started = Instant::now();

        let domain_job = self.detect_domain_project(project_id, None)?;
        // The end-to-end path takes the top-scoring domain as confirmed.
        let domain_job = self.confirm_domain(domain_job.id, &domain_job.detected_domain.clone())?;

        let relationships = self.detect_project_relationships(project_id)?;
        let bundle = self.create_unified_view(project_id)?;
        let kpi_job = bundle
            .kpi_job
            .ok_or_else(|| PipelineError::PreconditionFailed(
                "KPI extraction did not run".to_string(),
            ))?;
        let dashboard = bundle
            .dashboard
            .ok_or_else(|| PipelineError::PreconditionFailed(
                "dashboard assembly did not run".to_string(),
            ))?;

        info!(
            project = %project_id,
            domain = %domain_job.detected_domain,
            relationship_count = relationships.len(),
            view_count = bundle.views.len(),
            duration_ms = started.elapsed().as_millis() as u64,
            "auto-complete finished"
        );
        Ok(AutoCompleteResult {
            domain_job,
            relationships,
            views: bundle.views,
            kpi_job,
            dashboard,
        })
    }
}

fn to_relationship(project_id: ProjectId, found: DetectedRelationship) -> Relationship {
    Relationship {
        id: RelationshipId::new(),
        project_id,
        source_table: found.source_table,
        source_column: found.source_column,
        target_table: found.target_table,
        target_column: found.target_column,
        match_rate: found.match_rate,
        status: found.status,
        kind: found.kind,
        created_at: Utc::now(),
    }
}

fn to_edge(relationship: &Relationship) -> JoinEdge {
    JoinEdge {
        source_table: relationship.source_table.clone(),
        source_column: relationship.source_column.clone(),
        target_table: relationship.target_table.clone(),
        target_column: relationship.target_column.clone(),
    }
}

/// The table the view's joins hang off: the one referencing the others.
fn fact_table_of(view: &UnifiedView, edges: &[Relationship]) -> Option<String> {
    let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
    for edge in edges {
        if view.source_tables.iter().any(|name| name == &edge.source_table) {
            *counts.entry(edge.source_table.as_str()).or_insert(0) += 1;
        }
    }
    counts
        .into_iter()
        .max_by_key(|(_, count)| *count)
        .map(|(name, _)| name.to_string())
}
