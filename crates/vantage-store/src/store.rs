//! The in-memory record store.

use std::collections::BTreeMap;
use std::sync::Mutex;

use chrono::Utc;
use tracing::info;

use vantage_model::{
    CleanedTable, CleaningJob, CleaningJobId, CleaningLogEntry, Dashboard, DashboardId,
    DomainDetectionJob, DomainJobId, DomainJobStatus, JobProgress, JobStatus, KpiExtractionJob,
    KpiJobId, KpiSelection, PipelineError, Project, ProjectId, ProjectStatus, Relationship,
    Result, SelectionId, SnapshotStats, SourceTable, TableProfile, UnifiedView, Upload, UploadId,
    UploadStatus, ViewId,
};

/// A cleaned table together with the profile of its columns.
#[derive(Debug, Clone)]
pub struct CleanedEntry {
    pub table: CleanedTable,
    pub profile: TableProfile,
}

#[derive(Debug, Default)]
struct StoreInner {
    projects: BTreeMap<ProjectId, Project>,
    uploads: BTreeMap<UploadId, Upload>,
    upload_tables: BTreeMap<UploadId, SourceTable>,
    upload_profiles: BTreeMap<UploadId, TableProfile>,
    jobs: BTreeMap<CleaningJobId, CleaningJob>,
    logs: BTreeMap<CleaningJobId, Vec<CleaningLogEntry>>,
    cleaned: BTreeMap<String, CleanedEntry>,
    domain_jobs: BTreeMap<DomainJobId, DomainDetectionJob>,
    relationships: Vec<Relationship>,
    views: BTreeMap<ViewId, UnifiedView>,
    kpi_jobs: BTreeMap<KpiJobId, KpiExtractionJob>,
    selections: BTreeMap<SelectionId, KpiSelection>,
    dashboards: BTreeMap<DashboardId, Dashboard>,
}

/// Thread-safe store over every pipeline entity.
#[derive(Debug, Default)]
pub struct DataStore {
    inner: Mutex<StoreInner>,
}

impl DataStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, StoreInner> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    // ------------------------------------------------------------------
    // Projects
    // ------------------------------------------------------------------

    pub fn insert_project(&self, project: Project) {
        self.lock().projects.insert(project.id, project);
    }

    pub fn project(&self, id: ProjectId) -> Result<Project> {
        self.lock()
            .projects
            .get(&id)
            .cloned()
            .ok_or_else(|| PipelineError::NotFound(format!("project {id}")))
    }

    pub fn projects(&self) -> Vec<Project> {
        self.lock().projects.values().cloned().collect()
    }

    pub fn set_project_status(&self, id: ProjectId, status: ProjectStatus) -> Result<()> {
        let mut inner = self.lock();
        let project = inner
            .projects
            .get_mut(&id)
            .ok_or_else(|| PipelineError::NotFound(format!("project {id}")))?;
        project.status = status;
        project.updated_at = Utc::now();
        Ok(())
    }

    pub fn set_project_domain(&self, id: ProjectId, domain: &str) -> Result<()> {
        let mut inner = self.lock();
        let project = inner
            .projects
            .get_mut(&id)
            .ok_or_else(|| PipelineError::NotFound(format!("project {id}")))?;
        project.detected_domain = Some(domain.to_string());
        project.updated_at = Utc::now();
        Ok(())
    }

    fn refresh_project_counters(inner: &mut StoreInner, id: ProjectId) {
        let file_count = inner
            .uploads
            .values()
            .filter(|upload| upload.project_id == id)
            .count() as u64;
        let total_records: u64 = inner
            .uploads
            .values()
            .filter(|upload| upload.project_id == id)
            .map(|upload| upload.total_records)
            .sum();
        if let Some(project) = inner.projects.get_mut(&id) {
            project.file_count = file_count;
            project.total_records = total_records;
            project.updated_at = Utc::now();
        }
    }

    /// Deletes a project and cascades to every dependent entity.
    pub fn delete_project(&self, id: ProjectId) -> Result<()> {
        let mut inner = self.lock();
        if inner.projects.remove(&id).is_none() {
            return Err(PipelineError::NotFound(format!("project {id}")));
        }
        let upload_ids: Vec<UploadId> = inner
            .uploads
            .values()
            .filter(|upload| upload.project_id == id)
            .map(|upload| upload.id)
            .collect();
        for upload_id in &upload_ids {
            inner.uploads.remove(upload_id);
            inner.upload_tables.remove(upload_id);
            inner.upload_profiles.remove(upload_id);
        }
        let job_ids: Vec<CleaningJobId> = inner
            .jobs
            .values()
            .filter(|job| job.project_id == id)
            .map(|job| job.id)
            .collect();
        for job_id in &job_ids {
            inner.jobs.remove(job_id);
            inner.logs.remove(job_id);
        }
        inner.cleaned.retain(|_, entry| entry.table.project_id != id);
        inner.domain_jobs.retain(|_, job| job.project_id != id);
        inner.relationships.retain(|rel| rel.project_id != id);
        inner.views.retain(|_, view| view.project_id != id);
        inner.kpi_jobs.retain(|_, job| job.project_id != id);
        inner.selections.retain(|_, sel| sel.project_id != id);
        inner.dashboards.retain(|_, dash| dash.project_id != id);
        info!(project = %id, uploads = upload_ids.len(), "project deleted");
        Ok(())
    }

    // ------------------------------------------------------------------
    // Uploads
    // ------------------------------------------------------------------

    pub fn insert_upload(&self, upload: Upload, table: SourceTable, profile: TableProfile) {
        let mut inner = self.lock();
        let project_id = upload.project_id;
        inner.upload_tables.insert(upload.id, table);
        inner.upload_profiles.insert(upload.id, profile);
        inner.uploads.insert(upload.id, upload);
        Self::refresh_project_counters(&mut inner, project_id);
    }

    pub fn upload(&self, id: UploadId) -> Result<Upload> {
        self.lock()
            .uploads
            .get(&id)
            .cloned()
            .ok_or_else(|| PipelineError::NotFound(format!("upload {id}")))
    }

    pub fn uploads_for_project(&self, project_id: ProjectId) -> Vec<Upload> {
        self.lock()
            .uploads
            .values()
            .filter(|upload| upload.project_id == project_id)
            .cloned()
            .collect()
    }

    pub fn upload_table(&self, id: UploadId) -> Result<SourceTable> {
        self.lock()
            .upload_tables
            .get(&id)
            .cloned()
            .ok_or_else(|| PipelineError::NotFound(format!("rows for upload {id}")))
    }

    pub fn upload_profile(&self, id: UploadId) -> Result<TableProfile> {
        self.lock()
            .upload_profiles
            .get(&id)
            .cloned()
            .ok_or_else(|| PipelineError::NotFound(format!("profile for upload {id}")))
    }

    pub fn set_upload_status(
        &self,
        id: UploadId,
        status: UploadStatus,
        error: Option<String>,
    ) -> Result<()> {
        let mut inner = self.lock();
        let upload = inner
            .uploads
            .get_mut(&id)
            .ok_or_else(|| PipelineError::NotFound(format!("upload {id}")))?;
        upload.status = status;
        upload.error = error;
        upload.updated_at = Utc::now();
        Ok(())
    }

    // ------------------------------------------------------------------
    // Cleaning jobs and logs
    // ------------------------------------------------------------------

    pub fn insert_job(&self, job: CleaningJob) {
        self.lock().jobs.insert(job.id, job);
    }

    pub fn job(&self, id: CleaningJobId) -> Result<CleaningJob> {
        self.lock()
            .jobs
            .get(&id)
            .cloned()
            .ok_or_else(|| PipelineError::NotFound(format!("cleaning job {id}")))
    }

    pub fn jobs_for_project(&self, project_id: ProjectId) -> Vec<CleaningJob> {
        self.lock()
            .jobs
            .values()
            .filter(|job| job.project_id == project_id)
            .cloned()
            .collect()
    }

    /// Running job for an upload, if any; keeps submission idempotent on
    /// the upload id.
    pub fn running_job_for_upload(&self, upload_id: UploadId) -> Option<CleaningJob> {
        self.lock()
            .jobs
            .values()
            .find(|job| job.upload_id == upload_id && job.status == JobStatus::Running)
            .cloned()
    }

    pub fn set_job_progress(&self, id: CleaningJobId, progress: JobProgress) -> Result<()> {
        let mut inner = self.lock();
        let job = inner
            .jobs
            .get_mut(&id)
            .ok_or_else(|| PipelineError::NotFound(format!("cleaning job {id}")))?;
        job.progress = progress;
        Ok(())
    }

    /// One transaction around the terminal status transition, so readers
    /// never observe a half-finished job.
    pub fn complete_job(&self, id: CleaningJobId, after_stats: SnapshotStats) -> Result<()> {
        let mut inner = self.lock();
        let job = inner
            .jobs
            .get_mut(&id)
            .ok_or_else(|| PipelineError::NotFound(format!("cleaning job {id}")))?;
        job.status = JobStatus::Completed;
        job.after_stats = Some(after_stats);
        job.progress = JobProgress::done();
        job.completed_at = Some(Utc::now());
        Ok(())
    }

    pub fn fail_job(&self, id: CleaningJobId, error: String) -> Result<()> {
        let mut inner = self.lock();
        let job = inner
            .jobs
            .get_mut(&id)
            .ok_or_else(|| PipelineError::NotFound(format!("cleaning job {id}")))?;
        job.status = JobStatus::Failed;
        job.error = Some(error);
        job.completed_at = Some(Utc::now());
        Ok(())
    }

    /// Appends one audit entry; the log is append-only.
    pub fn append_log(&self, entry: CleaningLogEntry) {
        self.lock().logs.entry(entry.job_id).or_default().push(entry);
    }

    pub fn logs(&self, job_id: CleaningJobId) -> Vec<CleaningLogEntry> {
        self.lock().logs.get(&job_id).cloned().unwrap_or_default()
    }

    // ------------------------------------------------------------------
    // Cleaned tables
    // ------------------------------------------------------------------

    pub fn insert_cleaned(&self, table: CleanedTable, profile: TableProfile) {
        self.lock()
            .cleaned
            .insert(table.table_name.clone(), CleanedEntry { table, profile });
    }

    pub fn cleaned(&self, table_name: &str) -> Result<CleanedEntry> {
        self.lock()
            .cleaned
            .get(table_name)
            .cloned()
            .ok_or_else(|| PipelineError::NotFound(format!("cleaned table {table_name}")))
    }

    pub fn cleaned_for_project(&self, project_id: ProjectId) -> Vec<CleanedEntry> {
        self.lock()
            .cleaned
            .values()
            .filter(|entry| entry.table.project_id == project_id)
            .cloned()
            .collect()
    }

    /// Drops a cleaned table and marks every view reading from it invalid.
    pub fn delete_cleaned(&self, table_name: &str) -> Result<()> {
        let mut inner = self.lock();
        if inner.cleaned.remove(table_name).is_none() {
            return Err(PipelineError::NotFound(format!(
                "cleaned table {table_name}"
            )));
        }
        for view in inner.views.values_mut() {
            if view.source_tables.iter().any(|name| name == table_name) {
                view.active = false;
            }
        }
        Ok(())
    }

    // ------------------------------------------------------------------
    // Domain detection jobs
    // ------------------------------------------------------------------

    pub fn insert_domain_job(&self, job: DomainDetectionJob) {
        self.lock().domain_jobs.insert(job.id, job);
    }

    pub fn domain_job(&self, id: DomainJobId) -> Result<DomainDetectionJob> {
        self.lock()
            .domain_jobs
            .get(&id)
            .cloned()
            .ok_or_else(|| PipelineError::NotFound(format!("domain job {id}")))
    }

    pub fn domain_jobs(&self) -> Vec<DomainDetectionJob> {
        self.lock().domain_jobs.values().cloned().collect()
    }

    pub fn confirm_domain_job(&self, id: DomainJobId, domain: &str) -> Result<DomainDetectionJob> {
        let mut inner = self.lock();
        let job = inner
            .domain_jobs
            .get_mut(&id)
            .ok_or_else(|| PipelineError::NotFound(format!("domain job {id}")))?;
        job.detected_domain = domain.to_string();
        job.status = DomainJobStatus::Confirmed;
        Ok(job.clone())
    }

    /// Latest confirmed domain job for a project, if any.
    pub fn confirmed_domain_job(&self, project_id: ProjectId) -> Option<DomainDetectionJob> {
        self.lock()
            .domain_jobs
            .values()
            .filter(|job| {
                job.project_id == project_id && job.status == DomainJobStatus::Confirmed
            })
            .max_by_key(|job| job.created_at)
            .cloned()
    }

    // ------------------------------------------------------------------
    // Relationships and views
    // ------------------------------------------------------------------

    /// Replaces the project's detected relationships with a fresh set.
    pub fn replace_relationships(&self, project_id: ProjectId, relationships: Vec<Relationship>) {
        let mut inner = self.lock();
        inner.relationships.retain(|rel| rel.project_id != project_id);
        inner.relationships.extend(relationships);
    }

    pub fn relationships_for_project(&self, project_id: ProjectId) -> Vec<Relationship> {
        self.lock()
            .relationships
            .iter()
            .filter(|rel| rel.project_id == project_id)
            .cloned()
            .collect()
    }

    /// Replaces the project's views: previous rows are swapped out, never
    /// mutated in place, so readers observe either the old or the new set.
    pub fn replace_views(&self, project_id: ProjectId, views: Vec<UnifiedView>) {
        let mut inner = self.lock();
        inner.views.retain(|_, view| view.project_id != project_id);
        for view in views {
            inner.views.insert(view.id, view);
        }
    }

    pub fn views_for_project(&self, project_id: ProjectId) -> Vec<UnifiedView> {
        self.lock()
            .views
            .values()
            .filter(|view| view.project_id == project_id)
            .cloned()
            .collect()
    }

    // ------------------------------------------------------------------
    // KPI jobs, selections, dashboards
    // ------------------------------------------------------------------

    pub fn insert_kpi_job(&self, job: KpiExtractionJob) {
        self.lock().kpi_jobs.insert(job.id, job);
    }

    pub fn kpi_job(&self, id: KpiJobId) -> Result<KpiExtractionJob> {
        self.lock()
            .kpi_jobs
            .get(&id)
            .cloned()
            .ok_or_else(|| PipelineError::NotFound(format!("KPI job {id}")))
    }

    pub fn insert_selection(&self, selection: KpiSelection) {
        self.lock().selections.insert(selection.id, selection);
    }

    pub fn selection(&self, id: SelectionId) -> Result<KpiSelection> {
        self.lock()
            .selections
            .get(&id)
            .cloned()
            .ok_or_else(|| PipelineError::NotFound(format!("selection {id}")))
    }

    pub fn insert_dashboard(&self, dashboard: Dashboard) {
        self.lock().dashboards.insert(dashboard.id, dashboard);
    }

    pub fn dashboard(&self, id: DashboardId) -> Result<Dashboard> {
        self.lock()
            .dashboards
            .get(&id)
            .cloned()
            .ok_or_else(|| PipelineError::NotFound(format!("dashboard {id}")))
    }

    pub fn latest_dashboard(&self, project_id: ProjectId) -> Option<Dashboard> {
        self.lock()
            .dashboards
            .values()
            .filter(|dash| dash.project_id == project_id)
            .max_by_key(|dash| dash.created_at)
            .cloned()
    }
}

/// Generates a dynamic table identifier for an upload's cleaned data.
pub fn cleaned_table_name(upload_id: UploadId, timestamp_millis: i64) -> String {
    format!("upload_{}_{timestamp_millis}", upload_id.simple())
}
