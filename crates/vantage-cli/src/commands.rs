//! Command implementations.

use std::fs;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{info, warn};

use vantage_engine::{
    EngineConfig, NewProjectFile, ProjectEngine, QueueMode, ViewBundle,
};
use vantage_model::{
    CleaningJob, DomainDecision, DomainDetectionJob, JobStatus, PipelineError,
};
use vantage_standards::StandardsRegistry;
use vantage_store::DataStore;

use crate::cli::{KpisArgs, RunArgs};
use crate::summary;

/// Runs the full pipeline over the given files and writes the artefacts
/// to the output directory.
pub fn run(args: &RunArgs) -> Result<()> {
    let output_dir = args
        .output_dir
        .clone()
        .unwrap_or_else(|| Path::new("vantage-out").to_path_buf());
    fs::create_dir_all(&output_dir).context("create output directory")?;

    let mut config = match &args.config {
        Some(path) => EngineConfig::load(path).context("load engine config")?,
        None => EngineConfig::default(),
    };
    if args.config.is_none() {
        config.upload_dir = output_dir.join("uploads");
        config.logs_dir = output_dir.join("logs");
    }
    let queue = config.queue;

    let registry = StandardsRegistry::load_default().context("load standards libraries")?;
    let engine = ProjectEngine::new(config, Arc::new(DataStore::new()), Arc::new(registry))
        .context("start engine")?;

    let project_name = args.name.clone().unwrap_or_else(|| {
        args.files
            .first()
            .and_then(|path| path.file_stem())
            .map(|stem| stem.to_string_lossy().to_string())
            .unwrap_or_else(|| "project".to_string())
    });

    let mut files = Vec::with_capacity(args.files.len());
    for path in &args.files {
        let bytes = fs::read(path).with_context(|| format!("read {}", path.display()))?;
        let original_name = path
            .file_name()
            .map(|name| name.to_string_lossy().to_string())
            .unwrap_or_else(|| "upload".to_string());
        let content_type = content_type_for(&original_name);
        files.push(NewProjectFile {
            original_name,
            content_type: content_type.to_string(),
            bytes,
        });
    }

    let creation = engine.create_project(&project_name, None, files)?;
    println!("Uploads");
    println!("{}", summary::render_uploads(&creation.uploads));

    let jobs = engine.clean_project(creation.project.id)?;
    let jobs = wait_for_cleaning(&engine, jobs, queue)?;
    println!("Cleaning");
    println!("{}", summary::render_cleaning(&jobs));
    if jobs.iter().any(|job| job.status == JobStatus::Failed) {
        bail!("one or more cleaning jobs failed; see the report above");
    }

    let domain_job = engine.detect_domain_project(creation.project.id, None)?;
    let domain_job = confirm_domain(&engine, domain_job, args.domain.as_deref())?;
    println!("Domain");
    println!("{}", summary::render_domain(&domain_job));

    let bundle = build_views(&engine, &creation, &jobs, &domain_job)?;

    if let Some(bundle) = &bundle {
        println!("Views");
        println!("{}", summary::render_views(&bundle.views));
        for view in &bundle.views {
            let path = output_dir.join(format!("{}.sql", view.view_name));
            fs::write(&path, &view.view_sql)
                .with_context(|| format!("write {}", path.display()))?;
        }
    }

    let kpi_job = match bundle.as_ref().and_then(|bundle| bundle.kpi_job.clone()) {
        Some(job) => Some(job),
        None => match jobs.first() {
            Some(first_job) => Some(engine.extract_kpis(first_job.id, domain_job.id)?),
            None => None,
        },
    };
    if let Some(kpi_job) = &kpi_job {
        println!("Top KPIs");
        println!("{}", summary::render_kpis(kpi_job));
        let path = output_dir.join("kpi-extraction.json");
        fs::write(&path, serde_json::to_string_pretty(kpi_job)?)
            .with_context(|| format!("write {}", path.display()))?;
    }

    let dashboard = match bundle.and_then(|bundle| bundle.dashboard) {
        Some(dashboard) => Some(dashboard),
        None => match &kpi_job {
            Some(kpi_job) => Some(engine.generate_dashboard(kpi_job.id, None)?),
            None => None,
        },
    };
    if let Some(dashboard) = &dashboard {
        let path = output_dir.join("dashboard.json");
        fs::write(&path, serde_json::to_string_pretty(dashboard)?)
            .with_context(|| format!("write {}", path.display()))?;
        info!(
            kpi_cards = dashboard.config.kpis.len(),
            charts = dashboard.config.charts.len(),
            "dashboard written"
        );
    }

    println!("Artefacts written to {}", output_dir.display());
    Ok(())
}

/// Waits for every cleaning job to reach a terminal status. Inline queues
/// are already finished; the worker pool needs polling.
fn wait_for_cleaning(
    engine: &ProjectEngine,
    jobs: Vec<CleaningJob>,
    queue: QueueMode,
) -> Result<Vec<CleaningJob>> {
    if queue == QueueMode::WorkerPool {
        let bar = ProgressBar::new(jobs.len() as u64);
        bar.set_style(
            ProgressStyle::with_template("{spinner} cleaning {pos}/{len} files")
                .unwrap_or_else(|_| ProgressStyle::default_bar()),
        );
        loop {
            let done = jobs
                .iter()
                .filter(|job| {
                    engine
                        .job_status(job.id)
                        .map(|view| view.status.is_terminal())
                        .unwrap_or(false)
                })
                .count();
            bar.set_position(done as u64);
            if done == jobs.len() {
                break;
            }
            std::thread::sleep(Duration::from_millis(100));
        }
        bar.finish_and_clear();
    }
    jobs.iter()
        .map(|job| engine.store().job(job.id).map_err(anyhow::Error::from))
        .collect()
}

/// Confirms the domain: an explicit override wins, auto-detections stand,
/// and review-band detections fall back to the top-scoring domain with a
/// warning.
fn confirm_domain(
    engine: &ProjectEngine,
    domain_job: DomainDetectionJob,
    requested: Option<&str>,
) -> Result<DomainDetectionJob> {
    let chosen = match requested {
        Some(domain) => domain.to_string(),
        None => {
            if domain_job.decision != DomainDecision::AutoDetect {
                warn!(
                    detected = %domain_job.detected_domain,
                    confidence = domain_job.confidence,
                    "confidence below the auto-detect band; confirming the top domain"
                );
            }
            domain_job.detected_domain.clone()
        }
    };
    Ok(engine.confirm_domain(domain_job.id, &chosen)?)
}

/// Builds unified views when the project has enough linked tables.
fn build_views(
    engine: &ProjectEngine,
    creation: &vantage_engine::ProjectCreation,
    jobs: &[CleaningJob],
    domain_job: &DomainDetectionJob,
) -> Result<Option<ViewBundle>> {
    if jobs.len() < 2 {
        info!("single-file project; skipping relationship detection");
        return Ok(None);
    }
    let relationships = engine.detect_project_relationships(creation.project.id)?;
    println!("Relationships");
    println!("{}", summary::render_relationships(&relationships));
    match engine.create_unified_view(creation.project.id) {
        Ok(bundle) => Ok(Some(bundle)),
        Err(PipelineError::NoRelationshipsFound) => {
            warn!(
                domain = %domain_job.detected_domain,
                "no valid relationships; continuing without a unified view"
            );
            Ok(None)
        }
        Err(err) => Err(err.into()),
    }
}

/// Prints the domain signature library.
pub fn domains() -> Result<()> {
    let registry = StandardsRegistry::load_default().context("load standards libraries")?;
    println!("{}", summary::render_domain_library(registry.signatures.domains()));
    Ok(())
}

/// Prints the KPI library for one domain.
pub fn kpis(args: &KpisArgs) -> Result<()> {
    let registry = StandardsRegistry::load_default().context("load standards libraries")?;
    let Some(kpis) = registry.kpis.for_domain(&args.domain) else {
        bail!(
            "unknown domain {}; valid domains: {}",
            args.domain,
            registry
                .signatures
                .domains()
                .iter()
                .map(|sig| sig.domain.as_str())
                .collect::<Vec<_>>()
                .join(", ")
        );
    };
    println!("{}", summary::render_kpi_library(kpis));
    Ok(())
}

/// Maps a filename to the declared content type for ingestion.
fn content_type_for(name: &str) -> &'static str {
    let extension = name
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_lowercase())
        .unwrap_or_default();
    match extension.as_str() {
        "csv" => "text/csv",
        "tsv" => "text/tab-separated-values",
        "xls" => "application/vnd.ms-excel",
        "xlsx" => "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
        "json" => "application/json",
        "xml" => "application/xml",
        "pdf" => "application/pdf",
        "docx" => "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
        _ => "application/octet-stream",
    }
}
