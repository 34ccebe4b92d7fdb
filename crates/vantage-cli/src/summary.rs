//! Table rendering for pipeline results.

use comfy_table::{Cell, ContentArrangement, Table, presets::UTF8_FULL_CONDENSED};

use vantage_model::{
    CleaningJob, DomainDetectionJob, KpiExtractionJob, Relationship, UnifiedView, Upload,
};
use vantage_standards::{DomainSignature, KpiDefinition};

fn base_table(headers: &[&str]) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL_CONDENSED)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(headers.iter().map(|h| Cell::new(*h)));
    table
}

pub fn render_uploads(uploads: &[Upload]) -> String {
    let mut table = base_table(&["File", "Status", "Records", "Columns"]);
    for upload in uploads {
        table.add_row(vec![
            upload.original_filename.clone(),
            upload.status.to_string(),
            upload.total_records.to_string(),
            upload.metadata.columns.len().to_string(),
        ]);
    }
    table.to_string()
}

pub fn render_cleaning(jobs: &[CleaningJob]) -> String {
    let mut table = base_table(&["Job", "Status", "Rows before", "Rows after", "Error"]);
    for job in jobs {
        table.add_row(vec![
            job.id.to_string(),
            job.status.to_string(),
            job.before_stats.total_rows.to_string(),
            job.after_stats
                .as_ref()
                .map(|stats| stats.total_rows.to_string())
                .unwrap_or_else(|| "-".to_string()),
            job.error.clone().unwrap_or_default(),
        ]);
    }
    table.to_string()
}

pub fn render_domain(job: &DomainDetectionJob) -> String {
    let mut table = base_table(&["Domain", "Confidence", "Decision", "Primary matches"]);
    table.add_row(vec![
        job.detected_domain.clone(),
        format!("{}%", job.confidence),
        job.decision.to_string(),
        job.primary_matches.join(", "),
    ]);
    table.to_string()
}

pub fn render_relationships(relationships: &[Relationship]) -> String {
    let mut table = base_table(&["Source", "Target", "Match rate", "Status"]);
    for relationship in relationships {
        table.add_row(vec![
            format!(
                "{}.{}",
                relationship.source_table, relationship.source_column
            ),
            format!(
                "{}.{}",
                relationship.target_table, relationship.target_column
            ),
            format!("{:.0}%", relationship.match_rate * 100.0),
            relationship.status.to_string(),
        ]);
    }
    table.to_string()
}

pub fn render_views(views: &[UnifiedView]) -> String {
    let mut table = base_table(&["View", "Tables", "Active"]);
    for view in views {
        table.add_row(vec![
            view.view_name.clone(),
            view.source_tables.len().to_string(),
            view.active.to_string(),
        ]);
    }
    table.to_string()
}

pub fn render_kpis(job: &KpiExtractionJob) -> String {
    let mut table = base_table(&["KPI", "Priority", "Completeness", "Score"]);
    for kpi in &job.top_kpis {
        table.add_row(vec![
            kpi.name.clone(),
            kpi.priority.to_string(),
            format!("{:.0}%", kpi.completeness * 100.0),
            format!("{:.2}", kpi.score),
        ]);
    }
    table.to_string()
}

pub fn render_domain_library(signatures: &[DomainSignature]) -> String {
    let mut table = base_table(&["Domain", "Label", "Primary columns", "Keywords"]);
    for signature in signatures {
        table.add_row(vec![
            signature.domain.clone(),
            signature.label.clone(),
            signature.primary_columns.join(", "),
            signature.keywords.join(", "),
        ]);
    }
    table.to_string()
}

pub fn render_kpi_library(kpis: &[KpiDefinition]) -> String {
    let mut table = base_table(&["KPI", "Priority", "Needs", "Chart"]);
    for kpi in kpis {
        table.add_row(vec![
            kpi.name.clone(),
            kpi.priority.to_string(),
            kpi.columns_needed.join(", "),
            kpi.chart_hint.clone().unwrap_or_else(|| "-".to_string()),
        ]);
    }
    table.to_string()
}
