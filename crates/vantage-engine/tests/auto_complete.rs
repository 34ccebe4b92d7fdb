#![allow(missing_docs)]

use std::sync::Arc;
use std::time::{Duration, Instant};

use vantage_engine::{
    EngineConfig, ExportFormat, NewProjectFile, ProjectEngine, QueueMode,
};
use vantage_model::{DomainDecision, JobStatus, ProjectStatus, RelationshipStatus};
use vantage_standards::StandardsRegistry;
use vantage_store::DataStore;

fn engine_with(queue: QueueMode, dir: &std::path::Path) -> ProjectEngine {
    let config = EngineConfig {
        upload_dir: dir.join("uploads"),
        logs_dir: dir.join("logs"),
        queue,
        ..EngineConfig::default()
    };
    ProjectEngine::new(
        config,
        Arc::new(DataStore::new()),
        Arc::new(StandardsRegistry::load_default().expect("registry")),
    )
    .expect("engine")
}

fn csv_file(name: &str, content: &str) -> NewProjectFile {
    NewProjectFile {
        original_name: name.to_string(),
        content_type: "text/csv".to_string(),
        bytes: content.as_bytes().to_vec(),
    }
}

fn saas_csv() -> NewProjectFile {
    let mut content =
        String::from("subscription_id,customer_id,mrr,arr,churn,plan,tier,signup_date\n");
    for i in 1..=10 {
        content.push_str(&format!(
            "SUB-{i},CUST-{i},{},{},0.0{i},starter,basic,2024-01-{:02}\n",
            100 + i,
            1200 + i * 12,
            i
        ));
    }
    csv_file("subscriptions.csv", &content)
}

fn star_schema_files() -> Vec<NewProjectFile> {
    let mut customers = String::from("customer_id,name,city\n");
    for i in 1..=10 {
        customers.push_str(&format!("C{i},Customer {i},City {i}\n"));
    }
    let mut products = String::from("product_id,title,price\n");
    for i in 1..=10 {
        products.push_str(&format!("P{i},Product {i},{i}.50\n"));
    }
    let mut sales = String::from("sale_id,customer_id,product_id,amount\n");
    for i in 1..=20 {
        sales.push_str(&format!(
            "S{i},C{},P{},{}\n",
            (i % 10) + 1,
            (i % 10) + 1,
            i * 10
        ));
    }
    vec![
        csv_file("customers.csv", &customers),
        csv_file("products.csv", &products),
        csv_file("sales.csv", &sales),
    ]
}

#[test]
fn subscription_upload_auto_detects_its_domain() {
    let dir = tempfile::tempdir().unwrap();
    let engine = engine_with(QueueMode::Inline, dir.path());

    let creation = engine
        .create_project("subscriptions", None, vec![saas_csv()])
        .unwrap();
    assert_eq!(creation.uploads.len(), 1);
    assert_eq!(creation.project.total_records, 10);

    let jobs = engine.clean_project(creation.project.id).unwrap();
    assert_eq!(jobs.len(), 1);
    assert_eq!(
        engine.job_status(jobs[0].id).unwrap().status,
        JobStatus::Completed
    );

    let domain_job = engine
        .detect_domain_project(creation.project.id, None)
        .unwrap();
    assert_eq!(domain_job.detected_domain, "saas");
    assert!(domain_job.confidence >= 85);
    assert_eq!(domain_job.decision, DomainDecision::AutoDetect);
    for expected in ["subscription_id", "mrr", "arr", "churn", "customer_id"] {
        assert!(
            domain_job.primary_matches.iter().any(|m| m == expected),
            "missing {expected}"
        );
    }
    assert_eq!(
        domain_job.all_scores.len(),
        engine.registry().signatures.len()
    );
}

#[test]
fn sparse_order_columns_limit_feasible_kpis() {
    let dir = tempfile::tempdir().unwrap();
    let engine = engine_with(QueueMode::Inline, dir.path());

    let creation = engine
        .create_project(
            "orders",
            None,
            vec![csv_file(
                "orders.csv",
                "OrderID,CustomerID,Date\n1,10,2024-01-01\n2,11,2024-01-02\n3,12,2024-01-03\n",
            )],
        )
        .unwrap();
    let jobs = engine.clean_project(creation.project.id).unwrap();
    let domain_job = engine
        .detect_domain_project(creation.project.id, None)
        .unwrap();
    assert!(domain_job.detected_domain == "retail" || domain_job.detected_domain == "ecommerce");

    let confirmed = engine.confirm_domain(domain_job.id, "retail").unwrap();
    let extraction = engine.extract_kpis(jobs[0].id, confirmed.id).unwrap();
    assert!(extraction.feasible_count <= 3);
    assert_eq!(
        extraction.feasible_count + extraction.infeasible_count,
        extraction.total_kpis
    );

    let missing_for = |name: &str| -> Vec<String> {
        extraction
            .infeasible
            .iter()
            .find(|kpi| kpi.name == name)
            .unwrap_or_else(|| panic!("{name} should be infeasible"))
            .missing_columns
            .clone()
    };
    assert_eq!(missing_for("Total Revenue"), vec!["order_value"]);
    assert_eq!(missing_for("Average Order Value"), vec!["order_value"]);
    assert_eq!(missing_for("Conversion Rate"), vec!["session_id"]);
}

#[test]
fn star_schema_runs_end_to_end() {
    let dir = tempfile::tempdir().unwrap();
    let engine = engine_with(QueueMode::Inline, dir.path());

    let creation = engine
        .create_project("star", None, star_schema_files())
        .unwrap();
    engine.clean_project(creation.project.id).unwrap();

    let result = engine.auto_complete(creation.project.id).unwrap();

    // Exactly the two foreign keys, both perfect matches.
    assert_eq!(result.relationships.len(), 2);
    for relationship in &result.relationships {
        assert_eq!(relationship.match_rate, 1.0);
        assert_eq!(relationship.status, RelationshipStatus::Valid);
    }

    // The sales table holds both foreign keys, so it is the fact table.
    let sales_upload = engine
        .store()
        .uploads_for_project(creation.project.id)
        .into_iter()
        .find(|upload| upload.original_filename == "sales.csv")
        .unwrap();
    let sales_job = engine
        .store()
        .jobs_for_project(creation.project.id)
        .into_iter()
        .find(|job| job.upload_id == sales_upload.id)
        .unwrap();

    assert_eq!(result.views.len(), 1);
    let sql = &result.views[0].view_sql;
    assert!(sql.contains(&format!("FROM {}", sales_job.cleaned_table)));
    assert_eq!(sql.matches("LEFT JOIN").count(), 2);
    // Fact columns plus both dimensions minus their join keys: 4 + 2 + 2.
    assert_eq!(sql.matches(" AS ").count(), 4);

    assert!(result.kpi_job.feasible_count > 0);
    assert!(!result.dashboard.config.kpis.is_empty());
    assert_eq!(
        engine.project(creation.project.id).unwrap().status,
        ProjectStatus::Completed
    );
}

#[test]
fn relationship_detection_needs_two_uploads() {
    let dir = tempfile::tempdir().unwrap();
    let engine = engine_with(QueueMode::Inline, dir.path());
    let creation = engine
        .create_project("solo", None, vec![saas_csv()])
        .unwrap();
    engine.clean_project(creation.project.id).unwrap();
    let err = engine
        .detect_project_relationships(creation.project.id)
        .unwrap_err();
    assert_eq!(err.tag(), "PreconditionFailed");
}

#[test]
fn domain_detection_waits_for_cleaning() {
    let dir = tempfile::tempdir().unwrap();
    let engine = engine_with(QueueMode::Inline, dir.path());
    let creation = engine
        .create_project("pending", None, vec![saas_csv()])
        .unwrap();
    // No cleaning jobs yet.
    let err = engine
        .detect_domain_project(creation.project.id, None)
        .unwrap_err();
    assert_eq!(err.tag(), "PreconditionFailed");
}

#[test]
fn processing_projects_refuse_auto_complete() {
    let dir = tempfile::tempdir().unwrap();
    let engine = engine_with(QueueMode::Inline, dir.path());
    let creation = engine
        .create_project("busy", None, vec![saas_csv()])
        .unwrap();
    engine
        .store()
        .set_project_status(creation.project.id, ProjectStatus::Processing)
        .unwrap();
    let err = engine.auto_complete(creation.project.id).unwrap_err();
    assert_eq!(err.tag(), "PreconditionFailed");
}

#[test]
fn upload_ingress_rejects_unknown_extensions() {
    let dir = tempfile::tempdir().unwrap();
    let engine = engine_with(QueueMode::Inline, dir.path());
    let err = engine
        .create_project(
            "bad",
            None,
            vec![NewProjectFile {
                original_name: "notes.txt".to_string(),
                content_type: "text/plain".to_string(),
                bytes: b"hello".to_vec(),
            }],
        )
        .unwrap_err();
    assert_eq!(err.tag(), "UnsupportedFormat");
}

#[test]
fn cleaning_is_idempotent_on_the_upload() {
    let dir = tempfile::tempdir().unwrap();
    let engine = engine_with(QueueMode::Inline, dir.path());
    let creation = engine
        .create_project("repeat", None, vec![saas_csv()])
        .unwrap();
    let upload_id = creation.uploads[0].id;

    let first = engine.auto_config(upload_id).unwrap();
    let second = engine.auto_config(upload_id).unwrap();
    assert_eq!(first, second);

    let job_a = engine.start_cleaning(upload_id, None).unwrap();
    let job_b = engine.start_cleaning(upload_id, None).unwrap();
    // Inline execution finishes the first job, so a second one starts; the
    // cleaned output must be identical row for row.
    let table_a = engine.store().cleaned(&job_a.cleaned_table).unwrap();
    let table_b = engine.store().cleaned(&job_b.cleaned_table).unwrap();
    assert_eq!(table_a.table.rows, table_b.table.rows);
}

#[test]
fn exports_cover_both_formats() {
    let dir = tempfile::tempdir().unwrap();
    let engine = engine_with(QueueMode::Inline, dir.path());
    let creation = engine
        .create_project("export", None, vec![saas_csv()])
        .unwrap();
    let jobs = engine.clean_project(creation.project.id).unwrap();

    let csv_text = engine.export_cleaned(jobs[0].id, ExportFormat::Csv).unwrap();
    assert!(csv_text.starts_with("id,"));
    assert!(csv_text.lines().count() > 10);

    let json_text = engine
        .export_cleaned(jobs[0].id, ExportFormat::Json)
        .unwrap();
    let rows: Vec<serde_json::Value> = serde_json::from_str(&json_text).unwrap();
    assert_eq!(rows.len(), 10);

    let page = engine.cleaned_page(jobs[0].id, 2, 4).unwrap();
    assert_eq!(page.total, 10);
    assert_eq!(page.rows.len(), 4);
    assert_eq!(page.rows[0].row_number, 5);

    let source_rows = engine
        .upload_rows(creation.uploads[0].id, 1, 3)
        .unwrap();
    assert_eq!(source_rows.len(), 3);
    assert_eq!(source_rows[0].payload.row_number, 1);
}

#[test]
fn worker_pool_completes_parallel_cleaning() {
    let dir = tempfile::tempdir().unwrap();
    let engine = engine_with(QueueMode::WorkerPool, dir.path());
    let creation = engine
        .create_project("pooled", None, star_schema_files())
        .unwrap();
    let jobs = engine.clean_project(creation.project.id).unwrap();
    assert_eq!(jobs.len(), 3);

    let deadline = Instant::now() + Duration::from_secs(30);
    loop {
        let all_done = jobs.iter().all(|job| {
            engine
                .job_status(job.id)
                .map(|view| view.status == JobStatus::Completed)
                .unwrap_or(false)
        });
        if all_done {
            break;
        }
        assert!(Instant::now() < deadline, "cleaning jobs did not finish");
        std::thread::sleep(Duration::from_millis(20));
    }
}
