//! Upload and log file layout.
//!
//! Uploaded files live under a single directory as
//! `<epochMillis>-<nonce>-<sanitisedOriginal>`. Cleaning logs are written
//! as one JSON document per operation under `logs/cleaning/`, plus one
//! comprehensive per-job document with the aggregate summary.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::Utc;
use serde::Serialize;
use uuid::Uuid;

use vantage_model::{CleaningJobId, CleaningLogEntry, Result};

/// A stored upload file.
#[derive(Debug, Clone)]
pub struct StoredUpload {
    pub stored_filename: String,
    pub path: PathBuf,
}

/// The upload directory.
#[derive(Debug, Clone)]
pub struct UploadVault {
    base_dir: PathBuf,
}

impl UploadVault {
    pub fn new(base_dir: impl Into<PathBuf>) -> Result<Self> {
        let base_dir = base_dir.into();
        fs::create_dir_all(&base_dir)?;
        Ok(Self { base_dir })
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    /// Stores raw bytes under a collision-free name derived from the
    /// original filename.
    pub fn store(&self, original_name: &str, bytes: &[u8]) -> Result<StoredUpload> {
        let stored_filename = stored_filename(original_name);
        let path = self.base_dir.join(&stored_filename);
        fs::write(&path, bytes)?;
        Ok(StoredUpload {
            stored_filename,
            path,
        })
    }
}

/// Builds `<epochMillis>-<nonce>-<sanitisedOriginal>`.
fn stored_filename(original_name: &str) -> String {
    let millis = Utc::now().timestamp_millis();
    let nonce = &Uuid::new_v4().simple().to_string()[..8];
    format!("{millis}-{nonce}-{}", sanitize_filename(original_name))
}

/// Keeps alphanumerics, dots, dashes and underscores; everything else
/// becomes an underscore. Path separators never survive.
pub fn sanitize_filename(name: &str) -> String {
    let cleaned: String = name
        .chars()
        .map(|ch| {
            if ch.is_ascii_alphanumeric() || matches!(ch, '.' | '-' | '_') {
                ch
            } else {
                '_'
            }
        })
        .collect();
    if cleaned.is_empty() {
        "upload".to_string()
    } else {
        cleaned
    }
}

/// Writer for the cleaning log documents.
#[derive(Debug, Clone)]
pub struct LogSink {
    cleaning_dir: PathBuf,
}

impl LogSink {
    pub fn new(logs_dir: impl Into<PathBuf>) -> Result<Self> {
        let cleaning_dir = logs_dir.into().join("cleaning");
        fs::create_dir_all(&cleaning_dir)?;
        Ok(Self { cleaning_dir })
    }

    /// One JSON document per operation:
    /// `cleaning-<jobId>-<epochMillis>.json`.
    pub fn write_operation(&self, entry: &CleaningLogEntry) -> Result<PathBuf> {
        let path = self.cleaning_dir.join(format!(
            "cleaning-{}-{}.json",
            entry.job_id,
            Utc::now().timestamp_millis()
        ));
        let body = serde_json::to_string_pretty(entry)
            .map_err(|err| std::io::Error::other(err.to_string()))?;
        fs::write(&path, body)?;
        Ok(path)
    }

    /// The aggregate per-job document:
    /// `comprehensive-cleaning-<jobId>-<epochMillis>.json`.
    pub fn write_comprehensive<T: Serialize>(
        &self,
        job_id: CleaningJobId,
        report: &T,
    ) -> Result<PathBuf> {
        let path = self.cleaning_dir.join(format!(
            "comprehensive-cleaning-{job_id}-{}.json",
            Utc::now().timestamp_millis()
        ));
        let body = serde_json::to_string_pretty(report)
            .map_err(|err| std::io::Error::other(err.to_string()))?;
        fs::write(&path, body)?;
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vantage_model::{CleaningOperation, LogStatus, SnapshotStats};

    #[test]
    fn sanitisation_strips_path_separators() {
        assert_eq!(sanitize_filename("../../etc/passwd"), ".._.._etc_passwd");
        assert_eq!(sanitize_filename("q1 report (final).csv"), "q1_report__final_.csv");
        assert_eq!(sanitize_filename(""), "upload");
    }

    #[test]
    fn stored_files_land_in_the_vault() {
        let dir = tempfile::tempdir().unwrap();
        let vault = UploadVault::new(dir.path().join("uploads")).unwrap();
        let stored = vault.store("orders.csv", b"a,b\n1,2\n").unwrap();
        assert!(stored.path.exists());
        assert!(stored.stored_filename.ends_with("-orders.csv"));
        let parts: Vec<&str> = stored.stored_filename.splitn(3, '-').collect();
        assert_eq!(parts.len(), 3);
        assert!(parts[0].parse::<i64>().is_ok());
    }

    #[test]
    fn log_documents_follow_the_layout() {
        let dir = tempfile::tempdir().unwrap();
        let sink = LogSink::new(dir.path().join("logs")).unwrap();
        let job_id = CleaningJobId::new();
        let entry = CleaningLogEntry {
            job_id,
            timestamp: Utc::now(),
            operation: CleaningOperation::Imputation,
            before_stats: SnapshotStats::default(),
            after_stats: SnapshotStats::default(),
            config: serde_json::Value::Null,
            duration_ms: 1,
            status: LogStatus::Success,
            error: None,
        };
        let path = sink.write_operation(&entry).unwrap();
        assert!(path.exists());
        let name = path.file_name().unwrap().to_string_lossy().to_string();
        assert!(name.starts_with(&format!("cleaning-{job_id}-")));
        assert!(name.ends_with(".json"));

        let summary = serde_json::json!({"ok": true});
        let path = sink.write_comprehensive(job_id, &summary).unwrap();
        assert!(
            path.file_name()
                .unwrap()
                .to_string_lossy()
                .starts_with(&format!("comprehensive-cleaning-{job_id}-"))
        );
    }
}
