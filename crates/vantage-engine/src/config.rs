//! Deployment-wide engine configuration.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use vantage_model::{PipelineError, Result};

/// How cleaning jobs are executed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QueueMode {
    /// Run in the calling task; callers still poll job status.
    #[default]
    Inline,
    /// Fan out over a bounded worker pool.
    WorkerPool,
}

/// Engine settings, loadable from a TOML file.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Directory holding uploaded files.
    pub upload_dir: PathBuf,
    /// Directory holding cleaning log documents.
    pub logs_dir: PathBuf,
    /// Country code applied when a phone number carries none. A single
    /// deployment-wide setting, never inferred from the data.
    pub default_country_code: String,
    /// Concurrent cleaning jobs per project.
    pub max_parallel_cleans: usize,
    /// Per-stage wall-clock budget in seconds.
    pub stage_timeout_secs: u64,
    pub queue: QueueMode,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            upload_dir: PathBuf::from("uploads"),
            logs_dir: PathBuf::from("logs"),
            default_country_code: "1".to_string(),
            max_parallel_cleans: 3,
            stage_timeout_secs: 600,
            queue: QueueMode::Inline,
        }
    }
}

impl EngineConfig {
    /// Loads settings from a TOML file; missing keys keep their defaults.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: EngineConfig = toml::from_str(&content)
            .map_err(|err| PipelineError::Config(format!("engine config: {err}")))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.max_parallel_cleans == 0 {
            return Err(PipelineError::Config(
                "max_parallel_cleans must be at least 1".to_string(),
            ));
        }
        if self.stage_timeout_secs == 0 {
            return Err(PipelineError::Config(
                "stage_timeout_secs must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    pub fn stage_timeout(&self) -> Duration {
        Duration::from_secs(self.stage_timeout_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn defaults_are_sane() {
        let config = EngineConfig::default();
        assert_eq!(config.max_parallel_cleans, 3);
        assert_eq!(config.stage_timeout_secs, 600);
        assert_eq!(config.default_country_code, "1");
        assert_eq!(config.queue, QueueMode::Inline);
        config.validate().unwrap();
    }

    #[test]
    fn partial_toml_keeps_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "default_country_code = \"91\"").unwrap();
        writeln!(file, "queue = \"worker_pool\"").unwrap();
        let config = EngineConfig::load(file.path()).unwrap();
        assert_eq!(config.default_country_code, "91");
        assert_eq!(config.queue, QueueMode::WorkerPool);
        assert_eq!(config.max_parallel_cleans, 3);
    }

    #[test]
    fn zero_parallelism_is_rejected() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "max_parallel_cleans = 0").unwrap();
        let err = EngineConfig::load(file.path()).unwrap_err();
        assert_eq!(err.tag(), "ConfigError");
    }
}
