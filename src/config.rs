use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use snafu::ResultExt;

use crate::error::{ConfigSnafu, IoSnafu, Result};
use crate::model::{FSRS, SchedulerConfig};
use crate::retry::RetryPolicy;
use crate::session::DEFAULT_BATCH_SIZE;
use crate::sqlite_store::SqliteStore;

/// Everything a review service needs to start. Missing fields take their
/// defaults, so `{}` is a valid configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub scheduler: SchedulerConfig,
    pub retry: RetryPolicy,
    pub batch_size: usize,
    pub database: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            scheduler: SchedulerConfig::default(),
            retry: RetryPolicy::default(),
            batch_size: DEFAULT_BATCH_SIZE,
            database: PathBuf::from("vocab.db"),
        }
    }
}

impl Config {
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).context(IoSnafu { path })?;
        Self::from_json(&text)
    }

    pub fn from_json(text: &str) -> Result<Self> {
        serde_json::from_str(text).context(ConfigSnafu)
    }

    pub fn scheduler(&self) -> Result<FSRS> {
        FSRS::new(&self.scheduler)
    }

    pub fn open_store(&self) -> Result<SqliteStore> {
        SqliteStore::open(&self.database, self.retry.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SchedulerError;

    #[test]
    fn empty_object_is_default() {
        assert_eq!(Config::from_json("{}").unwrap(), Config::default());
    }

    #[test]
    fn partial_sections_keep_other_defaults() {
        let config = Config::from_json(
            r#"{
                "scheduler": { "request_retention": 0.85 },
                "retry": { "max_attempts": 2 },
                "batch_size": 5
            }"#,
        )
        .unwrap();
        assert_eq!(config.batch_size, 5);
        assert_eq!(config.retry.max_attempts, 2);
        assert_eq!(config.retry.base_delay_ms, 100);
        assert_eq!(config.scheduler.request_retention, 0.85);
        assert_eq!(config.scheduler.maximum_interval, 36500);
        assert_eq!(config.scheduler().unwrap().request_retention(), 0.85);
    }

    #[test]
    fn bad_scheduler_settings_are_rejected() {
        let config =
            Config::from_json(r#"{ "scheduler": { "parameters": [1.0, 2.0] } }"#).unwrap();
        assert!(matches!(
            config.scheduler(),
            Err(SchedulerError::InvalidParameters { .. })
        ));
        assert!(matches!(
            Config::from_json("{ not json"),
            Err(SchedulerError::Config { .. })
        ));
    }
}
