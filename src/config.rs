use crate::error::Result;
use crate::models::Resolution;
use crate::utils::constants::{
    ARCHIVE_BASE_URL, DEFAULT_DATA_DIR, DEFAULT_MAX_ATTEMPTS, DEFAULT_MAX_ROWS, DEFAULT_MIN_DATE,
    DEFAULT_REQUEST_TIMEOUT_SECS, DEFAULT_SLEEP_DELAY_SECS, DEFAULT_USER_AGENT, ENV_PREFIX,
    STATION_DATA_URL,
};
use chrono::NaiveDate;
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use validator::Validate;

/// Settings for one collector run. Built once, read-only afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct RunConfig {
    /// Where consolidated datasets, archive copies and the station snapshot go
    pub output_dir: PathBuf,

    #[validate(length(min = 1))]
    pub resolutions: Vec<Resolution>,

    /// Row cap for each consolidated dataset; `-1` disables eviction
    #[validate(range(min = -1))]
    pub max_rows: i64,

    /// Rows dated on or after this are never evicted
    pub min_date: NaiveDate,

    #[validate(length(min = 1))]
    pub station_url: String,

    #[validate(length(min = 1))]
    pub archive_base_url: String,

    #[validate(range(min = 0.0))]
    pub sleep_delay_secs: f64,

    /// Re-download archives even when a local copy exists
    pub overwrite_files: bool,

    #[validate(range(min = 1, max = 20))]
    pub max_attempts: u32,

    #[validate(range(min = 1))]
    pub request_timeout_secs: u64,

    pub user_agent: String,

    pub show_progress: bool,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from(DEFAULT_DATA_DIR),
            resolutions: Resolution::ALL.to_vec(),
            max_rows: DEFAULT_MAX_ROWS,
            min_date: NaiveDate::parse_from_str(DEFAULT_MIN_DATE, "%Y-%m-%d").unwrap_or_default(),
            station_url: STATION_DATA_URL.to_string(),
            archive_base_url: ARCHIVE_BASE_URL.to_string(),
            sleep_delay_secs: DEFAULT_SLEEP_DELAY_SECS,
            overwrite_files: true,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            show_progress: true,
        }
    }
}

impl RunConfig {
    /// Layer built-in defaults, an optional config file and
    /// `IRISH_WEATHER_*` environment variables.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut builder = Config::builder().add_source(Config::try_from(&RunConfig::default())?);

        if let Some(path) = path {
            builder = builder.add_source(File::from(path).required(true));
        }

        let settings = builder
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .try_parsing(true)
                    .list_separator(",")
                    .with_list_parse_key("resolutions"),
            )
            .build()?;

        settings.try_deserialize::<RunConfig>()?.validated()
    }

    pub fn validated(self) -> Result<Self> {
        self.validate()?;
        Ok(self)
    }

    pub fn with_output_dir(mut self, output_dir: impl Into<PathBuf>) -> Self {
        self.output_dir = output_dir.into();
        self
    }

    pub fn with_resolutions(mut self, resolutions: Vec<Resolution>) -> Self {
        self.resolutions = resolutions;
        self
    }

    pub fn with_retention(mut self, max_rows: i64, min_date: NaiveDate) -> Self {
        self.max_rows = max_rows;
        self.min_date = min_date;
        self
    }

    pub fn with_station_url(mut self, station_url: impl Into<String>) -> Self {
        self.station_url = station_url.into();
        self
    }

    pub fn with_archive_base_url(mut self, archive_base_url: impl Into<String>) -> Self {
        self.archive_base_url = archive_base_url.into();
        self
    }

    pub fn with_overwrite_files(mut self, overwrite_files: bool) -> Self {
        self.overwrite_files = overwrite_files;
        self
    }

    pub fn with_show_progress(mut self, show_progress: bool) -> Self {
        self.show_progress = show_progress;
        self
    }

    pub fn sleep_delay(&self) -> Duration {
        Duration::from_secs_f64(self.sleep_delay_secs.max(0.0))
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Row cap, or `None` when eviction is disabled.
    pub fn row_cap(&self) -> Option<usize> {
        usize::try_from(self.max_rows).ok()
    }
}
