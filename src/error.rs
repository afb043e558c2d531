use crate::models::Resolution;
use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, CollectorError>;

#[derive(Error, Debug)]
pub enum CollectorError {
    #[error("Failed to fetch station directory from {source_url}: {reason}")]
    DirectoryFetch { source_url: String, reason: String },

    #[error("No {resolution} archive published for station {station_id}")]
    ArchiveNotFound {
        station_id: u32,
        resolution: Resolution,
    },

    #[error("Network error for {url}: {message}")]
    Network { url: String, message: String },

    #[error("Failed to parse archive {}: {message}", path.display())]
    Parse { path: PathBuf, message: String },

    #[error("File I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV parsing error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Date parsing error: {0}")]
    DateParse(#[from] chrono::ParseError),

    #[error("Zip archive error: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Settings error: {0}")]
    Settings(#[from] config::ConfigError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Validation error: {0}")]
    Validation(#[from] validator::ValidationErrors),

    #[error("Invalid data format: {0}")]
    InvalidFormat(String),
}

impl CollectorError {
    pub fn parse(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        CollectorError::Parse {
            path: path.into(),
            message: message.into(),
        }
    }

    pub fn directory(source_url: &str, reason: impl std::fmt::Display) -> Self {
        CollectorError::DirectoryFetch {
            source_url: source_url.to_string(),
            reason: reason.to_string(),
        }
    }

    /// Whether the run must stop. Everything else is handled per station.
    pub fn is_fatal(&self) -> bool {
        matches!(self, CollectorError::DirectoryFetch { .. })
    }
}
