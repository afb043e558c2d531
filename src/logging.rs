use crate::error::{CollectorError, Result};
use crate::utils::constants::{LOG_FILES_KEPT, LOG_FILE_PATH};
use std::fs;
use std::path::{Path, PathBuf};
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

/// Where the rolling log lives: `logs/irish_weather.log` becomes files
/// named `irish_weather.<date>.log` in `logs/`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogTarget {
    pub directory: PathBuf,
    pub prefix: String,
    pub suffix: Option<String>,
}

impl LogTarget {
    pub fn from_path(path: &Path) -> Self {
        let directory = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        let prefix = path
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_else(|| "irish_weather".to_string());
        let suffix = path
            .extension()
            .map(|ext| ext.to_string_lossy().into_owned());

        Self {
            directory,
            prefix,
            suffix,
        }
    }

    fn appender(&self) -> Result<RollingFileAppender> {
        fs::create_dir_all(&self.directory)?;

        let mut builder = RollingFileAppender::builder()
            .rotation(Rotation::DAILY)
            .filename_prefix(&self.prefix)
            .max_log_files(LOG_FILES_KEPT);
        if let Some(suffix) = &self.suffix {
            builder = builder.filename_suffix(suffix);
        }

        builder.build(&self.directory).map_err(|e| {
            CollectorError::Config(format!(
                "Cannot open log file in {}: {}",
                self.directory.display(),
                e
            ))
        })
    }
}

impl Default for LogTarget {
    fn default() -> Self {
        Self::from_path(Path::new(LOG_FILE_PATH))
    }
}

/// Install the global subscriber: stderr plus a plain-text copy in a
/// daily-rolled log file, `log_file` or `logs/irish_weather.log` by default.
/// `RUST_LOG` overrides the level.
pub fn init_logging(verbose: bool, log_file: Option<&Path>) -> Result<()> {
    let default_directive = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive));

    let target = log_file.map(LogTarget::from_path).unwrap_or_default();
    let file_layer = fmt::layer()
        .with_ansi(false)
        .with_target(false)
        .with_writer(target.appender()?);

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
        .with(file_layer)
        .try_init()
        .map_err(|e| CollectorError::Config(format!("Failed to initialise logging: {}", e)))
}
