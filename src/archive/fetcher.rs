use crate::archive::{ArchiveReader, RateLimiter};
use crate::config::RunConfig;
use crate::error::{CollectorError, Result};
use crate::http::HttpClient;
use crate::models::Resolution;
use crate::utils::filename::archive_cache_path;
use crate::utils::fs::{remove_if_exists, write_atomically};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchOutcome {
    /// Freshly downloaded to the given path
    Downloaded(PathBuf),
    /// Existing local copy reused without a request
    Cached(PathBuf),
    /// The service publishes nothing for this station and resolution
    NotFound,
}

impl FetchOutcome {
    pub fn path(&self) -> Option<&Path> {
        match self {
            FetchOutcome::Downloaded(path) | FetchOutcome::Cached(path) => Some(path),
            FetchOutcome::NotFound => None,
        }
    }
}

/// Downloads per-station archives one request at a time, pausing after
/// every request.
pub struct ArchiveFetcher<'a> {
    client: &'a dyn HttpClient,
    limiter: &'a dyn RateLimiter,
    base_url: String,
    output_dir: PathBuf,
    overwrite_files: bool,
    max_attempts: u32,
}

impl<'a> ArchiveFetcher<'a> {
    pub fn new(client: &'a dyn HttpClient, limiter: &'a dyn RateLimiter, config: &RunConfig) -> Self {
        Self {
            client,
            limiter,
            base_url: config.archive_base_url.clone(),
            output_dir: config.output_dir.clone(),
            overwrite_files: config.overwrite_files,
            max_attempts: config.max_attempts.max(1),
        }
    }

    pub fn archive_url(&self, station_id: u32, resolution: Resolution) -> String {
        let file_name = resolution.archive_file_name(station_id);
        if self.base_url.ends_with('/') {
            format!("{}{}", self.base_url, file_name)
        } else {
            format!("{}/{}", self.base_url, file_name)
        }
    }

    pub fn local_path(&self, station_id: u32, resolution: Resolution) -> PathBuf {
        archive_cache_path(&self.output_dir, resolution, station_id)
    }

    /// Fetch the archive for one station. `NotFound` is an expected outcome;
    /// an error means the retries ran out, the body was not a zip archive or
    /// the local copy could not be written. Only verified archives are cached.
    pub fn fetch(&self, station_id: u32, resolution: Resolution) -> Result<FetchOutcome> {
        let local_path = self.local_path(station_id, resolution);

        if !self.overwrite_files && local_path.exists() {
            debug!(
                "Archive found for station {} ({}). Skipping download",
                station_id, resolution
            );
            return Ok(FetchOutcome::Cached(local_path));
        }

        let url = self.archive_url(station_id, resolution);
        match self.download(&url, station_id, resolution) {
            Ok(bytes) => {
                ArchiveReader::verify(&bytes, &local_path)?;
                write_atomically(&local_path, |w| Ok(w.write_all(&bytes)?))?;
                info!(
                    "Fetched {} data for station {} ({} bytes)",
                    resolution,
                    station_id,
                    bytes.len()
                );
                Ok(FetchOutcome::Downloaded(local_path))
            }
            Err(CollectorError::ArchiveNotFound { .. }) => {
                info!("Station {} has no {} data at {}", station_id, resolution, url);
                remove_if_exists(&local_path)?;
                Ok(FetchOutcome::NotFound)
            }
            Err(e) => Err(e),
        }
    }

    fn download(&self, url: &str, station_id: u32, resolution: Resolution) -> Result<Vec<u8>> {
        let mut last_error = None;

        for attempt in 1..=self.max_attempts {
            debug!("GET {} (attempt {}/{})", url, attempt, self.max_attempts);
            let result = self.client.get(url);
            self.limiter.pause();

            let failure = match result {
                Ok(response) if response.is_success() => return Ok(response.body),
                Ok(response) if response.is_not_found() => {
                    return Err(CollectorError::ArchiveNotFound {
                        station_id,
                        resolution,
                    });
                }
                Ok(response) => {
                    let error = CollectorError::Network {
                        url: url.to_string(),
                        message: format!("HTTP status {}", response.status),
                    };
                    if !response.is_retryable() {
                        return Err(error);
                    }
                    error
                }
                Err(error @ CollectorError::Network { .. }) => error,
                Err(error) => return Err(error),
            };

            warn!(
                "Attempt {}/{} failed for station {} ({}): {}",
                attempt, self.max_attempts, station_id, resolution, failure
            );
            last_error = Some(failure);
        }

        Err(last_error.unwrap_or_else(|| CollectorError::Network {
            url: url.to_string(),
            message: "no attempts made".to_string(),
        }))
    }
}
