use super::data_merger::{DataMerger, RetentionPolicy};
use super::run_report::{ResolutionReport, RunReport, StationOutcome};
use crate::archive::{ArchiveFetcher, FixedInterval, RateLimiter};
use crate::config::RunConfig;
use crate::error::Result;
use crate::http::{HttpClient, ReqwestClient};
use crate::models::{ObservationRow, Resolution, Station};
use crate::readers::{ObservationReader, StationReader};
use crate::utils::filename::{consolidated_path, stations_snapshot_path};
use crate::utils::fs::remove_if_exists;
use crate::utils::progress::ProgressReporter;
use std::fs;
use tracing::{debug, error, info, warn};

/// Runs one collection pass: station directory, then every requested
/// resolution in turn, one station at a time.
pub struct Collector {
    config: RunConfig,
    client: Box<dyn HttpClient>,
    limiter: Box<dyn RateLimiter>,
}

impl Collector {
    /// Production collector: blocking reqwest client and a sleeping rate limiter.
    pub fn new(config: RunConfig) -> Result<Self> {
        let client = ReqwestClient::new(config.request_timeout(), &config.user_agent)?;
        let limiter = FixedInterval::new(config.sleep_delay());
        Ok(Self::with_transport(config, Box::new(client), Box::new(limiter)))
    }

    pub fn with_transport(
        config: RunConfig,
        client: Box<dyn HttpClient>,
        limiter: Box<dyn RateLimiter>,
    ) -> Self {
        Self {
            config,
            client,
            limiter,
        }
    }

    /// Only a station directory failure (or an unusable output directory)
    /// is returned as an error. Station and merge failures are recorded in
    /// the report.
    pub fn run(&self) -> Result<RunReport> {
        fs::create_dir_all(&self.config.output_dir)?;

        let station_reader = StationReader::new(self.client.as_ref(), self.limiter.as_ref());
        let stations = station_reader.load(&self.config.station_url)?;

        let snapshot = stations_snapshot_path(&self.config.output_dir);
        if let Err(e) = StationReader::write_snapshot(&stations, &snapshot) {
            warn!("Could not write station snapshot {}: {}", snapshot.display(), e);
        }

        let fetcher = ArchiveFetcher::new(self.client.as_ref(), self.limiter.as_ref(), &self.config);

        let mut report = RunReport {
            station_count: stations.len(),
            resolutions: Vec::new(),
        };

        let mut requested: Vec<Resolution> = Vec::new();
        for resolution in &self.config.resolutions {
            if !requested.contains(resolution) {
                requested.push(*resolution);
            }
        }

        for resolution in requested {
            let resolution_report = self.collect_resolution(resolution, &stations, &fetcher);
            log_resolution_summary(&resolution_report);
            report.resolutions.push(resolution_report);
        }

        Ok(report)
    }

    fn collect_resolution(
        &self,
        resolution: Resolution,
        stations: &[Station],
        fetcher: &ArchiveFetcher<'_>,
    ) -> ResolutionReport {
        info!("Collecting {} data for {} stations", resolution, stations.len());

        let reader = ObservationReader::new(resolution);
        let progress = ProgressReporter::new(
            stations.len() as u64,
            &format!("Collecting {} data", resolution),
            !self.config.show_progress,
        );

        let mut report = ResolutionReport::new(resolution);
        let mut rows: Vec<ObservationRow> = Vec::new();

        for station in stations {
            progress.set_message(&format!("{}: {}", resolution, station.label()));

            let outcome = if station.offers(resolution) {
                match self.collect_station(fetcher, &reader, station, resolution) {
                    Ok(Some(station_rows)) if station_rows.is_empty() => StationOutcome::NoData {
                        reason: "archive holds no rows".to_string(),
                    },
                    Ok(Some(station_rows)) => {
                        let count = station_rows.len();
                        rows.extend(station_rows);
                        StationOutcome::Ok { rows: count }
                    }
                    Ok(None) => StationOutcome::NoData {
                        reason: "no archive published".to_string(),
                    },
                    Err(e) => {
                        warn!("Error on {} for {}: {}", station.label(), resolution, e);
                        StationOutcome::Error {
                            message: e.to_string(),
                        }
                    }
                }
            } else {
                debug!("{} does not list {} data", station.label(), resolution);
                StationOutcome::NoData {
                    reason: format!("directory does not list {} data", resolution),
                }
            };

            report.record(station.id, station.label(), outcome);
            progress.increment(1);
        }

        progress.finish_with_message(&format!(
            "{}: {} rows from {} stations",
            resolution,
            report.rows_collected,
            report.ok_count()
        ));

        let retention = RetentionPolicy::new(self.config.row_cap(), self.config.min_date);
        let merger = DataMerger::new(resolution, retention);
        let path = consolidated_path(&self.config.output_dir, resolution);

        match merger.merge(rows, &path) {
            Ok(summary) => report.merge = Some(summary),
            Err(e) => {
                error!("Failed to merge {} data into {}: {}", resolution, path.display(), e);
                report.merge_error = Some(e.to_string());
            }
        }

        report
    }

    /// `Ok(None)` when the service has no archive for the station.
    fn collect_station(
        &self,
        fetcher: &ArchiveFetcher<'_>,
        reader: &ObservationReader,
        station: &Station,
        resolution: Resolution,
    ) -> Result<Option<Vec<ObservationRow>>> {
        let outcome = fetcher.fetch(station.id, resolution)?;
        let Some(path) = outcome.path() else {
            return Ok(None);
        };

        let rows = match reader.read_archive(path, station.id) {
            Ok(rows) => rows,
            Err(e) => {
                // An unreadable copy must not be reused by later runs
                warn!("Discarding unreadable archive {}", path.display());
                remove_if_exists(path)?;
                return Err(e);
            }
        };
        debug!("{}: {} {} rows", station.label(), rows.len(), resolution);
        Ok(Some(rows))
    }
}

fn log_resolution_summary(report: &ResolutionReport) {
    info!(
        "{}: {} ok, {} no data, {} failed, {} rows collected",
        report.resolution,
        report.ok_count(),
        report.no_data_count(),
        report.error_count(),
        report.rows_collected
    );

    for (label, message) in report.failed_stations() {
        warn!("{} failed: {}", label, message);
    }

    if let Some(merge) = &report.merge {
        info!(
            "{} dataset {} now holds {} rows",
            report.resolution,
            merge.path.display(),
            merge.final_rows
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::archive::NoDelay;
    use crate::error::CollectorError;
    use crate::http::HttpResponse;
    use crate::utils::filename::archive_cache_path;
    use std::cell::RefCell;
    use std::collections::HashMap;
    use std::io::Write;
    use tempfile::TempDir;
    use zip::ZipWriter;

    const DIRECTORY: &str = "\
stno,county,Name,Height(m),Latitude,Longitude,Open Year,Close Year,data_types
532,Dublin,Dublin Airport,71,53.428,-6.241,1939,(null),daily|monthly
1234,Cork,Roches Point,40,51.793,-8.244,1955,(null),daily
9999,Kerry,Valentia,24,51.938,-10.241,1939,(null),hourly
";

    const DAILY_532: &str = "\
Station Name: DUBLIN AIRPORT
date,ind,maxtp,ind,mintp,igmin,gmin,ind,rain
01-jan-2020,0,9.8,0,4.1,0,2.0,0,0.2
02-jan-2020,0,10.1,0,5.5,0,3.9,0,
";

    /// Serves fixed bodies by URL; anything else is a 404.
    struct MapClient {
        routes: HashMap<String, HttpResponse>,
        requests: RefCell<Vec<String>>,
    }

    impl HttpClient for MapClient {
        fn get(&self, url: &str) -> Result<HttpResponse> {
            self.requests.borrow_mut().push(url.to_string());
            Ok(self
                .routes
                .get(url)
                .cloned()
                .unwrap_or_else(|| HttpResponse::new(404, "")))
        }
    }

    fn zip_bytes(name: &str, content: &str) -> Vec<u8> {
        let mut cursor = std::io::Cursor::new(Vec::new());
        {
            let mut zip = ZipWriter::new(&mut cursor);
            zip.start_file(name, zip::write::FileOptions::default()).unwrap();
            zip.write_all(content.as_bytes()).unwrap();
            zip.finish().unwrap();
        }
        cursor.into_inner()
    }

    fn config(dir: &TempDir) -> RunConfig {
        RunConfig::default()
            .with_output_dir(dir.path())
            .with_station_url("https://example.test/stations.csv")
            .with_archive_base_url("https://example.test/webdata/")
            .with_resolutions(vec![Resolution::Daily])
            .with_show_progress(false)
    }

    fn client(routes: Vec<(&str, HttpResponse)>) -> Box<MapClient> {
        Box::new(MapClient {
            routes: routes
                .into_iter()
                .map(|(url, response)| (url.to_string(), response))
                .collect(),
            requests: RefCell::new(Vec::new()),
        })
    }

    #[test]
    fn test_missing_archive_is_no_data() -> Result<()> {
        let dir = TempDir::new()?;
        let client = client(vec![
            ("https://example.test/stations.csv", HttpResponse::new(200, DIRECTORY)),
            (
                "https://example.test/webdata/dly532.zip",
                HttpResponse::new(200, zip_bytes("dly532.csv", DAILY_532)),
            ),
        ]);

        let collector = Collector::with_transport(config(&dir), client, Box::new(NoDelay));
        let report = collector.run()?;

        let daily = report.resolution(Resolution::Daily).unwrap();
        assert_eq!(daily.outcome_for(532), Some(&StationOutcome::Ok { rows: 2 }));
        assert!(matches!(
            daily.outcome_for(1234),
            Some(StationOutcome::NoData { .. })
        ));
        // Valentia lists hourly only
        assert!(matches!(
            daily.outcome_for(9999),
            Some(StationOutcome::NoData { .. })
        ));
        assert_eq!(daily.error_count(), 0);
        assert!(!report.has_failures());

        let merge = daily.merge.as_ref().unwrap();
        assert_eq!(merge.final_rows, 2);
        assert!(dir.path().join("daily_all_stations.csv").exists());
        assert!(dir.path().join("stations.csv").exists());
        Ok(())
    }

    #[test]
    fn test_directory_failure_aborts_run() -> Result<()> {
        let dir = TempDir::new()?;
        let client = client(vec![]);
        let collector = Collector::with_transport(config(&dir), client, Box::new(NoDelay));

        let err = collector.run().unwrap_err();
        assert!(matches!(err, CollectorError::DirectoryFetch { .. }));
        assert!(!dir.path().join("daily_all_stations.csv").exists());
        Ok(())
    }

    #[test]
    fn test_unparsable_archive_is_station_error() -> Result<()> {
        let dir = TempDir::new()?;
        let client = client(vec![
            ("https://example.test/stations.csv", HttpResponse::new(200, DIRECTORY)),
            ("https://example.test/webdata/dly532.zip", HttpResponse::new(200, "<html>")),
            (
                "https://example.test/webdata/dly1234.zip",
                HttpResponse::new(200, zip_bytes("dly1234.csv", DAILY_532)),
            ),
        ]);

        let collector = Collector::with_transport(config(&dir), client, Box::new(NoDelay));
        let report = collector.run()?;

        let daily = report.resolution(Resolution::Daily).unwrap();
        assert!(matches!(
            daily.outcome_for(532),
            Some(StationOutcome::Error { .. })
        ));
        assert_eq!(daily.outcome_for(1234), Some(&StationOutcome::Ok { rows: 2 }));
        assert_eq!(daily.failed_stations().len(), 1);
        assert!(report.has_failures());
        Ok(())
    }

    #[test]
    fn test_unreadable_table_is_not_kept_for_next_run() -> Result<()> {
        let dir = TempDir::new()?;
        let client = client(vec![
            ("https://example.test/stations.csv", HttpResponse::new(200, DIRECTORY)),
            (
                "https://example.test/webdata/dly532.zip",
                HttpResponse::new(200, zip_bytes("dly532.csv", "Station Name: DUBLIN\nno table\n")),
            ),
        ]);

        let config = config(&dir).with_overwrite_files(false);
        let collector = Collector::with_transport(config, client, Box::new(NoDelay));
        let report = collector.run()?;

        let daily = report.resolution(Resolution::Daily).unwrap();
        assert!(matches!(
            daily.outcome_for(532),
            Some(StationOutcome::Error { .. })
        ));
        assert!(!archive_cache_path(dir.path(), Resolution::Daily, 532).exists());
        Ok(())
    }
}
