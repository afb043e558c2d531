use super::data_merger::MergeSummary;
use crate::models::Resolution;

/// Result of one station for one resolution.
#[derive(Debug, Clone, PartialEq)]
pub enum StationOutcome {
    Ok { rows: usize },
    NoData { reason: String },
    Error { message: String },
}

#[derive(Debug, Clone, PartialEq)]
pub struct StationResult {
    pub station_id: u32,
    pub label: String,
    pub outcome: StationOutcome,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ResolutionReport {
    pub resolution: Resolution,
    pub stations: Vec<StationResult>,
    pub rows_collected: usize,
    pub merge: Option<MergeSummary>,
    pub merge_error: Option<String>,
}

impl ResolutionReport {
    pub fn new(resolution: Resolution) -> Self {
        Self {
            resolution,
            stations: Vec::new(),
            rows_collected: 0,
            merge: None,
            merge_error: None,
        }
    }

    pub fn record(&mut self, station_id: u32, label: String, outcome: StationOutcome) {
        if let StationOutcome::Ok { rows } = outcome {
            self.rows_collected += rows;
        }
        self.stations.push(StationResult {
            station_id,
            label,
            outcome,
        });
    }

    pub fn ok_count(&self) -> usize {
        self.count(|o| matches!(o, StationOutcome::Ok { .. }))
    }

    pub fn no_data_count(&self) -> usize {
        self.count(|o| matches!(o, StationOutcome::NoData { .. }))
    }

    pub fn error_count(&self) -> usize {
        self.count(|o| matches!(o, StationOutcome::Error { .. }))
    }

    fn count(&self, predicate: impl Fn(&StationOutcome) -> bool) -> usize {
        self.stations.iter().filter(|s| predicate(&s.outcome)).count()
    }

    /// Stations that ended in an error, with their messages.
    pub fn failed_stations(&self) -> Vec<(&str, &str)> {
        self.stations
            .iter()
            .filter_map(|s| match &s.outcome {
                StationOutcome::Error { message } => Some((s.label.as_str(), message.as_str())),
                _ => None,
            })
            .collect()
    }

    pub fn outcome_for(&self, station_id: u32) -> Option<&StationOutcome> {
        self.stations
            .iter()
            .find(|s| s.station_id == station_id)
            .map(|s| &s.outcome)
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunReport {
    pub station_count: usize,
    pub resolutions: Vec<ResolutionReport>,
}

impl RunReport {
    pub fn resolution(&self, resolution: Resolution) -> Option<&ResolutionReport> {
        self.resolutions.iter().find(|r| r.resolution == resolution)
    }

    pub fn has_failures(&self) -> bool {
        self.resolutions
            .iter()
            .any(|r| r.error_count() > 0 || r.merge_error.is_some())
    }

    pub fn generate_summary(&self) -> String {
        let mut summary = String::new();

        summary.push_str("=== Collection Report ===\n");
        summary.push_str(&format!("Stations in directory: {}\n", self.station_count));

        for report in &self.resolutions {
            summary.push_str(&format!("\n{}:\n", report.resolution));
            summary.push_str(&format!(
                "  Stations: {} ok, {} no data, {} failed\n",
                report.ok_count(),
                report.no_data_count(),
                report.error_count()
            ));
            summary.push_str(&format!("  Rows collected: {}\n", report.rows_collected));

            if let Some(merge) = &report.merge {
                summary.push_str(&format!(
                    "  Dataset {}: {} rows ({} added, {} updated, {} evicted)\n",
                    merge.path.display(),
                    merge.final_rows,
                    merge.rows_added,
                    merge.rows_updated,
                    merge.rows_evicted
                ));
                if let Some(warning) = &merge.retention_warning {
                    summary.push_str(&format!("  Retention warning: {}\n", warning));
                }
            }

            if let Some(error) = &report.merge_error {
                summary.push_str(&format!("  Merge failed: {}\n", error));
            }

            let failed = report.failed_stations();
            if !failed.is_empty() {
                summary.push_str("  Failed stations:\n");
                for (label, message) in failed {
                    summary.push_str(&format!("    {}: {}\n", label, message));
                }
            }
        }

        summary
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counts_and_failures() {
        let mut report = ResolutionReport::new(Resolution::Daily);
        report.record(532, "532__Dublin__Dublin Airport".into(), StationOutcome::Ok { rows: 30 });
        report.record(
            1234,
            "1234__Cork__Roches Point".into(),
            StationOutcome::NoData {
                reason: "no archive".into(),
            },
        );
        report.record(
            3904,
            "3904__Dublin__Phoenix Park".into(),
            StationOutcome::Error {
                message: "HTTP status 503".into(),
            },
        );
        report.record(1034, "1034__Cork__Ballincollig".into(), StationOutcome::Ok { rows: 12 });

        assert_eq!(report.ok_count(), 2);
        assert_eq!(report.no_data_count(), 1);
        assert_eq!(report.error_count(), 1);
        assert_eq!(report.rows_collected, 42);
        assert_eq!(
            report.failed_stations(),
            vec![("3904__Dublin__Phoenix Park", "HTTP status 503")]
        );
        assert!(matches!(
            report.outcome_for(1234),
            Some(StationOutcome::NoData { .. })
        ));

        let run = RunReport {
            station_count: 4,
            resolutions: vec![report],
        };
        assert!(run.has_failures());

        let summary = run.generate_summary();
        assert!(summary.contains("2 ok, 1 no data, 1 failed"));
        assert!(summary.contains("3904__Dublin__Phoenix Park: HTTP status 503"));
    }

    #[test]
    fn test_clean_run_has_no_failures() {
        let mut report = ResolutionReport::new(Resolution::Monthly);
        report.record(532, "532".into(), StationOutcome::Ok { rows: 1 });
        let run = RunReport {
            station_count: 1,
            resolutions: vec![report],
        };
        assert!(!run.has_failures());
        assert!(run.resolution(Resolution::Monthly).is_some());
        assert!(run.resolution(Resolution::Hourly).is_none());
    }
}
