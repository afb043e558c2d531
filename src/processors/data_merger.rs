use crate::error::Result;
use crate::models::{ObservationRow, Resolution, RowKey};
use crate::writers::CsvWriter;
use chrono::NaiveDate;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Row cap for a consolidated dataset. Rows dated on or after `min_date`
/// are kept even when that leaves the dataset above `max_rows`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetentionPolicy {
    pub max_rows: Option<usize>,
    pub min_date: NaiveDate,
}

impl RetentionPolicy {
    pub fn new(max_rows: Option<usize>, min_date: NaiveDate) -> Self {
        Self { max_rows, min_date }
    }

    pub fn unlimited() -> Self {
        Self {
            max_rows: None,
            min_date: NaiveDate::MIN,
        }
    }
}

/// Recorded when `min_date` stopped eviction before the cap was reached.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetentionWarning {
    pub max_rows: usize,
    pub final_rows: usize,
    pub min_date: NaiveDate,
}

impl std::fmt::Display for RetentionWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} rows kept, above max_rows {}: no rows older than {} left to evict",
            self.final_rows, self.max_rows, self.min_date
        )
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct MergeSummary {
    pub path: PathBuf,
    pub rows_existing: usize,
    pub rows_added: usize,
    pub rows_updated: usize,
    pub rows_evicted: usize,
    pub final_rows: usize,
    pub retention_warning: Option<RetentionWarning>,
}

/// Merges freshly parsed rows into one resolution's consolidated dataset.
pub struct DataMerger {
    resolution: Resolution,
    retention: RetentionPolicy,
    writer: CsvWriter,
}

impl DataMerger {
    pub fn new(resolution: Resolution, retention: RetentionPolicy) -> Self {
        Self {
            resolution,
            retention,
            writer: CsvWriter::new(resolution),
        }
    }

    /// Read-modify-write of the dataset at `path`. The file is only
    /// replaced once the merged result is fully written.
    pub fn merge(&self, new_rows: Vec<ObservationRow>, path: &Path) -> Result<MergeSummary> {
        for row in &new_rows {
            row.check_width(self.resolution)?;
        }

        let existing = self.writer.read_records(path)?;
        let rows_existing = existing.len();

        let (mut rows, rows_added, rows_updated) = merge_rows(existing, new_rows);
        let (rows_evicted, retention_warning) = apply_retention(&mut rows, &self.retention);

        if let Some(ref warning) = retention_warning {
            warn!("Retention policy for {}: {}", path.display(), warning);
        }

        self.writer.write_records(&rows, path)?;

        let summary = MergeSummary {
            path: path.to_path_buf(),
            rows_existing,
            rows_added,
            rows_updated,
            rows_evicted,
            final_rows: rows.len(),
            retention_warning,
        };

        info!(
            "Merged {} dataset: {} existing, {} added, {} updated, {} evicted, {} total",
            self.resolution,
            summary.rows_existing,
            summary.rows_added,
            summary.rows_updated,
            summary.rows_evicted,
            summary.final_rows
        );

        Ok(summary)
    }
}

/// Union of `existing` and `new_rows` keyed by (timestamp, station), new
/// rows replacing existing ones. Returns the sorted rows with the number of
/// added and updated keys.
pub fn merge_rows(
    existing: Vec<ObservationRow>,
    new_rows: Vec<ObservationRow>,
) -> (Vec<ObservationRow>, usize, usize) {
    let mut merged: BTreeMap<RowKey, ObservationRow> = BTreeMap::new();
    for row in existing {
        merged.insert(row.key(), row);
    }

    let mut added = 0;
    let mut updated = 0;
    for row in new_rows {
        match merged.insert(row.key(), row) {
            Some(_) => updated += 1,
            None => added += 1,
        }
    }

    (merged.into_values().collect(), added, updated)
}

/// Drop the oldest rows of a sorted dataset until it fits the cap, stopping
/// at the first row dated on or after the floor.
pub fn apply_retention(
    rows: &mut Vec<ObservationRow>,
    policy: &RetentionPolicy,
) -> (usize, Option<RetentionWarning>) {
    let Some(max_rows) = policy.max_rows else {
        return (0, None);
    };
    if rows.len() <= max_rows {
        return (0, None);
    }

    let excess = rows.len() - max_rows;
    let evictable = rows.partition_point(|row| row.date() < policy.min_date);
    let evicted = excess.min(evictable);
    rows.drain(..evicted);

    let warning = (rows.len() > max_rows).then(|| RetentionWarning {
        max_rows,
        final_rows: rows.len(),
        min_date: policy.min_date,
    });

    (evicted, warning)
}
