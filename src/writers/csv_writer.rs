use crate::error::{CollectorError, Result};
use crate::models::{ObservationRow, Resolution};
use crate::utils::constants::{STATION_ID_COLUMN, TIME_COLUMN};
use crate::utils::fs::write_atomically;
use std::fs::File;
use std::path::Path;
use tracing::debug;

/// Reads and writes a consolidated dataset: `station_id,time,<fields>`.
pub struct CsvWriter {
    resolution: Resolution,
}

impl CsvWriter {
    pub fn new(resolution: Resolution) -> Self {
        Self { resolution }
    }

    pub fn header(&self) -> Vec<&'static str> {
        let mut header = vec![STATION_ID_COLUMN, TIME_COLUMN];
        header.extend_from_slice(self.resolution.fields());
        header
    }

    /// Load an existing dataset. A missing file is an empty dataset.
    pub fn read_records(&self, path: &Path) -> Result<Vec<ObservationRow>> {
        if !path.exists() {
            return Ok(Vec::new());
        }

        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .from_reader(File::open(path)?);

        let expected = self.header();
        let headers = reader.headers()?;
        if !headers.iter().eq(expected.iter().copied()) {
            return Err(CollectorError::InvalidFormat(format!(
                "{} has header '{}', expected '{}'",
                path.display(),
                headers.iter().collect::<Vec<_>>().join(","),
                expected.join(",")
            )));
        }

        let width = expected.len();
        let mut rows = Vec::new();

        for record in reader.records() {
            let record = record?;
            if record.len() != width {
                return Err(CollectorError::InvalidFormat(format!(
                    "{}: row has {} columns, expected {}",
                    path.display(),
                    record.len(),
                    width
                )));
            }

            let station_id = record[0].parse::<u32>().map_err(|_| {
                CollectorError::InvalidFormat(format!("Invalid station ID: '{}'", &record[0]))
            })?;
            let timestamp = self.resolution.parse_timestamp(&record[1])?;

            let values = record
                .iter()
                .skip(2)
                .map(|cell| {
                    if cell.is_empty() {
                        Ok(None)
                    } else {
                        cell.parse::<f64>().map(Some).map_err(|_| {
                            CollectorError::InvalidFormat(format!("Invalid value: '{}'", cell))
                        })
                    }
                })
                .collect::<Result<Vec<_>>>()?;

            rows.push(ObservationRow::new(station_id, timestamp, values));
        }

        debug!("Read {} rows from {}", rows.len(), path.display());
        Ok(rows)
    }

    /// Replace `path` with `rows`, in the order given.
    pub fn write_records(&self, rows: &[ObservationRow], path: &Path) -> Result<()> {
        for row in rows {
            row.check_width(self.resolution)?;
        }

        write_atomically(path, |w| {
            let mut writer = csv::Writer::from_writer(w);
            writer.write_record(self.header())?;

            let mut record = Vec::with_capacity(self.header().len());
            for row in rows {
                record.clear();
                record.push(row.station_id.to_string());
                record.push(self.resolution.format_timestamp(&row.timestamp));
                record.extend(
                    row.values
                        .iter()
                        .map(|v| v.map(|v| v.to_string()).unwrap_or_default()),
                );
                writer.write_record(&record)?;
            }

            writer.flush()?;
            Ok(())
        })?;

        debug!("Wrote {} rows to {}", rows.len(), path.display());
        Ok(())
    }
}
