use chrono::{NaiveDate, NaiveDateTime};

use super::Resolution;
use crate::error::{CollectorError, Result};

/// One station's measurements at one timestamp. `values` follows the
/// field order of the row's [`Resolution`].
#[derive(Debug, Clone, PartialEq)]
pub struct ObservationRow {
    pub station_id: u32,
    pub timestamp: NaiveDateTime,
    pub values: Vec<Option<f64>>,
}

/// Dataset ordering: timestamp first, station second.
pub type RowKey = (NaiveDateTime, u32);

impl ObservationRow {
    pub fn new(station_id: u32, timestamp: NaiveDateTime, values: Vec<Option<f64>>) -> Self {
        Self {
            station_id,
            timestamp,
            values,
        }
    }

    /// A row with every field of `resolution` missing.
    pub fn empty(resolution: Resolution, station_id: u32, timestamp: NaiveDateTime) -> Self {
        Self::new(station_id, timestamp, vec![None; resolution.fields().len()])
    }

    pub fn key(&self) -> RowKey {
        (self.timestamp, self.station_id)
    }

    pub fn date(&self) -> NaiveDate {
        self.timestamp.date()
    }

    pub fn value(&self, resolution: Resolution, field: &str) -> Option<f64> {
        resolution
            .field_index(field)
            .and_then(|i| self.values.get(i).copied().flatten())
    }

    pub fn check_width(&self, resolution: Resolution) -> Result<()> {
        let expected = resolution.fields().len();
        if self.values.len() != expected {
            return Err(CollectorError::InvalidFormat(format!(
                "Row for station {} at {} has {} values, {} expects {}",
                self.station_id,
                self.timestamp,
                self.values.len(),
                resolution,
                expected
            )));
        }
        Ok(())
    }
}
