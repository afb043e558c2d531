use crate::archive::ArchiveReader;
use crate::error::{CollectorError, Result};
use crate::models::{ObservationRow, Resolution};
use crate::utils::constants::MISSING_VALUE_TOKENS;
use chrono::{Datelike, Local, NaiveDate, NaiveDateTime};
use std::collections::btree_map::Entry;
use std::collections::BTreeMap;
use std::path::Path;
use tracing::debug;

const DAILY_DATE_FORMAT: &str = "%d-%b-%Y";
const HOURLY_DATE_FORMAT: &str = "%d-%b-%Y %H:%M";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Column {
    Date,
    Year,
    Month,
    Field(usize),
    Ignored,
}

/// Parses the table inside a station archive into observation rows.
pub struct ObservationReader {
    resolution: Resolution,
    latest_year: i32,
}

impl ObservationReader {
    pub fn new(resolution: Resolution) -> Self {
        Self {
            resolution,
            latest_year: Local::now().year(),
        }
    }

    /// Rows dated after `latest_year` mark a broken parse.
    pub fn with_latest_year(mut self, latest_year: i32) -> Self {
        self.latest_year = latest_year;
        self
    }

    /// Read the archive for `station_id`. Every failure comes back as
    /// [`CollectorError::Parse`] naming the archive.
    pub fn read_archive(&self, zip_path: &Path, station_id: u32) -> Result<Vec<ObservationRow>> {
        let table_name = format!("{}.csv", self.resolution.archive_stem(station_id));
        let table = ArchiveReader::read_table(zip_path, &table_name)?;

        self.parse_table(&table, station_id).map_err(|e| match e {
            CollectorError::Parse { .. } => e,
            other => CollectorError::parse(zip_path, other.to_string()),
        })
    }

    /// Parse the text of an archive table, preamble included.
    pub fn parse_table(&self, text: &str, station_id: u32) -> Result<Vec<ObservationRow>> {
        let (header_line, offset) = find_header(text).ok_or_else(|| {
            CollectorError::InvalidFormat(format!(
                "Headers not found in table for station {}",
                station_id
            ))
        })?;

        let mut reader = csv::ReaderBuilder::new()
            .flexible(true)
            .trim(csv::Trim::All)
            .from_reader(text[offset..].as_bytes());

        let columns = self.map_columns(reader.headers()?)?;
        let mut rows: BTreeMap<NaiveDateTime, Vec<Option<f64>>> = BTreeMap::new();
        let mut duplicates = 0usize;

        for (index, record) in reader.records().enumerate() {
            let record = record?;
            let line = header_line + index + 2;

            let Some(timestamp) = self.parse_timestamp(&columns, &record, line)? else {
                continue;
            };

            if timestamp.year() > self.latest_year {
                return Err(CollectorError::InvalidFormat(format!(
                    "Future date {} on line {} (latest expected year {})",
                    timestamp, line, self.latest_year
                )));
            }

            let values = self.parse_values(&columns, &record, line)?;

            match rows.entry(timestamp) {
                Entry::Vacant(slot) => {
                    slot.insert(values);
                }
                Entry::Occupied(_) => duplicates += 1,
            }
        }

        if duplicates > 0 {
            debug!(
                "Dropped {} duplicate timestamps for station {} ({})",
                duplicates, station_id, self.resolution
            );
        }

        Ok(rows
            .into_iter()
            .map(|(timestamp, values)| ObservationRow::new(station_id, timestamp, values))
            .collect())
    }

    fn map_columns(&self, headers: &csv::StringRecord) -> Result<Vec<Column>> {
        let columns: Vec<Column> = headers
            .iter()
            .map(|header| match header.to_ascii_lowercase().as_str() {
                "date" => Column::Date,
                "year" => Column::Year,
                "month" => Column::Month,
                name => self
                    .resolution
                    .field_index(name)
                    .map_or(Column::Ignored, Column::Field),
            })
            .collect();

        let has = |wanted: Column| columns.contains(&wanted);
        let complete = match self.resolution {
            Resolution::Monthly => (has(Column::Year) && has(Column::Month)) || has(Column::Date),
            Resolution::Daily | Resolution::Hourly => has(Column::Date),
        };

        if !complete {
            return Err(CollectorError::InvalidFormat(format!(
                "No time columns for {} data in header '{}'",
                self.resolution,
                headers.iter().collect::<Vec<_>>().join(",")
            )));
        }

        Ok(columns)
    }

    /// `None` for rows without a date, which the service pads tables with.
    fn parse_timestamp(
        &self,
        columns: &[Column],
        record: &csv::StringRecord,
        line: usize,
    ) -> Result<Option<NaiveDateTime>> {
        let cell = |wanted: Column| {
            columns
                .iter()
                .position(|c| *c == wanted)
                .and_then(|i| record.get(i))
                .unwrap_or("")
        };

        let invalid = |value: &str| {
            CollectorError::InvalidFormat(format!(
                "Failed to parse date '{}' on line {}",
                value, line
            ))
        };

        if self.resolution == Resolution::Monthly && columns.contains(&Column::Year) {
            let (year, month) = (cell(Column::Year), cell(Column::Month));
            if year.is_empty() || month.is_empty() {
                return Ok(None);
            }
            let text = format!("{}-{}", year, month);
            let year: i32 = year.parse().map_err(|_| invalid(&text))?;
            let month: u32 = month.parse().map_err(|_| invalid(&text))?;
            return NaiveDate::from_ymd_opt(year, month, 1)
                .and_then(|d| d.and_hms_opt(0, 0, 0))
                .map(Some)
                .ok_or_else(|| invalid(&text));
        }

        let date = cell(Column::Date);
        if date.is_empty() {
            return Ok(None);
        }

        let parsed = match self.resolution {
            Resolution::Hourly => NaiveDateTime::parse_from_str(date, HOURLY_DATE_FORMAT).ok(),
            Resolution::Daily => NaiveDate::parse_from_str(date, DAILY_DATE_FORMAT)
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0)),
            Resolution::Monthly => NaiveDate::parse_from_str(date, DAILY_DATE_FORMAT)
                .ok()
                .and_then(|d| d.with_day(1))
                .and_then(|d| d.and_hms_opt(0, 0, 0)),
        };

        parsed.map(Some).ok_or_else(|| invalid(date))
    }

    fn parse_values(
        &self,
        columns: &[Column],
        record: &csv::StringRecord,
        line: usize,
    ) -> Result<Vec<Option<f64>>> {
        let mut values = vec![None; self.resolution.fields().len()];

        for (column, cell) in columns.iter().zip(record.iter()) {
            let Column::Field(index) = column else {
                continue;
            };
            values[*index] = parse_value(cell).ok_or_else(|| {
                CollectorError::InvalidFormat(format!(
                    "Non-numeric value '{}' for '{}' on line {}",
                    cell,
                    self.resolution.fields()[*index],
                    line
                ))
            })?;
        }

        Ok(values)
    }
}

/// `Some(None)` for a missing-value token, `None` when the cell is not a number.
fn parse_value(cell: &str) -> Option<Option<f64>> {
    let cell = cell.trim();
    if MISSING_VALUE_TOKENS
        .iter()
        .any(|token| token.eq_ignore_ascii_case(cell))
    {
        return Some(None);
    }
    cell.parse::<f64>().ok().map(Some)
}

/// Locate the table header: the first line starting `date,` or `year,month,`.
/// Returns its line number and byte offset.
fn find_header(text: &str) -> Option<(usize, usize)> {
    let mut offset = 0;
    for (number, line) in text.split_inclusive('\n').enumerate() {
        let mut fields = line.split(',').map(|f| f.trim().to_ascii_lowercase());
        let first = fields.next().unwrap_or_default();
        let is_header = first == "date"
            || (first == "year" && fields.next().is_some_and(|second| second == "month"));
        if is_header {
            return Some((number, offset));
        }
        offset += line.len();
    }
    None
}
