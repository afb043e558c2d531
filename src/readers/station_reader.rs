use crate::archive::RateLimiter;
use crate::error::{CollectorError, Result};
use crate::http::HttpClient;
use crate::models::{Resolution, Station};
use crate::utils::encoding::decode_text;
use crate::utils::fs::write_atomically;
use chrono::NaiveDate;
use std::path::Path;
use tracing::{debug, info};
use validator::Validate;

/// Column positions found in the directory header.
#[derive(Debug, Default)]
struct DirectoryColumns {
    id: Option<usize>,
    name: Option<usize>,
    county: Option<usize>,
    latitude: Option<usize>,
    longitude: Option<usize>,
    elevation: Option<usize>,
    open: Option<usize>,
    close: Option<usize>,
    data_types: Option<usize>,
}

/// Loads the station directory. Any failure is a
/// [`CollectorError::DirectoryFetch`], which ends the run.
pub struct StationReader<'a> {
    client: &'a dyn HttpClient,
    limiter: &'a dyn RateLimiter,
}

impl<'a> StationReader<'a> {
    pub fn new(client: &'a dyn HttpClient, limiter: &'a dyn RateLimiter) -> Self {
        Self { client, limiter }
    }

    /// Fetch and parse the directory at `source`: an http(s) URL, a
    /// `file://` URL or a local path. Stations come back sorted by county
    /// then name.
    pub fn load(&self, source: &str) -> Result<Vec<Station>> {
        info!("Downloading station directory from {}", source);

        let text = self
            .fetch_text(source)
            .map_err(|e| CollectorError::directory(source, e))?;
        let mut stations = self
            .parse_stations(&text)
            .map_err(|e| CollectorError::directory(source, e))?;

        stations.sort_by(|a, b| {
            a.county
                .cmp(&b.county)
                .then_with(|| a.name.cmp(&b.name))
        });

        info!("Loaded {} stations", stations.len());
        Ok(stations)
    }

    fn fetch_text(&self, source: &str) -> Result<String> {
        if source.starts_with("http://") || source.starts_with("https://") {
            let response = self.client.get(source);
            self.limiter.pause();
            let response = response?;
            if !response.is_success() {
                return Err(CollectorError::Network {
                    url: source.to_string(),
                    message: format!("HTTP status {}", response.status),
                });
            }
            return Ok(decode_text(&response.body));
        }

        let path = source.strip_prefix("file://").unwrap_or(source);
        let bytes = std::fs::read(path)?;
        Ok(decode_text(&bytes))
    }

    /// Parse directory CSV text.
    pub fn parse_stations(&self, text: &str) -> Result<Vec<Station>> {
        let mut reader = csv::ReaderBuilder::new()
            .flexible(true)
            .trim(csv::Trim::All)
            .from_reader(text.as_bytes());

        let columns = map_columns(reader.headers()?)?;
        let mut stations = Vec::new();

        for (index, record) in reader.records().enumerate() {
            let record = record?;
            if record.iter().all(str::is_empty) {
                continue;
            }
            let line = index + 2;
            let station = parse_station(&columns, &record).map_err(|e| {
                CollectorError::InvalidFormat(format!("line {}: {}", line, e))
            })?;
            stations.push(station);
        }

        if stations.is_empty() {
            return Err(CollectorError::InvalidFormat(
                "station directory is empty".to_string(),
            ));
        }

        Ok(stations)
    }

    /// Write the loaded directory alongside the datasets.
    pub fn write_snapshot(stations: &[Station], path: &Path) -> Result<()> {
        write_atomically(path, |w| {
            let mut writer = csv::Writer::from_writer(w);
            writer.write_record([
                "stno",
                "county",
                "name",
                "latitude",
                "longitude",
                "elevation",
                "open_date",
                "close_date",
                "data_types",
            ])?;

            for station in stations {
                let data_types = station
                    .resolutions
                    .as_ref()
                    .map(|listed| {
                        listed
                            .iter()
                            .map(Resolution::name)
                            .collect::<Vec<_>>()
                            .join("|")
                    })
                    .unwrap_or_default();

                writer.write_record([
                    station.id.to_string(),
                    station.county.clone().unwrap_or_default(),
                    station.name.clone(),
                    station.latitude.to_string(),
                    station.longitude.to_string(),
                    station.elevation.map(|e| e.to_string()).unwrap_or_default(),
                    station.open_date.map(|d| d.to_string()).unwrap_or_default(),
                    station.close_date.map(|d| d.to_string()).unwrap_or_default(),
                    data_types,
                ])?;
            }

            writer.flush()?;
            Ok(())
        })?;

        debug!("Wrote {} stations to {}", stations.len(), path.display());
        Ok(())
    }
}

fn normalize_header(header: &str) -> String {
    header
        .chars()
        .filter(char::is_ascii_alphanumeric)
        .collect::<String>()
        .to_ascii_lowercase()
}

fn map_columns(headers: &csv::StringRecord) -> Result<DirectoryColumns> {
    let mut columns = DirectoryColumns::default();

    for (i, header) in headers.iter().enumerate() {
        let slot = match normalize_header(header).as_str() {
            "stno" | "stationno" | "stationnumber" | "id" => &mut columns.id,
            "name" | "stationname" => &mut columns.name,
            "county" => &mut columns.county,
            "latitude" | "lat" => &mut columns.latitude,
            "longitude" | "lon" | "long" => &mut columns.longitude,
            "heightm" | "height" | "elevation" => &mut columns.elevation,
            "openyear" | "open" | "opendate" => &mut columns.open,
            "closeyear" | "close" | "closedate" => &mut columns.close,
            "datatypes" => &mut columns.data_types,
            _ => continue,
        };
        slot.get_or_insert(i);
    }

    let required = [
        ("stno", columns.id),
        ("name", columns.name),
        ("latitude", columns.latitude),
        ("longitude", columns.longitude),
    ];
    for (name, position) in required {
        if position.is_none() {
            return Err(CollectorError::InvalidFormat(format!(
                "missing '{}' column in station directory",
                name
            )));
        }
    }

    Ok(columns)
}

fn cell(record: &csv::StringRecord, position: Option<usize>) -> Option<&str> {
    position
        .and_then(|i| record.get(i))
        .filter(|value| !value.is_empty())
}

fn parse_station(columns: &DirectoryColumns, record: &csv::StringRecord) -> Result<Station> {
    let id_text = cell(record, columns.id).unwrap_or_default();
    let id = id_text
        .parse::<u32>()
        .map_err(|_| CollectorError::InvalidFormat(format!("Invalid station ID: '{}'", id_text)))?;

    let name = cell(record, columns.name).unwrap_or_default().to_string();
    let latitude = parse_number(cell(record, columns.latitude), "latitude")?
        .ok_or_else(|| CollectorError::InvalidFormat(format!("Station {} has no latitude", id)))?;
    let longitude = parse_number(cell(record, columns.longitude), "longitude")?
        .ok_or_else(|| CollectorError::InvalidFormat(format!("Station {} has no longitude", id)))?;

    let mut station = Station::new(id, name, latitude, longitude);
    station.county = cell(record, columns.county).map(str::to_string);
    station.elevation = parse_number(cell(record, columns.elevation), "elevation")?;
    station.open_date = parse_directory_date(cell(record, columns.open))?;
    station.close_date = parse_directory_date(cell(record, columns.close))?;
    station.resolutions = cell(record, columns.data_types).map(parse_data_types);

    station.validate()?;
    Ok(station)
}

fn parse_number(value: Option<&str>, what: &str) -> Result<Option<f64>> {
    match value {
        None => Ok(None),
        Some(v) if is_null(v) => Ok(None),
        Some(v) => v
            .parse::<f64>()
            .map(Some)
            .map_err(|_| CollectorError::InvalidFormat(format!("Invalid {}: '{}'", what, v))),
    }
}

fn is_null(value: &str) -> bool {
    ["(null)", "null", "open", "n/a", "-"]
        .iter()
        .any(|token| token.eq_ignore_ascii_case(value))
}

/// Accepts a bare year (`1943`) or an ISO date.
fn parse_directory_date(value: Option<&str>) -> Result<Option<NaiveDate>> {
    let Some(value) = value.filter(|v| !is_null(v)) else {
        return Ok(None);
    };

    if let Ok(year) = value.parse::<i32>() {
        return NaiveDate::from_ymd_opt(year, 1, 1)
            .map(Some)
            .ok_or_else(|| CollectorError::InvalidFormat(format!("Invalid year: '{}'", value)));
    }

    Ok(Some(NaiveDate::parse_from_str(value, "%Y-%m-%d")?))
}

/// `"hourly | daily|monthly"` style lists; unknown entries are skipped.
fn parse_data_types(value: &str) -> Vec<Resolution> {
    value
        .split('|')
        .filter_map(|token| token.parse::<Resolution>().ok())
        .collect()
}
