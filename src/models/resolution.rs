use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::error::{CollectorError, Result};

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum Resolution {
    Monthly,
    Daily,
    Hourly,
}

const MONTHLY_FIELDS: &[&str] = &[
    "meant", "maxtp", "mintp", "mnmax", "mnmin", "rain", "gmin", "wdsp", "maxgt", "sun",
];

const DAILY_FIELDS: &[&str] = &[
    "maxtp", "mintp", "igmin", "gmin", "rain", "cbl", "wdsp", "hm", "ddhm", "hg", "sun", "dos",
    "soil", "pe", "evap", "smd_wd", "smd_md", "smd_pd", "glorad",
];

const HOURLY_FIELDS: &[&str] = &[
    "rain", "temp", "wetb", "dewpt", "vappr", "rhum", "msl", "wdsp", "wddir", "ww", "w", "sun",
    "vis", "clht", "clamt",
];

impl Resolution {
    pub const ALL: [Resolution; 3] = [Resolution::Monthly, Resolution::Daily, Resolution::Hourly];

    pub fn name(&self) -> &'static str {
        match self {
            Resolution::Monthly => "monthly",
            Resolution::Daily => "daily",
            Resolution::Hourly => "hourly",
        }
    }

    /// Letter used in archive names (`mly`, `dly`, `hly`).
    pub fn letter(&self) -> char {
        match self {
            Resolution::Monthly => 'm',
            Resolution::Daily => 'd',
            Resolution::Hourly => 'h',
        }
    }

    /// Archive stem for a station, e.g. `dly1234`.
    pub fn archive_stem(&self, station_id: u32) -> String {
        format!("{}ly{}", self.letter(), station_id)
    }

    pub fn archive_file_name(&self, station_id: u32) -> String {
        format!("{}.zip", self.archive_stem(station_id))
    }

    pub fn output_file_name(&self) -> String {
        format!("{}_all_stations.csv", self.name())
    }

    /// Measured fields in output column order.
    pub fn fields(&self) -> &'static [&'static str] {
        match self {
            Resolution::Monthly => MONTHLY_FIELDS,
            Resolution::Daily => DAILY_FIELDS,
            Resolution::Hourly => HOURLY_FIELDS,
        }
    }

    pub fn field_index(&self, name: &str) -> Option<usize> {
        self.fields().iter().position(|f| *f == name)
    }

    pub fn timestamp_format(&self) -> &'static str {
        match self {
            Resolution::Monthly => "%Y-%m",
            Resolution::Daily => "%Y-%m-%d",
            Resolution::Hourly => "%Y-%m-%d %H:%M",
        }
    }

    pub fn format_timestamp(&self, timestamp: &NaiveDateTime) -> String {
        timestamp.format(self.timestamp_format()).to_string()
    }

    /// Parse a timestamp written by [`Resolution::format_timestamp`].
    pub fn parse_timestamp(&self, text: &str) -> Result<NaiveDateTime> {
        let text = text.trim();
        let parsed = match self {
            Resolution::Monthly => {
                NaiveDate::parse_from_str(&format!("{}-01", text), "%Y-%m-%d")?.and_hms_opt(0, 0, 0)
            }
            Resolution::Daily => NaiveDate::parse_from_str(text, "%Y-%m-%d")?.and_hms_opt(0, 0, 0),
            Resolution::Hourly => Some(NaiveDateTime::parse_from_str(text, "%Y-%m-%d %H:%M")?),
        };
        parsed.ok_or_else(|| CollectorError::InvalidFormat(format!("Invalid timestamp '{}'", text)))
    }
}

impl FromStr for Resolution {
    type Err = CollectorError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "monthly" => Ok(Resolution::Monthly),
            "daily" => Ok(Resolution::Daily),
            "hourly" => Ok(Resolution::Hourly),
            other => Err(CollectorError::InvalidFormat(format!(
                "Invalid data format: '{}'. Options are: monthly, daily, hourly",
                other
            ))),
        }
    }
}

impl std::fmt::Display for Resolution {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}
