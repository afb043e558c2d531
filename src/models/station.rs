use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use validator::Validate;

use super::Resolution;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct Station {
    pub id: u32,

    #[validate(length(min = 1))]
    pub name: String,

    pub county: Option<String>,

    #[validate(range(min = -90.0, max = 90.0))]
    pub latitude: f64,

    #[validate(range(min = -180.0, max = 180.0))]
    pub longitude: f64,

    pub elevation: Option<f64>,

    pub open_date: Option<NaiveDate>,

    pub close_date: Option<NaiveDate>,

    /// Resolutions the directory lists for this station. `None` when the
    /// directory carries no data-type column.
    pub resolutions: Option<Vec<Resolution>>,
}

impl Station {
    pub fn new(id: u32, name: String, latitude: f64, longitude: f64) -> Self {
        Self {
            id,
            name,
            county: None,
            latitude,
            longitude,
            elevation: None,
            open_date: None,
            close_date: None,
            resolutions: None,
        }
    }

    pub fn with_county(mut self, county: impl Into<String>) -> Self {
        self.county = Some(county.into());
        self
    }

    pub fn with_resolutions(mut self, resolutions: Vec<Resolution>) -> Self {
        self.resolutions = Some(resolutions);
        self
    }

    /// Whether the station may publish data at `resolution`.
    pub fn offers(&self, resolution: Resolution) -> bool {
        self.resolutions
            .as_ref()
            .map_or(true, |listed| listed.contains(&resolution))
    }

    /// Label used in logs and failure listings, e.g. `3904__Dublin__Phoenix Park`.
    pub fn label(&self) -> String {
        match &self.county {
            Some(county) => format!("{}__{}__{}", self.id, county, self.name),
            None => format!("{}__{}", self.id, self.name),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_station_validation() {
        let station = Station::new(3904, "Phoenix Park".to_string(), 53.364, -6.350)
            .with_county("Dublin");

        assert!(station.validate().is_ok());
        assert_eq!(station.label(), "3904__Dublin__Phoenix Park");
    }

    #[test]
    fn test_invalid_coordinates() {
        let station = Station::new(12345, "Invalid Station".to_string(), 91.0, -6.0);
        assert!(station.validate().is_err());
    }

    #[test]
    fn test_offers_resolution() {
        let unlisted = Station::new(1, "A".to_string(), 53.0, -7.0);
        assert!(unlisted.offers(Resolution::Hourly));

        let daily_only = unlisted.with_resolutions(vec![Resolution::Daily]);
        assert!(daily_only.offers(Resolution::Daily));
        assert!(!daily_only.offers(Resolution::Hourly));
        assert!(!daily_only.offers(Resolution::Monthly));
    }
}
