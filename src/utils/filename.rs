use crate::models::Resolution;
use crate::utils::constants::STATIONS_SNAPSHOT_FILE;
use std::path::{Path, PathBuf};

/// Consolidated dataset path, e.g. `data/daily_all_stations.csv`
pub fn consolidated_path(output_dir: &Path, resolution: Resolution) -> PathBuf {
    output_dir.join(resolution.output_file_name())
}

/// Local archive copy, e.g. `data/daily/dly3904.zip`
pub fn archive_cache_path(output_dir: &Path, resolution: Resolution, station_id: u32) -> PathBuf {
    output_dir
        .join(resolution.name())
        .join(resolution.archive_file_name(station_id))
}

pub fn stations_snapshot_path(output_dir: &Path) -> PathBuf {
    output_dir.join(STATIONS_SNAPSHOT_FILE)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_consolidated_path() {
        let path = consolidated_path(Path::new("data"), Resolution::Hourly);
        assert_eq!(path, PathBuf::from("data/hourly_all_stations.csv"));
    }

    #[test]
    fn test_archive_cache_path() {
        let path = archive_cache_path(Path::new("data"), Resolution::Daily, 3904);
        assert_eq!(path, PathBuf::from("data/daily/dly3904.zip"));
    }

    #[test]
    fn test_stations_snapshot_path() {
        assert_eq!(
            stations_snapshot_path(Path::new("out")),
            PathBuf::from("out/stations.csv")
        );
    }
}
