/// Met Éireann endpoints
pub const STATION_DATA_URL: &str = "https://cli.fusio.net/cli/climate_data/stations.csv";
pub const ARCHIVE_BASE_URL: &str = "https://cli.fusio.net/cli/climate_data/webdata/";

/// File names
pub const STATIONS_SNAPSHOT_FILE: &str = "stations.csv";

/// Directory names
pub const DEFAULT_DATA_DIR: &str = "data";

/// Rolling log, rotated daily; two weeks of files are kept
pub const LOG_FILE_PATH: &str = "logs/irish_weather.log";
pub const LOG_FILES_KEPT: usize = 14;

/// Retention defaults (`-1` disables the row cap)
pub const DEFAULT_MAX_ROWS: i64 = -1;
pub const DEFAULT_MIN_DATE: &str = "1990-01-01";

/// Network defaults
pub const DEFAULT_SLEEP_DELAY_SECS: f64 = 5.0;
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 60;
pub const DEFAULT_USER_AGENT: &str = concat!("irish-weather/", env!("CARGO_PKG_VERSION"));

/// Environment variable prefix for configuration overrides
pub const ENV_PREFIX: &str = "IRISH_WEATHER";

/// Cell contents treated as a missing measurement
pub const MISSING_VALUE_TOKENS: &[&str] = &["", "-", "NA", "N/A", "(null)"];

/// Consolidated dataset key columns
pub const STATION_ID_COLUMN: &str = "station_id";
pub const TIME_COLUMN: &str = "time";
