use crate::models::Resolution;
use chrono::NaiveDate;
use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "irish-weather")]
#[command(about = "Collect Met Éireann station archives into consolidated CSV datasets")]
#[command(version)]
pub struct Cli {
    /// Resolutions to collect
    #[arg(value_enum, required = true, num_args = 1..)]
    pub modes: Vec<Resolution>,

    #[arg(short, long, help = "Config file (TOML, YAML or JSON)")]
    pub config: Option<PathBuf>,

    #[arg(short, long, help = "Directory for datasets, archives and the station snapshot")]
    pub output_dir: Option<PathBuf>,

    #[arg(long, help = "Station directory URL, file:// URL or local path")]
    pub station_url: Option<String>,

    #[arg(long, allow_negative_numbers = true, help = "Row cap per dataset (-1 disables eviction)")]
    pub max_rows: Option<i64>,

    #[arg(long, help = "Rows dated on or after this are never evicted (YYYY-MM-DD)")]
    pub min_date: Option<NaiveDate>,

    #[arg(long, help = "Seconds to wait after every request")]
    pub sleep_delay: Option<f64>,

    #[arg(long, help = "Reuse archives already downloaded")]
    pub no_overwrite: bool,

    #[arg(long, help = "Attempts per archive before giving up")]
    pub max_attempts: Option<u32>,

    #[arg(short, long, help = "Hide progress bars")]
    pub quiet: bool,

    #[arg(short, long, help = "Enable verbose logging")]
    pub verbose: bool,

    #[arg(long, help = "Log file path, rotated daily [default: logs/irish_weather.log]")]
    pub log_file: Option<PathBuf>,
}
