use crate::cli::args::Cli;
use crate::config::RunConfig;
use crate::error::Result;
use crate::processors::{Collector, RunReport};
use tracing::info;

/// Fold CLI flags over the layered configuration.
pub fn build_config(cli: &Cli) -> Result<RunConfig> {
    let mut config = RunConfig::load(cli.config.as_deref())?.with_resolutions(cli.modes.clone());

    if let Some(ref output_dir) = cli.output_dir {
        config.output_dir = output_dir.clone();
    }
    if let Some(ref station_url) = cli.station_url {
        config.station_url = station_url.clone();
    }
    if let Some(max_rows) = cli.max_rows {
        config.max_rows = max_rows;
    }
    if let Some(min_date) = cli.min_date {
        config.min_date = min_date;
    }
    if let Some(sleep_delay) = cli.sleep_delay {
        config.sleep_delay_secs = sleep_delay;
    }
    if let Some(max_attempts) = cli.max_attempts {
        config.max_attempts = max_attempts;
    }
    if cli.no_overwrite {
        config.overwrite_files = false;
    }
    if cli.quiet {
        config.show_progress = false;
    }

    config.validated()
}

pub fn run(cli: Cli) -> Result<RunReport> {
    let config = build_config(&cli)?;

    info!(
        "Collecting {} into {}",
        config
            .resolutions
            .iter()
            .map(|r| r.name())
            .collect::<Vec<_>>()
            .join(", "),
        config.output_dir.display()
    );

    let collector = Collector::new(config)?;
    let report = collector.run()?;

    println!("\n{}", report.generate_summary());
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Resolution;
    use chrono::NaiveDate;
    use clap::Parser;
    use std::path::PathBuf;

    #[test]
    fn test_cli_overrides_defaults() -> Result<()> {
        let cli = Cli::try_parse_from([
            "irish-weather",
            "hourly",
            "--output-dir",
            "/tmp/met",
            "--max-rows",
            "1000",
            "--min-date",
            "2015-01-01",
            "--sleep-delay",
            "0.5",
            "--no-overwrite",
        ])
        .unwrap();

        let config = build_config(&cli)?;
        assert_eq!(config.resolutions, vec![Resolution::Hourly]);
        assert_eq!(config.output_dir, PathBuf::from("/tmp/met"));
        assert_eq!(config.row_cap(), Some(1000));
        assert_eq!(config.min_date, NaiveDate::from_ymd_opt(2015, 1, 1).unwrap());
        assert_eq!(config.sleep_delay_secs, 0.5);
        assert!(!config.overwrite_files);
        assert!(config.show_progress);
        Ok(())
    }

    #[test]
    fn test_invalid_override_rejected() {
        let cli = Cli::try_parse_from(["irish-weather", "daily", "--max-rows", "-5"]).unwrap();
        assert!(build_config(&cli).is_err());
    }
}
