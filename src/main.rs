use anyhow::Context;
use clap::Parser;
use irish_weather::cli::{run, Cli};
use irish_weather::logging::init_logging;

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose, cli.log_file.as_deref()).context("setting up logging")?;

    run(cli).context("weather collection failed")?;
    Ok(())
}
