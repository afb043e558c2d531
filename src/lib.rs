pub mod archive;
pub mod cli;
pub mod config;
pub mod error;
pub mod http;
pub mod logging;
pub mod models;
pub mod processors;
pub mod readers;
pub mod utils;
pub mod writers;

pub use config::RunConfig;
pub use error::{CollectorError, Result};
pub use processors::{Collector, RunReport};
