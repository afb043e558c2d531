pub mod constants;
pub mod encoding;
pub mod filename;
pub mod fs;
pub mod progress;

pub use constants::*;
pub use filename::{archive_cache_path, consolidated_path, stations_snapshot_path};
pub use progress::ProgressReporter;
