pub mod collector;
pub mod data_merger;
pub mod run_report;

pub use collector::Collector;
pub use data_merger::{DataMerger, MergeSummary, RetentionPolicy, RetentionWarning};
pub use run_report::{ResolutionReport, RunReport, StationOutcome, StationResult};
