pub mod fetcher;
pub mod rate_limiter;
pub mod reader;

pub use fetcher::{ArchiveFetcher, FetchOutcome};
pub use rate_limiter::{FixedInterval, NoDelay, RateLimiter};
pub use reader::ArchiveReader;
