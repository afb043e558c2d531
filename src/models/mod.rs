pub mod observation;
pub mod resolution;
pub mod station;

pub use observation::{ObservationRow, RowKey};
pub use resolution::Resolution;
pub use station::Station;
