mod assemble;
mod collapse;
mod record;
mod table;

pub use assemble::{assemble, key_by_unit, left_join, pivot_mean};
pub use collapse::{CollapsedMetrics, CollapsedRow};
pub use record::{MetricRecord, MetricSeries};
pub use table::TextTable;
