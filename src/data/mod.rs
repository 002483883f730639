mod funding;
mod query;

pub use funding::{AggregatedDayRecord, NormalizedRecord};
pub use query::{DateRange, Exchange, FetchKey, Granularity, QueryParams, SelectionMode};
