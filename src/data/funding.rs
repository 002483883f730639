use serde::{Deserialize, Serialize};

/// One funding settlement after parsing, labelled with its calendar day.
#[derive(Clone, Debug, PartialEq)]
pub struct NormalizedRecord {
    pub calendar_day: String,
    pub funding_rate: f64,
    pub realized_rate: f64,
    pub interval_hours: i64,
    pub funding_time_millis: i64,
}

/// One bar of the chart. Persisted in the filter store.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AggregatedDayRecord {
    pub calendar_day: String,
    pub funding_rate: f64,
    pub realized_rate: f64,
    pub interval_hours: i64,
    pub funding_time_millis: i64,
}
