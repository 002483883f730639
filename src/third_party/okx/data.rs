use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct ApiFundingRateHistoryResponse {
    pub code: Option<String>,
    pub msg: Option<String>,
    pub data: Option<Vec<RawFundingRecord>>,
}

/// A funding-rate-history entry exactly as OKX sends it: numbers arrive as
/// strings.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawFundingRecord {
    pub funding_rate: String,
    pub realized_rate: String,
    pub funding_time: String,
    pub next_funding_time: Option<String>,
}

#[cfg(test)]
impl RawFundingRecord {
    pub fn new(funding_rate: &str, realized_rate: &str, funding_time: i64) -> Self {
        Self {
            funding_rate: funding_rate.to_string(),
            realized_rate: realized_rate.to_string(),
            funding_time: funding_time.to_string(),
            next_funding_time: None,
        }
    }

    pub fn with_next(mut self, next_funding_time: i64) -> Self {
        self.next_funding_time = Some(next_funding_time.to_string());
        self
    }
}
