use thiserror::Error;

use crate::data::Exchange;

/// Why a funding-rate fetch produced no series.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("unexpected response body: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("OKX returned code {code}: {msg}")]
    Api { code: String, msg: String },

    #[error("response has no data array")]
    MissingData,

    #[error("invalid {field}: {value:?}")]
    InvalidField { field: &'static str, value: String },

    #[error("request signing failed: {0}")]
    Signing(String),

    #[error("funding history for {0} is not supported")]
    UnsupportedExchange(Exchange),
}
