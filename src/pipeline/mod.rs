mod aggregate;

use std::fmt::Display;

use chrono::TimeZone;
use log::{debug, info, warn};

pub use aggregate::{FetchWindow, aggregate, fetch_window};

use crate::config::FETCH_ERROR_MESSAGE;
use crate::data::{AggregatedDayRecord, Exchange, FetchKey};
use crate::request::{FetchError, OkxClient};

pub type Generation = u64;

#[derive(Debug, Clone, PartialEq, Default)]
pub enum PipelineState {
    #[default]
    Idle,
    Loading,
    Success,
    /// Carries the user-facing message only; the detail goes to the log.
    Error(String),
}

#[derive(Debug, Clone)]
pub struct FetchRequest {
    pub generation: Generation,
    pub key: FetchKey,
}

#[derive(Debug)]
pub struct FetchOutcome {
    pub generation: Generation,
    pub result: Result<Vec<AggregatedDayRecord>, FetchError>,
}

/// Tracks which fetch is current. Every request gets a fresh generation and
/// only the outcome carrying the latest one is accepted.
#[derive(Debug, Default)]
pub struct Pipeline {
    state: PipelineState,
    generation: Generation,
    last_key: Option<FetchKey>,
}

impl Pipeline {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &PipelineState {
        &self.state
    }

    /// The key of the last request issued.
    pub fn current_key(&self) -> Option<&FetchKey> {
        self.last_key.as_ref()
    }

    /// Whether `key` differs from the key of the last request issued.
    pub fn needs_fetch(&self, key: &FetchKey) -> bool {
        self.last_key.as_ref() != Some(key)
    }

    pub fn begin(&mut self, key: FetchKey) -> FetchRequest {
        self.generation += 1;
        self.state = PipelineState::Loading;
        self.last_key = Some(key.clone());
        FetchRequest {
            generation: self.generation,
            key,
        }
    }

    /// Applies an outcome. Returns the series to store, or `None` when the
    /// outcome is stale or failed.
    pub fn complete(&mut self, outcome: FetchOutcome) -> Option<Vec<AggregatedDayRecord>> {
        if outcome.generation != self.generation {
            debug!(
                "Discarding stale fetch outcome {} (current {})",
                outcome.generation, self.generation
            );
            return None;
        }

        match outcome.result {
            Ok(series) => {
                self.state = PipelineState::Success;
                Some(series)
            }
            Err(e) => {
                warn!("Fetch {} failed: {}", outcome.generation, e);
                self.state = PipelineState::Error(FETCH_ERROR_MESSAGE.to_string());
                None
            }
        }
    }
}

/// Fetches and aggregates the funding-rate history selected by `key`.
pub async fn fetch_aggregated<Tz>(
    client: &OkxClient,
    key: &FetchKey,
    tz: &Tz,
) -> Result<Vec<AggregatedDayRecord>, FetchError>
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    if key.exchange != Exchange::Okx {
        return Err(FetchError::UnsupportedExchange(key.exchange));
    }

    let window = fetch_window(key.date_range, key.granularity, tz);
    info!(
        "Fetching {} funding history, after={} before={}",
        key.instrument_id, window.after, window.before
    );

    let raw = client.funding_rate_history(&key.instrument_id, window).await?;
    let series = aggregate(&raw, key.date_range, key.granularity, tz)?;
    info!(
        "{}: {} records aggregated into {} days",
        key.instrument_id,
        raw.len(),
        series.len()
    );
    Ok(series)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Credentials;
    use crate::data::QueryParams;
    use chrono::Utc;

    fn day(rate: f64) -> AggregatedDayRecord {
        AggregatedDayRecord {
            calendar_day: "01/11/2024".to_string(),
            funding_rate: rate,
            realized_rate: rate,
            interval_hours: 8,
            funding_time_millis: 1730419200000,
        }
    }

    #[test]
    fn test_begin_enters_loading_and_bumps_generation() {
        let mut pipeline = Pipeline::new();
        assert_eq!(pipeline.state(), &PipelineState::Idle);

        let key = QueryParams::default().fetch_key();
        assert!(pipeline.needs_fetch(&key));

        let request = pipeline.begin(key.clone());
        assert_eq!(request.generation, 1);
        assert_eq!(pipeline.current_key(), Some(&key));
        assert_eq!(pipeline.state(), &PipelineState::Loading);
        assert!(!pipeline.needs_fetch(&key));
    }

    #[test]
    fn test_stale_outcome_is_discarded() {
        let mut pipeline = Pipeline::new();
        let key = QueryParams::default().fetch_key();
        let first = pipeline.begin(key.clone());
        let second = pipeline.begin(key);

        let stale = pipeline.complete(FetchOutcome {
            generation: first.generation,
            result: Ok(vec![day(0.5)]),
        });
        assert_eq!(stale, None);
        assert_eq!(pipeline.state(), &PipelineState::Loading);

        let fresh = pipeline.complete(FetchOutcome {
            generation: second.generation,
            result: Ok(vec![day(0.1)]),
        });
        assert_eq!(fresh, Some(vec![day(0.1)]));
        assert_eq!(pipeline.state(), &PipelineState::Success);
    }

    #[test]
    fn test_error_collapses_to_generic_message() {
        let mut pipeline = Pipeline::new();
        let request = pipeline.begin(QueryParams::default().fetch_key());

        let stored = pipeline.complete(FetchOutcome {
            generation: request.generation,
            result: Err(FetchError::MissingData),
        });

        assert_eq!(stored, None);
        assert_eq!(
            pipeline.state(),
            &PipelineState::Error(FETCH_ERROR_MESSAGE.to_string())
        );
    }

    #[test]
    fn test_empty_series_is_success() {
        let mut pipeline = Pipeline::new();
        let request = pipeline.begin(QueryParams::default().fetch_key());

        let stored = pipeline.complete(FetchOutcome {
            generation: request.generation,
            result: Ok(vec![]),
        });

        assert_eq!(stored, Some(vec![]));
        assert_eq!(pipeline.state(), &PipelineState::Success);
    }

    #[tokio::test]
    async fn test_binance_is_unsupported() {
        let client = OkxClient::new("http://127.0.0.1:9", Credentials::default());
        let mut params = QueryParams::default();
        params.exchange = Exchange::Binance;

        let result = fetch_aggregated(&client, &params.fetch_key(), &Utc).await;

        assert!(matches!(
            result,
            Err(FetchError::UnsupportedExchange(Exchange::Binance))
        ));
    }
}
