use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};

use crate::data::{
    AggregatedDayRecord, DateRange, Exchange, Granularity, QueryParams, SelectionMode,
};

/// Everything persisted under the store file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct StoredState {
    #[serde(flatten)]
    params: QueryParams,
    /// The instrument `aggregated_data` was fetched for.
    aggregated_instrument: Option<String>,
    aggregated_data: Vec<AggregatedDayRecord>,
}

/// Holds the filter selection and the latest aggregated series. Every
/// mutation is written through to disk before it returns.
#[derive(Debug)]
pub struct FilterStore {
    path: Option<PathBuf>,
    state: StoredState,
}

impl FilterStore {
    /// Loads `path` if it holds a valid state, otherwise starts from
    /// defaults. Fields missing from the file take their default value.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let state = match load_state(&path) {
            Ok(Some(state)) => {
                info!("Loaded filters from {}", path.display());
                state
            }
            Ok(None) => {
                info!("No saved filters at {}, using defaults", path.display());
                StoredState::default()
            }
            Err(e) => {
                warn!("Ignoring saved filters: {e:#}");
                StoredState::default()
            }
        };

        Self {
            path: Some(path),
            state,
        }
    }

    pub fn in_memory() -> Self {
        Self {
            path: None,
            state: StoredState::default(),
        }
    }

    pub fn params(&self) -> &QueryParams {
        &self.state.params
    }

    pub fn aggregated_data(&self) -> &[AggregatedDayRecord] {
        &self.state.aggregated_data
    }

    pub fn aggregated_instrument(&self) -> Option<&str> {
        self.state.aggregated_instrument.as_deref()
    }

    pub fn set_selection_mode(&mut self, mode: SelectionMode) -> Result<()> {
        self.update(|s| s.params.apply_selection_mode(mode))
    }

    pub fn set_exchange(&mut self, exchange: Exchange) -> Result<()> {
        self.update(|s| s.params.exchange = exchange)
    }

    pub fn select_instrument(&mut self, instrument_id: &str) -> Result<()> {
        self.update(|s| s.params.instrument_id = instrument_id.to_string())
    }

    /// Returns whether the instrument is a favorite afterwards.
    pub fn toggle_favorite(&mut self, instrument_id: &str) -> Result<bool> {
        let favorite = self.state.params.toggle_favorite(instrument_id);
        self.persist()?;
        Ok(favorite)
    }

    pub fn set_date_range(&mut self, range: DateRange) -> Result<()> {
        self.update(|s| s.params.date_range = range)
    }

    pub fn set_granularity(&mut self, granularity: Granularity) -> Result<()> {
        self.update(|s| s.params.granularity = granularity)
    }

    pub fn set_aggregated_data(
        &mut self,
        instrument_id: &str,
        series: Vec<AggregatedDayRecord>,
    ) -> Result<()> {
        self.update(|s| {
            s.aggregated_instrument = Some(instrument_id.to_string());
            s.aggregated_data = series;
        })
    }

    fn update(&mut self, mutate: impl FnOnce(&mut StoredState)) -> Result<()> {
        mutate(&mut self.state);
        self.persist()
    }

    fn persist(&self) -> Result<()> {
        let Some(path) = &self.path else {
            return Ok(());
        };

        let json = serde_json::to_string_pretty(&self.state)?;
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, json).with_context(|| format!("failed to write {}", tmp.display()))?;
        fs::rename(&tmp, path)
            .with_context(|| format!("failed to replace {}", path.display()))?;
        debug!("Persisted filters to {}", path.display());
        Ok(())
    }
}

fn load_state(path: &Path) -> Result<Option<StoredState>> {
    let json = match fs::read_to_string(path) {
        Ok(json) => json,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(e).with_context(|| format!("failed to read {}", path.display())),
    };
    let state = serde_json::from_str(&json)
        .with_context(|| format!("malformed filters in {}", path.display()))?;
    Ok(Some(state))
}
