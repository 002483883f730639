use std::fmt;

use chrono::{Days, Local, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::config::{DEFAULT_INSTRUMENT, DEFAULT_RANGE_FROM, TRACKED_INSTRUMENTS};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Exchange {
    #[default]
    #[serde(rename = "OKX")]
    Okx,
    Binance,
}

impl Exchange {
    pub fn label(&self) -> &'static str {
        match self {
            Exchange::Okx => "OKX",
            Exchange::Binance => "Binance",
        }
    }

    pub fn next(self) -> Self {
        match self {
            Exchange::Okx => Exchange::Binance,
            Exchange::Binance => Exchange::Okx,
        }
    }
}

impl fmt::Display for Exchange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// How aggregated days are reported: the day's own mean, or a trailing
/// sum over the last seven aggregated days.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Granularity {
    #[default]
    #[serde(rename = "1D")]
    Daily,
    #[serde(rename = "7D")]
    TrailingWeek,
}

impl Granularity {
    pub fn label(&self) -> &'static str {
        match self {
            Granularity::Daily => "1D",
            Granularity::TrailingWeek => "7D",
        }
    }

    pub fn next(self) -> Self {
        match self {
            Granularity::Daily => Granularity::TrailingWeek,
            Granularity::TrailingWeek => Granularity::Daily,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SelectionMode {
    #[default]
    Full,
    Favorites,
}

impl SelectionMode {
    pub fn label(&self) -> &'static str {
        match self {
            SelectionMode::Full => "Full",
            SelectionMode::Favorites => "Favorites",
        }
    }

    pub fn next(self) -> Self {
        match self {
            SelectionMode::Full => SelectionMode::Favorites,
            SelectionMode::Favorites => SelectionMode::Full,
        }
    }
}

/// Inclusive calendar-day window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub from: NaiveDate,
    pub to: NaiveDate,
}

impl Default for DateRange {
    fn default() -> Self {
        let (y, m, d) = DEFAULT_RANGE_FROM;
        let today = Local::now().date_naive();
        let from = NaiveDate::from_ymd_opt(y, m, d).unwrap_or(today);
        Self { from, to: today }
    }
}

impl DateRange {
    pub fn new(from: NaiveDate, to: NaiveDate) -> Self {
        Self { from, to }
    }

    /// Parses `YYYY-MM-DD YYYY-MM-DD`. Returns `None` for malformed input or
    /// a start after the end.
    pub fn parse(input: &str) -> Option<Self> {
        let mut parts = input.split_whitespace();
        let from = NaiveDate::parse_from_str(parts.next()?, "%Y-%m-%d").ok()?;
        let to = NaiveDate::parse_from_str(parts.next()?, "%Y-%m-%d").ok()?;
        if parts.next().is_some() || from > to {
            return None;
        }
        Some(Self { from, to })
    }

    /// Moves the start by `days`, never past the end.
    pub fn shift_from(self, days: i64) -> Self {
        let from = shift(self.from, days).min(self.to);
        Self { from, ..self }
    }

    /// Moves the end by `days`, never before the start.
    pub fn shift_to(self, days: i64) -> Self {
        let to = shift(self.to, days).max(self.from);
        Self { to, ..self }
    }
}

fn shift(date: NaiveDate, days: i64) -> NaiveDate {
    let step = Days::new(days.unsigned_abs());
    let moved = if days < 0 {
        date.checked_sub_days(step)
    } else {
        date.checked_add_days(step)
    };
    moved.unwrap_or(date)
}

/// The user's current filter selection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct QueryParams {
    pub selection_mode: SelectionMode,
    pub exchange: Exchange,
    pub date_range: DateRange,
    pub granularity: Granularity,
    pub instrument_id: String,
    pub favorite_instruments: Vec<String>,
}

impl Default for QueryParams {
    fn default() -> Self {
        Self {
            selection_mode: SelectionMode::default(),
            exchange: Exchange::default(),
            date_range: DateRange::default(),
            granularity: Granularity::default(),
            instrument_id: DEFAULT_INSTRUMENT.to_string(),
            favorite_instruments: vec![DEFAULT_INSTRUMENT.to_string()],
        }
    }
}

impl QueryParams {
    /// The fields the aggregation pipeline depends on.
    pub fn fetch_key(&self) -> FetchKey {
        FetchKey {
            exchange: self.exchange,
            instrument_id: self.instrument_id.clone(),
            date_range: self.date_range,
            granularity: self.granularity,
        }
    }

    pub fn is_favorite(&self, instrument_id: &str) -> bool {
        self.favorite_instruments.iter().any(|f| f == instrument_id)
    }

    /// Switching to `Full` resets the selection to the default instrument;
    /// switching to `Favorites` selects the first favorite when one exists.
    pub fn apply_selection_mode(&mut self, mode: SelectionMode) {
        self.selection_mode = mode;
        match mode {
            SelectionMode::Full => self.instrument_id = DEFAULT_INSTRUMENT.to_string(),
            SelectionMode::Favorites => {
                if let Some(first) = self.favorite_instruments.first() {
                    self.instrument_id = first.clone();
                }
            }
        }
    }

    /// Adds or removes `instrument_id` from the favorites. Returns whether it
    /// is a favorite afterwards. The selected instrument is left alone.
    pub fn toggle_favorite(&mut self, instrument_id: &str) -> bool {
        match self
            .favorite_instruments
            .iter()
            .position(|f| f == instrument_id)
        {
            Some(pos) => {
                self.favorite_instruments.remove(pos);
                false
            }
            None => {
                self.favorite_instruments.push(instrument_id.to_string());
                true
            }
        }
    }

    /// Tiles shown for the current selection mode, in tracked order.
    pub fn visible_instruments(&self) -> Vec<&'static str> {
        TRACKED_INSTRUMENTS
            .into_iter()
            .filter(|id| match self.selection_mode {
                SelectionMode::Full => true,
                SelectionMode::Favorites => self.is_favorite(id),
            })
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchKey {
    pub exchange: Exchange,
    pub instrument_id: String,
    pub date_range: DateRange,
    pub granularity: Granularity,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_full_mode_resets_to_default_instrument() {
        let mut params = QueryParams {
            instrument_id: "SOL-USDT-SWAP".to_string(),
            selection_mode: SelectionMode::Favorites,
            ..QueryParams::default()
        };

        params.apply_selection_mode(SelectionMode::Full);

        assert_eq!(params.selection_mode, SelectionMode::Full);
        assert_eq!(params.instrument_id, "BTC-USDT-SWAP");
    }

    #[test]
    fn test_favorites_mode_selects_first_favorite() {
        let mut params = QueryParams {
            favorite_instruments: vec!["ETH-USDT-SWAP".to_string(), "LTC-USDT-SWAP".to_string()],
            ..QueryParams::default()
        };

        params.apply_selection_mode(SelectionMode::Favorites);

        assert_eq!(params.instrument_id, "ETH-USDT-SWAP");
    }

    #[test]
    fn test_favorites_mode_without_favorites_keeps_selection() {
        let mut params = QueryParams {
            instrument_id: "SOL-USDT-SWAP".to_string(),
            favorite_instruments: vec![],
            ..QueryParams::default()
        };

        params.apply_selection_mode(SelectionMode::Favorites);

        assert_eq!(params.selection_mode, SelectionMode::Favorites);
        assert_eq!(params.instrument_id, "SOL-USDT-SWAP");
    }

    #[test]
    fn test_toggle_favorite_leaves_selection_alone() {
        let mut params = QueryParams::default();

        assert!(params.toggle_favorite("ETH-USDT-SWAP"));
        assert_eq!(params.instrument_id, "BTC-USDT-SWAP");
        assert!(params.is_favorite("ETH-USDT-SWAP"));

        assert!(!params.toggle_favorite("BTC-USDT-SWAP"));
        assert_eq!(params.instrument_id, "BTC-USDT-SWAP");
        assert_eq!(params.favorite_instruments, vec!["ETH-USDT-SWAP".to_string()]);
    }

    #[test]
    fn test_visible_instruments_follow_mode() {
        let mut params = QueryParams {
            favorite_instruments: vec!["LTC-USDT-SWAP".to_string(), "ETH-USDT-SWAP".to_string()],
            ..QueryParams::default()
        };
        assert_eq!(params.visible_instruments().len(), 4);

        params.selection_mode = SelectionMode::Favorites;
        assert_eq!(
            params.visible_instruments(),
            vec!["ETH-USDT-SWAP", "LTC-USDT-SWAP"]
        );
    }

    #[test]
    fn test_fetch_key_ignores_favorites() {
        let mut params = QueryParams::default();
        let before = params.fetch_key();
        params.toggle_favorite("SOL-USDT-SWAP");
        params.selection_mode = SelectionMode::Favorites;
        assert_eq!(params.fetch_key(), before);

        params.granularity = Granularity::TrailingWeek;
        assert_ne!(params.fetch_key(), before);
    }

    #[test]
    fn test_date_range_parse() {
        assert_eq!(
            DateRange::parse("2024-11-01 2024-11-03"),
            Some(DateRange::new(date(2024, 11, 1), date(2024, 11, 3)))
        );
        assert_eq!(DateRange::parse("2024-11-03 2024-11-01"), None);
        assert_eq!(DateRange::parse("2024-11-01"), None);
        assert_eq!(DateRange::parse("01/11/2024 03/11/2024"), None);
    }

    #[test]
    fn test_date_range_shift_is_clamped() {
        let range = DateRange::new(date(2024, 11, 1), date(2024, 11, 3));

        assert_eq!(range.shift_from(-1).from, date(2024, 10, 31));
        assert_eq!(range.shift_from(5).from, date(2024, 11, 3));
        assert_eq!(range.shift_to(1).to, date(2024, 11, 4));
        assert_eq!(range.shift_to(-5).to, date(2024, 11, 1));
    }

    #[test]
    fn test_serde_labels() {
        assert_eq!(serde_json::to_string(&Exchange::Okx).unwrap(), "\"OKX\"");
        assert_eq!(
            serde_json::to_string(&Granularity::TrailingWeek).unwrap(),
            "\"7D\""
        );
        let params: QueryParams =
            serde_json::from_str(r#"{"instrumentId":"ETH-USDT-SWAP","granularity":"7D"}"#)
                .unwrap();
        assert_eq!(params.instrument_id, "ETH-USDT-SWAP");
        assert_eq!(params.granularity, Granularity::TrailingWeek);
        assert_eq!(params.exchange, Exchange::Okx);
    }
}
