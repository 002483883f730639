use std::fmt::Display;
use std::str::FromStr;

use chrono::{
    DateTime, Days, NaiveDate, NaiveDateTime, NaiveTime, Offset, TimeDelta, TimeZone,
};
use itertools::Itertools;

use crate::config::{
    DAY_LABEL_FORMAT, DEFAULT_FUNDING_INTERVAL_HOURS, HOUR_MS, TRAILING_WINDOW_DAYS,
};
use crate::data::{AggregatedDayRecord, DateRange, Granularity, NormalizedRecord};
use crate::request::FetchError;
use crate::third_party::okx::data::RawFundingRecord;

/// Server-side bounds in epoch millis. OKX returns records older than
/// `after` and newer than `before`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchWindow {
    pub after: i64,
    pub before: i64,
}

pub fn fetch_window<Tz: TimeZone>(range: DateRange, granularity: Granularity, tz: &Tz) -> FetchWindow {
    let first_day = match granularity {
        Granularity::Daily => range.from,
        Granularity::TrailingWeek => range
            .from
            .checked_sub_days(Days::new(TRAILING_WINDOW_DAYS as u64))
            .unwrap_or(range.from),
    };

    FetchWindow {
        after: end_of_day_millis(range.to, tz),
        before: start_of_day_millis(first_day, tz),
    }
}

pub fn start_of_day_millis<Tz: TimeZone>(date: NaiveDate, tz: &Tz) -> i64 {
    local_millis(date.and_time(NaiveTime::MIN), tz)
}

/// 23:59:59.999 on `date`.
pub fn end_of_day_millis<Tz: TimeZone>(date: NaiveDate, tz: &Tz) -> i64 {
    let end = date.and_time(NaiveTime::MIN) + TimeDelta::days(1) - TimeDelta::milliseconds(1);
    local_millis(end, tz)
}

fn local_millis<Tz: TimeZone>(naive: NaiveDateTime, tz: &Tz) -> i64 {
    if let Some(dt) = tz.from_local_datetime(&naive).earliest() {
        return dt.timestamp_millis();
    }
    // `naive` was skipped by a DST jump. Read with the offset in force before
    // the jump it lands on the transition, the first local instant after it.
    let before = tz
        .offset_from_utc_datetime(&(naive - TimeDelta::days(1)))
        .fix();
    (naive - TimeDelta::seconds(before.local_minus_utc().into()))
        .and_utc()
        .timestamp_millis()
}

pub fn day_label<Tz>(millis: i64, tz: &Tz) -> Option<String>
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    let utc = DateTime::from_timestamp_millis(millis)?;
    Some(utc.with_timezone(tz).format(DAY_LABEL_FORMAT).to_string())
}

fn parse_field<T: FromStr>(field: &'static str, value: &str) -> Result<T, FetchError> {
    value.trim().parse().map_err(|_| FetchError::InvalidField {
        field,
        value: value.to_string(),
    })
}

/// Parses one raw entry. A missing (or empty) `nextFundingTime` means the
/// default eight hour interval.
pub fn normalize<Tz>(raw: &RawFundingRecord, tz: &Tz) -> Result<NormalizedRecord, FetchError>
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    let funding_time: i64 = parse_field("fundingTime", &raw.funding_time)?;
    let next_funding_time: i64 = match raw.next_funding_time.as_deref() {
        Some(next) if !next.trim().is_empty() => parse_field("nextFundingTime", next)?,
        _ => funding_time + DEFAULT_FUNDING_INTERVAL_HOURS * HOUR_MS,
    };
    let interval_hours = ((next_funding_time - funding_time) as f64 / HOUR_MS as f64).round();

    Ok(NormalizedRecord {
        calendar_day: day_label(funding_time, tz).ok_or_else(|| FetchError::InvalidField {
            field: "fundingTime",
            value: raw.funding_time.clone(),
        })?,
        funding_rate: parse_field("fundingRate", &raw.funding_rate)?,
        realized_rate: parse_field("realizedRate", &raw.realized_rate)?,
        interval_hours: interval_hours as i64,
        funding_time_millis: funding_time,
    })
}

/// Means of one calendar day. `day` is never empty.
fn day_mean(day: &[&NormalizedRecord]) -> AggregatedDayRecord {
    let first = day[0];
    let n = day.len() as f64;
    let interval_sum: i64 = day.iter().map(|r| r.interval_hours).sum();

    AggregatedDayRecord {
        calendar_day: first.calendar_day.clone(),
        funding_rate: day.iter().map(|r| r.funding_rate).sum::<f64>() / n,
        realized_rate: day.iter().map(|r| r.realized_rate).sum::<f64>() / n,
        interval_hours: (interval_sum as f64 / n).round() as i64,
        funding_time_millis: first.funding_time_millis,
    }
}

/// Replaces each day's rates with the sum over itself and up to `window - 1`
/// preceding entries. Interval hours are kept as the day's own mean.
pub fn trailing_sum(daily: &[AggregatedDayRecord], window: usize) -> Vec<AggregatedDayRecord> {
    daily
        .iter()
        .enumerate()
        .map(|(i, day)| {
            let span = &daily[(i + 1).saturating_sub(window)..=i];
            AggregatedDayRecord {
                funding_rate: span.iter().map(|d| d.funding_rate).sum(),
                realized_rate: span.iter().map(|d| d.realized_rate).sum(),
                ..day.clone()
            }
        })
        .collect()
}

/// Turns a raw history page into one record per calendar day.
pub fn aggregate<Tz>(
    raw: &[RawFundingRecord],
    range: DateRange,
    granularity: Granularity,
    tz: &Tz,
) -> Result<Vec<AggregatedDayRecord>, FetchError>
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    let cutoff = start_of_day_millis(range.from, tz);

    let mut records = raw
        .iter()
        .map(|r| normalize(r, tz))
        .collect::<Result<Vec<_>, _>>()?;
    records.retain(|r| r.funding_time_millis >= cutoff);
    records.sort_by_key(|r| r.funding_time_millis);

    // Sorted by time, so each day's records are contiguous.
    let mut daily = Vec::new();
    for (_, day) in &records.iter().chunk_by(|r| r.calendar_day.as_str()) {
        daily.push(day_mean(&day.collect_vec()));
    }

    Ok(match granularity {
        Granularity::Daily => daily,
        Granularity::TrailingWeek => trailing_sum(&daily, TRAILING_WINDOW_DAYS),
    })
}
