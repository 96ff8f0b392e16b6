//! The seam to the data collaborators and the defensive decoding of what they return.

use crate::error::EngineError;
use async_trait::async_trait;
use chrono::NaiveDate;
use core_types::time::parse_date;
use core_types::{date_to_millis, ChangePoint, DateRange, MarketEvent, PricePoint, Regime, RegimeKind, ReturnMode};
use serde::Serialize;
use serde_json::{Map, Value};
use std::path::PathBuf;

/// Parameters of a price request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct PriceQuery {
    pub range: DateRange,
    pub return_mode: ReturnMode,
}

/// A provider of raw dashboard data for a date window.
///
/// Implementations return the response body as-is; the engine decodes it with
/// the `decode_*` functions, which never fail.
#[async_trait]
pub trait DataSource: Send + Sync {
    async fn fetch_prices(&self, query: &PriceQuery) -> Result<Value, EngineError>;

    async fn fetch_events(&self, range: &DateRange) -> Result<Value, EngineError>;

    async fn fetch_change_points(&self, range: &DateRange) -> Result<Value, EngineError>;
}

/// Decodes a price body. Records without a readable date or with a price that is
/// not a positive finite number are skipped.
pub fn decode_prices(body: Value) -> Vec<PricePoint> {
    decode_records(body, "prices", |record| {
        let date = record_date(record)?;
        let price = number(record.get("price")?)?;
        (price > 0.0).then(|| PricePoint::new(date, price))
    })
}

/// Decodes an event body. `title` may also arrive as `event_name`.
pub fn decode_events(body: Value) -> Vec<MarketEvent> {
    decode_records(body, "events", |record| {
        let date = record_date(record)?;
        let title = text(record, &["title", "event_name"])?;
        Some(MarketEvent {
            date,
            title,
            category: text(record, &["category", "event_category"]).unwrap_or_default(),
            description: text(record, &["description"]),
        })
    })
}

/// Decodes a change-point body, accepting both the short and the `mu_*`/`sigma_*` column names.
pub fn decode_change_points(body: Value) -> Vec<ChangePoint> {
    decode_records(body, "change_points", |record| {
        Some(ChangePoint {
            date: record_date(record)?,
            associated_event: text(record, &["associated_event"]),
            event_category: text(record, &["event_category"]),
            mean_before: first_number(record, &["mean_before", "mu_pre_change"])?,
            mean_after: first_number(record, &["mean_after", "mu_post_change"])?,
            vol_before: first_number(record, &["vol_before", "sigma_pre_change"])?,
            vol_after: first_number(record, &["vol_after", "sigma_post_change"])?,
        })
    })
}

/// Decodes the regime columns (`start_date`, `end_date`, `volatility_regime`) that
/// change-point rows may carry.
///
/// Rows without both bounds carry no regime and are skipped. Unreadable bounds
/// decode as NaN so that the regime is dropped later by `filter_valid_regimes`.
pub fn decode_regimes(body: &Value) -> Vec<Regime> {
    let Value::Array(items) = body else {
        return Vec::new();
    };

    items
        .iter()
        .filter_map(Value::as_object)
        .filter_map(|record| {
            let (start, end) = (record.get("start_date")?, record.get("end_date")?);
            let kind = match record.get("volatility_regime").and_then(Value::as_str) {
                Some(label) if label.trim().eq_ignore_ascii_case("high") => RegimeKind::High,
                _ => RegimeKind::Low,
            };
            Some(Regime::new(regime_bound(start), regime_bound(end), kind))
        })
        .collect()
}

fn regime_bound(value: &Value) -> f64 {
    value
        .as_str()
        .and_then(parse_day)
        .map_or(f64::NAN, |date| date_to_millis(date) as f64)
}

fn decode_records<T, F>(body: Value, kind: &'static str, decode: F) -> Vec<T>
where
    F: Fn(&Map<String, Value>) -> Option<T>,
{
    let Value::Array(items) = body else {
        tracing::warn!(kind, "Response body is not an array; treating it as empty.");
        return Vec::new();
    };

    let total = items.len();
    let decoded: Vec<T> = items
        .iter()
        .filter_map(|item| item.as_object().and_then(&decode))
        .collect();
    if decoded.len() < total {
        tracing::warn!(kind, skipped = total - decoded.len(), "Skipped malformed records.");
    }
    decoded
}

/// Reads `date`, accepting a trailing time component (`2020-01-02T00:00:00`).
fn record_date(record: &Map<String, Value>) -> Option<NaiveDate> {
    parse_day(record.get("date")?.as_str()?)
}

fn parse_day(raw: &str) -> Option<NaiveDate> {
    parse_date(raw.get(..10).unwrap_or(raw)).ok()
}

fn number(value: &Value) -> Option<f64> {
    let n = match value {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => s.trim().parse::<f64>().ok()?,
        _ => return None,
    };
    n.is_finite().then_some(n)
}

fn first_number(record: &Map<String, Value>, keys: &[&str]) -> Option<f64> {
    keys.iter().find_map(|k| record.get(*k)).and_then(number)
}

fn text(record: &Map<String, Value>, keys: &[&str]) -> Option<String> {
    keys.iter()
        .find_map(|k| record.get(*k)?.as_str())
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

/// A `DataSource` backed by JSON files, each holding an array of records.
///
/// Records outside the requested window are filtered out by their `date` field,
/// mirroring what a date-parameterized endpoint returns. Missing optional files
/// produce empty arrays.
#[derive(Debug, Clone)]
pub struct JsonFileSource {
    prices: PathBuf,
    events: Option<PathBuf>,
    change_points: Option<PathBuf>,
}

impl JsonFileSource {
    pub fn new(prices: impl Into<PathBuf>) -> Self {
        Self {
            prices: prices.into(),
            events: None,
            change_points: None,
        }
    }

    pub fn with_events(mut self, path: impl Into<PathBuf>) -> Self {
        self.events = Some(path.into());
        self
    }

    pub fn with_change_points(mut self, path: impl Into<PathBuf>) -> Self {
        self.change_points = Some(path.into());
        self
    }

    async fn read(path: Option<&PathBuf>, range: &DateRange) -> Result<Value, EngineError> {
        let Some(path) = path else {
            return Ok(Value::Array(Vec::new()));
        };
        let contents = tokio::fs::read_to_string(path).await?;
        let body: Value = serde_json::from_str(&contents)?;
        tracing::debug!(path = %path.display(), "Loaded data file.");
        Ok(within_range(body, range))
    }
}

#[async_trait]
impl DataSource for JsonFileSource {
    async fn fetch_prices(&self, query: &PriceQuery) -> Result<Value, EngineError> {
        Self::read(Some(&self.prices), &query.range).await
    }

    async fn fetch_events(&self, range: &DateRange) -> Result<Value, EngineError> {
        Self::read(self.events.as_ref(), range).await
    }

    async fn fetch_change_points(&self, range: &DateRange) -> Result<Value, EngineError> {
        Self::read(self.change_points.as_ref(), range).await
    }
}

/// Keeps the array elements dated inside `range`; anything undated is left for the decoder to judge.
fn within_range(body: Value, range: &DateRange) -> Value {
    match body {
        Value::Array(items) => Value::Array(
            items
                .into_iter()
                .filter(|item| {
                    item.as_object()
                        .and_then(record_date)
                        .is_none_or(|date| range.contains(date))
                })
                .collect(),
        ),
        other => other,
    }
}
