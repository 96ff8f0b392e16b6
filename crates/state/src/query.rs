//! The shareable query-string form of a `FilterState`.
//!
//! Keys: `start`, `end` (ISO dates), `metric`, `mode`, `scale`. Decoding never
//! fails; absent or unreadable keys fall back to the supplied defaults.

use crate::error::StateError;
use core_types::time::{format_date, parse_date};
use core_types::{DateRange, FilterState, Metric, ReturnMode, Scale};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

#[derive(Debug, Default, Serialize, Deserialize)]
struct FilterQuery {
    #[serde(skip_serializing_if = "Option::is_none")]
    start: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    end: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    metric: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    mode: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    scale: Option<String>,
}

/// Encodes every field of `state`, e.g. `start=2021-09-30&end=2022-09-30&metric=price&mode=price&scale=linear`.
pub fn encode(state: &FilterState) -> Result<String, StateError> {
    let query = FilterQuery {
        start: Some(format_date(state.start_date)),
        end: Some(format_date(state.end_date)),
        metric: Some(state.metric.as_str().to_string()),
        mode: Some(state.return_mode.as_str().to_string()),
        scale: Some(state.scale.as_str().to_string()),
    };
    serde_qs::to_string(&query).map_err(|e| StateError::QueryEncoding(e.to_string()))
}

/// Decodes a query string (a leading `?` is accepted) over `defaults`.
///
/// An inverted date window is replaced by the `lookback_days` window ending at `end`.
pub fn decode(query: &str, defaults: FilterState, lookback_days: u64) -> FilterState {
    let query = query.trim().trim_start_matches('?');
    let parsed: FilterQuery = serde_qs::from_str(query).unwrap_or_else(|e| {
        tracing::warn!(error = %e, "Unreadable filter query; using defaults.");
        FilterQuery::default()
    });

    let range = DateRange::new(
        field(parsed.start.as_deref(), defaults.start_date, parse_date),
        field(parsed.end.as_deref(), defaults.end_date, parse_date),
    )
    .normalized(lookback_days);

    FilterState {
        start_date: range.start,
        end_date: range.end,
        metric: field(parsed.metric.as_deref(), defaults.metric, Metric::from_str),
        return_mode: field(parsed.mode.as_deref(), defaults.return_mode, ReturnMode::from_str),
        scale: field(parsed.scale.as_deref(), defaults.scale, Scale::from_str),
    }
}

fn field<T, E, F>(raw: Option<&str>, fallback: T, parse: F) -> T
where
    E: std::fmt::Display,
    F: Fn(&str) -> Result<T, E>,
{
    match raw.filter(|s| !s.is_empty()) {
        None => fallback,
        Some(raw) => parse(raw).unwrap_or_else(|e| {
            tracing::debug!(value = raw, error = %e, "Ignoring invalid filter query value.");
            fallback
        }),
    }
}
