//! Pins discrete events onto the trading-day timeline.
//!
//! Two matching policies exist and they are not interchangeable:
//! `anchor_events` only accepts an exact trading-day match, while
//! `place_event_markers` snaps to the nearest trading day so that events on
//! weekends or holidays still get a marker.

use core_types::{date_to_millis, AnchoredEvent, EnrichedPricePoint, MarketEvent, SeriesField};
use serde::Serialize;
use std::collections::HashMap;

/// Anchors each event on the point whose timestamp equals the event date.
///
/// Events without a matching trading day are dropped. The anchored value is read
/// from `field`, the column the chart plots; a missing value anchors at 0.
pub fn anchor_events(series: &[EnrichedPricePoint], events: &[MarketEvent], field: SeriesField) -> Vec<AnchoredEvent> {
    let by_timestamp: HashMap<i64, &EnrichedPricePoint> = series.iter().map(|p| (p.timestamp, p)).collect();

    events
        .iter()
        .filter_map(|event| {
            let timestamp = date_to_millis(event.date);
            match by_timestamp.get(&timestamp) {
                Some(point) => Some(AnchoredEvent {
                    event: event.clone(),
                    timestamp,
                    value: anchored_value(point, field),
                }),
                None => {
                    tracing::debug!(date = %event.date, title = %event.title, "Event has no trading day; not anchored.");
                    None
                }
            }
        })
        .collect()
}

/// Index of the point closest in time to `target`.
///
/// `series` must be sorted ascending by timestamp. When two points are equally
/// close the earlier one wins. Returns `None` only for an empty series.
pub fn nearest_index(series: &[EnrichedPricePoint], target: i64) -> Option<usize> {
    if series.is_empty() {
        return None;
    }
    let idx = series.partition_point(|p| p.timestamp < target);
    if idx == 0 {
        return Some(0);
    }
    if idx == series.len() {
        return Some(idx - 1);
    }
    let before = target.abs_diff(series[idx - 1].timestamp);
    let after = series[idx].timestamp.abs_diff(target);
    Some(if before <= after { idx - 1 } else { idx })
}

pub fn nearest_point(series: &[EnrichedPricePoint], target: i64) -> Option<&EnrichedPricePoint> {
    nearest_index(series, target).map(|i| &series[i])
}

/// A chart marker for an event, snapped to the nearest trading day.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EventMarker {
    pub event: MarketEvent,
    pub index: usize,
    /// Timestamp of the trading day the marker sits on.
    pub timestamp: i64,
    pub value: f64,
    /// Whether the event date itself is a trading day.
    pub exact: bool,
}

/// Places one marker per event that falls inside the series' date span.
pub fn place_event_markers(series: &[EnrichedPricePoint], events: &[MarketEvent], field: SeriesField) -> Vec<EventMarker> {
    let (Some(first), Some(last)) = (series.first(), series.last()) else {
        return Vec::new();
    };

    events
        .iter()
        .filter(|e| e.date >= first.date && e.date <= last.date)
        .filter_map(|event| {
            let target = date_to_millis(event.date);
            let index = nearest_index(series, target)?;
            let point = &series[index];
            Some(EventMarker {
                event: event.clone(),
                index,
                timestamp: point.timestamp,
                value: anchored_value(point, field),
                exact: point.timestamp == target,
            })
        })
        .collect()
}

fn anchored_value(point: &EnrichedPricePoint, field: SeriesField) -> f64 {
    point.value(field).unwrap_or(0.0)
}
