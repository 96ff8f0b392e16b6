use core_types::{ChangePoint, EnrichedPricePoint, RegimeKind, Regime};
use serde::Serialize;

/// Label used for a change point that upstream did not tie to an event.
pub const UNNAMED_CHANGE_POINT: &str = "Detected Change Point";

/// Keeps only regimes with finite, strictly increasing bounds, in input order.
pub fn filter_valid_regimes(regimes: &[Regime]) -> Vec<Regime> {
    let valid: Vec<Regime> = regimes.iter().copied().filter(Regime::is_valid).collect();
    if valid.len() < regimes.len() {
        tracing::warn!(dropped = regimes.len() - valid.len(), "Dropped malformed regimes.");
    }
    valid
}

/// The regime a change point switches into.
pub fn regime_kind(cp: &ChangePoint) -> RegimeKind {
    if cp.vol_after > cp.vol_before {
        RegimeKind::High
    } else {
        RegimeKind::Low
    }
}

/// Splits the timeline into regimes bounded by consecutive change points.
///
/// Each regime starts at a change point and ends at the next one; the last ends at
/// `series_end`. Intervals that come out empty or inverted are dropped.
pub fn regimes_from_change_points(change_points: &[ChangePoint], series_end: i64) -> Vec<Regime> {
    let mut starts: Vec<(i64, RegimeKind)> = change_points.iter().map(|cp| (cp.timestamp(), regime_kind(cp))).collect();
    starts.sort_by_key(|(ts, _)| *ts);

    let regimes: Vec<Regime> = starts
        .iter()
        .enumerate()
        .map(|(i, &(start, kind))| {
            let end = starts.get(i + 1).map_or(series_end, |(next, _)| *next);
            Regime::new(start as f64, end as f64, kind)
        })
        .collect();

    filter_valid_regimes(&regimes)
}

pub fn label_transition(cp: &ChangePoint) -> &str {
    cp.associated_event
        .as_deref()
        .filter(|name| !name.trim().is_empty())
        .unwrap_or(UNNAMED_CHANGE_POINT)
}

/// A vertical reference line for a change point, with its before/after shift.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChangePointMarker {
    pub timestamp: i64,
    pub label: String,
    pub category: Option<String>,
    pub mean_shift: f64,
    pub vol_shift: f64,
    pub direction: RegimeKind,
}

/// Builds markers for the change points that fall within the span of `series`.
pub fn change_point_markers(series: &[EnrichedPricePoint], change_points: &[ChangePoint]) -> Vec<ChangePointMarker> {
    let (Some(first), Some(last)) = (series.first(), series.last()) else {
        return Vec::new();
    };

    let mut markers: Vec<ChangePointMarker> = change_points
        .iter()
        .filter(|cp| cp.date >= first.date && cp.date <= last.date)
        .map(|cp| ChangePointMarker {
            timestamp: cp.timestamp(),
            label: label_transition(cp).to_string(),
            category: cp.event_category.clone(),
            mean_shift: cp.mean_after - cp.mean_before,
            vol_shift: cp.vol_after - cp.vol_before,
            direction: regime_kind(cp),
        })
        .collect();
    markers.sort_by_key(|m| m.timestamp);
    markers
}
