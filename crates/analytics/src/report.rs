use crate::regime::label_transition;
use chrono::NaiveDate;
use core_types::{AnchoredEvent, ChangePoint, EnrichedPricePoint, Regime, RegimeKind};
use serde::{Deserialize, Serialize};

/// Headline figures for the most recent trading day of a view.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketSummary {
    pub date: NaiveDate,
    /// Price change from the previous trading day.
    pub price_shift: f64,
    /// Rolling-volatility change from the previous trading day; a missing side counts as 0.
    pub volatility_change: f64,
    pub regime_count: usize,
    /// "High Volatility Regime" when the last regime is high, else "Stable Regime".
    pub latest_regime: String,
}

impl MarketSummary {
    /// Returns `None` when the series has fewer than two points.
    pub fn from_series(series: &[EnrichedPricePoint], regimes: &[Regime]) -> Option<Self> {
        let [.., prev, latest] = series else {
            return None;
        };

        let latest_regime = match regimes.last().map(|r| r.kind) {
            Some(RegimeKind::High) => "High Volatility Regime",
            _ => "Stable Regime",
        };

        Some(Self {
            date: latest.date,
            price_shift: latest.price - prev.price,
            volatility_change: latest.rolling_volatility.unwrap_or(0.0) - prev.rolling_volatility.unwrap_or(0.0),
            regime_count: regimes.len(),
            latest_regime: latest_regime.to_string(),
        })
    }
}

/// Return and volatility shift at the most recent change point.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImpactSummary {
    pub event: String,
    pub date: NaiveDate,
    pub mean_shift: f64,
    pub volatility_change: f64,
}

impl ImpactSummary {
    /// Summarizes the latest change point by date; `None` when there are none.
    pub fn from_latest(change_points: &[ChangePoint]) -> Option<Self> {
        let latest = change_points.iter().max_by_key(|cp| cp.date)?;
        Some(Self {
            event: label_transition(latest).to_string(),
            date: latest.date,
            mean_shift: round4(latest.mean_after - latest.mean_before),
            volatility_change: round4(latest.vol_after - latest.vol_before),
        })
    }
}

/// How the market moved in the trading days following an event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventImpact {
    pub title: String,
    pub date: NaiveDate,
    pub horizon_days: usize,
    pub price_change_pct: f64,
    /// `None` when either end of the horizon has no volatility yet.
    pub volatility_shift: Option<f64>,
}

/// Measures the price and volatility move from an anchored event to `horizon`
/// trading days later.
///
/// Returns `None` when the event is not on the series, the horizon runs past the
/// last point, or `horizon` is zero.
pub fn event_impact(series: &[EnrichedPricePoint], event: &AnchoredEvent, horizon: usize) -> Option<EventImpact> {
    if horizon == 0 {
        return None;
    }
    let start = series.binary_search_by_key(&event.timestamp, |p| p.timestamp).ok()?;
    let before = &series[start];
    let after = series.get(start + horizon)?;

    let volatility_shift = match (before.rolling_volatility, after.rolling_volatility) {
        (Some(b), Some(a)) => Some(a - b),
        _ => None,
    };

    Some(EventImpact {
        title: event.event.title.clone(),
        date: event.event.date,
        horizon_days: horizon,
        price_change_pct: (after.price / before.price - 1.0) * 100.0,
        volatility_shift,
    })
}

fn round4(value: f64) -> f64 {
    (value * 10_000.0).round() / 10_000.0
}
