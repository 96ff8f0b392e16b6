use crate::enums::{Metric, RegimeKind, ReturnMode, Scale, SeriesField};
use crate::time::date_to_millis;
use chrono::{Days, NaiveDate};
use serde::{Deserialize, Serialize};

/// A raw daily price observation as delivered by the price feed.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PricePoint {
    pub date: NaiveDate,
    pub price: f64,
}

impl PricePoint {
    pub fn new(date: NaiveDate, price: f64) -> Self {
        Self { date, price }
    }
}

/// A price observation together with everything derived from its position in the series.
///
/// Only ever produced by rebuilding a whole series, so a point's volatility is always
/// consistent with the returns around it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EnrichedPricePoint {
    pub date: NaiveDate,
    pub price: f64,
    /// Epoch milliseconds of `date` at 00:00 UTC.
    pub timestamp: i64,
    /// `None` only for the first point of the series.
    pub log_return: Option<f64>,
    /// `None` while the trailing window is incomplete.
    pub rolling_volatility: Option<f64>,
}

impl EnrichedPricePoint {
    /// Reads the column selected by `field`.
    pub fn value(&self, field: SeriesField) -> Option<f64> {
        match field {
            SeriesField::Price => Some(self.price),
            SeriesField::LogReturn => self.log_return,
            SeriesField::RollingVolatility => self.rolling_volatility,
        }
    }
}

/// A dated market event (OPEC decision, conflict, sanctions, ...).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarketEvent {
    pub date: NaiveDate,
    #[serde(alias = "event_name")]
    pub title: String,
    #[serde(default)]
    pub category: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// An event pinned onto a trading day of the enriched series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnchoredEvent {
    #[serde(flatten)]
    pub event: MarketEvent,
    pub timestamp: i64,
    /// The matched point's price, or its log return, depending on the metric.
    pub value: f64,
}

/// A shaded interval of the time axis classified by volatility.
///
/// Bounds are epoch milliseconds kept as `f64` because regimes arrive from upstream
/// computations and may carry non-finite values; see `filter_valid_regimes`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Regime {
    pub start: f64,
    pub end: f64,
    pub kind: RegimeKind,
}

impl Regime {
    pub fn new(start: f64, end: f64, kind: RegimeKind) -> Self {
        Self { start, end, kind }
    }

    pub fn is_valid(&self) -> bool {
        self.start.is_finite() && self.end.is_finite() && self.end > self.start
    }

    pub fn contains(&self, timestamp: i64) -> bool {
        let t = timestamp as f64;
        t >= self.start && t <= self.end
    }
}

/// A structural break detected upstream, with the return statistics on both sides.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChangePoint {
    pub date: NaiveDate,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub associated_event: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event_category: Option<String>,
    #[serde(alias = "mu_pre_change")]
    pub mean_before: f64,
    #[serde(alias = "mu_post_change")]
    pub mean_after: f64,
    #[serde(alias = "sigma_pre_change")]
    pub vol_before: f64,
    #[serde(alias = "sigma_post_change")]
    pub vol_after: f64,
}

impl ChangePoint {
    pub fn timestamp(&self) -> i64 {
        date_to_millis(self.date)
    }
}

/// An inclusive calendar-date window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        Self { start, end }
    }

    /// The `days`-long window ending at `end`.
    pub fn lookback(end: NaiveDate, days: u64) -> Self {
        let start = end.checked_sub_days(Days::new(days)).unwrap_or(NaiveDate::MIN);
        Self { start, end }
    }

    /// Replaces an inverted window by the `lookback_days` window ending at `end`.
    pub fn normalized(self, lookback_days: u64) -> Self {
        if self.start > self.end {
            tracing::debug!(start = %self.start, end = %self.end, "Inverted date range normalized.");
            Self::lookback(self.end, lookback_days)
        } else {
            self
        }
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        date >= self.start && date <= self.end
    }
}

/// The dashboard-wide analysis window and display mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FilterState {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub metric: Metric,
    pub return_mode: ReturnMode,
    pub scale: Scale,
}

impl FilterState {
    /// The default view: `lookback_days` ending at `data_max`, price metric, linear scale.
    pub fn default_for(data_max: NaiveDate, lookback_days: u64) -> Self {
        let range = DateRange::lookback(data_max, lookback_days);
        Self {
            start_date: range.start,
            end_date: range.end,
            metric: Metric::default(),
            return_mode: ReturnMode::default(),
            scale: Scale::default(),
        }
    }

    pub fn range(&self) -> DateRange {
        DateRange::new(self.start_date, self.end_date)
    }

    /// The series column the primary chart plots. Returns mode always plots log returns.
    pub fn primary_field(&self) -> SeriesField {
        match self.return_mode {
            ReturnMode::Returns => SeriesField::LogReturn,
            ReturnMode::Price => self.metric.primary_field(),
        }
    }
}

/// Hover state shared by every chart of one dashboard view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SyncState {
    pub active_index: Option<usize>,
}
