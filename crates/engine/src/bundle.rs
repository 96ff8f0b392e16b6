use analytics::{AxisDomain, ChangePointMarker, EventImpact, EventMarker, ImpactSummary, MarketSummary};
use chrono::NaiveDate;
use core_types::{AnchoredEvent, DateRange, EnrichedPricePoint, FilterState, Regime, SeriesField, SyncState};
use serde::Serialize;
use state::{Debouncer, FilterStore};
use std::sync::Arc;
use std::time::Duration;

/// The debounced bridge from brush drags to the filter state.
///
/// Endpoints reach `set_date_range` only after the brush has been still for the
/// configured delay, and only the last endpoints of a drag are committed.
#[derive(Debug, Clone)]
pub struct RangeCommit {
    debouncer: Arc<Debouncer<DateRange>>,
}

impl RangeCommit {
    pub fn new(filters: FilterStore, delay: Duration) -> Self {
        let debouncer = Debouncer::new(delay, move |range: DateRange| {
            tracing::debug!(start = %range.start, end = %range.end, "Committing brush range.");
            filters.set_date_range(range.start, range.end);
        });
        Self {
            debouncer: Arc::new(debouncer),
        }
    }

    /// Schedules a commit of `start..=end`, replacing any pending one.
    pub fn commit(&self, start: NaiveDate, end: NaiveDate) {
        self.debouncer.call(DateRange::new(start, end));
    }

    pub fn cancel(&self) -> bool {
        self.debouncer.cancel()
    }

    pub fn is_pending(&self) -> bool {
        self.debouncer.is_pending()
    }
}

/// One formatted line of a tooltip.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TooltipRow {
    pub label: &'static str,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Tooltip {
    pub date: NaiveDate,
    pub rows: Vec<TooltipRow>,
    /// The event dated exactly on this trading day, if any.
    pub event: Option<AnchoredEvent>,
}

/// Everything a chart needs for one render. Immutable once built.
#[derive(Debug, Clone, Serialize)]
pub struct RenderBundle {
    pub filters: FilterState,
    pub series: Arc<[EnrichedPricePoint]>,
    pub primary_field: SeriesField,
    /// Bounds of the primary field, already adjusted for the scale.
    pub primary_domain: AxisDomain,
    pub volatility_domain: AxisDomain,
    pub events: Vec<AnchoredEvent>,
    pub event_markers: Vec<EventMarker>,
    pub regimes: Vec<Regime>,
    pub change_points: Vec<ChangePointMarker>,
    pub event_impacts: Vec<EventImpact>,
    pub summary: Option<MarketSummary>,
    pub impact_summary: Option<ImpactSummary>,
    /// Set while a fetch for the current filters is pending or has failed, in which
    /// case the content is last-good data for an earlier window.
    pub stale: bool,
    #[serde(skip)]
    pub(crate) range_commit: RangeCommit,
}

impl RenderBundle {
    pub fn is_stale(&self) -> bool {
        self.stale
    }

    pub fn is_empty(&self) -> bool {
        self.series.is_empty()
    }

    /// Brush callback: maps the selected indices to dates and schedules a debounced commit.
    ///
    /// Indices outside the series are ignored; reversed indices are reordered.
    pub fn on_brush_change(&self, start_index: usize, end_index: usize) -> bool {
        let (lo, hi) = (start_index.min(end_index), start_index.max(end_index));
        match (self.series.get(lo), self.series.get(hi)) {
            (Some(start), Some(end)) => {
                self.range_commit.commit(start.date, end.date);
                true
            }
            _ => false,
        }
    }

    pub fn range_commit(&self) -> &RangeCommit {
        &self.range_commit
    }

    /// Timestamp of the hovered point, for drawing the shared crosshair.
    pub fn crosshair(&self, sync: &SyncState) -> Option<i64> {
        sync.active_index
            .and_then(|i| self.series.get(i))
            .map(|p| p.timestamp)
    }

    pub fn tooltip_at(&self, index: usize) -> Option<Tooltip> {
        let point = self.series.get(index)?;
        let mut rows = Vec::with_capacity(2);

        match self.primary_field {
            SeriesField::Price => rows.push(TooltipRow {
                label: "BRENT PRICE",
                value: format!("${:.2}", point.price),
            }),
            SeriesField::LogReturn | SeriesField::RollingVolatility => {
                if let Some(r) = point.log_return {
                    rows.push(TooltipRow {
                        label: "LOG RETURN",
                        value: format!("{:.4}%", r * 100.0),
                    });
                }
            }
        }
        if let Some(vol) = point.rolling_volatility {
            rows.push(TooltipRow {
                label: "VOLATILITY",
                value: format!("{:.2}%", vol * 100.0),
            });
        }

        let event = self.events.iter().find(|e| e.timestamp == point.timestamp).cloned();
        Some(Tooltip {
            date: point.date,
            rows,
            event,
        })
    }
}
