use crate::bundle::{RangeCommit, RenderBundle};
use analytics::{
    anchor_events, change_point_markers, event_impact, filter_valid_regimes, padded_domain_with,
    place_event_markers, regimes_from_change_points, ImpactSummary, MarketSummary,
};
use configuration::AnalyticsSettings;
use core_types::{ChangePoint, EnrichedPricePoint, FilterState, MarketEvent, Regime, SeriesField};
use std::sync::Arc;

/// The already-derived inputs of one render.
#[derive(Debug, Clone)]
pub struct ChartInputs<'a> {
    pub series: Arc<[EnrichedPricePoint]>,
    pub events: &'a [MarketEvent],
    /// Regimes supplied by upstream. When empty, regimes are derived from the change points.
    pub regimes: &'a [Regime],
    pub change_points: &'a [ChangePoint],
    pub filters: FilterState,
    pub stale: bool,
}

/// Assembles render bundles from the derived series and the raw annotations.
#[derive(Debug, Clone)]
pub struct ChartComposer {
    domain_padding: f64,
    primary_padding: f64,
    impact_window: usize,
}

impl ChartComposer {
    pub fn new(settings: &AnalyticsSettings) -> Self {
        Self {
            domain_padding: settings.domain_padding,
            primary_padding: settings.primary_padding,
            impact_window: settings.impact_window,
        }
    }

    pub fn compose(&self, inputs: ChartInputs<'_>, range_commit: RangeCommit) -> RenderBundle {
        let ChartInputs {
            series,
            events,
            regimes,
            change_points,
            filters,
            stale,
        } = inputs;

        let primary_field = filters.primary_field();
        let primary_domain = padded_domain_with(&series, primary_field, self.primary_padding).for_scale(filters.scale);
        let volatility_domain = padded_domain_with(&series, SeriesField::RollingVolatility, self.domain_padding);

        let anchored = anchor_events(&series, events, primary_field);
        let event_markers = place_event_markers(&series, events, primary_field);
        let regimes = match (regimes, series.last()) {
            ([], Some(last)) => regimes_from_change_points(change_points, last.timestamp),
            ([], None) => Vec::new(),
            (supplied, _) => filter_valid_regimes(supplied),
        };
        let markers = change_point_markers(&series, change_points);
        let event_impacts = anchored
            .iter()
            .filter_map(|event| event_impact(&series, event, self.impact_window))
            .collect();
        let summary = MarketSummary::from_series(&series, &regimes);
        let impact_summary = ImpactSummary::from_latest(change_points);

        tracing::debug!(
            points = series.len(),
            events = anchored.len(),
            regimes = regimes.len(),
            stale,
            "Composed render bundle."
        );

        RenderBundle {
            filters,
            series,
            primary_field,
            primary_domain,
            volatility_domain,
            events: anchored,
            event_markers,
            regimes,
            change_points: markers,
            event_impacts,
            summary,
            impact_summary,
            stale,
            range_commit,
        }
    }
}
