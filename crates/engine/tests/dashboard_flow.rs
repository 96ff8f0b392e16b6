//! Behavior tests for the dashboard root provider.
//!
//! These drive a whole `Dashboard` against an in-memory data source: refreshes,
//! superseded fetches, partial failures, shared links and brush commits.

use async_trait::async_trait;
use chrono::{Datelike, NaiveDate};
use configuration::Config;
use core_types::{date_to_millis, DateRange, Metric, Regime, RegimeKind, ReturnMode, Scale, SyncState};
use engine::{Dashboard, DataSource, EngineError, LoadState, PriceQuery, SlotOutcome};
use events::{DashboardEvent, DataRegion, FilterTransition, LogLevel};
use serde_json::{json, Value};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

fn d(y: i32, m: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, day).unwrap()
}

/// Weekday prices from mid-2021 to the end of the dataset, plus a few annotations.
struct MemorySource {
    prices: Vec<Value>,
    events: Vec<Value>,
    change_points: Vec<Value>,
    fail_change_points: AtomicBool,
    price_fetches: AtomicUsize,
}

impl MemorySource {
    fn new() -> Self {
        let prices = d(2021, 6, 1)
            .iter_days()
            .take_while(|day| *day <= d(2022, 9, 30))
            .filter(|day| day.weekday().number_from_monday() <= 5)
            .enumerate()
            .map(|(i, day)| {
                let price = 80.0 + (i as f64 * 0.37).sin() * 5.0;
                // Some feeds send numbers as strings.
                if i % 7 == 0 {
                    json!({"date": day.to_string(), "price": price.to_string()})
                } else {
                    json!({"date": day.to_string(), "price": price})
                }
            })
            .collect();

        Self {
            prices,
            events: vec![
                json!({"date": "2022-02-24", "event_name": "Russia invades Ukraine", "category": "Conflict"}),
                json!({"date": "2022-03-05", "title": "Weekend headline", "category": "Politics"}),
            ],
            change_points: vec![
                json!({
                    "date": "2022-02-24", "associated_event": "Russia invades Ukraine",
                    "mu_pre_change": 0.001, "mu_post_change": 0.003,
                    "sigma_pre_change": 0.02, "sigma_post_change": 0.05
                }),
                json!({
                    "date": "2022-06-15",
                    "mu_pre_change": 0.003, "mu_post_change": -0.002,
                    "sigma_pre_change": 0.05, "sigma_post_change": 0.03
                }),
            ],
            fail_change_points: AtomicBool::new(false),
            price_fetches: AtomicUsize::new(0),
        }
    }

    fn with_change_points(mut self, rows: Vec<Value>) -> Self {
        self.change_points = rows;
        self
    }

    fn within(records: &[Value], range: &DateRange) -> Value {
        Value::Array(
            records
                .iter()
                .filter(|r| {
                    r["date"]
                        .as_str()
                        .and_then(|s| NaiveDate::parse_from_str(s, "%Y-%m-%d").ok())
                        .is_some_and(|date| range.contains(date))
                })
                .cloned()
                .collect(),
        )
    }
}

#[async_trait]
impl DataSource for MemorySource {
    async fn fetch_prices(&self, query: &PriceQuery) -> Result<Value, EngineError> {
        self.price_fetches.fetch_add(1, Ordering::SeqCst);
        Ok(Self::within(&self.prices, &query.range))
    }

    async fn fetch_events(&self, range: &DateRange) -> Result<Value, EngineError> {
        Ok(Self::within(&self.events, range))
    }

    async fn fetch_change_points(&self, range: &DateRange) -> Result<Value, EngineError> {
        if self.fail_change_points.load(Ordering::SeqCst) {
            return Err(EngineError::Source("change-point service unavailable".into()));
        }
        Ok(Self::within(&self.change_points, range))
    }
}

fn dashboard() -> (Dashboard, Arc<MemorySource>) {
    dashboard_over(MemorySource::new())
}

fn dashboard_over(source: MemorySource) -> (Dashboard, Arc<MemorySource>) {
    let source = Arc::new(source);
    let dashboard = Dashboard::new(&Config::default(), source.clone()).expect("default config is valid");
    (dashboard, source)
}

// =============================================================================
// Refresh and render
// =============================================================================

#[tokio::test]
async fn when_data_arrives_the_bundle_is_fresh_and_consistent() {
    // Given: A dashboard on the default one-year window
    let (mut dashboard, _) = dashboard();
    assert!(dashboard.render().is_stale(), "nothing has been loaded yet");

    // When: It refreshes
    let report = dashboard.refresh().await;

    // Then: Every region is applied and the bundle is built from the whole window
    assert_eq!(report.prices, SlotOutcome::Applied);
    assert_eq!(report.events, SlotOutcome::Applied);
    assert_eq!(report.change_points, SlotOutcome::Applied);

    let bundle = dashboard.render();
    assert!(!bundle.is_stale());
    assert_eq!(bundle.series.first().unwrap().date, d(2021, 9, 30));
    assert_eq!(bundle.series.last().unwrap().date, d(2022, 9, 30));
    assert!(bundle.series.windows(2).all(|w| w[0].timestamp < w[1].timestamp));
    assert_eq!(bundle.series[0].log_return, None);
    assert!(bundle.series[..20].iter().all(|p| p.rolling_volatility.is_none()));
    assert!(bundle.series[20..].iter().all(|p| p.rolling_volatility.is_some()));

    // Only the weekday event is anchored; both get a marker.
    assert_eq!(bundle.events.len(), 1);
    assert_eq!(bundle.events[0].event.title, "Russia invades Ukraine");
    assert_eq!(bundle.event_markers.len(), 2);
    assert_eq!(bundle.event_impacts.len(), 1);

    assert_eq!(bundle.regimes.len(), 2);
    assert_eq!(bundle.regimes[0].kind, RegimeKind::High);
    assert_eq!(bundle.regimes[1].kind, RegimeKind::Low);
    assert_eq!(bundle.change_points[1].label, "Detected Change Point");
    assert_eq!(bundle.summary.as_ref().unwrap().latest_regime, "Stable Regime");
    assert_eq!(bundle.impact_summary.as_ref().unwrap().date, d(2022, 6, 15));
}

#[tokio::test]
async fn when_nothing_changes_the_series_is_not_recomputed() {
    // Given: A loaded dashboard
    let (mut dashboard, _) = dashboard();
    dashboard.refresh().await;

    // When: It renders repeatedly and a display-only filter changes
    let first = dashboard.render();
    dashboard.filter_store().set_metric(Metric::Volatility);
    let second = dashboard.render();

    // Then: The derived series is shared, not rebuilt
    assert!(Arc::ptr_eq(&first.series, &second.series));
    assert_eq!(dashboard.recomputations(), 1);
    assert!(!second.is_stale(), "metric changes need no new data");

    // And: a new window parameter forces a rebuild
    dashboard.set_volatility_params(5, false).unwrap();
    dashboard.render();
    assert_eq!(dashboard.recomputations(), 2);
}

#[tokio::test]
async fn when_upstream_supplies_regimes_malformed_ones_are_never_drawn() {
    // Given: Change-point rows that also carry regime bounds, one of them inverted
    let source = MemorySource::new().with_change_points(vec![
        json!({
            "date": "2022-02-24", "mean_before": 0.001, "mean_after": 0.003, "vol_before": 0.02, "vol_after": 0.05,
            "start_date": "2022-02-24", "end_date": "2022-06-15", "volatility_regime": "high"
        }),
        json!({
            "date": "2022-06-15", "mean_before": 0.003, "mean_after": -0.002, "vol_before": 0.05, "vol_after": 0.03,
            "start_date": "2022-06-15", "end_date": "2022-03-01", "volatility_regime": "low"
        }),
    ]);
    let (mut dashboard, _) = dashboard_over(source);

    // When: The dashboard loads and renders
    dashboard.refresh().await;
    let bundle = dashboard.render();

    // Then: Only the well-formed supplied regime is drawn; nothing is derived instead
    let expected = Regime::new(
        date_to_millis(d(2022, 2, 24)) as f64,
        date_to_millis(d(2022, 6, 15)) as f64,
        RegimeKind::High,
    );
    assert_eq!(bundle.regimes, vec![expected]);
    assert_eq!(bundle.change_points.len(), 2);
    assert_eq!(bundle.summary.as_ref().unwrap().latest_regime, "High Volatility Regime");
}

#[tokio::test]
async fn when_filters_move_subscribers_hear_it_and_only_data_changes_refetch() {
    // Given: A dashboard synced once and an event subscriber
    let (mut dashboard, source) = dashboard();
    let mut rx = dashboard.subscribe();
    assert!(dashboard.sync_with_filters().await.is_some(), "the first sync loads data");

    // When: Only the scale changes
    dashboard.filter_store().set_scale(Scale::Log);

    // Then: The change is announced but nothing is refetched
    assert!(dashboard.sync_with_filters().await.is_none());
    assert_eq!(source.price_fetches.load(Ordering::SeqCst), 1);

    // When: The window moves
    dashboard.filter_store().set_date_range(d(2022, 1, 3), d(2022, 3, 31));

    // Then: The data is refetched for the new window
    let report = dashboard.sync_with_filters().await.expect("a range change refetches");
    assert_eq!(report.prices, SlotOutcome::Applied);
    assert_eq!(source.price_fetches.load(Ordering::SeqCst), 2);

    let mut transitions: Vec<FilterTransition> = Vec::new();
    while let Ok(event) = rx.try_recv() {
        if let DashboardEvent::FiltersChanged(transition) = event {
            transitions.push(transition);
        }
    }
    assert_eq!(transitions.len(), 2);
    assert_eq!(transitions[0].current.scale, Scale::Log);
    assert!(!transitions[0].range_changed());
    assert!(transitions[1].range_changed());
}

// =============================================================================
// Superseded and failed fetches
// =============================================================================

#[tokio::test]
async fn when_the_range_moves_mid_fetch_the_result_is_discarded() {
    // Given: A refresh in flight for the default window
    let (mut dashboard, _) = dashboard();
    let plan = dashboard.begin_refresh();
    assert_eq!(dashboard.load_state(DataRegion::Prices), &LoadState::Loading);
    assert!(dashboard.render().is_stale());

    // When: The user changes the window before the fetch resolves
    dashboard.filter_store().set_date_range(d(2022, 1, 3), d(2022, 3, 31));
    let results = plan.fetch().await;
    let report = dashboard.finish_refresh(results);

    // Then: Nothing from the stale fetch is committed
    assert_eq!(report.prices, SlotOutcome::Discarded);
    assert_eq!(report.events, SlotOutcome::Discarded);
    assert!(dashboard.render().series.is_empty());
    assert_eq!(dashboard.load_state(DataRegion::Prices), &LoadState::Loading);

    // And: the next refresh loads the new window
    dashboard.refresh().await;
    let bundle = dashboard.render();
    assert!(!bundle.is_stale());
    assert_eq!(bundle.series.first().unwrap().date, d(2022, 1, 3));
    assert_eq!(bundle.series.last().unwrap().date, d(2022, 3, 31));
}

#[tokio::test]
async fn when_return_mode_changes_prices_are_refetched() {
    // Given: A loaded dashboard
    let (mut dashboard, source) = dashboard();
    dashboard.refresh().await;

    // When: The return mode changes
    dashboard.filter_store().set_return_mode(ReturnMode::Returns);

    // Then: The held prices no longer count as fresh until refetched
    assert!(dashboard.render().is_stale());
    dashboard.refresh().await;
    assert!(!dashboard.render().is_stale());
    assert_eq!(source.price_fetches.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn when_one_region_fails_only_it_reports_a_notice() {
    // Given: A loaded dashboard and an event subscriber
    let (mut dashboard, source) = dashboard();
    dashboard.refresh().await;
    let mut rx = dashboard.subscribe();

    // When: The change-point service fails on the next refresh
    source.fail_change_points.store(true, Ordering::SeqCst);
    let report = dashboard.refresh().await;

    // Then: Prices and events still apply; change points fail with a notice
    assert_eq!(report.prices, SlotOutcome::Applied);
    assert_eq!(report.events, SlotOutcome::Applied);
    assert_eq!(report.change_points, SlotOutcome::Failed);
    assert!(matches!(
        dashboard.load_state(DataRegion::ChangePoints),
        LoadState::Failed(message) if message.contains("unavailable")
    ));

    let mut notices = Vec::new();
    while let Ok(event) = rx.try_recv() {
        if let DashboardEvent::Notice(notice) = event {
            notices.push(notice);
        }
    }
    assert_eq!(notices.len(), 1);
    assert_eq!(notices[0].region, DataRegion::ChangePoints);
    assert_eq!(notices[0].level, LogLevel::Warn);

    // And: the last-good change points are still drawn, flagged as stale
    let bundle = dashboard.render();
    assert!(bundle.is_stale());
    assert_eq!(bundle.regimes.len(), 2);
}

// =============================================================================
// Shared state
// =============================================================================

#[tokio::test]
async fn when_a_link_is_shared_the_view_reopens_identically() {
    // Given: A dashboard with non-default filters
    let (dashboard, source) = dashboard();
    dashboard.filter_store().batch(|b| {
        b.set_date_range(d(2022, 2, 1), d(2022, 4, 29))
            .set_metric(Metric::Volatility)
            .set_return_mode(ReturnMode::Returns);
    });

    // When: Its link is opened elsewhere
    let link = dashboard.filters().encode().unwrap();
    let reopened = Dashboard::from_query(&Config::default(), source, &link).unwrap();

    // Then: The filter state is identical
    assert_eq!(reopened.filters().snapshot(), dashboard.filters().snapshot());
}

#[tokio::test]
async fn when_a_chart_is_hovered_peers_see_the_same_crosshair() {
    // Given: A loaded dashboard and two chart views of the hover state
    let (mut dashboard, _) = dashboard();
    dashboard.refresh().await;
    let bundle = dashboard.render();
    let peer = dashboard.sync();

    // When: One chart reports the pointer over index 3
    dashboard.sync_store().set_active_index(Some(3));

    // Then: Every view resolves the same timestamp
    assert_eq!(bundle.crosshair(&peer.snapshot()), Some(bundle.series[3].timestamp));
    dashboard.sync_store().clear();
    assert_eq!(bundle.crosshair(&dashboard.sync().snapshot()), None);
    assert_eq!(dashboard.sync().snapshot(), SyncState::default());
}

#[tokio::test(start_paused = true)]
async fn when_the_brush_settles_the_range_is_committed_once() {
    // Given: A loaded dashboard and a filter subscriber
    let (mut dashboard, _) = dashboard();
    dashboard.refresh().await;
    let bundle = dashboard.render();
    let mut rx = dashboard.filters().subscribe();

    // When: The brush is dragged through five positions within 300ms
    for end in [6, 7, 8, 9, 10] {
        assert!(bundle.on_brush_change(0, end));
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
    assert!(rx.try_recv().is_err(), "nothing is committed while dragging");
    tokio::time::sleep(Duration::from_millis(350)).await;

    // Then: Exactly one transition carries the last endpoints
    let transition = rx.try_recv().unwrap();
    assert!(rx.try_recv().is_err());
    assert_eq!(transition.current.start_date, bundle.series[0].date);
    assert_eq!(transition.current.end_date, bundle.series[10].date);

    // And: the next refresh narrows the series to the brushed window
    dashboard.refresh().await;
    assert_eq!(dashboard.render().series.len(), 11);
}
