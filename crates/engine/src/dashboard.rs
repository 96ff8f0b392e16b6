use crate::bundle::{RangeCommit, RenderBundle};
use crate::composer::{ChartComposer, ChartInputs};
use crate::error::EngineError;
use crate::loader::{FetchTicket, LoadSlot, LoadState, SlotOutcome};
use crate::source::{decode_change_points, decode_events, decode_prices, decode_regimes, DataSource, PriceQuery};
use analytics::AnalyticsEngine;
use configuration::Config;
use core_types::{ChangePoint, EnrichedPricePoint, MarketEvent, PricePoint, Regime};
use events::{DashboardEvent, DataRegion, FilterTransition, Notice};
use serde_json::Value;
use state::{FilterStore, FilterView, SyncStore, SyncView};
use std::sync::Arc;
use tokio::sync::broadcast;
use tokio::sync::broadcast::error::TryRecvError;

const EVENT_CHANNEL_CAPACITY: usize = 64;

/// The root provider of one dashboard view.
///
/// Owns the filter and hover stores, the per-region data and the derived-series
/// cache. Chart components only ever receive the read-only views and the
/// render bundles produced here.
pub struct Dashboard {
    source: Arc<dyn DataSource>,
    filters: FilterStore,
    sync: SyncStore,
    analytics: AnalyticsEngine,
    composer: ChartComposer,
    range_commit: RangeCommit,
    prices: LoadSlot<Arc<[PricePoint]>>,
    events: LoadSlot<Arc<[MarketEvent]>>,
    change_points: LoadSlot<ChangePointData>,
    event_tx: broadcast::Sender<DashboardEvent>,
    filter_rx: broadcast::Receiver<FilterTransition>,
}

/// Change points and the regimes upstream supplied in the same rows, if any.
#[derive(Debug, Clone)]
struct ChangePointData {
    change_points: Arc<[ChangePoint]>,
    regimes: Arc<[Regime]>,
}

impl ChangePointData {
    fn decode(body: Value) -> Self {
        let regimes = decode_regimes(&body);
        Self {
            change_points: Arc::from(decode_change_points(body)),
            regimes: Arc::from(regimes),
        }
    }
}

/// The tickets and parameters of a refresh that has been started but not fetched.
///
/// Holds no borrow of the dashboard, so the view can keep rendering (as stale)
/// while the fetch is in flight.
pub struct RefreshPlan {
    source: Arc<dyn DataSource>,
    query: PriceQuery,
    prices_ticket: FetchTicket,
    annotations_ticket: FetchTicket,
}

/// Decoded results of a refresh, tagged with the tickets they were fetched for.
#[derive(Debug)]
pub struct FetchResults {
    prices_ticket: FetchTicket,
    annotations_ticket: FetchTicket,
    prices: Result<Arc<[PricePoint]>, String>,
    events: Result<Arc<[MarketEvent]>, String>,
    change_points: Result<ChangePointData, String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RefreshReport {
    pub prices: SlotOutcome,
    pub events: SlotOutcome,
    pub change_points: SlotOutcome,
}

impl RefreshPlan {
    pub fn prices_ticket(&self) -> FetchTicket {
        self.prices_ticket
    }

    /// Runs the three fetches concurrently and decodes whatever comes back.
    pub async fn fetch(self) -> FetchResults {
        let range = self.query.range;
        let (prices, events, change_points) = futures::join!(
            self.source.fetch_prices(&self.query),
            self.source.fetch_events(&range),
            self.source.fetch_change_points(&range),
        );

        FetchResults {
            prices_ticket: self.prices_ticket,
            annotations_ticket: self.annotations_ticket,
            prices: prices.map(|body| Arc::<[PricePoint]>::from(decode_prices(body))).map_err(|e| e.to_string()),
            events: events.map(|body| Arc::<[MarketEvent]>::from(decode_events(body))).map_err(|e| e.to_string()),
            change_points: change_points.map(ChangePointData::decode).map_err(|e| e.to_string()),
        }
    }
}

impl Dashboard {
    /// Builds a dashboard opened on the configured default window.
    pub fn new(config: &Config, source: Arc<dyn DataSource>) -> Result<Self, EngineError> {
        Self::with_filters(config, source, FilterStore::new(config.filters.clone()))
    }

    /// Builds a dashboard opened from a shared link.
    pub fn from_query(config: &Config, source: Arc<dyn DataSource>, query: &str) -> Result<Self, EngineError> {
        Self::with_filters(config, source, FilterStore::from_query(config.filters.clone(), query))
    }

    fn with_filters(config: &Config, source: Arc<dyn DataSource>, filters: FilterStore) -> Result<Self, EngineError> {
        config
            .validate()
            .map_err(|e| EngineError::Configuration(e.to_string()))?;
        let analytics = AnalyticsEngine::new(config.analytics.window, config.analytics.annualize)?;
        let range_commit = RangeCommit::new(filters.clone(), config.sync.brush_debounce);
        let (event_tx, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        let filter_rx = filters.view().subscribe();

        Ok(Self {
            source,
            filters,
            sync: SyncStore::new(),
            analytics,
            composer: ChartComposer::new(&config.analytics),
            range_commit,
            prices: LoadSlot::default(),
            events: LoadSlot::default(),
            change_points: LoadSlot::default(),
            event_tx,
            filter_rx,
        })
    }

    /// The root's own handle on the filters, for the filter bar.
    pub fn filter_store(&self) -> &FilterStore {
        &self.filters
    }

    pub fn filters(&self) -> FilterView {
        self.filters.view()
    }

    /// The hover store; charts report pointer movement through it.
    pub fn sync_store(&self) -> &SyncStore {
        &self.sync
    }

    pub fn sync(&self) -> SyncView {
        self.sync.view()
    }

    pub fn subscribe(&self) -> broadcast::Receiver<DashboardEvent> {
        self.event_tx.subscribe()
    }

    pub fn range_commit(&self) -> &RangeCommit {
        &self.range_commit
    }

    pub fn load_state(&self, region: DataRegion) -> &LoadState {
        match region {
            DataRegion::Prices => self.prices.state(),
            DataRegion::Events => self.events.state(),
            DataRegion::ChangePoints => self.change_points.state(),
        }
    }

    /// Changes the rolling-volatility parameters; the series is rebuilt on the next render.
    pub fn set_volatility_params(&mut self, window: usize, annualize: bool) -> Result<(), EngineError> {
        self.analytics.set_params(window, annualize)?;
        Ok(())
    }

    /// Republishes the filter transitions made since the last call as `FiltersChanged` events.
    ///
    /// Returns whether any of them left the held data answering an older window or mode.
    pub fn forward_filter_changes(&mut self) -> bool {
        let mut requires_fetch = false;
        loop {
            match self.filter_rx.try_recv() {
                Ok(transition) => {
                    requires_fetch |= transition.requires_fetch();
                    // An error only means nobody is subscribed.
                    let _ = self.event_tx.send(DashboardEvent::FiltersChanged(transition));
                }
                Err(TryRecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "Missed filter transitions; assuming the data is out of date.");
                    requires_fetch = true;
                }
                Err(TryRecvError::Empty | TryRecvError::Closed) => break,
            }
        }
        requires_fetch
    }

    /// Forwards pending filter transitions and refreshes when they need new data,
    /// or when nothing has been loaded yet.
    pub async fn sync_with_filters(&mut self) -> Option<RefreshReport> {
        let requires_fetch = self.forward_filter_changes();
        if requires_fetch || self.prices.state() == &LoadState::Idle {
            Some(self.refresh().await)
        } else {
            None
        }
    }

    /// Marks every region as loading for the current filters.
    pub fn begin_refresh(&mut self) -> RefreshPlan {
        self.forward_filter_changes();
        let current = self.filters.snapshot();
        let prices_ticket = FetchTicket::prices(&current);
        let annotations_ticket = FetchTicket::range_only(&current);

        self.prices.begin(prices_ticket);
        self.events.begin(annotations_ticket);
        self.change_points.begin(annotations_ticket);
        tracing::debug!(start = %current.start_date, end = %current.end_date, "Refresh started.");

        RefreshPlan {
            source: Arc::clone(&self.source),
            query: PriceQuery {
                range: current.range(),
                return_mode: current.return_mode,
            },
            prices_ticket,
            annotations_ticket,
        }
    }

    /// Commits the results that still match the current filters.
    pub fn finish_refresh(&mut self, results: FetchResults) -> RefreshReport {
        let current = self.filters.snapshot();

        let prices = self.prices.complete(results.prices_ticket, results.prices, &current);
        self.announce(DataRegion::Prices, prices, self.prices.data().map(|d| d.len()));

        let events = self.events.complete(results.annotations_ticket, results.events, &current);
        self.announce(DataRegion::Events, events, self.events.data().map(|d| d.len()));

        let change_points = self
            .change_points
            .complete(results.annotations_ticket, results.change_points, &current);
        self.announce(
            DataRegion::ChangePoints,
            change_points,
            self.change_points.data().map(|d| d.change_points.len()),
        );

        RefreshReport {
            prices,
            events,
            change_points,
        }
    }

    /// Fetches and commits data for the current filters.
    pub async fn refresh(&mut self) -> RefreshReport {
        let plan = self.begin_refresh();
        let results = plan.fetch().await;
        self.finish_refresh(results)
    }

    /// Builds the bundle for the current filters from the data held right now.
    ///
    /// Regions still loading or failed contribute their last-good data and mark the
    /// bundle stale.
    pub fn render(&mut self) -> RenderBundle {
        let filters = self.filters.snapshot();
        let stale = !(self.prices.is_fresh(&filters)
            && self.events.is_fresh(&filters)
            && self.change_points.is_fresh(&filters));

        let series: Arc<[EnrichedPricePoint]> = match self.prices.data() {
            Some(prices) => self.analytics.enriched(prices),
            None => Arc::from(Vec::new()),
        };
        let events = self.events.data().map_or(&[][..], |e| &e[..]);
        let (change_points, regimes): (&[ChangePoint], &[Regime]) = self
            .change_points
            .data()
            .map_or((&[][..], &[][..]), |c| (&c.change_points[..], &c.regimes[..]));

        self.composer.compose(
            ChartInputs {
                series,
                events,
                regimes,
                change_points,
                filters,
                stale,
            },
            self.range_commit.clone(),
        )
    }

    /// Recomputation count of the derived series, for diagnostics.
    pub fn recomputations(&self) -> u64 {
        self.analytics.recomputations()
    }

    fn announce(&self, region: DataRegion, outcome: SlotOutcome, records: Option<usize>) {
        let event = match outcome {
            SlotOutcome::Applied => DashboardEvent::DataLoaded {
                region,
                records: records.unwrap_or(0),
            },
            SlotOutcome::Failed => {
                let message = match self.load_state(region) {
                    LoadState::Failed(message) => message.clone(),
                    _ => String::new(),
                };
                tracing::warn!(region = region.as_str(), error = %message, "Data refresh failed; keeping last-good data.");
                DashboardEvent::Notice(Notice::warn(region, format!("Could not load {}: {message}", region.as_str())))
            }
            SlotOutcome::Discarded => return,
        };
        // An error only means nobody is subscribed.
        let _ = self.event_tx.send(event);
    }
}
