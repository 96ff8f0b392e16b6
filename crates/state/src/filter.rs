use crate::error::StateError;
use crate::query;
use chrono::Months;
use configuration::FilterSettings;
use core_types::{DateRange, FilterState, Metric, ReturnMode, Scale};
use events::FilterTransition;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::broadcast;

const CHANNEL_CAPACITY: usize = 64;

/// Quick-select windows offered next to the date pickers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RangePreset {
    /// The last `n` years up to the dataset's last date.
    Years(u32),
    /// The whole dataset.
    All,
}

/// Owner of the dashboard's single `FilterState`.
///
/// Cloning yields another handle to the same state. Every mutation goes through a
/// batch: the edits are applied to a draft, the draft replaces the state under one
/// lock, and subscribers receive exactly one `FilterTransition`. A batch that ends
/// where it started publishes nothing.
#[derive(Debug, Clone)]
pub struct FilterStore {
    inner: Arc<Inner>,
}

#[derive(Debug)]
struct Inner {
    state: Mutex<FilterState>,
    settings: FilterSettings,
    tx: broadcast::Sender<FilterTransition>,
}

/// The draft a batch edits. Nothing is visible to subscribers until the batch closes.
#[derive(Debug)]
pub struct FilterBatch<'a> {
    draft: FilterState,
    settings: &'a FilterSettings,
}

impl FilterBatch<'_> {
    /// Sets the window; an inverted window becomes the default lookback ending at `end`.
    pub fn set_date_range(&mut self, start: chrono::NaiveDate, end: chrono::NaiveDate) -> &mut Self {
        let range = DateRange::new(start, end).normalized(self.settings.default_lookback_days);
        self.draft.start_date = range.start;
        self.draft.end_date = range.end;
        self
    }

    pub fn set_metric(&mut self, metric: Metric) -> &mut Self {
        self.draft.metric = metric;
        self
    }

    pub fn set_return_mode(&mut self, mode: ReturnMode) -> &mut Self {
        self.draft.return_mode = mode;
        self
    }

    pub fn set_scale(&mut self, scale: Scale) -> &mut Self {
        self.draft.scale = scale;
        self
    }

    pub fn reset(&mut self) -> &mut Self {
        self.draft = self.settings.default_state();
        self
    }

    pub fn apply_preset(&mut self, preset: RangePreset) -> &mut Self {
        let (data_min, data_max) = (self.settings.data_min, self.settings.data_max);
        let start = match preset {
            RangePreset::All => data_min,
            RangePreset::Years(n) => data_max
                .checked_sub_months(Months::new(n.saturating_mul(12)))
                .map_or(data_min, |start| start.max(data_min)),
        };
        self.set_date_range(start, data_max)
    }

    /// Replaces the whole state with the decoded query; see [`query::decode`].
    pub fn apply_query(&mut self, raw: &str) -> &mut Self {
        self.draft = query::decode(raw, self.settings.default_state(), self.settings.default_lookback_days);
        self
    }

    pub fn draft(&self) -> &FilterState {
        &self.draft
    }
}

impl FilterStore {
    /// Opens with the configured default window.
    pub fn new(settings: FilterSettings) -> Self {
        let initial = settings.default_state();
        Self::with_state(settings, initial)
    }

    /// Opens from a shared link, falling back to defaults for anything it lacks.
    pub fn from_query(settings: FilterSettings, raw: &str) -> Self {
        let initial = query::decode(raw, settings.default_state(), settings.default_lookback_days);
        Self::with_state(settings, initial)
    }

    fn with_state(settings: FilterSettings, initial: FilterState) -> Self {
        let (tx, _) = broadcast::channel(CHANNEL_CAPACITY);
        Self {
            inner: Arc::new(Inner {
                state: Mutex::new(initial),
                settings,
                tx,
            }),
        }
    }

    /// Applies every edit made in `edit` as one transition.
    pub fn batch<F>(&self, edit: F) -> Option<FilterTransition>
    where
        F: FnOnce(&mut FilterBatch<'_>),
    {
        let mut state = self.lock();
        let previous = *state;
        let mut batch = FilterBatch {
            draft: previous,
            settings: &self.inner.settings,
        };
        edit(&mut batch);
        let current = batch.draft;

        if current == previous {
            return None;
        }
        *state = current;

        let transition = FilterTransition { previous, current };
        tracing::info!(
            start = %current.start_date,
            end = %current.end_date,
            metric = %current.metric,
            mode = %current.return_mode,
            scale = %current.scale,
            "Filters changed."
        );
        // Published under the lock so subscribers see transitions in commit order.
        // An error only means nobody is subscribed.
        let _ = self.inner.tx.send(transition);
        Some(transition)
    }

    pub fn set_date_range(&self, start: chrono::NaiveDate, end: chrono::NaiveDate) -> Option<FilterTransition> {
        self.batch(|b| {
            b.set_date_range(start, end);
        })
    }

    pub fn set_metric(&self, metric: Metric) -> Option<FilterTransition> {
        self.batch(|b| {
            b.set_metric(metric);
        })
    }

    pub fn set_return_mode(&self, mode: ReturnMode) -> Option<FilterTransition> {
        self.batch(|b| {
            b.set_return_mode(mode);
        })
    }

    pub fn set_scale(&self, scale: Scale) -> Option<FilterTransition> {
        self.batch(|b| {
            b.set_scale(scale);
        })
    }

    pub fn reset_filters(&self) -> Option<FilterTransition> {
        self.batch(|b| {
            b.reset();
        })
    }

    pub fn apply_preset(&self, preset: RangePreset) -> Option<FilterTransition> {
        self.batch(|b| {
            b.apply_preset(preset);
        })
    }

    pub fn apply_query(&self, raw: &str) -> Option<FilterTransition> {
        self.batch(|b| {
            b.apply_query(raw);
        })
    }

    pub fn snapshot(&self) -> FilterState {
        *self.lock()
    }

    pub fn settings(&self) -> &FilterSettings {
        &self.inner.settings
    }

    /// A read-only handle for components that must not edit the filters.
    pub fn view(&self) -> FilterView {
        FilterView { store: self.clone() }
    }

    fn lock(&self) -> MutexGuard<'_, FilterState> {
        // The state is replaced by a single assignment, so a poisoned lock still holds a whole state.
        self.inner.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Read-only access to the filters: snapshots by value, subscriptions and the shareable link.
#[derive(Debug, Clone)]
pub struct FilterView {
    store: FilterStore,
}

impl FilterView {
    pub fn snapshot(&self) -> FilterState {
        self.store.snapshot()
    }

    pub fn subscribe(&self) -> broadcast::Receiver<FilterTransition> {
        self.store.inner.tx.subscribe()
    }

    pub fn encode(&self) -> Result<String, StateError> {
        query::encode(&self.snapshot())
    }
}
