use crate::error::EventsError;
use chrono::{DateTime, Utc};
use core_types::FilterState;
use serde::{Deserialize, Serialize};

/// Enum representing the severity of a notice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LogLevel {
    Info,
    Warn,
    Error,
}

/// The part of the dashboard a piece of data (and any failure loading it) belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DataRegion {
    Prices,
    Events,
    ChangePoints,
}

impl DataRegion {
    pub fn as_str(&self) -> &'static str {
        match self {
            DataRegion::Prices => "prices",
            DataRegion::Events => "events",
            DataRegion::ChangePoints => "change_points",
        }
    }
}

/// A visible, non-blocking message scoped to one region of the view.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notice {
    pub timestamp: DateTime<Utc>,
    pub region: DataRegion,
    pub level: LogLevel,
    pub message: String,
}

impl Notice {
    pub fn warn(region: DataRegion, message: impl Into<String>) -> Self {
        Self {
            timestamp: Utc::now(),
            region,
            level: LogLevel::Warn,
            message: message.into(),
        }
    }
}

/// One atomic filter transition. Both sides are complete states, so a subscriber
/// never observes a half-applied batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterTransition {
    pub previous: FilterState,
    pub current: FilterState,
}

impl FilterTransition {
    /// Whether the data window (and so any fetched data) changed, as opposed to display-only fields.
    pub fn range_changed(&self) -> bool {
        self.previous.start_date != self.current.start_date || self.previous.end_date != self.current.end_date
    }

    /// Whether data held for `previous` no longer answers `current`; the price feed is keyed on the return mode too.
    pub fn requires_fetch(&self) -> bool {
        self.range_changed() || self.previous.return_mode != self.current.return_mode
    }
}

/// The top-level message enum published by the dashboard.
///
/// Serialized with `#[serde(tag = "type", content = "payload")]`, e.g.
/// `{ "type": "Notice", "payload": { "region": "prices", "level": "Warn", ... } }`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload")]
pub enum DashboardEvent {
    /// The filter state moved; emitted once per batch.
    FiltersChanged(FilterTransition),
    /// A region finished loading fresh data.
    DataLoaded { region: DataRegion, records: usize },
    /// A region could not refresh and keeps showing its last-good data.
    Notice(Notice),
}

impl DashboardEvent {
    pub fn to_json(&self) -> Result<String, EventsError> {
        serde_json::to_string(self).map_err(|e| EventsError::Serialization(e.to_string()))
    }

    pub fn from_json(json: &str) -> Result<Self, EventsError> {
        serde_json::from_str(json).map_err(|e| EventsError::Deserialization(e.to_string()))
    }
}
