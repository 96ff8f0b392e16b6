//! # Dashboard Analytics
//!
//! Pure numeric transforms over the price series and the logic that places
//! events and regimes on the time axis.
//!
//! ## Architectural Principles
//!
//! - **Layer 1 Logic:** This is a pure logic crate. It has no knowledge of external systems.
//!   It depends only on `core-types` (Layer 0).
//! - **Whole-Series Derivation:** Derived values are always rebuilt for the entire series.
//!   The `AnalyticsEngine` caches the last result and rebuilds only when its inputs change.
//!
//! ## Public API
//!
//! - `log_returns`, `rolling_volatility`, `enrich_series`: the return/volatility calculator.
//! - `padded_domain`, `AxisDomain`: padded axis bounds.
//! - `anchor_events`, `nearest_point`, `place_event_markers`: event anchoring.
//! - `filter_valid_regimes`, `regimes_from_change_points`, `change_point_markers`: regimes.
//! - `MarketSummary`, `ImpactSummary`, `event_impact`: headline figures.

// Declare the modules that constitute this crate.
pub mod anchor;
pub mod calculator;
pub mod domain;
pub mod engine;
pub mod error;
pub mod regime;
pub mod report;

// Re-export the key components to create a clean, public-facing API.
pub use anchor::{anchor_events, nearest_index, nearest_point, place_event_markers, EventMarker};
pub use calculator::{enrich_series, log_returns, rolling_volatility, TRADING_DAYS_PER_YEAR};
pub use domain::{padded_domain, padded_domain_with, AxisDomain, DEFAULT_PADDING, PRIMARY_PADDING};
pub use engine::AnalyticsEngine;
pub use error::AnalyticsError;
pub use regime::{
    change_point_markers, filter_valid_regimes, label_transition, regime_kind, regimes_from_change_points,
    ChangePointMarker,
};
pub use report::{event_impact, EventImpact, ImpactSummary, MarketSummary};
