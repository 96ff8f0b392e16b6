//! # Dashboard Engine
//!
//! The root provider of a dashboard view. It wires the data sources, the shared
//! state stores and the analytics together and hands immutable `RenderBundle`s to
//! the chart components.
//!
//! - `source`: the `DataSource` seam and defensive decoding of raw bodies.
//! - `loader`: fetch tickets and per-region load state; stale results are dropped.
//! - `composer` / `bundle`: assembly of everything a chart needs for one render.
//! - `Dashboard`: owns all of the above.

pub mod bundle;
pub mod composer;
pub mod dashboard;
pub mod error;
pub mod loader;
pub mod source;

pub use bundle::{RangeCommit, RenderBundle, Tooltip, TooltipRow};
pub use composer::{ChartComposer, ChartInputs};
pub use dashboard::{Dashboard, FetchResults, RefreshPlan, RefreshReport};
pub use error::EngineError;
pub use loader::{FetchTicket, LoadSlot, LoadState, SlotOutcome};
pub use source::{decode_change_points, decode_events, decode_prices, decode_regimes, DataSource, JsonFileSource, PriceQuery};
