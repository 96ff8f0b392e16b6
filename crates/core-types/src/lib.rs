pub mod enums;
pub mod error;
pub mod structs;
pub mod time;

// Re-export the core types to provide a clean public API.
pub use enums::{Metric, RegimeKind, ReturnMode, Scale, SeriesField};
pub use error::CoreError;
pub use structs::{
    AnchoredEvent, ChangePoint, DateRange, EnrichedPricePoint, FilterState, MarketEvent,
    PricePoint, Regime, SyncState,
};
pub use time::{date_to_millis, millis_to_date, DATE_FORMAT};
