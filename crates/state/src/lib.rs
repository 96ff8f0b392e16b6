//! # Dashboard State
//!
//! The two pieces of shared interactive state of a dashboard view, each with a
//! single owner:
//!
//! - `FilterStore`: the analysis window and display mode. Batched mutation, one
//!   broadcast `FilterTransition` per batch, and a shareable query-string form.
//! - `SyncStore`: the hovered index shared by all charts, on its own `watch` channel.
//!
//! Components below the root receive `FilterView` / `SyncView`, which only hand out
//! snapshots by value. `Debouncer` is the timer primitive used to commit brush drags.

// Declare the modules that make up this crate.
pub mod debounce;
pub mod error;
pub mod filter;
pub mod query;
pub mod sync;

// Re-export the core types to provide a clean public API.
pub use debounce::Debouncer;
pub use error::StateError;
pub use filter::{FilterBatch, FilterStore, FilterView, RangePreset};
pub use sync::{SyncStore, SyncView};
