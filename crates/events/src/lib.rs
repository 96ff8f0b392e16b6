//! # Dashboard Events
//!
//! This crate defines the messages published by the dashboard's root provider:
//! filter transitions for chart consumers and non-blocking notices for the
//! region of the view a failure affects.
//!
//! As a Layer 0 crate, it depends only on `core-types` and provides the definitive
//! language for state-change notifications.

// Declare the modules that make up this crate.
pub mod error;
pub mod messages;

// Re-export the core types to provide a clean public API.
pub use error::EventsError;
pub use messages::{DashboardEvent, DataRegion, FilterTransition, LogLevel, Notice};
