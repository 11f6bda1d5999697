//! Memora sticky-notes library
//!
//! This library provides the note store behind a desktop of floating note
//! windows: note lifecycle with a 7-day trash, dashboard filtering, drag and
//! resize gestures that commit once per gesture, and durable persistence of
//! the whole collection.

mod cli;
mod composer;
mod config;
mod dashboard;
mod errors;
mod geometry;
mod helper;
mod note;
mod palette;
mod persistence;
mod query;
mod storage;
mod store;
mod trash_scheduler;
mod types;
mod updater;

// Re-export key components
pub use cli::*;
pub use composer::*;
pub use config::*;
pub use dashboard::*;
pub use errors::*;
pub use geometry::*;
pub use helper::*;
pub use note::*;
pub use palette::*;
pub use persistence::*;
pub use query::*;
pub use storage::*;
pub use store::*;
pub use trash_scheduler::*;
pub use types::*;
pub use updater::*;
