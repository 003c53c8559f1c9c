//! Core types for the mailqf queue filter.
//!
//! Leaf building blocks with no I/O: the error taxonomy, typed views
//! over raw queue records, compiled filter patterns, the arrival-time
//! interval, and the CLI / run configuration.

pub mod error;
pub mod interval;
pub mod models;
pub mod pattern;
pub mod settings;

pub use error::{MailqfError, Result};
