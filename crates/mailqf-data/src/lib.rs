//! Processing layer for the mailqf queue filter.
//!
//! Responsible for reading line-delimited queue records, classifying
//! them against the run configuration, tallying report attributes and
//! driving the per-file processing loop.

pub mod classifier;
pub mod pipeline;
pub mod reader;
pub mod report;

pub use mailqf_core as core;
