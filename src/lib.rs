//! Batch pipeline for NHS virtual ward sitrep spreadsheets: load the
//! monthly exports, normalize onto a canonical schema, merge with the ICB
//! identity lookup, aggregate to (month, ICB), and derive utilization
//! metrics with safe division.
pub mod aggregate;
pub mod config;
pub mod error;
pub mod loader;
pub mod metrics;
pub mod normalize;
pub mod output;
pub mod reports;
pub mod resolve;
pub mod types;
pub mod util;
