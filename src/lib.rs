//! Aggregation, run-over-run diffing and fix-first prioritization for web
//! accessibility audits.
//!
//! Scanner output (one record per page) flows through
//! [`aggregate`] → [`diff`] → [`priority`] and is persisted through
//! [`store`] as the baseline for the next run. [`history`] reads the stored
//! snapshots back as a trend series.

pub mod aggregate;
pub mod cli;
pub mod config;
pub mod diff;
pub mod engine;
pub mod error;
pub mod exit;
pub mod history;
pub mod priority;
pub mod reporting;
pub mod site;
pub mod store;
pub mod types;

pub use engine::{Analysis, Baseline, RunOptions, RunOutcome, RunReport};
pub use error::{A11yError, Result};
pub use site::SiteId;
pub use types::{AggregatedRule, HistoryPoint, Impact, ScanRecord, Snapshot};
