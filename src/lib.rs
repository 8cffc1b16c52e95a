//! Fleet telematics report pipeline.
//!
//! Takes raw spreadsheet exports (usage time-logs or mileage odometer-logs),
//! cleans and derives per-row metrics, and aggregates the results into fleet
//! KPIs and exportable tables. The pipeline is a pure function of
//! (file bytes, report kind, parameters); repeat loads of identical content
//! are served from a content-addressed cache.

pub mod cache;
pub mod config;
pub mod error;
pub mod loader;
pub mod output;
pub mod reports;
pub mod types;
pub mod util;

pub use cache::MemoCache;
pub use config::FleetParams;
pub use error::ReportError;
pub use loader::{process, LoadReport};
pub use types::{CleanedTable, FleetRecord, MaintenanceBand, ReportKind, UsageRecord};
