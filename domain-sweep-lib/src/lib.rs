//! # Domain Sweep Library
//!
//! Batched domain availability sweeps over a WebSocket status service, with
//! a resumable CSV ledger and an optional price/category enrichment pass.
//!
//! Bases (e.g. "acme") are expanded across a TLD table into candidate
//! domains, queried in bounded batches over one connection, and committed to
//! the ledger one whole base at a time. A later run skips every base the
//! ledger already covers.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use domain_sweep_lib::{SweepConfig, SweepRunner, WsConnector};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = SweepConfig::default();
//!     let connector = WsConnector::new(config.service.clone());
//!     let mut runner = SweepRunner::new(config, Box::new(connector));
//!
//!     let bases = vec!["acme".to_string()];
//!     let tlds = vec!["com".to_string(), "net".to_string()];
//!     let summary = runner.run(&bases, &tlds).await?;
//!
//!     println!("committed {} records", summary.records_written);
//!     Ok(())
//! }
//! ```
//!
//! ## Features
//!
//! - **Whole-base commits**: a base is written with one append or not at all
//! - **Resume**: completed bases are detected from the ledger itself
//! - **Idle-timeout completion**: each batch ends when fully answered or idle
//! - **Enrichment**: available-only and priced exports from the full ledger

// Re-export main public API types and functions
pub use checker::BatchChecker;
pub use config::{
    load_env_config, load_env_config_from, parse_duration_string, ConfigManager, EnvConfig,
    FileConfig,
};
pub use enrich::{
    collapse_duplicates, join_prices, join_prices_with_tlds, load_category_table,
    load_price_table, write_priced_csv, write_records_csv, CategoryTable, PriceTable,
};
pub use error::DomainSweepError;
pub use input::{load_bases, load_tlds, parse_bases, parse_tlds};
pub use ledger::{OutputLedger, ResumeState};
pub use progress::{NoProgress, ProgressReporter};
pub use protocols::{Connector, StatusConnection, WsConnection, WsConnector};
pub use runner::{BasePlan, Enrichment, SweepPlan, SweepRunner};
pub use types::{
    BaseOutcome, BaseResult, CategoryEntry, CompletionStatus, DomainRecord, ExportSummary,
    FailurePolicy, OutputPaths, PriceEntry, PricedRecord, RunSummary, ServiceConfig, SweepConfig,
    TimeoutPolicy, DEFAULT_LEDGER_PATH, DEFAULT_SERVICE_URL,
};
pub use utils::{expand, extract_tld, partition_batches};

// Public modules
pub mod config;
pub mod protocols;

// Internal modules - these are not part of the public API
mod checker;
mod enrich;
mod error;
mod input;
mod ledger;
mod progress;
mod runner;
mod types;
mod utils;

#[cfg(test)]
mod testing;

// Type alias for convenience
pub type Result<T> = std::result::Result<T, DomainSweepError>;

// Library version and metadata
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const AUTHOR: &str = env!("CARGO_PKG_AUTHORS");

/// Get library information for debugging or display purposes.
pub fn info() -> LibraryInfo {
    LibraryInfo {
        version: VERSION,
        author: AUTHOR,
        default_service: DEFAULT_SERVICE_URL,
    }
}

/// Information about the library build
#[derive(Debug, Clone)]
pub struct LibraryInfo {
    pub version: &'static str,
    pub author: &'static str,
    pub default_service: &'static str,
}
