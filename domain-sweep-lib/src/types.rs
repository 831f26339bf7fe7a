//! Core data types for domain sweeps.
//!
//! This module defines the records produced by the status service, the
//! price/category join types, per-base outcomes and the sweep configuration.

use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Default WebSocket endpoint of the domain status service.
pub const DEFAULT_SERVICE_URL: &str =
    "wss://domains-ws.revved.com/v1/ws?batch=false&whois=true&trace=true";

/// Origin header sent during the WebSocket handshake.
pub const DEFAULT_ORIGIN: &str = "https://www.namecheap.com";

/// User agent sent during the WebSocket handshake.
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) \
     AppleWebKit/537.36 (KHTML, like Gecko) Chrome/143.0.0.0 Safari/537.36";

/// Default ledger path.
pub const DEFAULT_LEDGER_PATH: &str = "ws_domain_status.csv";

/// Result of one domain status lookup, as stored in the ledger.
///
/// Field order matches the ledger's column order:
/// `domain, available, lookupType, extra_json`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DomainRecord {
    /// Fully qualified domain (e.g., "acme.com"), lowercase
    pub domain: String,

    /// Whether the service reported the domain as available
    #[serde(deserialize_with = "deserialize_flexible_bool")]
    pub available: bool,

    /// Lookup method reported by the service (opaque string)
    #[serde(rename = "lookupType", default)]
    pub lookup_type: String,

    /// Compact JSON of the service's `extra` payload (`null` when absent)
    #[serde(default = "null_json")]
    pub extra_json: String,
}

impl DomainRecord {
    pub fn new<D: Into<String>, L: Into<String>>(domain: D, available: bool, lookup_type: L) -> Self {
        Self {
            domain: domain.into(),
            available,
            lookup_type: lookup_type.into(),
            extra_json: null_json(),
        }
    }

    pub fn with_extra_json<E: Into<String>>(mut self, extra_json: E) -> Self {
        self.extra_json = extra_json.into();
        self
    }
}

fn null_json() -> String {
    "null".to_string()
}

/// Ledgers written by earlier tools use `True`/`False`; accept both spellings.
fn deserialize_flexible_bool<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    match raw.trim().to_lowercase().as_str() {
        "true" | "1" | "yes" => Ok(true),
        "false" | "0" | "no" | "" | "none" => Ok(false),
        other => Err(serde::de::Error::custom(format!(
            "invalid availability value '{}'",
            other
        ))),
    }
}

/// Registration prices for one TLD.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PriceEntry {
    pub tld: String,
    /// First-year registration price
    pub regular: Decimal,
    /// Yearly renewal price
    pub renewal: Decimal,
}

/// Marketing category for one TLD (e.g. "tech", "geographic").
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryEntry {
    pub tld: String,
    pub category: String,
}

/// An available domain joined with its TLD's price and category.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PricedRecord {
    pub record: DomainRecord,
    /// TLD matched by longest suffix (e.g. "co.uk")
    pub tld: String,
    /// Category, empty when the category table has no entry
    pub category: String,
    /// Price shown to the buyer; the first-year registration price
    pub price: Decimal,
    pub regular: Decimal,
    pub renewal: Decimal,
}

/// How a base's receive loops ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompletionStatus {
    /// Every candidate domain received a response
    Complete,

    /// At least one chunk hit the idle timeout with unanswered domains
    TimedOut,
}

/// Records collected for one base by the batch checker.
#[derive(Debug, Clone)]
pub struct BaseResult {
    pub base: String,
    /// Records in candidate order (only answered domains)
    pub records: Vec<DomainRecord>,
    pub status: CompletionStatus,
    /// Candidate domains that never received a response
    pub unanswered: Vec<String>,
    /// Number of request messages sent
    pub batches_sent: usize,
}

impl BaseResult {
    pub fn is_complete(&self) -> bool {
        self.status == CompletionStatus::Complete
    }
}

/// What to do when a base fails with a connection error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FailurePolicy {
    /// Abort the run on the first connection error
    #[serde(rename = "fail-fast")]
    FailFast,

    /// Abandon the base, reconnect and continue with the next one
    #[serde(rename = "skip")]
    SkipAndContinue,
}

/// What to do with the partial records of a timed-out base.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TimeoutPolicy {
    /// Drop the partial records; the base is retried in full next run
    #[serde(rename = "discard")]
    Discard,

    /// Append the partial records to a sidecar file that resume never reads
    #[serde(rename = "sidecar")]
    Sidecar,
}

impl std::str::FromStr for FailurePolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "fail-fast" | "failfast" | "abort" => Ok(Self::FailFast),
            "skip" | "skip-and-continue" | "continue" => Ok(Self::SkipAndContinue),
            other => Err(format!(
                "unknown failure policy '{}', use 'fail-fast' or 'skip'",
                other
            )),
        }
    }
}

impl std::str::FromStr for TimeoutPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "discard" => Ok(Self::Discard),
            "sidecar" | "keep-partial" => Ok(Self::Sidecar),
            other => Err(format!(
                "unknown timeout policy '{}', use 'discard' or 'sidecar'",
                other
            )),
        }
    }
}

impl std::fmt::Display for FailurePolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FailurePolicy::FailFast => write!(f, "fail-fast"),
            FailurePolicy::SkipAndContinue => write!(f, "skip"),
        }
    }
}

impl std::fmt::Display for TimeoutPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TimeoutPolicy::Discard => write!(f, "discard"),
            TimeoutPolicy::Sidecar => write!(f, "sidecar"),
        }
    }
}

/// Connection settings for the domain status service.
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    /// WebSocket URL (ws:// or wss://)
    pub url: String,
    /// Origin header for the handshake
    pub origin: String,
    /// User-Agent header for the handshake
    pub user_agent: String,
    /// Maximum time to complete the handshake
    pub connect_timeout: Duration,
    /// Maximum time to wait for a graceful close
    pub close_timeout: Duration,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            url: DEFAULT_SERVICE_URL.to_string(),
            origin: DEFAULT_ORIGIN.to_string(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            connect_timeout: Duration::from_secs(10),
            close_timeout: Duration::from_secs(5),
        }
    }
}

/// Output file locations.
#[derive(Debug, Clone)]
pub struct OutputPaths {
    /// Append-only ledger (main output)
    pub ledger: PathBuf,
    /// Optional available-only export
    pub available: Option<PathBuf>,
    /// Optional priced export (requires a price table)
    pub priced: Option<PathBuf>,
}

impl Default for OutputPaths {
    fn default() -> Self {
        Self {
            ledger: PathBuf::from(DEFAULT_LEDGER_PATH),
            available: None,
            priced: None,
        }
    }
}

/// Configuration options for a sweep.
#[derive(Debug, Clone)]
pub struct SweepConfig {
    /// Maximum domains per request message
    /// Default: 50
    pub batch_size: usize,

    /// Time without inbound messages before a chunk's receive loop gives up
    /// Default: 5 seconds
    pub idle_timeout: Duration,

    /// Treat bases as complete domains (no TLD expansion)
    /// Default: false
    pub no_tlds: bool,

    /// Behaviour on connection errors
    /// Default: fail-fast
    pub failure_policy: FailurePolicy,

    /// Behaviour for partial results of timed-out bases
    /// Default: discard
    pub timeout_policy: TimeoutPolicy,

    pub service: ServiceConfig,

    pub output: OutputPaths,
}

impl Default for SweepConfig {
    fn default() -> Self {
        Self {
            batch_size: 50,
            idle_timeout: Duration::from_secs(5),
            no_tlds: false,
            failure_policy: FailurePolicy::FailFast,
            timeout_policy: TimeoutPolicy::Discard,
            service: ServiceConfig::default(),
            output: OutputPaths::default(),
        }
    }
}

impl SweepConfig {
    /// Set the batch size. Zero is bumped to one.
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    pub fn with_idle_timeout(mut self, idle_timeout: Duration) -> Self {
        self.idle_timeout = idle_timeout;
        self
    }

    pub fn with_no_tlds(mut self, no_tlds: bool) -> Self {
        self.no_tlds = no_tlds;
        self
    }

    pub fn with_failure_policy(mut self, policy: FailurePolicy) -> Self {
        self.failure_policy = policy;
        self
    }

    pub fn with_timeout_policy(mut self, policy: TimeoutPolicy) -> Self {
        self.timeout_policy = policy;
        self
    }

    pub fn with_service_url<U: Into<String>>(mut self, url: U) -> Self {
        self.service.url = url.into();
        self
    }

    pub fn with_ledger<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.output.ledger = path.into();
        self
    }

    pub fn with_available_out<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.output.available = Some(path.into());
        self
    }

    pub fn with_priced_out<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.output.priced = Some(path.into());
        self
    }
}

/// Final state of one base within a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BaseOutcome {
    /// Ledger already held every candidate domain
    AlreadyComplete { domains: usize },
    /// All records committed to the ledger this run
    Completed { records: usize },
    /// Idle timeout; nothing committed to the ledger
    TimedOut { answered: usize, expected: usize },
    /// Connection error; nothing committed
    Failed { message: String },
}

/// Files regenerated by the enrichment pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExportSummary {
    pub available_rows: Option<usize>,
    pub priced_rows: Option<usize>,
}

/// Counts reported at the end of a run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub total_bases: usize,
    pub completed: usize,
    pub already_complete: usize,
    pub timed_out: usize,
    pub failed: usize,
    pub records_written: usize,
    pub exports: ExportSummary,
}

impl RunSummary {
    /// True when no base was left for a later run.
    pub fn all_complete(&self) -> bool {
        self.timed_out == 0 && self.failed == 0
    }
}
