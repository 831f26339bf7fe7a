//! Run orchestration.
//!
//! [`SweepRunner`] sequences bases through the ledger, the expander and the
//! batch checker, one base at a time over a single connection, and runs the
//! export pass once every base is complete.

use crate::checker::BatchChecker;
use crate::enrich::{
    collapse_duplicates, join_prices_with_tlds, write_priced_csv, write_records_csv,
    CategoryTable, PriceTable,
};
use crate::error::DomainSweepError;
use crate::ledger::{OutputLedger, ResumeState};
use crate::progress::{NoProgress, ProgressReporter};
use crate::protocols::{Connector, StatusConnection};
use crate::types::{
    BaseOutcome, BaseResult, DomainRecord, ExportSummary, FailurePolicy, RunSummary, SweepConfig,
    TimeoutPolicy,
};
use crate::utils::expand;
use std::collections::HashSet;
use tracing::{debug, info, warn};

/// Price and category tables used by the priced export.
#[derive(Debug, Clone, Default)]
pub struct Enrichment {
    pub prices: PriceTable,
    pub categories: CategoryTable,
}

/// Resume plan for one base.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BasePlan {
    pub base: String,
    /// Number of candidate domains
    pub domains: usize,
    /// Candidates that already have a ledger row
    pub recorded: usize,
    pub complete: bool,
}

/// Resume plan for a whole run, computed without connecting.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SweepPlan {
    pub bases: Vec<BasePlan>,
    pub batch_size: usize,
}

impl SweepPlan {
    pub fn pending_bases(&self) -> usize {
        self.bases.iter().filter(|b| !b.complete).count()
    }

    pub fn complete_bases(&self) -> usize {
        self.bases.len() - self.pending_bases()
    }

    /// Domains that will be queried, counting every candidate of a pending base.
    pub fn pending_domains(&self) -> usize {
        self.bases.iter().filter(|b| !b.complete).map(|b| b.domains).sum()
    }

    /// Requests that will be sent if every pending base is queried.
    pub fn pending_batches(&self) -> usize {
        let size = self.batch_size.max(1);
        self.bases
            .iter()
            .filter(|b| !b.complete)
            .map(|b| b.domains.div_ceil(size))
            .sum()
    }
}

/// Drives a sweep from resume scan to exports.
///
/// # Example
///
/// ```rust,no_run
/// use domain_sweep_lib::{SweepConfig, SweepRunner, WsConnector};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let config = SweepConfig::default().with_available_out("available.csv");
///     let connector = WsConnector::new(config.service.clone());
///     let mut runner = SweepRunner::new(config, Box::new(connector));
///
///     let bases = vec!["acme".to_string()];
///     let tlds = vec!["com".to_string(), "net".to_string()];
///     let summary = runner.run(&bases, &tlds).await?;
///     println!("{} bases committed", summary.completed);
///     Ok(())
/// }
/// ```
pub struct SweepRunner {
    config: SweepConfig,
    connector: Box<dyn Connector>,
    progress: Box<dyn ProgressReporter>,
    enrichment: Option<Enrichment>,
    ledger: OutputLedger,
}

impl SweepRunner {
    pub fn new(config: SweepConfig, connector: Box<dyn Connector>) -> Self {
        let ledger = OutputLedger::new(config.output.ledger.clone());
        Self {
            config,
            connector,
            progress: Box::new(NoProgress),
            enrichment: None,
            ledger,
        }
    }

    pub fn with_progress(mut self, progress: Box<dyn ProgressReporter>) -> Self {
        self.progress = progress;
        self
    }

    pub fn with_enrichment(mut self, enrichment: Enrichment) -> Self {
        self.enrichment = Some(enrichment);
        self
    }

    pub fn config(&self) -> &SweepConfig {
        &self.config
    }

    pub fn ledger(&self) -> &OutputLedger {
        &self.ledger
    }

    /// Compute which bases are pending without touching the network.
    pub fn plan(&self, bases: &[String], tlds: &[String]) -> Result<SweepPlan, DomainSweepError> {
        let resume = self.ledger.resume_state()?;
        Ok(self.plan_with(&resume, &unique_bases(bases), tlds))
    }

    fn plan_with(&self, resume: &ResumeState, bases: &[String], tlds: &[String]) -> SweepPlan {
        let bases = bases
            .iter()
            .map(|base| {
                let domains = expand(base, tlds, self.config.no_tlds);
                BasePlan {
                    base: base.clone(),
                    domains: domains.len(),
                    recorded: resume.recorded_count(&domains),
                    complete: resume.is_complete(&domains),
                }
            })
            .collect();

        SweepPlan {
            bases,
            batch_size: self.config.batch_size,
        }
    }

    /// Run the sweep.
    ///
    /// Bases already complete in the ledger are skipped. Each remaining base
    /// is queried in full and committed with one append, or not at all.
    /// Repeated bases are processed once, and a domain shared by two bases is
    /// only queried for the first of them.
    ///
    /// # Errors
    ///
    /// Ledger and export I/O errors abort the run. A connection error aborts
    /// it under [`FailurePolicy::FailFast`]; under
    /// [`FailurePolicy::SkipAndContinue`] the base is counted as failed and
    /// the next base starts on a fresh connection.
    pub async fn run(
        &mut self,
        bases: &[String],
        tlds: &[String],
    ) -> Result<RunSummary, DomainSweepError> {
        if self.config.output.priced.is_some() && self.enrichment.is_none() {
            return Err(DomainSweepError::config(
                "A priced export needs a price table",
            ));
        }

        let bases = unique_bases(bases);
        let mut resume = self.ledger.resume_state()?;
        let plan = self.plan_with(&resume, &bases, tlds);

        info!(
            ledger = %self.ledger.path().display(),
            bases = bases.len(),
            pending = plan.pending_bases(),
            recorded = resume.len(),
            "starting sweep"
        );
        self.progress.on_run_start(bases.len(), plan.pending_bases());

        let mut summary = RunSummary {
            total_bases: bases.len(),
            ..Default::default()
        };
        let mut connection: Option<Box<dyn StatusConnection>> = None;

        let outcome = self
            .run_bases(&bases, tlds, &mut resume, &mut connection, &mut summary)
            .await;

        if let Some(mut open) = connection.take() {
            // close errors are already logged by the connection
            let _ = open.close().await;
        }
        outcome?;

        if summary.all_complete() {
            summary.exports = self.export(tlds)?;
        } else if self.config.output.available.is_some() || self.config.output.priced.is_some() {
            warn!(
                timed_out = summary.timed_out,
                failed = summary.failed,
                "skipping exports until every base is complete"
            );
        }

        info!(
            completed = summary.completed,
            already_complete = summary.already_complete,
            timed_out = summary.timed_out,
            failed = summary.failed,
            records = summary.records_written,
            "sweep finished"
        );
        self.progress.on_run_finished(&summary);
        Ok(summary)
    }

    async fn run_bases(
        &mut self,
        bases: &[String],
        tlds: &[String],
        resume: &mut ResumeState,
        connection: &mut Option<Box<dyn StatusConnection>>,
        summary: &mut RunSummary,
    ) -> Result<(), DomainSweepError> {
        let checker = BatchChecker::from_config(&self.config);
        // domains committed by earlier bases of this run
        let mut committed: HashSet<String> = HashSet::new();

        for (index, base) in bases.iter().enumerate() {
            let mut domains = expand(base, tlds, self.config.no_tlds);

            if resume.is_complete(&domains) {
                debug!(base = %base, "already complete, skipping");
                summary.already_complete += 1;
                self.progress.on_base_finished(
                    base,
                    &BaseOutcome::AlreadyComplete {
                        domains: domains.len(),
                    },
                );
                continue;
            }

            let before = domains.len();
            domains.retain(|domain| !committed.contains(domain));
            if domains.len() < before {
                debug!(
                    base = %base,
                    shared = before - domains.len(),
                    "skipping domains already committed in this run"
                );
            }

            let batches = domains.len().div_ceil(checker.batch_size());
            self.progress
                .on_base_start(base, index + 1, bases.len(), domains.len(), batches);

            let result = self.query_base(&checker, connection, base, &domains).await;
            let outcome = match result {
                Ok(result) if result.is_complete() => {
                    self.ledger.append_base(base, &result.records)?;
                    resume.mark_recorded(&result.records);
                    committed.extend(result.records.iter().map(|r| r.domain.clone()));
                    summary.completed += 1;
                    summary.records_written += result.records.len();
                    info!(base = %base, records = result.records.len(), "base committed");
                    BaseOutcome::Completed {
                        records: result.records.len(),
                    }
                }
                Ok(result) => {
                    summary.timed_out += 1;
                    self.handle_timeout(&result)?
                }
                Err(e) if e.is_retryable() => {
                    summary.failed += 1;
                    warn!(base = %base, error = %e, policy = %self.config.failure_policy, "base abandoned");
                    self.progress.on_base_finished(
                        base,
                        &BaseOutcome::Failed {
                            message: e.to_string(),
                        },
                    );
                    match self.config.failure_policy {
                        FailurePolicy::FailFast => return Err(e),
                        FailurePolicy::SkipAndContinue => continue,
                    }
                }
                Err(e) => return Err(e),
            };

            self.progress.on_base_finished(base, &outcome);
        }

        Ok(())
    }

    /// Query one base, opening a connection first if none is open.
    ///
    /// The connection is kept for the next base only if this one finished
    /// without a transport error.
    async fn query_base(
        &self,
        checker: &BatchChecker,
        connection: &mut Option<Box<dyn StatusConnection>>,
        base: &str,
        domains: &[String],
    ) -> Result<BaseResult, DomainSweepError> {
        let mut open = match connection.take() {
            Some(open) => open,
            None => self.connector.connect().await?,
        };

        let result = checker
            .process_base(base, domains, open.as_mut(), self.progress.as_ref())
            .await;
        if result.is_ok() {
            *connection = Some(open);
        }
        result
    }

    fn handle_timeout(&mut self, result: &BaseResult) -> Result<BaseOutcome, DomainSweepError> {
        let expected = result.records.len() + result.unanswered.len();
        let error =
            DomainSweepError::timeout_incomplete(&result.base, result.records.len(), expected);
        warn!(
            error = %error,
            policy = %self.config.timeout_policy,
            "base left for the next run"
        );

        if self.config.timeout_policy == TimeoutPolicy::Sidecar && !result.records.is_empty() {
            self.ledger.append_partial(&result.base, &result.records)?;
        }

        Ok(BaseOutcome::TimedOut {
            answered: result.records.len(),
            expected,
        })
    }

    /// Regenerate the configured exports from the full ledger.
    ///
    /// Returns the row counts of the files written; an export without a
    /// configured path is left untouched.
    pub fn export(&self, tlds: &[String]) -> Result<ExportSummary, DomainSweepError> {
        let output = &self.config.output;
        let mut summary = ExportSummary::default();
        if output.available.is_none() && output.priced.is_none() {
            return Ok(summary);
        }

        let records = collapse_duplicates(&self.ledger.read_records()?);

        if let Some(path) = &output.available {
            let available: Vec<DomainRecord> =
                records.iter().filter(|r| r.available).cloned().collect();
            let rows = write_records_csv(path, &available)?;
            info!(path = %path.display(), rows, "available export written");
            summary.available_rows = Some(rows);
        }

        if let Some(path) = &output.priced {
            let enrichment = self.enrichment.as_ref().ok_or_else(|| {
                DomainSweepError::config("A priced export needs a price table")
            })?;
            let priced = join_prices_with_tlds(
                &records,
                &enrichment.prices,
                &enrichment.categories,
                tlds,
            );
            let rows = write_priced_csv(path, &priced)?;
            info!(path = %path.display(), rows, "priced export written");
            summary.priced_rows = Some(rows);
        }

        Ok(summary)
    }
}

fn unique_bases(bases: &[String]) -> Vec<String> {
    let mut seen = HashSet::new();
    bases
        .iter()
        .filter(|base| seen.insert(base.as_str()))
        .cloned()
        .collect()
}
