//! Batch query engine.
//!
//! This module provides [`BatchChecker`], which runs one base's candidate
//! domains through a live status connection: one request per batch, then a
//! receive loop that ends when the batch is fully answered or the connection
//! stays idle for longer than the idle timeout.

use crate::error::DomainSweepError;
use crate::progress::ProgressReporter;
use crate::protocols::{parse_status_response, StatusConnection};
use crate::types::{BaseResult, CompletionStatus, DomainRecord, SweepConfig};
use crate::utils::partition_batches;
use std::collections::{HashMap, HashSet};
use std::time::Duration;
use tracing::{debug, warn};

/// Sends candidate domains in bounded batches and collects the responses.
///
/// Batches are strictly sequential: the next request is sent only after the
/// previous batch's receive loop has ended, so the idle timeout always
/// applies to exactly one outstanding batch.
///
/// # Example
///
/// ```rust,no_run
/// use domain_sweep_lib::{BatchChecker, Connector, NoProgress, ServiceConfig, WsConnector};
/// use std::time::Duration;
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let connector = WsConnector::new(ServiceConfig::default());
///     let mut connection = connector.connect().await?;
///     let checker = BatchChecker::new(50, Duration::from_secs(5));
///
///     let domains = vec!["acme.com".to_string(), "acme.net".to_string()];
///     let result = checker
///         .process_base("acme", &domains, connection.as_mut(), &NoProgress)
///         .await?;
///     println!("{} answered, complete: {}", result.records.len(), result.is_complete());
///     Ok(())
/// }
/// ```
#[derive(Debug, Clone)]
pub struct BatchChecker {
    batch_size: usize,
    idle_timeout: Duration,
}

impl BatchChecker {
    /// Create a checker. A batch size of zero is treated as one.
    pub fn new(batch_size: usize, idle_timeout: Duration) -> Self {
        Self {
            batch_size: batch_size.max(1),
            idle_timeout,
        }
    }

    pub fn from_config(config: &SweepConfig) -> Self {
        Self::new(config.batch_size, config.idle_timeout)
    }

    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    pub fn idle_timeout(&self) -> Duration {
        self.idle_timeout
    }

    /// Query every candidate domain of one base.
    ///
    /// # Returns
    ///
    /// A [`BaseResult`] whose records follow candidate order. Its status is
    /// `Complete` only if every batch was fully answered; otherwise it is
    /// `TimedOut` and holds the partial records.
    ///
    /// # Errors
    ///
    /// Returns `DomainSweepError::Connection` if the transport fails or the
    /// server closes the connection mid-base. No records are returned in
    /// that case; the base must be retried from its first domain.
    pub async fn process_base<C>(
        &self,
        base: &str,
        domains: &[String],
        connection: &mut C,
        progress: &dyn ProgressReporter,
    ) -> Result<BaseResult, DomainSweepError>
    where
        C: StatusConnection + ?Sized,
    {
        let batches = partition_batches(domains, self.batch_size);
        let mut answered: HashMap<String, DomainRecord> = HashMap::new();
        let mut status = CompletionStatus::Complete;

        for (index, batch) in batches.iter().enumerate() {
            let req_id = connection.send_batch(batch).await?;
            debug!(base, req_id = %req_id, batch = index + 1, size = batch.len(), "batch sent");

            let fully_answered = self.collect_batch(connection, batch, &mut answered).await?;
            if !fully_answered {
                status = CompletionStatus::TimedOut;
                warn!(
                    base,
                    req_id = %req_id,
                    idle_timeout = ?self.idle_timeout,
                    "batch went idle with unanswered domains"
                );
            }

            progress.on_batch_done(base, index + 1, batches.len(), answered.len(), domains.len());
        }

        let mut records = Vec::with_capacity(answered.len());
        let mut unanswered = Vec::new();
        for domain in domains {
            match answered.remove(&domain.to_lowercase()) {
                Some(record) => records.push(record),
                None => unanswered.push(domain.clone()),
            }
        }

        Ok(BaseResult {
            base: base.to_string(),
            records,
            status,
            unanswered,
            batches_sent: batches.len(),
        })
    }

    /// Receive responses for one batch.
    ///
    /// Returns `Ok(true)` once every domain of the batch is answered and
    /// `Ok(false)` when the idle timeout elapses first. Any inbound frame
    /// restarts the idle clock, even one that is not a usable response.
    async fn collect_batch<C>(
        &self,
        connection: &mut C,
        batch: &[String],
        answered: &mut HashMap<String, DomainRecord>,
    ) -> Result<bool, DomainSweepError>
    where
        C: StatusConnection + ?Sized,
    {
        let members: HashSet<String> = batch.iter().map(|d| d.to_lowercase()).collect();
        let mut pending = members.clone();

        while !pending.is_empty() {
            let text = match tokio::time::timeout(self.idle_timeout, connection.next_text()).await {
                Err(_) => return Ok(false),
                Ok(Ok(Some(text))) => text,
                Ok(Ok(None)) => {
                    return Err(DomainSweepError::connection(
                        "Server closed the connection with requests outstanding",
                    ))
                }
                Ok(Err(e)) => return Err(e),
            };

            let Some(record) = parse_status_response(&text) else {
                debug!("ignoring frame that is not a status response");
                continue;
            };

            if !members.contains(&record.domain) {
                debug!(domain = %record.domain, "ignoring response for a domain outside the batch");
                continue;
            }

            pending.remove(&record.domain);
            answered.insert(record.domain.clone(), record);
        }

        Ok(true)
    }
}
