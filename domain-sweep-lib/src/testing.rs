//! Scripted status connections for unit tests.

use crate::error::DomainSweepError;
use crate::protocols::{format_req_id, Connector, StatusConnection};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// One scripted inbound event.
#[derive(Debug, Clone)]
pub(crate) enum Reply {
    Frame(String),
    Close,
    Fail,
}

/// Replies produced for each request, given the request's domains.
pub(crate) type Script = Arc<dyn Fn(&[String]) -> Vec<Reply> + Send + Sync>;

pub(crate) fn script<F>(f: F) -> Script
where
    F: Fn(&[String]) -> Vec<Reply> + Send + Sync + 'static,
{
    Arc::new(f)
}

/// Answer every requested domain, availability decided by `available`.
pub(crate) fn answer_all(available: fn(&str) -> bool) -> Script {
    script(move |batch| {
        batch
            .iter()
            .map(|d| Reply::Frame(status_frame(d, available(d))))
            .collect()
    })
}

pub(crate) fn status_frame(domain: &str, available: bool) -> String {
    serde_json::json!({
        "type": "domainStatusResponse",
        "data": {"name": domain, "available": available, "lookupType": "whois"}
    })
    .to_string()
}

/// Connection that replays the script after each request.
///
/// Once the queued replies run out it never yields again, so the caller's
/// idle timeout fires.
pub(crate) struct ScriptedConnection {
    script: Script,
    queue: VecDeque<Reply>,
    log: Arc<Mutex<Vec<Vec<String>>>>,
    next_req: u64,
}

impl ScriptedConnection {
    pub(crate) fn new(script: Script) -> Self {
        Self::with_log(script, Arc::new(Mutex::new(Vec::new())))
    }

    fn with_log(script: Script, log: Arc<Mutex<Vec<Vec<String>>>>) -> Self {
        Self {
            script,
            queue: VecDeque::new(),
            log,
            next_req: 1,
        }
    }

    /// Requests sent so far, in order.
    pub(crate) fn sent(&self) -> Vec<Vec<String>> {
        self.log.lock().unwrap().clone()
    }
}

#[async_trait]
impl StatusConnection for ScriptedConnection {
    async fn send_batch(&mut self, domains: &[String]) -> Result<String, DomainSweepError> {
        self.log.lock().unwrap().push(domains.to_vec());
        self.queue.extend((self.script)(domains));
        let req_id = format_req_id(self.next_req);
        self.next_req += 1;
        Ok(req_id)
    }

    async fn next_text(&mut self) -> Result<Option<String>, DomainSweepError> {
        match self.queue.pop_front() {
            Some(Reply::Frame(text)) => Ok(Some(text)),
            Some(Reply::Close) => Ok(None),
            Some(Reply::Fail) => Err(DomainSweepError::connection("scripted failure")),
            None => std::future::pending().await,
        }
    }

    async fn close(&mut self) -> Result<(), DomainSweepError> {
        Ok(())
    }
}

/// Connector handing out scripted connections that share one request log.
pub(crate) struct ScriptedConnector {
    script: Script,
    log: Arc<Mutex<Vec<Vec<String>>>>,
    connects: Arc<AtomicUsize>,
    refuse: bool,
}

impl ScriptedConnector {
    pub(crate) fn new(script: Script) -> Self {
        Self {
            script,
            log: Arc::new(Mutex::new(Vec::new())),
            connects: Arc::new(AtomicUsize::new(0)),
            refuse: false,
        }
    }

    /// A connector whose every connection attempt fails.
    pub(crate) fn refusing() -> Self {
        Self {
            refuse: true,
            ..Self::new(answer_all(|_| false))
        }
    }

    pub(crate) fn log(&self) -> Arc<Mutex<Vec<Vec<String>>>> {
        Arc::clone(&self.log)
    }

    pub(crate) fn connects(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.connects)
    }
}

#[async_trait]
impl Connector for ScriptedConnector {
    async fn connect(&self) -> Result<Box<dyn StatusConnection>, DomainSweepError> {
        self.connects.fetch_add(1, Ordering::SeqCst);
        if self.refuse {
            return Err(DomainSweepError::connection("connection refused"));
        }
        Ok(Box::new(ScriptedConnection::with_log(
            Arc::clone(&self.script),
            Arc::clone(&self.log),
        )))
    }
}
