//! Wire format of the domain status service.
//!
//! Requests list a batch of domains; the service answers with one
//! `domainStatusResponse` frame per domain, in no particular order.

use crate::error::DomainSweepError;
use crate::types::DomainRecord;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Message type of batch requests.
pub const REQUEST_TYPE: &str = "domainStatus";

/// Message type of per-domain responses.
pub const RESPONSE_TYPE: &str = "domainStatusResponse";

#[derive(Debug, Serialize)]
struct StatusRequest<'a> {
    #[serde(rename = "type")]
    kind: &'static str,
    #[serde(rename = "reqID")]
    req_id: &'a str,
    data: StatusRequestData<'a>,
}

#[derive(Debug, Serialize)]
struct StatusRequestData<'a> {
    domains: &'a [String],
}

#[derive(Debug, Deserialize)]
struct StatusEnvelope {
    #[serde(rename = "type", default)]
    kind: String,
    #[serde(default)]
    data: Option<Map<String, Value>>,
}

/// Format a request counter as a six-digit request id ("000001").
pub fn format_req_id(counter: u64) -> String {
    format!("{:06}", counter)
}

/// Serialize a batch request.
pub fn build_status_request(req_id: &str, domains: &[String]) -> Result<String, DomainSweepError> {
    let request = StatusRequest {
        kind: REQUEST_TYPE,
        req_id,
        data: StatusRequestData { domains },
    };
    Ok(serde_json::to_string(&request)?)
}

/// Parse one inbound frame into a record.
///
/// Returns `None` for frames that are not status responses: invalid JSON,
/// another message type, or a response without a domain name. Missing
/// `available` reads as `false`, missing `lookupType` as an empty string and
/// the `extra` payload is kept verbatim as compact JSON.
pub fn parse_status_response(text: &str) -> Option<DomainRecord> {
    let envelope: StatusEnvelope = serde_json::from_str(text).ok()?;
    if envelope.kind != RESPONSE_TYPE {
        return None;
    }

    let data = envelope.data?;
    let name = data.get("name")?.as_str()?.trim().to_lowercase();
    if name.is_empty() {
        return None;
    }

    let available = data
        .get("available")
        .and_then(Value::as_bool)
        .unwrap_or(false);
    let lookup_type = data
        .get("lookupType")
        .and_then(Value::as_str)
        .unwrap_or_default();
    let extra_json = data
        .get("extra")
        .map(Value::to_string)
        .unwrap_or_else(|| "null".to_string());

    Some(DomainRecord::new(name, available, lookup_type).with_extra_json(extra_json))
}
