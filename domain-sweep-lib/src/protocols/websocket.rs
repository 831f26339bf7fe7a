//! WebSocket transport for the domain status service.
//!
//! The batch checker only talks to the [`StatusConnection`] trait, and the
//! orchestrator only opens connections through [`Connector`]. The
//! tokio-tungstenite implementations below are the production ones.

use crate::error::DomainSweepError;
use crate::protocols::messages::{build_status_request, format_req_id};
use crate::types::ServiceConfig;
use async_trait::async_trait;
use futures_util::{SinkExt, StreamExt};
use std::time::Duration;
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::http::header::{HeaderValue, ORIGIN, USER_AGENT};
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};
use tracing::{debug, info};

/// A live session with the status service.
#[async_trait]
pub trait StatusConnection: Send {
    /// Send one request listing `domains`. Returns the request id used.
    async fn send_batch(&mut self, domains: &[String]) -> Result<String, DomainSweepError>;

    /// Wait for the next inbound text frame.
    ///
    /// Returns `Ok(None)` once the peer has closed the connection.
    async fn next_text(&mut self) -> Result<Option<String>, DomainSweepError>;

    /// Close the session gracefully.
    async fn close(&mut self) -> Result<(), DomainSweepError>;
}

/// Opens new sessions with the status service.
#[async_trait]
pub trait Connector: Send + Sync {
    async fn connect(&self) -> Result<Box<dyn StatusConnection>, DomainSweepError>;
}

/// Connector for the real service over `ws://` or `wss://`.
#[derive(Debug, Clone)]
pub struct WsConnector {
    service: ServiceConfig,
}

impl WsConnector {
    pub fn new(service: ServiceConfig) -> Self {
        Self { service }
    }

    pub fn service(&self) -> &ServiceConfig {
        &self.service
    }
}

#[async_trait]
impl Connector for WsConnector {
    async fn connect(&self) -> Result<Box<dyn StatusConnection>, DomainSweepError> {
        let connection = WsConnection::open(&self.service).await?;
        Ok(Box::new(connection))
    }
}

/// Session over a tokio-tungstenite stream.
pub struct WsConnection {
    stream: WebSocketStream<MaybeTlsStream<TcpStream>>,
    /// Counter for the next request id; starts at 1 per connection
    next_req: u64,
    close_timeout: Duration,
}

impl WsConnection {
    /// Perform the WebSocket handshake with the configured headers.
    pub async fn open(service: &ServiceConfig) -> Result<Self, DomainSweepError> {
        let mut request = service.url.as_str().into_client_request().map_err(|e| {
            DomainSweepError::config(format!("Invalid service URL '{}': {}", service.url, e))
        })?;

        let origin = HeaderValue::from_str(&service.origin).map_err(|e| {
            DomainSweepError::config(format!("Invalid Origin header '{}': {}", service.origin, e))
        })?;
        let user_agent = HeaderValue::from_str(&service.user_agent).map_err(|e| {
            DomainSweepError::config(format!("Invalid User-Agent header: {}", e))
        })?;
        request.headers_mut().insert(ORIGIN, origin);
        request.headers_mut().insert(USER_AGENT, user_agent);

        debug!(url = %service.url, "opening status connection");

        let (stream, _response) =
            match tokio::time::timeout(service.connect_timeout, connect_async(request)).await {
                Ok(Ok(connected)) => connected,
                Ok(Err(e)) => {
                    return Err(DomainSweepError::connection_with_source(
                        format!("Failed to connect to {}", service.url),
                        e.to_string(),
                    ))
                }
                Err(_) => {
                    return Err(DomainSweepError::connection(format!(
                        "Handshake with {} timed out after {:?}",
                        service.url, service.connect_timeout
                    )))
                }
            };

        info!(url = %service.url, "status connection established");

        Ok(Self {
            stream,
            next_req: 1,
            close_timeout: service.close_timeout,
        })
    }
}

#[async_trait]
impl StatusConnection for WsConnection {
    async fn send_batch(&mut self, domains: &[String]) -> Result<String, DomainSweepError> {
        let req_id = format_req_id(self.next_req);
        self.next_req += 1;

        let payload = build_status_request(&req_id, domains)?;
        self.stream.send(Message::Text(payload)).await?;

        debug!(req_id = %req_id, domains = domains.len(), "sent status request");
        Ok(req_id)
    }

    async fn next_text(&mut self) -> Result<Option<String>, DomainSweepError> {
        loop {
            match self.stream.next().await {
                None => return Ok(None),
                Some(Err(e)) => return Err(e.into()),
                Some(Ok(Message::Text(text))) => return Ok(Some(text)),
                Some(Ok(Message::Binary(bytes))) => match String::from_utf8(bytes) {
                    Ok(text) => return Ok(Some(text)),
                    Err(_) => debug!("ignoring non-UTF-8 binary frame"),
                },
                Some(Ok(Message::Close(frame))) => {
                    debug!(?frame, "server closed status connection");
                    return Ok(None);
                }
                // Pings are answered by tungstenite on the next read/write.
                Some(Ok(_)) => continue,
            }
        }
    }

    async fn close(&mut self) -> Result<(), DomainSweepError> {
        match tokio::time::timeout(self.close_timeout, self.stream.close(None)).await {
            Ok(Ok(())) => Ok(()),
            Ok(Err(e)) => {
                debug!(error = %e, "error while closing status connection");
                Ok(())
            }
            Err(_) => {
                debug!("close handshake timed out");
                Ok(())
            }
        }
    }
}
