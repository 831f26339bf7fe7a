//! Protocol implementation for the domain status service.
//!
//! This module contains the JSON wire format and the WebSocket transport
//! used to send batch requests and receive per-domain responses.

/// Request/response message format
pub mod messages;

/// WebSocket connection and connector
pub mod websocket;

// Re-export commonly used functions and types
pub use messages::{build_status_request, format_req_id, parse_status_response};
pub use websocket::{Connector, StatusConnection, WsConnection, WsConnector};
