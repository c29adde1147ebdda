//! Protocol — JSON wire types for cursor presence.
//!
//! ARCHITECTURE
//! ============
//! Every frame on the socket is a text frame carrying `{"type", "data"}`.
//! Two kinds share the channel in both directions:
//! - `positionChange`: client sends its own record, server sends everyone else's.
//! - `click`: client sends one event, server sends the batch queued this tick.
//!
//! DESIGN
//! ======
//! Inbound parsing is two-phase: the envelope first, then the payload for the
//! named kind. That keeps "unknown type" distinguishable from "bad payload"
//! so the transport can log a precise code and drop the frame.

use serde::{Deserialize, Serialize};

// =============================================================================
// TYPES
// =============================================================================

/// Wire kind tag for position frames.
pub const KIND_POSITION_CHANGE: &str = "positionChange";

/// Wire kind tag for click frames.
pub const KIND_CLICK: &str = "click";

/// One participant as seen by other clients.
///
/// Coordinates are normalized viewport fractions. `None` in either axis means
/// the position is unset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub name: String,
    pub color: String,
    pub x: Option<f64>,
    pub y: Option<f64>,
}

impl User {
    /// True once both axes have been reported.
    #[must_use]
    pub fn has_position(&self) -> bool {
        self.x.is_some() && self.y.is_some()
    }
}

/// Inbound `positionChange` payload. Carries the full record every time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PositionUpdate {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub color: String,
    pub x: Option<f64>,
    pub y: Option<f64>,
}

impl From<PositionUpdate> for User {
    fn from(update: PositionUpdate) -> Self {
        Self { id: update.id, name: update.name, color: update.color, x: update.x, y: update.y }
    }
}

/// A click, tagged with its originator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClickEvent {
    pub id: String,
    pub x: f64,
    pub y: f64,
}

/// Client → server frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "camelCase")]
pub enum ClientMessage {
    PositionChange(PositionUpdate),
    Click(ClickEvent),
}

/// Server → client frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "camelCase")]
pub enum ServerMessage {
    PositionChange(Vec<User>),
    Click(Vec<ClickEvent>),
}

impl ServerMessage {
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::PositionChange(_) => KIND_POSITION_CHANGE,
            Self::Click(_) => KIND_CLICK,
        }
    }
}

// =============================================================================
// ERRORS
// =============================================================================

#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    #[error("malformed frame: {0}")]
    Malformed(#[from] serde_json::Error),
    #[error("unknown message type: {0}")]
    UnknownType(String),
    #[error("invalid {kind} payload: {source}")]
    InvalidPayload {
        kind: &'static str,
        #[source]
        source: serde_json::Error,
    },
    #[error("{kind} payload has an empty id")]
    MissingId { kind: &'static str },
}

impl ProtocolError {
    /// Grepable code for structured logs.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Malformed(_) => "E_MALFORMED",
            Self::UnknownType(_) => "E_UNKNOWN_TYPE",
            Self::InvalidPayload { .. } => "E_INVALID_PAYLOAD",
            Self::MissingId { .. } => "E_MISSING_ID",
        }
    }
}

// =============================================================================
// PARSING
// =============================================================================

#[derive(Deserialize)]
struct Envelope {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    data: serde_json::Value,
}

/// Parse one inbound text frame.
///
/// # Errors
///
/// Returns [`ProtocolError`] when the frame is not a JSON envelope, names an
/// unknown kind, or carries a payload that does not fit that kind.
pub fn parse_client_message(text: &str) -> Result<ClientMessage, ProtocolError> {
    let envelope: Envelope = serde_json::from_str(text)?;

    match envelope.kind.as_str() {
        KIND_POSITION_CHANGE => {
            let update: PositionUpdate = payload(KIND_POSITION_CHANGE, envelope.data)?;
            if update.id.is_empty() {
                return Err(ProtocolError::MissingId { kind: KIND_POSITION_CHANGE });
            }
            Ok(ClientMessage::PositionChange(update))
        }
        KIND_CLICK => {
            let click: ClickEvent = payload(KIND_CLICK, envelope.data)?;
            if click.id.is_empty() {
                return Err(ProtocolError::MissingId { kind: KIND_CLICK });
            }
            Ok(ClientMessage::Click(click))
        }
        _ => Err(ProtocolError::UnknownType(envelope.kind)),
    }
}

fn payload<T: serde::de::DeserializeOwned>(kind: &'static str, data: serde_json::Value) -> Result<T, ProtocolError> {
    serde_json::from_value(data).map_err(|source| ProtocolError::InvalidPayload { kind, source })
}

/// Serialize a server frame for the socket.
///
/// # Errors
///
/// Returns the underlying serializer error.
pub fn encode_server_message(message: &ServerMessage) -> Result<String, serde_json::Error> {
    serde_json::to_string(message)
}

#[cfg(test)]
#[path = "protocol_test.rs"]
mod tests;
