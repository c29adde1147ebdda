//! Event intake — applies one inbound frame to the presence hub.
//!
//! DESIGN
//! ======
//! Intake is pure state mutation: parse, then either upsert the registry or
//! enqueue a click. It never sends anything; outbound traffic belongs to the
//! broadcast tick. Errors are returned to the transport, which logs them and
//! keeps the connection open.

use tracing::{debug, trace, warn};

use crate::protocol::{ClientMessage, ProtocolError, parse_client_message};
use crate::registry::{ConnectionId, Upsert};
use crate::state::Presence;

/// What a successfully handled frame did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Intake {
    Position(Upsert),
    /// `queued` is false when the click queue was full and the event dropped.
    Click { queued: bool },
}

/// Parse `text` from `conn` and apply it.
///
/// # Errors
///
/// Returns [`ProtocolError`] for frames that do not parse; the hub is left
/// untouched in that case.
pub fn handle_text(presence: &mut Presence, conn: ConnectionId, text: &str) -> Result<Intake, ProtocolError> {
    let message = parse_client_message(text)?;
    Ok(apply(presence, conn, message))
}

/// Apply an already-parsed message.
pub fn apply(presence: &mut Presence, conn: ConnectionId, message: ClientMessage) -> Intake {
    match message {
        ClientMessage::PositionChange(update) => {
            let id = update.id.clone();
            if let Some(record) = presence.registry.get(&id) {
                if record.conn != conn {
                    debug!(%conn, owner = %record.conn, id = %id, "intake: position change for user owned by another connection");
                }
            }
            let upsert = presence.registry.upsert_position(conn, update);
            if presence.bind(conn, &id) {
                debug!(%conn, id = %id, ?upsert, "intake: connection bound to user");
            } else {
                trace!(%conn, id = %id, ?upsert, "intake: position change");
            }
            Intake::Position(upsert)
        }
        ClientMessage::Click(click) => {
            let id = click.id.clone();
            let queued = presence.clicks.push(click);
            if queued {
                trace!(%conn, id = %id, pending = presence.clicks.len(), "intake: click queued");
            } else {
                warn!(%conn, id = %id, pending = presence.clicks.len(), "intake: click queue full, dropping click");
            }
            Intake::Click { queued }
        }
    }
}

#[cfg(test)]
#[path = "intake_test.rs"]
mod tests;
