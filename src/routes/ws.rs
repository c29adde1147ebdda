//! WebSocket handler — the transport side of presence.
//!
//! DESIGN
//! ======
//! On upgrade, registers the socket with the presence hub and enters a
//! `select!` loop:
//! - Incoming text frames → intake (registry upsert or click enqueue)
//! - Messages queued by the broadcast tick → serialize and send
//!
//! The handler never decides who hears what. It only feeds intake and
//! drains its own outbound queue.
//!
//! LIFECYCLE
//! =========
//! 1. Upgrade → `Presence::connect` (no user record yet)
//! 2. First `positionChange` → record inserted, connection bound
//! 3. Close, error, or end of stream → `Presence::disconnect` removes the
//!    connection's records before the handler returns

use axum::extract::State;
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::response::Response;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::intake::{self, Intake};
use crate::protocol::{ServerMessage, encode_server_message};
use crate::registry::{ConnectionId, Upsert};
use crate::state::AppState;

/// Per-connection outbound queue depth. A client this far behind starts
/// losing broadcast messages rather than stalling the tick.
const OUTBOUND_QUEUE_CAPACITY: usize = 64;

// =============================================================================
// UPGRADE
// =============================================================================

pub async fn handle_ws(State(state): State<AppState>, ws: WebSocketUpgrade) -> Response {
    ws.on_upgrade(move |socket| run_ws(socket, state))
}

// =============================================================================
// CONNECTION
// =============================================================================

async fn run_ws(mut socket: WebSocket, state: AppState) {
    let (client_tx, mut client_rx) = mpsc::channel::<ServerMessage>(OUTBOUND_QUEUE_CAPACITY);
    let (conn, clients) = {
        let mut presence = state.presence.write().await;
        let conn = presence.connect(client_tx);
        (conn, presence.connection_count())
    };

    info!(%conn, clients, "ws: client connected");

    loop {
        tokio::select! {
            msg = socket.recv() => {
                let Some(msg) = msg else { break };
                let msg = match msg {
                    Ok(msg) => msg,
                    Err(e) => {
                        debug!(%conn, error = %e, "ws: receive failed");
                        break;
                    }
                };
                match msg {
                    Message::Text(text) => {
                        process_inbound_text(&state, conn, &text).await;
                    }
                    Message::Close(_) => break,
                    _ => {}
                }
            }
            Some(message) = client_rx.recv() => {
                if send_message(&mut socket, conn, &message).await.is_err() {
                    break;
                }
            }
        }
    }

    let (removed, remaining) = {
        let mut presence = state.presence.write().await;
        let removed = presence.disconnect(conn);
        if presence.registry.is_empty() {
            debug!(%conn, "ws: last user left");
        }
        (removed, presence.registry.len())
    };
    if removed.is_empty() {
        info!(%conn, "ws: client disconnected");
    }
    for user in removed {
        info!(%conn, id = %user.id, name = %user.name, remaining, "ws: user disconnected");
    }
}

// =============================================================================
// INBOUND
// =============================================================================

/// Apply one text frame. Bad frames are logged and dropped; the connection
/// stays open.
async fn process_inbound_text(state: &AppState, conn: ConnectionId, text: &str) -> Option<Intake> {
    let mut presence = state.presence.write().await;
    match intake::handle_text(&mut presence, conn, text) {
        Ok(outcome) => {
            match outcome {
                Intake::Position(Upsert::Inserted) => {
                    info!(%conn, users = presence.registry.len(), "ws: user registered");
                }
                Intake::Click { queued: false } => debug!(%conn, "ws: click not queued"),
                Intake::Position(Upsert::Updated) | Intake::Click { queued: true } => {}
            }
            Some(outcome)
        }
        Err(e) => {
            warn!(%conn, code = e.error_code(), error = %e, "ws: dropping invalid frame");
            None
        }
    }
}

// =============================================================================
// OUTBOUND
// =============================================================================

/// Write one message to the socket. A message that fails to serialize is
/// skipped; only a broken socket is an error.
async fn send_message(socket: &mut WebSocket, conn: ConnectionId, message: &ServerMessage) -> Result<(), ()> {
    let json = match encode_server_message(message) {
        Ok(j) => j,
        Err(e) => {
            warn!(%conn, kind = message.kind(), error = %e, "ws: failed to serialize message");
            return Ok(());
        }
    };
    socket.send(Message::Text(json.into())).await.map_err(|e| {
        debug!(%conn, kind = message.kind(), error = %e, "ws: send failed");
    })
}

#[cfg(test)]
#[path = "ws_test.rs"]
mod tests;
