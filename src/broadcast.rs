//! Broadcast scheduler — the fixed-rate reconciliation loop.
//!
//! DESIGN
//! ======
//! Each tick:
//! 1. Snapshot the registry and serialize it.
//! 2. If the serialization differs from the previous tick's, store it as the
//!    new baseline and send every user the positions of everyone else who has
//!    a position.
//! 3. Drain the click queue. If anything was queued, send every user the
//!    clicks not originated by them (possibly an empty list).
//! 4. Sleep for the tick period and go again.
//!
//! The baseline records what was computed, not what was delivered. Fan-out is
//! O(n²) per changed tick, which is fine for tens of users.
//!
//! ERROR HANDLING
//! ==============
//! Planning happens under the write lock; sending happens after it is
//! released, through `try_send` on each connection's bounded queue. A full or
//! closed queue is logged and skipped. One slow client never holds up the
//! others and never fails the tick.

use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tokio::task::JoinHandle;
use tracing::{debug, info, trace, warn};

use crate::protocol::{ClickEvent, ServerMessage, User};
use crate::registry::ConnectionId;
use crate::state::{AppState, Presence};

// =============================================================================
// TYPES
// =============================================================================

/// One message addressed to one connection.
#[derive(Debug, Clone, PartialEq)]
pub struct Delivery {
    pub conn: ConnectionId,
    pub message: ServerMessage,
}

/// A planned delivery paired with the sender it will go out on.
type Outbound = (ConnectionId, mpsc::Sender<ServerMessage>, ServerMessage);

/// Per-tick send accounting.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickReport {
    pub sent: usize,
    pub dropped: usize,
}

// =============================================================================
// PLANNING
// =============================================================================

/// Compute every message this tick should send. Updates the baseline and
/// drains the click queue as a side effect.
pub fn plan_tick(presence: &mut Presence) -> Vec<Delivery> {
    let mut deliveries = Vec::new();
    let recipients = presence.registry.recipients();

    let snapshot = presence.registry.snapshot();
    match serde_json::to_string(&snapshot) {
        Ok(serialized) => {
            if serialized != presence.previous_snapshot {
                presence.previous_snapshot = serialized;
                for (id, conn) in &recipients {
                    let message = ServerMessage::PositionChange(visible_to(&snapshot, id));
                    deliveries.push(Delivery { conn: *conn, message });
                }
            }
        }
        Err(e) => warn!(error = %e, "broadcast: failed to serialize snapshot"),
    }

    if !presence.clicks.is_empty() {
        let clicks = presence.clicks.drain_all();
        trace!(count = clicks.len(), recipients = recipients.len(), "broadcast: flushing clicks");
        for (id, conn) in &recipients {
            let message = ServerMessage::Click(clicks_for(&clicks, id));
            deliveries.push(Delivery { conn: *conn, message });
        }
    }

    deliveries
}

/// Users that `recipient` should see: everyone else with a position.
fn visible_to(snapshot: &[User], recipient: &str) -> Vec<User> {
    snapshot
        .iter()
        .filter(|u| u.id != recipient && u.has_position())
        .cloned()
        .collect()
}

/// Clicks that `recipient` did not originate.
fn clicks_for(clicks: &[ClickEvent], recipient: &str) -> Vec<ClickEvent> {
    clicks.iter().filter(|c| c.id != recipient).cloned().collect()
}

// =============================================================================
// DISPATCH
// =============================================================================

/// Run one tick: plan under the lock, then fan out without it.
pub async fn run_tick(state: &AppState) -> TickReport {
    let outbound: Vec<Outbound> = {
        let mut presence = state.presence.write().await;
        let deliveries = plan_tick(&mut presence);
        deliveries
            .into_iter()
            .filter_map(|d| {
                let Some(tx) = presence.sender(d.conn) else {
                    debug!(conn = %d.conn, "broadcast: no sender for connection");
                    return None;
                };
                Some((d.conn, tx.clone(), d.message))
            })
            .collect()
    };

    dispatch(outbound)
}

/// Fire-and-forget send of each message. Failures are logged per recipient.
fn dispatch(outbound: Vec<Outbound>) -> TickReport {
    let mut report = TickReport::default();
    for (conn, tx, message) in outbound {
        let kind = message.kind();
        match tx.try_send(message) {
            Ok(()) => report.sent += 1,
            Err(TrySendError::Full(_)) => {
                report.dropped += 1;
                warn!(%conn, kind, "broadcast: outbound queue full, dropping message");
            }
            Err(TrySendError::Closed(_)) => {
                report.dropped += 1;
                debug!(%conn, kind, "broadcast: connection already closed");
            }
        }
    }
    report
}

/// Spawn the tick loop. It runs for the life of the process; the next tick is
/// scheduled one period after the previous one finishes, with no catch-up.
pub fn spawn_broadcast_task(state: AppState) -> JoinHandle<()> {
    let period = state.config.tick_period();
    info!(tick_hz = state.config.tick_hz, period_ms = period.as_secs_f64() * 1000.0, "broadcast loop configured");
    tokio::spawn(async move {
        loop {
            let report = run_tick(&state).await;
            if report.sent > 0 || report.dropped > 0 {
                trace!(sent = report.sent, dropped = report.dropped, "broadcast: tick");
            }
            tokio::time::sleep(period).await;
        }
    })
}

#[cfg(test)]
#[path = "broadcast_test.rs"]
mod tests;
