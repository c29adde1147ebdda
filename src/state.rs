//! Shared application state.
//!
//! DESIGN
//! ======
//! `AppState` is injected into Axum handlers via the `State` extractor.
//! It holds the configuration and one `Presence` hub behind a lock. The hub
//! owns the registry, the click queue, the transport-level connection table,
//! and the baseline used by the broadcast tick for change detection.
//!
//! Every mutation of the hub happens under the write lock, which stands in for
//! the single-threaded interleaving of intake and tick.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{RwLock, mpsc};
use tracing::debug;
use uuid::Uuid;

use crate::clicks::ClickQueue;
use crate::config::Config;
use crate::protocol::{ServerMessage, User};
use crate::registry::{ConnectionId, Registry};

// =============================================================================
// CONNECTION
// =============================================================================

/// A live socket as seen by the hub.
#[derive(Debug)]
pub struct Connection {
    /// Outbound queue drained by the socket task.
    pub tx: mpsc::Sender<ServerMessage>,
    /// User id bound by the first `positionChange` on this connection.
    pub user_id: Option<String>,
}

// =============================================================================
// PRESENCE
// =============================================================================

#[derive(Debug)]
pub struct Presence {
    pub registry: Registry,
    pub clicks: ClickQueue,
    pub connections: HashMap<ConnectionId, Connection>,
    /// Serialized snapshot computed on the previous tick.
    pub previous_snapshot: String,
}

impl Presence {
    #[must_use]
    pub fn new(click_queue_capacity: usize) -> Self {
        Self {
            registry: Registry::new(),
            clicks: ClickQueue::with_capacity_limit(click_queue_capacity),
            connections: HashMap::new(),
            previous_snapshot: String::new(),
        }
    }

    /// Register an accepted socket. It has no user record until its first
    /// `positionChange` arrives.
    pub fn connect(&mut self, tx: mpsc::Sender<ServerMessage>) -> ConnectionId {
        let conn = Uuid::new_v4();
        self.connections.insert(conn, Connection { tx, user_id: None });
        conn
    }

    /// Forget a closed socket and every user record it owns.
    pub fn disconnect(&mut self, conn: ConnectionId) -> Vec<User> {
        if self.connections.remove(&conn).is_none() {
            debug!(%conn, "presence: disconnect for unknown connection");
        }
        self.registry.remove_connection(conn)
    }

    /// Bind a connection to a user id if it is not bound yet.
    /// Returns `true` on the first bind.
    pub fn bind(&mut self, conn: ConnectionId, user_id: &str) -> bool {
        match self.connections.get_mut(&conn) {
            Some(connection) if connection.user_id.is_none() => {
                connection.user_id = Some(user_id.to_owned());
                true
            }
            _ => false,
        }
    }

    #[must_use]
    pub fn sender(&self, conn: ConnectionId) -> Option<&mpsc::Sender<ServerMessage>> {
        self.connections.get(&conn).map(|c| &c.tx)
    }

    #[must_use]
    pub fn connection_count(&self) -> usize {
        self.connections.len()
    }
}

// =============================================================================
// APP STATE
// =============================================================================

/// Shared application state, injected into Axum handlers via State extractor.
/// Clone is required by Axum; inner fields are Arc-wrapped.
#[derive(Clone)]
pub struct AppState {
    pub presence: Arc<RwLock<Presence>>,
    pub config: Arc<Config>,
}

impl AppState {
    #[must_use]
    pub fn new(config: Config) -> Self {
        let presence = Presence::new(config.click_queue_capacity);
        Self { presence: Arc::new(RwLock::new(presence)), config: Arc::new(config) }
    }
}

// =============================================================================
// TEST HELPERS
// =============================================================================


#[cfg(test)]
#[path = "state_test.rs"]
mod tests;
