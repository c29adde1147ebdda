//! Connection registry — the authoritative set of present users.
//!
//! DESIGN
//! ======
//! Records are kept in insertion order so that the canonical snapshot
//! serialization is stable between ticks. Each record carries the
//! `ConnectionId` that created it; removal is keyed on that id, never on
//! socket identity.
//!
//! There is no expiry. A client that goes quiet keeps its last position until
//! its connection closes.

use uuid::Uuid;

use crate::protocol::{PositionUpdate, User};

/// Stable per-connection identifier assigned at accept time.
pub type ConnectionId = Uuid;

// =============================================================================
// TYPES
// =============================================================================

/// Result of an upsert.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Upsert {
    Inserted,
    Updated,
}

/// A user plus the connection that owns it. The connection never leaves
/// the registry; `snapshot` strips it.
#[derive(Debug, Clone)]
pub struct UserRecord {
    pub conn: ConnectionId,
    pub user: User,
}

impl UserRecord {
    /// The one place a repeated `positionChange` touches an existing record.
    /// Only coordinates move; name and color stay as first reported.
    fn apply_update(&mut self, update: PositionUpdate) {
        self.user.x = update.x;
        self.user.y = update.y;
    }
}

#[derive(Debug, Default)]
pub struct Registry {
    records: Vec<UserRecord>,
}

// =============================================================================
// OPERATIONS
// =============================================================================

impl Registry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a record for `update.id`, or move the existing one.
    ///
    /// An existing record keeps its original owning connection even when the
    /// update arrives on a different one.
    pub fn upsert_position(&mut self, conn: ConnectionId, update: PositionUpdate) -> Upsert {
        if let Some(record) = self.records.iter_mut().find(|r| r.user.id == update.id) {
            record.apply_update(update);
            return Upsert::Updated;
        }

        self.records.push(UserRecord { conn, user: User::from(update) });
        Upsert::Inserted
    }

    /// Remove every record owned by `conn` and return the removed users.
    /// Unknown connections are a no-op.
    pub fn remove_connection(&mut self, conn: ConnectionId) -> Vec<User> {
        let mut removed = Vec::new();
        self.records.retain(|record| {
            if record.conn == conn {
                removed.push(record.user.clone());
                false
            } else {
                true
            }
        });
        removed
    }

    /// Point-in-time copy of every user, connection handles stripped.
    #[must_use]
    pub fn snapshot(&self) -> Vec<User> {
        self.records.iter().map(|r| r.user.clone()).collect()
    }

    /// `(user id, owning connection)` for every record, in insertion order.
    #[must_use]
    pub fn recipients(&self) -> Vec<(String, ConnectionId)> {
        self.records.iter().map(|r| (r.user.id.clone(), r.conn)).collect()
    }

    #[must_use]
    pub fn get(&self, id: &str) -> Option<&UserRecord> {
        self.records.iter().find(|r| r.user.id == id)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[cfg(test)]
#[path = "registry_test.rs"]
mod tests;
