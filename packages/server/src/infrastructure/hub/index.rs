//! Two-level presence index: team -> user -> connections.
//!
//! The index is a plain data structure with no locking of its own; [`Hub`]
//! wraps it in a single reader/writer lock. Keeping it lock-free makes the
//! bookkeeping testable without sockets or a runtime.
//!
//! [`Hub`]: super::Hub

use std::collections::{BTreeSet, HashMap};

use tokio::sync::mpsc;

use crate::domain::{ConnectionId, ConnectionIdentity, Payload, TeamId, UserId};

/// Registry-side reference to one live connection.
///
/// The handle holds the only sender of the connection's outbound buffer, so
/// dropping the handle is what closes the buffer.
#[derive(Debug)]
pub struct ConnectionHandle {
    id: ConnectionId,
    identity: ConnectionIdentity,
    outbound: mpsc::Sender<Payload>,
}

impl ConnectionHandle {
    /// Create a handle with a fresh id and a bounded outbound buffer.
    ///
    /// The returned receiver belongs to the connection's outbound pump.
    pub fn new(identity: ConnectionIdentity, capacity: usize) -> (Self, mpsc::Receiver<Payload>) {
        let (outbound, rx) = mpsc::channel(capacity.max(1));
        let handle = Self {
            id: ConnectionId::next(),
            identity,
            outbound,
        };
        (handle, rx)
    }

    pub fn id(&self) -> ConnectionId {
        self.id
    }

    pub fn identity(&self) -> &ConnectionIdentity {
        &self.identity
    }

    /// Non-blocking enqueue.
    pub fn try_enqueue(&self, payload: Payload) -> Result<(), mpsc::error::TrySendError<Payload>> {
        self.outbound.try_send(payload)
    }
}

/// Connections indexed both by id and by (team, user).
#[derive(Debug, Default)]
pub struct PresenceIndex {
    connections: HashMap<ConnectionId, ConnectionHandle>,
    by_team: HashMap<TeamId, HashMap<UserId, BTreeSet<ConnectionId>>>,
}

impl PresenceIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a connection into both indexes, creating missing levels.
    pub fn insert(&mut self, handle: ConnectionHandle) {
        let id = handle.id;
        let identity = handle.identity.clone();
        self.by_team
            .entry(identity.team_id)
            .or_default()
            .entry(identity.user_id)
            .or_default()
            .insert(id);
        self.connections.insert(id, handle);
    }

    /// Remove a connection from both indexes and prune empty levels.
    ///
    /// Returns `None` when the connection is not present.
    pub fn remove(&mut self, id: ConnectionId) -> Option<ConnectionHandle> {
        let handle = self.connections.remove(&id)?;
        let ConnectionIdentity { user_id, team_id } = &handle.identity;

        if let Some(users) = self.by_team.get_mut(team_id) {
            if let Some(ids) = users.get_mut(user_id) {
                ids.remove(&id);
                if ids.is_empty() {
                    users.remove(user_id);
                }
            }
            if users.is_empty() {
                self.by_team.remove(team_id);
            }
        }

        Some(handle)
    }

    pub fn contains(&self, id: ConnectionId) -> bool {
        self.connections.contains_key(&id)
    }

    /// Connections of one user in one team, in registration order.
    pub fn user_connections<'a>(
        &'a self,
        team_id: &TeamId,
        user_id: &UserId,
    ) -> impl Iterator<Item = &'a ConnectionHandle> + use<'a> {
        self.by_team
            .get(team_id)
            .and_then(|users| users.get(user_id))
            .into_iter()
            .flatten()
            .filter_map(move |id| self.connections.get(id))
    }

    /// Every connection indexed under a team.
    pub fn team_connections<'a>(
        &'a self,
        team_id: &TeamId,
    ) -> impl Iterator<Item = &'a ConnectionHandle> + use<'a> {
        self.by_team
            .get(team_id)
            .into_iter()
            .flat_map(|users| users.values())
            .flatten()
            .filter_map(move |id| self.connections.get(id))
    }

    pub fn all(&self) -> impl Iterator<Item = &ConnectionHandle> {
        self.connections.values()
    }

    pub fn is_user_connected(&self, team_id: &TeamId, user_id: &UserId) -> bool {
        self.by_team
            .get(team_id)
            .and_then(|users| users.get(user_id))
            .is_some_and(|ids| !ids.is_empty())
    }

    pub fn len(&self) -> usize {
        self.connections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.connections.is_empty()
    }

    pub fn team_count(&self) -> usize {
        self.by_team.len()
    }

    /// Remove every connection.
    pub fn drain(&mut self) -> Vec<ConnectionHandle> {
        self.by_team.clear();
        self.connections.drain().map(|(_, handle)| handle).collect()
    }

    /// Check that both indexes describe the same set of connections and that
    /// no empty level is left behind.
    pub fn is_consistent(&self) -> bool {
        let mut indexed = 0;
        for (team_id, users) in &self.by_team {
            if users.is_empty() {
                return false;
            }
            for (user_id, ids) in users {
                if ids.is_empty() {
                    return false;
                }
                for id in ids {
                    match self.connections.get(id) {
                        Some(handle)
                            if &handle.identity.team_id == team_id
                                && &handle.identity.user_id == user_id =>
                        {
                            indexed += 1;
                        }
                        _ => return false,
                    }
                }
            }
        }
        indexed == self.connections.len()
    }
}
