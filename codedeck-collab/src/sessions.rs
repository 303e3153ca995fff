use std::{
    collections::HashMap,
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc,
    },
};

use dashmap::DashMap;
use parking_lot::Mutex;

use crate::UserIdentity;

pub type SessionId = u64;

static SESSION_COUNTER: AtomicU64 = AtomicU64::new(1);

/// One client's live channel to the server.
///
/// A connection starts unbound, binds an identity on its first
/// successful join, may join further rooms, and ends in the terminal
/// closed state when the transport goes away.
#[derive(Debug)]
pub struct SessionConnection {
    pub id: SessionId,
    state: Mutex<SessionState>,
}

#[derive(Debug, Default)]
enum SessionState {
    #[default]
    Unbound,
    Joined {
        identity: UserIdentity,
        rooms: Vec<String>,
    },
    Closed,
}

impl SessionConnection {
    fn new() -> Self {
        Self {
            id: SESSION_COUNTER.fetch_add(1, Ordering::Relaxed),
            state: Default::default(),
        }
    }

    /// Binds the identity and records the room membership. Joining the
    /// same room again is a no-op, and a closed connection cannot join.
    pub fn join(&self, room_id: &str, identity: UserIdentity) -> bool {
        let mut state = self.state.lock();

        match &mut *state {
            SessionState::Unbound => {
                *state = SessionState::Joined {
                    identity,
                    rooms: vec![room_id.to_string()],
                };

                true
            }
            SessionState::Joined { rooms, .. } => {
                if !rooms.iter().any(|r| r == room_id) {
                    rooms.push(room_id.to_string());
                }

                true
            }
            SessionState::Closed => false,
        }
    }

    /// Removes a single room membership, used to unwind a failed join.
    pub fn leave(&self, room_id: &str) {
        if let SessionState::Joined { rooms, .. } = &mut *self.state.lock() {
            rooms.retain(|r| r != room_id);
        }
    }

    /// Returns the bound identity, if any.
    pub fn identity(&self) -> Option<UserIdentity> {
        match &*self.state.lock() {
            SessionState::Joined { identity, .. } => Some(identity.clone()),
            _ => None,
        }
    }

    /// Returns the rooms this connection is currently a member of.
    pub fn joined_rooms(&self) -> Vec<String> {
        match &*self.state.lock() {
            SessionState::Joined { rooms, .. } => rooms.clone(),
            _ => Vec::new(),
        }
    }

    /// Transitions to the terminal state.
    ///
    /// Yields the identity and joined rooms exactly once, so disconnect
    /// cleanup cannot run twice for the same connection.
    pub fn close(&self) -> Option<(UserIdentity, Vec<String>)> {
        let mut state = self.state.lock();

        match std::mem::replace(&mut *state, SessionState::Closed) {
            SessionState::Joined { identity, rooms } => Some((identity, rooms)),
            _ => None,
        }
    }
}

/// Owns the live session connections and the per-room transport groups.
#[derive(Debug, Default)]
pub struct SessionStore {
    sessions: DashMap<SessionId, Arc<SessionConnection>>,
    groups: Mutex<HashMap<String, Vec<SessionId>>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn create(&self) -> Arc<SessionConnection> {
        let session = Arc::new(SessionConnection::new());
        self.sessions.insert(session.id, session.clone());

        session
    }

    pub fn get(&self, id: SessionId) -> Option<Arc<SessionConnection>> {
        self.sessions.get(&id).map(|s| s.clone())
    }

    pub fn remove(&self, id: SessionId) {
        self.sessions.remove(&id);
    }

    /// Adds a connection to a room's transport group.
    pub fn add_to_room(&self, room_id: &str, id: SessionId) {
        let mut groups = self.groups.lock();
        let group = groups.entry(room_id.to_string()).or_default();

        if !group.contains(&id) {
            group.push(id);
        }
    }

    pub fn remove_from_room(&self, room_id: &str, id: SessionId) {
        let mut groups = self.groups.lock();

        if let Some(group) = groups.get_mut(room_id) {
            group.retain(|s| *s != id);

            if group.is_empty() {
                groups.remove(room_id);
            }
        }
    }

    /// The connections currently in a room's transport group.
    pub fn sessions_in_room(&self, room_id: &str) -> Vec<SessionId> {
        self.groups.lock().get(room_id).cloned().unwrap_or_default()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn identity(email: &str) -> UserIdentity {
        UserIdentity {
            email: email.to_string(),
            name: None,
            image: None,
        }
    }

    #[test]
    fn a_connection_starts_unbound() {
        let store = SessionStore::new();
        let session = store.create();

        assert!(session.identity().is_none());
        assert!(session.joined_rooms().is_empty());
    }

    #[test]
    fn joining_binds_the_identity() {
        let store = SessionStore::new();
        let session = store.create();

        assert!(session.join("r1", identity("alice@x.com")));
        assert_eq!(session.identity().unwrap().email, "alice@x.com");
        assert_eq!(session.joined_rooms(), vec!["r1"]);
    }

    #[test]
    fn a_connection_can_join_multiple_rooms() {
        let store = SessionStore::new();
        let session = store.create();

        session.join("r1", identity("alice@x.com"));
        session.join("r2", identity("alice@x.com"));
        session.join("r1", identity("alice@x.com"));

        assert_eq!(session.joined_rooms(), vec!["r1", "r2"]);
    }

    #[test]
    fn close_yields_the_cleanup_data_exactly_once() {
        let store = SessionStore::new();
        let session = store.create();

        session.join("r1", identity("alice@x.com"));

        let (closed_identity, rooms) = session.close().expect("first close yields data");
        assert_eq!(closed_identity.email, "alice@x.com");
        assert_eq!(rooms, vec!["r1"]);

        assert!(session.close().is_none());
        assert!(!session.join("r2", identity("alice@x.com")));
    }

    #[test]
    fn closing_an_unbound_connection_yields_nothing() {
        let store = SessionStore::new();
        let session = store.create();

        assert!(session.close().is_none());
    }

    #[test]
    fn transport_groups_track_membership() {
        let store = SessionStore::new();
        let first = store.create();
        let second = store.create();

        store.add_to_room("r1", first.id);
        store.add_to_room("r1", second.id);
        store.add_to_room("r1", first.id);

        assert_eq!(store.sessions_in_room("r1"), vec![first.id, second.id]);

        store.remove_from_room("r1", first.id);
        assert_eq!(store.sessions_in_room("r1"), vec![second.id]);

        store.remove_from_room("r1", second.id);
        assert!(store.sessions_in_room("r1").is_empty());
    }

    #[test]
    fn the_store_owns_live_sessions() {
        let store = SessionStore::new();
        let session = store.create();

        assert!(store.get(session.id).is_some());

        store.remove(session.id);
        assert!(store.get(session.id).is_none());
    }
}
