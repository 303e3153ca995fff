use std::collections::HashMap;

use parking_lot::Mutex;

/// The identity carried by a session connection and shown in presence rosters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserIdentity {
    pub email: String,
    pub name: Option<String>,
    pub image: Option<String>,
}

/// Tracks which identities are currently present in which room.
///
/// Entirely in-memory and rebuilt from live connections, so a process
/// restart drops all presence. Snapshots are cloned, stable-ordered
/// lists; a broadcast never observes a half-applied mutation.
#[derive(Debug, Default)]
pub struct PresenceTracker {
    rooms: Mutex<HashMap<String, Vec<UserIdentity>>>,
}

impl PresenceTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an identity to a room, unless an entry with the same email
    /// is already present.
    pub fn add(&self, room_id: &str, identity: UserIdentity) {
        let mut rooms = self.rooms.lock();
        let entries = rooms.entry(room_id.to_string()).or_default();

        if !entries.iter().any(|e| e.email == identity.email) {
            entries.push(identity);
        }
    }

    /// Removes every entry matching the email from a room.
    pub fn remove(&self, room_id: &str, email: &str) {
        let mut rooms = self.rooms.lock();

        if let Some(entries) = rooms.get_mut(room_id) {
            entries.retain(|e| e.email != email);

            if entries.is_empty() {
                rooms.remove(room_id);
            }
        }
    }

    /// Returns a stable ordered copy of a room's presence list.
    pub fn snapshot(&self, room_id: &str) -> Vec<UserIdentity> {
        self.rooms.lock().get(room_id).cloned().unwrap_or_default()
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
    fn adding_the_same_email_twice_keeps_one_entry() {
        let tracker = PresenceTracker::new();

        tracker.add("r1", identity("alice@x.com"));
        tracker.add("r1", identity("alice@x.com"));

        assert_eq!(tracker.snapshot("r1").len(), 1);
    }

    #[test]
    fn entries_keep_their_join_order() {
        let tracker = PresenceTracker::new();

        tracker.add("r1", identity("alice@x.com"));
        tracker.add("r1", identity("bob@x.com"));
        tracker.add("r1", identity("carol@x.com"));

        let emails: Vec<_> = tracker
            .snapshot("r1")
            .into_iter()
            .map(|e| e.email)
            .collect();

        assert_eq!(emails, vec!["alice@x.com", "bob@x.com", "carol@x.com"]);
    }

    #[test]
    fn rooms_are_independent() {
        let tracker = PresenceTracker::new();

        tracker.add("r1", identity("alice@x.com"));
        tracker.add("r2", identity("bob@x.com"));

        assert_eq!(tracker.snapshot("r1").len(), 1);
        assert_eq!(tracker.snapshot("r2").len(), 1);

        tracker.remove("r1", "alice@x.com");

        assert!(tracker.snapshot("r1").is_empty());
        assert_eq!(tracker.snapshot("r2").len(), 1);
    }

    #[test]
    fn snapshots_are_unaffected_by_later_mutations() {
        let tracker = PresenceTracker::new();

        tracker.add("r1", identity("alice@x.com"));
        let snapshot = tracker.snapshot("r1");

        tracker.remove("r1", "alice@x.com");

        assert_eq!(snapshot.len(), 1);
        assert!(tracker.snapshot("r1").is_empty());
    }

    #[test]
    fn removing_an_absent_email_is_a_no_op() {
        let tracker = PresenceTracker::new();

        tracker.add("r1", identity("alice@x.com"));
        tracker.remove("r1", "bob@x.com");
        tracker.remove("r2", "alice@x.com");

        assert_eq!(tracker.snapshot("r1").len(), 1);
    }
}
