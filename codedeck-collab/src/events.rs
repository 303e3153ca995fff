use crossbeam::channel::{Receiver, Sender};

use crate::{ChatMessageData, SessionId, UserIdentity};

pub type EventSender = Sender<(CollabEvent, Recipients)>;
pub type EventReceiver = Receiver<(CollabEvent, Recipients)>;

/// Events emitted by the collab system towards connected clients.
#[derive(Debug, Clone)]
pub enum CollabEvent {
    /// A join attempt failed, reported to the requester only.
    JoinError { reason: String },
    /// The full presence roster of a room, pushed after any join or leave.
    PresenceUpdate {
        room_id: String,
        users: Vec<UserIdentity>,
    },
    /// The stored code state, replayed once to a joining connection.
    CodeLoaded { code: String, language: String },
    /// A live edit from another member of the room.
    CodeUpdated {
        code: String,
        language: String,
        edited_by: Option<String>,
        edited_at: Option<String>,
    },
    /// The bounded chat replay window, oldest first, sent once to a joiner.
    ChatHistory { messages: Vec<ChatMessageData> },
    /// A chat message, fanned out to the whole room including the sender.
    ChatMessage(ChatMessageData),
}

/// The connections an event should be delivered to.
#[derive(Debug, Clone)]
pub enum Recipients {
    Only(SessionId),
    Some(Vec<SessionId>),
}

impl Recipients {
    /// Returns the targeted session ids.
    pub fn session_ids(&self) -> Vec<SessionId> {
        match self {
            Recipients::Only(id) => vec![*id],
            Recipients::Some(ids) => ids.clone(),
        }
    }
}
