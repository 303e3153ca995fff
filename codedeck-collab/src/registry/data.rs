use chrono::{DateTime, Utc};

/// A codedeck room
#[derive(Debug, Clone)]
pub struct RoomData {
    /// An opaque string identifier, chosen by the creator or generated
    pub id: String,
    pub name: String,
    pub creator_email: String,
    pub created_at: DateTime<Utc>,
}

/// The latest code buffer of a room.
///
/// Exactly one per room, overwritten in place. No history is retained
/// beyond the single latest value.
#[derive(Debug, Clone)]
pub struct CodeState {
    pub code: String,
    pub language: String,
}

/// A chat message. Append-only per room, ordered by creation time.
#[derive(Debug, Clone)]
pub struct ChatMessageData {
    pub sender: String,
    pub message: String,
    /// Assigned by the registry when the message is appended
    pub created_at: DateTime<Utc>,
}
