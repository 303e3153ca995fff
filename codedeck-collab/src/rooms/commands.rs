use crate::UserIdentity;

/// A client-originated event, dispatched through [`RoomSync::handle`].
///
/// Every inbound transport message maps to exactly one of these, which
/// keeps the connection state machine explicit and testable without a
/// live transport.
///
/// [`RoomSync::handle`]: super::RoomSync::handle
#[derive(Debug)]
pub enum ClientCommand {
    JoinRoom(JoinRoom),
    CodeChange(CodeChange),
    ChatMessage(NewChatMessage),
    Disconnect,
}

/// A request to join a room over a session connection.
#[derive(Debug)]
pub struct JoinRoom {
    pub room_id: String,
    pub identity: UserIdentity,
}

/// A live edit to a room's code buffer.
#[derive(Debug)]
pub struct CodeChange {
    pub room_id: String,
    pub code: String,
    /// Defaults to javascript when the client omits it
    pub language: Option<String>,
    pub edited_by: Option<String>,
    pub edited_at: Option<String>,
}

/// A chat message sent to a room.
#[derive(Debug)]
pub struct NewChatMessage {
    pub room_id: String,
    pub sender: String,
    pub message: String,
}
