mod commands;

pub use commands::*;

use log::info;
use thiserror::Error;

use crate::{
    random_room_id, CollabContext, CollabEvent, NewRoom, Recipients, RegistryError, RoomData,
    SessionConnection,
};

/// How many chat messages are replayed to a newly joined connection.
pub const CHAT_REPLAY_LIMIT: usize = 50;

/// The language assumed when a client does not send one.
pub const DEFAULT_LANGUAGE: &str = "javascript";

const ROOM_ID_LENGTH: usize = 16;

/// The room synchronization engine.
///
/// Mediates every real-time room event: the join protocol, code and
/// chat fan-out, and disconnect cleanup. Persistence goes through the
/// registry, delivery goes through emitted [`CollabEvent`]s.
pub struct RoomSync {
    context: CollabContext,
}

#[derive(Debug, Error)]
pub enum SyncError {
    #[error("Room does not exist")]
    RoomNotFound,
    #[error("Connection has not joined a room")]
    NotJoined,
    #[error("Connection is closed")]
    ConnectionClosed,
    #[error("Only the room creator can delete this room")]
    NotRoomCreator,
    #[error(transparent)]
    Registry(#[from] RegistryError),
}

impl RoomSync {
    pub fn new(context: &CollabContext) -> Self {
        Self {
            context: context.clone(),
        }
    }

    /// Dispatches a single client event for a connection.
    pub async fn handle(
        &self,
        session: &SessionConnection,
        command: ClientCommand,
    ) -> Result<(), SyncError> {
        match command {
            ClientCommand::JoinRoom(join) => self.join(session, join).await,
            ClientCommand::CodeChange(change) => self.code_change(session, change).await,
            ClientCommand::ChatMessage(message) => self.chat_message(session, message).await,
            ClientCommand::Disconnect => {
                self.disconnect(session);
                Ok(())
            }
        }
    }

    /// Runs the join protocol for a connection.
    ///
    /// On success the whole room receives a fresh presence snapshot and
    /// the joiner alone receives the stored code state and the recent
    /// chat history. On failure the requester alone is notified and the
    /// connection ends up no more joined than it started.
    pub async fn join(
        &self,
        session: &SessionConnection,
        request: JoinRoom,
    ) -> Result<(), SyncError> {
        let JoinRoom { room_id, identity } = request;

        if let Err(e) = self.context.registry.room_by_id(&room_id).await {
            let error = match e {
                RegistryError::NotFound { .. } => SyncError::RoomNotFound,
                e => SyncError::Registry(e),
            };

            // Internal registry errors stay internal, the client only
            // needs to know the join did not happen
            let reason = match &error {
                SyncError::RoomNotFound => error.to_string(),
                _ => "Room could not be loaded".to_string(),
            };

            self.context.emit(
                CollabEvent::JoinError { reason },
                Recipients::Only(session.id),
            );

            return Err(error);
        }

        // A connection that closed mid-join gets no state registered
        // for it, there would be no disconnect left to clean it up
        if !session.join(&room_id, identity.clone()) {
            return Err(SyncError::ConnectionClosed);
        }

        // The connection counts as a member from this point on, even if
        // the state replay below fails.
        self.context.sessions.add_to_room(&room_id, session.id);
        self.context.presence.add(&room_id, identity.clone());

        self.broadcast_presence(&room_id);

        info!("{} joined room {}", identity.email, room_id);

        if let Err(e) = self.replay_state(session, &room_id).await {
            self.evict(session, &room_id, &identity.email);

            self.context.emit(
                CollabEvent::JoinError {
                    reason: "Room state could not be loaded".to_string(),
                },
                Recipients::Only(session.id),
            );

            return Err(e.into());
        }

        Ok(())
    }

    /// Persists a code edit and fans it out to the rest of the room.
    ///
    /// The write is unconditional: concurrent edits race at the
    /// registry and the last one to land wins, for the persisted copy
    /// and for what later joiners see.
    pub async fn code_change(
        &self,
        session: &SessionConnection,
        change: CodeChange,
    ) -> Result<(), SyncError> {
        if session.identity().is_none() {
            return Err(SyncError::NotJoined);
        }

        let CodeChange {
            room_id,
            code,
            language,
            edited_by,
            edited_at,
        } = change;

        let language = language.unwrap_or_else(|| DEFAULT_LANGUAGE.to_string());

        self.context
            .registry
            .put_code_state(&room_id, &code, &language)
            .await?;

        // The sender already holds this state locally
        let recipients: Vec<_> = self
            .context
            .sessions
            .sessions_in_room(&room_id)
            .into_iter()
            .filter(|id| *id != session.id)
            .collect();

        self.context.emit(
            CollabEvent::CodeUpdated {
                code,
                language,
                edited_by,
                edited_at,
            },
            Recipients::Some(recipients),
        );

        Ok(())
    }

    /// Appends a chat message and fans it out to the whole room,
    /// sender included, so everyone observes the same ordering.
    pub async fn chat_message(
        &self,
        session: &SessionConnection,
        message: NewChatMessage,
    ) -> Result<(), SyncError> {
        if session.identity().is_none() {
            return Err(SyncError::NotJoined);
        }

        let NewChatMessage {
            room_id,
            sender,
            message,
        } = message;

        let stored = self
            .context
            .registry
            .append_chat(&room_id, &sender, &message)
            .await?;

        let recipients = self.context.sessions.sessions_in_room(&room_id);

        self.context
            .emit(CollabEvent::ChatMessage(stored), Recipients::Some(recipients));

        Ok(())
    }

    /// Runs the full cleanup for a closing connection.
    ///
    /// Covers every room the connection had joined, not just the most
    /// recent one. Repeated calls for the same connection are no-ops.
    pub fn disconnect(&self, session: &SessionConnection) {
        self.context.sessions.remove(session.id);

        let Some((identity, rooms)) = session.close() else {
            return;
        };

        for room_id in rooms {
            self.evict(session, &room_id, &identity.email);
            info!("{} left room {}", identity.email, room_id);
        }
    }

    /// Creates a room, generating an id when the caller supplied none.
    pub async fn create_room(
        &self,
        id: Option<String>,
        name: String,
        creator_email: String,
    ) -> Result<RoomData, SyncError> {
        let new_room = NewRoom {
            id: id.unwrap_or_else(|| random_room_id(ROOM_ID_LENGTH)),
            name,
            creator_email,
        };

        let room = self.context.registry.create_room(new_room).await?;

        info!("Room {} created by {}", room.id, room.creator_email);

        Ok(room)
    }

    pub async fn room_by_id(&self, room_id: &str) -> Result<RoomData, SyncError> {
        Ok(self.context.registry.room_by_id(room_id).await?)
    }

    pub async fn list_rooms(&self) -> Result<Vec<RoomData>, SyncError> {
        Ok(self.context.registry.list_rooms().await?)
    }

    /// Deletes a room along with its code state and chat log. Only the
    /// creator may do this.
    pub async fn delete_room(&self, room_id: &str, requestor: &str) -> Result<(), SyncError> {
        let room = self.context.registry.room_by_id(room_id).await?;

        if room.creator_email != requestor {
            return Err(SyncError::NotRoomCreator);
        }

        self.context.registry.delete_room(room_id).await?;

        info!("Room {} deleted by {}", room_id, requestor);

        Ok(())
    }

    /// Replays the stored room state to a newly joined connection.
    async fn replay_state(
        &self,
        session: &SessionConnection,
        room_id: &str,
    ) -> Result<(), RegistryError> {
        // A room that was never edited has no code state to replay
        if let Some(state) = self.context.registry.code_state(room_id).await? {
            self.context.emit(
                CollabEvent::CodeLoaded {
                    code: state.code,
                    language: state.language,
                },
                Recipients::Only(session.id),
            );
        }

        let messages = self
            .context
            .registry
            .recent_chat(room_id, CHAT_REPLAY_LIMIT)
            .await?;

        self.context.emit(
            CollabEvent::ChatHistory { messages },
            Recipients::Only(session.id),
        );

        Ok(())
    }

    /// Removes a connection's presence and transport membership from a
    /// room, then pushes the corrected roster to whoever remains.
    fn evict(&self, session: &SessionConnection, room_id: &str, email: &str) {
        self.context.presence.remove(room_id, email);
        self.context.sessions.remove_from_room(room_id, session.id);
        session.leave(room_id);

        self.broadcast_presence(room_id);
    }

    fn broadcast_presence(&self, room_id: &str) {
        let users = self.context.presence.snapshot(room_id);
        let recipients = self.context.sessions.sessions_in_room(room_id);

        self.context.emit(
            CollabEvent::PresenceUpdate {
                room_id: room_id.to_string(),
                users,
            },
            Recipients::Some(recipients),
        );
    }
}
