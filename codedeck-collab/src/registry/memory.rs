use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use parking_lot::Mutex;

use super::{
    ChatMessageData, CodeState, NewRoom, RegistryError, Result, RoomData, RoomRegistry,
};

/// An in-process registry, used by tests and database-less deployments.
/// Everything lives in one lock and disappears with the process.
#[derive(Debug, Default)]
pub struct MemoryRegistry {
    state: Mutex<MemoryState>,
}

#[derive(Debug, Default)]
struct MemoryState {
    rooms: HashMap<String, RoomData>,
    code: HashMap<String, CodeState>,
    chat: HashMap<String, Vec<ChatMessageData>>,
}

impl MemoryRegistry {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl RoomRegistry for MemoryRegistry {
    async fn room_by_id(&self, room_id: &str) -> Result<RoomData> {
        self.state
            .lock()
            .rooms
            .get(room_id)
            .cloned()
            .ok_or(RegistryError::NotFound {
                resource: "room",
                identifier: "id",
            })
    }

    async fn list_rooms(&self) -> Result<Vec<RoomData>> {
        let mut rooms: Vec<_> = self.state.lock().rooms.values().cloned().collect();
        rooms.sort_by(|a, b| a.created_at.cmp(&b.created_at));

        Ok(rooms)
    }

    async fn create_room(&self, new_room: NewRoom) -> Result<RoomData> {
        let mut state = self.state.lock();

        if state.rooms.contains_key(&new_room.id) {
            return Err(RegistryError::Conflict {
                resource: "room",
                field: "id",
                value: new_room.id,
            });
        }

        let room = RoomData {
            id: new_room.id,
            name: new_room.name,
            creator_email: new_room.creator_email,
            created_at: Utc::now(),
        };

        state.rooms.insert(room.id.clone(), room.clone());

        Ok(room)
    }

    async fn delete_room(&self, room_id: &str) -> Result<()> {
        let mut state = self.state.lock();

        state
            .rooms
            .remove(room_id)
            .ok_or(RegistryError::NotFound {
                resource: "room",
                identifier: "id",
            })?;

        state.code.remove(room_id);
        state.chat.remove(room_id);

        Ok(())
    }

    async fn code_state(&self, room_id: &str) -> Result<Option<CodeState>> {
        Ok(self.state.lock().code.get(room_id).cloned())
    }

    async fn put_code_state(&self, room_id: &str, code: &str, language: &str) -> Result<()> {
        self.state.lock().code.insert(
            room_id.to_string(),
            CodeState {
                code: code.to_string(),
                language: language.to_string(),
            },
        );

        Ok(())
    }

    async fn append_chat(
        &self,
        room_id: &str,
        sender: &str,
        message: &str,
    ) -> Result<ChatMessageData> {
        let stored = ChatMessageData {
            sender: sender.to_string(),
            message: message.to_string(),
            created_at: Utc::now(),
        };

        self.state
            .lock()
            .chat
            .entry(room_id.to_string())
            .or_default()
            .push(stored.clone());

        Ok(stored)
    }

    async fn recent_chat(&self, room_id: &str, limit: usize) -> Result<Vec<ChatMessageData>> {
        let state = self.state.lock();
        let messages = state.chat.get(room_id).map(Vec::as_slice).unwrap_or(&[]);

        let start = messages.len().saturating_sub(limit);

        Ok(messages[start..].to_vec())
    }
}
