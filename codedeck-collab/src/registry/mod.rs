use async_trait::async_trait;
use thiserror::Error;

mod data;
pub use data::*;

mod memory;
pub use memory::*;

mod pg;
pub use pg::*;

pub type Result<T> = std::result::Result<T, RegistryError>;

#[derive(Debug, Error)]
pub enum RegistryError {
    /// An unknown or internal error happened with the registry
    #[error(transparent)]
    Internal(Box<dyn std::error::Error + Send + Sync>),
    /// A resource already exists
    #[error("{resource} with {field} of value {value} already exists")]
    Conflict {
        /// The resource in question
        resource: &'static str,
        /// The field that is conflicting
        field: &'static str,
        /// The conflicting value
        value: String,
    },
    /// A resource in the registry doesn't exist
    #[error("{resource}:{identifier} doesn't exist")]
    NotFound {
        resource: &'static str,
        identifier: &'static str,
    },
}

/// Helper trait to reduce boilerplate
pub trait IntoRegistryError {
    fn not_found_or(self, resource: &'static str, identifier: &'static str) -> RegistryError;
    fn any(self) -> RegistryError;
}

/// Helper trait to reduce boilerplate
pub trait RegistryResult {
    /// Turns the Result into a conflict error if it's Ok()
    fn conflict_or_ok(self, resource: &'static str, field: &'static str, value: &str)
        -> Result<()>;
}

impl<T> RegistryResult for Result<T> {
    fn conflict_or_ok(
        self,
        resource: &'static str,
        field: &'static str,
        value: &str,
    ) -> Result<()> {
        match self {
            Ok(_) => Err(RegistryError::Conflict {
                resource,
                field,
                value: value.to_string(),
            }),
            Err(e) => match e {
                RegistryError::NotFound { .. } => Ok(()),
                e => Err(e),
            },
        }
    }
}

/// Represents a type that can durably store codedeck rooms, their code
/// state, and their chat logs. The collab system consumes this and
/// never owns the storage itself.
#[async_trait]
pub trait RoomRegistry: Send + Sync {
    async fn room_by_id(&self, room_id: &str) -> Result<RoomData>;
    async fn list_rooms(&self) -> Result<Vec<RoomData>>;
    async fn create_room(&self, new_room: NewRoom) -> Result<RoomData>;
    async fn delete_room(&self, room_id: &str) -> Result<()>;

    async fn code_state(&self, room_id: &str) -> Result<Option<CodeState>>;
    async fn put_code_state(&self, room_id: &str, code: &str, language: &str) -> Result<()>;

    async fn append_chat(&self, room_id: &str, sender: &str, message: &str)
        -> Result<ChatMessageData>;
    async fn recent_chat(&self, room_id: &str, limit: usize) -> Result<Vec<ChatMessageData>>;
}

#[derive(Debug)]
pub struct NewRoom {
    pub id: String,
    pub name: String,
    /// The creator of the new room
    pub creator_email: String,
}
