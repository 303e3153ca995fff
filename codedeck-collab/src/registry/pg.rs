use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{postgres::PgPoolOptions, Error as SqlxError, FromRow, PgPool};

use super::{
    ChatMessageData, CodeState, IntoRegistryError, NewRoom, RegistryError, RegistryResult, Result,
    RoomData, RoomRegistry,
};

/// A postgres registry implementation for codedeck.
///
/// Expects the `rooms`, `room_code`, and `room_chat` tables, with
/// `room_code` keyed by `room_id` and `room_chat` append-only with a
/// defaulted `created_at`.
pub struct PgRegistry {
    pool: PgPool,
}

impl PgRegistry {
    pub async fn new(url: &str) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(5)
            .connect(url)
            .await
            .map_err(|e| RegistryError::Internal(Box::new(e)))?;

        Ok(Self { pool })
    }
}

#[derive(FromRow)]
struct RoomRow {
    id: String,
    name: String,
    creator_email: String,
    created_at: DateTime<Utc>,
}

#[derive(FromRow)]
struct CodeRow {
    code: String,
    language: String,
}

#[derive(FromRow)]
struct ChatRow {
    sender: String,
    message: String,
    created_at: DateTime<Utc>,
}

impl From<RoomRow> for RoomData {
    fn from(row: RoomRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
            creator_email: row.creator_email,
            created_at: row.created_at,
        }
    }
}

impl From<CodeRow> for CodeState {
    fn from(row: CodeRow) -> Self {
        Self {
            code: row.code,
            language: row.language,
        }
    }
}

impl From<ChatRow> for ChatMessageData {
    fn from(row: ChatRow) -> Self {
        Self {
            sender: row.sender,
            message: row.message,
            created_at: row.created_at,
        }
    }
}

#[async_trait]
impl RoomRegistry for PgRegistry {
    async fn room_by_id(&self, room_id: &str) -> Result<RoomData> {
        sqlx::query_as::<_, RoomRow>(
            "SELECT id, name, creator_email, created_at FROM rooms WHERE id = $1",
        )
        .bind(room_id)
        .fetch_one(&self.pool)
        .await
        .map(Into::into)
        .map_err(|e| e.not_found_or("room", "id"))
    }

    async fn list_rooms(&self) -> Result<Vec<RoomData>> {
        let rows = sqlx::query_as::<_, RoomRow>(
            "SELECT id, name, creator_email, created_at FROM rooms ORDER BY created_at",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| e.any())?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn create_room(&self, new_room: NewRoom) -> Result<RoomData> {
        self.room_by_id(&new_room.id)
            .await
            .conflict_or_ok("room", "id", &new_room.id)?;

        sqlx::query_as::<_, RoomRow>(
            "INSERT INTO rooms (id, name, creator_email)
             VALUES ($1, $2, $3)
             RETURNING id, name, creator_email, created_at",
        )
        .bind(&new_room.id)
        .bind(&new_room.name)
        .bind(&new_room.creator_email)
        .fetch_one(&self.pool)
        .await
        .map(Into::into)
        .map_err(|e| e.any())
    }

    async fn delete_room(&self, room_id: &str) -> Result<()> {
        // Ensure the room exists
        let _ = self.room_by_id(room_id).await?;

        sqlx::query("DELETE FROM rooms WHERE id = $1")
            .bind(room_id)
            .execute(&self.pool)
            .await
            .map_err(|e| e.any())?;

        sqlx::query("DELETE FROM room_code WHERE room_id = $1")
            .bind(room_id)
            .execute(&self.pool)
            .await
            .map_err(|e| e.any())?;

        sqlx::query("DELETE FROM room_chat WHERE room_id = $1")
            .bind(room_id)
            .execute(&self.pool)
            .await
            .map_err(|e| e.any())?;

        Ok(())
    }

    async fn code_state(&self, room_id: &str) -> Result<Option<CodeState>> {
        sqlx::query_as::<_, CodeRow>("SELECT code, language FROM room_code WHERE room_id = $1")
            .bind(room_id)
            .fetch_optional(&self.pool)
            .await
            .map(|row| row.map(Into::into))
            .map_err(|e| e.any())
    }

    async fn put_code_state(&self, room_id: &str, code: &str, language: &str) -> Result<()> {
        sqlx::query(
            "INSERT INTO room_code (room_id, code, language)
             VALUES ($1, $2, $3)
             ON CONFLICT (room_id) DO UPDATE SET code = $2, language = $3",
        )
        .bind(room_id)
        .bind(code)
        .bind(language)
        .execute(&self.pool)
        .await
        .map_err(|e| e.any())?;

        Ok(())
    }

    async fn append_chat(
        &self,
        room_id: &str,
        sender: &str,
        message: &str,
    ) -> Result<ChatMessageData> {
        sqlx::query_as::<_, ChatRow>(
            "INSERT INTO room_chat (room_id, sender, message)
             VALUES ($1, $2, $3)
             RETURNING sender, message, created_at",
        )
        .bind(room_id)
        .bind(sender)
        .bind(message)
        .fetch_one(&self.pool)
        .await
        .map(Into::into)
        .map_err(|e| e.any())
    }

    async fn recent_chat(&self, room_id: &str, limit: usize) -> Result<Vec<ChatMessageData>> {
        let rows = sqlx::query_as::<_, ChatRow>(
            "SELECT sender, message, created_at FROM (
                SELECT sender, message, created_at FROM room_chat
                WHERE room_id = $1
                ORDER BY created_at DESC
                LIMIT $2
             ) recent ORDER BY created_at ASC",
        )
        .bind(room_id)
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| e.any())?;

        Ok(rows.into_iter().map(Into::into).collect())
    }
}

impl IntoRegistryError for SqlxError {
    fn not_found_or(self, resource: &'static str, identifier: &'static str) -> RegistryError {
        match self {
            SqlxError::RowNotFound => RegistryError::NotFound {
                resource,
                identifier,
            },
            e => RegistryError::Internal(Box::new(e)),
        }
    }

    fn any(self) -> RegistryError {
        RegistryError::Internal(Box::new(self))
    }
}
