//! All schemas that are exposed from endpoints are defined here
//! along with the conversion impls

use chrono::{DateTime, Utc};
use codedeck_collab::{ChatMessageData, CollabEvent, RoomData, UserIdentity};
use serde::Serialize;
use utoipa::ToSchema;

use crate::execution::ExecutionOutput;

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Room {
    id: String,
    name: String,
    creator_email: String,
    created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PresenceUser {
    email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    image: Option<String>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ChatMessage {
    sender: String,
    message: String,
    timestamp: DateTime<Utc>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionResult {
    success: bool,
    output: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    stderr: Option<String>,
}

/// Events pushed to clients over the gateway.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "kebab-case", tag = "type")]
pub enum ServerEvent {
    /// A join attempt failed, sent to the requester only.
    JoinError { reason: String },
    /// The full presence roster of a room, sent to the whole room.
    PresenceUpdate { users: Vec<PresenceUser> },
    /// The stored code state, sent once to a joiner.
    CodeLoaded { code: String, language: String },
    /// A live edit, sent to the room minus the editor.
    #[serde(rename_all = "camelCase")]
    CodeUpdated {
        code: String,
        language: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        edited_by: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        edited_at: Option<String>,
    },
    /// The bounded replay window, oldest first, sent once to a joiner.
    ChatHistory { messages: Vec<ChatMessage> },
    /// A chat message, sent to the whole room including the sender.
    ChatMessageBroadcast {
        sender: String,
        message: String,
        timestamp: DateTime<Utc>,
    },
}

impl From<CollabEvent> for ServerEvent {
    fn from(value: CollabEvent) -> Self {
        match value {
            CollabEvent::JoinError { reason } => Self::JoinError { reason },
            CollabEvent::PresenceUpdate { room_id: _, users } => Self::PresenceUpdate {
                users: users.to_serialized(),
            },
            CollabEvent::CodeLoaded { code, language } => Self::CodeLoaded { code, language },
            CollabEvent::CodeUpdated {
                code,
                language,
                edited_by,
                edited_at,
            } => Self::CodeUpdated {
                code,
                language,
                edited_by,
                edited_at,
            },
            CollabEvent::ChatHistory { messages } => Self::ChatHistory {
                messages: messages.to_serialized(),
            },
            CollabEvent::ChatMessage(message) => {
                let serialized = message.to_serialized();

                Self::ChatMessageBroadcast {
                    sender: serialized.sender,
                    message: serialized.message,
                    timestamp: serialized.timestamp,
                }
            }
        }
    }
}

/// Helper trait to convert any type into a serialized version
pub trait ToSerialized<T>
where
    T: Serialize,
{
    fn to_serialized(&self) -> T;
}

impl<I, O> ToSerialized<Vec<O>> for Vec<I>
where
    I: ToSerialized<O>,
    O: Serialize,
{
    fn to_serialized(&self) -> Vec<O> {
        self.iter().map(|x| x.to_serialized()).collect()
    }
}

impl ToSerialized<Room> for RoomData {
    fn to_serialized(&self) -> Room {
        Room {
            id: self.id.clone(),
            name: self.name.clone(),
            creator_email: self.creator_email.clone(),
            created_at: self.created_at,
        }
    }
}

impl ToSerialized<PresenceUser> for UserIdentity {
    fn to_serialized(&self) -> PresenceUser {
        PresenceUser {
            email: self.email.clone(),
            name: self.name.clone(),
            image: self.image.clone(),
        }
    }
}

impl ToSerialized<ChatMessage> for ChatMessageData {
    fn to_serialized(&self) -> ChatMessage {
        ChatMessage {
            sender: self.sender.clone(),
            message: self.message.clone(),
            timestamp: self.created_at,
        }
    }
}

impl ToSerialized<ExecutionResult> for ExecutionOutput {
    fn to_serialized(&self) -> ExecutionResult {
        ExecutionResult {
            success: true,
            output: self.stdout.clone(),
            stderr: self.stderr.clone(),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use serde_json::{json, Value};

    fn as_json(event: ServerEvent) -> Value {
        serde_json::to_value(event).unwrap()
    }

    #[test]
    fn events_are_tagged_in_kebab_case() {
        let event = as_json(ServerEvent::JoinError {
            reason: "Room does not exist".to_string(),
        });

        assert_eq!(
            event,
            json!({"type": "join-error", "reason": "Room does not exist"})
        );
    }

    #[test]
    fn presence_updates_carry_the_full_roster() {
        let users = vec![
            UserIdentity {
                email: "alice@x.com".to_string(),
                name: Some("Alice".to_string()),
                image: None,
            },
            UserIdentity {
                email: "bob@x.com".to_string(),
                name: None,
                image: None,
            },
        ];

        let event = as_json(ServerEvent::PresenceUpdate {
            users: users.to_serialized(),
        });

        assert_eq!(
            event,
            json!({
                "type": "presence-update",
                "users": [
                    {"email": "alice@x.com", "name": "Alice"},
                    {"email": "bob@x.com"},
                ],
            })
        );
    }

    #[test]
    fn code_updates_use_camel_case_attribution() {
        let event = as_json(ServerEvent::CodeUpdated {
            code: "print(1)".to_string(),
            language: "python".to_string(),
            edited_by: Some("alice@x.com".to_string()),
            edited_at: None,
        });

        assert_eq!(
            event,
            json!({
                "type": "code-updated",
                "code": "print(1)",
                "language": "python",
                "editedBy": "alice@x.com",
            })
        );
    }

    #[test]
    fn loaded_code_is_distinct_from_live_edits() {
        let event = as_json(ServerEvent::CodeLoaded {
            code: "print(1)".to_string(),
            language: "python".to_string(),
        });

        assert_eq!(event["type"], "code-loaded");
    }

    #[test]
    fn chat_broadcasts_carry_a_server_timestamp() {
        let message = ChatMessageData {
            sender: "alice@x.com".to_string(),
            message: "hi".to_string(),
            created_at: "2024-05-01T12:00:00Z".parse().unwrap(),
        };

        let event = as_json(CollabEvent::ChatMessage(message).into());

        assert_eq!(event["type"], "chat-message-broadcast");
        assert_eq!(event["sender"], "alice@x.com");
        assert_eq!(event["message"], "hi");
        assert_eq!(event["timestamp"], "2024-05-01T12:00:00Z");
    }
}
