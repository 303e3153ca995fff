use std::{collections::HashMap, sync::Arc};

use axum::{
    extract::{
        ws::{Message, WebSocket},
        State, WebSocketUpgrade,
    },
    response::IntoResponse,
};
use codedeck_collab::{
    ClientCommand, CodeChange, JoinRoom, NewChatMessage, Recipients, SessionId, UserIdentity,
};
use futures_util::{SinkExt, StreamExt};
use log::{info, warn};
use parking_lot::Mutex;
use serde::Deserialize;
use tokio::{sync::mpsc, task::spawn_blocking};

use crate::{context::ServerContext, serialized::ServerEvent};

type Outbox = mpsc::UnboundedSender<String>;

/// Events received from clients over the gateway.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "kebab-case", tag = "type")]
pub enum ClientEvent {
    #[serde(rename_all = "camelCase")]
    JoinRoom {
        room_id: String,
        email: String,
        #[serde(default)]
        name: Option<String>,
        #[serde(default)]
        image: Option<String>,
    },
    #[serde(rename_all = "camelCase")]
    CodeChange {
        room_id: String,
        code: String,
        #[serde(default)]
        language: Option<String>,
        #[serde(default)]
        edited_by: Option<String>,
        #[serde(default)]
        edited_at: Option<String>,
    },
    #[serde(rename_all = "camelCase")]
    ChatMessage {
        room_id: String,
        sender: String,
        message: String,
    },
}

impl From<ClientEvent> for ClientCommand {
    fn from(value: ClientEvent) -> Self {
        match value {
            ClientEvent::JoinRoom {
                room_id,
                email,
                name,
                image,
            } => Self::JoinRoom(JoinRoom {
                room_id,
                identity: UserIdentity { email, name, image },
            }),
            ClientEvent::CodeChange {
                room_id,
                code,
                language,
                edited_by,
                edited_at,
            } => Self::CodeChange(CodeChange {
                room_id,
                code,
                language,
                edited_by,
                edited_at,
            }),
            ClientEvent::ChatMessage {
                room_id,
                sender,
                message,
            } => Self::ChatMessage(NewChatMessage {
                room_id,
                sender,
                message,
            }),
        }
    }
}

/// Manages the outbound channels of connected gateway clients.
#[derive(Default)]
pub struct Gateway {
    connections: Mutex<HashMap<SessionId, Outbox>>,
}

impl Gateway {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    fn register(&self, id: SessionId, outbox: Outbox) {
        self.connections.lock().insert(id, outbox);
    }

    fn unregister(&self, id: SessionId) {
        self.connections.lock().remove(&id);
    }

    /// Delivers an event to the targeted connections. Delivery is
    /// best-effort per connection: a dead outbox is skipped and does
    /// not block the others.
    pub fn send(&self, event: &ServerEvent, recipients: &Recipients) {
        let message = serde_json::to_string(event).expect("serializes properly");
        let connections = self.connections.lock();

        for id in recipients.session_ids() {
            if let Some(outbox) = connections.get(&id) {
                outbox.send(message.clone()).ok();
            }
        }
    }
}

/// Pumps collab events into the gateway until the collab system goes away.
pub async fn forward_events(context: ServerContext) {
    while let Ok((event, recipients)) = {
        let receiver = context.collab.events();
        spawn_blocking(move || receiver.recv())
            .await
            .expect("event task joins")
    } {
        context.gateway.send(&event.into(), &recipients);
    }
}

pub async fn websocket(
    State(context): State<ServerContext>,
    ws: WebSocketUpgrade,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, context))
}

async fn handle_socket(socket: WebSocket, context: ServerContext) {
    let session = context.collab.create_session();
    let (outbox, mut inbox) = mpsc::unbounded_channel();

    context.gateway.register(session.id, outbox);
    info!("Gateway connection {} opened", session.id);

    let (mut sender, mut receiver) = socket.split();

    let outbound_task = tokio::spawn(async move {
        while let Some(message) = inbox.recv().await {
            if sender.send(Message::Text(message)).await.is_err() {
                break;
            }
        }
    });

    while let Some(Ok(message)) = receiver.next().await {
        let Message::Text(text) = message else {
            continue;
        };

        let event: ClientEvent = match serde_json::from_str(&text) {
            Ok(event) => event,
            Err(e) => {
                warn!("Gateway connection {} sent an unknown event: {}", session.id, e);
                continue;
            }
        };

        if let Err(e) = context.collab.rooms.handle(&session, event.into()).await {
            warn!("Gateway connection {}: {}", session.id, e);
        }
    }

    // The transport is gone, run the disconnect cleanup exactly once
    context.gateway.unregister(session.id);
    context
        .collab
        .rooms
        .handle(&session, ClientCommand::Disconnect)
        .await
        .ok();

    outbound_task.abort();

    info!("Gateway connection {} closed", session.id);
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn join_events_parse_with_optional_profile_fields() {
        let event: ClientEvent = serde_json::from_str(
            r#"{"type": "join-room", "roomId": "r1", "email": "alice@x.com"}"#,
        )
        .unwrap();

        match event {
            ClientEvent::JoinRoom {
                room_id,
                email,
                name,
                image,
            } => {
                assert_eq!(room_id, "r1");
                assert_eq!(email, "alice@x.com");
                assert!(name.is_none());
                assert!(image.is_none());
            }
            other => panic!("expected a join, got {other:?}"),
        }
    }

    #[test]
    fn code_changes_parse_without_a_language() {
        let event: ClientEvent = serde_json::from_str(
            r#"{"type": "code-change", "roomId": "r1", "code": "print(1)"}"#,
        )
        .unwrap();

        match event {
            ClientEvent::CodeChange { code, language, .. } => {
                assert_eq!(code, "print(1)");
                assert!(language.is_none());
            }
            other => panic!("expected a code change, got {other:?}"),
        }
    }

    #[test]
    fn chat_messages_parse_with_camel_case_fields() {
        let event: ClientEvent = serde_json::from_str(
            r#"{"type": "chat-message", "roomId": "r1", "sender": "alice@x.com", "message": "hi"}"#,
        )
        .unwrap();

        assert!(matches!(event, ClientEvent::ChatMessage { .. }));
    }

    #[test]
    fn unknown_event_types_are_rejected() {
        let result: Result<ClientEvent, _> =
            serde_json::from_str(r#"{"type": "shutdown-server"}"#);

        assert!(result.is_err());
    }
}
