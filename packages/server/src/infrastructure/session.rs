//! WebSocket-backed session.
//!
//! Deliveries are serialized to JSON and pushed onto an unbounded channel
//! that the connection's send task drains. A closed channel means the
//! socket is gone, which is reported back to the room as a failed delivery.

use std::sync::{Arc, Mutex, PoisonError, RwLock, Weak};

use parlor_shared::time::now_millis;
use serde::Serialize;
use tokio::sync::mpsc::UnboundedSender;

use crate::{
    domain::{ClientName, Room, Session, SessionId},
    infrastructure::dto::websocket::{
        ChatMessage, ConnectionStatusMessage, ErrorMessage, MessageType, RoomChangedMessage,
        RoomListMessage,
    },
};

pub struct WebSocketSession {
    id: SessionId,
    display_name: RwLock<Option<ClientName>>,
    current_room: Mutex<Weak<Room>>,
    sender: UnboundedSender<String>,
}

impl WebSocketSession {
    pub fn new(id: SessionId, sender: UnboundedSender<String>) -> Self {
        Self {
            id,
            display_name: RwLock::new(None),
            current_room: Mutex::new(Weak::new()),
            sender,
        }
    }

    /// Reply to a `get-rooms` request.
    pub fn send_room_list(&self, rooms: Vec<String>) -> bool {
        self.push(&RoomListMessage {
            r#type: MessageType::RoomList,
            rooms,
        })
    }

    /// Report a protocol error to this client only.
    pub fn send_error(&self, message: impl Into<String>) -> bool {
        self.push(&ErrorMessage {
            r#type: MessageType::Error,
            message: message.into(),
        })
    }

    fn push<T: Serialize>(&self, message: &T) -> bool {
        match serde_json::to_string(message) {
            Ok(json) => self.sender.send(json).is_ok(),
            Err(e) => {
                tracing::error!("Failed to serialize message for '{}': {}", self.id, e);
                // The connection itself is fine
                true
            }
        }
    }
}

impl Session for WebSocketSession {
    fn id(&self) -> SessionId {
        self.id.clone()
    }

    fn display_name(&self) -> Option<ClientName> {
        self.display_name
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn identify(&self, name: ClientName) -> bool {
        let mut current = self
            .display_name
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        if current.is_some() {
            return false;
        }
        *current = Some(name);
        true
    }

    fn send(&self, from: &str, message: &str) -> bool {
        self.push(&ChatMessage {
            r#type: MessageType::Chat,
            from: from.to_string(),
            content: message.to_string(),
            timestamp: now_millis(),
        })
    }

    fn send_connection_status(&self, client_name: &str, is_connected: bool, message: &str) -> bool {
        self.push(&ConnectionStatusMessage {
            r#type: MessageType::ConnectionStatus,
            client_name: client_name.to_string(),
            is_connected,
            message: (!message.is_empty()).then(|| message.to_string()),
        })
    }

    fn send_room_changed(&self, room_name: &str) -> bool {
        self.push(&RoomChangedMessage {
            r#type: MessageType::RoomChanged,
            room_name: room_name.to_string(),
        })
    }

    fn current_room(&self) -> Option<Arc<Room>> {
        self.current_room
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .upgrade()
    }

    fn set_current_room(&self, room: Weak<Room>) {
        *self
            .current_room
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = room;
    }
}
