//! WebSocket message DTOs for the chat server.

use serde::{Deserialize, Serialize};

/// Message type enum for server → client frames
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MessageType {
    Chat,
    ConnectionStatus,
    RoomChanged,
    RoomList,
    Error,
}

/// Frames a client may send
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum ClientMessage {
    /// Choose a display name (once per connection)
    Identify { client_name: String },
    /// A chat line; commands and `@` recipients are parsed by the room
    Chat { content: String },
    /// Ask for the room list, optionally filtered
    GetRooms {
        #[serde(default)]
        query: Option<String>,
    },
}

/// Chat line delivered to a client
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub r#type: MessageType,
    pub from: String,
    pub content: String,
    /// Unix timestamp (milliseconds since epoch)
    pub timestamp: i64,
}

/// Join/leave notification about another client
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConnectionStatusMessage {
    pub r#type: MessageType,
    pub client_name: String,
    pub is_connected: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Sent when the client has been moved into a room
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoomChangedMessage {
    pub r#type: MessageType,
    pub room_name: String,
}

/// Reply to `get-rooms`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoomListMessage {
    pub r#type: MessageType,
    pub rooms: Vec<String>,
}

/// Protocol error (bad frame, bad name); never used for chat-level mistakes
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorMessage {
    pub r#type: MessageType,
    pub message: String,
}
