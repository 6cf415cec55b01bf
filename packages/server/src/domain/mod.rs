//! Domain layer for the chat server.
//!
//! Rooms, sessions and the registry contract. Nothing here knows about
//! WebSockets, JSON or HTTP.

pub mod command;
pub mod entity;
pub mod error;
pub mod factory;
pub mod registry;
pub mod session;
pub mod value_object;

pub use command::{ChatCommand, ChatInput};
pub use entity::Room;
pub use error::{RegistryError, RoomError, ValueObjectError};
pub use factory::SessionIdFactory;
pub use registry::{RoomRegistry, RoomSummary};
pub use session::Session;
pub use value_object::{ClientName, MessageContent, RoomName, SessionId, Timestamp};
