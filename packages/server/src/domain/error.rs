//! Domain layer error definitions.

use thiserror::Error;

/// Errors related to Value Objects validation
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValueObjectError {
    /// SessionId invalid format error (not a valid UUID)
    #[error("SessionId must be a valid UUID format (got: {0})")]
    SessionIdInvalidFormat(String),

    /// ClientName validation error
    #[error("ClientName cannot be empty")]
    ClientNameEmpty,

    /// ClientName too long error
    #[error("ClientName cannot exceed {max} characters (got {actual})")]
    ClientNameTooLong { max: usize, actual: usize },

    /// ClientName contains characters that collide with chat syntax
    #[error("ClientName contains an invalid character: {0:?}")]
    ClientNameInvalidCharacter(char),

    /// RoomName validation error
    #[error("RoomName cannot be empty")]
    RoomNameEmpty,

    /// RoomName too long error
    #[error("RoomName cannot exceed {max} characters (got {actual})")]
    RoomNameTooLong { max: usize, actual: usize },

    /// RoomName contains whitespace or the command trigger
    #[error("RoomName contains an invalid character: {0:?}")]
    RoomNameInvalidCharacter(char),

    /// MessageContent validation error
    #[error("MessageContent cannot be empty")]
    MessageContentEmpty,

    /// MessageContent too long error
    #[error("MessageContent cannot exceed {max} characters (got {actual})")]
    MessageContentTooLong { max: usize, actual: usize },
}

/// Errors related to Room domain logic
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RoomError {
    /// The room has been closed and can no longer be used
    #[error("Room is closed")]
    Defunct,

    /// The session is not a member of the room
    #[error("Session '{0}' is not a member of this room")]
    NotAMember(String),
}

/// Errors returned by the room registry
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RegistryError {
    /// A live room already uses this name
    #[error("Room '{0}' already exists")]
    RoomAlreadyExists(String),

    /// The name belongs to the lobby
    #[error("Room name '{0}' is reserved")]
    ReservedName(String),

    /// No live room has this name
    #[error("Room '{0}' not found")]
    RoomNotFound(String),

    /// The underlying room rejected the operation
    #[error(transparent)]
    Room(#[from] RoomError),
}
