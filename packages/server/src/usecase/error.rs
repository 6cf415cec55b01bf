//! UseCase 層のエラー定義

use thiserror::Error;

use crate::domain::{RegistryError, RoomError};

/// 接続時のエラー
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConnectError {
    #[error("Failed to place session in the lobby: {0}")]
    Lobby(#[from] RegistryError),
}

/// 名前設定時のエラー
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum IdentifyError {
    #[error("Session already has a display name")]
    AlreadyIdentified,

    #[error(transparent)]
    Registry(#[from] RegistryError),
}

/// メッセージ送信時のエラー
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SendMessageError {
    #[error("Session has not chosen a display name yet")]
    NotIdentified,

    #[error("Session is not in any room")]
    NoCurrentRoom,

    #[error(transparent)]
    Room(#[from] RoomError),
}
