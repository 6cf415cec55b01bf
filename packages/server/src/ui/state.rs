//! Server state and connection parameters.

use std::sync::Arc;

use serde::Deserialize;

use crate::domain::RoomRegistry;

/// Query parameters for WebSocket connection
#[derive(Debug, Default, Deserialize)]
pub struct ConnectQuery {
    /// Display name chosen up front; without it the client must send `identify`
    #[serde(default)]
    pub client_name: Option<String>,
}

/// Shared application state
pub struct AppState {
    /// Registry（ルーム管理の抽象化）
    pub registry: Arc<dyn RoomRegistry>,
}
