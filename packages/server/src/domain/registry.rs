//! Room registry abstraction.
//!
//! The registry owns the name → room mapping and the lobby. Rooms hold a
//! non-owning handle to it and ask it to create, find and drop rooms; they
//! never touch the mapping themselves.

use std::sync::Arc;

use async_trait::async_trait;

use super::{RegistryError, Room, RoomName, Session, Timestamp};

/// Snapshot of one live room.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoomSummary {
    pub name: String,
    pub member_count: usize,
    pub is_lobby: bool,
    pub created_at: Timestamp,
}

#[async_trait]
pub trait RoomRegistry: Send + Sync {
    /// Create an empty room. Fails if the name is taken or reserved.
    async fn create_new_room(&self, name: RoomName) -> Result<Arc<Room>, RegistryError>;

    /// Look up a live room.
    async fn get_room(&self, name: &RoomName) -> Option<Arc<Room>>;

    /// Move `session` from its current room into the room called `name`.
    async fn join_room(
        &self,
        name: &RoomName,
        session: Arc<dyn Session>,
    ) -> Result<(), RegistryError>;

    /// Move `session` from its current room into the lobby.
    async fn join_lobby(&self, session: Arc<dyn Session>) -> Result<(), RegistryError>;

    /// The permanent lobby.
    fn lobby(&self) -> Arc<Room>;

    /// Drop a closed room from the mapping. The lobby is never dropped.
    async fn cleanup_room(&self, name: &RoomName);

    /// Names of all live rooms, sorted.
    async fn get_rooms(&self) -> Vec<String>;

    /// Summaries of all live rooms, sorted by name.
    async fn room_summaries(&self) -> Vec<RoomSummary>;

    /// Move `session` from `from` to `to` as one logical step.
    ///
    /// If `to` refuses the session it goes back to `from`, or to the lobby
    /// when `from` has closed in the meantime.
    async fn move_session(
        &self,
        session: Arc<dyn Session>,
        from: Option<Arc<Room>>,
        to: Arc<Room>,
    ) -> Result<(), RegistryError>;

    /// Room names containing `query` (case-insensitive). An empty query
    /// lists everything.
    async fn search_rooms(&self, query: &str) -> Vec<String> {
        let query = query.trim().to_lowercase();
        self.get_rooms()
            .await
            .into_iter()
            .filter(|name| query.is_empty() || name.to_lowercase().contains(&query))
            .collect()
    }
}
