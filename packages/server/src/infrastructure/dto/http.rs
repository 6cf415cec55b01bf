//! HTTP API response DTOs for the chat server.

use serde::{Deserialize, Serialize};

/// Room summary for list endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoomSummaryDto {
    pub name: String,
    pub member_count: usize,
    pub is_lobby: bool,
    pub created_at: String, // ISO 8601
}

/// Room detail for detail endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoomDetailDto {
    pub name: String,
    pub is_lobby: bool,
    /// Display names of identified members
    pub members: Vec<String>,
    /// All members, identified or not
    pub member_count: usize,
    pub created_at: String, // ISO 8601
}
