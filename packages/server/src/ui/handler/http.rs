//! HTTP API endpoint handlers.

use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use parlor_shared::time::millis_to_rfc3339;

use crate::{
    domain::RoomName,
    infrastructure::dto::http::{RoomDetailDto, RoomSummaryDto},
    ui::state::AppState,
};

/// Health check endpoint
pub async fn health_check() -> Json<serde_json::Value> {
    Json(serde_json::json!({"status": "ok"}))
}

/// Get list of live rooms
pub async fn get_rooms(State(state): State<Arc<AppState>>) -> Json<Vec<RoomSummaryDto>> {
    let summaries = state
        .registry
        .room_summaries()
        .await
        .into_iter()
        .map(|summary| RoomSummaryDto {
            name: summary.name,
            member_count: summary.member_count,
            is_lobby: summary.is_lobby,
            created_at: millis_to_rfc3339(summary.created_at.value()),
        })
        .collect();

    Json(summaries)
}

/// Get room detail by name
pub async fn get_room_detail(
    State(state): State<Arc<AppState>>,
    Path(room_name): Path<String>,
) -> Result<Json<RoomDetailDto>, StatusCode> {
    // 名前として不正な文字列はどのルームにも一致しない
    let name = RoomName::try_from(room_name).map_err(|_| StatusCode::NOT_FOUND)?;
    let room = state
        .registry
        .get_room(&name)
        .await
        .ok_or(StatusCode::NOT_FOUND)?;
    // 取得直後に閉じられた場合
    let name = room.name().await.ok_or(StatusCode::NOT_FOUND)?;

    let room_detail = RoomDetailDto {
        name: name.into_string(),
        is_lobby: room.is_lobby(),
        members: room.member_names().await,
        member_count: room.member_count().await,
        created_at: millis_to_rfc3339(room.created_at().value()),
    };

    Ok(Json(room_detail))
}
