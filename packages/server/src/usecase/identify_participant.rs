//! UseCase: 表示名の設定
//!
//! 接続直後のセッションは名前を持たず、ロビーに無通知で入っています。
//! 名前が決まった時点で現在のルームに入室を通知します。

use std::sync::Arc;

use crate::domain::{ClientName, RoomRegistry, Session};

use super::error::IdentifyError;

/// 表示名設定のユースケース
pub struct IdentifyParticipantUseCase {
    registry: Arc<dyn RoomRegistry>,
}

impl IdentifyParticipantUseCase {
    pub fn new(registry: Arc<dyn RoomRegistry>) -> Self {
        Self { registry }
    }

    /// 表示名を設定し、現在のルームに通知する
    ///
    /// 現在のルームが既に閉じている場合はロビーに入れ直します。
    pub async fn execute(
        &self,
        session: Arc<dyn Session>,
        name: ClientName,
    ) -> Result<(), IdentifyError> {
        if !session.identify(name.clone()) {
            return Err(IdentifyError::AlreadyIdentified);
        }
        tracing::info!("Session '{}' identified as '{}'", session.id(), name);

        match session.current_room() {
            Some(room) if room.announce_client(&session).await.is_ok() => Ok(()),
            _ => {
                self.registry.join_lobby(session).await?;
                Ok(())
            }
        }
    }
}
