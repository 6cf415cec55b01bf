//! UseCase: 参加者切断処理
//!
//! ## テスト実装の作業記録
//!
//! ### 何をテストしているか
//! - DisconnectParticipantUseCase::execute() メソッド
//! - 切断したセッションを現在のルームから外す処理
//!
//! ### なぜこのテストが必要か
//! - 残りの参加者に退室が通知されることを確認
//! - 最後の参加者が抜けたルームが閉じられることを保証
//!
//! ### どのような状況を想定しているか
//! - 正常系：参加者の切断と通知
//! - エッジケース：最後の参加者の切断（ルームが閉じる）
//! - エッジケース：ルームに属していないセッションの切断

use std::sync::{Arc, Weak};

use crate::domain::Session;

/// 参加者切断のユースケース
pub struct DisconnectParticipantUseCase;

impl DisconnectParticipantUseCase {
    /// 新しい DisconnectParticipantUseCase を作成
    pub fn new() -> Self {
        Self
    }

    /// 参加者切断を実行
    ///
    /// 現在のルームから外し、ルームへの参照を解除します。
    pub async fn execute(&self, session: Arc<dyn Session>) {
        if let Some(room) = session.current_room()
            && let Err(e) = room.remove_client(&session).await
        {
            tracing::debug!("Disconnect of '{}' from a closed room: {}", session.id(), e);
        }
        session.set_current_room(Weak::new());
        tracing::info!("Session '{}' disconnected", session.id());
    }
}

impl Default for DisconnectParticipantUseCase {
    fn default() -> Self {
        Self::new()
    }
}
