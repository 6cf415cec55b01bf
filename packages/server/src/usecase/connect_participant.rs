//! UseCase: 参加者接続処理
//!
//! ## テスト実装の作業記録
//!
//! ### 何をテストしているか
//! - ConnectParticipantUseCase::execute() メソッド
//! - 新しい接続をロビーに入れる処理
//!
//! ### なぜこのテストが必要か
//! - 接続直後のセッションは必ずどこかのルームに属している必要がある
//! - 名前未設定のセッションは他の参加者に通知されないことを保証
//!
//! ### どのような状況を想定しているか
//! - 正常系：名前未設定のセッションの接続
//! - 正常系：接続時に名前が指定されている場合

use std::sync::Arc;

use crate::domain::{RoomRegistry, Session};

use super::error::ConnectError;

/// 参加者接続のユースケース
pub struct ConnectParticipantUseCase {
    /// Registry（ルーム管理の抽象化）
    registry: Arc<dyn RoomRegistry>,
}

impl ConnectParticipantUseCase {
    /// 新しい ConnectParticipantUseCase を作成
    pub fn new(registry: Arc<dyn RoomRegistry>) -> Self {
        Self { registry }
    }

    /// 参加者接続を実行
    ///
    /// # Arguments
    ///
    /// * `session` - 接続したセッション
    ///
    /// # Returns
    ///
    /// * `Ok(())` - ロビーに入った
    /// * `Err(ConnectError)` - 接続失敗
    pub async fn execute(&self, session: Arc<dyn Session>) -> Result<(), ConnectError> {
        self.registry.join_lobby(session).await?;
        Ok(())
    }
}
