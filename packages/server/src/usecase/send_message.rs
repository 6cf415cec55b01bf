//! UseCase: メッセージ送信処理
//!
//! ## テスト実装の作業記録
//!
//! ### 何をテストしているか
//! - SendMessageUseCase::execute() メソッド
//! - セッションの現在のルームへのメッセージ受け渡し
//!
//! ### なぜこのテストが必要か
//! - 名前未設定のセッションからのメッセージを拒否する
//! - コマンドによるルーム移動後は新しいルームに届くことを確認
//!
//! ### どのような状況を想定しているか
//! - 正常系：ブロードキャスト
//! - 異常系：名前未設定、ルーム未所属

use std::sync::Arc;

use crate::domain::{MessageContent, Session};

use super::error::SendMessageError;

/// メッセージ送信のユースケース
pub struct SendMessageUseCase;

impl SendMessageUseCase {
    /// 新しい SendMessageUseCase を作成
    pub fn new() -> Self {
        Self
    }

    /// メッセージ送信を実行
    ///
    /// # Arguments
    ///
    /// * `sender` - 送信者のセッション
    /// * `content` - メッセージ内容（Domain Model）
    ///
    /// # Returns
    ///
    /// * `Ok(())` - ルームが処理した（コマンドの無視を含む）
    /// * `Err(SendMessageError)` - 送信者またはルームの状態が不正
    pub async fn execute(
        &self,
        sender: Arc<dyn Session>,
        content: MessageContent,
    ) -> Result<(), SendMessageError> {
        if sender.display_name().is_none() {
            return Err(SendMessageError::NotIdentified);
        }
        let room = sender
            .current_room()
            .ok_or(SendMessageError::NoCurrentRoom)?;
        room.send_message(&sender, content.as_str()).await?;
        Ok(())
    }
}

impl Default for SendMessageUseCase {
    fn default() -> Self {
        Self::new()
    }
}
