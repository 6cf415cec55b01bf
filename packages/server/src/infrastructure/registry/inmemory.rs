//! InMemory Room Registry 実装
//!
//! ドメイン層が定義する RoomRegistry trait の具体的な実装。
//! HashMap をインメモリのルーム表として使用します。
//!
//! ## ロック順序
//!
//! ルーム表のロックを保持したままルームのロックを待つことはありません。
//! ルームは自身のロックを保持したまま `cleanup_room` を呼ぶため、
//! 逆順で待つとデッドロックになります。

use std::{
    collections::HashMap,
    sync::{Arc, Weak},
};

use async_trait::async_trait;
use parlor_shared::time::now_millis;
use tokio::sync::RwLock;

use crate::domain::{
    RegistryError, Room, RoomName, RoomRegistry, RoomSummary, Session, Timestamp,
};

/// Registry settings.
#[derive(Debug, Clone)]
pub struct RegistryConfig {
    /// Name of the permanent lobby
    pub lobby_name: RoomName,
    /// Treat `Foo` and `foo` as the same room
    pub case_insensitive_names: bool,
}

impl RegistryConfig {
    /// Case-sensitive registry with the given lobby.
    pub fn with_lobby(lobby_name: RoomName) -> Self {
        Self {
            lobby_name,
            case_insensitive_names: false,
        }
    }
}

struct RoomEntry {
    name: RoomName,
    room: Arc<Room>,
}

/// インメモリ Room Registry 実装
///
/// ルーム名からルームへの対応表とロビーを所有します。
pub struct InMemoryRoomRegistry {
    /// ルーム表（キーは正規化済みのルーム名）
    rooms: RwLock<HashMap<String, RoomEntry>>,
    /// 常設のロビー
    lobby: Arc<Room>,
    lobby_name: RoomName,
    case_insensitive_names: bool,
    /// 新しいルームに渡す自分自身へのハンドル
    handle: Weak<dyn RoomRegistry>,
}

impl InMemoryRoomRegistry {
    /// 新しい InMemoryRoomRegistry をロビー付きで作成
    pub fn new(config: RegistryConfig) -> Arc<Self> {
        Arc::new_cyclic(|weak: &Weak<Self>| {
            let handle: Weak<dyn RoomRegistry> = weak.clone();
            let lobby = Arc::new(Room::new_lobby(
                config.lobby_name.clone(),
                handle.clone(),
                Timestamp::new(now_millis()),
            ));

            let key = Self::normalize(&config.lobby_name, config.case_insensitive_names);
            let mut rooms = HashMap::new();
            rooms.insert(
                key,
                RoomEntry {
                    name: config.lobby_name.clone(),
                    room: Arc::clone(&lobby),
                },
            );
            tracing::info!("Lobby '{}' created", config.lobby_name);

            Self {
                rooms: RwLock::new(rooms),
                lobby,
                lobby_name: config.lobby_name,
                case_insensitive_names: config.case_insensitive_names,
                handle,
            }
        })
    }

    fn normalize(name: &RoomName, case_insensitive: bool) -> String {
        if case_insensitive {
            name.as_str().to_lowercase()
        } else {
            name.as_str().to_string()
        }
    }

    fn key(&self, name: &RoomName) -> String {
        Self::normalize(name, self.case_insensitive_names)
    }

    fn is_lobby_name(&self, name: &RoomName) -> bool {
        name.as_str()
            .eq_ignore_ascii_case(self.lobby_name.as_str())
    }

    /// Number of live rooms, lobby included.
    pub async fn room_count(&self) -> usize {
        self.rooms.read().await.len()
    }
}

#[async_trait]
impl RoomRegistry for InMemoryRoomRegistry {
    async fn create_new_room(&self, name: RoomName) -> Result<Arc<Room>, RegistryError> {
        if self.is_lobby_name(&name) {
            return Err(RegistryError::ReservedName(name.into_string()));
        }

        let key = self.key(&name);
        let mut rooms = self.rooms.write().await;
        if rooms.contains_key(&key) {
            return Err(RegistryError::RoomAlreadyExists(name.into_string()));
        }

        let room = Arc::new(Room::new(
            name.clone(),
            self.handle.clone(),
            Timestamp::new(now_millis()),
        ));
        rooms.insert(
            key,
            RoomEntry {
                name: name.clone(),
                room: Arc::clone(&room),
            },
        );
        tracing::info!("Created room '{}'", name);
        Ok(room)
    }

    async fn get_room(&self, name: &RoomName) -> Option<Arc<Room>> {
        let rooms = self.rooms.read().await;
        rooms.get(&self.key(name)).map(|entry| Arc::clone(&entry.room))
    }

    async fn join_room(
        &self,
        name: &RoomName,
        session: Arc<dyn Session>,
    ) -> Result<(), RegistryError> {
        let to = self
            .get_room(name)
            .await
            .ok_or_else(|| RegistryError::RoomNotFound(name.to_string()))?;
        let from = session.current_room();
        self.move_session(session, from, to).await
    }

    async fn join_lobby(&self, session: Arc<dyn Session>) -> Result<(), RegistryError> {
        let from = session.current_room();
        self.move_session(session, from, Arc::clone(&self.lobby)).await
    }

    fn lobby(&self) -> Arc<Room> {
        Arc::clone(&self.lobby)
    }

    async fn cleanup_room(&self, name: &RoomName) {
        let key = self.key(name);
        let mut rooms = self.rooms.write().await;
        match rooms.get(&key) {
            Some(entry) if entry.room.is_lobby() => {
                tracing::warn!("Refusing to remove the lobby from the registry");
            }
            Some(_) => {
                rooms.remove(&key);
                tracing::info!("Removed room '{}' from the registry", name);
            }
            None => tracing::debug!("Room '{}' was not registered", name),
        }
    }

    async fn get_rooms(&self) -> Vec<String> {
        let rooms = self.rooms.read().await;
        let mut names: Vec<String> = rooms
            .values()
            .map(|entry| entry.name.as_str().to_string())
            .collect();
        names.sort();
        names
    }

    async fn room_summaries(&self) -> Vec<RoomSummary> {
        // Snapshot first so no room lock is awaited under the map lock
        let entries: Vec<(String, Arc<Room>)> = {
            let rooms = self.rooms.read().await;
            rooms
                .values()
                .map(|entry| (entry.name.as_str().to_string(), Arc::clone(&entry.room)))
                .collect()
        };

        let mut summaries = Vec::with_capacity(entries.len());
        for (name, room) in entries {
            if room.is_defunct().await {
                continue;
            }
            summaries.push(RoomSummary {
                name,
                member_count: room.member_count().await,
                is_lobby: room.is_lobby(),
                created_at: room.created_at(),
            });
        }
        summaries.sort_by(|a, b| a.name.cmp(&b.name));
        summaries
    }

    async fn move_session(
        &self,
        session: Arc<dyn Session>,
        from: Option<Arc<Room>>,
        to: Arc<Room>,
    ) -> Result<(), RegistryError> {
        if let Some(from) = &from
            && Arc::ptr_eq(from, &to)
        {
            return Ok(());
        }

        if let Some(from) = &from {
            // A closed origin is fine: the session is simply not in it
            let _ = from.remove_client(&session).await;
        }

        let Err(e) = to.add_client(Arc::clone(&session)).await else {
            return Ok(());
        };
        tracing::warn!("Move of '{}' failed ({}); rolling back", session.id(), e);

        let restored = match &from {
            Some(from) => from.add_client(Arc::clone(&session)).await.is_ok(),
            None => false,
        };
        if !restored {
            self.lobby.add_client(session).await?;
        }
        Err(e.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{
        RoomError,
        session::test_support::{Delivery, RecordingSession},
    };

    // ========================================
    // テスト作業記録
    // ========================================
    // 【何をテストするか】
    // - ルームの作成・検索・削除とロビーの常設
    // - セッションの移動（ロールバックを含む）
    // - 空になったルームの自動クローズとロビーへの移行
    //
    // 【なぜこのテストが必要か】
    // - ルーム表を変更できるのはレジストリだけであり、
    //   ルームのライフサイクルとの整合性を保証する必要がある
    // ========================================

    fn create_test_registry() -> Arc<InMemoryRoomRegistry> {
        InMemoryRoomRegistry::new(RegistryConfig::with_lobby(room_name("Lobby")))
    }

    fn room_name(name: &str) -> RoomName {
        RoomName::new(name.to_string()).unwrap()
    }

    fn as_session(session: &Arc<RecordingSession>) -> Arc<dyn Session> {
        session.clone()
    }

    #[tokio::test]
    async fn test_new_registry_has_lobby() {
        // テスト項目: 作成直後はロビーだけが存在する
        let registry = create_test_registry();
        assert_eq!(registry.get_rooms().await, vec!["Lobby".to_string()]);
        assert!(registry.lobby().is_lobby());
    }

    #[tokio::test]
    async fn test_create_room_duplicate_fails() {
        // テスト項目: 同名のルームは二度作成できない
        // given (前提条件):
        let registry = create_test_registry();
        registry.create_new_room(room_name("bar")).await.unwrap();

        // when (操作):
        let result = registry.create_new_room(room_name("bar")).await;

        // then (期待する結果):
        assert_eq!(
            result.unwrap_err(),
            RegistryError::RoomAlreadyExists("bar".to_string())
        );
        assert_eq!(registry.room_count().await, 2);
    }

    #[tokio::test]
    async fn test_lobby_name_is_reserved() {
        let registry = create_test_registry();
        let result = registry.create_new_room(room_name("lobby")).await;
        assert_eq!(
            result.unwrap_err(),
            RegistryError::ReservedName("lobby".to_string())
        );
    }

    #[tokio::test]
    async fn test_case_insensitive_names() {
        // テスト項目: 大文字小文字を区別しない設定では Foo と foo は同じルーム
        // given (前提条件):
        let registry = InMemoryRoomRegistry::new(RegistryConfig {
            lobby_name: room_name("Lobby"),
            case_insensitive_names: true,
        });
        registry.create_new_room(room_name("Foo")).await.unwrap();

        // then (期待する結果):
        assert!(registry.create_new_room(room_name("foo")).await.is_err());
        assert!(registry.get_room(&room_name("FOO")).await.is_some());
    }

    #[tokio::test]
    async fn test_case_sensitive_names_by_default() {
        let registry = create_test_registry();
        registry.create_new_room(room_name("Foo")).await.unwrap();
        assert!(registry.create_new_room(room_name("foo")).await.is_ok());
        assert!(registry.get_room(&room_name("FOO")).await.is_none());
    }

    #[tokio::test]
    async fn test_join_lobby_then_room() {
        // テスト項目: ロビーからルームへ移動すると両方のメンバーが更新される
        // given (前提条件):
        let registry = create_test_registry();
        let alice = RecordingSession::named("alice");
        registry.join_lobby(as_session(&alice)).await.unwrap();
        let room = registry.create_new_room(room_name("bar")).await.unwrap();

        // when (操作):
        registry
            .join_room(&room_name("bar"), as_session(&alice))
            .await
            .unwrap();

        // then (期待する結果):
        assert_eq!(registry.lobby().member_count().await, 0);
        assert_eq!(room.member_count().await, 1);
        assert!(Arc::ptr_eq(&alice.current_room().unwrap(), &room));
    }

    #[tokio::test]
    async fn test_join_unknown_room_leaves_session_in_place() {
        // テスト項目: 存在しないルームへの参加はメンバー構成を変えない
        let registry = create_test_registry();
        let alice = RecordingSession::named("alice");
        registry.join_lobby(as_session(&alice)).await.unwrap();

        let result = registry.join_room(&room_name("foo"), as_session(&alice)).await;

        assert_eq!(result, Err(RegistryError::RoomNotFound("foo".to_string())));
        assert_eq!(registry.lobby().member_count().await, 1);
    }

    #[tokio::test]
    async fn test_joinroom_command_for_unknown_room_is_silent() {
        // テスト項目: "/joinroom foo"（foo は存在しない）は何も配信しない
        // given (前提条件):
        let registry = create_test_registry();
        let sam = RecordingSession::named("sam");
        let alice = RecordingSession::named("alice");
        registry.join_lobby(as_session(&sam)).await.unwrap();
        registry.join_lobby(as_session(&alice)).await.unwrap();
        sam.clear();
        alice.clear();

        // when (操作):
        let lobby = registry.lobby();
        lobby
            .send_message(&as_session(&sam), "/joinroom foo")
            .await
            .unwrap();

        // then (期待する結果):
        assert_eq!(lobby.member_count().await, 2);
        assert!(sam.deliveries().is_empty());
        assert!(alice.deliveries().is_empty());
    }

    #[tokio::test]
    async fn test_createroom_command_moves_sender() {
        // テスト項目: "/createroom bar" でルームが作成され送信者が移動する
        // given (前提条件):
        let registry = create_test_registry();
        let sam = RecordingSession::named("sam");
        let alice = RecordingSession::named("alice");
        registry.join_lobby(as_session(&sam)).await.unwrap();
        registry.join_lobby(as_session(&alice)).await.unwrap();
        alice.clear();

        // when (操作):
        let lobby = registry.lobby();
        lobby
            .send_message(&as_session(&sam), "/createroom bar")
            .await
            .unwrap();

        // then (期待する結果):
        let bar = registry.get_room(&room_name("bar")).await.unwrap();
        assert_eq!(bar.member_count().await, 1);
        assert_eq!(lobby.member_count().await, 1);
        assert!(sam.deliveries().contains(&Delivery::RoomChanged("bar".to_string())));
        assert_eq!(
            alice.deliveries(),
            vec![Delivery::Status {
                client_name: "sam".to_string(),
                is_connected: false,
                message: "left the room Lobby".to_string(),
            }]
        );
    }

    #[tokio::test]
    async fn test_concurrent_createroom_only_one_wins() {
        // テスト項目: 同名ルームの同時作成はちょうど一方だけが成功する
        // given (前提条件):
        let registry = create_test_registry();
        let sam = RecordingSession::named("sam");
        let alice = RecordingSession::named("alice");
        registry.join_lobby(as_session(&sam)).await.unwrap();
        registry.join_lobby(as_session(&alice)).await.unwrap();
        let lobby = registry.lobby();

        // when (操作):
        let (sam_dyn, alice_dyn) = (as_session(&sam), as_session(&alice));
        let (lobby_a, lobby_b) = (Arc::clone(&lobby), Arc::clone(&lobby));
        let a = tokio::spawn(async move { lobby_a.send_message(&sam_dyn, "/createroom bar").await });
        let b = tokio::spawn(async move { lobby_b.send_message(&alice_dyn, "/createroom bar").await });
        a.await.unwrap().unwrap();
        b.await.unwrap().unwrap();

        // then (期待する結果):
        let bar = registry.get_room(&room_name("bar")).await.unwrap();
        assert_eq!(bar.member_count().await, 1);
        assert_eq!(lobby.member_count().await, 1);
        assert_eq!(registry.room_count().await, 2);
    }

    #[tokio::test]
    async fn test_empty_room_is_closed_and_unregistered() {
        // テスト項目: 空になったルームは閉じられ、レジストリから削除される
        // given (前提条件):
        let registry = create_test_registry();
        let alice = RecordingSession::named("alice");
        registry.join_lobby(as_session(&alice)).await.unwrap();
        let bar = registry.create_new_room(room_name("bar")).await.unwrap();
        registry
            .join_room(&room_name("bar"), as_session(&alice))
            .await
            .unwrap();

        // when (操作):
        registry.join_lobby(as_session(&alice)).await.unwrap();

        // then (期待する結果):
        assert!(bar.is_defunct().await);
        assert!(registry.get_room(&room_name("bar")).await.is_none());
        assert_eq!(registry.get_rooms().await, vec!["Lobby".to_string()]);
        // 閉じたルームの名前は再利用できる
        assert!(registry.create_new_room(room_name("bar")).await.is_ok());
    }

    #[tokio::test]
    async fn test_close_migrates_members_to_lobby() {
        // テスト項目: 2 人のいるルームを閉じるとロビーが 2 人増え、ルームは 0 人になる
        // given (前提条件):
        let registry = create_test_registry();
        let bar = registry.create_new_room(room_name("bar")).await.unwrap();
        let alice = RecordingSession::named("alice");
        let bob = RecordingSession::named("bob");
        registry.join_room(&room_name("bar"), as_session(&alice)).await.unwrap();
        registry.join_room(&room_name("bar"), as_session(&bob)).await.unwrap();
        let lobby_before = registry.lobby().member_count().await;

        // when (操作):
        bar.close().await.unwrap();

        // then (期待する結果):
        assert_eq!(registry.lobby().member_count().await, lobby_before + 2);
        assert_eq!(bar.member_count().await, 0);
        assert!(bar.is_defunct().await);
        assert!(Arc::ptr_eq(&alice.current_room().unwrap(), &registry.lobby()));
        assert_eq!(bar.close().await, Err(RoomError::Defunct));
    }

    #[tokio::test]
    async fn test_move_to_defunct_room_rolls_back() {
        // テスト項目: 移動先が閉じていたら元のルームに戻される
        // given (前提条件):
        let registry = create_test_registry();
        let alice = RecordingSession::named("alice");
        let bob = RecordingSession::named("bob");
        registry.join_lobby(as_session(&alice)).await.unwrap();
        registry.join_lobby(as_session(&bob)).await.unwrap();
        let stale = registry.create_new_room(room_name("stale")).await.unwrap();
        stale.close().await.unwrap();

        // when (操作):
        let result = registry
            .move_session(as_session(&alice), Some(registry.lobby()), stale)
            .await;

        // then (期待する結果):
        assert_eq!(result, Err(RegistryError::Room(RoomError::Defunct)));
        assert_eq!(registry.lobby().member_count().await, 2);
        assert!(Arc::ptr_eq(&alice.current_room().unwrap(), &registry.lobby()));
    }

    #[tokio::test]
    async fn test_rollback_falls_back_to_lobby_when_origin_closed() {
        // テスト項目: 元のルームも閉じていた場合はロビーに入る
        // given (前提条件):
        let registry = create_test_registry();
        let alice = RecordingSession::named("alice");
        let origin = registry.create_new_room(room_name("origin")).await.unwrap();
        registry.join_room(&room_name("origin"), as_session(&alice)).await.unwrap();
        let stale = registry.create_new_room(room_name("stale")).await.unwrap();
        stale.close().await.unwrap();

        // when (操作): origin は alice が抜けた時点で閉じる
        let result = registry
            .move_session(as_session(&alice), Some(Arc::clone(&origin)), stale)
            .await;

        // then (期待する結果):
        assert!(result.is_err());
        assert!(origin.is_defunct().await);
        assert!(registry.lobby().contains(&alice.id()).await);
    }

    #[tokio::test]
    async fn test_lobby_survives_becoming_empty() {
        let registry = create_test_registry();
        let alice = RecordingSession::named("alice");
        registry.join_lobby(as_session(&alice)).await.unwrap();

        registry.lobby().remove_client(&as_session(&alice)).await.unwrap();
        registry.cleanup_room(&room_name("Lobby")).await;

        assert!(!registry.lobby().is_defunct().await);
        assert_eq!(registry.get_rooms().await, vec!["Lobby".to_string()]);
    }

    #[tokio::test]
    async fn test_search_rooms_and_summaries() {
        // テスト項目: ルーム検索は大文字小文字を区別せず部分一致する
        // given (前提条件):
        let registry = create_test_registry();
        let alice = RecordingSession::named("alice");
        registry.create_new_room(room_name("RustTalk")).await.unwrap();
        registry.create_new_room(room_name("random")).await.unwrap();
        registry.join_room(&room_name("random"), as_session(&alice)).await.unwrap();

        // when (操作):
        let found = registry.search_rooms("rust").await;
        let all = registry.search_rooms("").await;
        let summaries = registry.room_summaries().await;

        // then (期待する結果):
        assert_eq!(found, vec!["RustTalk".to_string()]);
        assert_eq!(all.len(), 3);
        let random = summaries.iter().find(|s| s.name == "random").unwrap();
        assert_eq!(random.member_count, 1);
        assert!(summaries.iter().any(|s| s.is_lobby && s.name == "Lobby"));
    }
}
