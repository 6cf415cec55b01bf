//! UseCase: ルーム一覧の取得（ルームブラウザ用）

use std::sync::Arc;

use crate::domain::RoomRegistry;

pub struct ListRoomsUseCase {
    registry: Arc<dyn RoomRegistry>,
}

impl ListRoomsUseCase {
    pub fn new(registry: Arc<dyn RoomRegistry>) -> Self {
        Self { registry }
    }

    /// ルーム名の一覧（`query` があれば部分一致で絞り込み）
    pub async fn execute(&self, query: Option<&str>) -> Vec<String> {
        self.registry.search_rooms(query.unwrap_or_default()).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        domain::RoomName,
        infrastructure::registry::{InMemoryRoomRegistry, RegistryConfig},
    };

    #[tokio::test]
    async fn test_list_rooms_with_and_without_query() {
        // テスト項目: クエリなしで全件、クエリありで絞り込み
        // given (前提条件):
        let registry = InMemoryRoomRegistry::new(RegistryConfig::with_lobby(
            RoomName::new("Lobby".to_string()).unwrap(),
        ));
        registry
            .create_new_room(RoomName::new("games".to_string()).unwrap())
            .await
            .unwrap();
        let usecase = ListRoomsUseCase::new(registry.clone());

        // when (操作):
        let all = usecase.execute(None).await;
        let filtered = usecase.execute(Some("GAM")).await;

        // then (期待する結果):
        assert_eq!(all, vec!["Lobby".to_string(), "games".to_string()]);
        assert_eq!(filtered, vec!["games".to_string()]);
    }
}
