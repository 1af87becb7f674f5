//! 테스트용 메모리 저장소.
//!
//! PostgreSQL 저장소와 같은 의미를 `RwLock` 위에서 구현합니다.
//! 접근 횟수 카운터와 장애 스위치로 미들웨어/헬스 체크 동작을 검증할 수 있습니다.

use async_trait::async_trait;
use crud_core::{CoreError, CoreResult, Item, ItemPatch, NewItem, User};
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use tokio::sync::RwLock;

use super::{ItemStore, Store, UserStore};

#[derive(Default)]
struct Tables {
    users: Vec<User>,
    items: BTreeMap<i64, Item>,
    next_user_id: i64,
    next_item_id: i64,
}

/// 메모리 저장소.
#[derive(Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
    accesses: AtomicUsize,
    unavailable: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// 지금까지의 저장소 호출 횟수.
    pub fn access_count(&self) -> usize {
        self.accesses.load(Ordering::SeqCst)
    }

    /// 장애 상태 전환. 켜져 있으면 모든 호출이 `CoreError::Database`를 반환합니다.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    fn touch(&self) -> CoreResult<()> {
        self.accesses.fetch_add(1, Ordering::SeqCst);
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(CoreError::Database("connection refused".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn find_user_by_id(&self, id: i64) -> CoreResult<Option<User>> {
        self.touch()?;
        let tables = self.tables.read().await;
        Ok(tables.users.iter().find(|u| u.id == id).cloned())
    }

    async fn find_user_by_username(&self, username: &str) -> CoreResult<Option<User>> {
        self.touch()?;
        let tables = self.tables.read().await;
        Ok(tables.users.iter().find(|u| u.username == username).cloned())
    }

    async fn create_user(&self, username: &str, password_hash: &str) -> CoreResult<User> {
        self.touch()?;
        // 중복 확인과 삽입을 같은 쓰기 잠금 안에서 수행
        let mut tables = self.tables.write().await;
        if tables.users.iter().any(|u| u.username == username) {
            return Err(CoreError::Conflict(format!("username '{}'", username)));
        }

        tables.next_user_id += 1;
        let user = User {
            id: tables.next_user_id,
            username: username.to_string(),
            password_hash: password_hash.to_string(),
        };
        tables.users.push(user.clone());
        Ok(user)
    }
}

#[async_trait]
impl ItemStore for MemoryStore {
    async fn create_item(&self, item: NewItem) -> CoreResult<Item> {
        self.touch()?;
        let mut tables = self.tables.write().await;
        tables.next_item_id += 1;
        let record = Item {
            id: tables.next_item_id,
            name: item.name,
            description: item.description,
        };
        tables.items.insert(record.id, record.clone());
        Ok(record)
    }

    async fn list_items(&self) -> CoreResult<Vec<Item>> {
        self.touch()?;
        let tables = self.tables.read().await;
        Ok(tables.items.values().cloned().collect())
    }

    async fn find_item(&self, id: i64) -> CoreResult<Option<Item>> {
        self.touch()?;
        let tables = self.tables.read().await;
        Ok(tables.items.get(&id).cloned())
    }

    async fn update_item(&self, id: i64, patch: ItemPatch) -> CoreResult<Option<Item>> {
        self.touch()?;
        let mut tables = self.tables.write().await;
        Ok(tables.items.get_mut(&id).map(|item| {
            patch.apply_to(item);
            item.clone()
        }))
    }

    async fn delete_item(&self, id: i64) -> CoreResult<bool> {
        self.touch()?;
        let mut tables = self.tables.write().await;
        Ok(tables.items.remove(&id).is_some())
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn ping(&self) -> CoreResult<()> {
        self.touch()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_duplicate_username_conflicts() {
        let store = MemoryStore::new();
        store.create_user("alice", "hash").await.unwrap();

        let result = store.create_user("alice", "other").await;
        assert!(matches!(result, Err(CoreError::Conflict(_))));
    }

    #[tokio::test]
    async fn test_item_lifecycle() {
        let store = MemoryStore::new();
        let first = store
            .create_item(NewItem {
                name: "A".to_string(),
                description: "B".to_string(),
            })
            .await
            .unwrap();
        let second = store
            .create_item(NewItem {
                name: "C".to_string(),
                description: "D".to_string(),
            })
            .await
            .unwrap();

        let ids: Vec<i64> = store.list_items().await.unwrap().iter().map(|i| i.id).collect();
        assert_eq!(ids, vec![first.id, second.id]);

        let updated = store
            .update_item(
                first.id,
                ItemPatch {
                    description: Some("E".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap()
            .unwrap();
        assert_eq!(updated.name, "A");
        assert_eq!(updated.description, "E");

        assert!(store.delete_item(first.id).await.unwrap());
        assert!(!store.delete_item(first.id).await.unwrap());
        assert!(store.find_item(first.id).await.unwrap().is_none());
        assert!(store.update_item(first.id, ItemPatch::default()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_unavailable_store() {
        let store = MemoryStore::new();
        store.set_unavailable(true);
        assert!(store.ping().await.is_err());
        assert_eq!(store.access_count(), 1);

        store.set_unavailable(false);
        assert!(store.ping().await.is_ok());
    }
}
