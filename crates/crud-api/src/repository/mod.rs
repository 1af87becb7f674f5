//! 영속성 계층.
//!
//! 라우트 핸들러와 인증 미들웨어는 [`Store`] 트레이트에만 의존합니다.
//! 운영 환경에서는 [`PgStore`]를, 테스트에서는 `MemoryStore`를 사용합니다.
//!
//! 연결 풀의 체크아웃/격리 수준은 구현체(sqlx)가 관리하며,
//! 같은 아이템에 대한 동시 수정은 마지막 쓰기가 이깁니다.

mod postgres;

#[cfg(any(test, feature = "test-utils"))]
mod memory;

use async_trait::async_trait;
use crud_core::{CoreResult, Item, ItemPatch, NewItem, User};

pub use postgres::PgStore;

#[cfg(any(test, feature = "test-utils"))]
pub use memory::MemoryStore;

/// 사용자 저장소.
#[async_trait]
pub trait UserStore: Send + Sync {
    /// ID로 사용자 조회.
    async fn find_user_by_id(&self, id: i64) -> CoreResult<Option<User>>;

    /// 사용자명으로 사용자 조회.
    async fn find_user_by_username(&self, username: &str) -> CoreResult<Option<User>>;

    /// 사용자 생성.
    ///
    /// 사용자명이 이미 존재하면 `CoreError::Conflict`를 반환합니다.
    async fn create_user(&self, username: &str, password_hash: &str) -> CoreResult<User>;
}

/// 아이템 저장소.
#[async_trait]
pub trait ItemStore: Send + Sync {
    /// 아이템 생성.
    async fn create_item(&self, item: NewItem) -> CoreResult<Item>;

    /// 모든 아이템 조회 (삽입 순서).
    async fn list_items(&self) -> CoreResult<Vec<Item>>;

    /// ID로 아이템 조회.
    async fn find_item(&self, id: i64) -> CoreResult<Option<Item>>;

    /// 부분 업데이트. 아이템이 없으면 `None`.
    async fn update_item(&self, id: i64, patch: ItemPatch) -> CoreResult<Option<Item>>;

    /// 아이템 삭제. 삭제된 행이 있으면 `true`.
    async fn delete_item(&self, id: i64) -> CoreResult<bool>;
}

/// 서비스 전체 저장소.
#[async_trait]
pub trait Store: UserStore + ItemStore {
    /// 저장소 연결 확인 (liveness probe).
    async fn ping(&self) -> CoreResult<()>;
}
