//! PostgreSQL 저장소.

use async_trait::async_trait;
use crud_core::{CoreError, CoreResult, Item, ItemPatch, NewItem, User};
use secrecy::ExposeSecret;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use std::time::Duration;

use super::{ItemStore, Store, UserStore};

/// sqlx `PgPool` 기반 저장소.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    /// 기존 풀로 저장소 생성.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// 설정에서 연결 풀을 만들고 저장소를 생성합니다.
    pub async fn connect(config: &crud_core::DatabaseConfig) -> CoreResult<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(Duration::from_secs(config.acquire_timeout_secs))
            .connect(config.url.expose_secret())
            .await?;

        Ok(Self::new(pool))
    }

    /// 내장 마이그레이션 실행 (테이블이 없으면 생성).
    pub async fn migrate(&self) -> CoreResult<()> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| CoreError::Database(format!("마이그레이션 실패: {}", e)))
    }
}

#[async_trait]
impl UserStore for PgStore {
    async fn find_user_by_id(&self, id: i64) -> CoreResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            "SELECT id, username, password_hash FROM users WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    async fn find_user_by_username(&self, username: &str) -> CoreResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            "SELECT id, username, password_hash FROM users WHERE username = $1",
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    async fn create_user(&self, username: &str, password_hash: &str) -> CoreResult<User> {
        // 동시 가입 경합은 UNIQUE 제약이 판정 (위반 시 Conflict)
        let user = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (username, password_hash)
            VALUES ($1, $2)
            RETURNING id, username, password_hash
            "#,
        )
        .bind(username)
        .bind(password_hash)
        .fetch_one(&self.pool)
        .await?;

        Ok(user)
    }
}

#[async_trait]
impl ItemStore for PgStore {
    async fn create_item(&self, item: NewItem) -> CoreResult<Item> {
        let record = sqlx::query_as::<_, Item>(
            r#"
            INSERT INTO items (name, description)
            VALUES ($1, $2)
            RETURNING id, name, description
            "#,
        )
        .bind(&item.name)
        .bind(&item.description)
        .fetch_one(&self.pool)
        .await?;

        Ok(record)
    }

    async fn list_items(&self) -> CoreResult<Vec<Item>> {
        let records =
            sqlx::query_as::<_, Item>("SELECT id, name, description FROM items ORDER BY id")
                .fetch_all(&self.pool)
                .await?;

        Ok(records)
    }

    async fn find_item(&self, id: i64) -> CoreResult<Option<Item>> {
        let record =
            sqlx::query_as::<_, Item>("SELECT id, name, description FROM items WHERE id = $1")
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;

        Ok(record)
    }

    async fn update_item(&self, id: i64, patch: ItemPatch) -> CoreResult<Option<Item>> {
        let record = sqlx::query_as::<_, Item>(
            r#"
            UPDATE items
            SET name = COALESCE($2, name),
                description = COALESCE($3, description)
            WHERE id = $1
            RETURNING id, name, description
            "#,
        )
        .bind(id)
        .bind(patch.name)
        .bind(patch.description)
        .fetch_optional(&self.pool)
        .await?;

        Ok(record)
    }

    async fn delete_item(&self, id: i64) -> CoreResult<bool> {
        let result = sqlx::query("DELETE FROM items WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

#[async_trait]
impl Store for PgStore {
    async fn ping(&self) -> CoreResult<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}
