//! 아이템 CRUD endpoint.
//!
//! 모든 라우트는 [`require_auth`](crate::auth::require_auth) 뒤에 있습니다.
//! 아이템에는 소유자가 없으므로 인증된 사용자는 누구나 모든 아이템을 수정/삭제할 수 있습니다.

use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Query, State,
    },
    http::StatusCode,
    routing::{delete, get, post},
    Json, Router,
};
use crud_core::{Item, ItemPatch, NewItem};
use std::sync::Arc;

use super::extract::{extract_item_id, extract_json, ItemIdQuery};
use super::users::MessageResponse;
use crate::auth::CurrentUser;
use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

fn item_not_found() -> ApiError {
    ApiError::NotFound("Item not found".to_string())
}

/// 아이템 생성.
///
/// POST /items/create
pub async fn create_item(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    body: Result<Json<NewItem>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<Item>)> {
    let new_item = extract_json(body)?;

    let item = state.store.create_item(new_item).await?;
    tracing::debug!(item_id = item.id, user_id = user.id, "아이템 생성");

    Ok((StatusCode::CREATED, Json(item)))
}

/// 전체 아이템 조회.
///
/// GET /items/all
pub async fn list_items(
    State(state): State<Arc<AppState>>,
    CurrentUser(_user): CurrentUser,
) -> ApiResult<Json<Vec<Item>>> {
    Ok(Json(state.store.list_items().await?))
}

/// 단일 아이템 조회.
///
/// GET /items?item_id=
pub async fn get_item(
    State(state): State<Arc<AppState>>,
    CurrentUser(_user): CurrentUser,
    query: Result<Query<ItemIdQuery>, QueryRejection>,
) -> ApiResult<Json<Item>> {
    let item_id = extract_item_id(query)?;

    state
        .store
        .find_item(item_id)
        .await?
        .map(Json)
        .ok_or_else(item_not_found)
}

/// 아이템 부분 업데이트.
///
/// 본문에 있는 필드만 덮어씁니다. 빈 본문(`{}`)은 현재 아이템을 그대로 반환합니다.
/// PUT|PATCH /items/update?item_id=
pub async fn update_item(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    query: Result<Query<ItemIdQuery>, QueryRejection>,
    body: Result<Json<ItemPatch>, JsonRejection>,
) -> ApiResult<Json<Item>> {
    // 입력 검사는 모두 변경 전에
    let item_id = extract_item_id(query)?;
    let patch = extract_json(body)?;

    // 변경할 필드가 없으면 쓰기 없이 현재 값을 반환
    if patch.is_empty() {
        return state
            .store
            .find_item(item_id)
            .await?
            .map(Json)
            .ok_or_else(item_not_found);
    }

    let item = state
        .store
        .update_item(item_id, patch)
        .await?
        .ok_or_else(item_not_found)?;
    tracing::debug!(item_id, user_id = user.id, "아이템 수정");

    Ok(Json(item))
}

/// 아이템 삭제.
///
/// DELETE /items/delete?item_id=
pub async fn delete_item(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    query: Result<Query<ItemIdQuery>, QueryRejection>,
) -> ApiResult<Json<MessageResponse>> {
    let item_id = extract_item_id(query)?;

    if !state.store.delete_item(item_id).await? {
        return Err(item_not_found());
    }
    tracing::debug!(item_id, user_id = user.id, "아이템 삭제");

    Ok(Json(MessageResponse::new(format!("Item {} deleted", item_id))))
}

/// 아이템 라우터 생성.
///
/// 인증 레이어는 호출하는 쪽에서 `route_layer`로 적용합니다.
pub fn items_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/items/create", post(create_item))
        .route("/items/all", get(list_items))
        .route("/items", get(get_item))
        .route("/items/update", axum::routing::put(update_item).patch(update_item))
        .route("/items/delete", delete(delete_item))
}
