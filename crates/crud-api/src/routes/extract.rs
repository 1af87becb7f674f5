//! 요청 본문/쿼리 추출 헬퍼.
//!
//! 핸들러는 `Result<Json<T>, JsonRejection>`을 받아 이 헬퍼로 넘깁니다.
//! 역직렬화 실패는 기본 텍스트 응답 대신 JSON 에러(400)로 변환됩니다.

use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Query,
    },
    Json,
};
use serde::Deserialize;
use validator::Validate;

use crate::error::ApiError;

/// JSON 본문 추출.
pub fn extract_json<T>(result: Result<Json<T>, JsonRejection>) -> Result<T, ApiError> {
    result.map(|Json(v)| v).map_err(ApiError::from)
}

/// JSON 본문 추출 후 `validator` 규칙 검사.
pub fn extract_validated_json<T: Validate>(
    result: Result<Json<T>, JsonRejection>,
) -> Result<T, ApiError> {
    let value = extract_json(result)?;
    value.validate()?;
    Ok(value)
}

/// `?item_id=` 쿼리.
///
/// 누락과 형식 오류를 구분하기 위해 문자열로 받습니다.
#[derive(Debug, Default, Deserialize)]
pub struct ItemIdQuery {
    pub item_id: Option<String>,
}

/// `item_id` 쿼리 추출 및 정수 변환.
pub fn extract_item_id(result: Result<Query<ItemIdQuery>, QueryRejection>) -> Result<i64, ApiError> {
    let Query(query) = result?;

    let raw = query
        .item_id
        .ok_or_else(|| ApiError::Validation("item_id is required".to_string()))?;

    raw.trim()
        .parse()
        .map_err(|_| ApiError::Validation(format!("item_id must be an integer: {}", raw)))
}
