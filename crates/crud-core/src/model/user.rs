//! 사용자 레코드.

use serde::Serialize;
use std::fmt;

/// 가입된 사용자.
///
/// 가입 시 생성되며 이후 수정/삭제되지 않습니다.
/// `password_hash`는 직렬화와 `Debug` 출력에서 제외됩니다.
#[derive(Clone, PartialEq, Eq, Serialize)]
#[cfg_attr(feature = "sqlx-support", derive(sqlx::FromRow))]
pub struct User {
    /// 사용자 ID
    pub id: i64,
    /// 고유 사용자명
    pub username: String,
    /// PHC 형식 비밀번호 해시
    #[serde(skip_serializing)]
    pub password_hash: String,
}

impl fmt::Debug for User {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("User")
            .field("id", &self.id)
            .field("username", &self.username)
            .field("password_hash", &"[REDACTED]")
            .finish()
    }
}

impl fmt::Display for User {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<User {} (id={})>", self.username, self.id)
    }
}
