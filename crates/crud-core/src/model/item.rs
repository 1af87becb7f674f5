use serde::{Deserialize, Serialize};

/// 아이템 레코드.
///
/// 사용자와의 소유 관계가 없으므로 인증된 사용자라면 누구나 수정/삭제할 수 있습니다.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx-support", derive(sqlx::FromRow))]
pub struct Item {
    pub id: i64,
    pub name: String,
    pub description: String,
}

/// 새 아이템 입력.
#[derive(Debug, Clone, Deserialize)]
pub struct NewItem {
    pub name: String,
    pub description: String,
}

/// 부분 업데이트 입력.
///
/// 지정된 필드만 덮어쓰고 나머지는 기존 값을 유지합니다.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ItemPatch {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

impl ItemPatch {
    /// 변경할 필드가 없는지 확인.
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.description.is_none()
    }

    /// 기존 아이템에 변경 사항을 적용.
    pub fn apply_to(self, item: &mut Item) {
        if let Some(name) = self.name {
            item.name = name;
        }
        if let Some(description) = self.description {
            item.description = description;
        }
    }
}
