//! 도메인 레코드.
//!
//! - [`User`]: 가입된 사용자 (사용자명 + 비밀번호 해시)
//! - [`Item`]: 인증된 사용자가 관리하는 단일 리소스

mod item;
mod user;

pub use item::{Item, ItemPatch, NewItem};
pub use user::User;
