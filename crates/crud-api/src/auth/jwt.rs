//! JWT 토큰 처리.
//!
//! 대칭 키(HMAC)로 서명된 Access Token을 발급/검증합니다.
//! 서버는 세션 저장소 없이 서명과 만료 시각만으로 토큰을 판정합니다.

use chrono::{Duration, Utc};
use crud_core::{CoreError, JwtAlgorithm, JwtConfig};
use jsonwebtoken::{
    decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation,
};
use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::repository::Store;

/// JWT Access Token 페이로드.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// Subject - 사용자 ID (문자열 형태)
    pub sub: String,
    /// Expiration - 토큰 만료 시간 (Unix timestamp)
    pub exp: i64,
    /// Issued At - 토큰 발급 시간 (Unix timestamp). 없는 토큰도 허용
    #[serde(default)]
    pub iat: i64,
}

impl Claims {
    /// 현재 시각 기준으로 새 Claims 생성.
    pub fn new(user_id: i64, ttl: Duration) -> Self {
        let now = Utc::now();
        Self {
            sub: user_id.to_string(),
            iat: now.timestamp(),
            exp: (now + ttl).timestamp(),
        }
    }

    /// subject를 사용자 ID로 해석.
    pub fn user_id(&self) -> Result<i64, TokenError> {
        self.sub
            .parse()
            .map_err(|_| TokenError::Malformed(format!("숫자가 아닌 subject: {}", self.sub)))
    }
}

/// 토큰 발급/검증 에러.
#[derive(Debug, thiserror::Error)]
pub enum TokenError {
    #[error("사용자를 찾을 수 없습니다: {0}")]
    UserNotFound(i64),
    #[error("토큰이 만료되었습니다")]
    Expired,
    #[error("잘못된 토큰: {0}")]
    Malformed(String),
    #[error("토큰 인코딩 실패: {0}")]
    Encoding(#[source] jsonwebtoken::errors::Error),
    #[error(transparent)]
    Store(#[from] CoreError),
}

fn to_jwt_algorithm(algorithm: JwtAlgorithm) -> Algorithm {
    match algorithm {
        JwtAlgorithm::Hs256 => Algorithm::HS256,
        JwtAlgorithm::Hs384 => Algorithm::HS384,
        JwtAlgorithm::Hs512 => Algorithm::HS512,
    }
}

/// 토큰 서비스.
///
/// 상태를 갖지 않으며 (키와 검증 규칙만 보관) 요청 간 동기화가 필요 없습니다.
pub struct TokenService {
    store: Arc<dyn Store>,
    algorithm: Algorithm,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    ttl: Duration,
}

impl TokenService {
    pub fn new(config: &JwtConfig, store: Arc<dyn Store>) -> Self {
        let algorithm = to_jwt_algorithm(config.algorithm);
        let secret = config.secret.expose_secret().as_bytes();

        // 설정된 알고리즘만 허용, 만료 시각은 유예 없이 적용
        let mut validation = Validation::new(algorithm);
        validation.leeway = 0;
        validation.validate_exp = true;
        validation.set_required_spec_claims(&["exp", "sub"]);

        Self {
            store,
            algorithm,
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            validation,
            ttl: Duration::minutes(config.access_token_expire_minutes),
        }
    }

    /// Access Token 유효 기간.
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// 사용자에게 Access Token 발급.
    ///
    /// # Errors
    ///
    /// 사용자가 존재하지 않으면 `TokenError::UserNotFound`.
    pub async fn issue(&self, user_id: i64) -> Result<String, TokenError> {
        if self.store.find_user_by_id(user_id).await?.is_none() {
            return Err(TokenError::UserNotFound(user_id));
        }

        self.sign(&Claims::new(user_id, self.ttl))
    }

    /// Claims를 서명하여 인코딩.
    pub fn sign(&self, claims: &Claims) -> Result<String, TokenError> {
        encode(&Header::new(self.algorithm), claims, &self.encoding_key)
            .map_err(TokenError::Encoding)
    }

    /// 토큰 디코딩 및 검증.
    ///
    /// 서명/구조가 잘못되었으면 `Malformed`, 만료되었으면 `Expired`.
    /// 사용자 존재 여부는 확인하지 않습니다 (호출자 책임).
    pub fn validate(&self, token: &str) -> Result<Claims, TokenError> {
        decode::<Claims>(token, &self.decoding_key, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                ErrorKind::ExpiredSignature => TokenError::Expired,
                _ => TokenError::Malformed(e.to_string()),
            })
    }
}
