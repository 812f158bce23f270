/// 인증 협력자
/// 1. 비밀번호 해시/검증
/// 2. 서명 토큰 발급/검증
/// 3. 요청에서 사용자 식별자를 꺼내는 axum 추출기
// region:    --- Imports
use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use chrono::Utc;
use rand::Rng;
use sha2::{Digest, Sha256};

use crate::error::Error;

// endregion: --- Imports

/// 토큰을 담는 요청 헤더
pub const TOKEN_HEADER: &str = "auth-token";

/// 토큰 유효 기간 (7일)
const TOKEN_TTL_SECS: i64 = 60 * 60 * 24 * 7;

// region:    --- Password
/// 비밀번호 해시 생성
/// 무작위 솔트와 sha256 다이제스트를 "솔트$다이제스트"로 저장한다.
pub fn hash_password(password: &str) -> String {
    let salt: [u8; 16] = rand::thread_rng().gen();
    let salt = hex::encode(salt);
    format!("{}${}", salt, digest(&salt, password))
}

/// 비밀번호 검증
pub fn verify_password(password: &str, stored: &str) -> bool {
    match stored.split_once('$') {
        Some((salt, expected)) => digest(salt, password) == expected,
        None => false,
    }
}

fn digest(salt: &str, password: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(salt.as_bytes());
    hasher.update(password.as_bytes());
    hex::encode(hasher.finalize())
}
// endregion: --- Password

// region:    --- Token
/// 서명 키 조회
/// 키가 없으면 호출자 잘못이 아니라 서버 설정 문제다.
fn token_secret() -> Result<String, Error> {
    std::env::var("TOKEN_SECRET").map_err(|_| Error::Server("secret missing".to_string()))
}

/// 사용자 식별자에 대한 토큰 발급
pub fn sign_token(user_id: i64) -> Result<String, Error> {
    sign_token_with_expiry(user_id, Utc::now().timestamp() + TOKEN_TTL_SECS)
}

fn sign_token_with_expiry(user_id: i64, expiry: i64) -> Result<String, Error> {
    let payload = format!("{}.{}", user_id, expiry);
    let signature = signature(&token_secret()?, &payload);
    Ok(format!("{}.{}", payload, signature))
}

/// 토큰 검증 후 사용자 식별자 반환
pub fn verify_token(token: &str) -> Result<i64, Error> {
    let mut parts = token.splitn(3, '.');
    let (user_id, expiry, given) = match (parts.next(), parts.next(), parts.next()) {
        (Some(user_id), Some(expiry), Some(signature)) => (user_id, expiry, signature),
        _ => return Err(Error::Unauthorized),
    };

    let payload = format!("{}.{}", user_id, expiry);
    if signature(&token_secret()?, &payload) != given {
        return Err(Error::Unauthorized);
    }

    let expiry: i64 = expiry.parse().map_err(|_| Error::Unauthorized)?;
    if expiry <= Utc::now().timestamp() {
        return Err(Error::Unauthorized);
    }

    user_id.parse().map_err(|_| Error::Unauthorized)
}

fn signature(secret: &str, payload: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(secret.as_bytes());
    hasher.update(b".");
    hasher.update(payload.as_bytes());
    hex::encode(hasher.finalize())
}
// endregion: --- Token

// region:    --- Extractor
/// 인증된 요청의 사용자 식별자
#[derive(Debug, Clone, Copy)]
pub struct AuthUser(pub i64);

#[axum::async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = Error;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let token = parts
            .headers
            .get(TOKEN_HEADER)
            .and_then(|value| value.to_str().ok())
            .ok_or(Error::Unauthorized)?;
        Ok(AuthUser(verify_token(token)?))
    }
}
// endregion: --- Extractor

// endregion: --- Tests
