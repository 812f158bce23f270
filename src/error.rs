/// 크레이트 공통 오류 타입
/// 코어 로직은 타입 오류만 반환하고 HTTP 변환은 IntoResponse 구현에서만 한다.
// region:    --- Imports
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

// endregion: --- Imports

// region:    --- Error
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// 스키마 검증 실패 (길이, 형식, 누락 필드)
    #[error("{0}")]
    InvalidInput(String),

    /// 참조된 경매/상품/사용자 없음
    #[error("{0} not found")]
    NotFound(&'static str),

    /// 요청한 변경에 대한 소유권 없음
    #[error("{0}")]
    NotOwner(String),

    /// 행위자에게 허용되지 않는 조작
    #[error("{0}")]
    InvalidOperation(String),

    /// 현재 라이프사이클 상태에서 허용되지 않는 조작
    #[error("{0}")]
    InvalidState(String),

    /// 입찰 금액 부족
    #[error("insufficient amount")]
    InsufficientAmount,

    /// 동일 상품에 진행 중인 경매 존재 등 충돌
    #[error("{0}")]
    Conflict(String),

    /// 토큰 누락 또는 검증 실패
    #[error("access denied")]
    Unauthorized,

    /// 하위 의존성 장애 또는 설정 누락
    #[error("server error: {0}")]
    Server(String),

    #[error(transparent)]
    Database(#[from] sqlx::Error),
}

impl Error {
    /// 오류 분류별 HTTP 상태 코드
    fn status_code(&self) -> StatusCode {
        match self {
            Error::NotFound(_) => StatusCode::NOT_FOUND,
            Error::Conflict(_) => StatusCode::CONFLICT,
            Error::Unauthorized => StatusCode::UNAUTHORIZED,
            Error::Server(_) | Error::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
            _ => StatusCode::BAD_REQUEST,
        }
    }
}

/// 오류를 {"error": ...} 본문으로 변환
impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = self.status_code();
        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}
// endregion: --- Error
