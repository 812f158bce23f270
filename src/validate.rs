/// 요청 본문 스키마 검증
/// 코어 로직 실행 전에 길이/형식 검사를 끝내고 첫 위반에서 InvalidInput으로 실패한다.
// region:    --- Imports
use chrono::NaiveDate;

use crate::auction::model::ITEM_CONDITIONS;
use crate::dates;
use crate::error::Error;

// endregion: --- Imports

// region:    --- Field Rules
/// 이메일 검증 (6~256자, @ 포함)
pub fn email(value: &str) -> Result<(), Error> {
    if value.len() < 6 || value.len() > 256 {
        return Err(Error::InvalidInput(
            "email must be 6 to 256 characters".to_string(),
        ));
    }
    let (local, domain) = value
        .split_once('@')
        .ok_or_else(|| Error::InvalidInput("email is invalid".to_string()))?;
    if local.is_empty() || domain.is_empty() || !domain.contains('.') {
        return Err(Error::InvalidInput("email is invalid".to_string()));
    }
    Ok(())
}

/// 비밀번호 검증 (6~1024자)
pub fn password(value: &str) -> Result<(), Error> {
    if value.len() < 6 || value.len() > 1024 {
        return Err(Error::InvalidInput(
            "password must be 6 to 1024 characters".to_string(),
        ));
    }
    Ok(())
}

/// 표시 이름 검증 (최대 256자)
pub fn display_name(value: &str) -> Result<(), Error> {
    if value.len() > 256 {
        return Err(Error::InvalidInput(
            "name must be at most 256 characters".to_string(),
        ));
    }
    Ok(())
}

/// 상품 필드 검증
pub fn item_fields(name: &str, details: &str, condition: &str) -> Result<(), Error> {
    if name.is_empty() || name.len() > 256 {
        return Err(Error::InvalidInput(
            "name must be 1 to 256 characters".to_string(),
        ));
    }
    if details.is_empty() || details.len() > 1024 {
        return Err(Error::InvalidInput(
            "details must be 1 to 1024 characters".to_string(),
        ));
    }
    if !ITEM_CONDITIONS.contains(&condition) {
        return Err(Error::InvalidInput(
            "condition must be new or used".to_string(),
        ));
    }
    Ok(())
}

/// 입찰 금액 검증 (양수)
pub fn bid_amount(amount: i64) -> Result<(), Error> {
    if amount <= 0 {
        return Err(Error::InvalidInput(
            "amount must be a positive number".to_string(),
        ));
    }
    Ok(())
}

/// 경매 생성/수정 입력 검증
/// 날짜 형식과 startDate <= endDate, 시작가 양수까지 확인한다.
pub fn auction_fields(
    start_bid: i64,
    start_date: &str,
    end_date: &str,
) -> Result<(NaiveDate, NaiveDate), Error> {
    if start_bid <= 0 {
        return Err(Error::InvalidInput(
            "startBid must be a positive number".to_string(),
        ));
    }
    let start = dates::parse_date("startDate", start_date)?;
    let end = dates::parse_date("endDate", end_date)?;
    if start > end {
        return Err(Error::InvalidInput("startDate > endDate".to_string()));
    }
    Ok((start, end))
}
// endregion: --- Field Rules

// endregion: --- Tests
