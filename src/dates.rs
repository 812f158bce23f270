/// 경매 달력 날짜 처리
/// 날짜는 DD-MM-YYYY 문자열로 입출력되고 내부에서는 NaiveDate로 비교한다.
/// 문자열 비교는 연도가 바뀌는 순간 순서가 깨지므로 금지.
// region:    --- Imports
use chrono::{Local, NaiveDate};

use crate::error::Error;

// endregion: --- Imports

/// 허용되는 날짜 형식
pub const DATE_FORMAT: &str = "%d-%m-%Y";

/// DD-MM-YYYY 문자열 파싱
pub fn parse_date(field: &str, value: &str) -> Result<NaiveDate, Error> {
    NaiveDate::parse_from_str(value, DATE_FORMAT)
        .map_err(|_| Error::InvalidInput(format!("{} must have format DD-MM-YYYY", field)))
}

/// 오늘 날짜 (서버 로컬 기준)
pub fn today() -> NaiveDate {
    Local::now().date_naive()
}

/// 주어진 날짜가 오늘인지 확인
pub fn is_today(date: NaiveDate) -> bool {
    date == today()
}

/// 날짜를 DD-MM-YYYY 문자열로 변환
pub fn format_date(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

// region:    --- Serde Adapter
/// DD-MM-YYYY 형식으로 직렬화/역직렬화하는 serde 어댑터
pub mod day_month_year {
    use chrono::NaiveDate;
    use serde::{self, Deserialize, Deserializer, Serializer};

    use super::DATE_FORMAT;

    pub fn serialize<S>(date: &NaiveDate, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&date.format(DATE_FORMAT).to_string())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<NaiveDate, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = String::deserialize(deserializer)?;
        NaiveDate::parse_from_str(&value, DATE_FORMAT).map_err(serde::de::Error::custom)
    }
}
// endregion: --- Serde Adapter

// region:    --- Tests
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_valid_date() {
        let date = parse_date("startDate", "05-08-2026").unwrap();
        assert_eq!(format_date(date), "05-08-2026");
    }

    #[test]
    fn parse_rejects_bad_format() {
        assert!(parse_date("startDate", "2026-08-05").is_err());
        assert!(parse_date("startDate", "32-01-2026").is_err());
        assert!(parse_date("startDate", "01-13-2026").is_err());
        assert!(parse_date("startDate", "").is_err());
    }

    /// 문자열 비교는 "02-01-2025" < "30-12-2024"로 판정한다.
    /// 파싱 비교가 이 함정을 피하는지 확인.
    #[test]
    fn parsed_comparison_beats_string_order() {
        let january = parse_date("endDate", "02-01-2025").unwrap();
        let december = parse_date("endDate", "30-12-2024").unwrap();
        assert!("02-01-2025" < "30-12-2024");
        assert!(january > december);
    }
}
// endregion: --- Tests
