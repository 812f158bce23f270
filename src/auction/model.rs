// region:    --- Imports
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::dates::day_month_year;

// endregion: --- Imports

// region:    --- Status
/// 경매 라이프사이클 상태
/// entry -> open -> closed 순서로만 전이되고 closed는 종료 상태다.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuctionStatus {
    Entry,
    Open,
    Closed,
}

impl AuctionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuctionStatus::Entry => "entry",
            AuctionStatus::Open => "open",
            AuctionStatus::Closed => "closed",
        }
    }

    pub fn parse(value: &str) -> Option<AuctionStatus> {
        match value {
            "entry" => Some(AuctionStatus::Entry),
            "open" => Some(AuctionStatus::Open),
            "closed" => Some(AuctionStatus::Closed),
            _ => None,
        }
    }
}

/// 상품 상태 구분
pub const ITEM_CONDITIONS: [&str; 2] = ["new", "used"];
// endregion: --- Status

// region:    --- Models
/// 경매 모델
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Auction {
    pub id: i64,
    #[serde(rename = "by")]
    pub by_user: i64,
    pub item: i64,
    pub start_bid: i64,
    #[serde(with = "day_month_year")]
    pub start_date: NaiveDate,
    #[serde(with = "day_month_year")]
    pub end_date: NaiveDate,
    pub status: String,
    pub bids: Vec<i64>,
    pub highest_bid: Option<i64>,
    pub winner: Option<i64>,
    pub entry_time: DateTime<Utc>,
}

/// 입찰 모델
/// 생성 후 수정/삭제 없음
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Bid {
    pub id: i64,
    pub for_auction: i64,
    pub by_user: i64,
    pub amount: i64,
    pub entry_time: DateTime<Utc>,
}

/// 경매 상품 모델
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct AuctionItem {
    pub id: i64,
    pub owned_by: i64,
    pub name: String,
    pub details: String,
    pub condition: String,
    pub entry_time: DateTime<Utc>,
}

/// 사용자 모델
/// password는 직렬화에서 제외
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: i64,
    pub email: String,
    #[serde(skip_serializing)]
    pub password: String,
    pub name: Option<String>,
    pub auctions: Vec<i64>,
    pub bids: Vec<i64>,
    pub entry_time: DateTime<Utc>,
}

/// 경매 확장 조회 응답
/// 입찰 id 목록 대신 입찰 전체와 상품, 최고 입찰을 함께 내려준다.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuctionExpanded {
    pub id: i64,
    #[serde(rename = "by")]
    pub by_user: i64,
    pub item: AuctionItem,
    pub start_bid: i64,
    #[serde(with = "day_month_year")]
    pub start_date: NaiveDate,
    #[serde(with = "day_month_year")]
    pub end_date: NaiveDate,
    pub status: String,
    pub bids: Vec<Bid>,
    pub highest_bid: Option<Bid>,
    pub winner: Option<i64>,
    pub entry_time: DateTime<Utc>,
}
// endregion: --- Models
