/// 경매 관련 커맨드 처리
/// 1. 경매 생성/수정/삭제
/// 2. 입찰
/// 3. 상품 등록/수정
// region:    --- Imports
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::auction::model::{Auction, AuctionItem, AuctionStatus, Bid};
use crate::database::DatabaseManager;
use crate::dates;
use crate::error::Error;
use crate::query::queries;
use crate::validate;

// endregion: --- Imports

// region:    --- Commands
/// 경매 생성 명령
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateAuctionCommand {
    pub item: i64,
    pub start_bid: i64,
    pub start_date: String,
    pub end_date: String,
}

/// 경매 수정 명령
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct UpdateAuctionCommand {
    pub item: Option<i64>,
    pub start_bid: Option<i64>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
}

/// 입찰 명령
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlaceBidCommand {
    pub amount: i64,
}

/// 상품 등록 명령
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateItemCommand {
    pub name: String,
    pub details: String,
    pub condition: String,
}

/// 상품 수정 명령
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct UpdateItemCommand {
    pub name: Option<String>,
    pub details: Option<String>,
    pub condition: Option<String>,
}
// endregion: --- Commands

// region:    --- SQL
const INSERT_BID: &str = r#"
    INSERT INTO bids (for_auction, by_user, amount, entry_time)
    VALUES ($1, $2, $3, $4)
    RETURNING id, for_auction, by_user, amount, entry_time
"#;

/// 입찰 승인 권한은 이 조건부 갱신 하나가 가진다.
/// 읽기-비교-쓰기를 애플리케이션에서 쪼개면 동시 입찰 두 건이 모두 이길 수 있다.
const ADMIT_BID: &str = r#"
    UPDATE auctions AS a
    SET bids = array_append(a.bids, $1), highest_bid = $1
    WHERE a.id = $2
      AND a.status = 'open'
      AND $3 >= a.start_bid
      AND $3 > COALESCE((SELECT b.amount FROM bids AS b WHERE b.id = a.highest_bid), -1)
"#;

const INSERT_AUCTION: &str = r#"
    INSERT INTO auctions (by_user, item, start_bid, start_date, end_date, status, entry_time)
    VALUES ($1, $2, $3, $4, $5, $6, $7)
    RETURNING id, by_user, item, start_bid, start_date, end_date, status, bids, highest_bid, winner, entry_time
"#;

const UPDATE_AUCTION: &str = r#"
    UPDATE auctions
    SET item = $1, start_bid = $2, start_date = $3, end_date = $4
    WHERE id = $5
    RETURNING id, by_user, item, start_bid, start_date, end_date, status, bids, highest_bid, winner, entry_time
"#;

const ACTIVE_AUCTION_EXISTS: &str =
    "SELECT EXISTS (SELECT 1 FROM auctions WHERE item = $1 AND status IN ('entry', 'open'))";

const INSERT_ITEM: &str = r#"
    INSERT INTO auction_items (owned_by, name, details, condition, entry_time)
    VALUES ($1, $2, $3, $4, $5)
    RETURNING id, owned_by, name, details, condition, entry_time
"#;

const UPDATE_ITEM: &str = r#"
    UPDATE auction_items
    SET name = $1, details = $2, condition = $3
    WHERE id = $4
    RETURNING id, owned_by, name, details, condition, entry_time
"#;
// endregion: --- SQL

// region:    --- Bidding
/// 입찰 처리
/// 선행 조건을 순서대로 검사하고 첫 위반에서 실패한다.
/// 원장 기록과 경매 갱신, 입찰자 이력은 한 트랜잭션으로 묶인다.
pub async fn place_bid(
    db_manager: &DatabaseManager,
    auction_id: i64,
    bidder_id: i64,
    amount: i64,
) -> Result<Bid, Error> {
    info!(
        "{:<12} --> 입찰 요청 처리 시작 auction: {} bidder: {} amount: {}",
        "Command", auction_id, bidder_id, amount
    );

    db_manager
        .transaction(|tx| {
            Box::pin(async move {
                let auction = sqlx::query_as::<_, Auction>(queries::GET_AUCTION)
                    .bind(auction_id)
                    .fetch_optional(&mut **tx)
                    .await?
                    .ok_or(Error::NotFound("auction"))?;

                if auction.by_user == bidder_id {
                    return Err(Error::InvalidOperation(
                        "cannot bid on own auction".to_string(),
                    ));
                }
                if AuctionStatus::parse(&auction.status) != Some(AuctionStatus::Open) {
                    return Err(Error::InvalidState("not open for bidding".to_string()));
                }
                if amount < auction.start_bid {
                    return Err(Error::InsufficientAmount);
                }
                if let Some(highest_bid) = auction.highest_bid {
                    let current: i64 = sqlx::query_scalar("SELECT amount FROM bids WHERE id = $1")
                        .bind(highest_bid)
                        .fetch_one(&mut **tx)
                        .await?;
                    // 동률은 먼저 들어온 입찰이 우선권을 가진다
                    if amount <= current {
                        return Err(Error::InsufficientAmount);
                    }
                }

                // 원장에 입찰 기록 추가
                let bid = sqlx::query_as::<_, Bid>(INSERT_BID)
                    .bind(auction_id)
                    .bind(bidder_id)
                    .bind(amount)
                    .bind(Utc::now())
                    .fetch_one(&mut **tx)
                    .await?;

                // 승인 확정: 조건부 갱신이 0건이면 그 사이 다른 쓰기가 이긴 것
                let admitted = sqlx::query(ADMIT_BID)
                    .bind(bid.id)
                    .bind(auction_id)
                    .bind(amount)
                    .execute(&mut **tx)
                    .await?;
                if admitted.rows_affected() == 0 {
                    let status: String =
                        sqlx::query_scalar("SELECT status FROM auctions WHERE id = $1")
                            .bind(auction_id)
                            .fetch_one(&mut **tx)
                            .await?;
                    return Err(
                        if AuctionStatus::parse(&status) != Some(AuctionStatus::Open) {
                            Error::InvalidState("not open for bidding".to_string())
                        } else {
                            Error::InsufficientAmount
                        },
                    );
                }

                // 입찰자 이력 갱신
                sqlx::query("UPDATE users SET bids = array_append(bids, $1) WHERE id = $2")
                    .bind(bid.id)
                    .bind(bidder_id)
                    .execute(&mut **tx)
                    .await?;

                Ok(bid)
            })
        })
        .await
}
// endregion: --- Bidding

// region:    --- Auctions
/// 경매 생성
/// 상품 소유자만 열 수 있고 같은 상품에 진행 중인 경매가 있으면 실패한다.
pub async fn create_auction(
    db_manager: &DatabaseManager,
    creator_id: i64,
    cmd: CreateAuctionCommand,
) -> Result<Auction, Error> {
    info!(
        "{:<12} --> 경매 생성 요청 처리 시작 creator: {} item: {}",
        "Command", creator_id, cmd.item
    );
    let (start_date, end_date) =
        validate::auction_fields(cmd.start_bid, &cmd.start_date, &cmd.end_date)?;

    db_manager
        .transaction(|tx| {
            Box::pin(async move {
                let item = sqlx::query_as::<_, AuctionItem>(queries::GET_ITEM)
                    .bind(cmd.item)
                    .fetch_optional(&mut **tx)
                    .await?
                    .ok_or(Error::NotFound("auction item"))?;
                if item.owned_by != creator_id {
                    return Err(Error::NotOwner(format!(
                        "user {} does not own item {}",
                        creator_id, item.id
                    )));
                }

                let active: bool = sqlx::query_scalar(ACTIVE_AUCTION_EXISTS)
                    .bind(cmd.item)
                    .fetch_one(&mut **tx)
                    .await?;
                if active {
                    return Err(Error::Conflict("active auction exists for item".to_string()));
                }

                let status = if dates::is_today(start_date) {
                    AuctionStatus::Open
                } else {
                    AuctionStatus::Entry
                };

                let auction = sqlx::query_as::<_, Auction>(INSERT_AUCTION)
                    .bind(creator_id)
                    .bind(cmd.item)
                    .bind(cmd.start_bid)
                    .bind(start_date)
                    .bind(end_date)
                    .bind(status.as_str())
                    .bind(Utc::now())
                    .fetch_one(&mut **tx)
                    .await
                    .map_err(map_active_auction_conflict)?;

                // 생성자의 주최 경매 이력 갱신
                sqlx::query("UPDATE users SET auctions = array_append(auctions, $1) WHERE id = $2")
                    .bind(auction.id)
                    .bind(creator_id)
                    .execute(&mut **tx)
                    .await?;

                Ok(auction)
            })
        })
        .await
}

/// 경매 수정
/// 생성자만, 종료 전까지만 가능하다. 입찰이 붙은 뒤에는 상품을 바꿀 수 없고
/// 시작일은 entry 상태에서만 바뀐다.
pub async fn update_auction(
    db_manager: &DatabaseManager,
    user_id: i64,
    auction_id: i64,
    cmd: UpdateAuctionCommand,
) -> Result<Auction, Error> {
    info!(
        "{:<12} --> 경매 수정 요청 처리 시작 auction: {} user: {}",
        "Command", auction_id, user_id
    );

    db_manager
        .transaction(|tx| {
            Box::pin(async move {
                let auction = sqlx::query_as::<_, Auction>(queries::GET_AUCTION)
                    .bind(auction_id)
                    .fetch_optional(&mut **tx)
                    .await?
                    .ok_or(Error::NotFound("auction"))?;

                if auction.by_user != user_id {
                    return Err(Error::NotOwner("auction not created by user".to_string()));
                }
                let status = AuctionStatus::parse(&auction.status);
                if status == Some(AuctionStatus::Closed) {
                    return Err(Error::InvalidState("auction is closed".to_string()));
                }

                let item_id = cmd.item.unwrap_or(auction.item);
                if item_id != auction.item {
                    if !auction.bids.is_empty() {
                        return Err(Error::InvalidOperation(
                            "bids have been made, cannot change item now".to_string(),
                        ));
                    }
                    let item = sqlx::query_as::<_, AuctionItem>(queries::GET_ITEM)
                        .bind(item_id)
                        .fetch_optional(&mut **tx)
                        .await?
                        .ok_or(Error::NotFound("auction item"))?;
                    if item.owned_by != user_id {
                        return Err(Error::NotOwner(format!(
                            "user {} does not own item {}",
                            user_id, item.id
                        )));
                    }
                }

                let start_bid = cmd.start_bid.unwrap_or(auction.start_bid);
                let mut start_date = match &cmd.start_date {
                    Some(value) => dates::parse_date("startDate", value)?,
                    None => auction.start_date,
                };
                let end_date = match &cmd.end_date {
                    Some(value) => dates::parse_date("endDate", value)?,
                    None => auction.end_date,
                };
                // 시작일은 entry 상태에서만 변경된다
                if status != Some(AuctionStatus::Entry) {
                    start_date = auction.start_date;
                }
                if start_bid <= 0 {
                    return Err(Error::InvalidInput(
                        "startBid must be a positive number".to_string(),
                    ));
                }
                if start_date > end_date {
                    return Err(Error::InvalidInput("startDate > endDate".to_string()));
                }

                sqlx::query_as::<_, Auction>(UPDATE_AUCTION)
                    .bind(item_id)
                    .bind(start_bid)
                    .bind(start_date)
                    .bind(end_date)
                    .bind(auction_id)
                    .fetch_one(&mut **tx)
                    .await
                    .map_err(map_active_auction_conflict)
            })
        })
        .await
}

/// 경매 삭제
/// 생성자만, 종료 전까지만 가능하다. 입찰 원장은 경매와 함께 제거된다.
pub async fn delete_auction(
    db_manager: &DatabaseManager,
    user_id: i64,
    auction_id: i64,
) -> Result<Auction, Error> {
    info!(
        "{:<12} --> 경매 삭제 요청 처리 시작 auction: {} user: {}",
        "Command", auction_id, user_id
    );

    db_manager
        .transaction(|tx| {
            Box::pin(async move {
                let auction = sqlx::query_as::<_, Auction>(queries::GET_AUCTION)
                    .bind(auction_id)
                    .fetch_optional(&mut **tx)
                    .await?
                    .ok_or(Error::NotFound("auction"))?;

                if auction.by_user != user_id {
                    return Err(Error::NotOwner("auction not created by user".to_string()));
                }
                if AuctionStatus::parse(&auction.status) == Some(AuctionStatus::Closed) {
                    return Err(Error::InvalidState("auction is closed".to_string()));
                }

                sqlx::query("DELETE FROM auctions WHERE id = $1")
                    .bind(auction_id)
                    .execute(&mut **tx)
                    .await?;

                // 이력에서 경매와 입찰 참조 제거
                sqlx::query("UPDATE users SET auctions = array_remove(auctions, $1) WHERE id = $2")
                    .bind(auction_id)
                    .bind(user_id)
                    .execute(&mut **tx)
                    .await?;
                if !auction.bids.is_empty() {
                    sqlx::query(
                        r#"
                        UPDATE users
                        SET bids = (
                            SELECT COALESCE(array_agg(x), '{}'::bigint[])
                            FROM unnest(users.bids) AS x
                            WHERE NOT (x = ANY($1))
                        )
                        WHERE users.bids && $1
                        "#,
                    )
                    .bind(&auction.bids)
                    .execute(&mut **tx)
                    .await?;
                }

                Ok(auction)
            })
        })
        .await
}

/// 진행 중 경매 중복 생성이 유니크 인덱스에 걸린 경우 Conflict로 변환
fn map_active_auction_conflict(error: sqlx::Error) -> Error {
    if let sqlx::Error::Database(db_error) = &error {
        if db_error.constraint() == Some("one_active_auction_per_item") {
            return Error::Conflict("active auction exists for item".to_string());
        }
    }
    Error::Database(error)
}
// endregion: --- Auctions

// region:    --- Auction Items
/// 상품 등록
pub async fn create_item(
    db_manager: &DatabaseManager,
    owner_id: i64,
    cmd: CreateItemCommand,
) -> Result<AuctionItem, Error> {
    info!(
        "{:<12} --> 상품 등록 요청 처리 시작 owner: {}",
        "Command", owner_id
    );
    validate::item_fields(&cmd.name, &cmd.details, &cmd.condition)?;

    db_manager
        .transaction(|tx| {
            Box::pin(async move {
                sqlx::query_as::<_, AuctionItem>(INSERT_ITEM)
                    .bind(owner_id)
                    .bind(&cmd.name)
                    .bind(&cmd.details)
                    .bind(&cmd.condition)
                    .bind(Utc::now())
                    .fetch_one(&mut **tx)
                    .await
                    .map_err(Error::from)
            })
        })
        .await
}

/// 상품 수정 (소유자만)
pub async fn update_item(
    db_manager: &DatabaseManager,
    user_id: i64,
    item_id: i64,
    cmd: UpdateItemCommand,
) -> Result<AuctionItem, Error> {
    info!(
        "{:<12} --> 상품 수정 요청 처리 시작 item: {} user: {}",
        "Command", item_id, user_id
    );

    db_manager
        .transaction(|tx| {
            Box::pin(async move {
                let item = sqlx::query_as::<_, AuctionItem>(queries::GET_ITEM)
                    .bind(item_id)
                    .fetch_optional(&mut **tx)
                    .await?
                    .ok_or(Error::NotFound("auction item"))?;
                if item.owned_by != user_id {
                    return Err(Error::NotOwner(format!(
                        "user {} does not own item {}",
                        user_id, item.id
                    )));
                }

                let name = cmd.name.unwrap_or(item.name);
                let details = cmd.details.unwrap_or(item.details);
                let condition = cmd.condition.unwrap_or(item.condition);
                validate::item_fields(&name, &details, &condition)?;

                sqlx::query_as::<_, AuctionItem>(UPDATE_ITEM)
                    .bind(&name)
                    .bind(&details)
                    .bind(&condition)
                    .bind(item_id)
                    .fetch_one(&mut **tx)
                    .await
                    .map_err(Error::from)
            })
        })
        .await
}
// endregion: --- Auction Items
