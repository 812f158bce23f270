// region:    --- Imports
use super::queries;
use crate::auction::model::{Auction, AuctionExpanded, AuctionItem, Bid, User};
use crate::database::DatabaseManager;
use crate::error::Error;
use tracing::info;

// endregion: --- Imports

// region:    --- Query Handlers

/// 경매 조회
pub async fn get_auction(db_manager: &DatabaseManager, auction_id: i64) -> Result<Auction, Error> {
    info!("{:<12} --> 경매 조회 id: {}", "Query", auction_id);
    db_manager
        .transaction(|tx| {
            Box::pin(async move {
                sqlx::query_as::<_, Auction>(queries::GET_AUCTION)
                    .bind(auction_id)
                    .fetch_optional(&mut **tx)
                    .await?
                    .ok_or(Error::NotFound("auction"))
            })
        })
        .await
}

/// 경매 확장 조회
/// 경매와 상품, 입찰 이력, 최고 입찰을 한 번에 합쳐서 내려준다.
pub async fn get_auction_expanded(
    db_manager: &DatabaseManager,
    auction_id: i64,
) -> Result<AuctionExpanded, Error> {
    info!("{:<12} --> 경매 확장 조회 id: {}", "Query", auction_id);
    db_manager
        .transaction(|tx| {
            Box::pin(async move {
                let auction = sqlx::query_as::<_, Auction>(queries::GET_AUCTION)
                    .bind(auction_id)
                    .fetch_optional(&mut **tx)
                    .await?
                    .ok_or(Error::NotFound("auction"))?;

                let item = sqlx::query_as::<_, AuctionItem>(queries::GET_ITEM)
                    .bind(auction.item)
                    .fetch_optional(&mut **tx)
                    .await?
                    .ok_or(Error::NotFound("auction item"))?;

                let bids = sqlx::query_as::<_, Bid>(queries::GET_AUCTION_BIDS)
                    .bind(auction.id)
                    .fetch_all(&mut **tx)
                    .await?;

                let highest_bid = auction
                    .highest_bid
                    .and_then(|id| bids.iter().find(|bid| bid.id == id).cloned());

                Ok(AuctionExpanded {
                    id: auction.id,
                    by_user: auction.by_user,
                    item,
                    start_bid: auction.start_bid,
                    start_date: auction.start_date,
                    end_date: auction.end_date,
                    status: auction.status,
                    bids,
                    highest_bid,
                    winner: auction.winner,
                    entry_time: auction.entry_time,
                })
            })
        })
        .await
}

/// 경매 목록 조회 (종료일 내림차순)
pub async fn get_auctions(
    db_manager: &DatabaseManager,
    page: i64,
    limit: i64,
) -> Result<Vec<Auction>, Error> {
    info!(
        "{:<12} --> 경매 목록 조회 page: {} limit: {}",
        "Query", page, limit
    );
    let offset = if page > 0 { (page - 1) * limit } else { 0 };
    db_manager
        .transaction(|tx| {
            Box::pin(async move {
                sqlx::query_as::<_, Auction>(queries::GET_AUCTIONS_PAGE)
                    .bind(limit)
                    .bind(offset)
                    .fetch_all(&mut **tx)
                    .await
                    .map_err(Error::from)
            })
        })
        .await
}

/// 입찰 id 목록 조회
pub async fn get_bids(db_manager: &DatabaseManager, bid_ids: Vec<i64>) -> Result<Vec<Bid>, Error> {
    info!("{:<12} --> 입찰 목록 조회 {}건", "Query", bid_ids.len());
    db_manager
        .transaction(|tx| {
            Box::pin(async move {
                sqlx::query_as::<_, Bid>(queries::GET_BIDS_BY_IDS)
                    .bind(&bid_ids)
                    .fetch_all(&mut **tx)
                    .await
                    .map_err(Error::from)
            })
        })
        .await
}

/// 상품 조회
pub async fn get_item(db_manager: &DatabaseManager, item_id: i64) -> Result<AuctionItem, Error> {
    info!("{:<12} --> 상품 조회 id: {}", "Query", item_id);
    db_manager
        .transaction(|tx| {
            Box::pin(async move {
                sqlx::query_as::<_, AuctionItem>(queries::GET_ITEM)
                    .bind(item_id)
                    .fetch_optional(&mut **tx)
                    .await?
                    .ok_or(Error::NotFound("auction item"))
            })
        })
        .await
}

/// 사용자 조회
pub async fn get_user(db_manager: &DatabaseManager, user_id: i64) -> Result<User, Error> {
    info!("{:<12} --> 사용자 조회 id: {}", "Query", user_id);
    db_manager
        .transaction(|tx| {
            Box::pin(async move {
                sqlx::query_as::<_, User>(queries::GET_USER)
                    .bind(user_id)
                    .fetch_optional(&mut **tx)
                    .await?
                    .ok_or(Error::NotFound("user"))
            })
        })
        .await
}

/// 이메일로 사용자 조회
pub async fn get_user_by_email(
    db_manager: &DatabaseManager,
    email: String,
) -> Result<Option<User>, Error> {
    db_manager
        .transaction(|tx| {
            Box::pin(async move {
                sqlx::query_as::<_, User>(queries::GET_USER_BY_EMAIL)
                    .bind(email)
                    .fetch_optional(&mut **tx)
                    .await
                    .map_err(Error::from)
            })
        })
        .await
}

// endregion: --- Query Handlers
