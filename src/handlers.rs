// region:    --- Imports
use axum::extract::{Path, Query, State};
use axum::response::IntoResponse;
use axum::Json;
use serde::Deserialize;
use std::sync::Arc;
use tracing::info;

use crate::auction::commands::{
    self, CreateAuctionCommand, CreateItemCommand, PlaceBidCommand, UpdateAuctionCommand,
    UpdateItemCommand,
};
use crate::auth::AuthUser;
use crate::database::DatabaseManager;
use crate::error::Error;
use crate::query;
use crate::user::{self, LoginCommand, SignupCommand, UpdateUserCommand};
use crate::validate;

// endregion: --- Imports

// region:    --- Auth Handlers

/// 가입 요청 처리
pub async fn handle_signup(
    State(db_manager): State<Arc<DatabaseManager>>,
    Json(cmd): Json<SignupCommand>,
) -> Result<impl IntoResponse, Error> {
    info!("{:<12} --> 가입 요청: {}", "Handler", cmd.email);
    let new_user = user::signup(&db_manager, cmd).await?;
    Ok(Json(new_user))
}

/// 로그인 요청 처리
pub async fn handle_login(
    State(db_manager): State<Arc<DatabaseManager>>,
    Json(cmd): Json<LoginCommand>,
) -> Result<impl IntoResponse, Error> {
    info!("{:<12} --> 로그인 요청: {}", "Handler", cmd.email);
    let (token, logged_in) = user::login(&db_manager, cmd).await?;
    Ok(Json(serde_json::json!({ "token": token, "user": logged_in })))
}

/// 비밀번호 재설정 요청 처리
pub async fn handle_reset_pass(
    State(db_manager): State<Arc<DatabaseManager>>,
    Json(cmd): Json<LoginCommand>,
) -> Result<impl IntoResponse, Error> {
    info!("{:<12} --> 비밀번호 재설정 요청: {}", "Handler", cmd.email);
    user::reset_password(&db_manager, cmd).await?;
    Ok(Json(serde_json::json!({ "success": true })))
}

// endregion: --- Auth Handlers

// region:    --- Auction Handlers

/// 경매 생성 요청 처리
pub async fn handle_create_auction(
    State(db_manager): State<Arc<DatabaseManager>>,
    AuthUser(user_id): AuthUser,
    Json(cmd): Json<CreateAuctionCommand>,
) -> Result<impl IntoResponse, Error> {
    info!("{:<12} --> 경매 생성 요청 user: {}", "Handler", user_id);
    let auction = commands::create_auction(&db_manager, user_id, cmd).await?;
    Ok(Json(auction))
}

/// 경매 확장 조회 요청 처리
pub async fn handle_get_auction(
    State(db_manager): State<Arc<DatabaseManager>>,
    Path(auction_id): Path<i64>,
) -> Result<impl IntoResponse, Error> {
    info!("{:<12} --> 경매 조회 id: {}", "HandlerQuery", auction_id);
    let auction = query::handlers::get_auction_expanded(&db_manager, auction_id).await?;
    Ok(Json(auction))
}

/// 경매 수정 요청 처리
pub async fn handle_update_auction(
    State(db_manager): State<Arc<DatabaseManager>>,
    AuthUser(user_id): AuthUser,
    Path(auction_id): Path<i64>,
    Json(cmd): Json<UpdateAuctionCommand>,
) -> Result<impl IntoResponse, Error> {
    info!(
        "{:<12} --> 경매 수정 요청 id: {} user: {}",
        "Handler", auction_id, user_id
    );
    let auction = commands::update_auction(&db_manager, user_id, auction_id, cmd).await?;
    Ok(Json(auction))
}

/// 경매 삭제 요청 처리
pub async fn handle_delete_auction(
    State(db_manager): State<Arc<DatabaseManager>>,
    AuthUser(user_id): AuthUser,
    Path(auction_id): Path<i64>,
) -> Result<impl IntoResponse, Error> {
    info!(
        "{:<12} --> 경매 삭제 요청 id: {} user: {}",
        "Handler", auction_id, user_id
    );
    let auction = commands::delete_auction(&db_manager, user_id, auction_id).await?;
    Ok(Json(auction))
}

/// 페이지네이션 파라미터
#[derive(Debug, Deserialize)]
pub struct Pagination {
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

/// 경매 목록 조회 요청 처리
pub async fn handle_get_auctions(
    State(db_manager): State<Arc<DatabaseManager>>,
    AuthUser(_user_id): AuthUser,
    Query(pagination): Query<Pagination>,
) -> Result<impl IntoResponse, Error> {
    info!("{:<12} --> 경매 목록 조회", "HandlerQuery");
    let page = pagination.page.unwrap_or(0);
    let limit = pagination.limit.unwrap_or(1000);
    let auctions = query::handlers::get_auctions(&db_manager, page, limit).await?;
    Ok(Json(auctions))
}

// endregion: --- Auction Handlers

// region:    --- Bid Handlers

/// 입찰 요청 처리
pub async fn handle_place_bid(
    State(db_manager): State<Arc<DatabaseManager>>,
    AuthUser(user_id): AuthUser,
    Path(auction_id): Path<i64>,
    Json(cmd): Json<PlaceBidCommand>,
) -> Result<impl IntoResponse, Error> {
    info!(
        "{:<12} --> 입찰 요청 auction: {} user: {}",
        "Handler", auction_id, user_id
    );
    // 금액 검증은 승인 로직보다 먼저 끝난다
    validate::bid_amount(cmd.amount)?;
    let bid = commands::place_bid(&db_manager, auction_id, user_id, cmd.amount).await?;
    Ok(Json(bid))
}

/// 입찰 목록 조회 요청 처리
/// 경로 파라미터는 JSON으로 직렬화된 입찰 id 배열이다.
pub async fn handle_get_bids(
    State(db_manager): State<Arc<DatabaseManager>>,
    AuthUser(_user_id): AuthUser,
    Path(bid_ids): Path<String>,
) -> Result<impl IntoResponse, Error> {
    info!("{:<12} --> 입찰 목록 조회", "HandlerQuery");
    let bid_ids: Vec<i64> = serde_json::from_str(&bid_ids)
        .map_err(|_| Error::InvalidInput("bids must be a JSON array of ids".to_string()))?;
    let bids = query::handlers::get_bids(&db_manager, bid_ids).await?;
    Ok(Json(bids))
}

// endregion: --- Bid Handlers

// region:    --- Item Handlers

/// 상품 등록 요청 처리
pub async fn handle_create_item(
    State(db_manager): State<Arc<DatabaseManager>>,
    AuthUser(user_id): AuthUser,
    Json(cmd): Json<CreateItemCommand>,
) -> Result<impl IntoResponse, Error> {
    info!("{:<12} --> 상품 등록 요청 user: {}", "Handler", user_id);
    let item = commands::create_item(&db_manager, user_id, cmd).await?;
    Ok(Json(item))
}

/// 상품 조회 요청 처리
pub async fn handle_get_item(
    State(db_manager): State<Arc<DatabaseManager>>,
    Path(item_id): Path<i64>,
) -> Result<impl IntoResponse, Error> {
    info!("{:<12} --> 상품 조회 id: {}", "HandlerQuery", item_id);
    let item = query::handlers::get_item(&db_manager, item_id).await?;
    Ok(Json(item))
}

/// 상품 수정 요청 처리
pub async fn handle_update_item(
    State(db_manager): State<Arc<DatabaseManager>>,
    AuthUser(user_id): AuthUser,
    Path(item_id): Path<i64>,
    Json(cmd): Json<UpdateItemCommand>,
) -> Result<impl IntoResponse, Error> {
    info!(
        "{:<12} --> 상품 수정 요청 id: {} user: {}",
        "Handler", item_id, user_id
    );
    let item = commands::update_item(&db_manager, user_id, item_id, cmd).await?;
    Ok(Json(item))
}

// endregion: --- Item Handlers

// region:    --- User Handlers

/// 사용자 조회 요청 처리
pub async fn handle_get_user(
    State(db_manager): State<Arc<DatabaseManager>>,
    Path(user_id): Path<i64>,
) -> Result<impl IntoResponse, Error> {
    info!("{:<12} --> 사용자 조회 id: {}", "HandlerQuery", user_id);
    let found = query::handlers::get_user(&db_manager, user_id).await?;
    Ok(Json(found))
}

/// 프로필 수정 요청 처리
pub async fn handle_update_user(
    State(db_manager): State<Arc<DatabaseManager>>,
    AuthUser(user_id): AuthUser,
    Json(cmd): Json<UpdateUserCommand>,
) -> Result<impl IntoResponse, Error> {
    info!("{:<12} --> 프로필 수정 요청 user: {}", "Handler", user_id);
    let updated = user::update_profile(&db_manager, user_id, cmd).await?;
    Ok(Json(updated))
}

// endregion: --- User Handlers
