// region:    --- Imports
use axum::{
    routing::{get, patch, post},
    Router,
};
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tracing::{error, info};

use crate::database::DatabaseManager;
// endregion: --- Imports

// region:    --- Modules
mod auction;
mod auth;
mod database;
mod dates;
mod error;
mod handlers;
mod query;
mod scheduler;
mod user;
mod validate;

// endregion: --- Modules

// region:    --- Main
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 환경 변수 로드
    dotenv::dotenv().ok();

    // logging 초기화
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .without_time()
        .with_target(false)
        .init();

    // DatabaseManager 생성 (연결될 때까지 재시도)
    let db_manager = Arc::new(DatabaseManager::new().await);

    // 스키마 초기화
    if let Err(e) = db_manager.initialize_database().await {
        error!("{:<12} --> 데이터베이스 초기화 실패: {:?}", "Main", e);
        return Err(e.into());
    }
    info!("{:<12} --> 데이터베이스 초기화 성공", "Main");

    // 경매 상태 전환 스케줄러 시작
    let lifecycle = scheduler::AuctionScheduler::new(db_manager.get_pool());
    lifecycle.start().await;

    // 테스트 페이지를 위한 cors 설정
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // 라우터 설정
    let routes_all = Router::new()
        .route("/api/auth/signup", post(handlers::handle_signup))
        .route("/api/auth/login", post(handlers::handle_login))
        .route("/api/auth/reset-pass", post(handlers::handle_reset_pass))
        .route("/api/auctions", get(handlers::handle_get_auctions))
        .route("/api/auction", post(handlers::handle_create_auction))
        .route("/api/auction/item", post(handlers::handle_create_item))
        .route(
            "/api/auction/item/:id",
            get(handlers::handle_get_item).patch(handlers::handle_update_item),
        )
        .route(
            "/api/auction/:id",
            get(handlers::handle_get_auction)
                .patch(handlers::handle_update_auction)
                .delete(handlers::handle_delete_auction),
        )
        .route("/api/auction/:id/bid", post(handlers::handle_place_bid))
        .route("/api/bids/:ids", get(handlers::handle_get_bids))
        .route("/api/user/:id", get(handlers::handle_get_user))
        .route("/api/user", patch(handlers::handle_update_user))
        .layer(cors)
        .with_state(db_manager);

    // 리스너 생성
    let bind_addr = std::env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".to_string());
    let listener = TcpListener::bind(&bind_addr).await?;
    info!(
        "{:<12} --> Web Server: Listening on {}",
        "Main",
        listener.local_addr()?
    );

    // 서버 실행
    if let Err(err) = axum::serve(listener, routes_all.into_make_service()).await {
        error!("{:<12} --> Server error: {}", "Main", err);
    }
    Ok(())
}
// endregion: --- Main
