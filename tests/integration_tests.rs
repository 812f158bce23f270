use auction_house::auction::commands::{
    self, CreateAuctionCommand, CreateItemCommand, UpdateAuctionCommand,
};
use auction_house::auction::model::{Auction, AuctionItem, User};
use auction_house::database::DatabaseManager;
use auction_house::dates;
use auction_house::error::Error;
use auction_house::query;
use auction_house::scheduler;
use auction_house::user::{self, LoginCommand, SignupCommand};
use chrono::Duration;
use std::sync::Arc;

/// 데이터베이스 매니저 설정
async fn setup() -> Arc<DatabaseManager> {
    dotenv::dotenv().ok();
    let db_manager = Arc::new(DatabaseManager::new().await);
    db_manager
        .initialize_database()
        .await
        .expect("스키마 초기화 실패");
    db_manager
}

/// 테스트용 사용자 생성
async fn create_test_user(db_manager: &DatabaseManager, tag: &str) -> User {
    user::signup(
        db_manager,
        SignupCommand {
            email: format!("{}-{}@test.io", tag, rand::random::<u64>()),
            password: "hunter22".to_string(),
            name: Some(format!("{} 테스트 사용자", tag)),
        },
    )
    .await
    .expect("테스트 사용자 생성 실패")
}

/// 테스트용 상품 생성
async fn create_test_item(db_manager: &DatabaseManager, owner_id: i64) -> AuctionItem {
    commands::create_item(
        db_manager,
        owner_id,
        CreateItemCommand {
            name: "청자 매병".to_string(),
            details: "경매 기능 테스트를 위한 상품입니다.".to_string(),
            condition: "used".to_string(),
        },
    )
    .await
    .expect("테스트 상품 생성 실패")
}

/// 오늘 기준 상대 날짜 문자열
fn day_offset(days: i64) -> String {
    dates::format_date(dates::today() + Duration::days(days))
}

/// 오늘 시작하는 경매 생성 (종료일은 멀리 둬서 폐장 스윕에 걸리지 않게 한다)
async fn create_open_auction(
    db_manager: &DatabaseManager,
    creator_id: i64,
    item_id: i64,
    start_bid: i64,
) -> Auction {
    commands::create_auction(
        db_manager,
        creator_id,
        CreateAuctionCommand {
            item: item_id,
            start_bid,
            start_date: day_offset(0),
            end_date: day_offset(30),
        },
    )
    .await
    .expect("테스트 경매 생성 실패")
}

/// 종료일을 과거로 돌려 폐장 스윕 대상으로 만든다
async fn force_end_date_past(db_manager: &DatabaseManager, auction_id: i64) {
    sqlx::query("UPDATE auctions SET end_date = $1 WHERE id = $2")
        .bind(dates::today() - Duration::days(1))
        .bind(auction_id)
        .execute(db_manager.pool())
        .await
        .expect("종료일 변경 실패");
}

/// 입찰 시퀀스 테스트
/// 시작가 100: [100 승인, 100 동률 거부, 150 승인, 120 거부, 200 승인]
/// 이후 폐장 스윕에서 200 입찰자가 낙찰되고 소유권이 넘어간다.
#[tokio::test]
async fn bid_sequence_tracks_highest() {
    let db_manager = setup().await;
    let seller = create_test_user(&db_manager, "seller").await;
    let alice = create_test_user(&db_manager, "alice").await;
    let bob = create_test_user(&db_manager, "bob").await;
    let item = create_test_item(&db_manager, seller.id).await;
    let auction = create_open_auction(&db_manager, seller.id, item.id, 100).await;
    assert_eq!(auction.status, "open");

    // 첫 입찰은 시작가와 같아도 승인된다
    let first = commands::place_bid(&db_manager, auction.id, alice.id, 100)
        .await
        .unwrap();

    // 현재 최고가와 같은 금액은 거부된다
    let tie = commands::place_bid(&db_manager, auction.id, bob.id, 100).await;
    assert!(matches!(tie, Err(Error::InsufficientAmount)));

    let second = commands::place_bid(&db_manager, auction.id, bob.id, 150)
        .await
        .unwrap();
    let low = commands::place_bid(&db_manager, auction.id, alice.id, 120).await;
    assert!(matches!(low, Err(Error::InsufficientAmount)));
    let third = commands::place_bid(&db_manager, auction.id, alice.id, 200)
        .await
        .unwrap();

    let current = query::handlers::get_auction(&db_manager, auction.id)
        .await
        .unwrap();
    assert_eq!(current.highest_bid, Some(third.id));
    assert_eq!(current.bids, vec![first.id, second.id, third.id]);

    // 폐장 후 낙찰자와 소유권 확인
    force_end_date_past(&db_manager, auction.id).await;
    scheduler::run_close_sweep(db_manager.pool()).await.unwrap();

    let closed = query::handlers::get_auction(&db_manager, auction.id)
        .await
        .unwrap();
    assert_eq!(closed.status, "closed");
    assert_eq!(closed.winner, Some(alice.id));
    let owned = query::handlers::get_item(&db_manager, item.id).await.unwrap();
    assert_eq!(owned.owned_by, alice.id);
}

/// 시작가 미만 입찰 거부 테스트
#[tokio::test]
async fn bid_below_start_bid_rejected() {
    let db_manager = setup().await;
    let seller = create_test_user(&db_manager, "seller").await;
    let bidder = create_test_user(&db_manager, "bidder").await;
    let item = create_test_item(&db_manager, seller.id).await;
    let auction = create_open_auction(&db_manager, seller.id, item.id, 100).await;

    // 이전 입찰이 없어도 시작가 미만은 거부된다
    let low = commands::place_bid(&db_manager, auction.id, bidder.id, 99).await;
    assert!(matches!(low, Err(Error::InsufficientAmount)));
}

/// open 상태가 아닌 경매 입찰 거부 테스트
#[tokio::test]
async fn bid_rejected_unless_open() {
    let db_manager = setup().await;
    let seller = create_test_user(&db_manager, "seller").await;
    let bidder = create_test_user(&db_manager, "bidder").await;

    // entry 상태 (시작일이 내일)
    let item = create_test_item(&db_manager, seller.id).await;
    let entry_auction = commands::create_auction(
        &db_manager,
        seller.id,
        CreateAuctionCommand {
            item: item.id,
            start_bid: 100,
            start_date: day_offset(1),
            end_date: day_offset(30),
        },
    )
    .await
    .unwrap();
    assert_eq!(entry_auction.status, "entry");
    let too_early = commands::place_bid(&db_manager, entry_auction.id, bidder.id, 10_000).await;
    assert!(matches!(too_early, Err(Error::InvalidState(_))));

    // closed 상태
    let item2 = create_test_item(&db_manager, seller.id).await;
    let closed_auction = create_open_auction(&db_manager, seller.id, item2.id, 100).await;
    force_end_date_past(&db_manager, closed_auction.id).await;
    scheduler::run_close_sweep(db_manager.pool()).await.unwrap();
    let too_late = commands::place_bid(&db_manager, closed_auction.id, bidder.id, 10_000).await;
    assert!(matches!(too_late, Err(Error::InvalidState(_))));
}

/// 본인 경매 입찰 거부 테스트
#[tokio::test]
async fn own_auction_bid_rejected() {
    let db_manager = setup().await;
    let seller = create_test_user(&db_manager, "seller").await;
    let item = create_test_item(&db_manager, seller.id).await;
    let auction = create_open_auction(&db_manager, seller.id, item.id, 100).await;

    let own = commands::place_bid(&db_manager, auction.id, seller.id, 200).await;
    assert!(matches!(own, Err(Error::InvalidOperation(_))));
}

/// 없는 경매 입찰 테스트
#[tokio::test]
async fn bid_on_missing_auction_not_found() {
    let db_manager = setup().await;
    let bidder = create_test_user(&db_manager, "bidder").await;

    let missing = commands::place_bid(&db_manager, i64::MAX, bidder.id, 100).await;
    assert!(matches!(missing, Err(Error::NotFound(_))));
}

/// 경매 생성 가드 테스트
/// 같은 상품에 진행 중 경매가 있으면 실패하고, 닫힌 뒤에는 성공한다.
#[tokio::test]
async fn create_auction_guard() {
    let db_manager = setup().await;
    let seller = create_test_user(&db_manager, "seller").await;
    let stranger = create_test_user(&db_manager, "stranger").await;
    let item = create_test_item(&db_manager, seller.id).await;

    // 소유자가 아니면 거부
    let not_owner = commands::create_auction(
        &db_manager,
        stranger.id,
        CreateAuctionCommand {
            item: item.id,
            start_bid: 100,
            start_date: day_offset(0),
            end_date: day_offset(30),
        },
    )
    .await;
    assert!(matches!(not_owner, Err(Error::NotOwner(_))));

    let first = create_open_auction(&db_manager, seller.id, item.id, 100).await;

    // 진행 중 경매가 있으면 충돌
    let conflict = commands::create_auction(
        &db_manager,
        seller.id,
        CreateAuctionCommand {
            item: item.id,
            start_bid: 200,
            start_date: day_offset(0),
            end_date: day_offset(30),
        },
    )
    .await;
    assert!(matches!(conflict, Err(Error::Conflict(_))));

    // 닫힌 뒤에는 다시 열 수 있다
    force_end_date_past(&db_manager, first.id).await;
    scheduler::run_close_sweep(db_manager.pool()).await.unwrap();
    let reopened = create_open_auction(&db_manager, seller.id, item.id, 200).await;
    assert_eq!(reopened.status, "open");
}

/// 경매 생성 입력 검증 테스트
#[tokio::test]
async fn create_auction_validates_input() {
    let db_manager = setup().await;
    let seller = create_test_user(&db_manager, "seller").await;

    // 검증은 저장소 접근보다 먼저 실패한다
    let bad_format = commands::create_auction(
        &db_manager,
        seller.id,
        CreateAuctionCommand {
            item: i64::MAX,
            start_bid: 100,
            start_date: "2026-08-07".to_string(),
            end_date: day_offset(3),
        },
    )
    .await;
    assert!(matches!(bad_format, Err(Error::InvalidInput(_))));

    let reversed = commands::create_auction(
        &db_manager,
        seller.id,
        CreateAuctionCommand {
            item: i64::MAX,
            start_bid: 100,
            start_date: day_offset(3),
            end_date: day_offset(0),
        },
    )
    .await;
    assert!(matches!(reversed, Err(Error::InvalidInput(_))));

    let free_entry = commands::create_auction(
        &db_manager,
        seller.id,
        CreateAuctionCommand {
            item: i64::MAX,
            start_bid: 0,
            start_date: day_offset(0),
            end_date: day_offset(3),
        },
    )
    .await;
    assert!(matches!(free_entry, Err(Error::InvalidInput(_))));
}

/// 개장 스윕 테스트
/// 시작일이 된 entry 경매만 open으로 바뀌고 재실행해도 달라지지 않는다.
#[tokio::test]
async fn open_sweep_opens_entry_auctions() {
    let db_manager = setup().await;
    let seller = create_test_user(&db_manager, "seller").await;
    let item = create_test_item(&db_manager, seller.id).await;
    let auction = commands::create_auction(
        &db_manager,
        seller.id,
        CreateAuctionCommand {
            item: item.id,
            start_bid: 100,
            start_date: day_offset(1),
            end_date: day_offset(30),
        },
    )
    .await
    .unwrap();
    assert_eq!(auction.status, "entry");

    // 시작일이 아직 오지 않았으면 그대로다
    scheduler::run_open_sweep(db_manager.pool()).await.unwrap();
    let unchanged = query::handlers::get_auction(&db_manager, auction.id)
        .await
        .unwrap();
    assert_eq!(unchanged.status, "entry");

    // 시작일이 오늘이 되면 열린다
    sqlx::query("UPDATE auctions SET start_date = $1 WHERE id = $2")
        .bind(dates::today())
        .bind(auction.id)
        .execute(db_manager.pool())
        .await
        .unwrap();
    scheduler::run_open_sweep(db_manager.pool()).await.unwrap();
    let opened = query::handlers::get_auction(&db_manager, auction.id)
        .await
        .unwrap();
    assert_eq!(opened.status, "open");
    assert_eq!(opened.winner, None);
    assert!(opened.bids.is_empty());

    // 재실행은 no-op
    scheduler::run_open_sweep(db_manager.pool()).await.unwrap();
    let still_open = query::handlers::get_auction(&db_manager, auction.id)
        .await
        .unwrap();
    assert_eq!(still_open.status, "open");
}

/// 입찰 없는 경매 폐장 테스트
/// 낙찰자 없이 닫히고 소유권은 그대로다. 재실행도 no-op.
#[tokio::test]
async fn close_sweep_without_bids() {
    let db_manager = setup().await;
    let seller = create_test_user(&db_manager, "seller").await;
    let item = create_test_item(&db_manager, seller.id).await;
    let auction = create_open_auction(&db_manager, seller.id, item.id, 100).await;

    force_end_date_past(&db_manager, auction.id).await;
    scheduler::run_close_sweep(db_manager.pool()).await.unwrap();

    let closed = query::handlers::get_auction(&db_manager, auction.id)
        .await
        .unwrap();
    assert_eq!(closed.status, "closed");
    assert_eq!(closed.winner, None);
    let item_after = query::handlers::get_item(&db_manager, item.id).await.unwrap();
    assert_eq!(item_after.owned_by, seller.id);

    // 즉시 재실행해도 상태가 변하지 않는다
    scheduler::run_close_sweep(db_manager.pool()).await.unwrap();
    let unchanged = query::handlers::get_auction(&db_manager, auction.id)
        .await
        .unwrap();
    assert_eq!(unchanged.status, "closed");
    assert_eq!(unchanged.winner, None);
}

/// 경매 수정 규칙 테스트
#[tokio::test]
async fn update_auction_rules() {
    let db_manager = setup().await;
    let seller = create_test_user(&db_manager, "seller").await;
    let stranger = create_test_user(&db_manager, "stranger").await;
    let bidder = create_test_user(&db_manager, "bidder").await;
    let item = create_test_item(&db_manager, seller.id).await;
    let spare_item = create_test_item(&db_manager, seller.id).await;
    let auction = create_open_auction(&db_manager, seller.id, item.id, 100).await;

    // 생성자가 아니면 거부
    let not_creator = commands::update_auction(
        &db_manager,
        stranger.id,
        auction.id,
        UpdateAuctionCommand {
            start_bid: Some(500),
            ..Default::default()
        },
    )
    .await;
    assert!(matches!(not_creator, Err(Error::NotOwner(_))));

    // open 상태에서는 시작일이 바뀌지 않는다
    let updated = commands::update_auction(
        &db_manager,
        seller.id,
        auction.id,
        UpdateAuctionCommand {
            start_bid: Some(500),
            start_date: Some(day_offset(5)),
            ..Default::default()
        },
    )
    .await
    .unwrap();
    assert_eq!(updated.start_bid, 500);
    assert_eq!(updated.start_date, dates::today());

    // 입찰이 붙은 뒤에는 상품을 바꿀 수 없다
    commands::place_bid(&db_manager, auction.id, bidder.id, 500)
        .await
        .unwrap();
    let item_change = commands::update_auction(
        &db_manager,
        seller.id,
        auction.id,
        UpdateAuctionCommand {
            item: Some(spare_item.id),
            ..Default::default()
        },
    )
    .await;
    assert!(matches!(item_change, Err(Error::InvalidOperation(_))));

    // 닫힌 경매는 수정할 수 없다
    force_end_date_past(&db_manager, auction.id).await;
    scheduler::run_close_sweep(db_manager.pool()).await.unwrap();
    let after_close = commands::update_auction(
        &db_manager,
        seller.id,
        auction.id,
        UpdateAuctionCommand {
            start_bid: Some(900),
            ..Default::default()
        },
    )
    .await;
    assert!(matches!(after_close, Err(Error::InvalidState(_))));
}

/// 경매 삭제 테스트
/// 경매와 입찰 원장이 같이 사라지고 이력 참조도 정리된다.
#[tokio::test]
async fn delete_auction_removes_ledger() {
    let db_manager = setup().await;
    let seller = create_test_user(&db_manager, "seller").await;
    let bidder = create_test_user(&db_manager, "bidder").await;
    let item = create_test_item(&db_manager, seller.id).await;
    let auction = create_open_auction(&db_manager, seller.id, item.id, 100).await;
    let bid = commands::place_bid(&db_manager, auction.id, bidder.id, 150)
        .await
        .unwrap();

    commands::delete_auction(&db_manager, seller.id, auction.id)
        .await
        .unwrap();

    let gone = query::handlers::get_auction(&db_manager, auction.id).await;
    assert!(matches!(gone, Err(Error::NotFound(_))));
    let bids = query::handlers::get_bids(&db_manager, vec![bid.id])
        .await
        .unwrap();
    assert!(bids.is_empty());

    let seller_after = query::handlers::get_user(&db_manager, seller.id)
        .await
        .unwrap();
    assert!(!seller_after.auctions.contains(&auction.id));
    let bidder_after = query::handlers::get_user(&db_manager, bidder.id)
        .await
        .unwrap();
    assert!(!bidder_after.bids.contains(&bid.id));
}

/// 이력 역참조 테스트
/// 주최 경매와 입찰 이력이 본 기록과 함께 갱신된다.
#[tokio::test]
async fn history_back_references_updated() {
    let db_manager = setup().await;
    let seller = create_test_user(&db_manager, "seller").await;
    let bidder = create_test_user(&db_manager, "bidder").await;
    let item = create_test_item(&db_manager, seller.id).await;
    let auction = create_open_auction(&db_manager, seller.id, item.id, 100).await;
    let bid = commands::place_bid(&db_manager, auction.id, bidder.id, 100)
        .await
        .unwrap();

    let seller_after = query::handlers::get_user(&db_manager, seller.id)
        .await
        .unwrap();
    assert!(seller_after.auctions.contains(&auction.id));
    let bidder_after = query::handlers::get_user(&db_manager, bidder.id)
        .await
        .unwrap();
    assert!(bidder_after.bids.contains(&bid.id));
}

/// 경매 확장 조회 테스트
#[tokio::test]
async fn expanded_read_joins_references() {
    let db_manager = setup().await;
    let seller = create_test_user(&db_manager, "seller").await;
    let bidder = create_test_user(&db_manager, "bidder").await;
    let item = create_test_item(&db_manager, seller.id).await;
    let auction = create_open_auction(&db_manager, seller.id, item.id, 100).await;
    let first = commands::place_bid(&db_manager, auction.id, bidder.id, 100)
        .await
        .unwrap();
    let second = commands::place_bid(&db_manager, auction.id, bidder.id, 180)
        .await
        .unwrap();

    let expanded = query::handlers::get_auction_expanded(&db_manager, auction.id)
        .await
        .unwrap();
    assert_eq!(expanded.item.id, item.id);
    let bid_ids: Vec<i64> = expanded.bids.iter().map(|bid| bid.id).collect();
    assert_eq!(bid_ids, vec![first.id, second.id]);
    let highest = expanded.highest_bid.expect("최고 입찰 누락");
    assert_eq!(highest.id, second.id);
    assert_eq!(highest.amount, 180);
    assert_eq!(expanded.winner, None);
}

/// 경매 목록 조회 테스트
#[tokio::test]
async fn auction_listing_contains_new_auction() {
    let db_manager = setup().await;
    let seller = create_test_user(&db_manager, "seller").await;
    let item = create_test_item(&db_manager, seller.id).await;
    let auction = create_open_auction(&db_manager, seller.id, item.id, 100).await;

    let listed = query::handlers::get_auctions(&db_manager, 0, 100_000)
        .await
        .unwrap();
    assert!(listed.iter().any(|entry| entry.id == auction.id));
}

/// 가입/로그인 테스트
#[tokio::test]
async fn signup_and_login_roundtrip() {
    std::env::set_var("TOKEN_SECRET", "integration-secret");
    let db_manager = setup().await;
    let signed_up = create_test_user(&db_manager, "login").await;

    let (token, logged_in) = user::login(
        &db_manager,
        LoginCommand {
            email: signed_up.email.clone(),
            password: "hunter22".to_string(),
        },
    )
    .await
    .unwrap();
    assert_eq!(logged_in.id, signed_up.id);
    assert_eq!(auction_house::auth::verify_token(&token).unwrap(), signed_up.id);

    let wrong = user::login(
        &db_manager,
        LoginCommand {
            email: signed_up.email.clone(),
            password: "wrong-password".to_string(),
        },
    )
    .await;
    assert!(matches!(wrong, Err(Error::Unauthorized)));

    // 같은 이메일 재가입은 충돌
    let duplicate = user::signup(
        &db_manager,
        SignupCommand {
            email: signed_up.email.clone(),
            password: "hunter22".to_string(),
            name: None,
        },
    )
    .await;
    assert!(matches!(duplicate, Err(Error::Conflict(_))));
}
