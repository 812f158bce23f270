/// 경매 조회
pub const GET_AUCTION: &str = "SELECT id, by_user, item, start_bid, start_date, end_date, status, bids, highest_bid, winner, entry_time FROM auctions WHERE id = $1";

/// 경매 목록 조회 (종료일 내림차순, 페이지네이션)
pub const GET_AUCTIONS_PAGE: &str = r#"
    SELECT id, by_user, item, start_bid, start_date, end_date, status, bids, highest_bid, winner, entry_time
    FROM auctions
    ORDER BY end_date DESC, id DESC
    LIMIT $1 OFFSET $2
"#;

/// 경매의 입찰 이력 조회 (입찰 순서대로)
pub const GET_AUCTION_BIDS: &str = r#"
    SELECT id, for_auction, by_user, amount, entry_time
    FROM bids
    WHERE for_auction = $1
    ORDER BY entry_time ASC, id ASC
"#;

/// 입찰 id 목록 조회
pub const GET_BIDS_BY_IDS: &str = r#"
    SELECT id, for_auction, by_user, amount, entry_time
    FROM bids
    WHERE id = ANY($1)
    ORDER BY entry_time ASC, id ASC
"#;

/// 상품 조회
pub const GET_ITEM: &str =
    "SELECT id, owned_by, name, details, condition, entry_time FROM auction_items WHERE id = $1";

/// 사용자 조회
pub const GET_USER: &str =
    "SELECT id, email, password, name, auctions, bids, entry_time FROM users WHERE id = $1";

/// 이메일로 사용자 조회
pub const GET_USER_BY_EMAIL: &str =
    "SELECT id, email, password, name, auctions, bids, entry_time FROM users WHERE email = $1";
