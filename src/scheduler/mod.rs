/// 경매 상태 전환 스케줄러
/// 1. 개장 스윕: 시작일이 오늘인 entry 경매를 open으로 전환
/// 2. 폐장 스윕: 종료일이 지난 open 경매를 배치로 닫고 낙찰자와 소유권을 확정
/// 두 스윕 모두 조건이 멱등이라 재실행과 동시 실행에 안전하다.
// region:    --- Imports
use chrono::{Local, NaiveDate};
use sqlx::PgPool;
use std::sync::Arc;
use tokio::time::{sleep, Duration};
use tracing::{error, info};

use crate::dates;
use crate::error::Error;

// endregion: --- Imports

// region:    --- SQL
const OPEN_ENTRY_AUCTIONS: &str =
    "UPDATE auctions SET status = 'open' WHERE status = 'entry' AND start_date = $1";

/// 닫을 경매와 최고 입찰자를 함께 읽는다.
/// 종료일이 지난 경매도 잡아서 스윕을 놓친 경매가 open에 갇히지 않게 한다.
const SELECT_CLOSABLE: &str = r#"
    SELECT a.id, a.item, b.by_user AS winner
    FROM auctions AS a
    LEFT JOIN bids AS b ON b.id = a.highest_bid
    WHERE a.status = 'open' AND a.end_date <= $1
    ORDER BY a.id
    LIMIT $2
"#;

const CLOSE_WITH_WINNER: &str = r#"
    UPDATE auctions AS a
    SET status = 'closed', winner = data.winner
    FROM (SELECT unnest($1::bigint[]) AS id, unnest($2::bigint[]) AS winner) AS data
    WHERE a.id = data.id AND a.status = 'open'
"#;

const CLOSE_WITHOUT_WINNER: &str =
    "UPDATE auctions SET status = 'closed' WHERE id = ANY($1) AND status = 'open'";

const TRANSFER_OWNERSHIP: &str = r#"
    UPDATE auction_items AS i
    SET owned_by = data.winner
    FROM (SELECT unnest($1::bigint[]) AS item, unnest($2::bigint[]) AS winner) AS data
    WHERE i.id = data.item
"#;
// endregion: --- SQL

/// 한 배치에서 닫는 경매 수 상한
const CLOSE_BATCH_SIZE: i64 = 512;

/// 개장 스윕 시각 (하루 시작)
const OPEN_SWEEP_AT: (u32, u32) = (0, 0);

/// 폐장 스윕 시각 (하루 끝)
const CLOSE_SWEEP_AT: (u32, u32) = (23, 59);

// region:    --- Sweeps
/// 폐장 스윕이 닫을 경매 한 건
#[derive(Debug, sqlx::FromRow)]
struct ClosableAuction {
    id: i64,
    item: i64,
    winner: Option<i64>,
}

/// 개장 스윕 실행
pub async fn run_open_sweep(pool: &PgPool) -> Result<u64, Error> {
    run_open_sweep_for(pool, dates::today()).await
}

async fn run_open_sweep_for(pool: &PgPool, day: NaiveDate) -> Result<u64, Error> {
    info!(
        "{:<12} --> 개장 스윕 시작: {}",
        "Scheduler",
        dates::format_date(day)
    );
    let opened = sqlx::query(OPEN_ENTRY_AUCTIONS)
        .bind(day)
        .execute(pool)
        .await?
        .rows_affected();
    info!("{:<12} --> 개장 스윕 완료: {}건 전환", "Scheduler", opened);
    Ok(opened)
}

/// 폐장 스윕 실행
/// 배치가 빌 때까지 반복한다. 경매 상태와 낙찰자를 먼저 확정하고
/// 소유권 이전은 같은 트랜잭션에서 뒤따른다.
pub async fn run_close_sweep(pool: &PgPool) -> Result<u64, Error> {
    run_close_sweep_for(pool, dates::today()).await
}

async fn run_close_sweep_for(pool: &PgPool, day: NaiveDate) -> Result<u64, Error> {
    info!(
        "{:<12} --> 폐장 스윕 시작: {}",
        "Scheduler",
        dates::format_date(day)
    );
    let mut total: u64 = 0;

    loop {
        let batch: Vec<ClosableAuction> = sqlx::query_as(SELECT_CLOSABLE)
            .bind(day)
            .bind(CLOSE_BATCH_SIZE)
            .fetch_all(pool)
            .await?;
        if batch.is_empty() {
            break;
        }

        let mut won_ids: Vec<i64> = Vec::new();
        let mut won_items: Vec<i64> = Vec::new();
        let mut winners: Vec<i64> = Vec::new();
        let mut unbid_ids: Vec<i64> = Vec::new();
        for auction in &batch {
            match auction.winner {
                Some(winner) => {
                    won_ids.push(auction.id);
                    won_items.push(auction.item);
                    winners.push(winner);
                }
                None => unbid_ids.push(auction.id),
            }
        }

        let mut tx = pool.begin().await?;
        if !won_ids.is_empty() {
            sqlx::query(CLOSE_WITH_WINNER)
                .bind(&won_ids)
                .bind(&winners)
                .execute(&mut *tx)
                .await?;
        }
        if !unbid_ids.is_empty() {
            sqlx::query(CLOSE_WITHOUT_WINNER)
                .bind(&unbid_ids)
                .execute(&mut *tx)
                .await?;
        }
        if !won_items.is_empty() {
            sqlx::query(TRANSFER_OWNERSHIP)
                .bind(&won_items)
                .bind(&winners)
                .execute(&mut *tx)
                .await?;
        }
        tx.commit().await?;

        total += batch.len() as u64;
    }

    info!("{:<12} --> 폐장 스윕 완료: {}건 종료", "Scheduler", total);
    Ok(total)
}
// endregion: --- Sweeps

// region:    --- Auction Scheduler
/// 하루 두 번 스윕을 실행하는 스케줄러
pub struct AuctionScheduler {
    pool: Arc<PgPool>,
}

impl AuctionScheduler {
    pub fn new(pool: Arc<PgPool>) -> Self {
        Self { pool }
    }

    /// 스케줄러 시작
    pub async fn start(&self) {
        let pool = Arc::clone(&self.pool);
        tokio::spawn(async move {
            loop {
                sleep(duration_until(OPEN_SWEEP_AT)).await;
                if let Err(e) = run_open_sweep(&pool).await {
                    error!("{:<12} --> 개장 스윕 중 오류 발생: {:?}", "Scheduler", e);
                }
            }
        });

        let pool = Arc::clone(&self.pool);
        tokio::spawn(async move {
            loop {
                sleep(duration_until(CLOSE_SWEEP_AT)).await;
                if let Err(e) = run_close_sweep(&pool).await {
                    error!("{:<12} --> 폐장 스윕 중 오류 발생: {:?}", "Scheduler", e);
                }
            }
        });
    }
}

/// 다음 트리거 시각까지 남은 시간
fn duration_until((hour, minute): (u32, u32)) -> Duration {
    let now = Local::now().naive_local();
    let target = now
        .date()
        .and_hms_opt(hour, minute, 0)
        .expect("valid wall-clock trigger");
    let target = if target > now {
        target
    } else {
        target + chrono::Duration::days(1)
    };
    (target - now)
        .to_std()
        .map(|delta| delta.max(std::time::Duration::from_secs(1)))
        .unwrap_or(std::time::Duration::from_secs(60))
}
// endregion: --- Auction Scheduler
