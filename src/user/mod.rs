/// 사용자 계정 처리
/// 가입, 로그인, 비밀번호 재설정, 프로필 수정
// region:    --- Imports
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::auction::model::User;
use crate::auth;
use crate::database::DatabaseManager;
use crate::error::Error;
use crate::query::{handlers, queries};
use crate::validate;

// endregion: --- Imports

// region:    --- Commands
/// 가입 명령
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SignupCommand {
    pub email: String,
    pub password: String,
    pub name: Option<String>,
}

/// 로그인 명령
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginCommand {
    pub email: String,
    pub password: String,
}

/// 프로필 수정 명령
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct UpdateUserCommand {
    pub email: Option<String>,
    pub name: Option<String>,
}
// endregion: --- Commands

// region:    --- SQL
const INSERT_USER: &str = r#"
    INSERT INTO users (email, password, name, entry_time)
    VALUES ($1, $2, $3, $4)
    RETURNING id, email, password, name, auctions, bids, entry_time
"#;

const UPDATE_USER_PASSWORD: &str = "UPDATE users SET password = $1 WHERE id = $2";

const UPDATE_USER_PROFILE: &str = r#"
    UPDATE users
    SET email = $1, name = $2
    WHERE id = $3
    RETURNING id, email, password, name, auctions, bids, entry_time
"#;
// endregion: --- SQL

// region:    --- Account Handlers
/// 가입 처리
pub async fn signup(db_manager: &DatabaseManager, cmd: SignupCommand) -> Result<User, Error> {
    info!("{:<12} --> 가입 요청 처리 시작: {}", "Account", cmd.email);
    validate::email(&cmd.email)?;
    validate::password(&cmd.password)?;
    if let Some(name) = &cmd.name {
        validate::display_name(name)?;
    }

    if handlers::get_user_by_email(db_manager, cmd.email.clone())
        .await?
        .is_some()
    {
        return Err(Error::Conflict(format!("{} already exists", cmd.email)));
    }

    let hashed = auth::hash_password(&cmd.password);
    db_manager
        .transaction(|tx| {
            Box::pin(async move {
                sqlx::query_as::<_, User>(INSERT_USER)
                    .bind(&cmd.email)
                    .bind(&hashed)
                    .bind(&cmd.name)
                    .bind(Utc::now())
                    .fetch_one(&mut **tx)
                    .await
                    .map_err(map_email_conflict)
            })
        })
        .await
}

/// 로그인 처리, 성공 시 토큰과 사용자 반환
pub async fn login(db_manager: &DatabaseManager, cmd: LoginCommand) -> Result<(String, User), Error> {
    info!("{:<12} --> 로그인 요청 처리 시작: {}", "Account", cmd.email);
    validate::email(&cmd.email)?;
    validate::password(&cmd.password)?;

    let user = handlers::get_user_by_email(db_manager, cmd.email.clone())
        .await?
        .ok_or(Error::NotFound("user"))?;
    if !auth::verify_password(&cmd.password, &user.password) {
        return Err(Error::Unauthorized);
    }

    let token = auth::sign_token(user.id)?;
    Ok((token, user))
}

/// 비밀번호 재설정
pub async fn reset_password(db_manager: &DatabaseManager, cmd: LoginCommand) -> Result<(), Error> {
    info!(
        "{:<12} --> 비밀번호 재설정 요청 처리 시작: {}",
        "Account", cmd.email
    );
    validate::email(&cmd.email)?;
    validate::password(&cmd.password)?;

    let user = handlers::get_user_by_email(db_manager, cmd.email.clone())
        .await?
        .ok_or(Error::NotFound("user"))?;

    let hashed = auth::hash_password(&cmd.password);
    db_manager
        .transaction(|tx| {
            Box::pin(async move {
                sqlx::query(UPDATE_USER_PASSWORD)
                    .bind(&hashed)
                    .bind(user.id)
                    .execute(&mut **tx)
                    .await
                    .map_err(Error::from)?;
                Ok(())
            })
        })
        .await
}

/// 프로필 수정 (본인만)
pub async fn update_profile(
    db_manager: &DatabaseManager,
    user_id: i64,
    cmd: UpdateUserCommand,
) -> Result<User, Error> {
    info!(
        "{:<12} --> 프로필 수정 요청 처리 시작 user: {}",
        "Account", user_id
    );

    db_manager
        .transaction(|tx| {
            Box::pin(async move {
                let user = sqlx::query_as::<_, User>(queries::GET_USER)
                    .bind(user_id)
                    .fetch_optional(&mut **tx)
                    .await?
                    .ok_or(Error::NotFound("user"))?;

                let email = cmd.email.unwrap_or(user.email);
                let name = cmd.name.or(user.name);
                validate::email(&email)?;
                if let Some(name) = &name {
                    validate::display_name(name)?;
                }

                sqlx::query_as::<_, User>(UPDATE_USER_PROFILE)
                    .bind(&email)
                    .bind(&name)
                    .bind(user_id)
                    .fetch_one(&mut **tx)
                    .await
                    .map_err(map_email_conflict)
            })
        })
        .await
}

/// 이메일 유니크 제약 위반을 Conflict로 변환
fn map_email_conflict(error: sqlx::Error) -> Error {
    if let sqlx::Error::Database(db_error) = &error {
        if db_error.constraint() == Some("users_email_key") {
            return Error::Conflict("email already exists".to_string());
        }
    }
    Error::Database(error)
}
// endregion: --- Account Handlers
