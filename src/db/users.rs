use sqlx::{PgExecutor, Pool, Postgres};
use uuid::Uuid;

use crate::error::violated_unique_constraint;
use crate::models::profile::UserProfile;
use crate::models::user::{User, WECHAT_USERNAME_PREFIX};
use crate::db::profiles::{find_profile_by_openid, PROFILE_COLUMNS};

const USER_COLUMNS: &str =
    "id, username, email, password_hash, is_active, date_joined, last_login";

pub struct NewUser<'a> {
    pub username: &'a str,
    pub email: &'a str,
    /// `None` creates an account that can only sign in through WeChat.
    pub password_hash: Option<&'a str>,
    pub openid: Option<&'a str>,
}

/// Insert an account and its profile atomically.
pub async fn insert_user_with_profile(
    pool: &Pool<Postgres>,
    new_user: NewUser<'_>,
) -> Result<(User, UserProfile), sqlx::Error> {
    let mut tx = pool.begin().await?;

    let user = sqlx::query_as::<_, User>(&format!(
        r#"
        INSERT INTO users (id, username, email, password_hash)
        VALUES ($1, $2, $3, $4)
        RETURNING {}
        "#,
        USER_COLUMNS
    ))
    .bind(Uuid::new_v4())
    .bind(new_user.username)
    .bind(new_user.email)
    .bind(new_user.password_hash)
    .fetch_one(&mut *tx)
    .await?;

    let profile = sqlx::query_as::<_, UserProfile>(&format!(
        r#"
        INSERT INTO user_profiles (id, user_id, openid)
        VALUES ($1, $2, $3)
        RETURNING {}
        "#,
        PROFILE_COLUMNS
    ))
    .bind(Uuid::new_v4())
    .bind(user.id)
    .bind(new_user.openid)
    .fetch_one(&mut *tx)
    .await?;

    tx.commit().await?;

    tracing::info!("Created user {} ({})", user.username, user.id);
    Ok((user, profile))
}

pub async fn find_user_by_id(
    pool: &Pool<Postgres>,
    user_id: Uuid,
) -> Result<Option<User>, sqlx::Error> {
    sqlx::query_as::<_, User>(&format!("SELECT {} FROM users WHERE id = $1", USER_COLUMNS))
        .bind(user_id)
        .fetch_optional(pool)
        .await
}

pub async fn find_user_by_username(
    pool: &Pool<Postgres>,
    username: &str,
) -> Result<Option<User>, sqlx::Error> {
    sqlx::query_as::<_, User>(&format!("SELECT {} FROM users WHERE username = $1", USER_COLUMNS))
        .bind(username)
        .fetch_optional(pool)
        .await
}

/// Emails are not unique; the oldest active account wins.
pub async fn find_active_user_by_email(
    pool: &Pool<Postgres>,
    email: &str,
) -> Result<Option<User>, sqlx::Error> {
    sqlx::query_as::<_, User>(&format!(
        r#"
        SELECT {} FROM users
        WHERE LOWER(email) = LOWER($1) AND email <> '' AND is_active
        ORDER BY date_joined
        LIMIT 1
        "#,
        USER_COLUMNS
    ))
    .bind(email)
    .fetch_optional(pool)
    .await
}

pub async fn username_taken(
    pool: &Pool<Postgres>,
    username: &str,
    except: Option<Uuid>,
) -> Result<bool, sqlx::Error> {
    sqlx::query_scalar::<_, bool>(
        "SELECT EXISTS (SELECT 1 FROM users WHERE username = $1 AND ($2::uuid IS NULL OR id <> $2))",
    )
    .bind(username)
    .bind(except)
    .fetch_one(pool)
    .await
}

pub async fn touch_last_login(pool: &Pool<Postgres>, user_id: Uuid) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE users SET last_login = NOW() WHERE id = $1")
        .bind(user_id)
        .execute(pool)
        .await?;
    Ok(())
}

pub async fn update_user<'e, E: PgExecutor<'e>>(
    executor: E,
    user_id: Uuid,
    username: Option<&str>,
    email: Option<&str>,
) -> Result<User, sqlx::Error> {
    sqlx::query_as::<_, User>(&format!(
        r#"
        UPDATE users
        SET username = COALESCE($2, username),
            email = COALESCE($3, email)
        WHERE id = $1
        RETURNING {}
        "#,
        USER_COLUMNS
    ))
    .bind(user_id)
    .bind(username)
    .bind(email)
    .fetch_one(executor)
    .await
}

pub async fn update_password<'e, E: PgExecutor<'e>>(
    executor: E,
    user_id: Uuid,
    password_hash: &str,
) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE users SET password_hash = $2 WHERE id = $1")
        .bind(user_id)
        .bind(password_hash)
        .execute(executor)
        .await?;
    Ok(())
}

const USERNAME_UNIQUE: &str = "users_username_key";
const OPENID_UNIQUE: &str = "user_profiles_openid_key";

/// Resolve a WeChat openid to its account, creating `wx_{openid}` on first login.
///
/// Two first logins racing on the same openid both end up on the account
/// whose insert won. When `wx_{openid}` is already held by an unrelated
/// account, a suffixed username is used instead.
pub async fn find_or_create_wechat_user(
    pool: &Pool<Postgres>,
    openid: &str,
) -> Result<(User, UserProfile, bool), sqlx::Error> {
    if let Some(found) = find_wechat_user(pool, openid).await? {
        return Ok((found.0, found.1, false));
    }

    let mut username = format!("{}{}", WECHAT_USERNAME_PREFIX, openid);
    loop {
        let created = insert_user_with_profile(
            pool,
            NewUser {
                username: &username,
                email: "",
                password_hash: None,
                openid: Some(openid),
            },
        )
        .await;

        match created {
            Ok((user, profile)) => return Ok((user, profile, true)),
            Err(e) => match violated_unique_constraint(&e).map(str::to_owned).as_deref() {
                Some(OPENID_UNIQUE) => {
                    tracing::info!("Concurrent WeChat signup for openid {}, reusing account", openid);
                    let (user, profile) = find_wechat_user(pool, openid)
                        .await?
                        .ok_or(sqlx::Error::RowNotFound)?;
                    return Ok((user, profile, false));
                }
                Some(USERNAME_UNIQUE) => {
                    tracing::warn!("Username {} is taken, picking a suffixed one", username);
                    let suffix = Uuid::new_v4().simple().to_string();
                    username = format!("{}{}_{}", WECHAT_USERNAME_PREFIX, openid, &suffix[..8]);
                }
                _ => return Err(e),
            },
        }
    }
}

async fn find_wechat_user(
    pool: &Pool<Postgres>,
    openid: &str,
) -> Result<Option<(User, UserProfile)>, sqlx::Error> {
    let Some(profile) = find_profile_by_openid(pool, openid).await? else {
        return Ok(None);
    };
    let user = find_user_by_id(pool, profile.user_id)
        .await?
        .ok_or(sqlx::Error::RowNotFound)?;
    Ok(Some((user, profile)))
}
