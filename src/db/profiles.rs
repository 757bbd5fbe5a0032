use sqlx::{PgExecutor, Pool, Postgres};
use uuid::Uuid;

use crate::models::auth::WechatUserInfo;
use crate::models::profile::{Gender, UserProfile, UpdateProfileRequest};

pub(crate) const PROFILE_COLUMNS: &str = "id, user_id, name, gender, birth_date, age, phone, \
    height, weight, medical_history, allergies, openid, nickname, avatar_url, city, province, \
    country, created_at, updated_at";

pub async fn find_profile_by_user(
    pool: &Pool<Postgres>,
    user_id: Uuid,
) -> Result<Option<UserProfile>, sqlx::Error> {
    sqlx::query_as::<_, UserProfile>(&format!(
        "SELECT {} FROM user_profiles WHERE user_id = $1",
        PROFILE_COLUMNS
    ))
    .bind(user_id)
    .fetch_optional(pool)
    .await
}

pub async fn find_profile_by_openid(
    pool: &Pool<Postgres>,
    openid: &str,
) -> Result<Option<UserProfile>, sqlx::Error> {
    sqlx::query_as::<_, UserProfile>(&format!(
        "SELECT {} FROM user_profiles WHERE openid = $1",
        PROFILE_COLUMNS
    ))
    .bind(openid)
    .fetch_optional(pool)
    .await
}

/// Apply the supplied fields; anything left `None` keeps its stored value.
pub async fn update_profile<'e, E: PgExecutor<'e>>(
    executor: E,
    user_id: Uuid,
    update: &UpdateProfileRequest,
) -> Result<UserProfile, sqlx::Error> {
    sqlx::query_as::<_, UserProfile>(&format!(
        r#"
        UPDATE user_profiles SET
            name = COALESCE($2, name),
            gender = COALESCE($3, gender),
            birth_date = COALESCE($4, birth_date),
            age = COALESCE($5, age),
            phone = COALESCE($6, phone),
            height = COALESCE($7, height),
            weight = COALESCE($8, weight),
            medical_history = COALESCE($9, medical_history),
            allergies = COALESCE($10, allergies),
            nickname = COALESCE($11, nickname),
            avatar_url = COALESCE($12, avatar_url),
            city = COALESCE($13, city),
            province = COALESCE($14, province),
            country = COALESCE($15, country),
            updated_at = NOW()
        WHERE user_id = $1
        RETURNING {}
        "#,
        PROFILE_COLUMNS
    ))
    .bind(user_id)
    .bind(update.name.as_deref())
    .bind(update.gender.as_deref())
    .bind(update.birth_date)
    .bind(update.age)
    .bind(update.phone.as_deref())
    .bind(update.height)
    .bind(update.weight)
    .bind(update.medical_history.as_deref())
    .bind(update.allergies.as_deref())
    .bind(update.nickname.as_deref())
    .bind(update.avatar_url.as_deref())
    .bind(update.city.as_deref())
    .bind(update.province.as_deref())
    .bind(update.country.as_deref())
    .fetch_one(executor)
    .await
}

/// Store what the mini-program reported about the user.
pub async fn apply_wechat_user_info(
    pool: &Pool<Postgres>,
    user_id: Uuid,
    info: &WechatUserInfo,
) -> Result<UserProfile, sqlx::Error> {
    let update = UpdateProfileRequest {
        gender: info
            .gender
            .and_then(Gender::from_wechat)
            .map(|gender| gender.as_code().to_string()),
        nickname: info.nick_name.as_deref().map(|nick| truncate(nick, 50)),
        avatar_url: info.avatar_url.clone().filter(|url| !url.is_empty()),
        city: info.city.as_deref().map(|city| truncate(city, 30)),
        province: info.province.as_deref().map(|province| truncate(province, 30)),
        country: info.country.as_deref().map(|country| truncate(country, 30)),
        ..Default::default()
    };
    update_profile(pool, user_id, &update).await
}

fn truncate(value: &str, max_chars: usize) -> String {
    value.chars().take(max_chars).collect()
}
