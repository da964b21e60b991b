use sqlx::{Postgres, QueryBuilder};
use uuid::Uuid;

use crate::{dto, models::{Profile, User}, PGPool};

pub async fn create(user: &User, pool: &PGPool) -> Result<User, sqlx::Error> {
    sqlx::query_as::<_, User>(
        "INSERT INTO users (id, username, display_name, avatar_url, pwd_hash, access_token, created_at)
        VALUES ($1, $2, $3, $4, $5, $6, $7)
        RETURNING *",
    )
    .bind(user.id)
    .bind(&user.username)
    .bind(&user.display_name)
    .bind(&user.avatar_url)
    .bind(&user.pwd_hash)
    .bind(&user.access_token)
    .bind(user.created_at)
    .fetch_one(pool)
    .await
}

pub async fn get_by_id(id: Uuid, pool: &PGPool) -> Result<User, sqlx::Error> {
    sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1")
        .bind(id)
        .fetch_one(pool)
        .await
}

pub async fn get_by_username(username: &str, pool: &PGPool) -> Result<Option<User>, sqlx::Error> {
    sqlx::query_as::<_, User>("SELECT * FROM users WHERE username = $1")
        .bind(username)
        .fetch_optional(pool)
        .await
}

pub async fn exists(username: &str, pool: &PGPool) -> Result<bool, sqlx::Error> {
    sqlx::query_scalar::<_, bool>("SELECT EXISTS (SELECT 1 FROM users WHERE username = $1)")
        .bind(username)
        .fetch_one(pool)
        .await
}

pub async fn get_profile(id: Uuid, pool: &PGPool) -> Result<Option<Profile>, sqlx::Error> {
    sqlx::query_as::<_, Profile>(
        "SELECT id, username, display_name, avatar_url FROM users WHERE id = $1",
    )
    .bind(id)
    .fetch_optional(pool)
    .await
}

pub async fn get_attendee_profiles(party_id: Uuid, pool: &PGPool) -> Result<Vec<Profile>, sqlx::Error> {
    sqlx::query_as::<_, Profile>(
        "SELECT u.id, u.username, u.display_name, u.avatar_url
        FROM party_attendees a JOIN users u ON u.id = a.user_id
        WHERE a.party_id = $1 AND a.status = 'attending'
        ORDER BY a.created_at ASC",
    )
    .bind(party_id)
    .fetch_all(pool)
    .await
}

/// Stores the token that currently authenticates the user; `None` logs them out.
pub async fn set_access_token(id: Uuid, token: Option<&str>, pool: &PGPool) -> Result<u64, sqlx::Error> {
    let res = sqlx::query("UPDATE users SET access_token = $2 WHERE id = $1")
        .bind(id)
        .bind(token)
        .execute(pool)
        .await?;
    Ok(res.rows_affected())
}

pub async fn token_matches(id: Uuid, token: &str, pool: &PGPool) -> Result<bool, sqlx::Error> {
    sqlx::query_scalar::<_, bool>(
        "SELECT EXISTS (SELECT 1 FROM users WHERE id = $1 AND access_token = $2)",
    )
    .bind(id)
    .bind(token)
    .fetch_one(pool)
    .await
}

pub async fn set_profile_fields(
    id: Uuid,
    fields: &dto::UpdateProfileDto,
    pool: &PGPool,
) -> Result<User, sqlx::Error> {
    if fields.display_name.is_none() && fields.avatar_url.is_none() {
        return get_by_id(id, pool).await;
    }
    let mut query_builder: QueryBuilder<Postgres> = QueryBuilder::new("UPDATE users SET ");
    let mut separated = query_builder.separated(", ");
    if let Some(v) = &fields.display_name {
        separated.push("display_name = ").push_bind_unseparated(v.trim().to_string());
    }
    if let Some(v) = &fields.avatar_url {
        separated.push("avatar_url = ").push_bind_unseparated(v.trim().to_string());
    }
    query_builder.push(" WHERE id = ").push_bind(id).push(" RETURNING *");

    query_builder.build_query_as::<User>().fetch_one(pool).await
}
