use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::{models::Notification, PGPool};

pub async fn create(notification: &Notification, pool: &PGPool) -> Result<Notification, sqlx::Error> {
    sqlx::query_as::<_, Notification>(
        "INSERT INTO notifications (id, user_id, kind, title, message, read_at, created_at)
        VALUES ($1, $2, $3, $4, $5, $6, $7)
        RETURNING *",
    )
    .bind(notification.id)
    .bind(notification.user_id)
    .bind(&notification.kind)
    .bind(&notification.title)
    .bind(&notification.message)
    .bind(notification.read_at)
    .bind(notification.created_at)
    .fetch_one(pool)
    .await
}

pub async fn get_for_user(user_id: Uuid, pool: &PGPool) -> Result<Vec<Notification>, sqlx::Error> {
    sqlx::query_as::<_, Notification>(
        "SELECT * FROM notifications WHERE user_id = $1 ORDER BY created_at DESC",
    )
    .bind(user_id)
    .fetch_all(pool)
    .await
}

pub async fn count_unread(user_id: Uuid, pool: &PGPool) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar::<_, i64>(
        "SELECT COUNT(*) FROM notifications WHERE user_id = $1 AND read_at IS NULL",
    )
    .bind(user_id)
    .fetch_one(pool)
    .await
}

/// Keeps the first read timestamp when the notification was already read.
pub async fn mark_read(
    user_id: Uuid,
    id: Uuid,
    at: DateTime<Utc>,
    pool: &PGPool,
) -> Result<Option<Notification>, sqlx::Error> {
    sqlx::query_as::<_, Notification>(
        "UPDATE notifications SET read_at = COALESCE(read_at, $3)
        WHERE user_id = $1 AND id = $2
        RETURNING *",
    )
    .bind(user_id)
    .bind(id)
    .bind(at)
    .fetch_optional(pool)
    .await
}

pub async fn mark_all_read(user_id: Uuid, at: DateTime<Utc>, pool: &PGPool) -> Result<u64, sqlx::Error> {
    let res = sqlx::query(
        "UPDATE notifications SET read_at = $2 WHERE user_id = $1 AND read_at IS NULL",
    )
    .bind(user_id)
    .bind(at)
    .execute(pool)
    .await?;
    Ok(res.rows_affected())
}

pub async fn delete(user_id: Uuid, id: Uuid, pool: &PGPool) -> Result<u64, sqlx::Error> {
    let res = sqlx::query("DELETE FROM notifications WHERE user_id = $1 AND id = $2")
        .bind(user_id)
        .bind(id)
        .execute(pool)
        .await?;
    Ok(res.rows_affected())
}
