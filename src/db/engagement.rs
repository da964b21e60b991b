//! Likes and attendances: one row per (party, user).

use uuid::Uuid;

use crate::{service::engagement::Engagement, PGPool};

fn exists_sql(kind: Engagement) -> &'static str {
    match kind {
        Engagement::Like => {
            "SELECT EXISTS (SELECT 1 FROM party_likes WHERE party_id = $1 AND user_id = $2)"
        }
        Engagement::Attendance => {
            "SELECT EXISTS (SELECT 1 FROM party_attendees
                WHERE party_id = $1 AND user_id = $2 AND status = 'attending')"
        }
    }
}

fn count_sql(kind: Engagement) -> &'static str {
    match kind {
        Engagement::Like => "SELECT COUNT(*) FROM party_likes WHERE party_id = $1",
        Engagement::Attendance => {
            "SELECT COUNT(*) FROM party_attendees WHERE party_id = $1 AND status = 'attending'"
        }
    }
}

fn insert_sql(kind: Engagement) -> &'static str {
    match kind {
        Engagement::Like => {
            "INSERT INTO party_likes (party_id, user_id) VALUES ($1, $2)
            ON CONFLICT (party_id, user_id) DO NOTHING"
        }
        Engagement::Attendance => {
            "INSERT INTO party_attendees (party_id, user_id, status) VALUES ($1, $2, 'attending')
            ON CONFLICT (party_id, user_id) DO UPDATE SET status = 'attending'
            WHERE party_attendees.status <> 'attending'"
        }
    }
}

fn delete_sql(kind: Engagement) -> &'static str {
    match kind {
        Engagement::Like => "DELETE FROM party_likes WHERE party_id = $1 AND user_id = $2",
        Engagement::Attendance => "DELETE FROM party_attendees WHERE party_id = $1 AND user_id = $2",
    }
}

pub async fn exists(kind: Engagement, party_id: Uuid, user_id: Uuid, pool: &PGPool) -> Result<bool, sqlx::Error> {
    sqlx::query_scalar::<_, bool>(exists_sql(kind))
        .bind(party_id)
        .bind(user_id)
        .fetch_one(pool)
        .await
}

pub async fn count(kind: Engagement, party_id: Uuid, pool: &PGPool) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar::<_, i64>(count_sql(kind))
        .bind(party_id)
        .fetch_one(pool)
        .await
}

/// Rows added; `0` when the user already had this engagement.
pub async fn insert(kind: Engagement, party_id: Uuid, user_id: Uuid, pool: &PGPool) -> Result<u64, sqlx::Error> {
    let res = sqlx::query(insert_sql(kind))
        .bind(party_id)
        .bind(user_id)
        .execute(pool)
        .await?;
    Ok(res.rows_affected())
}

pub async fn delete(kind: Engagement, party_id: Uuid, user_id: Uuid, pool: &PGPool) -> Result<u64, sqlx::Error> {
    let res = sqlx::query(delete_sql(kind))
        .bind(party_id)
        .bind(user_id)
        .execute(pool)
        .await?;
    Ok(res.rows_affected())
}

/// Ids of the parties the user attends.
pub async fn attended_party_ids(user_id: Uuid, pool: &PGPool) -> Result<Vec<Uuid>, sqlx::Error> {
    sqlx::query_scalar::<_, Uuid>(
        "SELECT party_id FROM party_attendees WHERE user_id = $1 AND status = 'attending'",
    )
    .bind(user_id)
    .fetch_all(pool)
    .await
}
