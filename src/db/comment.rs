use chrono::Utc;
use uuid::Uuid;

use crate::{models::Comment, PGPool};

pub async fn get_for_party(party_id: Uuid, pool: &PGPool) -> Result<Vec<Comment>, sqlx::Error> {
    sqlx::query_as::<_, Comment>(
        "SELECT c.id, c.party_id, c.user_id, c.comment, c.created_at,
            COALESCE(u.display_name, u.username) AS author
        FROM party_comments c LEFT JOIN users u ON u.id = c.user_id
        WHERE c.party_id = $1
        ORDER BY c.created_at ASC",
    )
    .bind(party_id)
    .fetch_all(pool)
    .await
}

pub async fn create(party_id: Uuid, user_id: Uuid, text: &str, pool: &PGPool) -> Result<Comment, sqlx::Error> {
    sqlx::query_as::<_, Comment>(
        "WITH inserted AS (
            INSERT INTO party_comments (id, party_id, user_id, comment, created_at)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *
        )
        SELECT i.id, i.party_id, i.user_id, i.comment, i.created_at,
            COALESCE(u.display_name, u.username) AS author
        FROM inserted i LEFT JOIN users u ON u.id = i.user_id",
    )
    .bind(Uuid::new_v4())
    .bind(party_id)
    .bind(user_id)
    .bind(text)
    .bind(Utc::now())
    .fetch_one(pool)
    .await
}
