use chrono::{DateTime, Utc};
use sqlx::{Postgres, QueryBuilder};
use uuid::Uuid;

use crate::{dto, models::Party, PGPool};

pub async fn create(party: &Party, pool: &PGPool) -> Result<Party, sqlx::Error> {
    sqlx::query_as::<_, Party>(
        "INSERT INTO parties (id, title, description, location, latitude, longitude, datetime,
            genre, dresscode, entry_fee, is_public, created_by, access_id, created_at)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)
        RETURNING *",
    )
    .bind(party.id)
    .bind(&party.title)
    .bind(&party.description)
    .bind(&party.location)
    .bind(party.latitude)
    .bind(party.longitude)
    .bind(party.datetime)
    .bind(&party.genre)
    .bind(&party.dresscode)
    .bind(party.entry_fee)
    .bind(party.is_public)
    .bind(party.created_by)
    .bind(&party.access_id)
    .bind(party.created_at)
    .fetch_one(pool)
    .await
}

pub async fn get_by_id(id: Uuid, pool: &PGPool) -> Result<Party, sqlx::Error> {
    sqlx::query_as::<_, Party>("SELECT * FROM parties WHERE id = $1")
        .bind(id)
        .fetch_one(pool)
        .await
}

pub async fn get_by_access_id(access_id: &str, pool: &PGPool) -> Result<Option<Party>, sqlx::Error> {
    sqlx::query_as::<_, Party>("SELECT * FROM parties WHERE access_id = $1")
        .bind(access_id)
        .fetch_optional(pool)
        .await
}

pub async fn get_all_public(pool: &PGPool) -> Result<Vec<Party>, sqlx::Error> {
    sqlx::query_as::<_, Party>("SELECT * FROM parties WHERE is_public ORDER BY datetime ASC")
        .fetch_all(pool)
        .await
}

pub async fn get_by_creator(creator: Uuid, pool: &PGPool) -> Result<Vec<Party>, sqlx::Error> {
    sqlx::query_as::<_, Party>(
        "SELECT * FROM parties WHERE created_by = $1 ORDER BY datetime ASC",
    )
    .bind(creator)
    .fetch_all(pool)
    .await
}

// /users/me/attending
pub async fn get_attended_by(user_id: Uuid, pool: &PGPool) -> Result<Vec<Party>, sqlx::Error> {
    sqlx::query_as::<_, Party>(
        "SELECT * FROM parties WHERE id IN
            (SELECT party_id FROM party_attendees WHERE user_id = $1 AND status = 'attending')
        ORDER BY datetime ASC",
    )
    .bind(user_id)
    .fetch_all(pool)
    .await
}

/// Parties the user hosts or attends that start at or after `from`.
pub async fn get_upcoming_for(
    user_id: Uuid,
    from: DateTime<Utc>,
    pool: &PGPool,
) -> Result<Vec<Party>, sqlx::Error> {
    sqlx::query_as::<_, Party>(
        "SELECT * FROM parties
        WHERE datetime >= $2
          AND (created_by = $1 OR id IN
            (SELECT party_id FROM party_attendees WHERE user_id = $1 AND status = 'attending'))
        ORDER BY datetime ASC",
    )
    .bind(user_id)
    .bind(from)
    .fetch_all(pool)
    .await
}

/// Public parties plus the private ones the user hosts or attends.
pub async fn get_visible_to(user_id: Uuid, pool: &PGPool) -> Result<Vec<Party>, sqlx::Error> {
    sqlx::query_as::<_, Party>(
        "SELECT * FROM parties
        WHERE is_public
           OR created_by = $1
           OR id IN (SELECT party_id FROM party_attendees WHERE user_id = $1 AND status = 'attending')
        ORDER BY datetime ASC",
    )
    .bind(user_id)
    .fetch_all(pool)
    .await
}

/// Updates the supplied fields; a blank optional text field is stored as NULL.
pub async fn set_fields(
    id: Uuid,
    fields: &dto::UpdatePartyDto,
    pool: &PGPool,
) -> Result<Party, sqlx::Error> {
    if fields.is_empty() {
        return get_by_id(id, pool).await;
    }
    let mut query_builder: QueryBuilder<Postgres> = QueryBuilder::new("UPDATE parties SET ");
    let mut separated = query_builder.separated(", ");
    if let Some(v) = &fields.title {
        separated.push("title = ").push_bind_unseparated(v.trim().to_string());
    }
    if let Some(v) = &fields.description {
        separated.push("description = ").push_bind_unseparated(dto::non_blank(v));
    }
    if let Some(v) = &fields.location {
        separated.push("location = ").push_bind_unseparated(v.trim().to_string());
    }
    if let Some(v) = fields.latitude {
        separated.push("latitude = ").push_bind_unseparated(v);
    }
    if let Some(v) = fields.longitude {
        separated.push("longitude = ").push_bind_unseparated(v);
    }
    if let Some(v) = fields.datetime {
        separated.push("datetime = ").push_bind_unseparated(v);
    }
    if let Some(v) = &fields.genre {
        separated.push("genre = ").push_bind_unseparated(dto::non_blank(v));
    }
    if let Some(v) = &fields.dresscode {
        separated.push("dresscode = ").push_bind_unseparated(dto::non_blank(v));
    }
    if let Some(v) = fields.entry_fee {
        separated.push("entry_fee = ").push_bind_unseparated(v);
    }
    if let Some(v) = fields.is_public {
        separated.push("is_public = ").push_bind_unseparated(v);
    }
    query_builder.push(" WHERE id = ").push_bind(id).push(" RETURNING *");

    query_builder.build_query_as::<Party>().fetch_one(pool).await
}

pub async fn delete(id: Uuid, pool: &PGPool) -> Result<u64, sqlx::Error> {
    let res = sqlx::query("DELETE FROM parties WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(res.rows_affected())
}

pub async fn distinct_genres(pool: &PGPool) -> Result<Vec<String>, sqlx::Error> {
    sqlx::query_scalar::<_, String>(
        "SELECT DISTINCT genre FROM parties
        WHERE is_public AND genre IS NOT NULL AND btrim(genre) <> ''
        ORDER BY genre",
    )
    .fetch_all(pool)
    .await
}

pub async fn distinct_locations(pool: &PGPool) -> Result<Vec<String>, sqlx::Error> {
    sqlx::query_scalar::<_, String>(
        "SELECT DISTINCT location FROM parties
        WHERE is_public AND btrim(location) <> ''
        ORDER BY location",
    )
    .fetch_all(pool)
    .await
}
