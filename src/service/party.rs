use std::collections::HashSet;

use chrono::{DateTime, TimeZone, Utc};
use log::info;
use uuid::Uuid;

use crate::{
    db,
    dto::{non_blank, NewPartyDto, PartyDetails, UpdatePartyDto},
    errors::AppError,
    models::{Comment, Party},
    PGPool,
};

use super::{
    auth::UserAuthData,
    engagement::{self, Engagement},
    filter::PartyFilter,
    marker::{self, Marker},
    notification::NotificationStore,
};

/// Outcome of joining a private party with its invite token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinOutcome {
    Joined,
    AlreadyAttending,
}

impl From<bool> for JoinOutcome {
    fn from(inserted: bool) -> Self {
        if inserted {
            JoinOutcome::Joined
        } else {
            JoinOutcome::AlreadyAttending
        }
    }
}

fn party_not_found(id: Uuid) -> AppError {
    AppError::not_found(format!("party with id {id} not found"))
}

fn new_access_id() -> String {
    Uuid::new_v4().simple().to_string()
}

/// Public parties are visible to everyone; private ones only to the host and attendees.
pub fn may_view(party: &Party, viewer: Option<Uuid>, attends: bool) -> bool {
    match viewer {
        _ if party.is_public => true,
        Some(id) => id == party.created_by || attends,
        None => false,
    }
}

pub fn ensure_owner(party: &Party, user_id: Uuid) -> Result<(), AppError> {
    if party.created_by == user_id {
        Ok(())
    } else {
        Err(AppError::Forbidden)
    }
}

/// Only private parties are joined by invite token.
pub fn ensure_joinable(party: &Party) -> Result<(), AppError> {
    if party.is_public {
        Err(AppError::bad_request("this party is public and already visible"))
    } else {
        Ok(())
    }
}

pub fn build(user_auth_data: &UserAuthData, dto: NewPartyDto) -> Result<Party, AppError> {
    dto.validate()?;
    let trimmed = |v: Option<String>| v.as_deref().and_then(non_blank);
    Ok(Party {
        id: Uuid::new_v4(),
        title: dto.title.trim().to_string(),
        description: trimmed(dto.description),
        location: dto.location.trim().to_string(),
        latitude: dto.latitude,
        longitude: dto.longitude,
        datetime: dto.datetime,
        genre: trimmed(dto.genre),
        dresscode: trimmed(dto.dresscode),
        entry_fee: dto.entry_fee,
        is_public: dto.is_public,
        created_by: user_auth_data.user_id,
        access_id: new_access_id(),
        created_at: Utc::now(),
    })
}

pub async fn create(user_auth_data: &UserAuthData, dto: NewPartyDto, pool: &PGPool) -> Result<Party, AppError> {
    let party = build(user_auth_data, dto)?;
    let party = db::party::create(&party, pool).await?;
    info!("party {} created by {}", party.id, user_auth_data.username);
    Ok(party)
}

pub async fn get_all_public<Tz: TimeZone>(
    filter: &PartyFilter,
    now: &DateTime<Tz>,
    pool: &PGPool,
) -> Result<Vec<Party>, AppError> {
    let parties = db::party::get_all_public(pool).await?;
    Ok(filter.apply(parties, now))
}

pub async fn search(query: Option<&str>, pool: &PGPool) -> Result<Vec<Party>, AppError> {
    let query = query
        .map(str::trim)
        .filter(|q| !q.is_empty())
        .ok_or_else(|| AppError::bad_request("search query cannot be empty"))?;
    get_all_public(&PartyFilter::search(query), &Utc::now(), pool).await
}

pub async fn get_visible(id: Uuid, viewer: Option<&UserAuthData>, pool: &PGPool) -> Result<Party, AppError> {
    let party = match db::party::get_by_id(id, pool).await {
        Ok(party) => party,
        Err(sqlx::Error::RowNotFound) => return Err(party_not_found(id)),
        Err(err) => return Err(err.into()),
    };
    let attends = match viewer {
        Some(v) if !party.is_public && party.created_by != v.user_id => {
            db::engagement::exists(Engagement::Attendance, id, v.user_id, pool).await?
        }
        _ => false,
    };
    if may_view(&party, viewer.map(|v| v.user_id), attends) {
        Ok(party)
    } else {
        Err(party_not_found(id))
    }
}

pub async fn get_details(id: Uuid, viewer: Option<&UserAuthData>, pool: &PGPool) -> Result<PartyDetails, AppError> {
    let party = get_visible(id, viewer, pool).await?;
    let (host, likes_count, attendees, comments) = futures::try_join!(
        db::user::get_profile(party.created_by, pool),
        db::engagement::count(Engagement::Like, id, pool),
        db::user::get_attendee_profiles(id, pool),
        db::comment::get_for_party(id, pool),
    )?;
    let (liked, attending) = match viewer {
        Some(v) => futures::try_join!(
            db::engagement::exists(Engagement::Like, id, v.user_id, pool),
            db::engagement::exists(Engagement::Attendance, id, v.user_id, pool),
        )?,
        None => (false, false),
    };
    Ok(PartyDetails {
        party,
        host,
        likes_count,
        attendees_count: i64::try_from(attendees.len()).unwrap_or(i64::MAX),
        attendees,
        comments,
        liked,
        attending,
    })
}

async fn get_owned(id: Uuid, user_auth_data: &UserAuthData, pool: &PGPool) -> Result<Party, AppError> {
    let party = match db::party::get_by_id(id, pool).await {
        Ok(party) => party,
        Err(sqlx::Error::RowNotFound) => return Err(party_not_found(id)),
        Err(err) => return Err(err.into()),
    };
    ensure_owner(&party, user_auth_data.user_id)?;
    Ok(party)
}

pub async fn update(
    id: Uuid,
    fields: UpdatePartyDto,
    user_auth_data: &UserAuthData,
    pool: &PGPool,
) -> Result<Party, AppError> {
    fields.validate()?;
    get_owned(id, user_auth_data, pool).await?;
    let party = db::party::set_fields(id, &fields, pool).await?;
    info!("party {} updated by {}", id, user_auth_data.username);
    Ok(party)
}

pub async fn delete(id: Uuid, user_auth_data: &UserAuthData, pool: &PGPool) -> Result<(), AppError> {
    get_owned(id, user_auth_data, pool).await?;
    db::party::delete(id, pool).await?;
    info!("party {} deleted by {}", id, user_auth_data.username);
    Ok(())
}

pub async fn join_by_access_id(
    access_id: &str,
    user_auth_data: &UserAuthData,
    pool: &PGPool,
    notifications: &dyn NotificationStore,
) -> Result<(JoinOutcome, Party), AppError> {
    let access_id = access_id.trim();
    if access_id.is_empty() {
        return Err(AppError::bad_request("party access id is required"));
    }
    let party = db::party::get_by_access_id(access_id, pool)
        .await?
        .ok_or_else(|| AppError::not_found("party not found or access denied"))?;
    ensure_joinable(&party)?;
    let joined = engagement::enable(
        Engagement::Attendance,
        &party,
        user_auth_data,
        pool,
        notifications,
    )
    .await?;
    Ok((JoinOutcome::from(joined), party))
}

/// RSVP for a party the user can already see.
pub async fn attend(
    id: Uuid,
    user_auth_data: &UserAuthData,
    pool: &PGPool,
    notifications: &dyn NotificationStore,
) -> Result<bool, AppError> {
    let party = get_visible(id, Some(user_auth_data), pool).await?;
    engagement::enable(Engagement::Attendance, &party, user_auth_data, pool, notifications).await
}

pub async fn cancel_attendance(id: Uuid, user_auth_data: &UserAuthData, pool: &PGPool) -> Result<(), AppError> {
    engagement::disable(Engagement::Attendance, id, user_auth_data.user_id, pool).await
}

pub async fn user_parties(user_auth_data: &UserAuthData, pool: &PGPool) -> Result<Vec<Party>, AppError> {
    Ok(db::party::get_by_creator(user_auth_data.user_id, pool).await?)
}

pub async fn upcoming_user_parties(
    user_auth_data: &UserAuthData,
    now: DateTime<Utc>,
    pool: &PGPool,
) -> Result<Vec<Party>, AppError> {
    Ok(db::party::get_upcoming_for(user_auth_data.user_id, now, pool).await?)
}

pub async fn attending_parties(user_auth_data: &UserAuthData, pool: &PGPool) -> Result<Vec<Party>, AppError> {
    Ok(db::party::get_attended_by(user_auth_data.user_id, pool).await?)
}

pub async fn list_comments(id: Uuid, viewer: Option<&UserAuthData>, pool: &PGPool) -> Result<Vec<Comment>, AppError> {
    get_visible(id, viewer, pool).await?;
    Ok(db::comment::get_for_party(id, pool).await?)
}

pub async fn add_comment(
    id: Uuid,
    text: &str,
    user_auth_data: &UserAuthData,
    pool: &PGPool,
) -> Result<Comment, AppError> {
    let text = text.trim();
    if text.is_empty() {
        return Err(AppError::bad_request("comment must not be empty"));
    }
    get_visible(id, Some(user_auth_data), pool).await?;
    Ok(db::comment::create(id, user_auth_data.user_id, text, pool).await?)
}

pub async fn genres(pool: &PGPool) -> Result<Vec<String>, AppError> {
    Ok(db::party::distinct_genres(pool).await?)
}

pub async fn locations(pool: &PGPool) -> Result<Vec<String>, AppError> {
    Ok(db::party::distinct_locations(pool).await?)
}

/// Markers for every located party the viewer may see.
pub async fn map_markers(viewer: Option<&UserAuthData>, pool: &PGPool) -> Result<Vec<Marker>, AppError> {
    let Some(viewer) = viewer else {
        let parties = db::party::get_all_public(pool).await?;
        return Ok(marker::markers(&parties, &HashSet::new(), &HashSet::new()));
    };
    let (parties, attended) = futures::try_join!(
        db::party::get_visible_to(viewer.user_id, pool),
        db::engagement::attended_party_ids(viewer.user_id, pool),
    )?;
    let hosted: HashSet<Uuid> = parties
        .iter()
        .filter(|p| p.created_by == viewer.user_id)
        .map(|p| p.id)
        .collect();
    let attending: HashSet<Uuid> = attended.into_iter().collect();
    Ok(marker::markers(&parties, &hosted, &attending))
}
