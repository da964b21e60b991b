//! Like and attendance toggles.

use log::info;
use serde::Serialize;
use uuid::Uuid;

use crate::{db, errors::AppError, models::Party, PGPool};

use super::{
    auth::UserAuthData,
    notification::{NewNotification, NotificationStore},
    party,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Engagement {
    Like,
    Attendance,
}

impl Engagement {
    pub fn label(self) -> &'static str {
        match self {
            Engagement::Like => "like",
            Engagement::Attendance => "attendance",
        }
    }

    /// Notification recorded for the acting user when the engagement is switched on.
    pub fn notification(self, party: &Party) -> NewNotification {
        match self {
            Engagement::Like => NewNotification {
                kind: "party_liked".into(),
                title: "Party liked".into(),
                message: Some(format!("You liked the party \"{}\".", party.title)),
            },
            Engagement::Attendance => NewNotification {
                kind: "party_signup".into(),
                title: "Signed up".into(),
                message: Some(format!("You signed up for the party \"{}\".", party.title)),
            },
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToggleAction {
    Insert,
    Delete,
}

/// Whether the user has liked/attends a party, and the party's total.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct EngagementState {
    pub active: bool,
    pub count: i64,
}

impl EngagementState {
    pub fn toggle(self) -> (ToggleAction, EngagementState) {
        if self.active {
            (
                ToggleAction::Delete,
                EngagementState {
                    active: false,
                    count: (self.count - 1).max(0),
                },
            )
        } else {
            (
                ToggleAction::Insert,
                EngagementState {
                    active: true,
                    count: self.count + 1,
                },
            )
        }
    }
}

pub async fn state(kind: Engagement, party_id: Uuid, user_id: Uuid, pool: &PGPool) -> Result<EngagementState, AppError> {
    let (active, count) = futures::try_join!(
        db::engagement::exists(kind, party_id, user_id, pool),
        db::engagement::count(kind, party_id, pool),
    )?;
    Ok(EngagementState { active, count })
}

pub async fn toggle(
    kind: Engagement,
    party_id: Uuid,
    user_auth_data: &UserAuthData,
    pool: &PGPool,
    notifications: &dyn NotificationStore,
) -> Result<EngagementState, AppError> {
    let party = party::get_visible(party_id, Some(user_auth_data), pool).await?;
    let current = state(kind, party_id, user_auth_data.user_id, pool).await?;
    let (action, _) = current.toggle();
    let affected = match action {
        ToggleAction::Insert => db::engagement::insert(kind, party_id, user_auth_data.user_id, pool).await?,
        ToggleAction::Delete => db::engagement::delete(kind, party_id, user_auth_data.user_id, pool).await?,
    };
    if should_notify(action, affected) {
        notifications
            .add(user_auth_data.user_id, kind.notification(&party))
            .await?;
    }
    // Re-read so a concurrent toggle is reflected in the count.
    let next = state(kind, party_id, user_auth_data.user_id, pool).await?;
    info!(
        "{:?} toggled on party {} by {}: {:?}",
        kind, party_id, user_auth_data.username, next
    );
    Ok(next)
}

/// Only a toggle-on that actually added a row notifies.
pub fn should_notify(action: ToggleAction, affected: u64) -> bool {
    action == ToggleAction::Insert && affected > 0
}

/// Switches the engagement on; a no-op when it already is.
/// The caller decides whether the user may see `party`.
pub async fn enable(
    kind: Engagement,
    party: &Party,
    user_auth_data: &UserAuthData,
    pool: &PGPool,
    notifications: &dyn NotificationStore,
) -> Result<bool, AppError> {
    let affected = db::engagement::insert(kind, party.id, user_auth_data.user_id, pool).await?;
    if !should_notify(ToggleAction::Insert, affected) {
        return Ok(false);
    }
    notifications
        .add(user_auth_data.user_id, kind.notification(party))
        .await?;
    Ok(true)
}

/// Switches the engagement off; not found when there was nothing to remove.
pub async fn disable(kind: Engagement, party_id: Uuid, user_id: Uuid, pool: &PGPool) -> Result<(), AppError> {
    match db::engagement::delete(kind, party_id, user_id, pool).await? {
        0 => Err(AppError::not_found(format!("{} not found", kind.label()))),
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(EngagementState { active: false, count: 0 })]
    #[case(EngagementState { active: false, count: 7 })]
    #[case(EngagementState { active: true, count: 3 })]
    fn double_toggle_restores_state(#[case] start: EngagementState) {
        let (first, mid) = start.toggle();
        let (second, end) = mid.toggle();
        assert_ne!(first, second);
        assert_eq!(end, start);
    }

    #[test]
    fn toggle_on_inserts_and_counts_up() {
        let (action, next) = EngagementState { active: false, count: 2 }.toggle();
        assert_eq!(action, ToggleAction::Insert);
        assert_eq!(next, EngagementState { active: true, count: 3 });
    }

    #[test]
    fn toggle_off_never_goes_negative() {
        let (action, next) = EngagementState { active: true, count: 0 }.toggle();
        assert_eq!(action, ToggleAction::Delete);
        assert_eq!(next.count, 0);
    }

    #[rstest]
    #[case(ToggleAction::Insert, 1, true)]
    #[case(ToggleAction::Insert, 0, false)]
    #[case(ToggleAction::Delete, 1, false)]
    #[case(ToggleAction::Delete, 0, false)]
    fn notifies_only_when_a_row_was_added(
        #[case] action: ToggleAction,
        #[case] affected: u64,
        #[case] expected: bool,
    ) {
        assert_eq!(should_notify(action, affected), expected);
    }

    #[test]
    fn notifications_name_the_party() {
        let party = Party {
            id: Uuid::new_v4(),
            title: "Silent Disco".into(),
            description: None,
            location: "Bern".into(),
            latitude: None,
            longitude: None,
            datetime: chrono::Utc::now(),
            genre: None,
            dresscode: None,
            entry_fee: None,
            is_public: true,
            created_by: Uuid::new_v4(),
            access_id: "abc".into(),
            created_at: chrono::Utc::now(),
        };
        let liked = Engagement::Like.notification(&party);
        assert_eq!(liked.kind, "party_liked");
        assert!(liked.message.unwrap().contains("Silent Disco"));
        assert_eq!(Engagement::Attendance.notification(&party).kind, "party_signup");
    }
}
