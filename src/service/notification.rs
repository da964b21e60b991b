//! Per-user notification lists.
//!
//! Handlers receive a `web::Data<dyn NotificationStore>`; the server picks the
//! Postgres-backed store or the process-local one at startup.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use serde::Deserialize;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::{db, errors::AppError, models::Notification, PGPool};

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct NewNotification {
    pub kind: String,
    pub title: String,
    pub message: Option<String>,
}

impl NewNotification {
    fn into_notification(self, user_id: Uuid) -> Notification {
        Notification {
            id: Uuid::new_v4(),
            user_id,
            kind: self.kind,
            title: self.title,
            message: self.message,
            read_at: None,
            created_at: Utc::now(),
        }
    }
}

fn not_found(id: Uuid) -> AppError {
    AppError::not_found(format!("notification {id} not found"))
}

#[async_trait]
pub trait NotificationStore: Send + Sync {
    /// Stores a new notification at the head of the user's list.
    async fn add(&self, user_id: Uuid, new: NewNotification) -> Result<Notification, AppError>;

    /// Newest first.
    async fn list(&self, user_id: Uuid) -> Result<Vec<Notification>, AppError>;

    async fn unread_count(&self, user_id: Uuid) -> Result<usize, AppError> {
        let all = self.list(user_id).await?;
        Ok(all.iter().filter(|n| !n.is_read()).count())
    }

    async fn mark_read(&self, user_id: Uuid, id: Uuid) -> Result<Notification, AppError>;

    async fn mark_all_read(&self, user_id: Uuid) -> Result<u64, AppError>;

    async fn delete(&self, user_id: Uuid, id: Uuid) -> Result<(), AppError>;
}

pub struct PgNotificationStore {
    pool: PGPool,
}

impl PgNotificationStore {
    pub fn new(pool: PGPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl NotificationStore for PgNotificationStore {
    async fn add(&self, user_id: Uuid, new: NewNotification) -> Result<Notification, AppError> {
        let notification = new.into_notification(user_id);
        Ok(db::notification::create(&notification, &self.pool).await?)
    }

    async fn list(&self, user_id: Uuid) -> Result<Vec<Notification>, AppError> {
        Ok(db::notification::get_for_user(user_id, &self.pool).await?)
    }

    async fn unread_count(&self, user_id: Uuid) -> Result<usize, AppError> {
        let count = db::notification::count_unread(user_id, &self.pool).await?;
        Ok(usize::try_from(count).unwrap_or_default())
    }

    async fn mark_read(&self, user_id: Uuid, id: Uuid) -> Result<Notification, AppError> {
        db::notification::mark_read(user_id, id, Utc::now(), &self.pool)
            .await?
            .ok_or_else(|| not_found(id))
    }

    async fn mark_all_read(&self, user_id: Uuid) -> Result<u64, AppError> {
        Ok(db::notification::mark_all_read(user_id, Utc::now(), &self.pool).await?)
    }

    async fn delete(&self, user_id: Uuid, id: Uuid) -> Result<(), AppError> {
        match db::notification::delete(user_id, id, &self.pool).await? {
            0 => Err(not_found(id)),
            _ => Ok(()),
        }
    }
}

/// Keeps notifications in process memory only; lost on restart.
#[derive(Default)]
pub struct MemoryNotificationStore {
    lists: RwLock<HashMap<Uuid, Vec<Notification>>>,
}

impl MemoryNotificationStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl NotificationStore for MemoryNotificationStore {
    async fn add(&self, user_id: Uuid, new: NewNotification) -> Result<Notification, AppError> {
        let notification = new.into_notification(user_id);
        let mut lists = self.lists.write().await;
        lists
            .entry(user_id)
            .or_default()
            .insert(0, notification.clone());
        Ok(notification)
    }

    async fn list(&self, user_id: Uuid) -> Result<Vec<Notification>, AppError> {
        let lists = self.lists.read().await;
        Ok(lists.get(&user_id).cloned().unwrap_or_default())
    }

    async fn mark_read(&self, user_id: Uuid, id: Uuid) -> Result<Notification, AppError> {
        let mut lists = self.lists.write().await;
        let notification = lists
            .get_mut(&user_id)
            .and_then(|list| list.iter_mut().find(|n| n.id == id))
            .ok_or_else(|| not_found(id))?;
        if notification.read_at.is_none() {
            notification.read_at = Some(Utc::now());
        }
        Ok(notification.clone())
    }

    async fn mark_all_read(&self, user_id: Uuid) -> Result<u64, AppError> {
        let mut lists = self.lists.write().await;
        let now = Utc::now();
        let mut marked = 0;
        for n in lists.get_mut(&user_id).into_iter().flatten() {
            if n.read_at.is_none() {
                n.read_at = Some(now);
                marked += 1;
            }
        }
        Ok(marked)
    }

    async fn delete(&self, user_id: Uuid, id: Uuid) -> Result<(), AppError> {
        let mut lists = self.lists.write().await;
        let list = lists.get_mut(&user_id).ok_or_else(|| not_found(id))?;
        let before = list.len();
        list.retain(|n| n.id != id);
        if list.len() == before {
            return Err(not_found(id));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::{fixture, rstest};

    #[fixture]
    fn store() -> MemoryNotificationStore {
        MemoryNotificationStore::new()
    }

    fn signup(title: &str) -> NewNotification {
        NewNotification {
            kind: "party_signup".into(),
            title: title.into(),
            message: None,
        }
    }

    #[rstest]
    #[actix_rt::test]
    async fn add_prepends_and_counts_unread(store: MemoryNotificationStore) {
        let user = Uuid::new_v4();
        store.add(user, signup("first")).await.unwrap();
        store.add(user, signup("second")).await.unwrap();

        let list = store.list(user).await.unwrap();
        let titles: Vec<&str> = list.iter().map(|n| n.title.as_str()).collect();
        assert_eq!(titles, vec!["second", "first"]);
        assert_eq!(store.unread_count(user).await.unwrap(), 2);
    }

    #[rstest]
    #[actix_rt::test]
    async fn mark_read_is_idempotent(store: MemoryNotificationStore) {
        let user = Uuid::new_v4();
        let added = store.add(user, signup("party")).await.unwrap();

        let first = store.mark_read(user, added.id).await.unwrap();
        let second = store.mark_read(user, added.id).await.unwrap();

        assert!(first.is_read());
        assert_eq!(first.read_at, second.read_at);
        assert_eq!(store.unread_count(user).await.unwrap(), 0);
    }

    #[rstest]
    #[actix_rt::test]
    async fn mark_all_read_only_counts_unread(store: MemoryNotificationStore) {
        let user = Uuid::new_v4();
        let a = store.add(user, signup("a")).await.unwrap();
        store.add(user, signup("b")).await.unwrap();
        store.add(user, signup("c")).await.unwrap();
        store.mark_read(user, a.id).await.unwrap();

        assert_eq!(store.mark_all_read(user).await.unwrap(), 2);
        assert_eq!(store.unread_count(user).await.unwrap(), 0);
    }

    #[rstest]
    #[actix_rt::test]
    async fn delete_removes_only_that_notification(store: MemoryNotificationStore) {
        let user = Uuid::new_v4();
        let keep = store.add(user, signup("keep")).await.unwrap();
        let gone = store.add(user, signup("gone")).await.unwrap();

        store.delete(user, gone.id).await.unwrap();

        let list = store.list(user).await.unwrap();
        assert_eq!(list.len(), 1);
        assert_eq!(list[0].id, keep.id);
        assert_eq!(
            store.delete(user, gone.id).await,
            Err(not_found(gone.id))
        );
    }

    #[rstest]
    #[actix_rt::test]
    async fn lists_are_isolated_per_user(store: MemoryNotificationStore) {
        let anna = Uuid::new_v4();
        let ben = Uuid::new_v4();
        let annas = store.add(anna, signup("anna's")).await.unwrap();

        assert!(store.list(ben).await.unwrap().is_empty());
        assert!(store.mark_read(ben, annas.id).await.is_err());
        assert!(store.delete(ben, annas.id).await.is_err());
        assert_eq!(store.unread_count(anna).await.unwrap(), 1);
    }
}
