//! In-app notifications: delivery as a side effect of other actions, plus the inbox.

use db::models::notification::Notification;
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use tracing::{debug, warn};
use ts_rs::TS;
use uuid::Uuid;

use super::{
    auth::{ANY_ROLE, Scope},
    error::{ActionError, StoreContext},
};

const DEFAULT_INBOX_LIMIT: i64 = 50;
const MAX_INBOX_LIMIT: i64 = 200;

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
pub struct UnreadCount {
    pub unread: i64,
}

#[derive(Clone)]
pub struct NotificationService {
    pool: SqlitePool,
}

impl NotificationService {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Best effort: the action that triggered the notification has already
    /// been written, so a failed insert is logged and not returned.
    pub async fn notify(
        &self,
        organisation_id: Uuid,
        user_id: Uuid,
        title: &str,
        body: &str,
        link: Option<&str>,
    ) {
        match Notification::create(&self.pool, organisation_id, user_id, title, body, link).await {
            Ok(notification) => {
                debug!(notification_id = %notification.id, user_id = %user_id, title, "Notification sent")
            }
            Err(e) => warn!(error = %e, user_id = %user_id, title, "Failed to send notification"),
        }
    }

    pub async fn inbox(
        &self,
        scope: &Scope,
        unread_only: bool,
        limit: Option<i64>,
    ) -> Result<Vec<Notification>, ActionError> {
        scope.require(ANY_ROLE)?;
        let limit = limit.unwrap_or(DEFAULT_INBOX_LIMIT).clamp(1, MAX_INBOX_LIMIT);
        Notification::find_for_user(&self.pool, scope.org_id(), scope.user_id, unread_only, limit)
            .await
            .store("Failed to load notifications")
    }

    pub async fn unread_count(&self, scope: &Scope) -> Result<UnreadCount, ActionError> {
        scope.require(ANY_ROLE)?;
        let unread = Notification::count_unread(&self.pool, scope.org_id(), scope.user_id)
            .await
            .store("Failed to load notifications")?;
        Ok(UnreadCount { unread })
    }

    pub async fn mark_read(&self, scope: &Scope, notification_id: Uuid) -> Result<(), ActionError> {
        scope.require(ANY_ROLE)?;
        let updated = Notification::mark_read(&self.pool, scope.org_id(), scope.user_id, notification_id)
            .await
            .store("Failed to update notification")?;
        if updated == 0 {
            return Err(ActionError::NotFound("Notification"));
        }
        Ok(())
    }

    pub async fn mark_all_read(&self, scope: &Scope) -> Result<u64, ActionError> {
        scope.require(ANY_ROLE)?;
        Notification::mark_all_read(&self.pool, scope.org_id(), scope.user_id)
            .await
            .store("Failed to update notifications")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::test_support::Fixture;

    #[tokio::test]
    async fn inbox_is_private_to_the_recipient() {
        let fx = Fixture::new().await;
        let service = NotificationService::new(fx.pool());
        service
            .notify(fx.org.id, fx.janitor_id, "Deficiency assigned", "Mop spill in G.01", None)
            .await;
        service
            .notify(fx.org.id, fx.janitor_id, "Deficiency assigned", "Bins in G.02", Some("/x"))
            .await;

        assert_eq!(service.unread_count(&fx.janitor()).await.unwrap().unread, 2);
        assert!(service.inbox(&fx.supervisor(), false, None).await.unwrap().is_empty());

        let inbox = service.inbox(&fx.janitor(), true, None).await.unwrap();
        assert_eq!(inbox.len(), 2);

        let err = service.mark_read(&fx.supervisor(), inbox[0].id).await.unwrap_err();
        assert!(matches!(err, ActionError::NotFound(_)));

        service.mark_read(&fx.janitor(), inbox[0].id).await.unwrap();
        assert_eq!(service.unread_count(&fx.janitor()).await.unwrap().unread, 1);
        assert_eq!(service.mark_all_read(&fx.janitor()).await.unwrap(), 1);
        assert!(service.inbox(&fx.janitor(), true, None).await.unwrap().is_empty());
    }
}
