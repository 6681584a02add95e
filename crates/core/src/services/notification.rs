//! Notification service.
//!
//! Allocation and programme transitions notify affected users. Delivery is
//! best-effort: callers fire these after their own write committed and log
//! failures instead of rolling anything back.

use chrono::Utc;
use rendezvous_common::{AppError, AppResult, IdGenerator};
use rendezvous_db::{
    entities::{notification, notification::NotificationType},
    repositories::NotificationRepository,
};
use sea_orm::Set;

/// Notification service for business logic.
#[derive(Clone)]
pub struct NotificationService {
    notification_repo: NotificationRepository,
    id_gen: IdGenerator,
}

impl NotificationService {
    /// Create a new notification service.
    #[must_use]
    pub const fn new(notification_repo: NotificationRepository) -> Self {
        Self {
            notification_repo,
            id_gen: IdGenerator::new(),
        }
    }

    async fn notify(
        &self,
        user_id: &str,
        notification_type: NotificationType,
        event_id: &str,
    ) -> AppResult<notification::Model> {
        let model = notification::ActiveModel {
            id: Set(self.id_gen.generate()),
            user_id: Set(user_id.to_string()),
            notification_type: Set(notification_type),
            event_id: Set(Some(event_id.to_string())),
            is_read: Set(false),
            created_at: Set(Utc::now().into()),
        };
        self.notification_repo.create(model).await
    }

    /// The registration was confirmed immediately.
    pub async fn notify_registration_confirmed(
        &self,
        user_id: &str,
        event_id: &str,
    ) -> AppResult<notification::Model> {
        self.notify(user_id, NotificationType::RegistrationConfirmed, event_id)
            .await
    }

    /// The registration landed on the waitlist.
    pub async fn notify_waitlisted(
        &self,
        user_id: &str,
        event_id: &str,
    ) -> AppResult<notification::Model> {
        self.notify(user_id, NotificationType::Waitlisted, event_id)
            .await
    }

    /// A waitlisted registration was promoted to confirmed.
    pub async fn notify_waitlist_promoted(
        &self,
        user_id: &str,
        event_id: &str,
    ) -> AppResult<notification::Model> {
        self.notify(user_id, NotificationType::WaitlistPromoted, event_id)
            .await
    }

    /// The event's voting session opened.
    pub async fn notify_voting_opened(
        &self,
        user_id: &str,
        event_id: &str,
    ) -> AppResult<notification::Model> {
        self.notify(user_id, NotificationType::VotingOpened, event_id)
            .await
    }

    /// Speed-dating pairs were generated.
    pub async fn notify_pairs_ready(
        &self,
        user_id: &str,
        event_id: &str,
    ) -> AppResult<notification::Model> {
        self.notify(user_id, NotificationType::PairsReady, event_id)
            .await
    }

    /// A user's notifications, newest first.
    pub async fn list(
        &self,
        user_id: &str,
        limit: u64,
        unread_only: bool,
    ) -> AppResult<Vec<notification::Model>> {
        self.notification_repo
            .find_by_user(user_id, limit, unread_only)
            .await
    }

    /// Mark one of the user's notifications read.
    pub async fn mark_as_read(&self, user_id: &str, id: &str) -> AppResult<()> {
        let notification = self
            .notification_repo
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Notification not found: {id}")))?;
        if notification.user_id != user_id {
            return Err(AppError::Forbidden(
                "notifications can only be read by their recipient".to_string(),
            ));
        }
        self.notification_repo.mark_as_read(id).await
    }

    /// Unread count for the badge.
    pub async fn unread_count(&self, user_id: &str) -> AppResult<u64> {
        self.notification_repo.count_unread(user_id).await
    }
}
