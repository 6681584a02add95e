//! Registration repository.
//!
//! Capacity decisions are made in the core allocator from the full
//! registration set of an event, fetched fresh inside the event lock; this
//! repository never exposes cached counts.

use std::sync::Arc;

use crate::entities::registration::RegistrationStatus;
use crate::entities::{Registration, registration};
use rendezvous_common::{AppError, AppResult};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, Order, QueryFilter, QueryOrder,
};

/// Registration repository for database operations.
#[derive(Clone)]
pub struct RegistrationRepository {
    db: Arc<DatabaseConnection>,
}

impl RegistrationRepository {
    /// Create a new registration repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find a registration by ID.
    pub async fn find_by_id(&self, id: &str) -> AppResult<Option<registration::Model>> {
        Registration::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// All registrations for an event, oldest first.
    ///
    /// This is the authoritative set the capacity model and the waitlist
    /// promoter operate on.
    pub async fn find_by_event(&self, event_id: &str) -> AppResult<Vec<registration::Model>> {
        Registration::find()
            .filter(registration::Column::EventId.eq(event_id))
            .order_by(registration::Column::CreatedAt, Order::Asc)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// The user's registration for an event in any non-cancelled status.
    pub async fn find_active(
        &self,
        event_id: &str,
        user_id: &str,
    ) -> AppResult<Option<registration::Model>> {
        Registration::find()
            .filter(registration::Column::EventId.eq(event_id))
            .filter(registration::Column::UserId.eq(user_id))
            .filter(registration::Column::Status.ne(RegistrationStatus::Cancelled))
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// The user's most recent cancelled registration for an event, if any.
    /// Re-registering reactivates this row instead of inserting a duplicate.
    pub async fn find_cancelled(
        &self,
        event_id: &str,
        user_id: &str,
    ) -> AppResult<Option<registration::Model>> {
        Registration::find()
            .filter(registration::Column::EventId.eq(event_id))
            .filter(registration::Column::UserId.eq(user_id))
            .filter(registration::Column::Status.eq(RegistrationStatus::Cancelled))
            .order_by(registration::Column::CreatedAt, Order::Desc)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Registrations counting against capacity (confirmed or attended).
    pub async fn find_confirmed_by_event(
        &self,
        event_id: &str,
    ) -> AppResult<Vec<registration::Model>> {
        Registration::find()
            .filter(registration::Column::EventId.eq(event_id))
            .filter(registration::Column::Status.is_in([
                RegistrationStatus::Confirmed,
                RegistrationStatus::Attended,
            ]))
            .order_by(registration::Column::CreatedAt, Order::Asc)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Waitlisted registrations in FIFO order (registration time ascending).
    pub async fn find_waitlisted_by_event(
        &self,
        event_id: &str,
    ) -> AppResult<Vec<registration::Model>> {
        Registration::find()
            .filter(registration::Column::EventId.eq(event_id))
            .filter(registration::Column::Status.eq(RegistrationStatus::Waitlisted))
            .order_by(registration::Column::CreatedAt, Order::Asc)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// All registrations for a user across events, newest first.
    pub async fn find_by_user(&self, user_id: &str) -> AppResult<Vec<registration::Model>> {
        Registration::find()
            .filter(registration::Column::UserId.eq(user_id))
            .order_by(registration::Column::CreatedAt, Order::Desc)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Create a new registration.
    pub async fn create(&self, model: registration::ActiveModel) -> AppResult<registration::Model> {
        model
            .insert(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Update a registration.
    pub async fn update(&self, model: registration::ActiveModel) -> AppResult<registration::Model> {
        model
            .update(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::Utc;
    use sea_orm::{DatabaseBackend, MockDatabase};

    fn create_test_registration(
        id: &str,
        event_id: &str,
        user_id: &str,
        status: RegistrationStatus,
    ) -> registration::Model {
        registration::Model {
            id: id.to_string(),
            event_id: event_id.to_string(),
            user_id: user_id.to_string(),
            status,
            pool: None,
            created_at: Utc::now().into(),
            updated_at: None,
            cancelled_at: None,
        }
    }

    #[tokio::test]
    async fn test_find_active_excludes_cancelled() {
        // Mock returns empty result for the filtered query
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<registration::Model>::new()])
                .into_connection(),
        );

        let repo = RegistrationRepository::new(db);
        let result = repo.find_active("ev1", "u1").await.unwrap();
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn test_find_waitlisted_preserves_order() {
        let r1 = create_test_registration("r1", "ev1", "u1", RegistrationStatus::Waitlisted);
        let r2 = create_test_registration("r2", "ev1", "u2", RegistrationStatus::Waitlisted);

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[r1.clone(), r2.clone()]])
                .into_connection(),
        );

        let repo = RegistrationRepository::new(db);
        let result = repo.find_waitlisted_by_event("ev1").await.unwrap();

        assert_eq!(result.len(), 2);
        assert_eq!(result[0].id, "r1");
        assert_eq!(result[1].id, "r2");
    }
}
