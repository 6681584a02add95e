//! Presentation repositories: slots and ratings.

use std::sync::Arc;

use crate::entities::{PresentationSlot, Rating, presentation_slot, rating};
use rendezvous_common::{AppError, AppResult};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, Order, PaginatorTrait,
    QueryFilter, QueryOrder,
};

/// Presentation slot repository for database operations.
#[derive(Clone)]
pub struct PresentationSlotRepository {
    db: Arc<DatabaseConnection>,
}

impl PresentationSlotRepository {
    /// Create a new presentation slot repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find a slot by ID.
    pub async fn find_by_id(&self, id: &str) -> AppResult<Option<presentation_slot::Model>> {
        PresentationSlot::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Get a slot by ID, returning error if not found.
    pub async fn get_by_id(&self, id: &str) -> AppResult<presentation_slot::Model> {
        self.find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Presentation slot not found: {id}")))
    }

    /// The event's queue in position order.
    pub async fn find_by_event(&self, event_id: &str) -> AppResult<Vec<presentation_slot::Model>> {
        PresentationSlot::find()
            .filter(presentation_slot::Column::EventId.eq(event_id))
            .order_by(presentation_slot::Column::Position, Order::Asc)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// A participant's slot for an event.
    pub async fn find_by_event_and_user(
        &self,
        event_id: &str,
        user_id: &str,
    ) -> AppResult<Option<presentation_slot::Model>> {
        PresentationSlot::find()
            .filter(presentation_slot::Column::EventId.eq(event_id))
            .filter(presentation_slot::Column::UserId.eq(user_id))
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Create a slot.
    pub async fn create(
        &self,
        model: presentation_slot::ActiveModel,
    ) -> AppResult<presentation_slot::Model> {
        model
            .insert(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Update a slot.
    pub async fn update(
        &self,
        model: presentation_slot::ActiveModel,
    ) -> AppResult<presentation_slot::Model> {
        model
            .update(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }
}

/// Rating repository for database operations.
#[derive(Clone)]
pub struct RatingRepository {
    db: Arc<DatabaseConnection>,
}

impl RatingRepository {
    /// Create a new rating repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Whether the rater already rated this presenter at this event.
    pub async fn has_rated(
        &self,
        event_id: &str,
        presenter_id: &str,
        rater_id: &str,
    ) -> AppResult<bool> {
        let count = Rating::find()
            .filter(rating::Column::EventId.eq(event_id))
            .filter(rating::Column::PresenterId.eq(presenter_id))
            .filter(rating::Column::RaterId.eq(rater_id))
            .count(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(count > 0)
    }

    /// All ratings for an event; the pairing input.
    pub async fn find_by_event(&self, event_id: &str) -> AppResult<Vec<rating::Model>> {
        Rating::find()
            .filter(rating::Column::EventId.eq(event_id))
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Create a rating.
    pub async fn create(&self, model: rating::ActiveModel) -> AppResult<rating::Model> {
        model
            .insert(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }
}
