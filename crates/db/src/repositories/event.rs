//! Event repository.

use std::sync::Arc;

use crate::entities::{Event, event};
use rendezvous_common::{AppError, AppResult};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, Order, QueryFilter, QueryOrder,
    QuerySelect,
};

/// Event repository for database operations.
#[derive(Clone)]
pub struct EventRepository {
    db: Arc<DatabaseConnection>,
}

impl EventRepository {
    /// Create a new event repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find an event by ID.
    pub async fn find_by_id(&self, id: &str) -> AppResult<Option<event::Model>> {
        Event::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Get an event by ID, returning error if not found.
    pub async fn get_by_id(&self, id: &str) -> AppResult<event::Model> {
        self.find_by_id(id)
            .await?
            .ok_or_else(|| AppError::EventNotFound(id.to_string()))
    }

    /// List published, non-cancelled events, soonest first.
    pub async fn find_published(&self, limit: u64, offset: u64) -> AppResult<Vec<event::Model>> {
        Event::find()
            .filter(event::Column::IsPublished.eq(true))
            .filter(event::Column::IsCancelled.eq(false))
            .order_by(event::Column::StartsAt, Order::Asc)
            .offset(offset)
            .limit(limit)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Events that have started and are not cancelled; the phase scheduler
    /// scans these for due voting transitions.
    pub async fn find_started_uncancelled(&self) -> AppResult<Vec<event::Model>> {
        Event::find()
            .filter(event::Column::IsPublished.eq(true))
            .filter(event::Column::IsCancelled.eq(false))
            .filter(event::Column::StartsAt.lte(chrono::Utc::now()))
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Create a new event.
    pub async fn create(&self, model: event::ActiveModel) -> AppResult<event::Model> {
        model
            .insert(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Update an event.
    pub async fn update(&self, model: event::ActiveModel) -> AppResult<event::Model> {
        model
            .update(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }
}
