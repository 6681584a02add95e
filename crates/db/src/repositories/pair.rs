//! Pair repository.

use std::sync::Arc;

use crate::entities::{Pair, pair};
use rendezvous_common::{AppError, AppResult};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, Order, PaginatorTrait,
    QueryFilter, QueryOrder,
};

/// Pair repository for database operations.
#[derive(Clone)]
pub struct PairRepository {
    db: Arc<DatabaseConnection>,
}

impl PairRepository {
    /// Create a new pair repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Whether pairs were already generated for this event.
    pub async fn exists_for_event(&self, event_id: &str) -> AppResult<bool> {
        let count = Pair::find()
            .filter(pair::Column::EventId.eq(event_id))
            .count(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(count > 0)
    }

    /// The event's pairs ordered by round, then score descending.
    pub async fn find_by_event(&self, event_id: &str) -> AppResult<Vec<pair::Model>> {
        Pair::find()
            .filter(pair::Column::EventId.eq(event_id))
            .order_by(pair::Column::Round, Order::Asc)
            .order_by(pair::Column::MutualScore, Order::Desc)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Pairs involving one participant, round order.
    pub async fn find_by_event_and_user(
        &self,
        event_id: &str,
        user_id: &str,
    ) -> AppResult<Vec<pair::Model>> {
        Pair::find()
            .filter(pair::Column::EventId.eq(event_id))
            .filter(
                pair::Column::User1Id
                    .eq(user_id)
                    .or(pair::Column::User2Id.eq(user_id)),
            )
            .order_by(pair::Column::Round, Order::Asc)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Insert a batch of generated pairs.
    pub async fn insert_many(&self, models: Vec<pair::ActiveModel>) -> AppResult<()> {
        if models.is_empty() {
            return Ok(());
        }
        Pair::insert_many(models)
            .exec(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    /// Update a pair (round start/completion timestamps).
    pub async fn update(&self, model: pair::ActiveModel) -> AppResult<pair::Model> {
        model
            .update(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }
}
