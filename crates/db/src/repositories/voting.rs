//! Voting repositories: session, catalogue options, votes.

use std::sync::Arc;

use crate::entities::activity_option::ActivityCategory;
use crate::entities::{
    ActivityOption, ActivityVote, VotingSession, activity_option, activity_vote, voting_session,
};
use rendezvous_common::{AppError, AppResult};
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, Order, PaginatorTrait,
    QueryFilter, QueryOrder,
};

/// Voting session repository for database operations.
#[derive(Clone)]
pub struct VotingSessionRepository {
    db: Arc<DatabaseConnection>,
}

impl VotingSessionRepository {
    /// Create a new voting session repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find the session for an event.
    pub async fn find_by_event(&self, event_id: &str) -> AppResult<Option<voting_session::Model>> {
        VotingSession::find_by_id(event_id)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Get the session for an event, returning error if not found.
    pub async fn get_by_event(&self, event_id: &str) -> AppResult<voting_session::Model> {
        self.find_by_event(event_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Voting session not found: {event_id}")))
    }

    /// Create a new session.
    pub async fn create(
        &self,
        model: voting_session::ActiveModel,
    ) -> AppResult<voting_session::Model> {
        model
            .insert(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Bump the running vote total in place.
    pub async fn increment_votes(&self, event_id: &str) -> AppResult<()> {
        VotingSession::update_many()
            .col_expr(
                voting_session::Column::VotesCount,
                Expr::col(voting_session::Column::VotesCount).add(1),
            )
            .filter(voting_session::Column::EventId.eq(event_id))
            .exec(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    /// Apply a state transition guarded by the optimistic version token.
    ///
    /// Returns `false` when the row was concurrently modified (the version
    /// predicate matched nothing); the caller decides whether that is a
    /// benign lost race or a conflict.
    pub async fn update_versioned(
        &self,
        event_id: &str,
        expected_version: i32,
        active: voting_session::ActiveModel,
    ) -> AppResult<bool> {
        let result = VotingSession::update_many()
            .set(active)
            .filter(voting_session::Column::EventId.eq(event_id))
            .filter(voting_session::Column::Version.eq(expected_version))
            .exec(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(result.rows_affected == 1)
    }
}

/// Activity option repository for database operations.
#[derive(Clone)]
pub struct ActivityOptionRepository {
    db: Arc<DatabaseConnection>,
}

impl ActivityOptionRepository {
    /// Create a new activity option repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find an option by ID.
    pub async fn find_by_id(&self, id: &str) -> AppResult<Option<activity_option::Model>> {
        ActivityOption::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Active catalogue entries for one category, in catalogue order.
    pub async fn find_active_by_category(
        &self,
        category: ActivityCategory,
    ) -> AppResult<Vec<activity_option::Model>> {
        ActivityOption::find()
            .filter(activity_option::Column::Category.eq(category))
            .filter(activity_option::Column::IsActive.eq(true))
            .order_by(activity_option::Column::Position, Order::Asc)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Create a catalogue entry.
    pub async fn create(
        &self,
        model: activity_option::ActiveModel,
    ) -> AppResult<activity_option::Model> {
        model
            .insert(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }
}

/// Activity vote repository for database operations.
#[derive(Clone)]
pub struct ActivityVoteRepository {
    db: Arc<DatabaseConnection>,
}

impl ActivityVoteRepository {
    /// Create a new activity vote repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Whether the user already voted in this category for this event.
    pub async fn has_voted(
        &self,
        event_id: &str,
        user_id: &str,
        category: ActivityCategory,
    ) -> AppResult<bool> {
        let count = ActivityVote::find()
            .filter(activity_vote::Column::EventId.eq(event_id))
            .filter(activity_vote::Column::UserId.eq(user_id))
            .filter(activity_vote::Column::Category.eq(category))
            .count(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(count > 0)
    }

    /// All votes for an event.
    pub async fn find_by_event(&self, event_id: &str) -> AppResult<Vec<activity_vote::Model>> {
        ActivityVote::find()
            .filter(activity_vote::Column::EventId.eq(event_id))
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Create a vote.
    pub async fn create(&self, model: activity_vote::ActiveModel) -> AppResult<activity_vote::Model> {
        model
            .insert(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::entities::voting_session::SessionState;
    use chrono::Utc;
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult};

    #[tokio::test]
    async fn test_update_versioned_reports_lost_race() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_exec_results([MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 0,
                }])
                .into_connection(),
        );

        let repo = VotingSessionRepository::new(db);
        let active = voting_session::ActiveModel {
            state: sea_orm::Set(SessionState::Closed),
            version: sea_orm::Set(3),
            closed_at: sea_orm::Set(Some(Utc::now().into())),
            ..Default::default()
        };

        let applied = repo.update_versioned("ev1", 2, active).await.unwrap();
        assert!(!applied);
    }
}
