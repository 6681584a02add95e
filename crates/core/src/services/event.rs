//! Event service.

use chrono::{DateTime, Utc};
use rendezvous_common::{AppError, AppResult, IdGenerator};
use rendezvous_db::{
    entities::event,
    repositories::EventRepository,
};
use sea_orm::Set;
use tracing::info;

/// Event service for business logic.
#[derive(Clone)]
pub struct EventService {
    event_repo: EventRepository,
    id_gen: IdGenerator,
}

/// Input for creating an event.
pub struct CreateEventInput {
    pub title: String,
    pub description: Option<String>,
    pub starts_at: DateTime<Utc>,
    pub registration_deadline: DateTime<Utc>,
    pub capacity_total: i32,
    /// Per-pool caps (female, male, nonbinary); all three or none
    pub gender_capacities: Option<(i32, i32, i32)>,
    pub min_age: Option<i16>,
    pub max_age: Option<i16>,
    pub required_language: Option<String>,
}

impl EventService {
    /// Create a new event service.
    #[must_use]
    pub const fn new(event_repo: EventRepository) -> Self {
        Self {
            event_repo,
            id_gen: IdGenerator::new(),
        }
    }

    /// Create an event. The creator becomes the organizer; events start
    /// unpublished and invisible to participants.
    pub async fn create(&self, organizer_id: &str, input: CreateEventInput) -> AppResult<event::Model> {
        if input.title.trim().is_empty() {
            return Err(AppError::Validation("title cannot be empty".to_string()));
        }
        if input.capacity_total <= 0 {
            return Err(AppError::Validation(
                "capacity must be positive".to_string(),
            ));
        }
        if input.registration_deadline > input.starts_at {
            return Err(AppError::Validation(
                "registration deadline cannot be after event start".to_string(),
            ));
        }
        if let Some((female, male, nonbinary)) = input.gender_capacities {
            if female < 0 || male < 0 || nonbinary < 0 {
                return Err(AppError::Validation(
                    "gender capacities cannot be negative".to_string(),
                ));
            }
            if female + male + nonbinary != input.capacity_total {
                return Err(AppError::Validation(
                    "gender capacities must sum to the total capacity".to_string(),
                ));
            }
        }
        if let (Some(min), Some(max)) = (input.min_age, input.max_age) {
            if min > max {
                return Err(AppError::Validation(
                    "minimum age cannot exceed maximum age".to_string(),
                ));
            }
        }

        let model = event::ActiveModel {
            id: Set(self.id_gen.generate()),
            organizer_id: Set(organizer_id.to_string()),
            title: Set(input.title),
            description: Set(input.description),
            starts_at: Set(input.starts_at.into()),
            registration_deadline: Set(input.registration_deadline.into()),
            capacity_total: Set(input.capacity_total),
            capacity_female: Set(input.gender_capacities.map(|c| c.0)),
            capacity_male: Set(input.gender_capacities.map(|c| c.1)),
            capacity_nonbinary: Set(input.gender_capacities.map(|c| c.2)),
            min_age: Set(input.min_age),
            max_age: Set(input.max_age),
            required_language: Set(input.required_language),
            is_published: Set(false),
            is_cancelled: Set(false),
            created_at: Set(Utc::now().into()),
            updated_at: Set(None),
        };

        let created = self.event_repo.create(model).await?;
        info!(event_id = %created.id, organizer_id = %organizer_id, "Event created");
        Ok(created)
    }

    /// Get an event by ID.
    pub async fn get(&self, event_id: &str) -> AppResult<event::Model> {
        self.event_repo.get_by_id(event_id).await
    }

    /// List published upcoming events.
    pub async fn list_published(&self, limit: u64, offset: u64) -> AppResult<Vec<event::Model>> {
        self.event_repo.find_published(limit, offset).await
    }

    /// Publish an event, opening it for registration.
    pub async fn publish(&self, actor_id: &str, event_id: &str) -> AppResult<event::Model> {
        let event = self.require_organizer(actor_id, event_id).await?;
        if event.is_cancelled {
            return Err(AppError::InvalidState(
                "cannot publish a cancelled event".to_string(),
            ));
        }
        if event.is_published {
            return Ok(event);
        }

        let active = event::ActiveModel {
            id: Set(event.id.clone()),
            is_published: Set(true),
            updated_at: Set(Some(Utc::now().into())),
            ..Default::default()
        };
        self.event_repo.update(active).await
    }

    /// Cancel an event. Registrations stay in place for the audit trail;
    /// the cancelled flag blocks all further allocation and programme work.
    pub async fn cancel(&self, actor_id: &str, event_id: &str) -> AppResult<event::Model> {
        let event = self.require_organizer(actor_id, event_id).await?;
        if event.is_cancelled {
            return Ok(event);
        }

        let active = event::ActiveModel {
            id: Set(event.id.clone()),
            is_cancelled: Set(true),
            updated_at: Set(Some(Utc::now().into())),
            ..Default::default()
        };
        let cancelled = self.event_repo.update(active).await?;
        info!(event_id = %event_id, "Event cancelled");
        Ok(cancelled)
    }

    async fn require_organizer(&self, actor_id: &str, event_id: &str) -> AppResult<event::Model> {
        let event = self.event_repo.get_by_id(event_id).await?;
        if event.organizer_id != actor_id {
            return Err(AppError::Forbidden(
                "only the organizer may manage this event".to_string(),
            ));
        }
        Ok(event)
    }
}
