//! Presentation queue (phase 2).
//!
//! When voting closes, every confirmed participant gets a slot in a
//! randomized queue. Initialization is idempotent: re-running it only
//! appends slots for participants who gained confirmation late (waitlist
//! promotions), after the existing tail, and never reshuffles what the
//! audience already saw.

use chrono::Utc;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rendezvous_common::{AppError, AppResult, IdGenerator};
use rendezvous_db::{
    entities::{
        presentation_slot,
        presentation_slot::SlotStatus,
        rating,
        voting_session::SessionState,
    },
    repositories::{
        EventRepository, PresentationSlotRepository, RatingRepository, RegistrationRepository,
        VotingSessionRepository,
    },
};
use sea_orm::Set;
use tracing::info;

/// Presentation service for business logic.
#[derive(Clone)]
pub struct PresentationService {
    slot_repo: PresentationSlotRepository,
    rating_repo: RatingRepository,
    registration_repo: RegistrationRepository,
    event_repo: EventRepository,
    session_repo: VotingSessionRepository,
    id_gen: IdGenerator,
    /// Fixed shuffle seed for tests; production uses entropy
    shuffle_seed: Option<u64>,
}

impl PresentationService {
    /// Create a new presentation service.
    #[must_use]
    pub fn new(
        slot_repo: PresentationSlotRepository,
        rating_repo: RatingRepository,
        registration_repo: RegistrationRepository,
        event_repo: EventRepository,
        session_repo: VotingSessionRepository,
    ) -> Self {
        Self {
            slot_repo,
            rating_repo,
            registration_repo,
            event_repo,
            session_repo,
            id_gen: IdGenerator::new(),
            shuffle_seed: None,
        }
    }

    /// Same service with a deterministic shuffle.
    #[must_use]
    pub fn with_shuffle_seed(mut self, seed: u64) -> Self {
        self.shuffle_seed = Some(seed);
        self
    }

    /// Create queue slots for confirmed participants that have none yet.
    ///
    /// Requires a closed voting session. New slots are appended after the
    /// current tail in shuffled order.
    pub async fn initialize_queue(
        &self,
        event_id: &str,
    ) -> AppResult<Vec<presentation_slot::Model>> {
        let session = self.session_repo.get_by_event(event_id).await?;
        if session.state != SessionState::Closed {
            return Err(AppError::InvalidState(
                "presentation queue opens after voting closes".to_string(),
            ));
        }

        let existing = self.slot_repo.find_by_event(event_id).await?;
        let confirmed = self
            .registration_repo
            .find_confirmed_by_event(event_id)
            .await?;

        let mut missing: Vec<String> = confirmed
            .into_iter()
            .map(|r| r.user_id)
            .filter(|user_id| !existing.iter().any(|s| &s.user_id == user_id))
            .collect();

        if missing.is_empty() {
            return Ok(existing);
        }

        let mut rng = match self.shuffle_seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        missing.shuffle(&mut rng);

        let next_position = existing.iter().map(|s| s.position).max().unwrap_or(0) + 1;
        for (offset, user_id) in missing.iter().enumerate() {
            let model = presentation_slot::ActiveModel {
                id: Set(self.id_gen.generate()),
                event_id: Set(event_id.to_string()),
                user_id: Set(user_id.clone()),
                position: Set(next_position + offset as i32),
                status: Set(SlotStatus::Waiting),
                started_at: Set(None),
                completed_at: Set(None),
                created_at: Set(Utc::now().into()),
            };
            self.slot_repo.create(model).await?;
        }

        info!(
            event_id = %event_id,
            appended = missing.len(),
            "Presentation queue initialized"
        );
        self.slot_repo.find_by_event(event_id).await
    }

    /// The queue in position order.
    pub async fn queue(&self, event_id: &str) -> AppResult<Vec<presentation_slot::Model>> {
        self.slot_repo.find_by_event(event_id).await
    }

    /// The slot on stage, or the next waiting one.
    pub async fn current(&self, event_id: &str) -> AppResult<Option<presentation_slot::Model>> {
        let slots = self.slot_repo.find_by_event(event_id).await?;
        let on_stage = slots.iter().find(|s| s.status == SlotStatus::Presenting);
        match on_stage {
            Some(slot) => Ok(Some(slot.clone())),
            None => Ok(slots
                .into_iter()
                .find(|s| s.status == SlotStatus::Waiting)),
        }
    }

    /// Put a waiting slot on stage. At most one slot presents at a time.
    pub async fn start_slot(
        &self,
        actor_id: &str,
        event_id: &str,
        slot_id: &str,
    ) -> AppResult<presentation_slot::Model> {
        self.require_organizer(actor_id, event_id).await?;

        let slots = self.slot_repo.find_by_event(event_id).await?;
        if slots.iter().any(|s| s.status == SlotStatus::Presenting) {
            return Err(AppError::InvalidState(
                "another presentation is in progress".to_string(),
            ));
        }
        let slot = slots
            .into_iter()
            .find(|s| s.id == slot_id)
            .ok_or_else(|| AppError::NotFound(format!("Presentation slot not found: {slot_id}")))?;
        if slot.status != SlotStatus::Waiting {
            return Err(AppError::InvalidState(format!(
                "slot is {:?}, expected waiting",
                slot.status
            )));
        }

        let active = presentation_slot::ActiveModel {
            id: Set(slot.id),
            status: Set(SlotStatus::Presenting),
            started_at: Set(Some(Utc::now().into())),
            ..Default::default()
        };
        self.slot_repo.update(active).await
    }

    /// Take the presenting slot off stage as completed.
    pub async fn complete_slot(
        &self,
        actor_id: &str,
        event_id: &str,
        slot_id: &str,
    ) -> AppResult<presentation_slot::Model> {
        self.require_organizer(actor_id, event_id).await?;

        let slot = self.slot_repo.get_by_id(slot_id).await?;
        if slot.event_id != event_id {
            return Err(AppError::NotFound(format!(
                "Presentation slot not found: {slot_id}"
            )));
        }
        if slot.status != SlotStatus::Presenting {
            return Err(AppError::InvalidState(format!(
                "slot is {:?}, expected presenting",
                slot.status
            )));
        }

        let active = presentation_slot::ActiveModel {
            id: Set(slot.id),
            status: Set(SlotStatus::Completed),
            completed_at: Set(Some(Utc::now().into())),
            ..Default::default()
        };
        self.slot_repo.update(active).await
    }

    /// Skip an absent participant's waiting slot.
    pub async fn skip_slot(
        &self,
        actor_id: &str,
        event_id: &str,
        slot_id: &str,
    ) -> AppResult<presentation_slot::Model> {
        self.require_organizer(actor_id, event_id).await?;

        let slot = self.slot_repo.get_by_id(slot_id).await?;
        if slot.event_id != event_id {
            return Err(AppError::NotFound(format!(
                "Presentation slot not found: {slot_id}"
            )));
        }
        if slot.status != SlotStatus::Waiting {
            return Err(AppError::InvalidState(format!(
                "slot is {:?}, expected waiting",
                slot.status
            )));
        }

        let active = presentation_slot::ActiveModel {
            id: Set(slot.id),
            status: Set(SlotStatus::Skipped),
            ..Default::default()
        };
        self.slot_repo.update(active).await
    }

    /// Rate a presenter 1-5, anonymously, once per rater.
    ///
    /// Open from the moment the queue exists, regardless of the presenter's
    /// slot status; ratings may come in during or after phase 2.
    pub async fn rate_presenter(
        &self,
        event_id: &str,
        rater_id: &str,
        presenter_id: &str,
        score: i16,
    ) -> AppResult<rating::Model> {
        if !(1..=5).contains(&score) {
            return Err(AppError::Validation(
                "score must be between 1 and 5".to_string(),
            ));
        }
        if rater_id == presenter_id {
            return Err(AppError::BadRequest(
                "presenters cannot rate themselves".to_string(),
            ));
        }

        let rater_registration = self
            .registration_repo
            .find_active(event_id, rater_id)
            .await?
            .ok_or_else(|| {
                AppError::Forbidden("only registered participants may rate".to_string())
            })?;
        if !rater_registration.status.counts_against_capacity() {
            return Err(AppError::Forbidden(
                "only confirmed participants may rate".to_string(),
            ));
        }

        self.slot_repo
            .find_by_event_and_user(event_id, presenter_id)
            .await?
            .ok_or_else(|| {
                AppError::NotFound(format!("no presentation slot for user {presenter_id}"))
            })?;

        if self
            .rating_repo
            .has_rated(event_id, presenter_id, rater_id)
            .await?
        {
            return Err(AppError::Conflict(
                "presenter already rated by this participant".to_string(),
            ));
        }

        let model = rating::ActiveModel {
            id: Set(self.id_gen.generate()),
            event_id: Set(event_id.to_string()),
            presenter_id: Set(presenter_id.to_string()),
            rater_id: Set(rater_id.to_string()),
            score: Set(score),
            created_at: Set(Utc::now().into()),
        };
        self.rating_repo.create(model).await
    }

    async fn require_organizer(&self, actor_id: &str, event_id: &str) -> AppResult<()> {
        let event = self.event_repo.get_by_id(event_id).await?;
        if event.organizer_id != actor_id {
            return Err(AppError::Forbidden(
                "only the organizer may run the presentation queue".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_seeded_shuffle_is_deterministic() {
        let mut first: Vec<u32> = (0..20).collect();
        let mut second: Vec<u32> = (0..20).collect();
        first.shuffle(&mut StdRng::seed_from_u64(42));
        second.shuffle(&mut StdRng::seed_from_u64(42));
        assert_eq!(first, second);

        let mut third: Vec<u32> = (0..20).collect();
        third.shuffle(&mut StdRng::seed_from_u64(43));
        assert_ne!(first, third);
    }
}
