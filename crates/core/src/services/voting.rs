//! Voting session state machine.
//!
//! One session per event, created lazily from the event's start time and
//! the configured offsets. Transitions go through the session's version
//! token so two callers racing on the same transition cannot both win;
//! the loser re-reads and treats an already-applied transition as
//! idempotent success.

use chrono::{Duration, Utc};
use rendezvous_common::{AppError, AppResult, IdGenerator};
use rendezvous_db::{
    entities::{
        activity_option,
        activity_option::ActivityCategory,
        activity_vote,
        event,
        voting_session,
        voting_session::SessionState,
    },
    repositories::{
        ActivityOptionRepository, ActivityVoteRepository, EventRepository, RegistrationRepository,
        VotingSessionRepository,
    },
};
use sea_orm::Set;
use tracing::{info, warn};

use super::notification::NotificationService;

/// Voting service for business logic.
#[derive(Clone)]
pub struct VotingService {
    session_repo: VotingSessionRepository,
    option_repo: ActivityOptionRepository,
    vote_repo: ActivityVoteRepository,
    registration_repo: RegistrationRepository,
    event_repo: EventRepository,
    notifications: NotificationService,
    id_gen: IdGenerator,
    voting_start_offset: Duration,
    voting_end_offset: Duration,
}

/// Input for adding a catalogue entry.
pub struct CreateOptionInput {
    pub category: ActivityCategory,
    pub label: String,
    pub code: String,
    pub position: i32,
}

/// Per-option tally for one category.
#[derive(Debug, Clone, serde::Serialize)]
pub struct OptionTally {
    pub option: activity_option::Model,
    pub votes: i64,
}

impl VotingService {
    /// Create a new voting service.
    #[must_use]
    pub fn new(
        session_repo: VotingSessionRepository,
        option_repo: ActivityOptionRepository,
        vote_repo: ActivityVoteRepository,
        registration_repo: RegistrationRepository,
        event_repo: EventRepository,
        notifications: NotificationService,
        voting_start_offset_minutes: i64,
        voting_end_offset_minutes: i64,
    ) -> Self {
        Self {
            session_repo,
            option_repo,
            vote_repo,
            registration_repo,
            event_repo,
            notifications,
            id_gen: IdGenerator::new(),
            voting_start_offset: Duration::minutes(voting_start_offset_minutes),
            voting_end_offset: Duration::minutes(voting_end_offset_minutes),
        }
    }

    /// The event's session, creating it lazily from the event schedule.
    pub async fn ensure_session(&self, event_id: &str) -> AppResult<voting_session::Model> {
        if let Some(session) = self.session_repo.find_by_event(event_id).await? {
            return Ok(session);
        }

        let event = self.event_repo.get_by_id(event_id).await?;
        if event.is_cancelled {
            return Err(AppError::InvalidState(
                "cancelled events have no voting session".to_string(),
            ));
        }

        let starts_at: chrono::DateTime<Utc> = event.starts_at.into();
        let model = voting_session::ActiveModel {
            event_id: Set(event_id.to_string()),
            state: Set(SessionState::NotStarted),
            scheduled_start_at: Set((starts_at + self.voting_start_offset).into()),
            scheduled_end_at: Set((starts_at + self.voting_end_offset).into()),
            opened_at: Set(None),
            closed_at: Set(None),
            votes_count: Set(0),
            winner_presentation_style_id: Set(None),
            winner_speed_dating_twist_id: Set(None),
            version: Set(0),
            created_at: Set(Utc::now().into()),
        };
        self.session_repo.create(model).await
    }

    /// Open the session. Idempotent when already active; closed sessions
    /// never reopen.
    pub async fn open_session(&self, event_id: &str) -> AppResult<voting_session::Model> {
        let session = self.ensure_session(event_id).await?;
        match session.state {
            SessionState::Active => return Ok(session),
            SessionState::Closed => {
                return Err(AppError::InvalidState(
                    "voting session already closed".to_string(),
                ));
            }
            SessionState::NotStarted => {}
        }

        let active = voting_session::ActiveModel {
            state: Set(SessionState::Active),
            opened_at: Set(Some(Utc::now().into())),
            version: Set(session.version + 1),
            ..Default::default()
        };
        let applied = self
            .session_repo
            .update_versioned(event_id, session.version, active)
            .await?;
        if !applied {
            // Someone else transitioned concurrently; their result stands
            let current = self.session_repo.get_by_event(event_id).await?;
            return match current.state {
                SessionState::Active => Ok(current),
                _ => Err(AppError::Conflict(
                    "voting session transitioned concurrently".to_string(),
                )),
            };
        }

        info!(event_id = %event_id, "Voting session opened");
        self.notify_participants_opened(event_id).await;
        self.session_repo.get_by_event(event_id).await
    }

    /// Close the session and record winners per category.
    ///
    /// Closing a session that never opened is legal and yields a closed
    /// session with zero votes and no winners; the row is created on the
    /// spot when an organizer ends voting before anything else touched it.
    pub async fn close_session(&self, event_id: &str) -> AppResult<voting_session::Model> {
        let session = self.ensure_session(event_id).await?;
        if session.state == SessionState::Closed {
            return Ok(session);
        }

        let votes = self.vote_repo.find_by_event(event_id).await?;
        let styles = self
            .option_repo
            .find_active_by_category(ActivityCategory::PresentationStyle)
            .await?;
        let twists = self
            .option_repo
            .find_active_by_category(ActivityCategory::SpeedDatingTwist)
            .await?;

        let winner_style = compute_winner(&styles, &votes, ActivityCategory::PresentationStyle);
        let winner_twist = compute_winner(&twists, &votes, ActivityCategory::SpeedDatingTwist);

        let active = voting_session::ActiveModel {
            state: Set(SessionState::Closed),
            closed_at: Set(Some(Utc::now().into())),
            winner_presentation_style_id: Set(winner_style.clone()),
            winner_speed_dating_twist_id: Set(winner_twist.clone()),
            version: Set(session.version + 1),
            ..Default::default()
        };
        let applied = self
            .session_repo
            .update_versioned(event_id, session.version, active)
            .await?;
        if !applied {
            let current = self.session_repo.get_by_event(event_id).await?;
            return match current.state {
                SessionState::Closed => Ok(current),
                _ => Err(AppError::Conflict(
                    "voting session transitioned concurrently".to_string(),
                )),
            };
        }

        info!(
            event_id = %event_id,
            winner_style = ?winner_style,
            winner_twist = ?winner_twist,
            "Voting session closed"
        );
        self.session_repo.get_by_event(event_id).await
    }

    /// Organizer-triggered open, ahead of or instead of the scheduler.
    pub async fn start_voting(
        &self,
        actor_id: &str,
        event_id: &str,
    ) -> AppResult<voting_session::Model> {
        self.require_organizer(actor_id, event_id).await?;
        self.open_session(event_id).await
    }

    /// Organizer-triggered close.
    pub async fn end_voting(
        &self,
        actor_id: &str,
        event_id: &str,
    ) -> AppResult<voting_session::Model> {
        self.require_organizer(actor_id, event_id).await?;
        self.close_session(event_id).await
    }

    /// Cast a vote in the category of the chosen option.
    ///
    /// One vote per category per participant; the option's category is
    /// authoritative, the caller never names a category directly.
    pub async fn cast_vote(
        &self,
        event_id: &str,
        user_id: &str,
        option_id: &str,
    ) -> AppResult<activity_vote::Model> {
        let session = self.session_repo.get_by_event(event_id).await?;
        if session.state != SessionState::Active {
            return Err(AppError::InvalidState(
                "voting session is not active".to_string(),
            ));
        }
        if !vote_window_contains(&session, Utc::now()) {
            return Err(AppError::InvalidState(
                "outside the scheduled voting window".to_string(),
            ));
        }

        let registration = self
            .registration_repo
            .find_active(event_id, user_id)
            .await?
            .ok_or_else(|| {
                AppError::Forbidden("only registered participants may vote".to_string())
            })?;
        if !registration.status.counts_against_capacity() {
            return Err(AppError::Forbidden(
                "only confirmed participants may vote".to_string(),
            ));
        }

        let option = self
            .option_repo
            .find_by_id(option_id)
            .await?
            .filter(|o| o.is_active)
            .ok_or_else(|| AppError::NotFound(format!("Activity option not found: {option_id}")))?;

        if self
            .vote_repo
            .has_voted(event_id, user_id, option.category)
            .await?
        {
            return Err(AppError::DuplicateVote(format!("{:?}", option.category)));
        }

        let model = activity_vote::ActiveModel {
            id: Set(self.id_gen.generate()),
            event_id: Set(event_id.to_string()),
            user_id: Set(user_id.to_string()),
            category: Set(option.category),
            option_id: Set(option_id.to_string()),
            created_at: Set(Utc::now().into()),
        };
        let vote = self.vote_repo.create(model).await?;
        self.session_repo.increment_votes(event_id).await?;

        Ok(vote)
    }

    /// Current session for an event.
    pub async fn session(&self, event_id: &str) -> AppResult<voting_session::Model> {
        self.session_repo.get_by_event(event_id).await
    }

    /// Tallies per option for one category.
    pub async fn tallies(
        &self,
        event_id: &str,
        category: ActivityCategory,
    ) -> AppResult<Vec<OptionTally>> {
        let options = self.option_repo.find_active_by_category(category).await?;
        let votes = self.vote_repo.find_by_event(event_id).await?;

        Ok(options
            .into_iter()
            .map(|option| {
                let count = votes
                    .iter()
                    .filter(|v| v.category == category && v.option_id == option.id)
                    .count() as i64;
                OptionTally {
                    option,
                    votes: count,
                }
            })
            .collect())
    }

    /// Active catalogue for one category, in catalogue order.
    pub async fn options(
        &self,
        category: ActivityCategory,
    ) -> AppResult<Vec<activity_option::Model>> {
        self.option_repo.find_active_by_category(category).await
    }

    /// Add an entry to the shared activity catalogue. Organizer accounts
    /// only; the catalogue is global, not per event.
    pub async fn create_option(
        &self,
        actor: &rendezvous_db::entities::user::Model,
        input: CreateOptionInput,
    ) -> AppResult<activity_option::Model> {
        if !actor.is_organizer {
            return Err(AppError::Forbidden(
                "only organizer accounts may edit the catalogue".to_string(),
            ));
        }
        if input.label.trim().is_empty() || input.code.trim().is_empty() {
            return Err(AppError::Validation(
                "option label and code cannot be empty".to_string(),
            ));
        }

        let model = activity_option::ActiveModel {
            id: Set(self.id_gen.generate()),
            category: Set(input.category),
            label: Set(input.label),
            code: Set(input.code),
            position: Set(input.position),
            is_active: Set(true),
            created_at: Set(Utc::now().into()),
        };
        self.option_repo.create(model).await
    }

    async fn require_organizer(&self, actor_id: &str, event_id: &str) -> AppResult<event::Model> {
        let event = self.event_repo.get_by_id(event_id).await?;
        if event.organizer_id != actor_id {
            return Err(AppError::Forbidden(
                "only the organizer may control the voting session".to_string(),
            ));
        }
        Ok(event)
    }

    async fn notify_participants_opened(&self, event_id: &str) {
        let confirmed = match self.registration_repo.find_confirmed_by_event(event_id).await {
            Ok(regs) => regs,
            Err(e) => {
                warn!(event_id = %event_id, error = %e, "Could not load participants to notify");
                return;
            }
        };
        for reg in confirmed {
            if let Err(e) = self
                .notifications
                .notify_voting_opened(&reg.user_id, event_id)
                .await
            {
                warn!(event_id = %event_id, user_id = %reg.user_id, error = %e, "Notification failed");
            }
        }
    }
}

/// Whether `now` falls inside the session's scheduled voting window.
///
/// Bounds votes on both sides: a session an organizer opened early does
/// not accept votes before the window, and one left open does not accept
/// them after it.
#[must_use]
pub fn vote_window_contains(
    session: &voting_session::Model,
    now: chrono::DateTime<Utc>,
) -> bool {
    now >= session.scheduled_start_at && now <= session.scheduled_end_at
}

/// Winner of one category: most votes among active options, ties broken by
/// lowest option ID so reruns of the same ballot agree. No votes, no winner.
#[must_use]
pub fn compute_winner(
    options: &[activity_option::Model],
    votes: &[activity_vote::Model],
    category: ActivityCategory,
) -> Option<String> {
    let mut best: Option<(&activity_option::Model, usize)> = None;
    for option in options.iter().filter(|o| o.category == category) {
        let count = votes
            .iter()
            .filter(|v| v.category == category && v.option_id == option.id)
            .count();
        if count == 0 {
            continue;
        }
        let better = match best {
            None => true,
            Some((current, current_count)) => {
                count > current_count || (count == current_count && option.id < current.id)
            }
        };
        if better {
            best = Some((option, count));
        }
    }
    best.map(|(option, _)| option.id.clone())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use rendezvous_db::repositories::NotificationRepository;
    use sea_orm::{DatabaseBackend, DatabaseConnection, MockDatabase, MockExecResult};
    use std::sync::Arc;

    fn option(id: &str, category: ActivityCategory) -> activity_option::Model {
        activity_option::Model {
            id: id.to_string(),
            category,
            label: id.to_string(),
            code: format!("code-{id}"),
            position: 0,
            is_active: true,
            created_at: Utc::now().into(),
        }
    }

    fn vote(id: &str, option_id: &str, category: ActivityCategory) -> activity_vote::Model {
        activity_vote::Model {
            id: id.to_string(),
            event_id: "ev1".to_string(),
            user_id: format!("user-{id}"),
            category,
            option_id: option_id.to_string(),
            created_at: Utc::now().into(),
        }
    }

    #[test]
    fn test_winner_is_most_voted() {
        let options = vec![
            option("opt-a", ActivityCategory::PresentationStyle),
            option("opt-b", ActivityCategory::PresentationStyle),
        ];
        let votes = vec![
            vote("v1", "opt-a", ActivityCategory::PresentationStyle),
            vote("v2", "opt-b", ActivityCategory::PresentationStyle),
            vote("v3", "opt-b", ActivityCategory::PresentationStyle),
        ];

        let winner = compute_winner(&options, &votes, ActivityCategory::PresentationStyle);
        assert_eq!(winner.as_deref(), Some("opt-b"));
    }

    #[test]
    fn test_tie_breaks_to_lowest_id() {
        let options = vec![
            option("opt-b", ActivityCategory::SpeedDatingTwist),
            option("opt-a", ActivityCategory::SpeedDatingTwist),
        ];
        let votes = vec![
            vote("v1", "opt-a", ActivityCategory::SpeedDatingTwist),
            vote("v2", "opt-b", ActivityCategory::SpeedDatingTwist),
        ];

        let winner = compute_winner(&options, &votes, ActivityCategory::SpeedDatingTwist);
        assert_eq!(winner.as_deref(), Some("opt-a"));
    }

    #[test]
    fn test_no_votes_means_no_winner() {
        let options = vec![option("opt-a", ActivityCategory::PresentationStyle)];
        let winner = compute_winner(&options, &[], ActivityCategory::PresentationStyle);
        assert!(winner.is_none());
    }

    fn session_with_window(
        state: SessionState,
        start_offset_mins: i64,
        end_offset_mins: i64,
    ) -> voting_session::Model {
        let now = Utc::now();
        voting_session::Model {
            event_id: "ev1".to_string(),
            state,
            scheduled_start_at: (now + Duration::minutes(start_offset_mins)).into(),
            scheduled_end_at: (now + Duration::minutes(end_offset_mins)).into(),
            opened_at: None,
            closed_at: None,
            votes_count: 0,
            winner_presentation_style_id: None,
            winner_speed_dating_twist_id: None,
            version: 0,
            created_at: now.into(),
        }
    }

    fn test_event() -> rendezvous_db::entities::event::Model {
        let now = Utc::now();
        rendezvous_db::entities::event::Model {
            id: "ev1".to_string(),
            organizer_id: "org1".to_string(),
            title: "Test Event".to_string(),
            description: None,
            starts_at: (now + Duration::hours(2)).into(),
            registration_deadline: (now + Duration::hours(1)).into(),
            capacity_total: 10,
            capacity_female: None,
            capacity_male: None,
            capacity_nonbinary: None,
            min_age: None,
            max_age: None,
            required_language: None,
            is_published: true,
            is_cancelled: false,
            created_at: now.into(),
            updated_at: None,
        }
    }

    fn service(db: Arc<DatabaseConnection>) -> VotingService {
        VotingService::new(
            VotingSessionRepository::new(db.clone()),
            ActivityOptionRepository::new(db.clone()),
            ActivityVoteRepository::new(db.clone()),
            RegistrationRepository::new(db.clone()),
            EventRepository::new(db.clone()),
            NotificationService::new(NotificationRepository::new(db)),
            15,
            45,
        )
    }

    #[test]
    fn test_vote_window_rejects_early_and_late() {
        let upcoming = session_with_window(SessionState::Active, 10, 40);
        assert!(!vote_window_contains(&upcoming, Utc::now()));

        let open = session_with_window(SessionState::Active, -10, 30);
        assert!(vote_window_contains(&open, Utc::now()));

        let elapsed = session_with_window(SessionState::Active, -60, -20);
        assert!(!vote_window_contains(&elapsed, Utc::now()));
    }

    #[tokio::test]
    async fn test_close_before_session_exists_creates_and_closes() {
        // No session row yet: ending voting creates one lazily, then
        // closes it with zero votes and no winners
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<voting_session::Model>::new()])
                .append_query_results([[test_event()]])
                .append_exec_results([MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 1,
                }])
                .append_query_results([[session_with_window(SessionState::NotStarted, 15, 45)]])
                .append_query_results([Vec::<activity_vote::Model>::new()])
                .append_query_results([Vec::<activity_option::Model>::new()])
                .append_query_results([Vec::<activity_option::Model>::new()])
                .append_exec_results([MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 1,
                }])
                .append_query_results([[session_with_window(SessionState::Closed, 15, 45)]])
                .into_connection(),
        );

        let svc = service(db);
        let session = svc.close_session("ev1").await.unwrap();
        assert_eq!(session.state, SessionState::Closed);
        assert_eq!(session.votes_count, 0);
        assert!(session.winner_presentation_style_id.is_none());
    }

    #[test]
    fn test_categories_tally_independently() {
        let options = vec![
            option("style-a", ActivityCategory::PresentationStyle),
            option("twist-a", ActivityCategory::SpeedDatingTwist),
        ];
        let votes = vec![
            vote("v1", "style-a", ActivityCategory::PresentationStyle),
            vote("v2", "twist-a", ActivityCategory::SpeedDatingTwist),
        ];

        assert_eq!(
            compute_winner(&options, &votes, ActivityCategory::PresentationStyle).as_deref(),
            Some("style-a")
        );
        assert_eq!(
            compute_winner(&options, &votes, ActivityCategory::SpeedDatingTwist).as_deref(),
            Some("twist-a")
        );
    }
}
