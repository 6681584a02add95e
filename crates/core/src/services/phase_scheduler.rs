//! Phase scheduler.
//!
//! Background loop that drives scheduled voting transitions: sessions open
//! and close at their scheduled instants even when no organizer clicks the
//! button. Transitions go through the same versioned state machine as the
//! manual path, so a scheduler tick racing an organizer is harmless.

use chrono::Utc;
use rendezvous_db::entities::voting_session::SessionState;
use rendezvous_db::repositories::EventRepository;
use tracing::{debug, warn};

use super::presentation::PresentationService;
use super::voting::VotingService;

/// Scheduler over started events' voting sessions.
#[derive(Clone)]
pub struct PhaseScheduler {
    event_repo: EventRepository,
    voting: VotingService,
    presentation: PresentationService,
    interval_secs: u64,
}

impl PhaseScheduler {
    /// Create a new phase scheduler.
    #[must_use]
    pub const fn new(
        event_repo: EventRepository,
        voting: VotingService,
        presentation: PresentationService,
        interval_secs: u64,
    ) -> Self {
        Self {
            event_repo,
            voting,
            presentation,
            interval_secs,
        }
    }

    /// Run forever, ticking at the configured interval.
    pub async fn run(self) {
        let mut interval = tokio::time::interval(std::time::Duration::from_secs(self.interval_secs));
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
        loop {
            interval.tick().await;
            self.tick().await;
        }
    }

    /// Apply all due transitions once. Failures are logged per event and
    /// never stop the sweep.
    pub async fn tick(&self) {
        let events = match self.event_repo.find_started_uncancelled().await {
            Ok(events) => events,
            Err(e) => {
                warn!(error = %e, "Scheduler could not load started events");
                return;
            }
        };

        debug!(count = events.len(), "Scheduler tick");
        for event in events {
            if let Err(e) = self.advance_event(&event.id).await {
                warn!(event_id = %event.id, error = %e, "Scheduled transition failed");
            }
        }
    }

    async fn advance_event(&self, event_id: &str) -> rendezvous_common::AppResult<()> {
        let session = self.voting.ensure_session(event_id).await?;
        let now = Utc::now();

        match session.state {
            SessionState::NotStarted if now >= session.scheduled_start_at => {
                self.voting.open_session(event_id).await?;
            }
            SessionState::Active if now >= session.scheduled_end_at => {
                self.voting.close_session(event_id).await?;
                self.presentation.initialize_queue(event_id).await?;
            }
            _ => {}
        }
        Ok(())
    }
}
