//! CSV report export.
//!
//! Organizer-facing downloads of an event's registrations, rating summary,
//! and pairing plan.

use std::collections::HashMap;

use rendezvous_common::{AppError, AppResult};
use rendezvous_db::repositories::{
    EventRepository, PairRepository, RatingRepository, RegistrationRepository,
};
use serde::Serialize;

/// Export service for business logic.
#[derive(Clone)]
pub struct ExportService {
    registration_repo: RegistrationRepository,
    rating_repo: RatingRepository,
    pair_repo: PairRepository,
    event_repo: EventRepository,
}

#[derive(Serialize)]
struct RegistrationRow {
    registration_id: String,
    user_id: String,
    status: String,
    pool: String,
    registered_at: String,
}

#[derive(Serialize)]
struct RatingSummaryRow {
    presenter_id: String,
    ratings_received: usize,
    average_score: f64,
}

#[derive(Serialize)]
struct PairRow {
    round: i32,
    user1_id: String,
    user2_id: String,
    mutual_score: f64,
    is_top_match: bool,
    duration_minutes: i32,
}

impl ExportService {
    /// Create a new export service.
    #[must_use]
    pub const fn new(
        registration_repo: RegistrationRepository,
        rating_repo: RatingRepository,
        pair_repo: PairRepository,
        event_repo: EventRepository,
    ) -> Self {
        Self {
            registration_repo,
            rating_repo,
            pair_repo,
            event_repo,
        }
    }

    /// Registrations of one event as CSV, in registration order.
    pub async fn registrations_csv(&self, actor_id: &str, event_id: &str) -> AppResult<String> {
        self.require_organizer(actor_id, event_id).await?;
        let registrations = self.registration_repo.find_by_event(event_id).await?;

        let mut writer = csv::Writer::from_writer(vec![]);
        for reg in registrations {
            let row = RegistrationRow {
                registration_id: reg.id,
                user_id: reg.user_id,
                status: format!("{:?}", reg.status),
                pool: reg.pool.map(|p| format!("{p:?}")).unwrap_or_default(),
                registered_at: reg.created_at.to_rfc3339(),
            };
            writer
                .serialize(row)
                .map_err(|e| AppError::Internal(e.to_string()))?;
        }
        finish(writer)
    }

    /// Per-presenter rating summary as CSV. Raters stay anonymous: only
    /// counts and averages leave the system.
    pub async fn ratings_csv(&self, actor_id: &str, event_id: &str) -> AppResult<String> {
        self.require_organizer(actor_id, event_id).await?;
        let ratings = self.rating_repo.find_by_event(event_id).await?;

        let mut per_presenter: HashMap<&str, Vec<i16>> = HashMap::new();
        for rating in &ratings {
            per_presenter
                .entry(rating.presenter_id.as_str())
                .or_default()
                .push(rating.score);
        }

        let mut presenters: Vec<&&str> = per_presenter.keys().collect();
        presenters.sort_unstable();

        let mut writer = csv::Writer::from_writer(vec![]);
        for presenter in presenters {
            let scores = &per_presenter[*presenter];
            let sum: i32 = scores.iter().map(|s| i32::from(*s)).sum();
            let row = RatingSummaryRow {
                presenter_id: (*presenter).to_string(),
                ratings_received: scores.len(),
                average_score: f64::from(sum) / scores.len() as f64,
            };
            writer
                .serialize(row)
                .map_err(|e| AppError::Internal(e.to_string()))?;
        }
        finish(writer)
    }

    /// The pairing plan as CSV, round order.
    pub async fn pairs_csv(&self, actor_id: &str, event_id: &str) -> AppResult<String> {
        self.require_organizer(actor_id, event_id).await?;
        let pairs = self.pair_repo.find_by_event(event_id).await?;

        let mut writer = csv::Writer::from_writer(vec![]);
        for pair in pairs {
            let row = PairRow {
                round: pair.round,
                user1_id: pair.user1_id,
                user2_id: pair.user2_id,
                mutual_score: pair.mutual_score,
                is_top_match: pair.is_top_match,
                duration_minutes: pair.duration_minutes,
            };
            writer
                .serialize(row)
                .map_err(|e| AppError::Internal(e.to_string()))?;
        }
        finish(writer)
    }

    async fn require_organizer(&self, actor_id: &str, event_id: &str) -> AppResult<()> {
        let event = self.event_repo.get_by_id(event_id).await?;
        if event.organizer_id != actor_id {
            return Err(AppError::Forbidden(
                "only the organizer may export reports".to_string(),
            ));
        }
        Ok(())
    }
}

fn finish(writer: csv::Writer<Vec<u8>>) -> AppResult<String> {
    let bytes = writer
        .into_inner()
        .map_err(|e| AppError::Internal(e.to_string()))?;
    String::from_utf8(bytes).map_err(|e| AppError::Internal(e.to_string()))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_csv_rows_serialize_with_header() {
        let mut writer = csv::Writer::from_writer(vec![]);
        writer
            .serialize(PairRow {
                round: 1,
                user1_id: "u1".to_string(),
                user2_id: "u2".to_string(),
                mutual_score: 4.5,
                is_top_match: true,
                duration_minutes: 8,
            })
            .unwrap();
        let csv = finish(writer).unwrap();

        let mut lines = csv.lines();
        assert_eq!(
            lines.next().unwrap(),
            "round,user1_id,user2_id,mutual_score,is_top_match,duration_minutes"
        );
        assert_eq!(lines.next().unwrap(), "1,u1,u2,4.5,true,8");
    }
}
