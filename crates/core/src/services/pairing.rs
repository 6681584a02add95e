//! Speed-dating pairing (phase 3).
//!
//! Pairs are derived from the phase-2 ratings: a pair exists only when both
//! members rated each other, its score is the average of the two ratings.
//! Round assignment is pluggable; the default strategy schedules the best
//! scores into the earliest rounds.

use std::collections::HashMap;

use chrono::Utc;
use rendezvous_common::{AppError, AppResult, IdGenerator};
use rendezvous_db::{
    entities::{
        activity_option::EXTENDED_TOP_MATCH_CODE,
        pair,
        rating,
        voting_session::SessionState,
    },
    repositories::{
        ActivityOptionRepository, EventRepository, PairRepository, RatingRepository,
        RegistrationRepository, VotingSessionRepository,
    },
};
use sea_orm::Set;
use tracing::{info, warn};

use super::notification::NotificationService;

/// An unordered scored pair, members normalized to `user1 < user2`.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredPair {
    pub user1: String,
    pub user2: String,
    pub score: f64,
}

/// A scored pair placed into a round.
#[derive(Debug, Clone, PartialEq)]
pub struct PlannedPair {
    pub pair: ScoredPair,
    pub round: i32,
}

/// Round assignment over the scored pairs of one event.
pub trait PairingStrategy: Send + Sync {
    /// Place every pair into a round; no member may appear twice in the
    /// same round.
    fn assign_rounds(&self, pairs: Vec<ScoredPair>) -> Vec<PlannedPair>;
}

/// Default strategy: sort by score descending and give each pair the
/// earliest round where both members are free, so the strongest matches
/// happen while everyone is still fresh.
#[derive(Clone, Default)]
pub struct GreedyRoundRobin;

impl PairingStrategy for GreedyRoundRobin {
    fn assign_rounds(&self, mut pairs: Vec<ScoredPair>) -> Vec<PlannedPair> {
        pairs.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| (&a.user1, &a.user2).cmp(&(&b.user1, &b.user2)))
        });

        let mut busy: HashMap<String, Vec<i32>> = HashMap::new();
        let mut planned = Vec::with_capacity(pairs.len());
        for pair in pairs {
            let mut round = 1;
            loop {
                let u1_free = !busy.get(&pair.user1).is_some_and(|r| r.contains(&round));
                let u2_free = !busy.get(&pair.user2).is_some_and(|r| r.contains(&round));
                if u1_free && u2_free {
                    break;
                }
                round += 1;
            }
            busy.entry(pair.user1.clone()).or_default().push(round);
            busy.entry(pair.user2.clone()).or_default().push(round);
            planned.push(PlannedPair { pair, round });
        }
        planned
    }
}

/// Average the two directed ratings of every pair that rated each other.
///
/// One-sided ratings produce no pair: a match needs interest from both
/// sides. Members are normalized so `(a, b)` and `(b, a)` land on the same
/// key.
#[must_use]
pub fn mutual_scores(ratings: &[rating::Model]) -> Vec<ScoredPair> {
    let mut directed: HashMap<(&str, &str), i16> = HashMap::new();
    for r in ratings {
        directed.insert((r.rater_id.as_str(), r.presenter_id.as_str()), r.score);
    }

    let mut pairs = Vec::new();
    for (&(rater, presenter), &score) in &directed {
        if rater >= presenter {
            continue;
        }
        if let Some(&reverse) = directed.get(&(presenter, rater)) {
            pairs.push(ScoredPair {
                user1: rater.to_string(),
                user2: presenter.to_string(),
                score: f64::from(score + reverse) / 2.0,
            });
        }
    }
    pairs.sort_by(|a, b| (&a.user1, &a.user2).cmp(&(&b.user1, &b.user2)));
    pairs
}

/// Flag each participant's single highest-scoring pair.
///
/// The flag lives on the pair row, so a pair carrying one member's best
/// score is flagged even when the other member has a better match
/// elsewhere.
#[must_use]
pub fn top_match_flags(pairs: &[ScoredPair]) -> Vec<bool> {
    let mut best: HashMap<&str, f64> = HashMap::new();
    for pair in pairs {
        for user in [pair.user1.as_str(), pair.user2.as_str()] {
            let entry = best.entry(user).or_insert(f64::MIN);
            if pair.score > *entry {
                *entry = pair.score;
            }
        }
    }

    pairs
        .iter()
        .map(|pair| {
            best.get(pair.user1.as_str()) == Some(&pair.score)
                || best.get(pair.user2.as_str()) == Some(&pair.score)
        })
        .collect()
}

/// Pairing service for business logic.
#[derive(Clone)]
pub struct PairingService {
    pair_repo: PairRepository,
    rating_repo: RatingRepository,
    registration_repo: RegistrationRepository,
    event_repo: EventRepository,
    session_repo: VotingSessionRepository,
    option_repo: ActivityOptionRepository,
    notifications: NotificationService,
    strategy: std::sync::Arc<dyn PairingStrategy>,
    id_gen: IdGenerator,
    round_minutes: i32,
    extended_round_minutes: i32,
}

impl PairingService {
    /// Create a new pairing service with the default strategy.
    #[must_use]
    pub fn new(
        pair_repo: PairRepository,
        rating_repo: RatingRepository,
        registration_repo: RegistrationRepository,
        event_repo: EventRepository,
        session_repo: VotingSessionRepository,
        option_repo: ActivityOptionRepository,
        notifications: NotificationService,
        round_minutes: i32,
        extended_round_minutes: i32,
    ) -> Self {
        Self {
            pair_repo,
            rating_repo,
            registration_repo,
            event_repo,
            session_repo,
            option_repo,
            notifications,
            strategy: std::sync::Arc::new(GreedyRoundRobin),
            id_gen: IdGenerator::new(),
            round_minutes,
            extended_round_minutes,
        }
    }

    /// Replace the round-assignment strategy.
    #[must_use]
    pub fn with_strategy(mut self, strategy: std::sync::Arc<dyn PairingStrategy>) -> Self {
        self.strategy = strategy;
        self
    }

    /// Generate the event's pairs from the collected ratings.
    ///
    /// Runs once per event; a second call is a conflict. Top-match pairs
    /// get the extended round length when the extended-time twist won the
    /// vote.
    pub async fn generate_pairs(
        &self,
        actor_id: &str,
        event_id: &str,
    ) -> AppResult<Vec<pair::Model>> {
        let event = self.event_repo.get_by_id(event_id).await?;
        if event.organizer_id != actor_id {
            return Err(AppError::Forbidden(
                "only the organizer may generate pairs".to_string(),
            ));
        }

        let session = self.session_repo.get_by_event(event_id).await?;
        if session.state != SessionState::Closed {
            return Err(AppError::InvalidState(
                "pairing runs after voting closes".to_string(),
            ));
        }
        if self.pair_repo.exists_for_event(event_id).await? {
            return Err(AppError::Conflict(format!(
                "pairs already generated for event {event_id}"
            )));
        }

        let ratings = self.rating_repo.find_by_event(event_id).await?;
        let scored = mutual_scores(&ratings);
        let top_flags = top_match_flags(&scored);
        let extended_active = self.extended_time_won(&session.winner_speed_dating_twist_id).await?;

        let flags_by_pair: HashMap<(String, String), bool> = scored
            .iter()
            .zip(top_flags.iter())
            .map(|(p, &flag)| ((p.user1.clone(), p.user2.clone()), flag))
            .collect();

        let planned = self.strategy.assign_rounds(scored);
        let now = Utc::now();
        let models: Vec<pair::ActiveModel> = planned
            .iter()
            .map(|p| {
                let is_top = flags_by_pair
                    .get(&(p.pair.user1.clone(), p.pair.user2.clone()))
                    .copied()
                    .unwrap_or(false);
                let duration = if is_top && extended_active {
                    self.extended_round_minutes
                } else {
                    self.round_minutes
                };
                pair::ActiveModel {
                    id: Set(self.id_gen.generate()),
                    event_id: Set(event_id.to_string()),
                    round: Set(p.round),
                    user1_id: Set(p.pair.user1.clone()),
                    user2_id: Set(p.pair.user2.clone()),
                    mutual_score: Set(p.pair.score),
                    is_top_match: Set(is_top),
                    duration_minutes: Set(duration),
                    started_at: Set(None),
                    completed_at: Set(None),
                    created_at: Set(now.into()),
                }
            })
            .collect();

        self.pair_repo.insert_many(models).await?;
        info!(event_id = %event_id, pairs = planned.len(), "Pairs generated");

        let pairs = self.pair_repo.find_by_event(event_id).await?;
        self.notify_paired_users(event_id, &pairs).await;
        Ok(pairs)
    }

    /// The event's full pairing plan (organizer view).
    pub async fn list_for_event(
        &self,
        actor_id: &str,
        event_id: &str,
    ) -> AppResult<Vec<pair::Model>> {
        let event = self.event_repo.get_by_id(event_id).await?;
        if event.organizer_id != actor_id {
            return Err(AppError::Forbidden(
                "only the organizer may view all pairs".to_string(),
            ));
        }
        self.pair_repo.find_by_event(event_id).await
    }

    /// One participant's schedule, in round order.
    pub async fn list_for_user(
        &self,
        event_id: &str,
        user_id: &str,
    ) -> AppResult<Vec<pair::Model>> {
        let registration = self
            .registration_repo
            .find_active(event_id, user_id)
            .await?;
        if registration.is_none() {
            return Err(AppError::Forbidden(
                "only participants may view their pairs".to_string(),
            ));
        }
        self.pair_repo.find_by_event_and_user(event_id, user_id).await
    }

    async fn extended_time_won(&self, winner_twist_id: &Option<String>) -> AppResult<bool> {
        let Some(option_id) = winner_twist_id else {
            return Ok(false);
        };
        let option = self.option_repo.find_by_id(option_id).await?;
        Ok(option.is_some_and(|o| o.code == EXTENDED_TOP_MATCH_CODE))
    }

    async fn notify_paired_users(&self, event_id: &str, pairs: &[pair::Model]) {
        let mut notified: Vec<&str> = Vec::new();
        for pair in pairs {
            for user_id in [pair.user1_id.as_str(), pair.user2_id.as_str()] {
                if notified.contains(&user_id) {
                    continue;
                }
                notified.push(user_id);
                if let Err(e) = self.notifications.notify_pairs_ready(user_id, event_id).await {
                    warn!(event_id = %event_id, user_id = %user_id, error = %e, "Notification failed");
                }
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn rating_row(rater: &str, presenter: &str, score: i16) -> rating::Model {
        rating::Model {
            id: format!("{rater}-{presenter}"),
            event_id: "ev1".to_string(),
            presenter_id: presenter.to_string(),
            rater_id: rater.to_string(),
            score,
            created_at: Utc::now().into(),
        }
    }

    #[test]
    fn test_mutual_score_averages_both_directions() {
        let ratings = vec![
            rating_row("alice", "bob", 4),
            rating_row("bob", "alice", 5),
        ];
        let pairs = mutual_scores(&ratings);
        assert_eq!(pairs.len(), 1);
        assert_eq!(pairs[0].user1, "alice");
        assert_eq!(pairs[0].user2, "bob");
        assert!((pairs[0].score - 4.5).abs() < f64::EPSILON);
    }

    #[test]
    fn test_one_sided_rating_makes_no_pair() {
        let ratings = vec![rating_row("alice", "bob", 5)];
        assert!(mutual_scores(&ratings).is_empty());
    }

    #[test]
    fn test_members_normalized() {
        let ratings = vec![
            rating_row("zoe", "adam", 3),
            rating_row("adam", "zoe", 3),
        ];
        let pairs = mutual_scores(&ratings);
        assert_eq!(pairs[0].user1, "adam");
        assert_eq!(pairs[0].user2, "zoe");
    }

    #[test]
    fn test_rounds_never_double_book_a_member() {
        let pairs = vec![
            ScoredPair {
                user1: "a".into(),
                user2: "b".into(),
                score: 5.0,
            },
            ScoredPair {
                user1: "a".into(),
                user2: "c".into(),
                score: 4.0,
            },
            ScoredPair {
                user1: "b".into(),
                user2: "c".into(),
                score: 3.0,
            },
        ];
        let planned = GreedyRoundRobin.assign_rounds(pairs);

        for first in &planned {
            for second in &planned {
                if first.pair == second.pair {
                    continue;
                }
                let shared = [first.pair.user1.as_str(), first.pair.user2.as_str()]
                    .iter()
                    .any(|u| *u == second.pair.user1 || *u == second.pair.user2);
                if shared {
                    assert_ne!(first.round, second.round);
                }
            }
        }
    }

    #[test]
    fn test_best_score_gets_earliest_round() {
        let pairs = vec![
            ScoredPair {
                user1: "a".into(),
                user2: "b".into(),
                score: 2.0,
            },
            ScoredPair {
                user1: "c".into(),
                user2: "d".into(),
                score: 5.0,
            },
        ];
        let planned = GreedyRoundRobin.assign_rounds(pairs);

        let best = planned.iter().find(|p| p.pair.user1 == "c").unwrap();
        assert_eq!(best.round, 1);
    }

    #[test]
    fn test_top_match_flags_each_participants_best_pair() {
        let pairs = vec![
            ScoredPair {
                user1: "a".into(),
                user2: "b".into(),
                score: 5.0,
            },
            ScoredPair {
                user1: "b".into(),
                user2: "c".into(),
                score: 4.0,
            },
            ScoredPair {
                user1: "a".into(),
                user2: "c".into(),
                score: 2.0,
            },
        ];
        let flags = top_match_flags(&pairs);
        // (a, b) is best for a and for b; (b, c) is c's best and stays
        // flagged even though b prefers a; (a, c) is best for nobody
        assert_eq!(flags, vec![true, true, false]);
    }
}
