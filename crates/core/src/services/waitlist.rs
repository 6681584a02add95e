//! Waitlist promotion.
//!
//! Pure candidate selection over the event's registration set. The caller
//! runs this inside the event lock with a fresh fetch, then persists the
//! status change for the returned candidate.

use rendezvous_db::entities::user::Gender;
use rendezvous_db::entities::{event, registration};
use rendezvous_db::entities::registration::RegistrationStatus;

use super::capacity::CapacitySnapshot;

/// Pick the waitlisted registration to promote after a confirmed seat was
/// freed, or `None` when nobody fits.
///
/// `registrations` must be the event's full set in registration-time order;
/// waitlist fairness is FIFO within that order. When the freed seat belonged
/// to a pool, candidates from the same pool are preferred so a pool-limited
/// event does not drift; the fallback pass takes the oldest candidate whose
/// own pool still has room.
#[must_use]
pub fn select_promotion<'a>(
    event: &event::Model,
    registrations: &'a [registration::Model],
    freed_pool: Option<Gender>,
) -> Option<&'a registration::Model> {
    let snapshot = CapacitySnapshot::from_registrations(registrations);
    if snapshot.is_full(event) {
        return None;
    }

    let waitlisted: Vec<&registration::Model> = registrations
        .iter()
        .filter(|r| r.status == RegistrationStatus::Waitlisted)
        .collect();

    // Same-pool pass first, only meaningful when pools apply
    if event.gender_limits_active() {
        if let Some(pool) = freed_pool {
            let same_pool = waitlisted
                .iter()
                .find(|r| r.pool == Some(pool) && snapshot.has_room_for(event, r.pool))
                .copied();
            if let Some(candidate) = same_pool {
                return Some(candidate);
            }
        }
    }

    // FIFO fallback: oldest candidate that fits anywhere
    waitlisted
        .into_iter()
        .find(|r| snapshot.has_room_for(event, r.pool))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};

    fn pooled_event(capacity_total: i32, pools: Option<(i32, i32, i32)>) -> event::Model {
        let now = Utc::now();
        event::Model {
            id: "ev1".to_string(),
            organizer_id: "org1".to_string(),
            title: "Test Event".to_string(),
            description: None,
            starts_at: now.into(),
            registration_deadline: now.into(),
            capacity_total,
            capacity_female: pools.map(|p| p.0),
            capacity_male: pools.map(|p| p.1),
            capacity_nonbinary: pools.map(|p| p.2),
            min_age: None,
            max_age: None,
            required_language: None,
            is_published: true,
            is_cancelled: false,
            created_at: now.into(),
            updated_at: None,
        }
    }

    fn reg_at(
        id: &str,
        status: RegistrationStatus,
        pool: Option<Gender>,
        offset_secs: i64,
    ) -> registration::Model {
        let created = Utc::now() + Duration::seconds(offset_secs);
        registration::Model {
            id: id.to_string(),
            event_id: "ev1".to_string(),
            user_id: format!("user-{id}"),
            status,
            pool,
            created_at: created.into(),
            updated_at: None,
            cancelled_at: None,
        }
    }

    #[test]
    fn test_fifo_promotion_without_pools() {
        let event = pooled_event(2, None);
        let regs = vec![
            reg_at("r1", RegistrationStatus::Confirmed, None, 0),
            reg_at("r2", RegistrationStatus::Cancelled, None, 1),
            reg_at("r3", RegistrationStatus::Waitlisted, None, 2),
            reg_at("r4", RegistrationStatus::Waitlisted, None, 3),
        ];

        let candidate = select_promotion(&event, &regs, None).unwrap();
        assert_eq!(candidate.id, "r3");
    }

    #[test]
    fn test_no_promotion_when_full() {
        let event = pooled_event(2, None);
        let regs = vec![
            reg_at("r1", RegistrationStatus::Confirmed, None, 0),
            reg_at("r2", RegistrationStatus::Confirmed, None, 1),
            reg_at("r3", RegistrationStatus::Waitlisted, None, 2),
        ];

        assert!(select_promotion(&event, &regs, None).is_none());
    }

    #[test]
    fn test_same_pool_preferred_over_older_candidate() {
        // A male seat was freed; the older female candidate cannot take it
        // because her pool is full, so the male candidate is promoted.
        let event = pooled_event(4, Some((2, 2, 0)));
        let regs = vec![
            reg_at("f1", RegistrationStatus::Confirmed, Some(Gender::Female), 0),
            reg_at("f2", RegistrationStatus::Confirmed, Some(Gender::Female), 1),
            reg_at("m1", RegistrationStatus::Confirmed, Some(Gender::Male), 2),
            reg_at("f3", RegistrationStatus::Waitlisted, Some(Gender::Female), 3),
            reg_at("m2", RegistrationStatus::Waitlisted, Some(Gender::Male), 4),
        ];

        let candidate = select_promotion(&event, &regs, Some(Gender::Male)).unwrap();
        assert_eq!(candidate.id, "m2");
    }

    #[test]
    fn test_fallback_skips_full_pools() {
        // No same-pool candidate waits; the oldest candidate from a pool
        // with room wins, skipping candidates whose pool is still full.
        let event = pooled_event(4, Some((1, 2, 1)));
        let regs = vec![
            reg_at("f1", RegistrationStatus::Confirmed, Some(Gender::Female), 0),
            reg_at("m1", RegistrationStatus::Confirmed, Some(Gender::Male), 1),
            reg_at("f2", RegistrationStatus::Waitlisted, Some(Gender::Female), 2),
            reg_at("n1", RegistrationStatus::Waitlisted, Some(Gender::Nonbinary), 3),
        ];

        let candidate = select_promotion(&event, &regs, Some(Gender::Male)).unwrap();
        assert_eq!(candidate.id, "n1");
    }

    #[test]
    fn test_unknown_pool_candidate_fills_aggregate_seat() {
        let event = pooled_event(2, None);
        let regs = vec![
            reg_at("r1", RegistrationStatus::Confirmed, None, 0),
            reg_at("r2", RegistrationStatus::Waitlisted, None, 1),
        ];

        let candidate = select_promotion(&event, &regs, None).unwrap();
        assert_eq!(candidate.id, "r2");
    }
}
