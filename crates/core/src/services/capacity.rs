//! Capacity model.
//!
//! Pure read functions over a snapshot of one event's registration set.
//! The allocator builds a fresh snapshot inside the event lock before every
//! decision; counts are never cached across lock scopes, so the answers here
//! are atomic with the write that follows them.

use std::collections::HashMap;

use rendezvous_db::entities::event;
use rendezvous_db::entities::registration;
use rendezvous_db::entities::user::Gender;

/// Confirmed-count view over one event's registrations.
#[derive(Debug, Clone)]
pub struct CapacitySnapshot {
    confirmed_total: i32,
    confirmed_per_pool: HashMap<Gender, i32>,
}

impl CapacitySnapshot {
    /// Build a snapshot from the authoritative registration rows.
    ///
    /// Only confirmed/attended rows count against capacity; waitlisted,
    /// pending and cancelled rows do not.
    #[must_use]
    pub fn from_registrations(registrations: &[registration::Model]) -> Self {
        let mut confirmed_total = 0;
        let mut confirmed_per_pool: HashMap<Gender, i32> = HashMap::new();

        for reg in registrations {
            if reg.status.counts_against_capacity() {
                confirmed_total += 1;
                if let Some(pool) = reg.pool {
                    *confirmed_per_pool.entry(pool).or_insert(0) += 1;
                }
            }
        }

        Self {
            confirmed_total,
            confirmed_per_pool,
        }
    }

    /// Count of registrations in {confirmed, attended}.
    #[must_use]
    pub const fn confirmed_count(&self) -> i32 {
        self.confirmed_total
    }

    /// Same, filtered to one pool.
    #[must_use]
    pub fn pool_confirmed_count(&self, pool: Gender) -> i32 {
        self.confirmed_per_pool.get(&pool).copied().unwrap_or(0)
    }

    /// Whether the event has reached its aggregate capacity.
    #[must_use]
    pub const fn is_full(&self, event: &event::Model) -> bool {
        self.confirmed_total >= event.capacity_total
    }

    /// Whether one pool has reached its cap.
    ///
    /// Always `false` when gender limits are inactive: capacity is then
    /// evaluated only in aggregate.
    #[must_use]
    pub fn is_pool_full(&self, event: &event::Model, pool: Gender) -> bool {
        if !event.gender_limits_active() {
            return false;
        }
        match event.pool_capacity(pool) {
            Some(cap) => self.pool_confirmed_count(pool) >= cap,
            None => false,
        }
    }

    /// Whether a participant from the given pool fits right now.
    ///
    /// An unknown pool is only checked against the aggregate cap.
    #[must_use]
    pub fn has_room_for(&self, event: &event::Model, pool: Option<Gender>) -> bool {
        if self.is_full(event) {
            return false;
        }
        match pool {
            Some(p) => !self.is_pool_full(event, p),
            None => true,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::Utc;
    use rendezvous_db::entities::registration::RegistrationStatus;

    fn test_event(
        capacity_total: i32,
        pools: Option<(i32, i32, i32)>,
    ) -> event::Model {
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

    fn test_registration(
        id: &str,
        user_id: &str,
        status: RegistrationStatus,
        pool: Option<Gender>,
    ) -> registration::Model {
        let now = Utc::now();
        registration::Model {
            id: id.to_string(),
            event_id: "ev1".to_string(),
            user_id: user_id.to_string(),
            status,
            pool,
            created_at: now.into(),
            updated_at: None,
            cancelled_at: None,
        }
    }

    #[test]
    fn test_confirmed_count_ignores_waitlist_and_cancelled() {
        let regs = vec![
            test_registration("r1", "u1", RegistrationStatus::Confirmed, None),
            test_registration("r2", "u2", RegistrationStatus::Attended, None),
            test_registration("r3", "u3", RegistrationStatus::Waitlisted, None),
            test_registration("r4", "u4", RegistrationStatus::Cancelled, None),
            test_registration("r5", "u5", RegistrationStatus::Pending, None),
        ];
        let snapshot = CapacitySnapshot::from_registrations(&regs);
        assert_eq!(snapshot.confirmed_count(), 2);
    }

    #[test]
    fn test_is_full_aggregate() {
        let event = test_event(2, None);
        let regs = vec![
            test_registration("r1", "u1", RegistrationStatus::Confirmed, None),
            test_registration("r2", "u2", RegistrationStatus::Confirmed, None),
        ];
        let snapshot = CapacitySnapshot::from_registrations(&regs);
        assert!(snapshot.is_full(&event));
        // Pools are never full when gender limits are inactive
        assert!(!snapshot.is_pool_full(&event, Gender::Female));
    }

    #[test]
    fn test_pool_full_independent_of_total() {
        let event = test_event(3, Some((1, 1, 1)));
        let regs = vec![test_registration(
            "r1",
            "u1",
            RegistrationStatus::Confirmed,
            Some(Gender::Female),
        )];
        let snapshot = CapacitySnapshot::from_registrations(&regs);
        assert!(!snapshot.is_full(&event));
        assert!(snapshot.is_pool_full(&event, Gender::Female));
        assert!(!snapshot.is_pool_full(&event, Gender::Male));
        assert!(!snapshot.has_room_for(&event, Some(Gender::Female)));
        assert!(snapshot.has_room_for(&event, Some(Gender::Male)));
    }
}
