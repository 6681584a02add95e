//! Registration allocator.
//!
//! Registration and cancellation for one event run inside that event's
//! lock: the capacity snapshot is rebuilt from a fresh fetch after the lock
//! is held, so the decision and the write it justifies are atomic. Cheap
//! terminal rejections (deadline, eligibility, cancelled event) run before
//! the lock so they never occupy the serialized section.

use std::sync::Arc;

use chrono::Utc;
use rendezvous_common::{AppError, AppResult, IdGenerator};
use rendezvous_db::{
    entities::{registration, registration::RegistrationStatus},
    repositories::{EventRepository, RegistrationRepository, UserRepository},
};
use sea_orm::Set;
use tracing::{info, warn};

use super::capacity::CapacitySnapshot;
use super::eligibility::EligibilityCheck;
use super::event_lock::EventLockRegistry;
use super::notification::NotificationService;
use super::waitlist;

/// Registration service for business logic.
#[derive(Clone)]
pub struct RegistrationService {
    registration_repo: RegistrationRepository,
    event_repo: EventRepository,
    user_repo: UserRepository,
    locks: EventLockRegistry,
    eligibility: Arc<dyn EligibilityCheck>,
    notifications: NotificationService,
    id_gen: IdGenerator,
}

impl RegistrationService {
    /// Create a new registration service.
    pub fn new(
        registration_repo: RegistrationRepository,
        event_repo: EventRepository,
        user_repo: UserRepository,
        locks: EventLockRegistry,
        eligibility: Arc<dyn EligibilityCheck>,
        notifications: NotificationService,
    ) -> Self {
        Self {
            registration_repo,
            event_repo,
            user_repo,
            locks,
            eligibility,
            notifications,
            id_gen: IdGenerator::new(),
        }
    }

    /// Register a user for an event.
    ///
    /// Confirms immediately when the user's pool (and the aggregate cap)
    /// has room, otherwise waitlists. A previously cancelled registration
    /// is reactivated instead of inserting a second row.
    pub async fn register(&self, event_id: &str, user_id: &str) -> AppResult<registration::Model> {
        let event = self.event_repo.get_by_id(event_id).await?;
        if !event.is_published || event.is_cancelled {
            return Err(AppError::RegistrationClosed(event_id.to_string()));
        }
        if Utc::now() > event.registration_deadline {
            return Err(AppError::RegistrationClosed(format!(
                "deadline passed for event {event_id}"
            )));
        }

        let user = self.user_repo.get_by_id(user_id).await?;
        self.eligibility.check(&user, &event).await?;

        // Cheap duplicate check before the lock; re-checked inside
        if let Some(existing) = self.registration_repo.find_active(event_id, user_id).await? {
            return Err(AppError::AlreadyRegistered(format!(
                "{event_id} (status: {:?})",
                existing.status
            )));
        }

        let registration = {
            let _lock = self.locks.acquire(event_id).await?;

            // The event may have been cancelled or had its deadline moved
            // while this request waited for the lock; decide against a
            // fresh row, not the pre-lock fetch
            let event = self.event_repo.get_by_id(event_id).await?;
            if !event.is_published || event.is_cancelled {
                return Err(AppError::RegistrationClosed(event_id.to_string()));
            }
            if Utc::now() > event.registration_deadline {
                return Err(AppError::RegistrationClosed(format!(
                    "deadline passed for event {event_id}"
                )));
            }

            if let Some(existing) = self.registration_repo.find_active(event_id, user_id).await? {
                return Err(AppError::AlreadyRegistered(format!(
                    "{event_id} (status: {:?})",
                    existing.status
                )));
            }

            let registrations = self.registration_repo.find_by_event(event_id).await?;
            let snapshot = CapacitySnapshot::from_registrations(&registrations);

            let status = if snapshot.has_room_for(&event, user.gender) {
                RegistrationStatus::Confirmed
            } else {
                RegistrationStatus::Waitlisted
            };

            match self.registration_repo.find_cancelled(event_id, user_id).await? {
                Some(cancelled) => {
                    let active = registration::ActiveModel {
                        id: Set(cancelled.id),
                        status: Set(status),
                        pool: Set(user.gender),
                        cancelled_at: Set(None),
                        updated_at: Set(Some(Utc::now().into())),
                        ..Default::default()
                    };
                    self.registration_repo.update(active).await?
                }
                None => {
                    let active = registration::ActiveModel {
                        id: Set(self.id_gen.generate()),
                        event_id: Set(event_id.to_string()),
                        user_id: Set(user_id.to_string()),
                        status: Set(status),
                        pool: Set(user.gender),
                        created_at: Set(Utc::now().into()),
                        updated_at: Set(None),
                        cancelled_at: Set(None),
                    };
                    self.registration_repo.create(active).await?
                }
            }
        };

        info!(
            event_id = %event_id,
            user_id = %user_id,
            status = ?registration.status,
            "Registration allocated"
        );

        let notified = match registration.status {
            RegistrationStatus::Confirmed => {
                self.notifications
                    .notify_registration_confirmed(user_id, event_id)
                    .await
            }
            _ => self.notifications.notify_waitlisted(user_id, event_id).await,
        };
        if let Err(e) = notified {
            warn!(event_id = %event_id, user_id = %user_id, error = %e, "Notification failed");
        }

        Ok(registration)
    }

    /// Cancel a registration, promoting the best waitlist candidate when a
    /// confirmed seat was freed.
    pub async fn cancel(&self, event_id: &str, user_id: &str) -> AppResult<registration::Model> {
        let (cancelled, promoted) = {
            let _lock = self.locks.acquire(event_id).await?;

            // Fetched inside the lock so promotion sees the current
            // cancellation flag and capacity configuration
            let event = self.event_repo.get_by_id(event_id).await?;

            let existing = self
                .registration_repo
                .find_active(event_id, user_id)
                .await?
                .ok_or_else(|| {
                    AppError::NotFound(format!("no active registration for event {event_id}"))
                })?;

            let freed_seat = existing.status.counts_against_capacity();
            let freed_pool = existing.pool;

            let active = registration::ActiveModel {
                id: Set(existing.id.clone()),
                status: Set(RegistrationStatus::Cancelled),
                cancelled_at: Set(Some(Utc::now().into())),
                updated_at: Set(Some(Utc::now().into())),
                ..Default::default()
            };
            let cancelled = self.registration_repo.update(active).await?;

            let mut promoted = None;
            if freed_seat && !event.is_cancelled {
                let registrations = self.registration_repo.find_by_event(event_id).await?;
                if let Some(candidate) =
                    waitlist::select_promotion(&event, &registrations, freed_pool)
                {
                    let promote = registration::ActiveModel {
                        id: Set(candidate.id.clone()),
                        status: Set(RegistrationStatus::Confirmed),
                        updated_at: Set(Some(Utc::now().into())),
                        ..Default::default()
                    };
                    promoted = Some(self.registration_repo.update(promote).await?);
                }
            }

            (cancelled, promoted)
        };

        info!(event_id = %event_id, user_id = %user_id, "Registration cancelled");

        if let Some(promoted) = promoted {
            info!(
                event_id = %event_id,
                user_id = %promoted.user_id,
                "Waitlist candidate promoted"
            );
            if let Err(e) = self
                .notifications
                .notify_waitlist_promoted(&promoted.user_id, event_id)
                .await
            {
                warn!(event_id = %event_id, error = %e, "Promotion notification failed");
            }
        }

        Ok(cancelled)
    }

    /// The requester's registration for an event, if any non-cancelled one
    /// exists.
    pub async fn find_own(
        &self,
        event_id: &str,
        user_id: &str,
    ) -> AppResult<Option<registration::Model>> {
        self.registration_repo.find_active(event_id, user_id).await
    }

    /// All registrations for an event (organizer view).
    pub async fn list_for_event(
        &self,
        actor_id: &str,
        event_id: &str,
    ) -> AppResult<Vec<registration::Model>> {
        let event = self.event_repo.get_by_id(event_id).await?;
        if event.organizer_id != actor_id {
            return Err(AppError::Forbidden(
                "only the organizer may list registrations".to_string(),
            ));
        }
        self.registration_repo.find_by_event(event_id).await
    }

    /// The waitlist in promotion order (organizer view).
    pub async fn waitlist_for_event(
        &self,
        actor_id: &str,
        event_id: &str,
    ) -> AppResult<Vec<registration::Model>> {
        let event = self.event_repo.get_by_id(event_id).await?;
        if event.organizer_id != actor_id {
            return Err(AppError::Forbidden(
                "only the organizer may view the waitlist".to_string(),
            ));
        }
        self.registration_repo.find_waitlisted_by_event(event_id).await
    }

    /// A user's registrations across events, newest first.
    pub async fn list_for_user(&self, user_id: &str) -> AppResult<Vec<registration::Model>> {
        self.registration_repo.find_by_user(user_id).await
    }

    /// Record attendance at check-in. Only confirmed registrations can be
    /// marked; the transition is organizer-only.
    pub async fn mark_attendance(
        &self,
        actor_id: &str,
        event_id: &str,
        user_id: &str,
        attended: bool,
    ) -> AppResult<registration::Model> {
        let event = self.event_repo.get_by_id(event_id).await?;
        if event.organizer_id != actor_id {
            return Err(AppError::Forbidden(
                "only the organizer may record attendance".to_string(),
            ));
        }

        let existing = self
            .registration_repo
            .find_active(event_id, user_id)
            .await?
            .ok_or_else(|| {
                AppError::NotFound(format!("no active registration for event {event_id}"))
            })?;
        if existing.status != RegistrationStatus::Confirmed {
            return Err(AppError::InvalidState(format!(
                "attendance requires a confirmed registration, found {:?}",
                existing.status
            )));
        }

        let status = if attended {
            RegistrationStatus::Attended
        } else {
            RegistrationStatus::NoShow
        };
        let active = registration::ActiveModel {
            id: Set(existing.id),
            status: Set(status),
            updated_at: Set(Some(Utc::now().into())),
            ..Default::default()
        };
        self.registration_repo.update(active).await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use rendezvous_db::entities::{event, notification, user};
    use rendezvous_db::repositories::NotificationRepository;
    use sea_orm::{DatabaseBackend, DatabaseConnection, MockDatabase, MockExecResult};

    use crate::services::eligibility::ProfileEligibility;

    fn service(db: Arc<DatabaseConnection>) -> RegistrationService {
        RegistrationService::new(
            RegistrationRepository::new(db.clone()),
            EventRepository::new(db.clone()),
            UserRepository::new(db.clone()),
            EventLockRegistry::new(1000),
            Arc::new(ProfileEligibility::new()),
            NotificationService::new(NotificationRepository::new(db)),
        )
    }

    fn open_event(capacity_total: i32) -> event::Model {
        let now = Utc::now();
        event::Model {
            id: "ev1".to_string(),
            organizer_id: "org1".to_string(),
            title: "Test Event".to_string(),
            description: None,
            starts_at: (now + chrono::Duration::hours(2)).into(),
            registration_deadline: (now + chrono::Duration::hours(1)).into(),
            capacity_total,
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

    fn test_user(id: &str) -> user::Model {
        user::Model {
            id: id.to_string(),
            username: format!("user-{id}"),
            display_name: id.to_string(),
            gender: None,
            birth_date: None,
            language: None,
            api_token: None,
            is_organizer: false,
            created_at: Utc::now().into(),
        }
    }

    fn reg_with_status(
        id: &str,
        user_id: &str,
        status: RegistrationStatus,
    ) -> registration::Model {
        registration::Model {
            id: id.to_string(),
            event_id: "ev1".to_string(),
            user_id: user_id.to_string(),
            status,
            pool: None,
            created_at: Utc::now().into(),
            updated_at: None,
            cancelled_at: None,
        }
    }

    fn confirmed_reg(id: &str, user_id: &str) -> registration::Model {
        reg_with_status(id, user_id, RegistrationStatus::Confirmed)
    }

    fn notification_row(notification_type: notification::NotificationType) -> notification::Model {
        notification::Model {
            id: "n1".to_string(),
            user_id: "u1".to_string(),
            notification_type,
            event_id: Some("ev1".to_string()),
            is_read: false,
            created_at: Utc::now().into(),
        }
    }

    #[tokio::test]
    async fn test_register_confirms_when_room() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[open_event(2)]])
                .append_query_results([[test_user("u1")]])
                // duplicate check outside the lock
                .append_query_results([Vec::<registration::Model>::new()])
                // fresh event fetch inside the lock, then the duplicate
                // re-check
                .append_query_results([[open_event(2)]])
                .append_query_results([Vec::<registration::Model>::new()])
                // one confirmed seat taken, one free
                .append_query_results([vec![confirmed_reg("r0", "u0")]])
                // no cancelled row to reactivate
                .append_query_results([Vec::<registration::Model>::new()])
                .append_exec_results([MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 1,
                }])
                .append_query_results([[confirmed_reg("r1", "u1")]])
                .append_exec_results([MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 1,
                }])
                .append_query_results([[notification_row(
                    notification::NotificationType::RegistrationConfirmed,
                )]])
                .into_connection(),
        );

        let svc = service(db);
        let reg = svc.register("ev1", "u1").await.unwrap();
        assert_eq!(reg.status, RegistrationStatus::Confirmed);
    }

    #[tokio::test]
    async fn test_register_rejects_event_cancelled_while_waiting() {
        let mut cancelled_event = open_event(10);
        cancelled_event.is_cancelled = true;

        // The pre-lock fetch sees an open event; the in-lock re-fetch sees
        // the cancellation that landed while this request waited
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[open_event(10)]])
                .append_query_results([[test_user("u1")]])
                .append_query_results([Vec::<registration::Model>::new()])
                .append_query_results([[cancelled_event]])
                .into_connection(),
        );

        let svc = service(db);
        let result = svc.register("ev1", "u1").await;
        assert!(matches!(result, Err(AppError::RegistrationClosed(_))));
    }

    #[tokio::test]
    async fn test_register_rejects_duplicate() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[open_event(10)]])
                .append_query_results([[test_user("u1")]])
                .append_query_results([[confirmed_reg("r1", "u1")]])
                .into_connection(),
        );

        let svc = service(db);
        let result = svc.register("ev1", "u1").await;
        assert!(matches!(result, Err(AppError::AlreadyRegistered(_))));
    }

    #[tokio::test]
    async fn test_register_rejects_after_deadline() {
        let mut event = open_event(10);
        event.registration_deadline = (Utc::now() - chrono::Duration::minutes(1)).into();

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[event]])
                .into_connection(),
        );

        let svc = service(db);
        let result = svc.register("ev1", "u1").await;
        assert!(matches!(result, Err(AppError::RegistrationClosed(_))));
    }

    #[tokio::test]
    async fn test_cancel_promotes_oldest_waitlisted_candidate() {
        let cancelled_row = reg_with_status("r1", "u1", RegistrationStatus::Cancelled);
        let waitlisted_row = reg_with_status("r2", "u2", RegistrationStatus::Waitlisted);

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                // event fetched inside the lock
                .append_query_results([[open_event(1)]])
                .append_query_results([[confirmed_reg("r1", "u1")]])
                // cancellation write frees the only confirmed seat
                .append_exec_results([MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 1,
                }])
                .append_query_results([[cancelled_row.clone()]])
                // fresh set seen by the promoter
                .append_query_results([[cancelled_row, waitlisted_row]])
                .append_exec_results([MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 1,
                }])
                .append_query_results([[confirmed_reg("r2", "u2")]])
                .append_exec_results([MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 1,
                }])
                .append_query_results([[notification_row(
                    notification::NotificationType::WaitlistPromoted,
                )]])
                .into_connection(),
        );

        let svc = service(db);
        let cancelled = svc.cancel("ev1", "u1").await.unwrap();
        assert_eq!(cancelled.status, RegistrationStatus::Cancelled);
    }

    #[tokio::test]
    async fn test_cancel_of_waitlisted_frees_no_seat() {
        // No promotion queries are mocked: reaching the promoter here
        // would fail the test with an exhausted mock
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[open_event(1)]])
                .append_query_results([[reg_with_status(
                    "r1",
                    "u1",
                    RegistrationStatus::Waitlisted,
                )]])
                .append_exec_results([MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 1,
                }])
                .append_query_results([[reg_with_status(
                    "r1",
                    "u1",
                    RegistrationStatus::Cancelled,
                )]])
                .into_connection(),
        );

        let svc = service(db);
        let cancelled = svc.cancel("ev1", "u1").await.unwrap();
        assert_eq!(cancelled.status, RegistrationStatus::Cancelled);
    }
}
