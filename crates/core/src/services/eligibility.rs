//! Registration eligibility checks.
//!
//! The allocator runs these before taking the event lock; failing early
//! keeps ineligible requests out of the serialized section entirely.

use async_trait::async_trait;
use chrono::{Datelike, NaiveDate};
use rendezvous_common::{AppError, AppResult};
use rendezvous_db::entities::{event, user};

/// A single eligibility rule evaluated against the requester's profile.
#[async_trait]
pub trait EligibilityCheck: Send + Sync {
    /// Returns `Ok(())` when the user may register, `NotEligible` otherwise.
    async fn check(&self, user: &user::Model, event: &event::Model) -> AppResult<()>;
}

/// Default rule set: age window and required language, both read from the
/// profile. Events without restrictions accept everyone.
#[derive(Clone, Default)]
pub struct ProfileEligibility;

impl ProfileEligibility {
    /// Create the default eligibility rule set.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

#[async_trait]
impl EligibilityCheck for ProfileEligibility {
    async fn check(&self, user: &user::Model, event: &event::Model) -> AppResult<()> {
        if event.min_age.is_some() || event.max_age.is_some() {
            let birth_date = user.birth_date.ok_or_else(|| {
                AppError::NotEligible("age-restricted event requires a birth date".to_string())
            })?;
            let age = age_at(birth_date, event.starts_at.date_naive());

            if let Some(min) = event.min_age {
                if age < i32::from(min) {
                    return Err(AppError::NotEligible(format!(
                        "minimum age for this event is {min}"
                    )));
                }
            }
            if let Some(max) = event.max_age {
                if age > i32::from(max) {
                    return Err(AppError::NotEligible(format!(
                        "maximum age for this event is {max}"
                    )));
                }
            }
        }

        if let Some(required) = &event.required_language {
            let speaks = user
                .language
                .as_ref()
                .is_some_and(|lang| lang.eq_ignore_ascii_case(required));
            if !speaks {
                return Err(AppError::NotEligible(format!(
                    "event requires language: {required}"
                )));
            }
        }

        Ok(())
    }
}

/// Whole years between `birth_date` and `on`, birthday not yet reached
/// counts down.
fn age_at(birth_date: NaiveDate, on: NaiveDate) -> i32 {
    let mut age = on.year() - birth_date.year();
    if (on.month(), on.day()) < (birth_date.month(), birth_date.day()) {
        age -= 1;
    }
    age
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn test_user(birth_date: Option<NaiveDate>, language: Option<&str>) -> user::Model {
        user::Model {
            id: "u1".to_string(),
            username: "alice".to_string(),
            display_name: "Alice".to_string(),
            gender: None,
            birth_date,
            language: language.map(ToString::to_string),
            api_token: None,
            is_organizer: false,
            created_at: Utc::now().into(),
        }
    }

    fn restricted_event(
        min_age: Option<i16>,
        max_age: Option<i16>,
        required_language: Option<&str>,
    ) -> event::Model {
        let now = Utc::now();
        event::Model {
            id: "ev1".to_string(),
            organizer_id: "org1".to_string(),
            title: "Test Event".to_string(),
            description: None,
            starts_at: now.into(),
            registration_deadline: now.into(),
            capacity_total: 10,
            capacity_female: None,
            capacity_male: None,
            capacity_nonbinary: None,
            min_age,
            max_age,
            required_language: required_language.map(ToString::to_string),
            is_published: true,
            is_cancelled: false,
            created_at: now.into(),
            updated_at: None,
        }
    }

    #[test]
    fn test_age_counts_whole_years() {
        let birth = NaiveDate::from_ymd_opt(1990, 6, 15).unwrap();
        assert_eq!(age_at(birth, NaiveDate::from_ymd_opt(2020, 6, 14).unwrap()), 29);
        assert_eq!(age_at(birth, NaiveDate::from_ymd_opt(2020, 6, 15).unwrap()), 30);
    }

    #[tokio::test]
    async fn test_unrestricted_event_accepts_empty_profile() {
        let checker = ProfileEligibility::new();
        let user = test_user(None, None);
        let event = restricted_event(None, None, None);
        assert!(checker.check(&user, &event).await.is_ok());
    }

    #[tokio::test]
    async fn test_age_window_enforced() {
        let checker = ProfileEligibility::new();
        let event = restricted_event(Some(25), Some(35), None);

        let too_young = test_user(
            Some(Utc::now().date_naive() - chrono::Duration::days(20 * 365)),
            None,
        );
        let result = checker.check(&too_young, &event).await;
        assert!(matches!(result, Err(AppError::NotEligible(_))));

        let in_range = test_user(
            Some(Utc::now().date_naive() - chrono::Duration::days(30 * 366)),
            None,
        );
        assert!(checker.check(&in_range, &event).await.is_ok());
    }

    #[tokio::test]
    async fn test_age_restriction_requires_birth_date() {
        let checker = ProfileEligibility::new();
        let event = restricted_event(Some(18), None, None);
        let user = test_user(None, None);

        let result = checker.check(&user, &event).await;
        assert!(matches!(result, Err(AppError::NotEligible(_))));
    }

    #[tokio::test]
    async fn test_required_language() {
        let checker = ProfileEligibility::new();
        let event = restricted_event(None, None, Some("de"));

        let speaker = test_user(None, Some("DE"));
        assert!(checker.check(&speaker, &event).await.is_ok());

        let non_speaker = test_user(None, Some("en"));
        let result = checker.check(&non_speaker, &event).await;
        assert!(matches!(result, Err(AppError::NotEligible(_))));
    }
}
