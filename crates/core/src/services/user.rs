//! User service.

use chrono::{NaiveDate, Utc};
use rendezvous_common::{AppError, AppResult, IdGenerator};
use rendezvous_db::{
    entities::{user, user::Gender},
    repositories::UserRepository,
};
use sea_orm::Set;

/// User service for business logic.
#[derive(Clone)]
pub struct UserService {
    user_repo: UserRepository,
    id_gen: IdGenerator,
}

/// Input for creating an account.
pub struct CreateUserInput {
    pub username: String,
    pub display_name: String,
    pub gender: Option<Gender>,
    pub birth_date: Option<NaiveDate>,
    pub language: Option<String>,
}

impl UserService {
    /// Create a new user service.
    #[must_use]
    pub const fn new(user_repo: UserRepository) -> Self {
        Self {
            user_repo,
            id_gen: IdGenerator::new(),
        }
    }

    /// Resolve an API token to its user.
    pub async fn authenticate_by_token(&self, token: &str) -> AppResult<user::Model> {
        self.user_repo
            .find_by_token(token)
            .await?
            .ok_or(AppError::Unauthorized)
    }

    /// Create an account with a fresh API token.
    pub async fn create(&self, input: CreateUserInput) -> AppResult<user::Model> {
        let username = input.username.trim().to_lowercase();
        if username.is_empty() {
            return Err(AppError::Validation("username cannot be empty".to_string()));
        }
        if self.user_repo.find_by_username(&username).await?.is_some() {
            return Err(AppError::Conflict(format!(
                "username already taken: {username}"
            )));
        }

        let model = user::ActiveModel {
            id: Set(self.id_gen.generate()),
            username: Set(username),
            display_name: Set(input.display_name),
            gender: Set(input.gender),
            birth_date: Set(input.birth_date),
            language: Set(input.language),
            api_token: Set(Some(self.id_gen.generate_token())),
            is_organizer: Set(false),
            created_at: Set(Utc::now().into()),
        };
        self.user_repo.create(model).await
    }

    /// Get a user by ID.
    pub async fn get(&self, user_id: &str) -> AppResult<user::Model> {
        self.user_repo.get_by_id(user_id).await
    }
}
