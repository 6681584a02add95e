//! User and account endpoints.

use axum::{Json, Router, extract::State, routing::post};
use chrono::NaiveDate;
use rendezvous_common::AppResult;
use rendezvous_core::CreateUserInput;
use rendezvous_db::entities::user;
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::{extractors::AuthUser, middleware::AppState, response::ApiResponse};

/// User response.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    pub id: String,
    pub username: String,
    pub display_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gender: Option<user::Gender>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    pub is_organizer: bool,
}

impl From<user::Model> for UserResponse {
    fn from(user: user::Model) -> Self {
        Self {
            id: user.id,
            username: user.username,
            display_name: user.display_name,
            gender: user.gender,
            language: user.language,
            is_organizer: user.is_organizer,
        }
    }
}

/// Signup response; the only place the API token is ever shown.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SignupResponse {
    #[serde(flatten)]
    pub user: UserResponse,
    pub api_token: String,
}

/// Signup request.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct SignupRequest {
    #[validate(length(min = 1, max = 64))]
    pub username: String,
    #[validate(length(min = 1, max = 128))]
    pub display_name: String,
    pub gender: Option<user::Gender>,
    pub birth_date: Option<NaiveDate>,
    pub language: Option<String>,
}

async fn signup(
    State(state): State<AppState>,
    Json(req): Json<SignupRequest>,
) -> AppResult<ApiResponse<SignupResponse>> {
    req.validate()?;
    let created = state
        .user_service
        .create(CreateUserInput {
            username: req.username,
            display_name: req.display_name,
            gender: req.gender,
            birth_date: req.birth_date,
            language: req.language,
        })
        .await?;

    let api_token = created.api_token.clone().unwrap_or_default();
    Ok(ApiResponse::ok(SignupResponse {
        user: created.into(),
        api_token,
    }))
}

async fn me(AuthUser(user): AuthUser) -> AppResult<ApiResponse<UserResponse>> {
    Ok(ApiResponse::ok(user.into()))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/create", post(signup))
        .route("/me", post(me))
}
