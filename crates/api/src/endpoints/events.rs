//! Event endpoints.

use axum::{Json, Router, extract::State, routing::post};
use chrono::{DateTime, Utc};
use rendezvous_common::{AppError, AppResult};
use rendezvous_db::entities::event;
use rendezvous_core::CreateEventInput;
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::{
    extractors::{AuthUser, MaybeAuthUser},
    middleware::AppState,
    response::ApiResponse,
};

/// Event response.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EventResponse {
    pub id: String,
    pub organizer_id: String,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub starts_at: String,
    pub registration_deadline: String,
    pub capacity_total: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub capacity_female: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub capacity_male: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub capacity_nonbinary: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_age: Option<i16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_age: Option<i16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub required_language: Option<String>,
    pub is_published: bool,
    pub is_cancelled: bool,
}

impl From<event::Model> for EventResponse {
    fn from(event: event::Model) -> Self {
        Self {
            id: event.id,
            organizer_id: event.organizer_id,
            title: event.title,
            description: event.description,
            starts_at: event.starts_at.to_rfc3339(),
            registration_deadline: event.registration_deadline.to_rfc3339(),
            capacity_total: event.capacity_total,
            capacity_female: event.capacity_female,
            capacity_male: event.capacity_male,
            capacity_nonbinary: event.capacity_nonbinary,
            min_age: event.min_age,
            max_age: event.max_age,
            required_language: event.required_language,
            is_published: event.is_published,
            is_cancelled: event.is_cancelled,
        }
    }
}

/// Create event request.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateEventRequest {
    #[validate(length(min = 1, max = 200))]
    pub title: String,
    pub description: Option<String>,
    pub starts_at: DateTime<Utc>,
    pub registration_deadline: DateTime<Utc>,
    #[validate(range(min = 2))]
    pub capacity_total: i32,
    pub capacity_female: Option<i32>,
    pub capacity_male: Option<i32>,
    pub capacity_nonbinary: Option<i32>,
    pub min_age: Option<i16>,
    pub max_age: Option<i16>,
    pub required_language: Option<String>,
}

async fn create_event(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Json(req): Json<CreateEventRequest>,
) -> AppResult<ApiResponse<EventResponse>> {
    req.validate()?;
    if !user.is_organizer {
        return Err(AppError::Forbidden(
            "only organizer accounts may create events".to_string(),
        ));
    }

    let gender_capacities = match (req.capacity_female, req.capacity_male, req.capacity_nonbinary)
    {
        (Some(f), Some(m), Some(n)) => Some((f, m, n)),
        (None, None, None) => None,
        _ => {
            return Err(AppError::Validation(
                "either all three gender capacities are set or none".to_string(),
            ));
        }
    };

    let event = state
        .event_service
        .create(
            &user.id,
            CreateEventInput {
                title: req.title,
                description: req.description,
                starts_at: req.starts_at,
                registration_deadline: req.registration_deadline,
                capacity_total: req.capacity_total,
                gender_capacities,
                min_age: req.min_age,
                max_age: req.max_age,
                required_language: req.required_language,
            },
        )
        .await?;
    Ok(ApiResponse::ok(event.into()))
}

/// Show event request.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShowEventRequest {
    pub event_id: String,
}

async fn show_event(
    MaybeAuthUser(_): MaybeAuthUser,
    State(state): State<AppState>,
    Json(req): Json<ShowEventRequest>,
) -> AppResult<ApiResponse<EventResponse>> {
    let event = state.event_service.get(&req.event_id).await?;
    Ok(ApiResponse::ok(event.into()))
}

/// List events request.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListEventsRequest {
    #[serde(default = "default_limit")]
    pub limit: u64,
    #[serde(default)]
    pub offset: u64,
}

const fn default_limit() -> u64 {
    30
}

async fn list_events(
    State(state): State<AppState>,
    Json(req): Json<ListEventsRequest>,
) -> AppResult<ApiResponse<Vec<EventResponse>>> {
    let events = state
        .event_service
        .list_published(req.limit.min(100), req.offset)
        .await?;
    Ok(ApiResponse::ok(
        events.into_iter().map(EventResponse::from).collect(),
    ))
}

async fn publish_event(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Json(req): Json<ShowEventRequest>,
) -> AppResult<ApiResponse<EventResponse>> {
    let event = state.event_service.publish(&user.id, &req.event_id).await?;
    Ok(ApiResponse::ok(event.into()))
}

async fn cancel_event(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Json(req): Json<ShowEventRequest>,
) -> AppResult<ApiResponse<EventResponse>> {
    let event = state.event_service.cancel(&user.id, &req.event_id).await?;
    Ok(ApiResponse::ok(event.into()))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/create", post(create_event))
        .route("/show", post(show_event))
        .route("/list", post(list_events))
        .route("/publish", post(publish_event))
        .route("/cancel", post(cancel_event))
}
