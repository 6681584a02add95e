//! Registration endpoints.

use axum::{Json, Router, extract::State, routing::post};
use rendezvous_common::AppResult;
use rendezvous_db::entities::registration;
use serde::{Deserialize, Serialize};

use crate::{extractors::AuthUser, middleware::AppState, response::ApiResponse};

/// Registration response.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegistrationResponse {
    pub id: String,
    pub event_id: String,
    pub user_id: String,
    pub status: registration::RegistrationStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pool: Option<rendezvous_db::entities::user::Gender>,
    pub created_at: String,
}

impl From<registration::Model> for RegistrationResponse {
    fn from(reg: registration::Model) -> Self {
        Self {
            id: reg.id,
            event_id: reg.event_id,
            user_id: reg.user_id,
            status: reg.status,
            pool: reg.pool,
            created_at: reg.created_at.to_rfc3339(),
        }
    }
}

/// Request naming one event.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventRequest {
    pub event_id: String,
}

async fn register(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Json(req): Json<EventRequest>,
) -> AppResult<ApiResponse<RegistrationResponse>> {
    let reg = state
        .registration_service
        .register(&req.event_id, &user.id)
        .await?;
    Ok(ApiResponse::ok(reg.into()))
}

async fn cancel(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Json(req): Json<EventRequest>,
) -> AppResult<ApiResponse<RegistrationResponse>> {
    let reg = state
        .registration_service
        .cancel(&req.event_id, &user.id)
        .await?;
    Ok(ApiResponse::ok(reg.into()))
}

async fn show_own(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Json(req): Json<EventRequest>,
) -> AppResult<ApiResponse<Option<RegistrationResponse>>> {
    let reg = state
        .registration_service
        .find_own(&req.event_id, &user.id)
        .await?;
    Ok(ApiResponse::ok(reg.map(RegistrationResponse::from)))
}

async fn list_own(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
) -> AppResult<ApiResponse<Vec<RegistrationResponse>>> {
    let regs = state.registration_service.list_for_user(&user.id).await?;
    Ok(ApiResponse::ok(
        regs.into_iter().map(RegistrationResponse::from).collect(),
    ))
}

async fn list_for_event(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Json(req): Json<EventRequest>,
) -> AppResult<ApiResponse<Vec<RegistrationResponse>>> {
    let regs = state
        .registration_service
        .list_for_event(&user.id, &req.event_id)
        .await?;
    Ok(ApiResponse::ok(
        regs.into_iter().map(RegistrationResponse::from).collect(),
    ))
}

async fn waitlist(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Json(req): Json<EventRequest>,
) -> AppResult<ApiResponse<Vec<RegistrationResponse>>> {
    let regs = state
        .registration_service
        .waitlist_for_event(&user.id, &req.event_id)
        .await?;
    Ok(ApiResponse::ok(
        regs.into_iter().map(RegistrationResponse::from).collect(),
    ))
}

/// Attendance request.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttendanceRequest {
    pub event_id: String,
    pub user_id: String,
    pub attended: bool,
}

async fn mark_attendance(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Json(req): Json<AttendanceRequest>,
) -> AppResult<ApiResponse<RegistrationResponse>> {
    let reg = state
        .registration_service
        .mark_attendance(&user.id, &req.event_id, &req.user_id, req.attended)
        .await?;
    Ok(ApiResponse::ok(reg.into()))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/create", post(register))
        .route("/cancel", post(cancel))
        .route("/show", post(show_own))
        .route("/me", post(list_own))
        .route("/list", post(list_for_event))
        .route("/waitlist", post(waitlist))
        .route("/attendance", post(mark_attendance))
}
