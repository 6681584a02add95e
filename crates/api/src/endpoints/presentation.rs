//! Presentation queue endpoints.

use axum::{Json, Router, extract::State, routing::post};
use rendezvous_common::AppResult;
use rendezvous_db::entities::presentation_slot;
use serde::{Deserialize, Serialize};

use crate::{extractors::AuthUser, middleware::AppState, response::ApiResponse};

/// Presentation slot response.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SlotResponse {
    pub id: String,
    pub event_id: String,
    pub user_id: String,
    pub position: i32,
    pub status: presentation_slot::SlotStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub started_at: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<String>,
}

impl From<presentation_slot::Model> for SlotResponse {
    fn from(slot: presentation_slot::Model) -> Self {
        Self {
            id: slot.id,
            event_id: slot.event_id,
            user_id: slot.user_id,
            position: slot.position,
            status: slot.status,
            started_at: slot.started_at.map(|t| t.to_rfc3339()),
            completed_at: slot.completed_at.map(|t| t.to_rfc3339()),
        }
    }
}

/// Request naming one event.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventRequest {
    pub event_id: String,
}

async fn queue(
    State(state): State<AppState>,
    Json(req): Json<EventRequest>,
) -> AppResult<ApiResponse<Vec<SlotResponse>>> {
    let slots = state.presentation_service.queue(&req.event_id).await?;
    Ok(ApiResponse::ok(
        slots.into_iter().map(SlotResponse::from).collect(),
    ))
}

async fn current(
    State(state): State<AppState>,
    Json(req): Json<EventRequest>,
) -> AppResult<ApiResponse<Option<SlotResponse>>> {
    let slot = state.presentation_service.current(&req.event_id).await?;
    Ok(ApiResponse::ok(slot.map(SlotResponse::from)))
}

/// Request naming one slot.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SlotRequest {
    pub event_id: String,
    pub slot_id: String,
}

async fn start_slot(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Json(req): Json<SlotRequest>,
) -> AppResult<ApiResponse<SlotResponse>> {
    let slot = state
        .presentation_service
        .start_slot(&user.id, &req.event_id, &req.slot_id)
        .await?;
    Ok(ApiResponse::ok(slot.into()))
}

async fn complete_slot(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Json(req): Json<SlotRequest>,
) -> AppResult<ApiResponse<SlotResponse>> {
    let slot = state
        .presentation_service
        .complete_slot(&user.id, &req.event_id, &req.slot_id)
        .await?;
    Ok(ApiResponse::ok(slot.into()))
}

async fn skip_slot(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Json(req): Json<SlotRequest>,
) -> AppResult<ApiResponse<SlotResponse>> {
    let slot = state
        .presentation_service
        .skip_slot(&user.id, &req.event_id, &req.slot_id)
        .await?;
    Ok(ApiResponse::ok(slot.into()))
}

/// Rating request.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RateRequest {
    pub event_id: String,
    pub presenter_id: String,
    pub score: i16,
}

/// Rating acknowledgement; the rater is never echoed back.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RateResponse {
    pub presenter_id: String,
    pub score: i16,
}

async fn rate(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Json(req): Json<RateRequest>,
) -> AppResult<ApiResponse<RateResponse>> {
    let rating = state
        .presentation_service
        .rate_presenter(&req.event_id, &user.id, &req.presenter_id, req.score)
        .await?;
    Ok(ApiResponse::ok(RateResponse {
        presenter_id: rating.presenter_id,
        score: rating.score,
    }))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/queue", post(queue))
        .route("/current", post(current))
        .route("/start", post(start_slot))
        .route("/complete", post(complete_slot))
        .route("/skip", post(skip_slot))
        .route("/rate", post(rate))
}
