//! Voting endpoints.

use axum::{Json, Router, extract::State, routing::post};
use rendezvous_common::AppResult;
use rendezvous_db::entities::{
    activity_option, activity_option::ActivityCategory, voting_session,
};
use serde::{Deserialize, Serialize};

use crate::{extractors::AuthUser, middleware::AppState, response::ApiResponse};

/// Voting session response.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionResponse {
    pub event_id: String,
    pub state: voting_session::SessionState,
    pub scheduled_start_at: String,
    pub scheduled_end_at: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub opened_at: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub closed_at: Option<String>,
    pub votes_count: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub winner_presentation_style_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub winner_speed_dating_twist_id: Option<String>,
}

impl From<voting_session::Model> for SessionResponse {
    fn from(session: voting_session::Model) -> Self {
        Self {
            event_id: session.event_id,
            state: session.state,
            scheduled_start_at: session.scheduled_start_at.to_rfc3339(),
            scheduled_end_at: session.scheduled_end_at.to_rfc3339(),
            opened_at: session.opened_at.map(|t| t.to_rfc3339()),
            closed_at: session.closed_at.map(|t| t.to_rfc3339()),
            votes_count: session.votes_count,
            winner_presentation_style_id: session.winner_presentation_style_id,
            winner_speed_dating_twist_id: session.winner_speed_dating_twist_id,
        }
    }
}

/// Activity option response.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OptionResponse {
    pub id: String,
    pub category: ActivityCategory,
    pub label: String,
    pub code: String,
    pub position: i32,
}

impl From<activity_option::Model> for OptionResponse {
    fn from(option: activity_option::Model) -> Self {
        Self {
            id: option.id,
            category: option.category,
            label: option.label,
            code: option.code,
            position: option.position,
        }
    }
}

/// Request naming one event.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventRequest {
    pub event_id: String,
}

async fn show_session(
    State(state): State<AppState>,
    Json(req): Json<EventRequest>,
) -> AppResult<ApiResponse<SessionResponse>> {
    let session = state.voting_service.ensure_session(&req.event_id).await?;
    Ok(ApiResponse::ok(session.into()))
}

/// Options listing request.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OptionsRequest {
    pub category: ActivityCategory,
}

async fn list_options(
    State(state): State<AppState>,
    Json(req): Json<OptionsRequest>,
) -> AppResult<ApiResponse<Vec<OptionResponse>>> {
    let options = state.voting_service.options(req.category).await?;
    Ok(ApiResponse::ok(
        options.into_iter().map(OptionResponse::from).collect(),
    ))
}

/// Vote request.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VoteRequest {
    pub event_id: String,
    pub option_id: String,
}

/// Vote acknowledgement.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VoteResponse {
    pub id: String,
    pub category: ActivityCategory,
    pub option_id: String,
}

async fn cast_vote(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Json(req): Json<VoteRequest>,
) -> AppResult<ApiResponse<VoteResponse>> {
    let vote = state
        .voting_service
        .cast_vote(&req.event_id, &user.id, &req.option_id)
        .await?;
    Ok(ApiResponse::ok(VoteResponse {
        id: vote.id,
        category: vote.category,
        option_id: vote.option_id,
    }))
}

/// Tally request.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TalliesRequest {
    pub event_id: String,
    pub category: ActivityCategory,
}

/// One option's tally.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TallyResponse {
    pub option: OptionResponse,
    pub votes: i64,
}

async fn tallies(
    State(state): State<AppState>,
    Json(req): Json<TalliesRequest>,
) -> AppResult<ApiResponse<Vec<TallyResponse>>> {
    let tallies = state
        .voting_service
        .tallies(&req.event_id, req.category)
        .await?;
    Ok(ApiResponse::ok(
        tallies
            .into_iter()
            .map(|t| TallyResponse {
                option: t.option.into(),
                votes: t.votes,
            })
            .collect(),
    ))
}

async fn start_voting(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Json(req): Json<EventRequest>,
) -> AppResult<ApiResponse<SessionResponse>> {
    let session = state
        .voting_service
        .start_voting(&user.id, &req.event_id)
        .await?;
    Ok(ApiResponse::ok(session.into()))
}

async fn end_voting(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Json(req): Json<EventRequest>,
) -> AppResult<ApiResponse<SessionResponse>> {
    let session = state
        .voting_service
        .end_voting(&user.id, &req.event_id)
        .await?;
    // Closing the vote opens phase 2
    state
        .presentation_service
        .initialize_queue(&req.event_id)
        .await?;
    Ok(ApiResponse::ok(session.into()))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/session", post(show_session))
        .route("/options", post(list_options))
        .route("/vote", post(cast_vote))
        .route("/tallies", post(tallies))
        .route("/start", post(start_voting))
        .route("/end", post(end_voting))
}
