//! Speed-dating pair endpoints.

use axum::{Json, Router, extract::State, routing::post};
use rendezvous_common::AppResult;
use rendezvous_db::entities::pair;
use serde::{Deserialize, Serialize};

use crate::{extractors::AuthUser, middleware::AppState, response::ApiResponse};

/// Pair response.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PairResponse {
    pub id: String,
    pub round: i32,
    pub user1_id: String,
    pub user2_id: String,
    pub mutual_score: f64,
    pub is_top_match: bool,
    pub duration_minutes: i32,
}

impl From<pair::Model> for PairResponse {
    fn from(pair: pair::Model) -> Self {
        Self {
            id: pair.id,
            round: pair.round,
            user1_id: pair.user1_id,
            user2_id: pair.user2_id,
            mutual_score: pair.mutual_score,
            is_top_match: pair.is_top_match,
            duration_minutes: pair.duration_minutes,
        }
    }
}

/// Request naming one event.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventRequest {
    pub event_id: String,
}

async fn generate(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Json(req): Json<EventRequest>,
) -> AppResult<ApiResponse<Vec<PairResponse>>> {
    let pairs = state
        .pairing_service
        .generate_pairs(&user.id, &req.event_id)
        .await?;
    Ok(ApiResponse::ok(
        pairs.into_iter().map(PairResponse::from).collect(),
    ))
}

async fn list(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Json(req): Json<EventRequest>,
) -> AppResult<ApiResponse<Vec<PairResponse>>> {
    let pairs = state
        .pairing_service
        .list_for_event(&user.id, &req.event_id)
        .await?;
    Ok(ApiResponse::ok(
        pairs.into_iter().map(PairResponse::from).collect(),
    ))
}

async fn mine(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Json(req): Json<EventRequest>,
) -> AppResult<ApiResponse<Vec<PairResponse>>> {
    let pairs = state
        .pairing_service
        .list_for_user(&req.event_id, &user.id)
        .await?;
    Ok(ApiResponse::ok(
        pairs.into_iter().map(PairResponse::from).collect(),
    ))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/generate", post(generate))
        .route("/list", post(list))
        .route("/mine", post(mine))
}
