//! Organizer administration endpoints: catalogue management and exports.

use axum::{
    Json, Router,
    extract::State,
    http::header,
    response::{IntoResponse, Response},
    routing::post,
};
use rendezvous_common::AppResult;
use rendezvous_core::CreateOptionInput;
use rendezvous_db::entities::activity_option::ActivityCategory;
use serde::Deserialize;
use validator::Validate;

use crate::{
    endpoints::voting::OptionResponse,
    extractors::AuthUser,
    middleware::AppState,
    response::ApiResponse,
};

/// Catalogue entry request.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateOptionRequest {
    pub category: ActivityCategory,
    #[validate(length(min = 1, max = 128))]
    pub label: String,
    #[validate(length(min = 1, max = 64))]
    pub code: String,
    #[serde(default)]
    pub position: i32,
}

async fn create_option(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Json(req): Json<CreateOptionRequest>,
) -> AppResult<ApiResponse<OptionResponse>> {
    req.validate()?;
    let option = state
        .voting_service
        .create_option(
            &user,
            CreateOptionInput {
                category: req.category,
                label: req.label,
                code: req.code,
                position: req.position,
            },
        )
        .await?;
    Ok(ApiResponse::ok(option.into()))
}

/// Export request.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportRequest {
    pub event_id: String,
}

fn csv_response(filename: &str, csv: String) -> Response {
    (
        [
            (header::CONTENT_TYPE, "text/csv".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{filename}\""),
            ),
        ],
        csv,
    )
        .into_response()
}

async fn export_registrations(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Json(req): Json<ExportRequest>,
) -> AppResult<Response> {
    let csv = state
        .export_service
        .registrations_csv(&user.id, &req.event_id)
        .await?;
    Ok(csv_response("registrations.csv", csv))
}

async fn export_ratings(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Json(req): Json<ExportRequest>,
) -> AppResult<Response> {
    let csv = state
        .export_service
        .ratings_csv(&user.id, &req.event_id)
        .await?;
    Ok(csv_response("ratings.csv", csv))
}

async fn export_pairs(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Json(req): Json<ExportRequest>,
) -> AppResult<Response> {
    let csv = state
        .export_service
        .pairs_csv(&user.id, &req.event_id)
        .await?;
    Ok(csv_response("pairs.csv", csv))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/options/create", post(create_option))
        .route("/export/registrations", post(export_registrations))
        .route("/export/ratings", post(export_ratings))
        .route("/export/pairs", post(export_pairs))
}
