//! API endpoints.

mod admin;
mod events;
mod notifications;
mod pairs;
mod presentation;
mod registrations;
mod users;
mod voting;

use axum::Router;

use crate::middleware::AppState;

/// Create the API router.
pub fn router() -> Router<AppState> {
    Router::new()
        .nest("/users", users::router())
        .nest("/events", events::router())
        .nest("/registrations", registrations::router())
        .nest("/voting", voting::router())
        .nest("/presentation", presentation::router())
        .nest("/pairs", pairs::router())
        .nest("/notifications", notifications::router())
        .nest("/admin", admin::router())
}
