//! API middleware.

#![allow(missing_docs)]

use axum::{body::Body, extract::State, http::Request, middleware::Next, response::Response};
use rendezvous_core::{
    EventService, ExportService, NotificationService, PairingService, PresentationService,
    RegistrationService, UserService, VotingService,
};

/// Application state.
#[derive(Clone)]
pub struct AppState {
    pub user_service: UserService,
    pub event_service: EventService,
    pub registration_service: RegistrationService,
    pub voting_service: VotingService,
    pub presentation_service: PresentationService,
    pub pairing_service: PairingService,
    pub notification_service: NotificationService,
    pub export_service: ExportService,
}

/// Authentication middleware: resolves a bearer token to its user and
/// stores the user in the request extensions.
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut req: Request<Body>,
    next: Next,
) -> Response {
    let token = req
        .headers()
        .get("Authorization")
        .and_then(|h| h.to_str().ok())
        .and_then(|s| s.strip_prefix("Bearer "))
        .map(ToString::to_string);

    if let Some(token) = token {
        if let Ok(user) = state.user_service.authenticate_by_token(&token).await {
            req.extensions_mut().insert(user);
        }
    }

    next.run(req).await
}
