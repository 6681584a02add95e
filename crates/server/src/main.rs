//! Rendezvous-rs server entry point.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{Router, middleware};
use rendezvous_api::{middleware::AppState, router as api_router};
use rendezvous_common::Config;
use rendezvous_core::{
    EventLockRegistry, EventService, ExportService, NotificationService, PairingService,
    PhaseScheduler, PresentationService, ProfileEligibility, RegistrationService, UserService,
    VotingService,
};
use rendezvous_db::repositories::{
    ActivityOptionRepository, ActivityVoteRepository, EventRepository, NotificationRepository,
    PairRepository, PresentationSlotRepository, RatingRepository, RegistrationRepository,
    UserRepository, VotingSessionRepository,
};
use tokio::signal;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Waits for a shutdown signal (SIGINT or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            info!("Received SIGINT, initiating graceful shutdown...");
        },
        () = terminate => {
            info!("Received SIGTERM, initiating graceful shutdown...");
        },
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "rendezvous=debug,tower_http=debug".into()),
        )
        .init();

    info!("Starting rendezvous-rs server...");

    let config = Config::load()?;

    let db = rendezvous_db::init(&config).await?;
    info!("Connected to database");

    info!("Running database migrations...");
    rendezvous_db::migrate(&db).await?;
    info!("Migrations completed");

    // Repositories
    let db = Arc::new(db);
    let user_repo = UserRepository::new(Arc::clone(&db));
    let event_repo = EventRepository::new(Arc::clone(&db));
    let registration_repo = RegistrationRepository::new(Arc::clone(&db));
    let session_repo = VotingSessionRepository::new(Arc::clone(&db));
    let option_repo = ActivityOptionRepository::new(Arc::clone(&db));
    let vote_repo = ActivityVoteRepository::new(Arc::clone(&db));
    let slot_repo = PresentationSlotRepository::new(Arc::clone(&db));
    let rating_repo = RatingRepository::new(Arc::clone(&db));
    let pair_repo = PairRepository::new(Arc::clone(&db));
    let notification_repo = NotificationRepository::new(Arc::clone(&db));

    // Services
    let notification_service = NotificationService::new(notification_repo);
    let user_service = UserService::new(user_repo.clone());
    let event_service = EventService::new(event_repo.clone());
    let locks = EventLockRegistry::new(config.locking.acquire_timeout_ms);
    let registration_service = RegistrationService::new(
        registration_repo.clone(),
        event_repo.clone(),
        user_repo,
        locks,
        Arc::new(ProfileEligibility::new()),
        notification_service.clone(),
    );
    let voting_service = VotingService::new(
        session_repo.clone(),
        option_repo.clone(),
        vote_repo,
        registration_repo.clone(),
        event_repo.clone(),
        notification_service.clone(),
        config.programme.voting_start_offset_minutes,
        config.programme.voting_end_offset_minutes,
    );
    let presentation_service = PresentationService::new(
        slot_repo,
        rating_repo.clone(),
        registration_repo.clone(),
        event_repo.clone(),
        session_repo.clone(),
    );
    let pairing_service = PairingService::new(
        pair_repo.clone(),
        rating_repo.clone(),
        registration_repo.clone(),
        event_repo.clone(),
        session_repo,
        option_repo,
        notification_service.clone(),
        config.programme.round_minutes,
        config.programme.extended_round_minutes,
    );
    let export_service = ExportService::new(
        registration_repo,
        rating_repo,
        pair_repo,
        event_repo.clone(),
    );

    let state = AppState {
        user_service,
        event_service,
        registration_service,
        voting_service: voting_service.clone(),
        presentation_service: presentation_service.clone(),
        pairing_service,
        notification_service,
        export_service,
    };

    // Background phase scheduler
    let scheduler = PhaseScheduler::new(
        event_repo,
        voting_service,
        presentation_service,
        config.programme.scheduler_interval_secs,
    );
    tokio::spawn(scheduler.run());
    info!("Phase scheduler started");

    // Build router
    let app = Router::new()
        .nest("/api", api_router())
        .layer(middleware::from_fn_with_state(
            state.clone(),
            rendezvous_api::middleware::auth_middleware,
        ))
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state);

    // Start server with graceful shutdown
    let addr = SocketAddr::from(([0, 0, 0, 0], config.server.port));
    info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shutdown complete");
    Ok(())
}
