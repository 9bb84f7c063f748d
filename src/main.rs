//! Rollcall Server - Attendance and Check-in Platform
//!
//! A modern Rust REST API server for activity check-in tracking.

use axum::{
    routing::{delete, get, post, put},
    Router,
};
use sqlx::postgres::PgPoolOptions;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use rollcall_server::{api, config::AppConfig, repository::Repository, services::Services, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    // Load configuration
    let config = AppConfig::load().expect("Failed to load configuration");

    // Initialize tracing
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| format!("rollcall_server={},tower_http=debug", config.logging.level).into());

    let registry = tracing_subscriber::registry().with(filter);
    if config.logging.format == "json" {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }

    tracing::info!("Starting Rollcall Server v{}", env!("CARGO_PKG_VERSION"));

    // Create database connection pool
    let pool = PgPoolOptions::new()
        .max_connections(config.database.max_connections)
        .min_connections(config.database.min_connections)
        .connect(&config.database.url)
        .await
        .expect("Failed to connect to database");

    tracing::info!("Connected to database");

    // Run migrations
    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .expect("Failed to run database migrations");

    tracing::info!("Database migrations completed");

    // Save server address before moving config
    let server_host = config.server.host.clone();
    let server_port = config.server.port;

    // Create repository and services
    let repository = Repository::new(pool);
    let services = Services::new(repository, config.auth.clone());

    // First administrator, when configured and none exists yet
    services
        .users
        .bootstrap_admin(&config.bootstrap)
        .await
        .expect("Failed to bootstrap administrator account");

    // Create application state
    let state = AppState {
        config: Arc::new(config),
        services: Arc::new(services),
    };

    // Background sweep that closes activities past their end instant
    if state.config.sweep.enabled {
        let sweep_state = state.clone();
        tokio::spawn(async move {
            let mut ticker =
                tokio::time::interval(Duration::from_secs(sweep_state.config.sweep.interval_seconds));
            // The first tick completes immediately; skip it
            ticker.tick().await;
            loop {
                ticker.tick().await;
                match sweep_state.services.activities.close_expired().await {
                    Ok(closed) if closed > 0 => {
                        tracing::info!("Closed {} expired activities", closed);
                    }
                    Ok(_) => {}
                    Err(e) => {
                        tracing::error!("Failed to close expired activities: {}", e);
                    }
                }
            }
        });
    }

    // Build router
    let app = create_router(state);

    // Start server
    let addr = SocketAddr::new(
        server_host.parse().expect("Invalid host address"),
        server_port,
    );

    tracing::info!("Server listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}

/// Create the application router with all routes
fn create_router(state: AppState) -> Router {
    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // API v1 routes
    let api_v1 = Router::new()
        // Health check
        .route("/health", get(api::health::health_check))
        .route("/ready", get(api::health::readiness_check))
        // Authentication
        .route("/auth/login", post(api::auth::login))
        .route("/auth/me", get(api::auth::me))
        .route("/auth/change-password", post(api::auth::change_password))
        // Participant check-in
        .route("/checkin/activities", get(api::checkin::dashboard))
        .route("/checkin/activities/:id", post(api::checkin::check_in))
        // Activities
        .route("/activities", get(api::activities::list_activities))
        .route("/activities", post(api::activities::create_activity))
        .route("/activities/:id", get(api::activities::get_activity))
        .route("/activities/:id", put(api::activities::update_activity))
        .route("/activities/:id", delete(api::activities::delete_activity))
        .route("/activities/:id/close", post(api::activities::close_activity))
        .route("/activities/:id/qr-token", get(api::activities::qr_token))
        .route(
            "/activities/:id/participants/:user_id",
            put(api::activities::update_participant),
        )
        .route("/activities/:id/stats", get(api::activities::activity_stats))
        .route(
            "/activities/:id/stats/export",
            get(api::activities::export_stats),
        )
        // Records
        .route("/records/:id/status", put(api::activities::update_record_status))
        // Users
        .route("/users", get(api::users::list_users))
        .route("/users", post(api::users::create_user))
        .route("/users/:id", get(api::users::get_user))
        .route("/users/:id", put(api::users::update_user))
        .route("/users/:id", delete(api::users::delete_user))
        .route("/users/bulk", post(api::users::bulk_create_users))
        .route("/users/bulk-reset", post(api::users::bulk_reset_passwords))
        .route("/users/bulk-delete", post(api::users::bulk_delete_users))
        .route("/users/bulk-role", put(api::users::bulk_update_role))
        // Settings
        .route("/settings", get(api::settings::get_settings))
        .route("/settings", put(api::settings::update_settings))
        .with_state(state.clone());

    // OpenAPI documentation
    let openapi = api::openapi::create_openapi_router();

    Router::new()
        .nest("/api/v1", api_v1)
        .merge(openapi)
        .layer(TraceLayer::new_for_http())
        .layer(CompressionLayer::new())
        .layer(cors)
}
