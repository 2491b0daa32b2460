//! services/api/src/bin/api.rs

use api_lib::{
    adapters::SqliteStore,
    config::Config,
    error::ApiError,
    web::{
        accept_goal_handler, create_user_handler, dismiss_goal_handler, get_user_handler,
        goal_suggestion_handler, heatmap_handler, list_sessions_handler, log_session_handler,
        nudge_handler, streak_history_handler, update_settings_handler, ApiDoc,
        state::AppState,
    },
};
use axum::{
    http::{
        header::{ACCEPT, CONTENT_TYPE},
        HeaderValue, Method,
    },
    routing::{get, patch, post},
    Router,
};
use sqlx::sqlite::SqlitePoolOptions;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[tokio::main]
async fn main() -> Result<(), ApiError> {
    // --- 1. Load Configuration & Set Up Logging ---
    let config = Arc::new(Config::from_env()?);
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(config.log_level.to_string()))
        .with(tracing_subscriber::fmt::layer())
        .init();
    info!("Configuration loaded. Starting server...");

    // --- 2. Connect to Database & Run Migrations ---
    info!("Connecting to database...");
    let db_pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect(&config.database_url)
        .await?;
    let store = Arc::new(SqliteStore::new(db_pool));
    info!("Running database migrations...");
    store.run_migrations().await?;
    info!("Database migrations complete.");

    // --- 3. Build the Shared AppState ---
    let app_state = Arc::new(AppState {
        db: store,
        config: config.clone(),
    });

    let cors = CorsLayer::new()
        .allow_origin(
            config
                .cors_origin
                .parse::<HeaderValue>()
                .map_err(|e| ApiError::Internal(format!("Invalid CORS_ORIGIN: {}", e)))?,
        )
        .allow_methods([Method::GET, Method::POST, Method::PATCH, Method::OPTIONS])
        .allow_headers([CONTENT_TYPE, ACCEPT]);

    // --- 4. Create the Web Router ---
    let api_router = Router::new()
        .route("/api/users", post(create_user_handler))
        .route("/api/users/{id}", get(get_user_handler))
        .route(
            "/api/users/{id}/sessions",
            get(list_sessions_handler).post(log_session_handler),
        )
        .route("/api/users/{id}/heatmap", get(heatmap_handler))
        .route("/api/users/{id}/goal-suggestion", get(goal_suggestion_handler))
        .route(
            "/api/users/{id}/goal-suggestion/accept",
            post(accept_goal_handler),
        )
        .route(
            "/api/users/{id}/goal-suggestion/dismiss",
            post(dismiss_goal_handler),
        )
        .route("/api/users/{id}/settings", patch(update_settings_handler))
        .route("/api/users/{id}/nudge", get(nudge_handler))
        .route("/api/users/{id}/streak-history", get(streak_history_handler))
        .layer(cors)
        .with_state(app_state);

    // Merge the API router with the Swagger UI router for a complete application.
    let app = Router::new()
        .merge(api_router)
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()));

    // --- 5. Start the Server ---
    info!("Starting server on {}", config.bind_address);
    info!(
        "Swagger UI available at http://{}/swagger-ui",
        config.bind_address
    );
    let listener = tokio::net::TcpListener::bind(&config.bind_address).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
