mod aggregate;
mod config;
mod errors;
mod extract;
mod handlers;
mod lifecycle;
mod middleware;
mod models;
mod policy;
mod services;

use axum::{
    extract::DefaultBodyLimit,
    http::{header, Method},
    middleware::from_fn_with_state,
    routing::{get, post, put},
    Router,
};
use std::sync::Arc;
use tower_http::{
    cors::{Any, CorsLayer},
    limit::RequestBodyLimitLayer,
    services::ServeDir,
};

use crate::{config::Config, services::RedisService};

#[tokio::main]
async fn main() {
    // Initialize basic tracing subscriber
    tracing_subscriber::fmt::init();

    // Load configuration
    let config = Config::load().expect("Failed to load configuration");

    // Initialize Redis client
    let redis_client = if config.redis.sentinel_enabled {
        Arc::new(redis::Client::open(
            config.redis.sentinel_url.clone().expect("Sentinel URL not configured")
        ).expect("Failed to connect to Redis Sentinel"))
    } else {
        Arc::new(redis::Client::open(config.redis.url.clone())
            .expect("Failed to connect to Redis"))
    };

    // Initialize RedisService
    let redis_service = RedisService::new(redis_client.clone());

    // Everything handlers need travels in this state pair; there is no
    // other process-wide mutable state.
    let state = (redis_service, config.clone());

    // The SPA talks to us from another origin
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION]);

    // Routes reachable without a token
    let public = Router::new()
        .route("/api/auth/register", post(handlers::register))
        .route("/api/auth/login", post(handlers::login));

    // Everything else requires a bearer token; admin-only endpoints check
    // the policy inside the handler.
    let protected = Router::new()
        // Auth routes
        .route("/api/auth/profile", get(handlers::get_profile).put(handlers::update_profile))
        .route("/api/auth/upload-image", post(handlers::upload_image))

        // Task routes
        .route("/api/tasks", get(handlers::list_tasks).post(handlers::create_task))
        .route("/api/tasks/dashboard", get(handlers::admin_dashboard))
        .route("/api/tasks/user-dashboard", get(handlers::user_dashboard))
        .route(
            "/api/tasks/:id",
            get(handlers::get_task)
                .put(handlers::update_task)
                .delete(handlers::delete_task),
        )
        .route("/api/tasks/:id/status", put(handlers::update_status))
        .route("/api/tasks/:id/todo", put(handlers::update_checklist))

        // User administration
        .route("/api/users", get(handlers::list_users))
        .route("/api/users/:id", get(handlers::get_user).delete(handlers::delete_user))

        // Reports
        .route("/api/reports/export/tasks", get(handlers::export_tasks))
        .route("/api/reports/export/users", get(handlers::export_users))

        // Add middleware
        .layer(from_fn_with_state(state.clone(), middleware::require_auth));

    let app = public
        .merge(protected)

        // Uploaded images
        .nest_service("/uploads", ServeDir::new(&config.upload.dir))

        // File upload limits from config
        .layer(DefaultBodyLimit::disable())
        .layer(RequestBodyLimitLayer::new(config.upload.max_file_size))
        .layer(cors)

        // Add state
        .with_state(state);

    tracing::info!("Server running on {}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(
        format!("{}:{}", config.server.host, config.server.port)
    )
    .await
    .expect("Failed to bind server");

    axum::serve(listener, app.into_make_service())
        .await
        .expect("Failed to start server");
}
