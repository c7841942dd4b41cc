//! Application state and router builder
//!
//! # Example
//!
//! ```no_run
//! use taskdesk_api::{app::{build_router, AppState}, config::Config};
//! use taskdesk_shared::db::pool::create_pool;
//!
//! # async fn example() -> anyhow::Result<()> {
//! let config = Config::load()?;
//! let pool = create_pool(&config.database).await?;
//! let state = AppState::new(pool, config)?;
//! let app = build_router(state);
//! # Ok(())
//! # }
//! ```

use crate::{
    config::Config,
    middleware::{auth::jwt_auth_layer, cors::cors_layer, errors::normalize_error_response},
    routes,
};
use axum::{
    extract::Request,
    routing::{get, post},
    Router,
};
use sqlx::PgPool;
use std::sync::Arc;
use taskdesk_shared::auth::{credentials::CredentialStore, jwt::TokenIssuer};
use tower_http::trace::{DefaultOnResponse, TraceLayer};
use tracing::Level;

/// Shared application state
///
/// Cloned into every handler; all fields are cheap to clone and read-only.
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool
    pub db: PgPool,

    /// Application configuration, loaded once at startup
    pub config: Arc<Config>,

    /// Token issuer built from `config.jwt`
    pub tokens: Arc<TokenIssuer>,

    /// Registration and login checks
    pub credentials: CredentialStore,
}

impl AppState {
    /// Creates application state, building the token issuer from config
    pub fn new(db: PgPool, config: Config) -> anyhow::Result<Self> {
        let tokens = TokenIssuer::new(&config.jwt)?;

        Ok(Self {
            credentials: CredentialStore::new(db.clone()),
            db,
            config: Arc::new(config),
            tokens: Arc::new(tokens),
        })
    }
}

/// Builds the complete Axum router with all routes and middleware
///
/// ```text
/// /
/// ├── GET  /health
/// ├── /auth                     (public)
/// │   ├── POST /register
/// │   └── POST /login
/// └── /api                      (bearer token required)
///     ├── GET|POST          /categories
///     ├── GET|PUT|DELETE    /categories/:id
///     ├── GET|POST          /tasks
///     └── GET|PUT|DELETE    /tasks/:id
/// ```
pub fn build_router(state: AppState) -> Router {
    let auth_routes = Router::new()
        .route("/register", post(routes::auth::register))
        .route("/login", post(routes::auth::login));

    let api_routes = Router::new()
        .route(
            "/categories",
            get(routes::categories::list_categories).post(routes::categories::create_category),
        )
        .route(
            "/categories/:id",
            get(routes::categories::get_category)
                .put(routes::categories::update_category)
                .delete(routes::categories::delete_category),
        )
        .route(
            "/tasks",
            get(routes::tasks::list_tasks).post(routes::tasks::create_task),
        )
        .route(
            "/tasks/:id",
            get(routes::tasks::get_task)
                .put(routes::tasks::update_task)
                .delete(routes::tasks::delete_task),
        )
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            jwt_auth_layer,
        ));

    let cors = cors_layer(&state.config.api);

    Router::new()
        .route("/health", get(routes::health::health_check))
        .nest("/auth", auth_routes)
        .nest("/api", api_routes)
        .layer(axum::middleware::from_fn(normalize_error_response))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|request: &Request| {
                    tracing::info_span!(
                        "request",
                        method = %request.method(),
                        uri = %request.uri(),
                        user_id = tracing::field::Empty,
                    )
                })
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(cors)
        .with_state(state)
}
