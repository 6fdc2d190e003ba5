//! Router assembly

use std::sync::Arc;

use axum::{
    extract::DefaultBodyLimit,
    middleware,
    routing::{get, post, put},
    Router,
};
use tower_governor::governor::GovernorConfigBuilder;
use tower_governor::key_extractor::PeerIpKeyExtractor;
use tower_governor::GovernorLayer;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use crate::{auth, handlers, AppState};

/// Room for several files plus the text parts of a multipart form
const BODY_LIMIT_FACTOR: usize = 4;
const BODY_LIMIT_SLACK: usize = 1024 * 1024;

pub fn router(state: AppState) -> Router {
    // Login and refresh: 2 req/sec sustained, burst of 5, keyed by peer IP
    let mut session_routes = Router::new()
        .route("/api/v1/auth/login", post(handlers::login))
        .route("/api/v1/auth/refresh", post(handlers::refresh));

    if state.config.login_rate_limit {
        match GovernorConfigBuilder::default()
            .key_extractor(PeerIpKeyExtractor)
            .per_second(2)
            .burst_size(5)
            .finish()
        {
            Some(config) => {
                session_routes = session_routes.layer(GovernorLayer {
                    config: Arc::new(config),
                });
            }
            None => tracing::warn!("Invalid rate limit settings, login is not rate-limited"),
        }
    }

    // Bearer token required
    let account_routes = Router::new()
        .route("/api/v1/auth/me", get(handlers::me))
        .route("/api/v1/auth/password", put(handlers::change_password))
        .route(
            "/api/v1/users",
            get(handlers::list_users).post(handlers::create_user),
        )
        .route(
            "/api/v1/users/:id",
            put(handlers::update_user).delete(handlers::delete_user),
        )
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth::require_auth,
        ));

    // Access decided per resource schema
    let resource_routes = Router::new()
        .route(
            "/api/v1/:resource",
            get(handlers::list_records).post(handlers::create_record),
        )
        .route(
            "/api/v1/:resource/:segment",
            get(handlers::get_segment)
                .post(handlers::create_in_category)
                .put(handlers::update_record)
                .delete(handlers::delete_record),
        )
        .route(
            "/api/v1/:resource/:category/:id",
            get(handlers::get_in_category)
                .put(handlers::update_in_category)
                .delete(handlers::delete_in_category),
        )
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth::optional_auth,
        ));

    let body_limit = state
        .config
        .max_upload_bytes
        .saturating_mul(BODY_LIMIT_FACTOR)
        .saturating_add(BODY_LIMIT_SLACK);

    Router::new()
        .route("/health", get(handlers::health))
        .route("/api/v1/meta/resources", get(handlers::list_resources))
        .route("/api/v1/meta/resources/:resource", get(handlers::get_resource))
        .merge(session_routes)
        .merge(account_routes)
        .merge(resource_routes)
        .nest_service("/uploads", ServeDir::new(&state.config.upload_dir))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(CatchPanicLayer::new())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
