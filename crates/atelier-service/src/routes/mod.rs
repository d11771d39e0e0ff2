//! HTTP routes for the atelier service.
//!
//! Defines the Axum router and application state.

use crate::auth::AuthGate;
use crate::config::Config;
use crate::handlers;
use crate::middleware::{
    http_metrics_middleware, json_method_not_allowed, json_request_timeout, require_integer_id,
    require_permission, PermissionGuard,
};
use axum::{
    http::{
        header::{AUTHORIZATION, CONTENT_TYPE},
        Method,
    },
    middleware,
    routing::{delete, get, patch, post, MethodRouter},
    Router,
};
use metrics_exporter_prometheus::PrometheusHandle;
use sqlx::PgPool;
use std::sync::Arc;
use std::time::Duration;
use tower_http::{
    cors::{Any, CorsLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool.
    pub pool: PgPool,

    /// Service configuration.
    pub config: Config,

    /// Authorization gate shared by every guarded route.
    pub gate: Arc<AuthGate>,
}

impl AppState {
    /// State with a gate backed by the configured JWKS endpoint.
    pub fn new(pool: PgPool, config: Config) -> Self {
        let gate = Arc::new(AuthGate::from_config(&config));
        Self { pool, config, gate }
    }

    /// State with an explicit gate.
    pub fn with_gate(pool: PgPool, config: Config, gate: Arc<AuthGate>) -> Self {
        Self { pool, config, gate }
    }

    fn guard(&self, permission: &'static str) -> PermissionGuard {
        PermissionGuard::new(self.gate.clone(), permission)
    }
}

/// `route` wrapped in the permission middleware for `permission`.
fn guarded(
    state: &AppState,
    route: MethodRouter<Arc<AppState>>,
    permission: &'static str,
) -> MethodRouter<Arc<AppState>> {
    route.route_layer(middleware::from_fn_with_state(
        state.guard(permission),
        require_permission,
    ))
}

/// Build the application routes.
///
/// Public:
/// - `/`, `/health`, `/ready`, `/metrics`, `/authorization/url`
/// - `GET /artists`, `GET /artists/:id`, `GET /videos`, `GET /videos/:id`
///
/// Guarded (permission in parentheses):
/// - `POST /artists` (`post:artist`)
/// - `PATCH /artists/:id` (`patch:artist`), `DELETE /artists/:id` (`delete:artist`)
/// - `POST /videos`, `POST /add-videos` (`post:video`)
/// - `PATCH /videos/:id` (`patch:video`), `DELETE /videos/:id` (`delete:video`)
///
/// Non-integer ids and unknown paths are 404; wrong methods are 405. Both
/// use the standard error shape.
pub fn build_routes(state: Arc<AppState>, metrics_handle: PrometheusHandle) -> Router {
    let artists = get(handlers::list_artists).merge(guarded(
        &state,
        post(handlers::create_artist),
        "post:artist",
    ));

    // The id check wraps the permission check, so a non-integer id is 404
    // even without credentials.
    let artist = get(handlers::get_artist)
        .merge(guarded(&state, patch(handlers::update_artist), "patch:artist"))
        .merge(guarded(&state, delete(handlers::delete_artist), "delete:artist"))
        .route_layer(middleware::from_fn(require_integer_id));

    let videos = get(handlers::list_videos).merge(guarded(
        &state,
        post(handlers::create_video),
        "post:video",
    ));

    let video = get(handlers::get_video)
        .merge(guarded(&state, patch(handlers::update_video), "patch:video"))
        .merge(guarded(&state, delete(handlers::delete_video), "delete:video"))
        .route_layer(middleware::from_fn(require_integer_id));

    let add_videos = guarded(&state, post(handlers::create_video), "post:video");

    let api_routes = Router::new()
        .route("/", get(handlers::greeting))
        .route("/health", get(handlers::health_check))
        .route("/ready", get(handlers::readiness_check))
        .route("/authorization/url", get(handlers::login_url))
        .route("/artists", artists)
        .route("/artists/:id", artist)
        .route("/videos", videos)
        .route("/videos/:id", video)
        .route("/add-videos", add_videos)
        .with_state(state);

    // Metrics route with its own state
    let metrics_routes = Router::new()
        .route("/metrics", get(handlers::metrics_handler))
        .with_state(metrics_handle);

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_headers([CONTENT_TYPE, AUTHORIZATION])
        .allow_methods([
            Method::GET,
            Method::PUT,
            Method::POST,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ]);

    // Layer order (bottom-to-top execution):
    // 1. json_method_not_allowed - JSON body for 405 (innermost)
    // 2. CorsLayer - answer preflights, add CORS headers
    // 3. TimeoutLayer - Timeout the request
    // 4. json_request_timeout - JSON body for the timeout's 408
    // 5. TraceLayer - Log request details
    // 6. http_metrics_middleware - Record ALL responses (outermost)
    api_routes
        .merge(metrics_routes)
        .fallback(handlers::not_found)
        .layer(middleware::from_fn(json_method_not_allowed))
        .layer(cors)
        .layer(TimeoutLayer::new(Duration::from_secs(30)))
        .layer(middleware::from_fn(json_request_timeout))
        .layer(TraceLayer::new_for_http())
        .layer(middleware::from_fn(http_metrics_middleware))
}
