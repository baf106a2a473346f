//! djrank-server library
//!
//! HTTP API over a pluggable performer gateway. Reads are public; creating,
//! updating and deleting performers requires the admin token.

use std::sync::Arc;

use axum::http::{header, HeaderName, Method};
use axum::{middleware, Router};
use djrank_common::api::auth::FailedAttemptLimiter;
use djrank_common::events::EventBus;
use djrank_common::Gateway;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

pub mod api;

/// Application state shared across HTTP handlers
#[derive(Clone)]
pub struct AppState {
    pub gateway: Arc<dyn Gateway>,
    /// `None` refuses every mutation
    pub admin_secret: Option<Arc<str>>,
    pub limiter: Arc<FailedAttemptLimiter>,
    pub events: Arc<EventBus>,
}

impl AppState {
    /// State with the default rate limit and event bus
    pub fn new(gateway: Arc<dyn Gateway>, admin_secret: Option<String>) -> Self {
        Self {
            gateway,
            admin_secret: admin_secret.map(Arc::from),
            limiter: Arc::new(FailedAttemptLimiter::default()),
            events: Arc::new(EventBus::default()),
        }
    }

    pub fn with_limiter(mut self, limiter: FailedAttemptLimiter) -> Self {
        self.limiter = Arc::new(limiter);
        self
    }

    pub fn with_events(mut self, events: Arc<EventBus>) -> Self {
        self.events = events;
        self
    }
}

fn cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([header::CONTENT_TYPE, HeaderName::from_static("x-admin-token")])
}

/// Build application router
pub fn build_router(state: AppState) -> Router {
    use axum::routing::{get, post, put};

    // Mutations (admin token + rate limit)
    let protected = Router::new()
        .route("/api/performers", post(api::create_performer))
        .route(
            "/api/performers/:id",
            put(api::update_performer).delete(api::delete_performer),
        )
        .layer(middleware::from_fn_with_state(
            state.clone(),
            api::admin_middleware,
        ));

    // Reads (no authentication)
    let public = Router::new()
        .route("/api/performers", get(api::list_performers))
        .route("/api/performers/:id", get(api::get_performer))
        .route("/api/performers/:id/score", get(api::get_performer_score))
        .route("/api/board", get(api::get_board))
        .route("/api/events", get(api::event_stream))
        .merge(api::health_routes());

    Router::new()
        .merge(protected)
        .merge(public)
        .layer(cors_layer())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
