use crate::analytics::AnalyticsSession;
use crate::feed::memory::MemoryFeed;
use crate::state::AppState;
use axum::Router;
use axum::routing::{delete, get, post, put};
use std::sync::{Arc, Mutex, RwLock};

pub mod handlers;
pub mod responses;

/// Shared handles every route needs.
#[derive(Clone)]
pub struct ApiContext {
    pub state: Arc<RwLock<AppState>>,
    pub feed: MemoryFeed,
    pub session: Arc<Mutex<AnalyticsSession>>,
}

pub fn router(ctx: ApiContext) -> Router {
    Router::new()
        .route("/api/health", get(handlers::get_health))
        .route("/api/analytics", get(handlers::get_analytics))
        .route("/api/analytics/charts", get(handlers::get_charts))
        .route("/api/selection", put(handlers::put_selection))
        .route("/api/detections", post(handlers::post_detection))
        .route("/api/detections/{id}", delete(handlers::delete_detection))
        .route("/api/activity", get(handlers::get_activity))
        .route("/api/labels/{label}/advice", get(handlers::get_label_advice))
        .with_state(ctx)
}
