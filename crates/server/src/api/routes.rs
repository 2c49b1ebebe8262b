use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use super::{cache, catalog, downloads, handlers, jobs, middleware::metrics_middleware};
use crate::state::AppState;

pub fn create_router(state: Arc<AppState>) -> Router {
    // API routes
    let api_routes = Router::new()
        // Health, config and metrics
        .route("/health", get(handlers::health))
        .route("/config", get(handlers::get_config))
        .route("/metrics", get(handlers::metrics))
        // Catalog browsing (live)
        .route("/categories", get(catalog::list_categories))
        .route("/categories/{id}/series", get(catalog::list_category_series))
        .route("/series/{id}", get(catalog::get_series))
        // Snapshot cache
        .route("/cache/rebuild", post(cache::rebuild))
        .route("/cache/search", get(cache::search))
        .route("/cache/counts", get(cache::counts))
        // Downloads
        .route("/downloads", post(downloads::start_download))
        // Jobs and progress streams
        .route("/jobs", get(jobs::list_jobs))
        .route("/jobs/{id}", get(jobs::get_job))
        .route("/jobs/{id}/events", get(jobs::job_events))
        .with_state(state);

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .nest("/api/v1", api_routes)
        .layer(middleware::from_fn(metrics_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}
