use aniflix_runtime::Runtime;
use axum::routing::get;
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::handlers;

pub fn router(runtime: Runtime) -> Router {
    Router::new()
        .route("/episode/{anime_id}/{episode_id}", get(handlers::get_episode))
        .route("/policy", get(handlers::policy))
        .route("/health", get(handlers::health))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(runtime)
}
