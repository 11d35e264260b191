use aniflix_core::episode::EpisodeReference;
use aniflix_core::models::EpisodeResponse;
use aniflix_runtime::Runtime;
use axum::extract::{Path, State};
use axum::Json;
use serde_json::{json, Value};
use tokio_util::sync::CancellationToken;

use crate::error::AppError;

/// `GET /episode/{anime_id}/{episode_id}`
pub async fn get_episode(
    State(runtime): State<Runtime>,
    Path((anime_id, episode_id)): Path<(String, String)>,
) -> Result<Json<EpisodeResponse>, AppError> {
    let cancel = CancellationToken::new();
    // Cancels in-flight provider calls if the connection drops.
    let _guard = cancel.clone().drop_guard();

    let reference = EpisodeReference::new(anime_id, episode_id);
    let resolution = runtime.resolve(&reference, &cancel).await?;
    Ok(Json(resolution.response))
}

/// `GET /policy`: denylist fragments configured on top of the built-in ones,
/// for the browser to enforce on what it plays.
pub async fn policy(State(runtime): State<Runtime>) -> Json<Value> {
    Json(json!({ "denylist": runtime.config().policy.denylist }))
}

/// `GET /health`
pub async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}
