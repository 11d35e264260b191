//! Client for the `/episode` HTTP surface, as used by a watch view.

use aniflix_core::models::EpisodeResponse;
use aniflix_core::playback::LoadFailure;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use thiserror::Error;
use tokio_util::sync::CancellationToken;

use crate::http::race;

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request cancelled")]
    Cancelled,

    #[error("{0}")]
    NotFound(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },
}

impl FetchError {
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }
}

impl From<FetchError> for LoadFailure {
    fn from(e: FetchError) -> Self {
        match e {
            FetchError::Cancelled => LoadFailure::Cancelled,
            FetchError::NotFound(_) => LoadFailure::NotFound,
            other => LoadFailure::Failed(other.to_string()),
        }
    }
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: String,
}

#[derive(Debug, Clone)]
pub struct EpisodeClient {
    http: Client,
    base_url: String,
}

impl EpisodeClient {
    pub fn new(http: Client, base_url: impl Into<String>) -> Self {
        Self {
            http,
            base_url: base_url.into(),
        }
    }

    /// Fetch `GET /episode/{anime_id}/{episode_id}`.
    pub async fn fetch(
        &self,
        anime_id: &str,
        episode_id: &str,
        cancel: &CancellationToken,
    ) -> Result<EpisodeResponse, FetchError> {
        let url = format!(
            "{}/episode/{}/{}",
            self.base_url.trim_end_matches('/'),
            urlencoding::encode(anime_id),
            urlencoding::encode(episode_id),
        );
        race(cancel, self.get(url))
            .await
            .unwrap_or(Err(FetchError::Cancelled))
    }

    async fn get(&self, url: String) -> Result<EpisodeResponse, FetchError> {
        tracing::debug!(url = %url, "Fetching episode");
        let resp = self.http.get(&url).send().await?;
        let status = resp.status();
        if status == StatusCode::NOT_FOUND {
            let message = resp
                .json::<ErrorBody>()
                .await
                .map(|b| b.error)
                .unwrap_or_else(|_| "Episode not found".to_string());
            return Err(FetchError::NotFound(message));
        }
        if !status.is_success() {
            let message = resp.text().await.unwrap_or_default();
            return Err(FetchError::Api {
                status: status.as_u16(),
                message,
            });
        }
        Ok(resp.json::<EpisodeResponse>().await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_into_load_failure() {
        assert_eq!(LoadFailure::from(FetchError::Cancelled), LoadFailure::Cancelled);
        assert_eq!(
            LoadFailure::from(FetchError::NotFound("Episode not found".into())),
            LoadFailure::NotFound
        );
        let failure = LoadFailure::from(FetchError::Api {
            status: 502,
            message: "bad gateway".into(),
        });
        assert_eq!(
            failure,
            LoadFailure::Failed("API error (status 502): bad gateway".into())
        );
    }
}
