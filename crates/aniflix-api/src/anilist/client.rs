use aniflix_core::models::AnimeMetadata;
use reqwest::Client;
use tokio_util::sync::CancellationToken;

use super::error::AniListError;
use super::types::{GraphQLResponse, MediaResponse};
use crate::http::race;
use crate::traits::MetadataProvider;

pub const API_URL: &str = "https://graphql.anilist.co";

const GET_ANIME_QUERY: &str = r#"
query ($id: Int) {
    Media(id: $id, type: ANIME) {
        id
        title { romaji english native }
        episodes
        genres
        status
        format
    }
}
"#;

/// AniList GraphQL API client. Anonymous, read-only.
#[derive(Debug, Clone)]
pub struct AniListClient {
    http: Client,
    url: String,
}

impl AniListClient {
    pub fn new(http: Client) -> Self {
        Self::with_url(http, API_URL)
    }

    /// Client for a non-default endpoint.
    pub fn with_url(http: Client, url: impl Into<String>) -> Self {
        Self {
            http,
            url: url.into(),
        }
    }

    async fn graphql_request<T: serde::de::DeserializeOwned>(
        &self,
        operation: &str,
        query: &str,
        variables: serde_json::Value,
    ) -> Result<T, AniListError> {
        tracing::debug!(operation, "AniList GraphQL request");

        let resp = self
            .http
            .post(&self.url)
            .header("Content-Type", "application/json")
            .header("Accept", "application/json")
            .json(&serde_json::json!({
                "query": query,
                "variables": variables,
            }))
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let status_code = status.as_u16();
            let body = resp.text().await.unwrap_or_default();
            tracing::debug!(operation, status = status_code, "AniList API error");
            return Err(AniListError::Api {
                status: status_code,
                message: body,
            });
        }

        tracing::debug!(operation, status = %status, "AniList response received");
        resp.json::<T>()
            .await
            .map_err(|e| AniListError::Parse(e.to_string()))
    }

    /// Fetch one anime by id.
    pub async fn get_anime_by_id(&self, id: u64) -> Result<AnimeMetadata, AniListError> {
        let resp: GraphQLResponse<MediaResponse> = self
            .graphql_request("GetAnime", GET_ANIME_QUERY, serde_json::json!({ "id": id }))
            .await
            .map_err(|e| match e {
                AniListError::Api { status: 404, .. } => AniListError::NotFound(id),
                other => other,
            })?;

        if let Some(err) = resp.errors.first() {
            if err.status == Some(404) {
                return Err(AniListError::NotFound(id));
            }
        }
        resp.data
            .and_then(|d| d.media)
            .map(|m| m.into_metadata())
            .ok_or(AniListError::NotFound(id))
    }
}

impl MetadataProvider for AniListClient {
    async fn get_anime(
        &self,
        id: u64,
        cancel: &CancellationToken,
    ) -> Result<AnimeMetadata, AniListError> {
        race(cancel, self.get_anime_by_id(id))
            .await
            .unwrap_or(Err(AniListError::Cancelled))
    }
}
