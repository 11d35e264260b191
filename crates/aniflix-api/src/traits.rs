//! Seams between the resolution pipeline and the outside world.
//!
//! Every call takes the request's cancellation token and returns
//! `Cancelled` as soon as it fires.

use std::future::Future;

use aniflix_core::episode::ProviderEpisode;
use aniflix_core::extract::StreamPayload;
use aniflix_core::models::AnimeMetadata;
use tokio_util::sync::CancellationToken;

use crate::anilist::AniListError;
use crate::error::ProviderError;

/// Source of anime metadata keyed by numeric id.
pub trait MetadataProvider: Send + Sync {
    /// `AniListError::NotFound` when the provider has no such anime.
    fn get_anime(
        &self,
        id: u64,
        cancel: &CancellationToken,
    ) -> impl Future<Output = Result<AnimeMetadata, AniListError>> + Send;
}

/// A search → info → watch streaming provider.
pub trait StreamingProvider: Send + Sync {
    fn id(&self) -> &str;

    /// Search by title. At most [`MAX_SEARCH_RESULTS`] results.
    fn search(
        &self,
        title: &str,
        cancel: &CancellationToken,
    ) -> impl Future<Output = Result<Vec<ProviderSearchResult>, ProviderError>> + Send;

    /// Episode list of a provider-side anime.
    fn info(
        &self,
        external_anime_id: &str,
        cancel: &CancellationToken,
    ) -> impl Future<Output = Result<Vec<ProviderEpisode>, ProviderError>> + Send;

    /// Stream payload of a provider-side episode.
    fn watch(
        &self,
        external_episode_id: &str,
        cancel: &CancellationToken,
    ) -> impl Future<Output = Result<StreamPayload, ProviderError>> + Send;
}

/// Service addressed directly by metadata id and episode number.
pub trait FallbackSource: Send + Sync {
    /// Audio tracks to try, in order.
    fn audio_tracks(&self) -> &[String];

    fn fetch(
        &self,
        anime_id: u64,
        episode: u32,
        audio: &str,
        cancel: &CancellationToken,
    ) -> impl Future<Output = Result<StreamPayload, ProviderError>> + Send;
}

pub const MAX_SEARCH_RESULTS: usize = 5;

/// One hit from a provider search.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct ProviderSearchResult {
    pub provider_id: String,
    pub external_id: String,
    pub title: Option<String>,
}
