//! Episode source resolution.
//!
//! Sources are tried in a fixed order: the local catalog, every streaming
//! provider for every title variant, the fallback service per audio track,
//! and finally a synthesized embed URL. Provider and fallback failures are
//! soft; only an unknown anime, an invalid episode, or cancellation end the
//! resolution with an error.

use aniflix_api::{FallbackSource, MetadataProvider, ProviderError, StreamingProvider};
use aniflix_core::catalog::LocalCatalog;
use aniflix_core::config::EmbedConfig;
use aniflix_core::episode::{match_episode, EpisodeReference, ExternalEpisode};
use aniflix_core::extract::SourceExtractor;
use aniflix_core::models::{AnimeMetadata, EpisodeResponse, ResolvedSource};
use aniflix_core::titles::{slugify, TitleVariants};
use serde::Serialize;
use tokio_util::sync::CancellationToken;

use crate::ResolveError;

/// Where a resolved source came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ResolutionSource {
    LocalCatalog,
    Provider {
        provider: String,
        variant: String,
        result: String,
        step: String,
    },
    SecondaryFallback {
        audio: String,
    },
    TertiaryFallback,
    /// Every source failed; the response carries no URL.
    Exhausted,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Resolution {
    pub response: EpisodeResponse,
    pub source: ResolutionSource,
}

// ── Candidate plan ────────────────────────────────────────────────────

/// One `(provider, title variant)` search.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Attempt<'a> {
    pub provider: usize,
    pub variant: &'a str,
}

/// Provider-major sequence of searches.
///
/// Each attempt is later expanded into at most five search results.
#[derive(Debug, Clone)]
pub struct CandidatePlan<'a> {
    providers: usize,
    variants: &'a [String],
    next: usize,
}

impl<'a> CandidatePlan<'a> {
    pub fn new(providers: usize, variants: &'a TitleVariants) -> Self {
        Self {
            providers,
            variants: variants.as_slice(),
            next: 0,
        }
    }
}

impl<'a> Iterator for CandidatePlan<'a> {
    type Item = Attempt<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        let per_provider = self.variants.len();
        if per_provider == 0 || self.next >= self.providers * per_provider {
            return None;
        }
        let i = self.next;
        self.next += 1;
        Some(Attempt {
            provider: i / per_provider,
            variant: &self.variants[i % per_provider],
        })
    }
}

// ── Resolver ──────────────────────────────────────────────────────────

/// Outcome of one soft step: a source, nothing, or a cancellation.
type Step<T> = Result<Option<T>, ResolveError>;

pub struct Resolver<M, P, F> {
    catalog: LocalCatalog,
    metadata: M,
    providers: Vec<P>,
    fallback: F,
    extractor: SourceExtractor,
    embed: EmbedConfig,
}

impl<M, P, F> Resolver<M, P, F>
where
    M: MetadataProvider,
    P: StreamingProvider,
    F: FallbackSource,
{
    pub fn new(
        catalog: LocalCatalog,
        metadata: M,
        providers: Vec<P>,
        fallback: F,
        extractor: SourceExtractor,
        embed: EmbedConfig,
    ) -> Self {
        Self {
            catalog,
            metadata,
            providers,
            fallback,
            extractor,
            embed,
        }
    }

    pub fn extractor(&self) -> &SourceExtractor {
        &self.extractor
    }

    /// Resolve a playable source for `reference`.
    pub async fn resolve(
        &self,
        reference: &EpisodeReference,
        cancel: &CancellationToken,
    ) -> Result<Resolution, ResolveError> {
        if cancel.is_cancelled() {
            return Err(ResolveError::Cancelled);
        }

        if let Some((anime, episode)) = self
            .catalog
            .episode(&reference.anime_id, &reference.episode_id)
        {
            tracing::info!(anime_id = %anime.id, episode = %episode.id, "Resolved from local catalog");
            return Ok(Resolution {
                response: EpisodeResponse::with_source(
                    episode.id.clone(),
                    episode.title.clone(),
                    ResolvedSource::curated(episode.video_url.clone()),
                ),
                source: ResolutionSource::LocalCatalog,
            });
        }

        let Some(external) = reference.external() else {
            tracing::debug!(%reference, "Episode id is not an external reference");
            return Err(ResolveError::NotFound(format!("unknown episode {reference}")));
        };

        let meta = match self.metadata.get_anime(external.anime_id, cancel).await {
            Ok(meta) => meta,
            Err(e) if e.is_cancelled() => return Err(ResolveError::Cancelled),
            Err(e) => {
                tracing::debug!(anime_id = external.anime_id, error = %e, "Metadata lookup failed");
                return Err(ResolveError::NotFound(format!("anime {}: {e}", external.anime_id)));
            }
        };

        if !meta.has_episode(external.number) {
            tracing::debug!(
                anime_id = external.anime_id,
                episode = external.number,
                total = meta.episodes.unwrap_or(0),
                "Episode out of range"
            );
            return Err(ResolveError::NotFound(format!(
                "episode {} of anime {}",
                external.number, external.anime_id
            )));
        }

        let id = &reference.episode_id;
        let resolution = if let Some(found) = self.try_providers(id, &meta, external, cancel).await? {
            found
        } else if let Some(found) = self.try_secondary(id, external, cancel).await? {
            found
        } else if let Some(found) = self.try_tertiary(id, &meta, external) {
            found
        } else {
            Resolution {
                response: EpisodeResponse::empty(id.clone(), episode_title(None, external.number)),
                source: ResolutionSource::Exhausted,
            }
        };

        tracing::info!(
            anime_id = external.anime_id,
            episode = external.number,
            source = ?resolution.source,
            "Episode resolved"
        );
        Ok(resolution)
    }

    async fn try_providers(
        &self,
        id: &str,
        meta: &AnimeMetadata,
        external: ExternalEpisode,
        cancel: &CancellationToken,
    ) -> Step<Resolution> {
        let variants = TitleVariants::from_title(&meta.title);
        for attempt in CandidatePlan::new(self.providers.len(), &variants) {
            if cancel.is_cancelled() {
                return Err(ResolveError::Cancelled);
            }
            let provider = &self.providers[attempt.provider];
            let results = match provider.search(attempt.variant, cancel).await {
                Ok(results) => results,
                Err(e) if e.is_cancelled() => return Err(ResolveError::Cancelled),
                Err(e) => {
                    tracing::debug!(provider = provider.id(), variant = attempt.variant, error = %e, "Search failed");
                    continue;
                }
            };

            for result in &results {
                let found = self
                    .try_result(provider, &result.external_id, id, external.number, cancel)
                    .await?;
                if let Some((step, url, title)) = found {
                    return Ok(Some(Resolution {
                        response: EpisodeResponse::with_source(
                            id,
                            episode_title(title.as_deref(), external.number),
                            ResolvedSource::from_url(url),
                        ),
                        source: ResolutionSource::Provider {
                            provider: provider.id().to_string(),
                            variant: attempt.variant.to_string(),
                            result: result.external_id.clone(),
                            step,
                        },
                    }));
                }
            }
        }
        Ok(None)
    }

    /// info → match → watch → extract for one search result.
    async fn try_result(
        &self,
        provider: &P,
        external_anime_id: &str,
        id: &str,
        number: u32,
        cancel: &CancellationToken,
    ) -> Step<(String, String, Option<String>)> {
        let episodes = match provider.info(external_anime_id, cancel).await {
            Ok(episodes) => episodes,
            Err(e) if e.is_cancelled() => return Err(ResolveError::Cancelled),
            Err(e) => {
                tracing::debug!(provider = provider.id(), result = external_anime_id, error = %e, "Info failed");
                return Ok(None);
            }
        };

        let Some(matched) = match_episode(&episodes, number) else {
            tracing::debug!(provider = provider.id(), result = external_anime_id, episode = number, "Episode not listed");
            return Ok(None);
        };
        let episode = &episodes[matched.index()];
        let Some(episode_id) = episode.episode_id.as_deref() else {
            tracing::debug!(provider = provider.id(), result = external_anime_id, "Matched episode has no id");
            return Ok(None);
        };

        let payload = match provider.watch(episode_id, cancel).await {
            Ok(payload) => payload,
            Err(e) if e.is_cancelled() => return Err(ResolveError::Cancelled),
            Err(e) => {
                tracing::debug!(provider = provider.id(), episode_id, error = %e, "Watch failed");
                return Ok(None);
            }
        };
        if !payload.unrecognized.is_empty() {
            tracing::debug!(provider = provider.id(), fields = ?payload.unrecognized, "Ignored unrecognized payload fields");
        }

        match self.extractor.extract_with_step(&payload) {
            Some((step, url)) => {
                tracing::debug!(provider = provider.id(), id, step = step.as_str(), "Source extracted");
                Ok(Some((step.as_str().to_string(), url, episode.title.clone())))
            }
            None => {
                tracing::debug!(provider = provider.id(), episode_id, "No embeddable source in payload");
                Ok(None)
            }
        }
    }

    async fn try_secondary(
        &self,
        id: &str,
        external: ExternalEpisode,
        cancel: &CancellationToken,
    ) -> Step<Resolution> {
        for audio in self.fallback.audio_tracks() {
            if cancel.is_cancelled() {
                return Err(ResolveError::Cancelled);
            }
            let payload = match self
                .fallback
                .fetch(external.anime_id, external.number, audio, cancel)
                .await
            {
                Ok(payload) => payload,
                Err(e) if e.is_cancelled() => return Err(ResolveError::Cancelled),
                Err(e @ (ProviderError::NotJson | ProviderError::Parse(_) | ProviderError::Api { .. })) => {
                    tracing::debug!(audio = %audio, error = %e, "Fallback skipped");
                    continue;
                }
                Err(e) => {
                    tracing::warn!(audio = %audio, error = %e, "Fallback service error");
                    continue;
                }
            };

            if !payload.has_any_source() {
                continue;
            }
            if let Some(url) = self.extractor.extract_fallback(&payload) {
                return Ok(Some(Resolution {
                    response: EpisodeResponse::with_source(
                        id,
                        episode_title(None, external.number),
                        ResolvedSource::from_url(url),
                    ),
                    source: ResolutionSource::SecondaryFallback {
                        audio: audio.clone(),
                    },
                }));
            }
        }
        Ok(None)
    }

    /// Synthesized embed URL. Not filtered: the player decides.
    fn try_tertiary(&self, id: &str, meta: &AnimeMetadata, external: ExternalEpisode) -> Option<Resolution> {
        let slug = slugify(meta.title.preferred().unwrap_or_default());
        if slug.is_empty() {
            return None;
        }
        let url = self.embed.url(&slug, external.number);
        Some(Resolution {
            response: EpisodeResponse::with_source(
                id,
                episode_title(None, external.number),
                ResolvedSource::from_url(url),
            ),
            source: ResolutionSource::TertiaryFallback,
        })
    }
}

fn episode_title(title: Option<&str>, number: u32) -> String {
    match title {
        Some(t) if !t.is_empty() => t.to_string(),
        _ => format!("Episode {number}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plan_is_provider_major() {
        let variants = TitleVariants::from_candidates(vec!["A".into(), "B".into()]);
        let plan: Vec<(usize, &str)> = CandidatePlan::new(2, &variants)
            .map(|a| (a.provider, a.variant))
            .collect();
        assert_eq!(plan, [(0, "A"), (0, "B"), (1, "A"), (1, "B")]);
    }

    #[test]
    fn test_plan_empty() {
        let none = TitleVariants::default();
        assert_eq!(CandidatePlan::new(3, &none).count(), 0);
        let variants = TitleVariants::from_candidates(vec!["A".into()]);
        assert_eq!(CandidatePlan::new(0, &variants).count(), 0);
    }

    #[test]
    fn test_episode_title() {
        assert_eq!(episode_title(Some("Romance Dawn"), 1), "Romance Dawn");
        assert_eq!(episode_title(Some(""), 4), "Episode 4");
        assert_eq!(episode_title(None, 7), "Episode 7");
    }
}
