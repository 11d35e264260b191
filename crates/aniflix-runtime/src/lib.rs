mod pipeline;

use std::sync::Arc;

use aniflix_api::{build_client, AniListClient, DescriptorProvider, FallbackClient};
use aniflix_core::config::AppConfig;
use aniflix_core::episode::EpisodeReference;
use aniflix_core::extract::SourceExtractor;
use tokio_util::sync::CancellationToken;

pub use pipeline::{Attempt, CandidatePlan, Resolution, ResolutionSource, Resolver};

/// Errors surfaced by a resolution.
#[derive(Debug, thiserror::Error)]
pub enum ResolveError {
    #[error("not found: {0}")]
    NotFound(String),
    #[error("resolution cancelled")]
    Cancelled,
}

impl ResolveError {
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum RuntimeError {
    #[error("config error: {0}")]
    Config(String),
    #[error("http client error: {0}")]
    Http(String),
}

/// The resolver as wired from configuration.
pub type ConfiguredResolver = Resolver<AniListClient, DescriptorProvider, FallbackClient>;

/// Shared application state: configuration and a resolver over real clients.
#[derive(Clone)]
pub struct Runtime {
    config: Arc<AppConfig>,
    resolver: Arc<ConfiguredResolver>,
}

impl Runtime {
    /// Load the user (or built-in) config and wire the clients.
    pub fn new() -> Result<Self, RuntimeError> {
        let config = AppConfig::load().map_err(|e| RuntimeError::Config(e.to_string()))?;
        Self::from_config(config)
    }

    pub fn from_config(config: AppConfig) -> Result<Self, RuntimeError> {
        let http = build_client(&config.http).map_err(|e| RuntimeError::Http(e.to_string()))?;
        let catalog = config
            .local_catalog()
            .map_err(|e| RuntimeError::Config(e.to_string()))?;

        let metadata = AniListClient::with_url(http.clone(), config.metadata.url.clone());
        let providers = config
            .providers
            .iter()
            .cloned()
            .map(|d| DescriptorProvider::new(d, http.clone()))
            .collect();
        let fallback = FallbackClient::new(config.fallback.clone(), http);
        let extractor = SourceExtractor::new(config.denylist());

        tracing::debug!(
            providers = config.providers.len(),
            catalog = catalog.len(),
            "Runtime configured"
        );

        let resolver = Resolver::new(
            catalog,
            metadata,
            providers,
            fallback,
            extractor,
            config.embed.clone(),
        );
        Ok(Self {
            config: Arc::new(config),
            resolver: Arc::new(resolver),
        })
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub async fn resolve(
        &self,
        reference: &EpisodeReference,
        cancel: &CancellationToken,
    ) -> Result<Resolution, ResolveError> {
        self.resolver.resolve(reference, cancel).await
    }
}
