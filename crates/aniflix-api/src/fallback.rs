//! Secondary fallback service addressed by metadata id.

use aniflix_core::config::FallbackConfig;
use aniflix_core::extract::StreamPayload;
use reqwest::Client;
use tokio_util::sync::CancellationToken;

use crate::error::ProviderError;
use crate::http::{get_json, ContentCheck};
use crate::traits::FallbackSource;

#[derive(Debug, Clone)]
pub struct FallbackClient {
    config: FallbackConfig,
    http: Client,
}

impl FallbackClient {
    pub fn new(config: FallbackConfig, http: Client) -> Self {
        Self { config, http }
    }

    fn url(&self, anime_id: u64, episode: u32, audio: &str) -> String {
        format!(
            "{}/anime/{}/{}/{}/{}",
            self.config.base_url.trim_end_matches('/'),
            anime_id,
            self.config.season,
            episode,
            urlencoding::encode(audio),
        )
    }
}

impl FallbackSource for FallbackClient {
    fn audio_tracks(&self) -> &[String] {
        &self.config.audio
    }

    async fn fetch(
        &self,
        anime_id: u64,
        episode: u32,
        audio: &str,
        cancel: &CancellationToken,
    ) -> Result<StreamPayload, ProviderError> {
        let url = self.url(anime_id, episode, audio);
        tracing::debug!(anime_id, episode, audio, url = %url, "Fallback request");
        let body = get_json(self.http.get(&url), ContentCheck::Header, cancel).await?;
        Ok(StreamPayload::from_json(&body))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_url_shape() {
        let client = FallbackClient::new(
            FallbackConfig {
                base_url: "https://fallback.test/".into(),
                season: 1,
                audio: vec!["sub".into(), "dub".into()],
            },
            Client::new(),
        );
        assert_eq!(client.url(21, 3, "dub"), "https://fallback.test/anime/21/1/3/dub");
        assert_eq!(client.audio_tracks(), ["sub", "dub"]);
    }
}
