//! Adapter for search → info → watch streaming providers described in config.

use aniflix_core::config::ProviderDescriptor;
use aniflix_core::episode::ProviderEpisode;
use aniflix_core::extract::StreamPayload;
use reqwest::Client;
use serde_json::Value;
use tokio_util::sync::CancellationToken;

use crate::error::ProviderError;
use crate::http::{get_json, ContentCheck};
use crate::traits::{ProviderSearchResult, StreamingProvider, MAX_SEARCH_RESULTS};

/// A streaming provider driven entirely by its [`ProviderDescriptor`].
#[derive(Debug, Clone)]
pub struct DescriptorProvider {
    descriptor: ProviderDescriptor,
    http: Client,
}

impl DescriptorProvider {
    pub fn new(descriptor: ProviderDescriptor, http: Client) -> Self {
        Self { descriptor, http }
    }

    pub fn descriptor(&self) -> &ProviderDescriptor {
        &self.descriptor
    }

    fn url(&self, template: &str, placeholder: &str, value: &str) -> String {
        let path = template.replace(placeholder, &urlencoding::encode(value));
        format!("{}{}", self.descriptor.base_url.trim_end_matches('/'), path)
    }

    async fn get(&self, op: &str, url: String, cancel: &CancellationToken) -> Result<Value, ProviderError> {
        tracing::debug!(provider = %self.descriptor.id, op, url = %url, "Provider request");
        get_json(self.http.get(&url), ContentCheck::Body, cancel).await
    }
}

fn id_string(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn parse_search(provider_id: &str, body: &Value) -> Vec<ProviderSearchResult> {
    let Some(results) = body.get("results").and_then(Value::as_array) else {
        return Vec::new();
    };
    results
        .iter()
        .take(MAX_SEARCH_RESULTS)
        .filter_map(|r| {
            Some(ProviderSearchResult {
                provider_id: provider_id.to_string(),
                external_id: id_string(r.get("id"))?,
                title: r.get("title").and_then(Value::as_str).map(str::to_string),
            })
        })
        .collect()
}

fn parse_episodes(body: &Value) -> Vec<ProviderEpisode> {
    body.get("episodes")
        .and_then(Value::as_array)
        .map(|eps| eps.iter().map(ProviderEpisode::from_json).collect())
        .unwrap_or_default()
}

impl StreamingProvider for DescriptorProvider {
    fn id(&self) -> &str {
        &self.descriptor.id
    }

    async fn search(
        &self,
        title: &str,
        cancel: &CancellationToken,
    ) -> Result<Vec<ProviderSearchResult>, ProviderError> {
        let url = self.url(&self.descriptor.search, "{query}", title);
        let body = self.get("search", url, cancel).await?;
        Ok(parse_search(&self.descriptor.id, &body))
    }

    async fn info(
        &self,
        external_anime_id: &str,
        cancel: &CancellationToken,
    ) -> Result<Vec<ProviderEpisode>, ProviderError> {
        let url = self.url(&self.descriptor.info, "{id}", external_anime_id);
        let body = self.get("info", url, cancel).await?;
        Ok(parse_episodes(&body))
    }

    async fn watch(
        &self,
        external_episode_id: &str,
        cancel: &CancellationToken,
    ) -> Result<StreamPayload, ProviderError> {
        let url = self.url(&self.descriptor.watch, "{id}", external_episode_id);
        let body = self.get("watch", url, cancel).await?;
        Ok(StreamPayload::from_json(&body))
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn provider() -> DescriptorProvider {
        DescriptorProvider::new(
            ProviderDescriptor {
                id: "zoro".into(),
                base_url: "https://api.test/anime/zoro/".into(),
                search: "/{query}".into(),
                info: "/info/{id}".into(),
                watch: "/watch/{id}".into(),
            },
            Client::new(),
        )
    }

    #[test]
    fn test_url_encodes_values() {
        let p = provider();
        assert_eq!(
            p.url("/{query}", "{query}", "Attack on Titan: Final"),
            "https://api.test/anime/zoro/Attack%20on%20Titan%3A%20Final"
        );
        assert_eq!(
            p.url("/watch/{id}", "{id}", "one-piece$episode$1"),
            "https://api.test/anime/zoro/watch/one-piece%24episode%241"
        );
    }

    #[test]
    fn test_search_truncates_to_five() {
        let body = json!({
            "results": (0..8).map(|i| json!({ "id": format!("a{i}"), "title": "A" })).collect::<Vec<_>>()
        });
        let results = parse_search("zoro", &body);
        assert_eq!(results.len(), 5);
        assert_eq!(results[0].external_id, "a0");
        assert_eq!(results[0].provider_id, "zoro");
    }

    #[test]
    fn test_search_skips_entries_without_id() {
        let body = json!({ "results": [{ "title": "no id" }, { "id": 42 }] });
        let results = parse_search("p", &body);
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].external_id, "42");
        assert!(parse_search("p", &json!({ "results": "nope" })).is_empty());
        assert!(parse_search("p", &json!([])).is_empty());
    }

    #[test]
    fn test_episodes_missing_is_empty() {
        assert!(parse_episodes(&json!({})).is_empty());
        assert_eq!(parse_episodes(&json!({ "episodes": [{ "id": "e1", "number": 1 }] })).len(), 1);
    }
}
