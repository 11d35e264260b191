use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};

use crate::catalog::LocalCatalog;
use crate::error::CoreError;
use crate::policy::DenylistPolicy;

const DEFAULT_CONFIG: &str = include_str!("../../../config/default.toml");

/// Top-level application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub http: HttpConfig,
    pub metadata: MetadataConfig,
    #[serde(default)]
    pub providers: Vec<ProviderDescriptor>,
    pub fallback: FallbackConfig,
    pub embed: EmbedConfig,
    #[serde(default)]
    pub policy: PolicyConfig,
    #[serde(default)]
    pub catalog: CatalogConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub bind: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpConfig {
    pub request_timeout_secs: u64,
    pub user_agent: String,
}

impl HttpConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

/// GraphQL endpoint of the metadata provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetadataConfig {
    pub url: String,
}

/// One streaming provider.
///
/// `search`, `info` and `watch` are path templates appended to `base_url`;
/// `{query}` and `{id}` are replaced with percent-encoded values.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderDescriptor {
    pub id: String,
    pub base_url: String,
    pub search: String,
    pub info: String,
    pub watch: String,
}

/// Secondary fallback service, addressed by metadata id.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FallbackConfig {
    pub base_url: String,
    pub season: u32,
    /// Audio tracks in the order they are tried.
    pub audio: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbedConfig {
    pub template: String,
}

impl EmbedConfig {
    /// Expand `{slug}` and `{episode}` in the template.
    pub fn url(&self, slug: &str, episode: u32) -> String {
        self.template
            .replace("{slug}", slug)
            .replace("{episode}", &episode.to_string())
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PolicyConfig {
    /// Extra fragments; the built-in denylist always applies.
    #[serde(default)]
    pub denylist: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CatalogConfig {
    pub path: Option<PathBuf>,
}

impl AppConfig {
    /// Load config: user file (if exists) replaces the built-in defaults.
    pub fn load() -> Result<Self, CoreError> {
        let user_path = Self::config_path();
        if user_path.exists() {
            Self::load_from(&user_path)
        } else {
            Self::from_toml(DEFAULT_CONFIG)
        }
    }

    /// Load config from an explicit file.
    pub fn load_from(path: &Path) -> Result<Self, CoreError> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| CoreError::Config(format!("{}: {e}", path.display())))?;
        Self::from_toml(&content)
    }

    pub fn from_toml(toml_str: &str) -> Result<Self, CoreError> {
        toml::from_str(toml_str).map_err(|e| CoreError::Config(e.to_string()))
    }

    /// Path to user config file (XDG on Linux, AppData on Windows).
    pub fn config_path() -> PathBuf {
        ProjectDirs::from("", "", "aniflix")
            .map(|d| d.config_dir().join("config.toml"))
            .unwrap_or_else(|| PathBuf::from("config.toml"))
    }

    /// Built-in denylist plus the configured extras.
    pub fn denylist(&self) -> DenylistPolicy {
        DenylistPolicy::default().extended(&self.policy.denylist)
    }

    /// Embedded catalog, merged with the configured user catalog.
    pub fn local_catalog(&self) -> Result<LocalCatalog, CoreError> {
        let mut catalog = LocalCatalog::embedded();
        if let Some(path) = &self.catalog.path {
            tracing::debug!(path = %path.display(), "Merging user catalog");
            catalog.merge_user(LocalCatalog::from_path(path)?);
        }
        Ok(catalog)
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        toml::from_str(DEFAULT_CONFIG).expect("built-in default config is valid TOML")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_parses() {
        let config = AppConfig::default();
        assert_eq!(config.http.request_timeout_secs, 8);
        assert_eq!(config.http.timeout(), Duration::from_secs(8));
        assert_eq!(config.metadata.url, "https://graphql.anilist.co");
        let ids: Vec<&str> = config.providers.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, ["gogoanime", "zoro", "9anime", "animepahe"]);
        assert_eq!(config.fallback.audio, ["sub", "dub"]);
        assert_eq!(config.fallback.season, 1);
        assert!(config.catalog.path.is_none());
    }

    #[test]
    fn test_embed_template() {
        let config = AppConfig::default();
        assert_eq!(
            config.embed.url("one-piece", 12),
            "https://vidstreaming.io/streaming.php?id=one-piece&episode=12"
        );
    }

    #[test]
    fn test_denylist_extends_builtin() {
        let mut config = AppConfig::default();
        config.policy.denylist = vec!["blocked.test".into()];
        let policy = config.denylist();
        assert!(!policy.is_allowed("https://cdn.blocked.test/a.mp4"));
        assert!(!policy.is_allowed("https://familynonstop.com/a"));
        assert!(policy.is_allowed("https://cdn.test/a.mp4"));
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        let content = DEFAULT_CONFIG.replace("request_timeout_secs = 8", "request_timeout_secs = 2");
        std::fs::write(&path, content).unwrap();

        let config = AppConfig::load_from(&path).unwrap();
        assert_eq!(config.http.request_timeout_secs, 2);
    }

    #[test]
    fn test_invalid_config() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[server]\nbind = 1\n").unwrap();
        assert!(matches!(AppConfig::load_from(&path), Err(CoreError::Config(_))));

        let missing = dir.path().join("missing.toml");
        assert!(matches!(AppConfig::load_from(&missing), Err(CoreError::Config(_))));
    }

    #[test]
    fn test_user_catalog_merges() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("catalog.toml");
        std::fs::write(
            &path,
            r#"
            [[anime]]
            id = "demo"
            title = "Demo"

            [[anime.episodes]]
            id = "demo-1"
            episode_number = 1
            title = "Pilot"
            video_url = "https://media.test/demo1.mp4"
            "#,
        )
        .unwrap();

        let mut config = AppConfig::default();
        config.catalog.path = Some(path);
        let catalog = config.local_catalog().unwrap();
        assert!(catalog.episode("demo", "demo-1").is_some());
        assert!(catalog.episode("sintel", "sintel-1").is_some());
    }
}
