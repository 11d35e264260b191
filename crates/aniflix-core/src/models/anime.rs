use serde::{Deserialize, Serialize};

/// A single title with language variants.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AnimeTitle {
    pub romaji: Option<String>,
    pub english: Option<String>,
    pub native: Option<String>,
}

impl AnimeTitle {
    /// Best available display title, English first.
    pub fn preferred(&self) -> Option<&str> {
        [&self.english, &self.romaji, &self.native]
            .into_iter()
            .filter_map(|t| t.as_deref())
            .find(|t| !t.trim().is_empty())
    }
}

/// Anime metadata as returned by the primary metadata provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnimeMetadata {
    pub id: u64,
    pub title: AnimeTitle,
    /// Total episode count. Unknown counts are treated as zero when validating.
    pub episodes: Option<u32>,
    pub genres: Vec<String>,
    pub status: Option<String>,
    pub format: Option<String>,
}

impl AnimeMetadata {
    /// Whether `episode` lies in `1..=episodes`.
    pub fn has_episode(&self, episode: u32) -> bool {
        episode > 0 && episode <= self.episodes.unwrap_or(0)
    }
}

/// A curated anime entry from the local catalog.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogAnime {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub episodes: Vec<CatalogEpisode>,
}

impl CatalogAnime {
    pub fn episode(&self, episode_id: &str) -> Option<&CatalogEpisode> {
        self.episodes.iter().find(|e| e.id == episode_id)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogEpisode {
    pub id: String,
    pub episode_number: u32,
    pub title: String,
    pub video_url: String,
}
