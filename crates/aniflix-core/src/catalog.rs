use std::path::Path;

use serde::Deserialize;

use crate::error::CoreError;
use crate::models::{CatalogAnime, CatalogEpisode};

/// Embedded catalog of curated titles.
const EMBEDDED_CATALOG: &str = include_str!("../data/catalog.toml");

/// Wrapper for TOML deserialization.
#[derive(Debug, Deserialize)]
struct CatalogFile {
    #[serde(rename = "anime", default)]
    anime: Vec<CatalogAnime>,
}

/// Read-only lookup of curated anime by id.
#[derive(Debug, Clone, Default)]
pub struct LocalCatalog {
    anime: Vec<CatalogAnime>,
}

impl LocalCatalog {
    /// Load the embedded catalog.
    pub fn embedded() -> Self {
        Self::from_toml(EMBEDDED_CATALOG).expect("embedded catalog.toml should be valid")
    }

    /// Load a catalog from a TOML string.
    pub fn from_toml(toml_str: &str) -> Result<Self, CoreError> {
        let file: CatalogFile =
            toml::from_str(toml_str).map_err(|e| CoreError::Catalog(e.to_string()))?;
        Ok(Self { anime: file.anime })
    }

    /// Load a catalog file from disk.
    pub fn from_path(path: &Path) -> Result<Self, CoreError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    pub fn from_entries(anime: Vec<CatalogAnime>) -> Self {
        Self { anime }
    }

    /// Merge a user catalog into this one.
    /// Entries with matching ids are replaced; new entries are appended.
    pub fn merge_user(&mut self, user: LocalCatalog) {
        for entry in user.anime {
            if let Some(pos) = self.anime.iter().position(|a| a.id == entry.id) {
                self.anime[pos] = entry;
            } else {
                self.anime.push(entry);
            }
        }
    }

    pub fn get(&self, anime_id: &str) -> Option<&CatalogAnime> {
        self.anime.iter().find(|a| a.id == anime_id)
    }

    /// Find a curated episode.
    pub fn episode(&self, anime_id: &str, episode_id: &str) -> Option<(&CatalogAnime, &CatalogEpisode)> {
        let anime = self.get(anime_id)?;
        anime.episode(episode_id).map(|ep| (anime, ep))
    }

    pub fn len(&self) -> usize {
        self.anime.len()
    }

    pub fn is_empty(&self) -> bool {
        self.anime.is_empty()
    }
}
