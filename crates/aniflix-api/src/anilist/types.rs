use aniflix_core::models::{AnimeMetadata, AnimeTitle};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct GraphQLResponse<T> {
    pub data: Option<T>,
    #[serde(default)]
    pub errors: Vec<GraphQLError>,
}

#[derive(Debug, Deserialize)]
pub struct GraphQLError {
    pub message: String,
    pub status: Option<u16>,
}

#[derive(Debug, Deserialize)]
pub struct MediaResponse {
    #[serde(rename = "Media")]
    pub media: Option<AniListMedia>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AniListMedia {
    pub id: u64,
    pub title: AniListTitle,
    pub episodes: Option<u32>,
    #[serde(default)]
    pub genres: Option<Vec<String>>,
    pub status: Option<String>,
    pub format: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AniListTitle {
    pub romaji: Option<String>,
    pub english: Option<String>,
    pub native: Option<String>,
}

impl AniListMedia {
    pub fn into_metadata(self) -> AnimeMetadata {
        AnimeMetadata {
            id: self.id,
            title: AnimeTitle {
                romaji: self.title.romaji,
                english: self.title.english,
                native: self.title.native,
            },
            episodes: self.episodes,
            genres: self.genres.unwrap_or_default(),
            status: self.status,
            format: self.format,
        }
    }
}
