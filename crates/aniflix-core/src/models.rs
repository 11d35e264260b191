mod anime;
mod source;

pub use anime::{AnimeMetadata, AnimeTitle, CatalogAnime, CatalogEpisode};
pub use source::{EpisodeResponse, ResolvedSource};
