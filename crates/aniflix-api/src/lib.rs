pub mod anilist;
pub mod episode_client;
pub mod error;
pub mod fallback;
mod http;
pub mod streaming;
pub mod traits;

pub use anilist::{AniListClient, AniListError};
pub use episode_client::{EpisodeClient, FetchError};
pub use error::ProviderError;
pub use fallback::FallbackClient;
pub use http::build_client;
pub use streaming::DescriptorProvider;
pub use traits::{FallbackSource, MetadataProvider, ProviderSearchResult, StreamingProvider};
