use serde::{Deserialize, Serialize};

/// A playable source chosen by the resolution pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedSource {
    pub url: String,
    pub quality: String,
    #[serde(rename = "isM3U8", default)]
    pub is_m3u8: bool,
}

impl ResolvedSource {
    /// Source for a URL found by the resolver; HLS is detected from the URL.
    pub fn from_url(url: impl Into<String>) -> Self {
        let url = url.into();
        let is_m3u8 = url.contains(".m3u8");
        Self {
            url,
            quality: "default".into(),
            is_m3u8,
        }
    }

    /// Source for a curated catalog URL, never flagged as HLS.
    pub fn curated(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            quality: "default".into(),
            is_m3u8: false,
        }
    }
}

/// Body of `GET /episode/{animeId}/{episodeId}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EpisodeResponse {
    pub id: String,
    pub title: String,
    pub episode_title: String,
    #[serde(default)]
    pub iframe: String,
    #[serde(default)]
    pub sources: Vec<ResolvedSource>,
}

impl EpisodeResponse {
    /// Response carrying a single source, echoed in `iframe`.
    pub fn with_source(id: impl Into<String>, title: impl Into<String>, source: ResolvedSource) -> Self {
        let title = title.into();
        Self {
            id: id.into(),
            episode_title: title.clone(),
            title,
            iframe: source.url.clone(),
            sources: vec![source],
        }
    }

    /// Explicit "no source found" response.
    pub fn empty(id: impl Into<String>, title: impl Into<String>) -> Self {
        let title = title.into();
        Self {
            id: id.into(),
            episode_title: title.clone(),
            title,
            iframe: String::new(),
            sources: Vec::new(),
        }
    }

    pub fn has_source(&self) -> bool {
        !self.sources.is_empty() || !self.iframe.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serialize_wire_names() {
        let resp = EpisodeResponse::with_source(
            "21-3",
            "Episode 3",
            ResolvedSource::from_url("https://cdn.test/hls/master.m3u8"),
        );
        let json = serde_json::to_value(&resp).unwrap();
        assert_eq!(json["episodeTitle"], "Episode 3");
        assert_eq!(json["iframe"], "https://cdn.test/hls/master.m3u8");
        assert_eq!(json["sources"][0]["isM3U8"], true);
        assert_eq!(json["sources"][0]["quality"], "default");
    }

    #[test]
    fn test_empty_response() {
        let resp = EpisodeResponse::empty("21-3", "Episode 3");
        assert!(!resp.has_source());
        let json = serde_json::to_value(&resp).unwrap();
        assert_eq!(json["iframe"], "");
        assert_eq!(json["sources"].as_array().map(Vec::len), Some(0));
    }
}
