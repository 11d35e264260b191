//! Embed safety policy for candidate video URLs.
//!
//! A URL is embeddable when it is an absolute `http(s)` URL and contains none
//! of the denylisted fragments. Matching is substring containment on the
//! lower-cased URL, so CDN mirrors and query parameters that mention a blocked
//! host are rejected as well.

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

/// Fragments of hosts known to refuse framing.
pub const DEFAULT_DENYLIST: &[&str] = &[
    "familynonstop.com",
    "familynonstop",
    "www.familynonstop.com",
    "http://familynonstop",
    "https://familynonstop",
    "example.com",
    "localhost",
];

static RE_VIDEO_EXTENSION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\.(mp4|webm|ogg|m3u8|mkv|avi|flv|mov|wmv)(\?|$)").unwrap()
});

static RE_VIDEO_FILE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\.(mp4|webm|m3u8)").unwrap());

/// Immutable set of denylisted URL fragments.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<String>", into = "Vec<String>")]
pub struct DenylistPolicy {
    fragments: Vec<String>,
}

impl DenylistPolicy {
    pub fn new<I, S>(fragments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut out: Vec<String> = Vec::new();
        for f in fragments {
            let f = f.as_ref().trim().to_lowercase();
            if !f.is_empty() && !out.contains(&f) {
                out.push(f);
            }
        }
        Self { fragments: out }
    }

    /// Return a policy with `extra` fragments appended.
    pub fn extended<I, S>(&self, extra: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let extra: Vec<String> = extra.into_iter().map(|s| s.as_ref().to_string()).collect();
        Self::new(self.fragments.iter().map(String::as_str).chain(extra.iter().map(String::as_str)))
    }

    pub fn fragments(&self) -> &[String] {
        &self.fragments
    }

    /// Whether any denylisted fragment occurs in `url`, ignoring case.
    pub fn is_denied(&self, url: &str) -> bool {
        let lower = url.to_lowercase();
        self.fragments.iter().any(|f| lower.contains(f.as_str()))
    }

    /// Whether `url` may be handed to a player.
    pub fn is_allowed(&self, url: &str) -> bool {
        if url.is_empty() {
            return false;
        }
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            return false;
        }
        !self.is_denied(url)
    }

    /// [`is_allowed`](Self::is_allowed) for values that may be missing.
    pub fn allows(&self, url: Option<&str>) -> bool {
        url.is_some_and(|u| self.is_allowed(u))
    }
}

impl Default for DenylistPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_DENYLIST.iter().copied())
    }
}

impl From<Vec<String>> for DenylistPolicy {
    fn from(v: Vec<String>) -> Self {
        Self::new(v)
    }
}

impl From<DenylistPolicy> for Vec<String> {
    fn from(p: DenylistPolicy) -> Self {
        p.fragments
    }
}

/// Heuristic for URLs that serve media directly rather than an HTML page.
///
/// Matches a known video extension right before the query string or end, or
/// the markers `video`, `stream` and `cdn` anywhere.
pub fn looks_like_direct_video(url: &str) -> bool {
    if url.is_empty() {
        return false;
    }
    RE_VIDEO_EXTENSION.is_match(url)
        || url.contains("video")
        || url.contains("stream")
        || url.contains("cdn")
}

/// Whether `url` names a video file anywhere in it.
pub fn looks_like_video_file(url: &str) -> bool {
    RE_VIDEO_FILE.is_match(url)
}

/// Local object or inline URLs the browser can always play natively.
pub fn is_local_media(url: &str) -> bool {
    url.starts_with("blob:") || url.starts_with("data:")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_empty_and_missing() {
        let policy = DenylistPolicy::default();
        assert!(!policy.is_allowed(""));
        assert!(!policy.allows(None));
    }

    #[test]
    fn test_rejects_non_http_schemes() {
        let policy = DenylistPolicy::new(Vec::<String>::new());
        assert!(!policy.is_allowed("ftp://cdn.test/a.mp4"));
        assert!(!policy.is_allowed("//cdn.test/a.mp4"));
        assert!(!policy.is_allowed("blob:https://cdn.test/uuid"));
        assert!(!policy.is_allowed("HTTPS://cdn.test/a.mp4"));
        assert!(policy.is_allowed("http://cdn.test/a.mp4"));
        assert!(policy.is_allowed("https://cdn.test/a.mp4"));
    }

    #[test]
    fn test_denylist_any_case_any_position() {
        let policy = DenylistPolicy::default();
        for url in [
            "https://familynonstop.com/embed/1",
            "https://FamilyNonStop.com/embed/1",
            "https://mirror.cdn.test/FAMILYNONSTOP/ep1.mp4",
            "https://player.test/watch?src=familynonstop.com%2Fep1",
            "http://localhost:3000/video.mp4",
            "https://www.example.com/a.mp4",
        ] {
            assert!(!policy.is_allowed(url), "{url} should be denied");
        }
        assert!(policy.is_allowed("https://cdn.test/ep1.mp4"));
    }

    #[test]
    fn test_denylist_is_growable() {
        let policy = DenylistPolicy::default().extended(["BadHost.tv"]);
        assert!(!policy.is_allowed("https://cdn.badhost.tv/ep1.mp4"));
        assert!(!policy.is_allowed("https://familynonstop.com/"));
        assert_eq!(
            policy.fragments().len(),
            DEFAULT_DENYLIST.len() + 1,
            "fragments are deduplicated and lower-cased"
        );
    }

    #[test]
    fn test_direct_video_heuristic() {
        assert!(looks_like_direct_video("https://host.test/ep1.mp4"));
        assert!(looks_like_direct_video("https://host.test/ep1.MKV?token=abc"));
        assert!(looks_like_direct_video("https://host.test/master.m3u8"));
        assert!(looks_like_direct_video("https://host.test/embed/cdn/1"));
        assert!(looks_like_direct_video("https://streamhost.test/e/1"));
        assert!(!looks_like_direct_video("https://host.test/embed/1"));
        assert!(!looks_like_direct_video("https://host.test/ep1.mp4.html"));
        assert!(!looks_like_direct_video(""));
    }

    #[test]
    fn test_video_file_probe() {
        assert!(looks_like_video_file("https://host.test/ep1.MP4"));
        assert!(looks_like_video_file("https://host.test/a.m3u8/sub"));
        assert!(!looks_like_video_file("https://host.test/en.vtt"));
    }

    #[test]
    fn test_filter_is_idempotent() {
        let policy = DenylistPolicy::default();
        let url = "https://cdn.test/naruto/ep1.mp4?src=familynonstop";
        assert_eq!(policy.is_allowed(url), policy.is_allowed(url));
        assert_eq!(looks_like_direct_video(url), looks_like_direct_video(url));
    }

    #[test]
    fn test_serde_as_list() {
        let policy: DenylistPolicy = serde_json::from_str(r#"["Foo.com", "foo.com", ""]"#).unwrap();
        assert_eq!(policy.fragments(), ["foo.com".to_string()]);
    }
}
