//! Candidate URL extraction from provider stream payloads.
//!
//! Providers answer the watch endpoint with loosely shaped JSON. The payload
//! is first read into [`StreamPayload`], keeping only fields whose shape is
//! recognized, then a fixed sequence of probes picks the first embeddable URL.

use serde::Deserialize;
use serde_json::{Map, Value};

use crate::policy::{looks_like_direct_video, looks_like_video_file, DenylistPolicy};

// ── Payload model ─────────────────────────────────────────────────────

/// One entry of a payload's `sources` array.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SourceEntry {
    /// First non-empty of `url`, `file`, `src`.
    pub url: Option<String>,
    pub is_m3u8: bool,
}

/// Known shapes of an episode stream payload.
///
/// Fields holding an unexpected JSON type are dropped and their names are
/// recorded in `unrecognized`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(from = "Value")]
pub struct StreamPayload {
    pub sources: Vec<SourceEntry>,
    pub iframe: Option<String>,
    pub url: Option<String>,
    pub referer: Option<String>,
    pub download: Option<String>,
    pub subtitle_urls: Vec<String>,
    pub link_urls: Vec<String>,
    pub data_url: Option<String>,
    pub result_url: Option<String>,
    pub unrecognized: Vec<String>,
}

impl StreamPayload {
    pub fn from_json(value: &Value) -> Self {
        let mut payload = StreamPayload::default();
        let Some(obj) = value.as_object() else {
            payload.unrecognized.push("<root>".into());
            return payload;
        };

        for (key, field) in obj {
            if field.is_null() {
                continue;
            }
            let recognized = match key.as_str() {
                "sources" => field.as_array().map(|items| {
                    payload.sources = items.iter().filter_map(source_entry).collect();
                }),
                "iframe" => field.as_str().map(|s| payload.iframe = non_empty(s)),
                "url" => field.as_str().map(|s| payload.url = non_empty(s)),
                "download" => field.as_str().map(|s| payload.download = non_empty(s)),
                "headers" => field.as_object().map(|h| {
                    payload.referer = h.get("Referer").and_then(Value::as_str).and_then(non_empty);
                }),
                "subtitles" => field
                    .as_array()
                    .map(|items| payload.subtitle_urls = nested_urls(items)),
                "links" => field
                    .as_array()
                    .map(|items| payload.link_urls = nested_urls(items)),
                "data" => field
                    .as_object()
                    .map(|o| payload.data_url = str_field(o, "url")),
                "result" => field
                    .as_object()
                    .map(|o| payload.result_url = str_field(o, "url")),
                _ => Some(()),
            };
            if recognized.is_none() {
                payload.unrecognized.push(key.clone());
            }
        }

        payload
    }

    /// Whether a fallback service answered with anything resembling a source.
    pub fn has_any_source(&self) -> bool {
        self.iframe.is_some() || self.url.is_some() || !self.sources.is_empty()
    }
}

impl From<Value> for StreamPayload {
    fn from(value: Value) -> Self {
        Self::from_json(&value)
    }
}

fn non_empty(s: &str) -> Option<String> {
    if s.is_empty() {
        None
    } else {
        Some(s.to_string())
    }
}

fn str_field(obj: &Map<String, Value>, key: &str) -> Option<String> {
    obj.get(key).and_then(Value::as_str).and_then(non_empty)
}

fn source_entry(item: &Value) -> Option<SourceEntry> {
    let obj = item.as_object()?;
    let url = ["url", "file", "src"]
        .iter()
        .find_map(|k| str_field(obj, k));
    let is_m3u8 = obj.get("isM3U8").and_then(Value::as_bool).unwrap_or(false);
    Some(SourceEntry { url, is_m3u8 })
}

fn nested_urls(items: &[Value]) -> Vec<String> {
    items
        .iter()
        .filter_map(|i| i.as_object().and_then(|o| str_field(o, "url")))
        .collect()
}

// ── Probes ────────────────────────────────────────────────────────────

/// Payload location a URL was taken from, in precedence order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProbeStep {
    Sources,
    Iframe,
    Url,
    Referer,
    Download,
    Subtitles,
    Links,
    DataUrl,
    ResultUrl,
}

impl ProbeStep {
    pub const ORDER: [ProbeStep; 9] = [
        Self::Sources,
        Self::Iframe,
        Self::Url,
        Self::Referer,
        Self::Download,
        Self::Subtitles,
        Self::Links,
        Self::DataUrl,
        Self::ResultUrl,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Sources => "sources",
            Self::Iframe => "iframe",
            Self::Url => "url",
            Self::Referer => "headers.Referer",
            Self::Download => "download",
            Self::Subtitles => "subtitles",
            Self::Links => "links",
            Self::DataUrl => "data.url",
            Self::ResultUrl => "result.url",
        }
    }

    /// Run this probe against `payload`.
    pub fn probe(self, payload: &StreamPayload, policy: &DenylistPolicy) -> Option<String> {
        match self {
            Self::Sources => probe_sources(payload, policy),
            Self::Iframe => allowed(payload.iframe.as_deref(), policy),
            Self::Url => allowed(payload.url.as_deref(), policy),
            Self::Referer => allowed(payload.referer.as_deref(), policy),
            Self::Download => allowed(payload.download.as_deref(), policy),
            Self::Subtitles => probe_subtitles(payload, policy),
            Self::Links => probe_links(payload, policy),
            Self::DataUrl => allowed(payload.data_url.as_deref(), policy),
            Self::ResultUrl => allowed(payload.result_url.as_deref(), policy),
        }
    }
}

fn allowed(url: Option<&str>, policy: &DenylistPolicy) -> Option<String> {
    url.filter(|u| policy.is_allowed(u)).map(str::to_string)
}

/// Filter `sources[]`, then prefer a direct video, then a non-HLS entry,
/// then the first survivor.
fn probe_sources(payload: &StreamPayload, policy: &DenylistPolicy) -> Option<String> {
    let survivors: Vec<(&str, bool)> = payload
        .sources
        .iter()
        .filter_map(|s| s.url.as_deref().map(|u| (u, s.is_m3u8)))
        .filter(|(u, _)| policy.is_allowed(u))
        .collect();

    survivors
        .iter()
        .find(|(u, _)| looks_like_direct_video(u))
        .or_else(|| survivors.iter().find(|(_, m3u8)| !m3u8))
        .or_else(|| survivors.first())
        .map(|(u, _)| u.to_string())
}

/// Subtitle endpoints sometimes carry the video itself; only the first
/// plausible entry is considered, and only if it names a video file.
fn probe_subtitles(payload: &StreamPayload, policy: &DenylistPolicy) -> Option<String> {
    payload
        .subtitle_urls
        .iter()
        .find(|u| u.contains("http") && policy.is_allowed(u))
        .filter(|u| looks_like_video_file(u))
        .cloned()
}

fn probe_links(payload: &StreamPayload, policy: &DenylistPolicy) -> Option<String> {
    payload
        .link_urls
        .iter()
        .find(|u| u.starts_with("http") && policy.is_allowed(u))
        .cloned()
}

// ── Extractor ─────────────────────────────────────────────────────────

/// Picks the best embeddable URL from a stream payload.
#[derive(Debug, Clone, Default)]
pub struct SourceExtractor {
    policy: DenylistPolicy,
}

impl SourceExtractor {
    pub fn new(policy: DenylistPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> &DenylistPolicy {
        &self.policy
    }

    /// First URL found in precedence order, together with the probe that found it.
    pub fn extract_with_step(&self, payload: &StreamPayload) -> Option<(ProbeStep, String)> {
        let (step, candidate) = ProbeStep::ORDER
            .iter()
            .find_map(|step| step.probe(payload, &self.policy).map(|u| (*step, u)))?;
        // The winner is checked again right before it leaves the extractor.
        self.policy.is_allowed(&candidate).then_some((step, candidate))
    }

    pub fn extract(&self, payload: &StreamPayload) -> Option<String> {
        self.extract_with_step(payload).map(|(_, url)| url)
    }

    /// Extraction rule for by-id fallback services: first allowed source
    /// entry, else `url`, else `iframe`.
    pub fn extract_fallback(&self, payload: &StreamPayload) -> Option<String> {
        if !payload.has_any_source() {
            return None;
        }
        let from_sources = payload
            .sources
            .iter()
            .filter_map(|s| s.url.as_deref())
            .find(|u| self.policy.is_allowed(u))
            .map(str::to_string);

        from_sources
            .or_else(|| {
                payload
                    .url
                    .as_deref()
                    .or(payload.iframe.as_deref())
                    .filter(|u| self.policy.is_allowed(u))
                    .map(str::to_string)
            })
            .filter(|u| self.policy.is_allowed(u))
    }
}
