//! Episode identifiers and matching against provider episode lists.

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;

static RE_EXTERNAL_EPISODE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d+)-(\d+)$").unwrap());

/// An episode request as it arrives from the storefront.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EpisodeReference {
    pub anime_id: String,
    pub episode_id: String,
}

impl EpisodeReference {
    pub fn new(anime_id: impl Into<String>, episode_id: impl Into<String>) -> Self {
        Self {
            anime_id: anime_id.into(),
            episode_id: episode_id.into(),
        }
    }

    /// Decode `{animeId}-{episodeNumber}` for metadata-provider anime.
    ///
    /// Returns `None` unless the id has that shape, its anime part equals
    /// `anime_id`, and both parts fit their numeric types.
    pub fn external(&self) -> Option<ExternalEpisode> {
        let caps = RE_EXTERNAL_EPISODE.captures(&self.episode_id)?;
        let anime_part = caps.get(1)?.as_str();
        if anime_part != self.anime_id {
            return None;
        }
        Some(ExternalEpisode {
            anime_id: anime_part.parse().ok()?,
            number: caps.get(2)?.as_str().parse().ok()?,
        })
    }
}

impl fmt::Display for EpisodeReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.anime_id, self.episode_id)
    }
}

/// A validated reference to an episode of a metadata-provider anime.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExternalEpisode {
    pub anime_id: u64,
    pub number: u32,
}

// ── Provider episodes ─────────────────────────────────────────────────

/// The loosely typed `number` field of a provider episode.
#[derive(Debug, Clone, PartialEq)]
pub enum EpisodeNumber {
    Int(i64),
    Float(f64),
    Text(String),
    Unknown,
}

impl EpisodeNumber {
    pub fn from_json(value: Option<&Value>) -> Self {
        match value {
            Some(Value::Number(n)) => match n.as_i64() {
                Some(i) => Self::Int(i),
                None => n.as_f64().map_or(Self::Unknown, Self::Float),
            },
            Some(Value::String(s)) => Self::Text(s.clone()),
            _ => Self::Unknown,
        }
    }

    fn equals(&self, target: u32) -> bool {
        match self {
            Self::Int(i) => *i == i64::from(target),
            Self::Float(f) => *f == f64::from(target),
            _ => false,
        }
    }

    /// Leading-integer parse of a textual number (`"12"`, `" 12.5"`, `"12 END"`).
    fn coerces_to(&self, target: u32) -> bool {
        match self {
            Self::Text(s) => leading_int(s) == Some(i64::from(target)),
            Self::Float(f) => f.trunc() == f64::from(target),
            _ => false,
        }
    }

    fn string_equals(&self, target: u32) -> bool {
        let target = target.to_string();
        match self {
            Self::Int(i) => i.to_string() == target,
            Self::Float(f) => f.to_string() == target,
            Self::Text(s) => *s == target,
            Self::Unknown => false,
        }
    }
}

fn leading_int(s: &str) -> Option<i64> {
    let s = s.trim_start();
    let (sign, digits) = match s.strip_prefix('-') {
        Some(rest) => (-1, rest),
        None => (1, s.strip_prefix('+').unwrap_or(s)),
    };
    let end = digits
        .char_indices()
        .find(|(_, c)| !c.is_ascii_digit())
        .map_or(digits.len(), |(i, _)| i);
    digits[..end].parse::<i64>().ok().map(|n| sign * n)
}

/// One entry of a provider's episode list.
#[derive(Debug, Clone, PartialEq)]
pub struct ProviderEpisode {
    /// `id`, else `episodeId`; entries without either cannot be streamed.
    pub episode_id: Option<String>,
    pub number: EpisodeNumber,
    pub title: Option<String>,
}

impl ProviderEpisode {
    pub fn from_json(value: &Value) -> Self {
        let obj = value.as_object();
        let field = |key: &str| obj.and_then(|o| o.get(key)).filter(|v| !v.is_null());

        let episode_id = ["id", "episodeId"].iter().find_map(|k| match field(*k) {
            Some(Value::String(s)) if !s.is_empty() => Some(s.clone()),
            Some(Value::Number(n)) => Some(n.to_string()),
            _ => None,
        });
        let number = ["number", "episodeNumber", "episode"]
            .iter()
            .find_map(|k| field(*k).filter(|v| is_truthy(v)))
            .map_or(EpisodeNumber::Unknown, |v| EpisodeNumber::from_json(Some(v)));
        let title = field("title")
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
            .map(str::to_string);

        Self {
            episode_id,
            number,
            title,
        }
    }
}

fn is_truthy(v: &Value) -> bool {
    match v {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        _ => true,
    }
}

/// How an episode was located in a provider's list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EpisodeMatch {
    Exact(usize),
    Coerced(usize),
    StringEqual(usize),
    /// Positional fallback, assuming a 1-indexed list (`episodes[n - 1]`).
    OneIndexed(usize),
    /// Positional fallback, assuming a 0-indexed list (`episodes[n]`).
    ZeroIndexed(usize),
}

impl EpisodeMatch {
    pub fn index(self) -> usize {
        match self {
            Self::Exact(i)
            | Self::Coerced(i)
            | Self::StringEqual(i)
            | Self::OneIndexed(i)
            | Self::ZeroIndexed(i) => i,
        }
    }
}

/// Locate episode `target` in a provider list.
///
/// For each entry, exact equality, numeric coercion and string equality are
/// tried in that order; the first entry satisfying any of them wins. When no
/// entry carries a matching number and the list holds at least `target`
/// entries, position `target - 1` is used, then position `target`.
///
/// The positional step guesses at provider indexing conventions and has not
/// been verified against every provider.
pub fn match_episode(episodes: &[ProviderEpisode], target: u32) -> Option<EpisodeMatch> {
    let by_number = episodes.iter().enumerate().find_map(|(i, ep)| {
        if ep.number.equals(target) {
            Some(EpisodeMatch::Exact(i))
        } else if ep.number.coerces_to(target) {
            Some(EpisodeMatch::Coerced(i))
        } else if ep.number.string_equals(target) {
            Some(EpisodeMatch::StringEqual(i))
        } else {
            None
        }
    });
    if by_number.is_some() {
        return by_number;
    }

    let n = target as usize;
    if n == 0 || episodes.len() < n {
        return None;
    }
    if episodes.get(n - 1).is_some() {
        return Some(EpisodeMatch::OneIndexed(n - 1));
    }
    // Unreachable while `len >= n` holds above; kept for the zero-indexed rule.
    episodes.get(n).map(|_| EpisodeMatch::ZeroIndexed(n))
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn episodes(values: Value) -> Vec<ProviderEpisode> {
        values
            .as_array()
            .unwrap()
            .iter()
            .map(ProviderEpisode::from_json)
            .collect()
    }

    #[test]
    fn test_external_episode_id() {
        let ep = EpisodeReference::new("21", "21-1087").external().unwrap();
        assert_eq!(ep.anime_id, 21);
        assert_eq!(ep.number, 1087);

        assert_eq!(EpisodeReference::new("21", "20-3").external(), None);
        assert_eq!(EpisodeReference::new("21", "21-x").external(), None);
        assert_eq!(EpisodeReference::new("naruto", "naruto-1").external(), None);
        assert_eq!(EpisodeReference::new("21", "21-3-1").external(), None);
    }

    #[test]
    fn test_mixed_number_types() {
        let eps = episodes(json!([
            { "id": "a", "number": "1" },
            { "id": "b", "number": 2 },
            { "id": "c", "number": 3 }
        ]));
        assert_eq!(match_episode(&eps, 1), Some(EpisodeMatch::Coerced(0)));
        assert_eq!(match_episode(&eps, 2), Some(EpisodeMatch::Exact(1)));
        assert_eq!(match_episode(&eps, 3), Some(EpisodeMatch::Exact(2)));
    }

    #[test]
    fn test_positional_fallback_one_indexed() {
        let eps = episodes(json!([
            { "id": "e0" }, { "id": "e1" }, { "id": "e2" }, { "id": "e3" }, { "id": "e4" }
        ]));
        assert_eq!(match_episode(&eps, 3), Some(EpisodeMatch::OneIndexed(2)));
        assert_eq!(eps[2].episode_id.as_deref(), Some("e2"));
        assert_eq!(match_episode(&eps, 6), None);
        assert_eq!(match_episode(&eps, 0), None);
    }

    #[test]
    fn test_number_aliases_and_ids() {
        let eps = episodes(json!([
            { "episodeId": "x-1", "episodeNumber": 1, "title": "Start" },
            { "id": 77, "episode": "2" },
            { "number": 0, "episode": 3, "id": "x-3" }
        ]));
        assert_eq!(eps[0].episode_id.as_deref(), Some("x-1"));
        assert_eq!(eps[0].title.as_deref(), Some("Start"));
        assert_eq!(eps[1].episode_id.as_deref(), Some("77"));
        assert_eq!(eps[1].number, EpisodeNumber::Text("2".into()));
        // A zero `number` falls through to the next alias.
        assert_eq!(eps[2].number, EpisodeNumber::Int(3));
    }

    #[test]
    fn test_coercion_rules() {
        let eps = episodes(json!([
            { "id": "a", "number": "12 END" },
            { "id": "b", "number": 13.5 },
            { "id": "c", "number": true }
        ]));
        assert_eq!(match_episode(&eps, 12), Some(EpisodeMatch::Coerced(0)));
        assert_eq!(match_episode(&eps, 13), Some(EpisodeMatch::Coerced(1)));
        assert_eq!(eps[2].number, EpisodeNumber::Unknown);
    }

    #[test]
    fn test_number_beats_position() {
        let eps = episodes(json!([
            { "id": "s2", "number": 2 },
            { "id": "s1", "number": 1 }
        ]));
        assert_eq!(match_episode(&eps, 1), Some(EpisodeMatch::Exact(1)));
    }

    #[test]
    fn test_leading_int() {
        assert_eq!(leading_int("42"), Some(42));
        assert_eq!(leading_int("  7abc"), Some(7));
        assert_eq!(leading_int("-3"), Some(-3));
        assert_eq!(leading_int("abc"), None);
        assert_eq!(leading_int(""), None);
    }
}
