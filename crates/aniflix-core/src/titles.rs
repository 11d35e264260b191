//! Title variants used to search providers that share no id space with the
//! metadata provider.

use std::sync::LazyLock;

use regex::Regex;
use unicode_normalization::UnicodeNormalization;

use crate::models::AnimeTitle;

/// Season/part/format markers, and everything after them.
static RE_RELEASE_SUFFIX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\s*\b(Season|S\d+|Part|Movie|OVA|ONA)\b.*$").unwrap()
});

static RE_NON_SLUG: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[^a-z0-9]+").unwrap());

/// Ordered, de-duplicated search titles.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TitleVariants(Vec<String>);

impl TitleVariants {
    /// English, romaji, native, then the suffix-stripped English and romaji.
    ///
    /// Empty titles are skipped and duplicates (compared after NFKC and case
    /// folding) keep their first position.
    pub fn from_title(title: &AnimeTitle) -> Self {
        let full = [&title.english, &title.romaji, &title.native];
        let stripped: Vec<String> = full[..2]
            .iter()
            .filter_map(|t| t.as_deref())
            .map(strip_release_suffix)
            .collect();

        let candidates = full
            .iter()
            .filter_map(|t| t.as_deref())
            .map(str::to_string)
            .chain(stripped);

        Self::from_candidates(candidates)
    }

    pub fn from_candidates<I>(candidates: I) -> Self
    where
        I: IntoIterator<Item = String>,
    {
        let mut seen: Vec<String> = Vec::new();
        let mut out = Vec::new();
        for candidate in candidates {
            let candidate = candidate.trim().to_string();
            if candidate.is_empty() {
                continue;
            }
            let key = fold(&candidate);
            if seen.contains(&key) {
                continue;
            }
            seen.push(key);
            out.push(candidate);
        }
        Self(out)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_slice(&self) -> &[String] {
        &self.0
    }
}

/// NFKC + lowercase, the first level of title normalization.
fn fold(s: &str) -> String {
    s.nfkc().collect::<String>().to_lowercase()
}

/// Drop a trailing "Season 2", "Part 2", "S2", "Movie", "OVA", "ONA" marker.
pub fn strip_release_suffix(title: &str) -> String {
    RE_RELEASE_SUFFIX.replace(title, "").trim().to_string()
}

/// URL slug: lowercase, non-alphanumeric runs collapsed to `-`, no edge dashes.
pub fn slugify(title: &str) -> String {
    let lower = title.to_lowercase();
    RE_NON_SLUG
        .replace_all(&lower, "-")
        .trim_matches('-')
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn title(english: Option<&str>, romaji: Option<&str>, native: Option<&str>) -> AnimeTitle {
        AnimeTitle {
            english: english.map(Into::into),
            romaji: romaji.map(Into::into),
            native: native.map(Into::into),
        }
    }

    #[test]
    fn test_variant_order() {
        let variants = TitleVariants::from_title(&title(
            Some("Attack on Titan Season 3 Part 2"),
            Some("Shingeki no Kyojin Season 3 Part 2"),
            Some("進撃の巨人"),
        ));
        assert_eq!(
            variants.as_slice(),
            [
                "Attack on Titan Season 3 Part 2",
                "Shingeki no Kyojin Season 3 Part 2",
                "進撃の巨人",
                "Attack on Titan",
                "Shingeki no Kyojin",
            ]
        );
    }

    #[test]
    fn test_skips_empty_and_duplicates() {
        let variants = TitleVariants::from_title(&title(
            Some("Frieren"),
            Some("FRIEREN"),
            Some(""),
        ));
        assert_eq!(variants.as_slice(), ["Frieren"]);

        let variants = TitleVariants::from_title(&title(None, None, None));
        assert!(variants.is_empty());
    }

    #[test]
    fn test_fullwidth_duplicates_fold() {
        let variants = TitleVariants::from_candidates(vec!["ＯＮＥ ＰＩＥＣＥ".into(), "One Piece".into()]);
        assert_eq!(variants.len(), 1);
    }

    #[test]
    fn test_strip_release_suffix() {
        assert_eq!(strip_release_suffix("Mob Psycho 100 S2"), "Mob Psycho 100");
        assert_eq!(strip_release_suffix("Made in Abyss Movie 3"), "Made in Abyss");
        assert_eq!(strip_release_suffix("Detective Conan"), "Detective Conan");
        assert_eq!(strip_release_suffix("Spartacus"), "Spartacus");
        assert_eq!(strip_release_suffix("Season"), "");
    }

    #[test]
    fn test_slugify() {
        assert_eq!(slugify("Frieren: Beyond Journey's End"), "frieren-beyond-journey-s-end");
        assert_eq!(slugify("  --Naruto--  "), "naruto");
        assert_eq!(slugify("進撃の巨人"), "");
    }
}
