//! Locale negotiation
//!
//! First acceptable candidate wins: query parameter, cookie, `Accept-Language`,
//! then the server default.

use regex::Regex;
use std::sync::LazyLock;

static LANGUAGE_TAG: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z]{2,3}([-_][A-Za-z0-9]{2,8})*$").expect("language tag pattern is valid")
});

const FALLBACK_LANGUAGE: &str = "en";

/// Locale candidates carried by a request
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LocaleHints {
    /// `?lang=` query parameter
    pub query: Option<String>,
    /// Language cookie
    pub cookie: Option<String>,
    /// Raw `Accept-Language` header
    pub accept_language: Option<String>,
}

#[derive(Debug, Clone)]
pub struct LocaleNegotiator {
    default_language: String,
    supported: Vec<String>,
}

impl Default for LocaleNegotiator {
    fn default() -> Self {
        Self::new(FALLBACK_LANGUAGE, Vec::<String>::new())
    }
}

impl LocaleNegotiator {
    /// A malformed default falls back to `en`; an empty `supported` list accepts any well-formed tag
    pub fn new<I, S>(default_language: &str, supported: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let supported: Vec<String> = supported
            .into_iter()
            .filter_map(|tag| normalize(tag.as_ref()))
            .collect();
        let default_language =
            normalize(default_language).unwrap_or_else(|| FALLBACK_LANGUAGE.to_string());

        Self {
            default_language,
            supported,
        }
    }

    pub fn default_language(&self) -> &str {
        &self.default_language
    }

    /// Negotiated tag; never empty
    pub fn negotiate(&self, hints: &LocaleHints) -> String {
        let from_header = hints.accept_language.as_deref().and_then(first_accepted_tag);

        [hints.query.as_deref(), hints.cookie.as_deref(), from_header]
            .into_iter()
            .flatten()
            .find_map(|candidate| self.accept(candidate))
            .unwrap_or_else(|| self.default_language.clone())
    }

    fn accept(&self, candidate: &str) -> Option<String> {
        let tag = normalize(candidate)?;
        if self.supported.is_empty() || self.supported.contains(&tag) {
            Some(tag)
        } else {
            None
        }
    }

    /// Whether a tag is well formed (and supported, when a list is configured)
    pub fn is_acceptable(&self, candidate: &str) -> bool {
        self.accept(candidate).is_some()
    }
}

/// Whether `candidate` is a well-formed language tag
pub fn is_language_tag(candidate: &str) -> bool {
    normalize(candidate).is_some()
}

/// Lower case, `-` separated; `None` for blank or malformed input
fn normalize(candidate: &str) -> Option<String> {
    let candidate = candidate.trim();
    if !LANGUAGE_TAG.is_match(candidate) {
        return None;
    }
    Some(candidate.replace('_', "-").to_lowercase())
}

/// First tag of an `Accept-Language` value; quality weights are ignored
fn first_accepted_tag(header: &str) -> Option<&str> {
    header
        .split(',')
        .next()
        .and_then(|entry| entry.split(';').next())
        .map(str::trim)
        .filter(|tag| !tag.is_empty())
}
