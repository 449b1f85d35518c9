//! Query translation for the collaborators around the matching core.
//!
//! Converts a validated `SearchQuery` into:
//! - the `CandidateRequest` handed to a candidate source
//! - the cache key under which a finished search is stored

use clearmark_features::{normalize_compact, soundex};
use clearmark_model::SearchQuery;
use serde::{Deserialize, Serialize};

/// Default upper bound on candidate rows fetched per search.
pub const DEFAULT_CANDIDATE_LIMIT: usize = 200;

/// Prefix shared by all search cache keys.
pub const CACHE_KEY_PREFIX: &str = "search";

/// What a candidate source needs to find plausible conflicts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CandidateRequest {
    /// Lowercased mark text with whitespace removed
    pub normalized_text: String,
    /// Soundex code of the mark (empty if the mark has no letters)
    pub soundex_code: String,
    /// Query classes, ascending
    pub classes: Vec<u16>,
    /// Maximum rows to return
    pub limit: usize,
}

/// Trait for translating a search query into some collaborator's input.
pub trait QueryDialect {
    /// The output type (a request struct or a key string)
    type Output;

    /// Translate a SearchQuery to this dialect
    fn translate(&self, query: &SearchQuery) -> Self::Output;
}

/// Builds candidate-source requests.
#[derive(Debug, Clone)]
pub struct CandidateDialect {
    pub limit: usize,
}

impl Default for CandidateDialect {
    fn default() -> Self {
        Self {
            limit: DEFAULT_CANDIDATE_LIMIT,
        }
    }
}

impl QueryDialect for CandidateDialect {
    type Output = CandidateRequest;

    fn translate(&self, query: &SearchQuery) -> CandidateRequest {
        CandidateRequest {
            normalized_text: normalize_compact(query.mark_text()),
            soundex_code: soundex(query.mark_text()),
            classes: query.classes().iter().copied().collect(),
            limit: self.limit,
        }
    }
}

/// Builds cache keys of the form `search:<normalized text>:<classes>`,
/// followed by `:logo=<hex>` when the query carries a logo hash.
#[derive(Debug, Default, Clone)]
pub struct CacheKeyDialect;

impl QueryDialect for CacheKeyDialect {
    type Output = String;

    fn translate(&self, query: &SearchQuery) -> String {
        let classes = query
            .classes()
            .iter()
            .map(|c| c.to_string())
            .collect::<Vec<_>>()
            .join(",");

        let mut key = format!(
            "{}:{}:{}",
            CACHE_KEY_PREFIX,
            normalize_compact(query.mark_text()),
            classes
        );
        if let Some(logo) = query.logo_hash() {
            key.push_str(":logo=");
            key.push_str(&logo.trim().to_ascii_lowercase());
        }
        key
    }
}

/// Cache key for a query.
pub fn cache_key(query: &SearchQuery) -> String {
    CacheKeyDialect.translate(query)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cache_key_normalizes_text_and_sorts_classes() {
        let query = SearchQuery::new("Blue  Sky", [25, 9, 35]).unwrap();
        assert_eq!(cache_key(&query), "search:bluesky:9,25,35");
    }

    #[test]
    fn test_cache_key_stable_across_spelling() {
        let a = SearchQuery::new("ACME Corp", [42, 9]).unwrap();
        let b = SearchQuery::new("  acmecorp ", [9, 42, 9]).unwrap();
        assert_eq!(cache_key(&a), cache_key(&b));
    }

    #[test]
    fn test_cache_key_includes_logo_hash() {
        let plain = SearchQuery::new("ACME", [9]).unwrap();
        let with_logo = plain.clone().with_logo_hash("FFFFFFFF00000000");
        assert_eq!(cache_key(&plain), "search:acme:9");
        assert_eq!(cache_key(&with_logo), "search:acme:9:logo=ffffffff00000000");
    }

    #[test]
    fn test_candidate_request() {
        let query = SearchQuery::new("Nike Air", [25]).unwrap();
        let request = CandidateDialect::default().translate(&query);

        assert_eq!(request.normalized_text, "nikeair");
        assert_eq!(request.soundex_code, "N260");
        assert_eq!(request.classes, vec![25]);
        assert_eq!(request.limit, DEFAULT_CANDIDATE_LIMIT);
    }

    #[test]
    fn test_candidate_request_custom_limit() {
        let query = SearchQuery::new("ACME", [9]).unwrap();
        let request = CandidateDialect { limit: 20 }.translate(&query);
        assert_eq!(request.limit, 20);
    }
}
