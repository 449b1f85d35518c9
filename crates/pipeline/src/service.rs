//! End-to-end search: cache, candidate retrieval, ranking, verification.

use crate::cache::{MemoryCache, ResultCache};
use crate::rank::rank;
use crate::sources::{CandidateSource, NoVerification, VerificationSource};
use crate::verify::Verifier;
use crate::{PipelineConfig, PipelineError};
use clearmark_model::{Conflict, SearchQuery, SearchSummary};
use clearmark_query::{cache_key, CandidateDialect, QueryDialect};
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Per-call switches.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchOptions {
    /// Verify the top-ranked conflicts against the upstream registry
    pub verify: bool,
    /// Bypass a cached result
    pub force_refresh: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchMetadata {
    pub duration_ms: u64,
    pub cached: bool,
    /// Which collaborators contributed to this result
    pub sources: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchOutcome {
    pub query: SearchQuery,
    pub conflicts: Vec<Conflict>,
    /// Counts over every conflict that passed the relevance floor
    pub summary: SearchSummary,
    pub metadata: SearchMetadata,
}

pub struct MatchService<S, V = NoVerification, C = MemoryCache> {
    source: S,
    verifier: Option<Verifier<V>>,
    cache: Option<C>,
    config: PipelineConfig,
}

impl<S: CandidateSource> MatchService<S> {
    /// Service with an in-memory result cache and no verification.
    pub fn new(source: S) -> Self {
        Self {
            source,
            verifier: None,
            cache: Some(MemoryCache::new()),
            config: PipelineConfig::default(),
        }
    }
}

impl<S, V, C> MatchService<S, V, C>
where
    S: CandidateSource,
    V: VerificationSource,
    C: ResultCache,
{
    pub fn with_config(mut self, config: PipelineConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_verifier<V2: VerificationSource>(self, verifier: Verifier<V2>) -> MatchService<S, V2, C> {
        MatchService {
            source: self.source,
            verifier: Some(verifier),
            cache: self.cache,
            config: self.config,
        }
    }

    pub fn with_cache<C2: ResultCache>(self, cache: C2) -> MatchService<S, V, C2> {
        MatchService {
            source: self.source,
            verifier: self.verifier,
            cache: Some(cache),
            config: self.config,
        }
    }

    pub fn without_cache(mut self) -> Self {
        self.cache = None;
        self
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn cache(&self) -> Option<&C> {
        self.cache.as_ref()
    }

    /// Validate raw input, then [`search`](Self::search).
    pub async fn search_text(
        &self,
        mark_text: &str,
        classes: &[u16],
        options: SearchOptions,
    ) -> Result<SearchOutcome, PipelineError> {
        let query = SearchQuery::new(mark_text, classes.iter().copied())?;
        self.search(&query, options).await
    }

    pub async fn search(
        &self,
        query: &SearchQuery,
        options: SearchOptions,
    ) -> Result<SearchOutcome, PipelineError> {
        let started = Instant::now();
        let verifying = options.verify && self.verifier.is_some();
        let key = if verifying {
            format!("{}:verified", cache_key(query))
        } else {
            cache_key(query)
        };
        info!(mark = query.mark_text(), classes = ?query.classes(), "Searching");

        if !options.force_refresh {
            if let Some(mut outcome) = self.load(&key).await {
                info!(key = %key, conflicts = outcome.conflicts.len(), "Cache hit");
                outcome.query = query.clone();
                outcome.metadata.cached = true;
                return Ok(outcome);
            }
        }

        let request = CandidateDialect {
            limit: self.config.candidate_limit,
        }
        .translate(query);
        let candidates = self.source.search_candidates(&request).await?;
        debug!(
            source = self.source.name(),
            candidates = candidates.len(),
            soundex = %request.soundex_code,
            "Candidates retrieved"
        );

        let mut conflicts = rank(query, candidates, &self.config);
        let mut sources = vec![self.source.name().to_string()];

        match &self.verifier {
            Some(verifier) if verifying => {
                verifier.verify_top(&mut conflicts).await;
                sources.push("verification".to_string());
            }
            _ if options.verify => debug!("Verification requested but no verifier configured"),
            _ => {}
        }

        let summary = SearchSummary::from_conflicts(&conflicts);
        conflicts.truncate(self.config.max_results);

        let outcome = SearchOutcome {
            query: query.clone(),
            conflicts,
            summary,
            metadata: SearchMetadata {
                duration_ms: started.elapsed().as_millis() as u64,
                cached: false,
                sources,
            },
        };

        self.store(&key, &outcome).await;

        info!(
            total = outcome.summary.total,
            high = outcome.summary.high,
            medium = outcome.summary.medium,
            duration_ms = outcome.metadata.duration_ms,
            "Search complete"
        );
        Ok(outcome)
    }

    async fn load(&self, key: &str) -> Option<SearchOutcome> {
        let cache = self.cache.as_ref()?;
        match cache.get(key).await {
            Ok(Some(bytes)) => match serde_json::from_slice(&bytes) {
                Ok(outcome) => Some(outcome),
                Err(e) => {
                    warn!(key = %key, error = %e, "Discarding unreadable cache entry");
                    None
                }
            },
            Ok(None) => None,
            Err(e) => {
                warn!(key = %key, error = %e, "Cache read failed");
                None
            }
        }
    }

    async fn store(&self, key: &str, outcome: &SearchOutcome) {
        let Some(cache) = self.cache.as_ref() else {
            return;
        };
        let bytes = match serde_json::to_vec(outcome) {
            Ok(bytes) => bytes,
            Err(e) => {
                warn!(key = %key, error = %e, "Failed to serialize search outcome");
                return;
            }
        };
        let ttl = Duration::from_secs(self.config.cache_ttl_secs);
        if let Err(e) = cache.set(key, bytes, ttl).await {
            warn!(key = %key, error = %e, "Cache write failed");
        }
    }
}
