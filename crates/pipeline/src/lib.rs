//! Trademark match pipeline.
//!
//! Ties the stages together for one search:
//! 1. Look up a cached outcome for the normalized query
//! 2. Fetch candidates from a [`CandidateSource`]
//! 3. Score, classify, filter and sort them ([`rank`])
//! 4. Optionally verify the top conflicts upstream ([`Verifier`])
//! 5. Summarize, truncate and cache the outcome
//!
//! # Usage
//!
//! ```no_run
//! use clearmark_model::MarkRecord;
//! use clearmark_pipeline::{MatchService, MemorySource, SearchOptions};
//!
//! # async fn demo() -> Result<(), clearmark_pipeline::PipelineError> {
//! let source = MemorySource::new(vec![MarkRecord::new("86000001", "NICE")]);
//! let service = MatchService::new(source);
//!
//! let outcome = service.search_text("NIKE", &[25], SearchOptions::default()).await?;
//! for conflict in &outcome.conflicts {
//!     println!("{} {:?}", conflict.record.text, conflict.risk.level);
//! }
//! # Ok(())
//! # }
//! ```

pub mod cache;
pub mod rank;
pub mod service;
pub mod sources;
pub mod verify;

pub use cache::{CacheError, MemoryCache, ResultCache};
pub use rank::{rank, run, score_candidate, sort_conflicts};
pub use service::{MatchService, SearchMetadata, SearchOptions, SearchOutcome};
pub use sources::{
    CandidateSource, MemorySource, NoVerification, SourceError, Verification, VerificationError,
    VerificationSource,
};
pub use verify::{Verifier, VerifierConfig};

use clearmark_model::ModelError;
use clearmark_query::DEFAULT_CANDIDATE_LIMIT;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    InvalidQuery(#[from] ModelError),

    #[error("Candidate source failed: {0}")]
    Source(#[from] SourceError),
}

/// Tunables for ranking and caching.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Conflicts with an overall score below this are dropped
    pub relevance_floor: u8,
    pub max_results: usize,
    /// Upper bound on candidates requested from the source
    pub candidate_limit: usize,
    pub cache_ttl_secs: u64,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            relevance_floor: 40,
            max_results: 50,
            candidate_limit: DEFAULT_CANDIDATE_LIMIT,
            cache_ttl_secs: 3600,
        }
    }
}
