//! Collaborator interfaces consumed by the pipeline.
//!
//! The matching core does not fetch data itself. These traits describe the
//! narrow contracts it relies on, so storage and upstream APIs can be
//! swapped without touching scoring logic.

use clearmark_model::MarkRecord;
use clearmark_query::CandidateRequest;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::future::Future;
use thiserror::Error;

/// Errors from candidate source operations.
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("Connection failed: {0}")]
    Connection(String),

    #[error("Query execution failed: {0}")]
    QueryFailed(String),

    #[error("Source not available")]
    Unavailable,
}

/// Supplies candidate records for a query.
///
/// Implementations may combine exact, partial and phonetic matching; the
/// pipeline scores whatever comes back.
pub trait CandidateSource {
    fn search_candidates(
        &self,
        request: &CandidateRequest,
    ) -> impl Future<Output = Result<Vec<MarkRecord>, SourceError>> + Send;

    /// Get the source name for logging.
    fn name(&self) -> &'static str;
}

/// A fixed in-memory candidate list.
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    records: Vec<MarkRecord>,
}

impl MemorySource {
    pub fn new(records: Vec<MarkRecord>) -> Self {
        Self { records }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl CandidateSource for MemorySource {
    async fn search_candidates(
        &self,
        request: &CandidateRequest,
    ) -> Result<Vec<MarkRecord>, SourceError> {
        Ok(self.records.iter().take(request.limit).cloned().collect())
    }

    fn name(&self) -> &'static str {
        "memory"
    }
}

/// Upstream answer for one serial id.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Verification {
    pub verified: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
}

#[derive(Debug, Error)]
pub enum VerificationError {
    #[error("Verification timed out")]
    Timeout,

    #[error("Verification unavailable: {0}")]
    Unavailable(String),
}

/// Confirms the live status of registered marks.
pub trait VerificationSource: Send + Sync + 'static {
    fn verify(
        &self,
        serial_ids: &[String],
    ) -> impl Future<Output = Result<HashMap<String, Verification>, VerificationError>> + Send;
}

/// Verification source used when none is configured.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoVerification;

impl VerificationSource for NoVerification {
    async fn verify(
        &self,
        _serial_ids: &[String],
    ) -> Result<HashMap<String, Verification>, VerificationError> {
        Err(VerificationError::Unavailable(
            "no verification source configured".to_string(),
        ))
    }
}
