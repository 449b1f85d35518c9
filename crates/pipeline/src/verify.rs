//! Bounded, best-effort verification of top-ranked conflicts.
//!
//! Serial ids are split into batches; at most `max_concurrent` batches are
//! in flight and each batch gets its own timeout. A failed or timed-out
//! batch leaves its conflicts unverified and never fails the search.

use crate::sources::{Verification, VerificationError, VerificationSource};
use clearmark_model::Conflict;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, warn};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct VerifierConfig {
    /// Only the first `top_k` ranked conflicts are verified
    pub top_k: usize,
    pub batch_size: usize,
    pub max_concurrent: usize,
    pub timeout_ms: u64,
}

impl Default for VerifierConfig {
    fn default() -> Self {
        Self {
            top_k: 10,
            batch_size: 5,
            max_concurrent: 2,
            timeout_ms: 10_000,
        }
    }
}

impl VerifierConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

pub struct Verifier<V> {
    source: Arc<V>,
    config: VerifierConfig,
}

impl<V> Clone for Verifier<V> {
    fn clone(&self) -> Self {
        Self {
            source: Arc::clone(&self.source),
            config: self.config.clone(),
        }
    }
}

impl<V: VerificationSource> Verifier<V> {
    pub fn new(source: V) -> Self {
        Self::with_config(source, VerifierConfig::default())
    }

    pub fn with_config(source: V, config: VerifierConfig) -> Self {
        Self {
            source: Arc::new(source),
            config,
        }
    }

    pub fn config(&self) -> &VerifierConfig {
        &self.config
    }

    /// Verify every id, merging the answers of all batches that succeed.
    pub async fn verify_all(&self, serial_ids: Vec<String>) -> HashMap<String, Verification> {
        let semaphore = Arc::new(Semaphore::new(self.config.max_concurrent.max(1)));
        let timeout = self.config.timeout();
        let mut tasks = JoinSet::new();

        for batch in serial_ids.chunks(self.config.batch_size.max(1)) {
            let batch = batch.to_vec();
            let source = Arc::clone(&self.source);
            let semaphore = Arc::clone(&semaphore);

            tasks.spawn(async move {
                let result = match semaphore.acquire_owned().await {
                    Ok(_permit) => match tokio::time::timeout(timeout, source.verify(&batch)).await {
                        Ok(result) => result,
                        Err(_) => Err(VerificationError::Timeout),
                    },
                    Err(_) => Err(VerificationError::Unavailable("verifier closed".to_string())),
                };
                (batch, result)
            });
        }

        let mut verified = HashMap::new();
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((_, Ok(answers))) => verified.extend(answers),
                Ok((batch, Err(e))) => {
                    warn!(error = %e, serial_ids = ?batch, "Verification batch failed");
                }
                Err(e) => warn!(error = %e, "Verification task aborted"),
            }
        }
        verified
    }

    /// Verify the first `top_k` conflicts in place; returns how many were confirmed.
    ///
    /// Only `verified` and `verified_status` change. Scores, risk and order
    /// are left alone.
    pub async fn verify_top(&self, conflicts: &mut [Conflict]) -> usize {
        let k = self.config.top_k.min(conflicts.len());
        if k == 0 {
            return 0;
        }

        let serial_ids = conflicts[..k]
            .iter()
            .map(|c| c.record.serial_id.clone())
            .collect();
        let answers = self.verify_all(serial_ids).await;

        let mut confirmed = 0;
        for conflict in &mut conflicts[..k] {
            if let Some(answer) = answers.get(&conflict.record.serial_id) {
                if answer.verified {
                    conflict.verified = true;
                    conflict.verified_status = answer.status.clone();
                    confirmed += 1;
                }
            }
        }

        debug!(requested = k, confirmed, "Verification complete");
        confirmed
    }
}
