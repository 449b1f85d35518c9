//! Scoring, filtering and ordering of candidates.
//!
//! Takes raw candidate records and produces risk-ranked conflicts:
//! score every candidate, classify it, drop anything under the relevance
//! floor, then sort by risk level and overall similarity.

use crate::PipelineConfig;
use clearmark_features::MarkProfile;
use clearmark_imaging::PerceptualHash;
use clearmark_model::{Conflict, MarkRecord, RiskInput, SearchQuery};
use clearmark_risk::assess;
use rayon::prelude::*;
use std::cmp::Ordering;

/// Score and classify one candidate.
pub fn score_candidate(
    profile: &MarkProfile,
    query: &SearchQuery,
    query_logo: Option<&PerceptualHash>,
    record: MarkRecord,
) -> Conflict {
    let breakdown = profile.score(&record.text);
    let same_class = query.overlaps(&record.classes);
    let risk = assess(&RiskInput {
        breakdown,
        same_class,
        status: record.status,
    });

    let logo_similarity = match (query_logo, record.logo_hash.as_deref()) {
        (Some(query_hash), Some(stored)) => PerceptualHash::from_hex(stored)
            .ok()
            .and_then(|hash| query_hash.similarity(&hash).ok()),
        _ => None,
    };

    let mut conflict = Conflict::new(record, breakdown, risk);
    conflict.logo_similarity = logo_similarity;
    conflict
}

/// Risk level descending, then overall similarity descending.
pub fn compare_conflicts(a: &Conflict, b: &Conflict) -> Ordering {
    b.risk
        .level
        .cmp(&a.risk.level)
        .then_with(|| b.breakdown.overall.cmp(&a.breakdown.overall))
}

/// Stable sort by [`compare_conflicts`].
pub fn sort_conflicts(conflicts: &mut [Conflict]) {
    conflicts.sort_by(compare_conflicts);
}

/// Score, filter and sort every candidate. No truncation.
///
/// Candidates without mark text are skipped.
pub fn rank(query: &SearchQuery, candidates: Vec<MarkRecord>, config: &PipelineConfig) -> Vec<Conflict> {
    let profile = MarkProfile::new(query.mark_text());
    let query_logo = query.logo_hash().and_then(|hex| match PerceptualHash::from_hex(hex) {
        Ok(hash) => Some(hash),
        Err(e) => {
            tracing::warn!(error = %e, "Ignoring malformed query logo hash");
            None
        }
    });

    let total = candidates.len();
    let mut conflicts: Vec<Conflict> = candidates
        .into_par_iter()
        .filter(|record| {
            if !record.has_text() {
                tracing::debug!(serial_id = %record.serial_id, "Skipping candidate without mark text");
            }
            record.has_text()
        })
        .map(|record| score_candidate(&profile, query, query_logo.as_ref(), record))
        .filter(|conflict| conflict.breakdown.overall >= config.relevance_floor)
        .collect();

    sort_conflicts(&mut conflicts);

    tracing::debug!(
        candidates = total,
        conflicts = conflicts.len(),
        floor = config.relevance_floor,
        "Candidates ranked"
    );
    conflicts
}

/// Rank candidates and keep at most `max_results`.
pub fn run(
    query: &SearchQuery,
    candidates: Vec<MarkRecord>,
    max_results: usize,
) -> Vec<Conflict> {
    let mut conflicts = rank(query, candidates, &PipelineConfig::default());
    conflicts.truncate(max_results);
    conflicts
}
