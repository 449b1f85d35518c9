//! Multi-signal text similarity between a query mark and a candidate.
//!
//! Four signals feed the breakdown, all case-insensitive:
//! - `exact`: 100 when the whitespace-stripped texts are equal
//! - `visual`: normalized edit distance
//! - `phonetic`: 100 when Soundex or Metaphone codes agree
//! - `fuzzy`: bigram Dice overlap
//!
//! The overall score is the weighted sum defined by
//! [`SimilarityBreakdown::from_signals`].

use crate::{bigram_similarity, codes_match, compute_phonetics, edit_similarity, normalize_compact, PhoneticCodes};
use clearmark_model::SimilarityBreakdown;

/// Precomputed matching features for one mark text.
///
/// Building the query profile once per search keeps per-candidate work to
/// the candidate side only.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MarkProfile {
    lowercase: String,
    compact: String,
    phonetics: PhoneticCodes,
}

impl MarkProfile {
    pub fn new(text: &str) -> Self {
        let lowercase = text.to_lowercase();
        let compact = normalize_compact(text);
        let phonetics = compute_phonetics(&compact);
        Self {
            lowercase,
            compact,
            phonetics,
        }
    }

    pub fn phonetics(&self) -> &PhoneticCodes {
        &self.phonetics
    }

    /// Score a raw candidate text against this profile.
    pub fn score(&self, candidate: &str) -> SimilarityBreakdown {
        self.compare(&MarkProfile::new(candidate))
    }

    pub fn compare(&self, other: &MarkProfile) -> SimilarityBreakdown {
        let exact = if self.compact == other.compact { 100 } else { 0 };
        let visual = edit_similarity(&self.lowercase, &other.lowercase);
        let phonetic = if self.sounds_like(other) { 100 } else { 0 };
        let fuzzy = bigram_similarity(&self.lowercase, &other.lowercase);

        SimilarityBreakdown::from_signals(exact, visual, phonetic, fuzzy)
    }

    /// Boolean phonetic signal. A text always sounds like itself.
    fn sounds_like(&self, other: &MarkProfile) -> bool {
        self.compact == other.compact || codes_match(&self.phonetics, &other.phonetics).is_some()
    }
}

/// Score `candidate` against `query`.
pub fn score(query: &str, candidate: &str) -> SimilarityBreakdown {
    MarkProfile::new(query).score(candidate)
}
