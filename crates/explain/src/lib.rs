//! Explanation generation for trademark risk assessments.
//!
//! Turns a classifier verdict into human-readable text that names the
//! deciding factor and the signal values it was derived from, so every
//! explanation can be audited against the inputs.

use clearmark_model::{Conflict, RiskFactor, RiskInput, RiskLevel, SearchSummary};
use std::fmt;

/// A structured explanation for a risk verdict.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Explanation {
    /// Short summary (1 line)
    pub summary: String,

    /// Detailed explanation (1-2 sentences)
    pub detail: String,

    /// Evidence items supporting this explanation
    pub evidence: Vec<EvidenceItem>,
}

/// A piece of evidence supporting a verdict.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EvidenceItem {
    /// Signal name
    pub kind: &'static str,

    /// The signal value, 0..=100
    pub value: u8,
}

impl fmt::Display for Explanation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let evidence = self
            .evidence
            .iter()
            .map(|e| format!("{} {}%", e.kind, e.value))
            .collect::<Vec<_>>()
            .join(", ");
        write!(f, "{}. {} ({})", self.summary, self.detail, evidence)
    }
}

/// Build the explanation for a verdict.
pub fn explain(input: &RiskInput, level: RiskLevel, factor: RiskFactor) -> Explanation {
    let breakdown = &input.breakdown;
    let class_context = if input.same_class {
        "in the same class"
    } else {
        "in a different class"
    };

    let summary = format!(
        "{} ({}): {}% similar to a {} mark {}",
        level.label(),
        factor.label(),
        breakdown.overall,
        input.status.as_str(),
        class_context
    );

    let detail = match factor {
        RiskFactor::ExactText => "The mark text is identical or nearly identical.",
        RiskFactor::Sound => "The marks sound alike when spoken.",
        RiskFactor::Visual => "The marks are spelled alike and look similar in print.",
        RiskFactor::MultiFactor => "Several similarity signals are elevated together.",
        RiskFactor::NoneSignificant => "No similarity signal reached a conflict threshold.",
    }
    .to_string();

    let evidence = vec![
        EvidenceItem { kind: "exact", value: breakdown.exact },
        EvidenceItem { kind: "visual", value: breakdown.visual },
        EvidenceItem { kind: "sound", value: breakdown.phonetic },
        EvidenceItem { kind: "fuzzy", value: breakdown.fuzzy },
    ];

    Explanation {
        summary,
        detail,
        evidence,
    }
}

/// One-line summary of a single conflict.
pub fn summarize_conflict(conflict: &Conflict) -> String {
    let verified = match (&conflict.verified, &conflict.verified_status) {
        (true, Some(status)) => format!(" [verified: {}]", status),
        (true, None) => " [verified]".to_string(),
        _ => String::new(),
    };
    format!(
        "{}: {}% similar, decided by {}{}",
        conflict.risk.level.label(),
        conflict.breakdown.overall,
        conflict.risk.factor.label(),
        verified
    )
}

/// One-line summary of a whole search.
pub fn summarize_search(summary: &SearchSummary) -> String {
    if summary.total == 0 {
        return "Low risk - no significant matches found.".to_string();
    }

    format!(
        "{} overall: {} conflicts ({} high, {} medium, {} low, {} verified)",
        summary.overall_risk.label(),
        summary.total,
        summary.high,
        summary.medium,
        summary.low,
        summary.verified
    )
}
