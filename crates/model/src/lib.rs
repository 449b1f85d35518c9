//! Core domain model for clearmark trademark clearance.
//!
//! This crate defines the value types shared by every stage of a search:
//! - `MarkRecord`: an existing mark from the corpus
//! - `MarkStatus`: Live, Dead, Pending, Abandoned
//! - `SearchQuery`: a validated query mark plus Nice classes
//! - `SimilarityBreakdown`: per-signal text similarity with a weighted overall
//! - `RiskLevel` / `RiskAssessment`: the classifier's verdict
//! - `Conflict` / `SearchSummary`: what the pipeline returns

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use thiserror::Error;

/// Lowest valid Nice class.
pub const MIN_NICE_CLASS: u16 = 1;
/// Highest valid Nice class.
pub const MAX_NICE_CLASS: u16 = 45;
/// Minimum trimmed length of a query mark.
pub const MIN_MARK_LEN: usize = 2;

/// TSDR case lookup used as evidence link when a record has no source URL.
const TSDR_CASE_URL: &str = "https://tsdr.uspto.gov/#caseNumber";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ModelError {
    #[error("Invalid query: {0}")]
    InvalidQuery(String),
}

/// Status of a trademark registration or application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MarkStatus {
    /// Active registration
    Live,
    /// Cancelled or expired
    Dead,
    /// Application in progress
    #[default]
    Pending,
    /// Application abandoned before registration
    Abandoned,
}

impl MarkStatus {
    pub fn is_live(self) -> bool {
        self == Self::Live
    }

    /// Dead and abandoned marks carry little enforcement weight.
    pub fn is_inactive(self) -> bool {
        matches!(self, Self::Dead | Self::Abandoned)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Live => "live",
            Self::Dead => "dead",
            Self::Pending => "pending",
            Self::Abandoned => "abandoned",
        }
    }
}

impl From<&str> for MarkStatus {
    fn from(s: &str) -> Self {
        match s.trim().to_uppercase().as_str() {
            "LIVE" | "REGISTERED" => Self::Live,
            "DEAD" | "CANCELLED" | "EXPIRED" => Self::Dead,
            "ABANDONED" => Self::Abandoned,
            _ => Self::Pending,
        }
    }
}

/// An existing mark from the corpus.
///
/// Owned by the caller; the engine only reads it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarkRecord {
    /// Corpus row id
    #[serde(default)]
    pub id: u64,

    /// USPTO serial number
    pub serial_id: String,

    /// The mark text (word mark)
    #[serde(default)]
    pub text: String,

    /// Owner/registrant name
    #[serde(default)]
    pub owner: String,

    #[serde(default)]
    pub status: MarkStatus,

    /// Filing date (ISO format)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filing_date: Option<String>,

    /// Nice classification codes
    #[serde(default)]
    pub classes: Vec<u16>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_url: Option<String>,

    /// Stored perceptual hash of the mark's logo (hex)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logo_hash: Option<String>,
}

impl MarkRecord {
    /// Create a minimal record.
    pub fn new(serial_id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            id: 0,
            serial_id: serial_id.into(),
            text: text.into(),
            owner: String::new(),
            status: MarkStatus::default(),
            filing_date: None,
            classes: Vec::new(),
            source_url: None,
            logo_hash: None,
        }
    }

    pub fn with_status(mut self, status: MarkStatus) -> Self {
        self.status = status;
        self
    }

    pub fn with_classes(mut self, classes: Vec<u16>) -> Self {
        self.classes = classes;
        self
    }

    pub fn with_logo_hash(mut self, logo_hash: impl Into<String>) -> Self {
        self.logo_hash = Some(logo_hash.into());
        self
    }

    /// Records without mark text cannot be scored.
    pub fn has_text(&self) -> bool {
        !self.text.trim().is_empty()
    }

    /// Link to the evidence page for this record.
    pub fn evidence_url(&self) -> String {
        match &self.source_url {
            Some(url) => url.clone(),
            None => format!(
                "{}={}&caseSearchType=US_APPLICATION&caseType=DEFAULT",
                TSDR_CASE_URL, self.serial_id
            ),
        }
    }
}

/// A validated search request.
///
/// Construction trims the mark text and rejects marks shorter than two
/// characters, an empty class set, or classes outside 1..=45.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawSearchQuery")]
pub struct SearchQuery {
    mark_text: String,
    classes: BTreeSet<u16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    logo_hash: Option<String>,
}

#[derive(Deserialize)]
struct RawSearchQuery {
    mark_text: String,
    #[serde(default)]
    classes: Vec<u16>,
    #[serde(default)]
    logo_hash: Option<String>,
}

impl TryFrom<RawSearchQuery> for SearchQuery {
    type Error = ModelError;

    fn try_from(raw: RawSearchQuery) -> Result<Self, Self::Error> {
        let query = SearchQuery::new(raw.mark_text, raw.classes)?;
        Ok(match raw.logo_hash {
            Some(hash) => query.with_logo_hash(hash),
            None => query,
        })
    }
}

impl SearchQuery {
    pub fn new(
        mark_text: impl AsRef<str>,
        classes: impl IntoIterator<Item = u16>,
    ) -> Result<Self, ModelError> {
        let mark_text = mark_text.as_ref().trim().to_string();
        if mark_text.chars().count() < MIN_MARK_LEN {
            return Err(ModelError::InvalidQuery(format!(
                "mark text must be at least {} characters",
                MIN_MARK_LEN
            )));
        }

        let classes: BTreeSet<u16> = classes.into_iter().collect();
        if classes.is_empty() {
            return Err(ModelError::InvalidQuery(
                "at least one Nice class must be specified".to_string(),
            ));
        }
        if let Some(bad) = classes
            .iter()
            .find(|c| !(MIN_NICE_CLASS..=MAX_NICE_CLASS).contains(*c))
        {
            return Err(ModelError::InvalidQuery(format!(
                "Nice class {} is outside {}..={}",
                bad, MIN_NICE_CLASS, MAX_NICE_CLASS
            )));
        }

        Ok(Self {
            mark_text,
            classes,
            logo_hash: None,
        })
    }

    /// Attach the query logo's perceptual hash (hex).
    pub fn with_logo_hash(mut self, logo_hash: impl Into<String>) -> Self {
        self.logo_hash = Some(logo_hash.into());
        self
    }

    pub fn mark_text(&self) -> &str {
        &self.mark_text
    }

    /// Classes in ascending order.
    pub fn classes(&self) -> &BTreeSet<u16> {
        &self.classes
    }

    pub fn logo_hash(&self) -> Option<&str> {
        self.logo_hash.as_deref()
    }

    /// Whether any of `classes` is also a query class.
    pub fn overlaps(&self, classes: &[u16]) -> bool {
        classes.iter().any(|c| self.classes.contains(c))
    }
}

pub const WEIGHT_EXACT: f64 = 0.40;
pub const WEIGHT_VISUAL: f64 = 0.30;
pub const WEIGHT_PHONETIC: f64 = 0.20;
pub const WEIGHT_FUZZY: f64 = 0.10;

/// Per-signal similarity between a query mark and a candidate, each 0..=100.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimilarityBreakdown {
    pub overall: u8,
    /// 0 or 100
    pub exact: u8,
    /// Normalized edit distance
    pub visual: u8,
    /// 0 or 100
    pub phonetic: u8,
    /// Bigram overlap
    pub fuzzy: u8,
}

impl SimilarityBreakdown {
    /// Build a breakdown from the four signals; `overall` is derived.
    pub fn from_signals(exact: u8, visual: u8, phonetic: u8, fuzzy: u8) -> Self {
        Self {
            overall: weighted_overall(exact, visual, phonetic, fuzzy),
            exact,
            visual,
            phonetic,
            fuzzy,
        }
    }

    /// Signals in `[exact, visual, phonetic, fuzzy]` order.
    pub fn signals(&self) -> [u8; 4] {
        [self.exact, self.visual, self.phonetic, self.fuzzy]
    }

    pub fn max_signal(&self) -> u8 {
        self.signals().into_iter().max().unwrap_or(0)
    }

    /// Number of signals at or above `threshold`.
    pub fn count_at_least(&self, threshold: u8) -> usize {
        self.signals().into_iter().filter(|s| *s >= threshold).count()
    }
}

/// `round(0.40*exact + 0.30*visual + 0.20*phonetic + 0.10*fuzzy)`.
pub fn weighted_overall(exact: u8, visual: u8, phonetic: u8, fuzzy: u8) -> u8 {
    let score = exact as f64 * WEIGHT_EXACT
        + visual as f64 * WEIGHT_VISUAL
        + phonetic as f64 * WEIGHT_PHONETIC
        + fuzzy as f64 * WEIGHT_FUZZY;
    score.round().clamp(0.0, 100.0) as u8
}

/// Discrete risk level. Ordered `Low < Medium < High`.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    #[default]
    Low,
    Medium,
    High,
}

impl RiskLevel {
    pub fn label(self) -> &'static str {
        match self {
            Self::Low => "LOW RISK",
            Self::Medium => "MEDIUM RISK",
            Self::High => "HIGH RISK",
        }
    }
}

/// Category of the signal that decided a risk level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskFactor {
    ExactText,
    Sound,
    Visual,
    MultiFactor,
    /// No rule fired
    NoneSignificant,
}

impl RiskFactor {
    pub fn label(self) -> &'static str {
        match self {
            Self::ExactText => "exact text",
            Self::Sound => "sound",
            Self::Visual => "visual",
            Self::MultiFactor => "multi-factor",
            Self::NoneSignificant => "no significant factor",
        }
    }
}

/// Everything the risk classifier looks at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RiskInput {
    pub breakdown: SimilarityBreakdown,
    pub same_class: bool,
    pub status: MarkStatus,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RiskAssessment {
    pub level: RiskLevel,
    pub factor: RiskFactor,
    pub explanation: String,
}

/// A candidate that cleared the relevance floor, annotated with risk.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Conflict {
    pub record: MarkRecord,
    pub breakdown: SimilarityBreakdown,
    pub risk: RiskAssessment,

    /// Set by the verification collaborator
    #[serde(default)]
    pub verified: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub verified_status: Option<String>,

    /// Advisory logo similarity, 0..=100
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logo_similarity: Option<u8>,
}

impl Conflict {
    pub fn new(record: MarkRecord, breakdown: SimilarityBreakdown, risk: RiskAssessment) -> Self {
        Self {
            record,
            breakdown,
            risk,
            verified: false,
            verified_status: None,
            logo_similarity: None,
        }
    }
}

/// Counts over a set of conflicts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchSummary {
    pub total: usize,
    pub high: usize,
    pub medium: usize,
    pub low: usize,
    pub verified: usize,
    pub overall_risk: RiskLevel,
}

impl SearchSummary {
    pub fn from_conflicts(conflicts: &[Conflict]) -> Self {
        let count = |level: RiskLevel| conflicts.iter().filter(|c| c.risk.level == level).count();
        let high = count(RiskLevel::High);
        let medium = count(RiskLevel::Medium);
        let low = count(RiskLevel::Low);

        // More than two medium conflicts is treated like a high one
        let overall_risk = if high > 0 || medium > 2 {
            RiskLevel::High
        } else if medium > 0 {
            RiskLevel::Medium
        } else {
            RiskLevel::Low
        };

        Self {
            total: conflicts.len(),
            high,
            medium,
            low,
            verified: conflicts.iter().filter(|c| c.verified).count(),
            overall_risk,
        }
    }
}
