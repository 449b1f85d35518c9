//! Rule-based risk classification for trademark conflicts.
//!
//! Classification is a cascade: the rule table is picked by status and
//! class overlap, rules are tried top to bottom, and the first rule whose
//! guard holds decides the level. When nothing fires the level is low.
//!
//! Same-class thresholds are stricter than cross-class ones and the tables
//! are not monotone in every signal. Rule order and thresholds are fixed.

use clearmark_model::{RiskAssessment, RiskFactor, RiskInput, RiskLevel, SimilarityBreakdown};

/// Signals at or above this count towards the multi-factor rules.
pub const HIGH_FACTOR_THRESHOLD: u8 = 60;

type Guard = fn(&SimilarityBreakdown) -> bool;

/// What a rule yields once its guard holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Fixed(RiskLevel),
    /// Depends on whether the candidate mark is live
    LiveDependent { live: RiskLevel, otherwise: RiskLevel },
}

impl Verdict {
    fn resolve(self, is_live: bool) -> RiskLevel {
        match self {
            Self::Fixed(level) => level,
            Self::LiveDependent { live, otherwise } => {
                if is_live {
                    live
                } else {
                    otherwise
                }
            }
        }
    }
}

/// One guard/verdict pair of the cascade.
pub struct Rule {
    pub name: &'static str,
    pub factor: RiskFactor,
    guard: Guard,
    verdict: Verdict,
}

impl Rule {
    pub fn matches(&self, breakdown: &SimilarityBreakdown) -> bool {
        (self.guard)(breakdown)
    }

    pub fn verdict(&self) -> Verdict {
        self.verdict
    }
}

const HIGH_IF_LIVE: Verdict = Verdict::LiveDependent {
    live: RiskLevel::High,
    otherwise: RiskLevel::Medium,
};
const MEDIUM: Verdict = Verdict::Fixed(RiskLevel::Medium);
const HIGH: Verdict = Verdict::Fixed(RiskLevel::High);

/// Dead or abandoned candidates.
pub const INACTIVE_RULES: &[Rule] = &[Rule {
    name: "inactive-exact",
    factor: RiskFactor::ExactText,
    guard: |b| b.exact >= 95,
    verdict: MEDIUM,
}];

/// Active candidates with no class overlap.
pub const CROSS_CLASS_RULES: &[Rule] = &[
    Rule {
        name: "cross-class-exact-high",
        factor: RiskFactor::ExactText,
        guard: |b| b.exact >= 90,
        verdict: HIGH,
    },
    Rule {
        name: "cross-class-exact-medium",
        factor: RiskFactor::ExactText,
        guard: |b| b.exact >= 75,
        verdict: MEDIUM,
    },
    Rule {
        name: "cross-class-sound",
        factor: RiskFactor::Sound,
        guard: |b| b.phonetic >= 90 && b.visual >= 70,
        verdict: MEDIUM,
    },
];

/// Active candidates sharing at least one class with the query.
pub const SAME_CLASS_RULES: &[Rule] = &[
    Rule {
        name: "same-class-exact-85",
        factor: RiskFactor::ExactText,
        guard: |b| b.exact >= 85,
        verdict: HIGH,
    },
    Rule {
        name: "same-class-exact-65",
        factor: RiskFactor::ExactText,
        guard: |b| b.exact >= 65,
        verdict: HIGH_IF_LIVE,
    },
    Rule {
        name: "same-class-exact-50",
        factor: RiskFactor::ExactText,
        guard: |b| b.exact >= 50,
        verdict: MEDIUM,
    },
    Rule {
        name: "same-class-sound-strong",
        factor: RiskFactor::Sound,
        guard: |b| b.phonetic >= 90 && b.visual >= 60,
        verdict: HIGH_IF_LIVE,
    },
    Rule {
        name: "same-class-sound-moderate",
        factor: RiskFactor::Sound,
        guard: |b| b.phonetic >= 85 && b.visual >= 50,
        verdict: MEDIUM,
    },
    Rule {
        name: "same-class-sound",
        factor: RiskFactor::Sound,
        guard: |b| b.phonetic >= 80,
        verdict: MEDIUM,
    },
    Rule {
        name: "same-class-visual-strong",
        factor: RiskFactor::Visual,
        guard: |b| b.visual >= 85 && b.phonetic >= 50,
        verdict: HIGH_IF_LIVE,
    },
    Rule {
        name: "same-class-visual",
        factor: RiskFactor::Visual,
        guard: |b| b.visual >= 75,
        verdict: MEDIUM,
    },
    Rule {
        name: "same-class-three-factors",
        factor: RiskFactor::MultiFactor,
        guard: |b| b.count_at_least(HIGH_FACTOR_THRESHOLD) >= 3,
        verdict: MEDIUM,
    },
    Rule {
        name: "same-class-two-factors",
        factor: RiskFactor::MultiFactor,
        guard: |b| b.count_at_least(HIGH_FACTOR_THRESHOLD) >= 2 && b.max_signal() >= 70,
        verdict: MEDIUM,
    },
    Rule {
        name: "same-class-peak-signal",
        factor: RiskFactor::MultiFactor,
        guard: |b| b.max_signal() >= 75,
        verdict: MEDIUM,
    },
    Rule {
        name: "same-class-fuzzy",
        factor: RiskFactor::MultiFactor,
        guard: |b| b.fuzzy >= 85 && (b.visual >= 55 || b.phonetic >= 55),
        verdict: MEDIUM,
    },
];

/// Outcome of running the cascade, including which rule fired.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Decision {
    pub level: RiskLevel,
    pub factor: RiskFactor,
    /// `None` when no rule fired
    pub rule: Option<&'static str>,
}

/// The rule table that applies to this input.
pub fn rules_for(input: &RiskInput) -> &'static [Rule] {
    if input.status.is_inactive() {
        INACTIVE_RULES
    } else if !input.same_class {
        CROSS_CLASS_RULES
    } else {
        SAME_CLASS_RULES
    }
}

/// Run the cascade without building an explanation.
pub fn decide(input: &RiskInput) -> Decision {
    let is_live = input.status.is_live();

    rules_for(input)
        .iter()
        .find(|rule| rule.matches(&input.breakdown))
        .map(|rule| Decision {
            level: rule.verdict.resolve(is_live),
            factor: rule.factor,
            rule: Some(rule.name),
        })
        .unwrap_or(Decision {
            level: RiskLevel::Low,
            factor: RiskFactor::NoneSignificant,
            rule: None,
        })
}

/// Classify a candidate and explain the verdict.
pub fn assess(input: &RiskInput) -> RiskAssessment {
    let decision = decide(input);
    let explanation = clearmark_explain::explain(input, decision.level, decision.factor);

    RiskAssessment {
        level: decision.level,
        factor: decision.factor,
        explanation: explanation.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clearmark_model::MarkStatus;

    fn input(
        exact: u8,
        visual: u8,
        phonetic: u8,
        fuzzy: u8,
        same_class: bool,
        status: MarkStatus,
    ) -> RiskInput {
        RiskInput {
            breakdown: SimilarityBreakdown::from_signals(exact, visual, phonetic, fuzzy),
            same_class,
            status,
        }
    }

    fn level(
        exact: u8,
        visual: u8,
        phonetic: u8,
        fuzzy: u8,
        same_class: bool,
        status: MarkStatus,
    ) -> RiskLevel {
        decide(&input(exact, visual, phonetic, fuzzy, same_class, status)).level
    }

    #[test]
    fn test_cross_class_exact_high() {
        let assessment = assess(&input(90, 80, 0, 0, false, MarkStatus::Live));
        assert_eq!(assessment.level, RiskLevel::High);
        assert_eq!(assessment.factor, RiskFactor::ExactText);
        assert!(assessment.explanation.contains("exact text"));
    }

    #[test]
    fn test_dead_same_class_nothing_similar() {
        assert_eq!(level(0, 0, 0, 0, true, MarkStatus::Dead), RiskLevel::Low);
    }

    #[test]
    fn test_inactive_gate() {
        for status in [MarkStatus::Dead, MarkStatus::Abandoned] {
            assert_eq!(level(95, 0, 0, 0, true, status), RiskLevel::Medium);
            assert_eq!(level(94, 100, 100, 100, true, status), RiskLevel::Low);
            assert_eq!(level(100, 100, 100, 100, false, status), RiskLevel::Medium);
        }
    }

    #[test]
    fn test_cross_class_rules() {
        let live = MarkStatus::Live;
        assert_eq!(level(89, 0, 0, 0, false, live), RiskLevel::Medium);
        assert_eq!(level(75, 0, 0, 0, false, live), RiskLevel::Medium);
        assert_eq!(level(74, 0, 0, 0, false, live), RiskLevel::Low);
        assert_eq!(level(0, 70, 90, 0, false, live), RiskLevel::Medium);
        assert_eq!(level(0, 69, 100, 100, false, live), RiskLevel::Low);
        assert_eq!(level(0, 100, 89, 100, false, MarkStatus::Pending), RiskLevel::Low);
    }

    #[test]
    fn test_same_class_exact_rules() {
        assert_eq!(level(85, 0, 0, 0, true, MarkStatus::Pending), RiskLevel::High);
        assert_eq!(level(65, 0, 0, 0, true, MarkStatus::Live), RiskLevel::High);
        assert_eq!(level(65, 0, 0, 0, true, MarkStatus::Pending), RiskLevel::Medium);
        assert_eq!(level(50, 0, 0, 0, true, MarkStatus::Live), RiskLevel::Medium);
        assert_eq!(level(49, 0, 0, 0, true, MarkStatus::Live), RiskLevel::Low);
    }

    #[test]
    fn test_same_class_sound_rules() {
        let sound = decide(&input(0, 60, 90, 0, true, MarkStatus::Live));
        assert_eq!(sound.level, RiskLevel::High);
        assert_eq!(sound.factor, RiskFactor::Sound);
        assert_eq!(sound.rule, Some("same-class-sound-strong"));

        assert_eq!(level(0, 60, 90, 0, true, MarkStatus::Pending), RiskLevel::Medium);
        assert_eq!(level(0, 50, 85, 0, true, MarkStatus::Live), RiskLevel::Medium);
        assert_eq!(level(0, 0, 80, 0, true, MarkStatus::Live), RiskLevel::Medium);
    }

    #[test]
    fn test_same_class_visual_rules() {
        let visual = decide(&input(0, 85, 50, 0, true, MarkStatus::Live));
        assert_eq!(visual.level, RiskLevel::High);
        assert_eq!(visual.factor, RiskFactor::Visual);

        assert_eq!(level(0, 85, 50, 0, true, MarkStatus::Pending), RiskLevel::Medium);
        assert_eq!(level(0, 75, 0, 0, true, MarkStatus::Live), RiskLevel::Medium);
        assert_eq!(decide(&input(0, 75, 0, 0, true, MarkStatus::Live)).rule, Some("same-class-visual"));
    }

    #[test]
    fn test_same_class_multi_factor_rules() {
        let live = MarkStatus::Live;
        let three = decide(&input(0, 60, 60, 60, true, live));
        assert_eq!(three.level, RiskLevel::Medium);
        assert_eq!(three.rule, Some("same-class-three-factors"));

        assert_eq!(level(0, 60, 0, 60, true, live), RiskLevel::Low);

        let two_with_peak = decide(&input(0, 70, 0, 60, true, live));
        assert_eq!(two_with_peak.level, RiskLevel::Medium);
        assert_eq!(two_with_peak.rule, Some("same-class-two-factors"));

        let two_without_peak = decide(&input(0, 69, 0, 69, true, live));
        assert_eq!(two_without_peak.level, RiskLevel::Low);

        let peak = decide(&input(0, 0, 0, 75, true, live));
        assert_eq!(peak.rule, Some("same-class-peak-signal"));
        assert_eq!(peak.factor, RiskFactor::MultiFactor);

        assert_eq!(level(0, 74, 0, 74, true, live), RiskLevel::Medium);
        assert_eq!(level(0, 59, 0, 74, true, live), RiskLevel::Low);
    }

    #[test]
    fn test_first_match_wins() {
        let decision = decide(&input(100, 100, 100, 100, true, MarkStatus::Live));
        assert_eq!(decision.rule, Some("same-class-exact-85"));
        assert_eq!(decision.factor, RiskFactor::ExactText);
    }

    #[test]
    fn test_no_rule_fired() {
        let decision = decide(&input(0, 40, 0, 40, true, MarkStatus::Live));
        assert_eq!(decision.level, RiskLevel::Low);
        assert_eq!(decision.factor, RiskFactor::NoneSignificant);
        assert_eq!(decision.rule, None);
    }

    #[test]
    fn test_class_overlap_asymmetry_preserved() {
        // Same breakdown, only the class-overlap flag differs
        assert_eq!(level(0, 65, 100, 50, true, MarkStatus::Live), RiskLevel::High);
        assert_eq!(level(0, 65, 100, 50, false, MarkStatus::Live), RiskLevel::Low);
    }

    #[test]
    fn test_exact_monotonic_same_class_live() {
        let mut previous = RiskLevel::Low;
        for exact in 0..=100 {
            let current = level(exact, 0, 0, 0, true, MarkStatus::Live);
            assert!(current >= previous, "exact={exact}");
            previous = current;
        }
        assert_eq!(previous, RiskLevel::High);
    }

    #[test]
    fn test_assessment_explanation_matches_inputs() {
        let a = assess(&input(0, 85, 100, 70, true, MarkStatus::Live));
        let b = assess(&input(0, 85, 100, 70, true, MarkStatus::Live));
        assert_eq!(a, b);
        assert!(a.explanation.contains("sound"));
        assert!(a.explanation.contains("visual 85%"));
    }
}
