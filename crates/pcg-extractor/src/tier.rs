//! Confidence tier policy
//!
//! Maps a relationship's confidence to FACT, CANDIDATE or REJECTED using the
//! per-type thresholds from [`ThresholdConfig`].

use serde::Serialize;

use pcg_core::{ExtractionTier, PcgError, RelationType, Result, ThresholdConfig, TierThresholds};

/// What a caller should do with a relationship type
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum RecommendedAction {
    /// FACT tier is trustworthy: store facts and candidates separately
    ExtractWithTieredStorage {
        fact_threshold: f32,
        candidate_threshold: f32,
        message: String,
    },
    /// FACT tier is too noisy for analytics: store everything as candidates
    ExtractAsCandidatesOnly {
        candidate_threshold: f32,
        message: String,
    },
}

impl RecommendedAction {
    pub fn name(&self) -> &'static str {
        match self {
            Self::ExtractWithTieredStorage { .. } => "extract_with_tiered_storage",
            Self::ExtractAsCandidatesOnly { .. } => "extract_as_candidates_only",
        }
    }

    pub fn message(&self) -> &str {
        match self {
            Self::ExtractWithTieredStorage { message, .. }
            | Self::ExtractAsCandidatesOnly { message, .. } => message,
        }
    }
}

/// Immutable per-type threshold policy
#[derive(Debug, Clone, Default)]
pub struct TierPolicy {
    thresholds: ThresholdConfig,
}

impl TierPolicy {
    pub fn new(thresholds: ThresholdConfig) -> Self {
        Self { thresholds }
    }

    /// Like [`Self::new`], rejecting out-of-range or inverted thresholds
    pub fn try_new(thresholds: ThresholdConfig) -> Result<Self> {
        thresholds
            .validate()
            .map_err(|e| PcgError::InvalidThreshold(e.to_string()))?;
        Ok(Self::new(thresholds))
    }

    pub fn thresholds(&self) -> &ThresholdConfig {
        &self.thresholds
    }

    /// Tier a confidence for a relationship type.
    ///
    /// `>= fact_threshold` is FACT, `>= candidate_threshold` is CANDIDATE,
    /// anything else (including NaN) is REJECTED.
    pub fn tier(&self, rel: RelationType, confidence: f32) -> ExtractionTier {
        let t = self.thresholds.get(rel);
        if confidence >= t.fact_threshold {
            ExtractionTier::Fact
        } else if confidence >= t.candidate_threshold {
            ExtractionTier::Candidate
        } else {
            ExtractionTier::Rejected
        }
    }

    /// Tier by edge label; unknown labels yield `None`
    pub fn tier_for_label(&self, label: &str, confidence: f32) -> Option<ExtractionTier> {
        RelationType::from_label(label).map(|rel| self.tier(rel, confidence))
    }

    /// Threshold entry keyed by edge label (`HAS_COMPETITOR`)
    pub fn lookup(&self, label: &str) -> Option<&TierThresholds> {
        self.thresholds.for_label(label)
    }

    pub fn is_analytics_ready(&self, rel: RelationType) -> bool {
        self.thresholds.get(rel).analytics_ready
    }

    /// Recommended pipeline behaviour for a relationship type
    pub fn recommended_action(&self, rel: RelationType) -> RecommendedAction {
        let label = rel.edge_label();
        let t = self.thresholds.get(rel);

        if t.analytics_ready {
            RecommendedAction::ExtractWithTieredStorage {
                fact_threshold: t.fact_threshold,
                candidate_threshold: t.candidate_threshold,
                message: format!(
                    "{label} achieves >90% precision at threshold {} and is ready for analytics.",
                    t.fact_threshold
                ),
            }
        } else {
            let mut message = format!(
                "{label} precision is too low for facts. Store as candidates with evidence."
            );
            if let Some(recommendation) = &t.recommendation {
                message.push(' ');
                message.push_str(recommendation);
            }
            RecommendedAction::ExtractAsCandidatesOnly {
                candidate_threshold: t.candidate_threshold,
                message,
            }
        }
    }

    /// Recommended action keyed by edge label; unknown labels yield `None`
    pub fn recommended_action_for_label(&self, label: &str) -> Option<RecommendedAction> {
        RelationType::from_label(label).map(|rel| self.recommended_action(rel))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_competitor_tiers() {
        let policy = TierPolicy::default();
        assert_eq!(
            policy.tier(RelationType::Competitor, 0.45),
            ExtractionTier::Fact
        );
        assert_eq!(
            policy.tier(RelationType::Competitor, 0.44),
            ExtractionTier::Candidate
        );
        assert_eq!(
            policy.tier(RelationType::Competitor, 0.30),
            ExtractionTier::Candidate
        );
        assert_eq!(
            policy.tier(RelationType::Competitor, 0.29),
            ExtractionTier::Rejected
        );
    }

    #[test]
    fn test_supplier_is_conservative() {
        let policy = TierPolicy::default();
        // Same score lands differently for competitor and supplier
        assert_eq!(
            policy.tier(RelationType::Competitor, 0.50),
            ExtractionTier::Fact
        );
        assert_eq!(
            policy.tier(RelationType::Supplier, 0.50),
            ExtractionTier::Candidate
        );
        assert_eq!(
            policy.tier(RelationType::Customer, 0.35),
            ExtractionTier::Rejected
        );
    }

    #[test]
    fn test_nan_is_rejected() {
        let policy = TierPolicy::default();
        assert_eq!(
            policy.tier(RelationType::Partner, f32::NAN),
            ExtractionTier::Rejected
        );
    }

    #[test]
    fn test_unknown_label() {
        let policy = TierPolicy::default();
        assert!(policy.tier_for_label("HAS_INVESTOR", 0.9).is_none());
        assert!(policy.lookup("HAS_INVESTOR").is_none());
        assert!(policy.recommended_action_for_label("bogus").is_none());
        assert_eq!(
            policy.tier_for_label("HAS_COMPETITOR", 0.9),
            Some(ExtractionTier::Fact)
        );
    }

    #[test]
    fn test_lookup_by_label() {
        let policy = TierPolicy::default();
        let t = policy.lookup("HAS_SUPPLIER").unwrap();
        assert_eq!(t.fact_threshold, 0.55);
        assert_eq!(t.candidate_threshold, 0.40);
        assert!(!t.analytics_ready);
        assert_eq!(
            t.recommendation.as_deref(),
            Some("Use LLM verification for suppliers")
        );
    }

    #[test]
    fn test_recommended_actions() {
        let policy = TierPolicy::default();

        let competitor = policy.recommended_action(RelationType::Competitor);
        assert_eq!(competitor.name(), "extract_with_tiered_storage");
        assert!(matches!(
            competitor,
            RecommendedAction::ExtractWithTieredStorage {
                fact_threshold,
                candidate_threshold,
                ..
            } if fact_threshold == 0.45 && candidate_threshold == 0.30
        ));

        let supplier = policy.recommended_action(RelationType::Supplier);
        assert_eq!(supplier.name(), "extract_as_candidates_only");
        assert!(supplier
            .message()
            .contains("Use LLM verification for suppliers"));

        let partner = policy.recommended_action(RelationType::Partner);
        assert_eq!(partner.name(), "extract_as_candidates_only");
    }

    #[test]
    fn test_recommended_action_json_shape() {
        let policy = TierPolicy::default();
        let json = serde_json::to_value(policy.recommended_action(RelationType::Competitor)).unwrap();
        assert_eq!(json["action"], "extract_with_tiered_storage");
        assert!(json["fact_threshold"].is_number());
    }

    #[test]
    fn test_threshold_override() {
        let thresholds = ThresholdConfig::default().with(
            RelationType::Supplier,
            TierThresholds::new(0.9, 0.5, true),
        );
        let policy = TierPolicy::new(thresholds);
        assert_eq!(
            policy.tier(RelationType::Supplier, 0.85),
            ExtractionTier::Candidate
        );
        assert!(policy.is_analytics_ready(RelationType::Supplier));
    }

    #[test]
    fn test_try_new_rejects_inverted() {
        let thresholds = ThresholdConfig::default().with(
            RelationType::Partner,
            TierThresholds::new(0.30, 0.60, false),
        );
        assert!(matches!(
            TierPolicy::try_new(thresholds),
            Err(PcgError::InvalidThreshold(_))
        ));
        assert!(TierPolicy::try_new(ThresholdConfig::default()).is_ok());
    }

    proptest! {
        #[test]
        fn prop_tiering_is_monotonic(confidence in 0.0f32..=1.0, rel_idx in 0usize..4) {
            let policy = TierPolicy::default();
            let rel = RelationType::ALL[rel_idx];
            let t = policy.thresholds().get(rel);

            let expected = if confidence >= t.fact_threshold {
                ExtractionTier::Fact
            } else if confidence >= t.candidate_threshold {
                ExtractionTier::Candidate
            } else {
                ExtractionTier::Rejected
            };
            prop_assert_eq!(policy.tier(rel, confidence), expected);
        }

        #[test]
        fn prop_higher_confidence_never_lowers_tier(a in 0.0f32..=1.0, b in 0.0f32..=1.0, rel_idx in 0usize..4) {
            let policy = TierPolicy::default();
            let rel = RelationType::ALL[rel_idx];
            let rank = |tier: ExtractionTier| match tier {
                ExtractionTier::Rejected => 0,
                ExtractionTier::Candidate => 1,
                ExtractionTier::Fact => 2,
            };
            let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
            prop_assert!(rank(policy.tier(rel, lo)) <= rank(policy.tier(rel, hi)));
        }
    }
}
