//! Hybrid extraction
//!
//! Combines the directional extractor (the only path that can produce FACT)
//! with optional candidate sources (capped at CANDIDATE) and the tier policy.
//!
//! [`HybridExtractionResult`] has private fields. Results are built inside
//! this module only, which is what keeps a keyword or similarity mention from
//! ever being stored as a fact.

use std::collections::HashSet;
use std::sync::Arc;

use serde::Serialize;

use pcg_core::{AppConfig, ExtractionTier, RelationType, Result};

use crate::candidates::{CandidateMention, CandidateSource};
use crate::directional::{DirectionalExtractor, DirectionalMatch};
use crate::normalize::name_key;
use crate::resolver::{EntityResolver, ResolvedCompany};
use crate::tier::{RecommendedAction, TierPolicy};

/// Evidence method for directional pattern matches
pub const METHOD_DIRECTIONAL_PATTERN: &str = "directional_pattern";
/// Evidence method for keyword candidates
pub const METHOD_KEYWORD_CANDIDATE: &str = "keyword_candidate";

/// Why a relationship was extracted
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Evidence {
    /// Pattern name, for pattern-based methods
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pattern: Option<String>,
    pub full_match: String,
    pub method: String,
    /// Embedding similarity, for scored candidates
    #[serde(skip_serializing_if = "Option::is_none")]
    pub similarity: Option<f32>,
}

/// A tiered relationship ready for resolution and storage
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HybridExtractionResult {
    company_text: String,
    ticker: Option<String>,
    cik: Option<String>,
    relationship_type: RelationType,
    tier: ExtractionTier,
    confidence: f32,
    evidence: Evidence,
    context: String,
}

impl HybridExtractionResult {
    fn from_match(m: &DirectionalMatch, company_text: String) -> Self {
        Self {
            company_text,
            ticker: None,
            cik: None,
            relationship_type: m.relationship_type,
            tier: ExtractionTier::Fact,
            confidence: m.confidence,
            evidence: Evidence {
                pattern: Some(m.pattern_name.clone()),
                full_match: m.full_match.clone(),
                method: METHOD_DIRECTIONAL_PATTERN.to_string(),
                similarity: None,
            },
            context: m.context.clone(),
        }
    }

    fn from_candidate(mention: CandidateMention) -> Self {
        let (ticker, cik) = match mention.resolved {
            Some(resolved) => (Some(resolved.ticker), Some(resolved.cik)),
            None => (None, None),
        };
        Self {
            company_text: mention.company_text,
            ticker,
            cik,
            relationship_type: mention.relationship_type,
            tier: ExtractionTier::Candidate,
            confidence: mention.confidence,
            evidence: mention.evidence,
            context: mention.context,
        }
    }

    /// Attach a resolved identity, keeping everything else
    pub fn with_resolution(mut self, resolved: &ResolvedCompany) -> Self {
        self.ticker = Some(resolved.ticker.clone()).filter(|t| !t.is_empty());
        self.cik = Some(resolved.cik.clone());
        self
    }

    pub fn company_text(&self) -> &str {
        &self.company_text
    }

    pub fn ticker(&self) -> Option<&str> {
        self.ticker.as_deref()
    }

    pub fn cik(&self) -> Option<&str> {
        self.cik.as_deref()
    }

    pub fn relationship_type(&self) -> RelationType {
        self.relationship_type
    }

    pub fn tier(&self) -> ExtractionTier {
        self.tier
    }

    pub fn confidence(&self) -> f32 {
        self.confidence
    }

    pub fn evidence(&self) -> &Evidence {
        &self.evidence
    }

    pub fn context(&self) -> &str {
        &self.context
    }

    pub fn is_resolved(&self) -> bool {
        self.cik.is_some()
    }
}

// ============================================================================
// Extractor
// ============================================================================

/// Directional facts plus capped candidates, tiered per relationship type
pub struct HybridExtractor {
    directional: DirectionalExtractor,
    policy: TierPolicy,
    sources: Vec<Arc<dyn CandidateSource>>,
}

impl HybridExtractor {
    /// Default patterns and calibrated thresholds
    pub fn new() -> Result<Self> {
        Ok(Self::from_parts(
            DirectionalExtractor::new()?,
            TierPolicy::default(),
        ))
    }

    pub fn from_config(config: &AppConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self::from_parts(
            DirectionalExtractor::with_config(&config.extraction)?,
            TierPolicy::try_new(config.thresholds.clone())?,
        ))
    }

    pub fn from_parts(directional: DirectionalExtractor, policy: TierPolicy) -> Self {
        Self {
            directional,
            policy,
            sources: Vec::new(),
        }
    }

    /// Register a candidate source used by [`Self::extract`]
    pub fn with_candidate_source(mut self, source: Arc<dyn CandidateSource>) -> Self {
        self.sources.push(source);
        self
    }

    pub fn policy(&self) -> &TierPolicy {
        &self.policy
    }

    pub fn directional(&self) -> &DirectionalExtractor {
        &self.directional
    }

    /// FACT-tier relationships of one type.
    ///
    /// Matches whose pattern weight tiers below FACT are dropped, so the
    /// output depends on the configured thresholds.
    pub fn extract_facts(&self, text: &str, rel: RelationType) -> Vec<HybridExtractionResult> {
        self.facts_from(self.directional.extract(text, Some(&[rel])))
    }

    /// FACT-tier relationships for a label; unknown labels yield nothing
    pub fn extract_facts_for_label(&self, text: &str, label: &str) -> Vec<HybridExtractionResult> {
        match RelationType::from_label(label) {
            Some(rel) => self.extract_facts(text, rel),
            None => {
                tracing::warn!(label, "unknown relationship type, nothing extracted");
                Vec::new()
            }
        }
    }

    /// FACT-tier relationships for several types in one directional pass
    pub fn extract_all_facts(
        &self,
        text: &str,
        types: Option<&[RelationType]>,
    ) -> Vec<HybridExtractionResult> {
        self.facts_from(self.directional.extract(text, types))
    }

    /// Facts first, then candidates from every registered source.
    ///
    /// Candidates naming a company already found as a fact are dropped, as
    /// are candidates whose confidence tiers to REJECTED. A candidate that
    /// would tier as FACT is stored as CANDIDATE.
    pub fn extract(
        &self,
        text: &str,
        rel: RelationType,
        filer_cik: Option<&str>,
    ) -> Vec<HybridExtractionResult> {
        let mut results = self.extract_facts(text, rel);

        let mut seen_names: HashSet<String> =
            results.iter().map(|r| name_key(&r.company_text)).collect();
        let mut seen_ciks: HashSet<String> =
            results.iter().filter_map(|r| r.cik.clone()).collect();

        for source in &self.sources {
            let mentions = source.candidates(text, rel, filer_cik);
            let before = results.len();

            for mention in mentions {
                if self.policy.tier(rel, mention.confidence) == ExtractionTier::Rejected {
                    tracing::debug!(
                        company = %mention.company_text,
                        confidence = mention.confidence,
                        "candidate rejected"
                    );
                    continue;
                }

                let key = name_key(&mention.company_text);
                let resolved_key = mention.resolved.as_ref().map(|r| name_key(&r.name));
                let cik = mention.resolved.as_ref().map(|r| r.cik.clone());

                let duplicate = seen_names.contains(&key)
                    || resolved_key.as_ref().is_some_and(|k| seen_names.contains(k))
                    || cik.as_ref().is_some_and(|c| seen_ciks.contains(c));
                if duplicate {
                    continue;
                }

                seen_names.insert(key);
                if let Some(k) = resolved_key {
                    seen_names.insert(k);
                }
                if let Some(c) = cik {
                    seen_ciks.insert(c);
                }
                results.push(HybridExtractionResult::from_candidate(mention));
            }

            tracing::debug!(
                source = source.name(),
                relationship = %rel,
                added = results.len() - before,
                "candidate source merged"
            );
        }

        results
    }

    /// [`Self::extract`] for every relationship type
    pub fn extract_all(&self, text: &str, filer_cik: Option<&str>) -> Vec<HybridExtractionResult> {
        RelationType::ALL
            .into_iter()
            .flat_map(|rel| self.extract(text, rel, filer_cik))
            .collect()
    }

    /// Recommended pipeline behaviour for a label; unknown labels yield `None`
    pub fn get_recommended_action(&self, label: &str) -> Option<RecommendedAction> {
        self.policy.recommended_action_for_label(label)
    }

    fn facts_from(&self, matches: Vec<DirectionalMatch>) -> Vec<HybridExtractionResult> {
        let total = matches.len();
        let facts: Vec<HybridExtractionResult> = matches
            .iter()
            .filter(|m| self.policy.tier(m.relationship_type, m.confidence) == ExtractionTier::Fact)
            .filter_map(|m| {
                let name = m.cleaned_name();
                (!name.is_empty()).then(|| HybridExtractionResult::from_match(m, name))
            })
            .collect();

        if facts.len() < total {
            tracing::debug!(
                matches = total,
                facts = facts.len(),
                "directional matches below fact threshold dropped"
            );
        }
        facts
    }
}

/// Attach identities to unresolved results; results that cannot be resolved
/// are dropped.
pub fn resolve_results(
    results: Vec<HybridExtractionResult>,
    resolver: &dyn EntityResolver,
) -> Vec<HybridExtractionResult> {
    let total = results.len();
    let resolved: Vec<HybridExtractionResult> = results
        .into_iter()
        .filter_map(|result| {
            if result.is_resolved() {
                return Some(result);
            }
            match resolver.resolve(&result.company_text, &result.context) {
                Some(company) => Some(result.with_resolution(&company)),
                None => {
                    tracing::debug!(company = %result.company_text, "company not resolved");
                    None
                }
            }
        })
        .collect();

    tracing::info!(
        total,
        resolved = resolved.len(),
        "entity resolution finished"
    );
    resolved
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::candidates::KeywordCandidateSource;
    use crate::resolver::{CompanyLookup, CompanyRecord};
    use pcg_core::{ThresholdConfig, TierThresholds};

    fn lookup() -> CompanyLookup {
        CompanyLookup::from_records(vec![
            CompanyRecord {
                cik: "100".to_string(),
                ticker: "ACME".to_string(),
                name: "Acme Inc.".to_string(),
            },
            CompanyRecord {
                cik: "200".to_string(),
                ticker: "HOOL".to_string(),
                name: "Hooli".to_string(),
            },
        ])
    }

    /// Emits a fixed list of mentions
    struct StaticSource(Vec<CandidateMention>);

    impl CandidateSource for StaticSource {
        fn name(&self) -> &str {
            "static"
        }

        fn candidates(&self, _: &str, _: RelationType, _: Option<&str>) -> Vec<CandidateMention> {
            self.0.clone()
        }
    }

    fn mention(name: &str, confidence: f32) -> CandidateMention {
        CandidateMention {
            company_text: name.to_string(),
            relationship_type: RelationType::Competitor,
            confidence,
            context: format!("{name} context"),
            evidence: Evidence {
                pattern: None,
                full_match: name.to_string(),
                method: "embedding".to_string(),
                similarity: Some(confidence),
            },
            resolved: None,
        }
    }

    #[test]
    fn test_extract_facts_competitor() {
        let extractor = HybridExtractor::new().unwrap();
        let text = "Our principal competitor is Acme, Inc. in the widget market.";
        let results = extractor.extract_facts(text, RelationType::Competitor);

        assert_eq!(results.len(), 1);
        let r = &results[0];
        assert_eq!(r.company_text(), "Acme");
        assert_eq!(r.tier(), ExtractionTier::Fact);
        assert_eq!(r.confidence(), 0.95);
        assert_eq!(r.evidence().pattern.as_deref(), Some("principal_competitor"));
        assert_eq!(r.evidence().method, METHOD_DIRECTIONAL_PATTERN);
        assert!(!r.is_resolved());
    }

    #[test]
    fn test_extract_facts_respects_thresholds() {
        let thresholds = ThresholdConfig::default().with(
            RelationType::Competitor,
            TierThresholds::new(0.99, 0.30, true),
        );
        let extractor = HybridExtractor::from_parts(
            DirectionalExtractor::new().unwrap(),
            TierPolicy::new(thresholds),
        );
        let text = "Our principal competitor is Acme, Inc. in the widget market.";
        assert!(extractor
            .extract_facts(text, RelationType::Competitor)
            .is_empty());
    }

    #[test]
    fn test_extract_facts_for_unknown_label() {
        let extractor = HybridExtractor::new().unwrap();
        let text = "Our principal competitor is Acme, Inc. in the widget market.";
        assert!(extractor
            .extract_facts_for_label(text, "HAS_INVESTOR")
            .is_empty());
        assert_eq!(
            extractor
                .extract_facts_for_label(text, "HAS_COMPETITOR")
                .len(),
            1
        );
    }

    #[test]
    fn test_candidates_never_become_facts() {
        let source = StaticSource(vec![mention("Initech", 0.99), mention("Globex", 0.35)]);
        let extractor = HybridExtractor::new()
            .unwrap()
            .with_candidate_source(Arc::new(source));

        let results = extractor.extract("No patterns here.", RelationType::Competitor, None);
        assert_eq!(results.len(), 2);
        assert!(results.iter().all(|r| r.tier() == ExtractionTier::Candidate));
    }

    #[test]
    fn test_rejected_candidates_dropped() {
        let source = StaticSource(vec![mention("Initech", 0.10)]);
        let extractor = HybridExtractor::new()
            .unwrap()
            .with_candidate_source(Arc::new(source));
        assert!(extractor
            .extract("No patterns here.", RelationType::Competitor, None)
            .is_empty());
    }

    #[test]
    fn test_candidate_duplicating_fact_dropped() {
        let source = StaticSource(vec![mention("ACME Inc", 0.5), mention("Hooli", 0.5)]);
        let extractor = HybridExtractor::new()
            .unwrap()
            .with_candidate_source(Arc::new(source));

        let text = "Our principal competitor is Acme, Inc. in the widget market.";
        let results = extractor.extract(text, RelationType::Competitor, None);

        let names: Vec<&str> = results.iter().map(|r| r.company_text()).collect();
        assert_eq!(names, vec!["Acme", "Hooli"]);
        assert_eq!(results[0].tier(), ExtractionTier::Fact);
        assert_eq!(results[1].tier(), ExtractionTier::Candidate);
    }

    #[test]
    fn test_keyword_source_integration() {
        let keyword =
            KeywordCandidateSource::new(Arc::new(lookup()), &Default::default()).unwrap();
        let extractor = HybridExtractor::new()
            .unwrap()
            .with_candidate_source(Arc::new(keyword));

        let text = "Our principal competitor is Acme, Inc. in the widget market. \
                    The market is competitive and Hooli is also active.";
        let results = extractor.extract(text, RelationType::Competitor, None);

        assert_eq!(results.len(), 2);
        assert_eq!(results[0].company_text(), "Acme");
        assert_eq!(results[1].company_text(), "Hooli");
        assert_eq!(results[1].cik(), Some("200"));
        assert_eq!(results[1].tier(), ExtractionTier::Candidate);
    }

    #[test]
    fn test_resolve_results() {
        let extractor = HybridExtractor::new().unwrap();
        let text = "Our principal competitor is Acme, Inc. in the widget market. \
                    We compete with Initech in services.";
        let results = extractor.extract_facts(text, RelationType::Competitor);
        assert_eq!(results.len(), 2);

        let resolved = resolve_results(results, &lookup());
        assert_eq!(resolved.len(), 1);
        assert_eq!(resolved[0].cik(), Some("100"));
        assert_eq!(resolved[0].ticker(), Some("ACME"));
        assert_eq!(resolved[0].tier(), ExtractionTier::Fact);
    }

    #[test]
    fn test_recommended_action() {
        let extractor = HybridExtractor::new().unwrap();
        assert_eq!(
            extractor
                .get_recommended_action("HAS_COMPETITOR")
                .map(|a| a.name()),
            Some("extract_with_tiered_storage")
        );
        assert!(extractor.get_recommended_action("HAS_INVESTOR").is_none());
    }

    #[test]
    fn test_result_serializes_label() {
        let extractor = HybridExtractor::new().unwrap();
        let text = "Our principal competitor is Acme, Inc. in the widget market.";
        let results = extractor.extract_facts(text, RelationType::Competitor);
        let json = serde_json::to_value(&results[0]).unwrap();
        assert_eq!(json["relationship_type"], "HAS_COMPETITOR");
        assert_eq!(json["tier"], "fact");
        assert_eq!(json["evidence"]["pattern"], "principal_competitor");
    }
}
