//! Candidate-generation path
//!
//! Lower-precision sources that feed CANDIDATE-tier results into the hybrid
//! extractor. The hybrid extractor never lets a candidate become a FACT, so a
//! source only has to produce a mention, a confidence and its evidence.
//!
//! [`KeywordCandidateSource`] is the keyword path: find sentences that talk
//! about a relationship, pull capitalized spans and tickers out of them, and
//! keep the spans that resolve to a known company.

use std::collections::HashSet;
use std::sync::Arc;

use regex::Regex;
use serde::Serialize;

use pcg_core::{ExtractionConfig, PcgError, RelationType, Result};

use crate::directional::SentenceSplitter;
use crate::hybrid::{Evidence, METHOD_KEYWORD_CANDIDATE};
use crate::resolver::{is_blocklisted, EntityResolver, ResolvedCompany};

/// A relationship mention produced by a candidate source
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CandidateMention {
    pub company_text: String,
    pub relationship_type: RelationType,
    pub confidence: f32,
    pub context: String,
    pub evidence: Evidence,
    /// Identity, when the source resolved it already
    pub resolved: Option<ResolvedCompany>,
}

/// A second, lower-precision source of relationship mentions
pub trait CandidateSource: Send + Sync {
    /// Short name used in logs
    fn name(&self) -> &str;

    /// Mentions of `rel` in `text`. `filer_cik` excludes self-references.
    fn candidates(
        &self,
        text: &str,
        rel: RelationType,
        filer_cik: Option<&str>,
    ) -> Vec<CandidateMention>;
}

/// Scores how well a resolved company fits its context (embedding similarity).
///
/// `None` means no score could be computed; such mentions are dropped.
pub trait SimilarityScorer: Send + Sync {
    fn score(&self, company: &ResolvedCompany, context: &str, rel: RelationType) -> Option<f32>;
}

// ============================================================================
// Keyword tables
// ============================================================================

const COMPETITOR_KEYWORDS: &[&str] = &[
    "competitor",
    "competitors",
    "compete",
    "competes",
    "competing",
    "competition",
    "competitive",
    "rival",
    "rivals",
];

// Customers above 10% of revenue must be disclosed, hence the revenue phrases
const CUSTOMER_KEYWORDS: &[&str] = &[
    "customer",
    "customers",
    "client",
    "clients",
    "significant customer",
    "major customer",
    "largest customer",
    "key customer",
    "principal customer",
    "revenue concentration",
    "customer concentration",
    "accounts for",
    "accounted for",
    "represents",
    "represented",
    "% of revenue",
    "percent of revenue",
    "% of sales",
    "percent of sales",
    "% of net revenue",
    "% of total revenue",
];

const SUPPLIER_KEYWORDS: &[&str] = &[
    "supplier",
    "suppliers",
    "vendor",
    "vendors",
    "supply chain",
    "supply agreement",
    "purchase agreement",
    "source",
    "sources",
    "sourcing",
    "procure",
    "procurement",
    "key supplier",
    "principal supplier",
    "sole supplier",
    "single source",
    "sole source",
    "depend on",
    "reliance on",
    "raw material",
    "raw materials",
    "component",
    "components",
    "manufacturer",
    "manufacturers",
    "contract manufacturer",
];

const PARTNER_KEYWORDS: &[&str] = &[
    "partner",
    "partners",
    "partnership",
    "partnerships",
    "alliance",
    "alliances",
    "strategic alliance",
    "joint venture",
    "joint ventures",
    "collaboration",
    "collaborate",
    "collaborates",
    "collaborating",
    "agreement with",
    "arrangement with",
    "relationship with",
    "licensing agreement",
    "distribution agreement",
    "strategic relationship",
    "business relationship",
];

/// Context keywords for a relationship type
pub fn keywords(rel: RelationType) -> &'static [&'static str] {
    match rel {
        RelationType::Competitor => COMPETITOR_KEYWORDS,
        RelationType::Customer => CUSTOMER_KEYWORDS,
        RelationType::Supplier => SUPPLIER_KEYWORDS,
        RelationType::Partner => PARTNER_KEYWORDS,
    }
}

// ============================================================================
// Keyword source
// ============================================================================

/// Keyword sentence filter + capitalized-span resolution
pub struct KeywordCandidateSource {
    resolver: Arc<dyn EntityResolver>,
    scorer: Option<Arc<dyn SimilarityScorer>>,
    splitter: SentenceSplitter,
    /// Capitalized sequences of one to four words
    name_span: Regex,
    /// All-caps tokens that may be tickers
    ticker_span: Regex,
    context_chars: usize,
    default_confidence: f32,
}

impl KeywordCandidateSource {
    pub fn new(resolver: Arc<dyn EntityResolver>, config: &ExtractionConfig) -> Result<Self> {
        Ok(Self {
            resolver,
            scorer: None,
            splitter: SentenceSplitter::new()?,
            name_span: compile(
                "keyword_name_span",
                r"\b([A-Z][a-zA-Z&\.\-]*(?:\s+[A-Z][a-zA-Z&\.\-]*){0,3})\b",
            )?,
            ticker_span: compile("keyword_ticker_span", r"\b([A-Z]{2,5})\b")?,
            context_chars: config.candidate_context_chars,
            default_confidence: config.keyword_confidence,
        })
    }

    /// Use a similarity scorer instead of the flat keyword confidence
    pub fn with_scorer(mut self, scorer: Arc<dyn SimilarityScorer>) -> Self {
        self.scorer = Some(scorer);
        self
    }

    /// Sentences of `text` mentioning any keyword for `rel`
    pub fn relationship_sentences<'a>(&self, text: &'a str, rel: RelationType) -> Vec<&'a str> {
        let keywords = keywords(rel);
        self.splitter
            .split(text)
            .into_iter()
            .map(str::trim)
            .filter(|sentence| {
                let lower = sentence.to_lowercase();
                !sentence.is_empty() && keywords.iter().any(|kw| lower.contains(kw))
            })
            .collect()
    }

    fn spans<'a>(&self, sentence: &'a str) -> Vec<&'a str> {
        let names = self
            .name_span
            .captures_iter(sentence)
            .filter_map(|caps| caps.get(1).map(|m| m.as_str()));
        let tickers = self
            .ticker_span
            .captures_iter(sentence)
            .filter_map(|caps| caps.get(1).map(|m| m.as_str()));
        names.chain(tickers).map(str::trim).collect()
    }
}

impl CandidateSource for KeywordCandidateSource {
    fn name(&self) -> &str {
        "keyword"
    }

    fn candidates(
        &self,
        text: &str,
        rel: RelationType,
        filer_cik: Option<&str>,
    ) -> Vec<CandidateMention> {
        let mut mentions = Vec::new();
        let mut seen_ciks: HashSet<String> = HashSet::new();

        for sentence in self.relationship_sentences(text, rel) {
            let context: String = sentence.chars().take(self.context_chars).collect();

            for span in self.spans(sentence) {
                if span.chars().count() < 2 || is_blocklisted(span) {
                    continue;
                }
                let Some(resolved) = self.resolver.resolve(span, sentence) else {
                    continue;
                };
                if filer_cik == Some(resolved.cik.as_str()) || seen_ciks.contains(&resolved.cik) {
                    continue;
                }

                let similarity = match &self.scorer {
                    Some(scorer) => match scorer.score(&resolved, sentence, rel) {
                        Some(score) => Some(score),
                        None => continue,
                    },
                    None => None,
                };

                seen_ciks.insert(resolved.cik.clone());
                mentions.push(CandidateMention {
                    company_text: span.to_string(),
                    relationship_type: rel,
                    confidence: similarity.unwrap_or(self.default_confidence),
                    context: context.clone(),
                    evidence: Evidence {
                        pattern: None,
                        full_match: span.to_string(),
                        method: METHOD_KEYWORD_CANDIDATE.to_string(),
                        similarity,
                    },
                    resolved: Some(resolved),
                });
            }
        }

        tracing::debug!(
            relationship = %rel,
            mentions = mentions.len(),
            "keyword candidates generated"
        );
        mentions
    }
}

fn compile(name: &str, pattern: &str) -> Result<Regex> {
    Regex::new(pattern).map_err(|source| PcgError::PatternCompile {
        name: name.to_string(),
        source,
    })
}
