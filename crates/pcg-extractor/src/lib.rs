//! PCG Extractor - Directional relationship extraction
//!
//! Extracts SUPPLIER, CUSTOMER, COMPETITOR and PARTNER relationships from
//! filing text. Directional patterns produce FACT-tier results; keyword and
//! similarity sources can only add CANDIDATE-tier results.
//!
//! Pipeline: [`HybridExtractor`] -> [`resolve_results`] -> [`GraphLoader`].

pub mod candidates;
pub mod cleanup;
pub mod directional;
pub mod hybrid;
pub mod loader;
pub mod metrics;
pub mod normalize;
pub mod patterns;
pub mod resolver;
pub mod tier;

pub use candidates::{CandidateMention, CandidateSource, KeywordCandidateSource, SimilarityScorer};
pub use cleanup::{triage_edges, StoredEdge, TriagePlan, TriageStats};
pub use directional::{DirectionalExtractor, DirectionalMatch, SentenceSplitter};
pub use hybrid::{resolve_results, Evidence, HybridExtractionResult, HybridExtractor};
pub use loader::{edge_from_result, EdgeStatus, GraphEdge, GraphLoader, GraphSink, InMemoryGraph, LoadResult};
pub use metrics::{evaluate, evaluate_results, EvaluationReport, GoldRelation, RelationMetrics};
pub use normalize::{clean_company_name, name_key};
pub use patterns::{Direction, PatternDef};
pub use resolver::{CompanyLookup, CompanyRecord, EntityResolver, ResolvedCompany};
pub use tier::{RecommendedAction, TierPolicy};
