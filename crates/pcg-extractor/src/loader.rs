//! Graph Loader module
//!
//! Converts resolved extraction results into company-to-company edges and
//! writes them through a [`GraphSink`]. FACT results become `HAS_*` edges,
//! CANDIDATE results become `CANDIDATE_*` edges carrying their evidence.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

use pcg_core::{ExtractionTier, RelationType, Result};

use crate::hybrid::{Evidence, HybridExtractionResult};

// ============================================================================
// Edges
// ============================================================================

/// Storage status of an edge
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EdgeStatus {
    Fact,
    Candidate,
}

/// A directed relationship edge between two companies
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GraphEdge {
    /// Filer whose document stated the relationship
    pub source_cik: String,
    pub target_cik: String,
    pub target_ticker: Option<String>,
    /// `HAS_*` for facts, `CANDIDATE_*` for candidates
    pub label: String,
    pub relationship_type: RelationType,
    pub status: EdgeStatus,
    pub confidence: f32,
    /// Only kept for candidates
    #[serde(skip_serializing_if = "Option::is_none")]
    pub evidence: Option<Evidence>,
    pub context: String,
    pub created_at: DateTime<Utc>,
}

impl GraphEdge {
    /// Storage key: one edge per (source, target, label)
    pub fn key(&self) -> (String, String, String) {
        (
            self.source_cik.clone(),
            self.target_cik.clone(),
            self.label.clone(),
        )
    }
}

/// Convert a result into an edge from `source_cik`.
///
/// Returns `None` for REJECTED results, unresolved targets and self-loops.
pub fn edge_from_result(source_cik: &str, result: &HybridExtractionResult) -> Option<GraphEdge> {
    let target_cik = result.cik()?;
    if target_cik == source_cik {
        return None;
    }

    let rel = result.relationship_type();
    let (label, status, evidence) = match result.tier() {
        ExtractionTier::Fact => (rel.edge_label(), EdgeStatus::Fact, None),
        ExtractionTier::Candidate => (
            rel.candidate_label(),
            EdgeStatus::Candidate,
            Some(result.evidence().clone()),
        ),
        ExtractionTier::Rejected => return None,
    };

    Some(GraphEdge {
        source_cik: source_cik.to_string(),
        target_cik: target_cik.to_string(),
        target_ticker: result.ticker().map(str::to_string),
        label: label.to_string(),
        relationship_type: rel,
        status,
        confidence: result.confidence(),
        evidence,
        context: result.context().to_string(),
        created_at: Utc::now(),
    })
}

// ============================================================================
// Sinks
// ============================================================================

/// Destination for relationship edges
#[async_trait]
pub trait GraphSink: Send + Sync {
    /// Write a batch of edges; returns how many were stored or updated
    async fn write_edges(&self, edges: &[GraphEdge]) -> Result<usize>;
}

/// In-memory edge store keyed by (source, target, label).
///
/// On conflict the higher confidence wins.
#[derive(Debug, Default)]
pub struct InMemoryGraph {
    edges: RwLock<HashMap<(String, String, String), GraphEdge>>,
}

impl InMemoryGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.edges.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.edges.read().await.is_empty()
    }

    /// All edges, ordered by key
    pub async fn edges(&self) -> Vec<GraphEdge> {
        let guard = self.edges.read().await;
        let mut edges: Vec<GraphEdge> = guard.values().cloned().collect();
        edges.sort_by_key(|e| e.key());
        edges
    }

    /// Outgoing edges of a company
    pub async fn edges_from(&self, source_cik: &str) -> Vec<GraphEdge> {
        self.edges()
            .await
            .into_iter()
            .filter(|e| e.source_cik == source_cik)
            .collect()
    }
}

#[async_trait]
impl GraphSink for InMemoryGraph {
    async fn write_edges(&self, edges: &[GraphEdge]) -> Result<usize> {
        let mut guard = self.edges.write().await;
        let mut written = 0;

        for edge in edges {
            let key = edge.key();
            let replace = guard
                .get(&key)
                .map_or(true, |existing| edge.confidence > existing.confidence);
            if replace {
                guard.insert(key, edge.clone());
                written += 1;
            }
        }

        Ok(written)
    }
}

// ============================================================================
// Graph Loader
// ============================================================================

/// Result of loading a batch
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct LoadResult {
    /// Edges stored or updated
    pub written: usize,
    /// Results that produced no edge, or lost to a stronger stored edge
    pub skipped: usize,
}

impl LoadResult {
    pub fn is_empty(&self) -> bool {
        self.written == 0
    }

    pub fn total(&self) -> usize {
        self.written + self.skipped
    }
}

/// Converts results to edges and writes them to a sink
pub struct GraphLoader {
    sink: Arc<dyn GraphSink>,
}

impl GraphLoader {
    pub fn new(sink: Arc<dyn GraphSink>) -> Self {
        Self { sink }
    }

    /// Edges for a batch, without writing them
    pub fn prepare(&self, source_cik: &str, results: &[HybridExtractionResult]) -> Vec<GraphEdge> {
        results
            .iter()
            .filter_map(|r| edge_from_result(source_cik, r))
            .collect()
    }

    /// Convert and write a batch of results stated by `source_cik`
    pub async fn load(
        &self,
        source_cik: &str,
        results: &[HybridExtractionResult],
    ) -> Result<LoadResult> {
        let edges = self.prepare(source_cik, results);
        let written = self.sink.write_edges(&edges).await?;

        let result = LoadResult {
            written,
            skipped: results.len().saturating_sub(written),
        };
        tracing::info!(
            source_cik,
            written = result.written,
            skipped = result.skipped,
            "edges loaded"
        );
        Ok(result)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::candidates::{CandidateMention, CandidateSource};
    use crate::hybrid::{resolve_results, HybridExtractor};
    use crate::resolver::{CompanyLookup, CompanyRecord, ResolvedCompany};

    fn lookup() -> CompanyLookup {
        CompanyLookup::from_records(vec![
            CompanyRecord {
                cik: "100".to_string(),
                ticker: "ACME".to_string(),
                name: "Acme Inc.".to_string(),
            },
            CompanyRecord {
                cik: "900".to_string(),
                ticker: "SELF".to_string(),
                name: "Initech".to_string(),
            },
        ])
    }

    struct HooliSource;

    impl CandidateSource for HooliSource {
        fn name(&self) -> &str {
            "hooli"
        }

        fn candidates(&self, _: &str, rel: RelationType, _: Option<&str>) -> Vec<CandidateMention> {
            vec![CandidateMention {
                company_text: "Hooli".to_string(),
                relationship_type: rel,
                confidence: 0.42,
                context: "Hooli is active here".to_string(),
                evidence: Evidence {
                    pattern: None,
                    full_match: "Hooli".to_string(),
                    method: "keyword_candidate".to_string(),
                    similarity: Some(0.42),
                },
                resolved: Some(ResolvedCompany {
                    cik: "200".to_string(),
                    ticker: "HOOL".to_string(),
                    name: "Hooli".to_string(),
                    confidence: 1.0,
                }),
            }]
        }
    }

    fn results() -> Vec<HybridExtractionResult> {
        let extractor = HybridExtractor::new()
            .unwrap()
            .with_candidate_source(Arc::new(HooliSource));
        let text = "We compete with Acme, and we compete with Initech.";
        resolve_results(
            extractor.extract(text, RelationType::Competitor, None),
            &lookup(),
        )
    }

    #[test]
    fn test_edge_labels() {
        let results = results();
        let edges: Vec<GraphEdge> = results
            .iter()
            .filter_map(|r| edge_from_result("900", r))
            .collect();

        // Initech is the filer itself
        assert_eq!(edges.len(), 2);
        assert_eq!(edges[0].label, "HAS_COMPETITOR");
        assert_eq!(edges[0].status, EdgeStatus::Fact);
        assert!(edges[0].evidence.is_none());
        assert_eq!(edges[1].label, "CANDIDATE_COMPETITOR");
        assert_eq!(edges[1].status, EdgeStatus::Candidate);
        assert_eq!(
            edges[1].evidence.as_ref().and_then(|e| e.similarity),
            Some(0.42)
        );
    }

    #[test]
    fn test_unresolved_results_have_no_edge() {
        let extractor = HybridExtractor::new().unwrap();
        let results = extractor.extract_facts("We compete with Acme.", RelationType::Competitor);
        assert!(edge_from_result("900", &results[0]).is_none());
    }

    #[tokio::test]
    async fn test_loader_writes_edges() {
        let graph = Arc::new(InMemoryGraph::new());
        let loader = GraphLoader::new(graph.clone());

        let result = loader.load("900", &results()).await.unwrap();
        assert_eq!(result, LoadResult { written: 2, skipped: 1 });
        assert_eq!(graph.len().await, 2);
        assert_eq!(graph.edges_from("900").await.len(), 2);
        assert!(graph.edges_from("100").await.is_empty());
    }

    #[tokio::test]
    async fn test_reload_keeps_higher_confidence() {
        let graph = Arc::new(InMemoryGraph::new());
        let loader = GraphLoader::new(graph.clone());
        let results = results();

        loader.load("900", &results).await.unwrap();
        let again = loader.load("900", &results).await.unwrap();
        assert_eq!(again.written, 0);
        assert_eq!(graph.len().await, 2);

        let mut stronger = loader.prepare("900", &results);
        stronger.truncate(1);
        stronger[0].confidence = 0.99;
        assert_eq!(graph.write_edges(&stronger).await.unwrap(), 1);

        let stored = graph.edges().await;
        let fact = stored.iter().find(|e| e.label == "HAS_COMPETITOR").unwrap();
        assert_eq!(fact.confidence, 0.99);
    }

    struct OvercountingSink;

    #[async_trait]
    impl GraphSink for OvercountingSink {
        async fn write_edges(&self, edges: &[GraphEdge]) -> Result<usize> {
            Ok(edges.len() + 10)
        }
    }

    #[tokio::test]
    async fn test_sink_overcount_does_not_underflow() {
        let loader = GraphLoader::new(Arc::new(OvercountingSink));
        let result = loader.load("900", &results()).await.unwrap();
        assert_eq!(result.written, 12);
        assert_eq!(result.skipped, 0);
    }

    #[test]
    fn test_load_result() {
        let result = LoadResult {
            written: 3,
            skipped: 2,
        };
        assert_eq!(result.total(), 5);
        assert!(!result.is_empty());
        assert!(LoadResult::default().is_empty());
    }
}
