//! Edge triage
//!
//! Re-tiers edges that are already stored, using their similarity score (or
//! stored confidence) and the current thresholds. Edges written by the
//! directional path are kept as long as their label is known. The result is a
//! plan (keep, convert to candidate, delete); applying it is left to the
//! storage layer.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use pcg_core::{ExtractionTier, RelationType};

use crate::hybrid::METHOD_DIRECTIONAL_PATTERN;
use crate::loader::{EdgeStatus, GraphEdge};
use crate::tier::TierPolicy;

/// An edge as read back from storage
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredEdge {
    pub source_cik: String,
    pub target_cik: String,
    pub label: String,
    /// Embedding similarity recorded at extraction time
    pub similarity: Option<f32>,
    /// Confidence the edge was written with; used when there is no similarity
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f32>,
    /// Evidence method the edge was extracted with
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub method: Option<String>,
    /// Label the edge had before an earlier conversion
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub converted_from: Option<String>,
}

impl StoredEdge {
    pub fn is_directional(&self) -> bool {
        self.method.as_deref() == Some(METHOD_DIRECTIONAL_PATTERN)
    }

    /// Similarity if recorded, otherwise the stored confidence
    pub fn score(&self) -> Option<f32> {
        self.similarity.or(self.confidence)
    }
}

impl From<&GraphEdge> for StoredEdge {
    fn from(edge: &GraphEdge) -> Self {
        // Fact edges drop their evidence; only the directional path writes them
        let method = match (&edge.evidence, edge.status) {
            (Some(evidence), _) => Some(evidence.method.clone()),
            (None, EdgeStatus::Fact) => Some(METHOD_DIRECTIONAL_PATTERN.to_string()),
            (None, EdgeStatus::Candidate) => None,
        };
        Self {
            source_cik: edge.source_cik.clone(),
            target_cik: edge.target_cik.clone(),
            label: edge.label.clone(),
            similarity: edge.evidence.as_ref().and_then(|e| e.similarity),
            confidence: Some(edge.confidence),
            method,
            converted_from: None,
        }
    }
}

/// A `HAS_*` edge demoted to its `CANDIDATE_*` label
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EdgeConversion {
    pub edge: StoredEdge,
    pub target_label: String,
}

impl EdgeConversion {
    /// The edge as it should be stored after conversion
    pub fn converted(&self) -> StoredEdge {
        StoredEdge {
            label: self.target_label.clone(),
            converted_from: Some(self.edge.label.clone()),
            ..self.edge.clone()
        }
    }
}

/// Per-label triage counts
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct TriageStats {
    pub kept: usize,
    pub converted: usize,
    pub deleted: usize,
}

/// Outcome of [`triage_edges`]
#[derive(Debug, Clone, Default, Serialize)]
pub struct TriagePlan {
    pub keep: Vec<StoredEdge>,
    pub convert: Vec<EdgeConversion>,
    pub delete: Vec<StoredEdge>,
    /// Keyed by the label the edge had on input
    pub stats: BTreeMap<String, TriageStats>,
}

impl TriagePlan {
    /// Edges remaining once the plan is applied
    pub fn remaining(&self) -> Vec<StoredEdge> {
        self.keep
            .iter()
            .cloned()
            .chain(self.convert.iter().map(EdgeConversion::converted))
            .collect()
    }

    pub fn is_noop(&self) -> bool {
        self.convert.is_empty() && self.delete.is_empty()
    }
}

enum Verdict {
    Keep,
    Convert(RelationType),
    Delete,
}

fn fact_type(label: &str) -> Option<RelationType> {
    // Only exact HAS_* labels count; short names are not storage labels
    RelationType::ALL.into_iter().find(|r| r.edge_label() == label)
}

fn verdict(edge: &StoredEdge, policy: &TierPolicy) -> Verdict {
    let candidate = RelationType::from_candidate_label(&edge.label);
    let fact = fact_type(&edge.label);
    if candidate.is_none() && fact.is_none() {
        return Verdict::Delete;
    }

    // Pattern weights were tiered at extraction; there is no similarity to re-check
    if edge.is_directional() {
        return Verdict::Keep;
    }

    let Some(score) = edge.score() else {
        return Verdict::Delete;
    };

    if let Some(rel) = candidate {
        // Candidates are never promoted
        return match policy.tier(rel, score) {
            ExtractionTier::Rejected => Verdict::Delete,
            _ => Verdict::Keep,
        };
    }

    match fact {
        Some(rel) => match policy.tier(rel, score) {
            ExtractionTier::Fact => Verdict::Keep,
            ExtractionTier::Candidate => Verdict::Convert(rel),
            ExtractionTier::Rejected => Verdict::Delete,
        },
        None => Verdict::Delete,
    }
}

/// Sort stored edges into keep, convert and delete groups
pub fn triage_edges(edges: Vec<StoredEdge>, policy: &TierPolicy) -> TriagePlan {
    let mut plan = TriagePlan::default();

    for edge in edges {
        let stats = plan.stats.entry(edge.label.clone()).or_default();
        match verdict(&edge, policy) {
            Verdict::Keep => {
                stats.kept += 1;
                plan.keep.push(edge);
            }
            Verdict::Convert(rel) => {
                stats.converted += 1;
                plan.convert.push(EdgeConversion {
                    edge,
                    target_label: rel.candidate_label().to_string(),
                });
            }
            Verdict::Delete => {
                stats.deleted += 1;
                plan.delete.push(edge);
            }
        }
    }

    for (label, stats) in &plan.stats {
        tracing::info!(
            label = %label,
            kept = stats.kept,
            converted = stats.converted,
            deleted = stats.deleted,
            "edge triage"
        );
    }
    plan
}
