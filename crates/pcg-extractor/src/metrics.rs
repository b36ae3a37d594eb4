//! Quality Metrics module
//!
//! Precision, recall and F1 of extracted (company, relationship type) pairs
//! against a gold standard, per relationship type and in aggregate. Used to
//! check threshold calibration.

use std::collections::{BTreeMap, HashSet};

use serde::{Deserialize, Serialize};

use pcg_core::RelationType;

use crate::hybrid::HybridExtractionResult;
use crate::normalize::name_key;

// ============================================================================
// Relation Metrics
// ============================================================================

/// Confusion counts for one relationship type
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelationMetrics {
    /// True positives (predicted and in gold)
    pub true_positives: usize,
    /// False positives (predicted, not in gold)
    pub false_positives: usize,
    /// False negatives (in gold, missed)
    pub false_negatives: usize,
    pub gold_total: usize,
    pub predicted_total: usize,
}

impl RelationMetrics {
    /// Calculate precision (TP / (TP + FP))
    pub fn precision(&self) -> f32 {
        if self.true_positives + self.false_positives == 0 {
            0.0
        } else {
            self.true_positives as f32 / (self.true_positives + self.false_positives) as f32
        }
    }

    /// Calculate recall (TP / (TP + FN))
    pub fn recall(&self) -> f32 {
        if self.true_positives + self.false_negatives == 0 {
            0.0
        } else {
            self.true_positives as f32 / (self.true_positives + self.false_negatives) as f32
        }
    }

    /// Calculate F1 score (2 * P * R / (P + R))
    pub fn f1_score(&self) -> f32 {
        let p = self.precision();
        let r = self.recall();
        if p + r == 0.0 {
            0.0
        } else {
            2.0 * p * r / (p + r)
        }
    }

    fn add(&mut self, other: &RelationMetrics) {
        self.true_positives += other.true_positives;
        self.false_positives += other.false_positives;
        self.false_negatives += other.false_negatives;
        self.gold_total += other.gold_total;
        self.predicted_total += other.predicted_total;
    }
}

// ============================================================================
// Gold Standard Types
// ============================================================================

/// A labelled relationship: `company` is the counterparty of the filer
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct GoldRelation {
    pub company: String,
    pub relationship_type: RelationType,
}

impl GoldRelation {
    pub fn new(company: impl Into<String>, relationship_type: RelationType) -> Self {
        Self {
            company: company.into(),
            relationship_type,
        }
    }

    fn key(&self) -> (RelationType, String) {
        (self.relationship_type, name_key(&self.company))
    }
}

impl From<&HybridExtractionResult> for GoldRelation {
    fn from(r: &HybridExtractionResult) -> Self {
        Self::new(r.company_text(), r.relationship_type())
    }
}

// ============================================================================
// Evaluator
// ============================================================================

/// Metrics per relationship type plus their sum
#[derive(Debug, Clone, Default, Serialize)]
pub struct EvaluationReport {
    pub per_type: BTreeMap<RelationType, RelationMetrics>,
    pub overall: RelationMetrics,
}

impl EvaluationReport {
    pub fn for_type(&self, rel: RelationType) -> RelationMetrics {
        self.per_type.get(&rel).copied().unwrap_or_default()
    }

    /// Whether a type reaches a precision target
    pub fn meets_precision(&self, rel: RelationType, target: f32) -> bool {
        self.for_type(rel).precision() >= target
    }

    /// Human-readable summary
    pub fn report(&self) -> String {
        let mut out = String::from("=== Relationship Extraction Quality ===\n\n");
        for (rel, m) in &self.per_type {
            out.push_str(&format!(
                "{}:\n  Precision: {:.1}%\n  Recall:    {:.1}%\n  F1 Score:  {:.1}%\n  Gold: {} | Predicted: {} | TP: {} | FP: {} | FN: {}\n\n",
                rel.edge_label(),
                m.precision() * 100.0,
                m.recall() * 100.0,
                m.f1_score() * 100.0,
                m.gold_total,
                m.predicted_total,
                m.true_positives,
                m.false_positives,
                m.false_negatives,
            ));
        }
        out.push_str(&format!(
            "Overall: P {:.1}% | R {:.1}% | F1 {:.1}%\n",
            self.overall.precision() * 100.0,
            self.overall.recall() * 100.0,
            self.overall.f1_score() * 100.0,
        ));
        out
    }
}

/// Compare predictions to gold on normalized company names.
///
/// Duplicate predictions of the same pair count once.
pub fn evaluate(predicted: &[GoldRelation], gold: &[GoldRelation]) -> EvaluationReport {
    let predicted_set: HashSet<(RelationType, String)> =
        predicted.iter().map(GoldRelation::key).collect();
    let gold_set: HashSet<(RelationType, String)> = gold.iter().map(GoldRelation::key).collect();

    let mut report = EvaluationReport::default();
    for rel in RelationType::ALL {
        let p: HashSet<&String> = predicted_set
            .iter()
            .filter(|(r, _)| *r == rel)
            .map(|(_, name)| name)
            .collect();
        let g: HashSet<&String> = gold_set
            .iter()
            .filter(|(r, _)| *r == rel)
            .map(|(_, name)| name)
            .collect();
        if p.is_empty() && g.is_empty() {
            continue;
        }

        let true_positives = p.intersection(&g).count();
        let metrics = RelationMetrics {
            true_positives,
            false_positives: p.len() - true_positives,
            false_negatives: g.len() - true_positives,
            gold_total: g.len(),
            predicted_total: p.len(),
        };
        report.overall.add(&metrics);
        report.per_type.insert(rel, metrics);
    }
    report
}

/// [`evaluate`] over extraction results
pub fn evaluate_results(
    results: &[HybridExtractionResult],
    gold: &[GoldRelation],
) -> EvaluationReport {
    let predicted: Vec<GoldRelation> = results.iter().map(GoldRelation::from).collect();
    evaluate(&predicted, gold)
}

// ============================================================================
// Tests
// ============================================================================
