//! Directional pattern library
//!
//! Immutable registry of the trigger phrases that encode which party is the
//! grammatical subject of a relationship sentence:
//! - Outbound: "we" (the filer) act on the matched company, which follows
//!   the trigger ("we sell to X", "we compete with X").
//! - Inbound: the matched company acts toward the filer ("supplied by X",
//!   "X buys from us").
//!
//! Each confidence is a hand-calibrated constant reflecting the measured
//! precision of that trigger. Adding or retuning a pattern is a code change
//! so every pattern's contribution stays individually auditable.

use serde::Serialize;

use pcg_core::RelationType;

/// Which side of the trigger phrase the company span sits on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    /// Filer acts on the company
    Outbound,
    /// Company acts toward the filer
    Inbound,
}

/// A single pattern definition: (regex source, base confidence, name)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PatternDef {
    /// Regex source; capture group 1 is the company span
    pub pattern: &'static str,
    /// Static confidence copied into every match of this pattern
    pub confidence: f32,
    /// Unique name within its (relationship, direction) table
    pub name: &'static str,
}

const fn def(pattern: &'static str, confidence: f32, name: &'static str) -> PatternDef {
    PatternDef {
        pattern,
        confidence,
        name,
    }
}

// ============================================================================
// Outbound tables (we -> them)
// ============================================================================

static CUSTOMER_OUTBOUND: &[PatternDef] = &[
    def(
        r"we\s+sell\s+(?:our\s+)?(?:[\w\s]+?\s+)?(?:to|through)\s+([A-Z][A-Za-z\s&,\.]+?)(?:\.|,|;|and\s)",
        0.95,
        "sell_to",
    ),
    def(
        r"we\s+provide\s+(?:[\w\s]+?\s+)?to\s+([A-Z][A-Za-z\s&,\.]+?)(?:\.|,|;|and\s)",
        0.90,
        "provide_to",
    ),
    def(
        r"our\s+(?:largest|major|significant|key)\s+customers?\s+(?:include|are|is)[:\s]+([A-Z][A-Za-z\s&,\.]+?)(?:\.|,|;|and\s)",
        0.95,
        "major_customer",
    ),
    def(
        r"customers?\s+(?:such\s+as|like)\s+([A-Z][A-Za-z\s&,\.]+?)(?:\.|,|;|and\s)",
        0.85,
        "customer_such_as",
    ),
    def(
        r"customers?\s+(?:include|including)[:\s]+([A-Z][A-Za-z\s&,\.]+?)(?:\.|,|;|and\s)",
        0.90,
        "customer_include",
    ),
    def(
        r"for\s+customers?\s+(?:such\s+as|including|like)\s+([A-Z][A-Za-z\s&,\.]+?)(?:\.|,|;|and\s)",
        0.90,
        "for_customer",
    ),
    def(
        r"([A-Z][A-Za-z\s&,\.]+?)\s+(?:has\s+)?contracted\s+with\s+us",
        0.90,
        "contracted_with_us",
    ),
];

static PARTNER_OUTBOUND: &[PatternDef] = &[
    def(
        r"we\s+partner(?:ed)?\s+with\s+([A-Z][A-Za-z\s&,\.]+?)(?:\.|,|;|and\s|\s+to\s)",
        0.95,
        "partner_with",
    ),
    def(
        r"(?:strategic\s+)?(?:alliance|partnership)\s+with\s+([A-Z][A-Za-z\s&,\.]+?)(?:\.|,|;|and\s)",
        0.90,
        "alliance_with",
    ),
    def(
        r"joint\s+venture\s+with\s+([A-Z][A-Za-z\s&,\.]+?)(?:\.|,|;|and\s)",
        0.95,
        "joint_venture",
    ),
    def(
        r"collaborat(?:e|ion|ing)\s+(?:with|agreement\s+with)\s+([A-Z][A-Za-z\s&,\.]+?)(?:\.|,|;|and\s)",
        0.85,
        "collaborate_with",
    ),
    def(
        r"(?:alliance|channel)\s+partners?\s+(?:include|such\s+as|like)[:\s]+([A-Z][A-Za-z\s&,\.]+?)(?:\.|,|;|and\s)",
        0.90,
        "alliance_partner",
    ),
    def(
        r"the\s+([A-Z][A-Za-z\s&,\.]+?)\s+(?:partnership|collaboration|alliance)",
        0.85,
        "the_partnership",
    ),
    def(
        r"(?:co-?brand|licensing)\s+(?:arrangement|agreement)s?\s+with\s+([A-Z][A-Za-z\s&,\.]+?)(?:\.|,|;|and\s)",
        0.85,
        "cobrand",
    ),
    def(
        r"(?:strategic|ecosystem)\s+relationship(?:s)?\s+with\s+([A-Z][A-Za-z\s&,\.]+?)(?:\.|,|;|and\s)",
        0.80,
        "strategic_relationship",
    ),
];

static COMPETITOR_OUTBOUND: &[PatternDef] = &[
    def(
        r"we\s+compete\s+(?:with|against)\s+([A-Z][A-Za-z\s&,\.]+?)(?:\.|,|;|and\s)",
        0.95,
        "compete_with",
    ),
    def(
        r"(?:principal|main|primary|key|major)\s+competitors?\s+(?:include|are|is)[:\s]+([A-Z][A-Za-z\s&,\.]+?)(?:\.|,|;|and\s)",
        0.95,
        "principal_competitor",
    ),
    def(
        r"competitors?\s+(?:such\s+as|like)\s+([A-Z][A-Za-z\s&,\.]+?)(?:\.|,|;|and\s)",
        0.90,
        "competitor_such_as",
    ),
    def(
        r"competitors?\s+(?:include|including)[:\s]+([A-Z][A-Za-z\s&,\.]+?)(?:\.|,|;|and\s)",
        0.90,
        "competitor_include",
    ),
    def(
        r"competition\s+(?:from|includes?|with)\s+(?:companies\s+(?:such\s+as|like)\s+)?([A-Z][A-Za-z\s&,\.]+?)(?:\.|,|;|and\s)",
        0.85,
        "competition_from",
    ),
    def(
        r"rival(?:s|ry)?\s+(?:such\s+as|include|from|like)\s+([A-Z][A-Za-z\s&,\.]+?)(?:\.|,|;|and\s)",
        0.85,
        "rival",
    ),
    // "Competition" section header running into the first named company
    def(
        r"Competition[\s\n]+(?:In\s+\d+,\s+)?(?:the\s+)?(?:FDA\s+)?(?:\w+\s+)?(?:granted\s+)?(?:approval\s+)?(?:for\s+)?([A-Z][A-Za-z\s&,\.]+?)(?:'s|')",
        0.80,
        "competition_section",
    ),
    def(
        r"competition\s+in\s+(?:these|the)\s+markets?\s+from\s+(?:companies\s+(?:such\s+as|like)\s+)?([A-Z][A-Za-z\s&,\.]+?)(?:\.|,|;|and\s)",
        0.85,
        "market_competition",
    ),
];

// ============================================================================
// Inbound tables (them -> us)
// ============================================================================

static SUPPLIER_INBOUND: &[PatternDef] = &[
    def(
        r"we\s+(?:purchase|source|buy|procure|obtain)\s+(?:[\w\s]+?\s+)?from\s+([A-Z][A-Za-z\s&,\.]+?)(?:\.|,|;|and\s)",
        0.95,
        "purchase_from",
    ),
    def(
        r"(?:supplied|provided|manufactured)\s+by\s+([A-Z][A-Za-z\s&,\.]+?)(?:\.|,|;|and\s)",
        0.90,
        "supplied_by",
    ),
    def(
        r"(?:key|major|principal|primary)\s+suppliers?\s+(?:include|are|is)[:\s]+([A-Z][A-Za-z\s&,\.]+?)(?:\.|,|;|and\s)",
        0.95,
        "key_supplier",
    ),
    def(
        r"suppliers?\s+(?:such\s+as|like)\s+([A-Z][A-Za-z\s&,\.]+?)(?:\.|,|;|and\s)",
        0.90,
        "supplier_such_as",
    ),
    def(
        r"suppliers?\s+(?:include|including)[:\s]+([A-Z][A-Za-z\s&,\.]+?)(?:\.|,|;|and\s)",
        0.90,
        "supplier_include",
    ),
    def(
        r"we\s+(?:rely|depend)\s+on\s+([A-Z][A-Za-z\s&,\.]+?)\s+(?:for|to\s+)",
        0.85,
        "rely_on",
    ),
    def(
        r"components?\s+from\s+([A-Z][A-Za-z\s&,\.]+?)(?:\.|,|;|and\s)",
        0.85,
        "components_from",
    ),
    def(
        r"depend\s+on\s+(?:[\w\s,]+?\s+)?(?:operated\s+by|provided\s+by|from)\s+([A-Z][A-Za-z\s&,\.]+?)(?:\.|,|;|and\s)",
        0.80,
        "depend_on_operated",
    ),
    def(
        r"vendor\s+partners?\s+(?:such\s+as|like|including)[:\s]+([A-Z][A-Za-z\s&,\.]+?)(?:\.|,|;|and\s)",
        0.85,
        "vendor_partner",
    ),
    def(
        r"(?:wholesale\s+)?distributors?\s+(?:such\s+as|like|including)[:\s]+([A-Z][A-Za-z\s&,\.]+?)(?:\.|,|;|and\s)",
        0.85,
        "distributor",
    ),
    def(
        r"from\s+(?:more\s+than\s+)?[\d,]+\s+(?:vendor\s+)?partners?,?\s+(?:including|such\s+as)\s+(?:[\w\s]+?\s+)?([A-Z][A-Za-z\s&,\.]+?)(?:\.|,|;|and\s)",
        0.85,
        "vendor_partner_list",
    ),
];

static CUSTOMER_INBOUND: &[PatternDef] = &[
    def(
        r"([A-Z][A-Za-z\s&,\.]+?)\s+(?:purchases?|buys?)\s+(?:[\w\s]+?\s+)?from\s+us",
        0.90,
        "customer_buys",
    ),
    def(
        r"([A-Z][A-Za-z\s&,\.]+?)\s+is\s+(?:a|our)\s+(?:major|key|significant)?\s*customer",
        0.90,
        "is_customer",
    ),
];

// ============================================================================
// Lookup
// ============================================================================

/// Outbound patterns for a relationship type, in evaluation order
pub fn outbound(rel: RelationType) -> &'static [PatternDef] {
    match rel {
        RelationType::Customer => CUSTOMER_OUTBOUND,
        RelationType::Partner => PARTNER_OUTBOUND,
        RelationType::Competitor => COMPETITOR_OUTBOUND,
        RelationType::Supplier => &[],
    }
}

/// Inbound patterns for a relationship type, in evaluation order
pub fn inbound(rel: RelationType) -> &'static [PatternDef] {
    match rel {
        RelationType::Supplier => SUPPLIER_INBOUND,
        RelationType::Customer => CUSTOMER_INBOUND,
        RelationType::Competitor | RelationType::Partner => &[],
    }
}

/// Patterns for a relationship type and direction
pub fn table(rel: RelationType, direction: Direction) -> &'static [PatternDef] {
    match direction {
        Direction::Outbound => outbound(rel),
        Direction::Inbound => inbound(rel),
    }
}

/// Every pattern for a relationship type: outbound first, then inbound
pub fn all(rel: RelationType) -> impl Iterator<Item = &'static PatternDef> {
    outbound(rel).iter().chain(inbound(rel).iter())
}

/// Find a pattern by name within a relationship type
pub fn find(rel: RelationType, name: &str) -> Option<&'static PatternDef> {
    all(rel).find(|p| p.name == name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_names_unique_per_table() {
        for rel in RelationType::ALL {
            for direction in [Direction::Outbound, Direction::Inbound] {
                let defs = table(rel, direction);
                let names: HashSet<&str> = defs.iter().map(|p| p.name).collect();
                assert_eq!(names.len(), defs.len(), "{rel} {direction:?}");
            }
        }
    }

    #[test]
    fn test_confidences_in_unit_range() {
        for rel in RelationType::ALL {
            for p in all(rel) {
                assert!(
                    (0.0..=1.0).contains(&p.confidence),
                    "{} has confidence {}",
                    p.name,
                    p.confidence
                );
            }
        }
    }

    #[test]
    fn test_every_type_has_patterns() {
        for rel in RelationType::ALL {
            assert!(all(rel).count() > 0, "{rel} has no patterns");
        }
    }

    #[test]
    fn test_direction_assignment() {
        assert!(outbound(RelationType::Supplier).is_empty());
        assert!(!inbound(RelationType::Supplier).is_empty());
        assert!(inbound(RelationType::Competitor).is_empty());
        assert!(!inbound(RelationType::Customer).is_empty());
        assert!(!outbound(RelationType::Customer).is_empty());
    }

    #[test]
    fn test_find() {
        let p = find(RelationType::Competitor, "compete_with").unwrap();
        assert_eq!(p.confidence, 0.95);
        let p = find(RelationType::Competitor, "rival").unwrap();
        assert_eq!(p.confidence, 0.85);
        assert!(find(RelationType::Competitor, "sell_to").is_none());
    }
}
