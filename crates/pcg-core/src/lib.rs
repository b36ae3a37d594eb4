//! PCG Core - Domain models, errors, and shared configuration
//!
//! This crate defines the core abstractions used throughout the PCG system:
//! - Business relationship types and their graph edge labels
//! - Extraction confidence tiers
//! - Common error types
//! - Configuration management (thresholds, extraction, logging)

pub mod config;

pub use config::{
    AppConfig, ConfigError, ExtractionConfig, LoggingConfig, ThresholdConfig, TierThresholds,
    MIN_COMPANY_CHARS,
};

use serde::{Deserialize, Serialize};
use thiserror::Error;

// ============================================================================
// Error Types
// ============================================================================

/// Core error types for PCG operations
#[derive(Error, Debug)]
pub enum PcgError {
    #[error("Failed to compile pattern '{name}': {source}")]
    PatternCompile {
        name: String,
        #[source]
        source: regex::Error,
    },

    #[error("Invalid threshold: {0}")]
    InvalidThreshold(String),

    #[error("Unknown relationship type: {0}")]
    UnknownRelationType(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl From<ConfigError> for PcgError {
    fn from(err: ConfigError) -> Self {
        Self::Config(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, PcgError>;

// ============================================================================
// Relationship Types
// ============================================================================

/// Directed business relationship between the filer and a counterparty.
///
/// Serialized as the graph edge label (`HAS_SUPPLIER`, ...), which is the
/// canonical relationship-type code handed to persistence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum RelationType {
    #[serde(rename = "HAS_SUPPLIER")]
    Supplier,
    #[serde(rename = "HAS_CUSTOMER")]
    Customer,
    #[serde(rename = "HAS_COMPETITOR")]
    Competitor,
    #[serde(rename = "HAS_PARTNER")]
    Partner,
}

impl RelationType {
    /// All relationship types, in canonical order
    pub const ALL: [RelationType; 4] = [
        Self::Supplier,
        Self::Customer,
        Self::Competitor,
        Self::Partner,
    ];

    /// Graph edge label for a FACT edge
    pub fn edge_label(&self) -> &'static str {
        match self {
            Self::Supplier => "HAS_SUPPLIER",
            Self::Customer => "HAS_CUSTOMER",
            Self::Competitor => "HAS_COMPETITOR",
            Self::Partner => "HAS_PARTNER",
        }
    }

    /// Graph edge label for a CANDIDATE edge, kept out of default traversals
    pub fn candidate_label(&self) -> &'static str {
        match self {
            Self::Supplier => "CANDIDATE_SUPPLIER",
            Self::Customer => "CANDIDATE_CUSTOMER",
            Self::Competitor => "CANDIDATE_COMPETITOR",
            Self::Partner => "CANDIDATE_PARTNER",
        }
    }

    /// Lowercase short name
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Supplier => "supplier",
            Self::Customer => "customer",
            Self::Competitor => "competitor",
            Self::Partner => "partner",
        }
    }

    /// Parse an edge label (`HAS_COMPETITOR`) or a short name (`competitor`).
    ///
    /// Unknown strings return `None`; callers treat the type as a filter.
    pub fn from_label(s: &str) -> Option<Self> {
        if let Some(rel) = Self::ALL.iter().find(|r| r.edge_label() == s) {
            return Some(*rel);
        }
        match s.to_lowercase().as_str() {
            "supplier" => Some(Self::Supplier),
            "customer" => Some(Self::Customer),
            "competitor" => Some(Self::Competitor),
            "partner" => Some(Self::Partner),
            _ => None,
        }
    }

    /// Parse a `CANDIDATE_*` label back to its relationship type
    pub fn from_candidate_label(s: &str) -> Option<Self> {
        Self::ALL.iter().find(|r| r.candidate_label() == s).copied()
    }
}

impl std::fmt::Display for RelationType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.edge_label())
    }
}

impl std::str::FromStr for RelationType {
    type Err = PcgError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Self::from_label(s).ok_or_else(|| PcgError::UnknownRelationType(s.to_string()))
    }
}

// ============================================================================
// Extraction Tiers
// ============================================================================

/// Confidence tier assigned to an extracted relationship
///
/// - `Fact`: safe for analytics, zero tolerance for false positives
/// - `Candidate`: stored with evidence, excluded from analytics until corroborated
/// - `Rejected`: discarded, never persisted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExtractionTier {
    Fact,
    Candidate,
    Rejected,
}

impl ExtractionTier {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Fact => "fact",
            Self::Candidate => "candidate",
            Self::Rejected => "rejected",
        }
    }

    /// Whether results of this tier may be written to the graph at all
    pub fn is_persistable(&self) -> bool {
        !matches!(self, Self::Rejected)
    }
}

impl std::fmt::Display for ExtractionTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ============================================================================
// Tests
// ============================================================================
