//! Entity resolution boundary
//!
//! Resolving a free-text company name to a canonical (ticker, CIK) identity
//! needs a company registry, so it sits behind the [`EntityResolver`] trait.
//! [`CompanyLookup`] is an in-memory registry built from known companies.

use std::collections::HashMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use pcg_core::{PcgError, Result};

/// A company resolved to canonical identifiers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolvedCompany {
    pub cik: String,
    pub ticker: String,
    pub name: String,
    /// How certain the resolver is about this identity
    pub confidence: f32,
}

/// Resolves a company name (with its sentence context) to an identity.
///
/// Returning `None` means "not found"; callers drop the relationship rather
/// than treat it as an error.
pub trait EntityResolver: Send + Sync {
    fn resolve(&self, name: &str, context: &str) -> Option<ResolvedCompany>;
}

/// A registry record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompanyRecord {
    pub cik: String,
    #[serde(default)]
    pub ticker: String,
    pub name: String,
}

// ============================================================================
// Blocklists
// ============================================================================

/// Short uppercase words and acronyms that collide with ticker symbols
pub const TICKER_BLOCKLIST: &[&str] = &[
    // 2-letter words
    "AN", "BY", "ON", "OR", "SO", "BE", "DO", "GO", "IN", "AT", "IS", "UP", "WE", "AB", "SA",
    "AS", "EU", "UK",
    // 3-4 letter common words
    "FOR", "ALL", "ANY", "ARE", "CAN", "HAS", "NOW", "ONE", "OUT", "SEE", "TWO", "BIG", "NEW",
    "OLD", "OUR", "THE", "AND", "ACT", "YOU", "CAR", "NET", "BDC", "HHS", "ACA", "ESG", "DMA",
    // Longer common words
    "WHEN", "MOST", "ALSO", "ONLY", "VERY", "WELL", "EVEN", "JUST", "SOME", "SUCH", "MANY",
    "BOTH", "EACH", "MORE", "MUST", "WILL", "BEEN", "REAL", "DRUG", "FORM",
    // Technical acronyms
    "IT", "PC", "AI", "IP", "HR", "PR", "AG", "EC", "ASIC", "DSP", "GPU", "CPU", "SOC",
    // Geographic
    "US", "USA", "EEA",
];

/// Company names that are also common English words
pub const NAME_BLOCKLIST: &[&str] = &[
    "reliance", "alliance", "target", "focus", "insight", "advantage", "premier", "progress",
    "catalyst", "service", "services", "system", "systems", "technology", "technologies",
    "solution", "solutions", "platform", "platforms", "group", "holdings", "partners",
    "associates", "ventures", "industries", "enterprises", "management", "investment",
    "investments", "financial", "securities", "resources", "capital",
];

/// Whether a candidate string is too generic to resolve
pub fn is_blocklisted(candidate: &str) -> bool {
    let upper = candidate.trim().to_uppercase();
    if upper.chars().count() == 1 || TICKER_BLOCKLIST.contains(&upper.as_str()) {
        return true;
    }
    let lower = candidate.trim().to_lowercase();
    NAME_BLOCKLIST.contains(&lower.as_str())
}

// ============================================================================
// Name normalization for registry keys
// ============================================================================

/// Registry suffixes, longest forms first
const REGISTRY_SUFFIXES: &[&str] = &[
    " corporation",
    " incorporated",
    " holdings ltd",
    " holding ltd",
    " holdings",
    " holding",
    " technologies",
    " technology",
    " solutions",
    " platforms",
    " services",
    " systems",
    " group",
    " corp.",
    " corp",
    " inc.",
    " inc",
    " ltd.",
    " ltd",
    " llc",
    " plc",
    " co.",
    " co",
    "/de/",
    "/md/",
    "/nv/",
];

/// Lowercase registry key with corporate suffixes and edge punctuation removed.
///
/// More aggressive than [`crate::normalize::clean_company_name`]: it is only
/// used to index and probe the registry, never for display.
pub fn registry_key(name: &str) -> String {
    let mut key = name.trim().to_lowercase();

    for suffix in REGISTRY_SUFFIXES {
        if let Some(stripped) = key.strip_suffix(suffix) {
            key = stripped.to_string();
        }
    }

    key.trim_matches(|c: char| c.is_whitespace() || matches!(c, ',' | '.' | '-'))
        .to_string()
}

// ============================================================================
// In-memory registry
// ============================================================================

/// In-memory company registry indexed by name, normalized name and ticker
#[derive(Debug, Clone, Default)]
pub struct CompanyLookup {
    by_name: HashMap<String, CompanyRecord>,
    by_ticker: HashMap<String, CompanyRecord>,
}

impl CompanyLookup {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from a list of records
    pub fn from_records(records: impl IntoIterator<Item = CompanyRecord>) -> Self {
        let mut lookup = Self::new();
        for record in records {
            lookup.add(record);
        }
        lookup
    }

    /// Load a JSON array of `{cik, ticker, name}` records
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            PcgError::Storage(format!("failed to read {}: {}", path.display(), e))
        })?;
        let records: Vec<CompanyRecord> = serde_json::from_str(&content).map_err(|e| {
            PcgError::Storage(format!("failed to parse {}: {}", path.display(), e))
        })?;

        let lookup = Self::from_records(records);
        tracing::info!(
            names = lookup.by_name.len(),
            tickers = lookup.by_ticker.len(),
            "built company lookup"
        );
        Ok(lookup)
    }

    /// Register a company under its full name, normalized name and ticker
    pub fn add(&mut self, record: CompanyRecord) {
        let full = record.name.trim().to_lowercase();
        if !full.is_empty() {
            let key = registry_key(&record.name);
            if !key.is_empty() && key != full {
                self.by_name.insert(key, record.clone());
            }
            self.by_name.insert(full, record.clone());
        }

        let ticker = record.ticker.trim().to_uppercase();
        if !ticker.is_empty() {
            self.by_ticker.insert(ticker, record);
        }
    }

    pub fn len(&self) -> usize {
        self.by_name.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_name.is_empty() && self.by_ticker.is_empty()
    }

    fn resolved(record: &CompanyRecord, confidence: f32) -> ResolvedCompany {
        ResolvedCompany {
            cik: record.cik.clone(),
            ticker: record.ticker.clone(),
            name: record.name.clone(),
            confidence,
        }
    }
}

impl EntityResolver for CompanyLookup {
    /// Exact ticker (1.0), exact name (1.0), then normalized name (0.95)
    fn resolve(&self, name: &str, _context: &str) -> Option<ResolvedCompany> {
        let candidate = name.trim();
        if candidate.is_empty() || is_blocklisted(candidate) {
            return None;
        }

        if let Some(record) = self.by_ticker.get(&candidate.to_uppercase()) {
            return Some(Self::resolved(record, 1.0));
        }
        if let Some(record) = self.by_name.get(&candidate.to_lowercase()) {
            return Some(Self::resolved(record, 1.0));
        }

        let key = registry_key(candidate);
        if key.is_empty() {
            return None;
        }
        self.by_name
            .get(&key)
            .map(|record| Self::resolved(record, 0.95))
    }
}
