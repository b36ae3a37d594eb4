//! Directional relationship extraction
//!
//! Classifies company mentions by their syntactic position relative to a
//! trigger phrase. "We purchase components from X" and "X purchases from us"
//! differ only in which side of the trigger the company sits on, so each
//! relationship type is scanned with separate outbound and inbound tables.

use std::collections::HashMap;

use regex::{Regex, RegexBuilder};
use serde::Serialize;

use pcg_core::{ExtractionConfig, PcgError, RelationType, Result, MIN_COMPANY_CHARS};

use crate::normalize::clean_company_name;
use crate::patterns::{self, Direction, PatternDef};

// ============================================================================
// Matches
// ============================================================================

/// One raw pattern hit inside a sentence
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DirectionalMatch {
    /// Captured company span, trimmed but not cleaned
    pub company_text: String,
    pub relationship_type: RelationType,
    /// Static weight of the pattern that fired
    pub confidence: f32,
    pub pattern_name: String,
    pub direction: Direction,
    /// Full substring matched by the pattern
    pub full_match: String,
    /// Leading window of the containing sentence
    pub context: String,
}

impl DirectionalMatch {
    /// Company name with trailing punctuation and legal suffixes removed
    pub fn cleaned_name(&self) -> String {
        clean_company_name(&self.company_text)
    }
}

// ============================================================================
// Sentence splitting
// ============================================================================

/// Best-effort sentence splitter.
///
/// Breaks after `.`, `!` or `?` followed by whitespace. Abbreviations such as
/// "Corp." therefore end a sentence; pattern confidences were calibrated
/// against exactly this behaviour.
#[derive(Debug, Clone)]
pub struct SentenceSplitter {
    boundary: Regex,
}

impl SentenceSplitter {
    pub fn new() -> Result<Self> {
        let boundary = Regex::new(r"[.!?]\s+").map_err(|source| PcgError::PatternCompile {
            name: "sentence_boundary".to_string(),
            source,
        })?;
        Ok(Self { boundary })
    }

    /// Split text into sentences; terminal punctuation stays with its sentence
    pub fn split<'a>(&self, text: &'a str) -> Vec<&'a str> {
        let mut sentences = Vec::new();
        let mut start = 0;

        for boundary in self.boundary.find_iter(text) {
            // Punctuation is a single ASCII byte
            let end = boundary.start() + 1;
            sentences.push(&text[start..end]);
            start = boundary.end();
        }
        if start < text.len() {
            sentences.push(&text[start..]);
        }

        sentences.retain(|s| !s.is_empty());
        sentences
    }
}

// ============================================================================
// Extractor
// ============================================================================

#[derive(Debug)]
struct CompiledPattern {
    regex: Regex,
    def: &'static PatternDef,
}

/// Extracts relationships with directional patterns.
///
/// Patterns are compiled once at construction; the extractor holds no
/// mutable state and can be shared across threads.
#[derive(Debug)]
pub struct DirectionalExtractor {
    outbound: HashMap<RelationType, Vec<CompiledPattern>>,
    inbound: HashMap<RelationType, Vec<CompiledPattern>>,
    splitter: SentenceSplitter,
    context_chars: usize,
    min_company_chars: usize,
}

impl DirectionalExtractor {
    /// Compile the pattern library with default extraction settings
    pub fn new() -> Result<Self> {
        Self::with_config(&ExtractionConfig::default())
    }

    /// Compile the pattern library. Fails if any pattern does not compile.
    ///
    /// `min_company_chars` never drops below [`MIN_COMPANY_CHARS`].
    pub fn with_config(config: &ExtractionConfig) -> Result<Self> {
        let mut outbound = HashMap::new();
        let mut inbound = HashMap::new();

        for rel in RelationType::ALL {
            outbound.insert(rel, compile_table(patterns::outbound(rel))?);
            inbound.insert(rel, compile_table(patterns::inbound(rel))?);
        }

        Ok(Self {
            outbound,
            inbound,
            splitter: SentenceSplitter::new()?,
            context_chars: config.context_chars,
            min_company_chars: config.min_company_chars.max(MIN_COMPANY_CHARS),
        })
    }

    /// Extract matches for the given types (all types when `None`).
    ///
    /// Output follows sentence order; within a sentence, the requested type
    /// order, outbound before inbound, then pattern-table order.
    pub fn extract(&self, text: &str, types: Option<&[RelationType]>) -> Vec<DirectionalMatch> {
        let types = dedup_types(types.unwrap_or(&RelationType::ALL));
        let mut matches = Vec::new();

        for sentence in self.splitter.split(text) {
            for rel in &types {
                for direction in [Direction::Outbound, Direction::Inbound] {
                    self.scan(sentence, *rel, direction, &mut matches);
                }
            }
        }

        tracing::debug!(
            matches = matches.len(),
            types = types.len(),
            "directional extraction finished"
        );
        matches
    }

    /// Extract matches for a single type given by label.
    ///
    /// An unknown label yields no matches.
    pub fn extract_for_label(&self, text: &str, label: &str) -> Vec<DirectionalMatch> {
        match RelationType::from_label(label) {
            Some(rel) => self.extract(text, Some(&[rel])),
            None => {
                tracing::warn!(label, "unknown relationship type, nothing extracted");
                Vec::new()
            }
        }
    }

    /// Sentence splitter used by this extractor
    pub fn splitter(&self) -> &SentenceSplitter {
        &self.splitter
    }

    fn scan(
        &self,
        sentence: &str,
        rel: RelationType,
        direction: Direction,
        out: &mut Vec<DirectionalMatch>,
    ) {
        let table = match direction {
            Direction::Outbound => self.outbound.get(&rel),
            Direction::Inbound => self.inbound.get(&rel),
        };
        let Some(table) = table else {
            return;
        };

        for compiled in table {
            for caps in compiled.regex.captures_iter(sentence) {
                let Some(company) = caps.get(1).map(|m| m.as_str().trim()) else {
                    continue;
                };
                if company.chars().count() < self.min_company_chars {
                    continue;
                }
                let full_match = caps.get(0).map(|m| m.as_str()).unwrap_or_default();

                out.push(DirectionalMatch {
                    company_text: company.to_string(),
                    relationship_type: rel,
                    confidence: compiled.def.confidence,
                    pattern_name: compiled.def.name.to_string(),
                    direction,
                    full_match: full_match.to_string(),
                    context: sentence.chars().take(self.context_chars).collect(),
                });
            }
        }
    }
}

fn compile_table(defs: &'static [PatternDef]) -> Result<Vec<CompiledPattern>> {
    defs.iter()
        .map(|def| {
            RegexBuilder::new(def.pattern)
                .case_insensitive(true)
                .build()
                .map(|regex| CompiledPattern { regex, def })
                .map_err(|source| PcgError::PatternCompile {
                    name: def.name.to_string(),
                    source,
                })
        })
        .collect()
}

fn dedup_types(types: &[RelationType]) -> Vec<RelationType> {
    let mut unique = Vec::with_capacity(types.len());
    for rel in types {
        if !unique.contains(rel) {
            unique.push(*rel);
        }
    }
    unique
}

// ============================================================================
// Tests
// ============================================================================
