//! PCG Configuration Management
//!
//! Handles configuration from TOML files and environment variables with
//! calibrated defaults. The configuration is built once and passed explicitly
//! to the tier policy and extractors; nothing here is global or mutable.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::RelationType;

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct AppConfig {
    /// Extraction tuning
    pub extraction: ExtractionConfig,

    /// Per-relationship confidence thresholds
    pub thresholds: ThresholdConfig,

    /// Logging configuration
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// Load configuration from environment variables on top of defaults
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::default().with_env_override()
    }

    /// Load from a TOML file
    pub fn from_file(path: impl Into<PathBuf>) -> Result<Self, ConfigError> {
        let path = path.into();
        let content = std::fs::read_to_string(&path).map_err(|e| ConfigError::FileReadError {
            path: path.clone(),
            source: e,
        })?;

        let config: Self = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path,
            message: e.to_string(),
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Override with environment variables (env takes precedence)
    pub fn with_env_override(mut self) -> Result<Self, ConfigError> {
        if let Ok(level) = std::env::var("PCG_LOG_LEVEL") {
            self.logging.level = level;
        }
        if let Ok(json) = std::env::var("PCG_LOG_JSON") {
            self.logging.json_format = parse_env("PCG_LOG_JSON", &json)?;
        }
        if let Ok(chars) = std::env::var("PCG_CONTEXT_CHARS") {
            self.extraction.context_chars = parse_env("PCG_CONTEXT_CHARS", &chars)?;
        }
        if let Ok(conf) = std::env::var("PCG_KEYWORD_CONFIDENCE") {
            self.extraction.keyword_confidence = parse_env("PCG_KEYWORD_CONFIDENCE", &conf)?;
        }

        self.validate()?;
        Ok(self)
    }

    /// Check value ranges across all sections
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.extraction.validate()?;
        self.thresholds.validate()
    }
}

fn parse_env<T: std::str::FromStr>(key: &str, value: &str) -> Result<T, ConfigError> {
    value.parse().map_err(|_| ConfigError::InvalidValue {
        key: key.to_string(),
        value: value.to_string(),
    })
}

/// Lower bound for `min_company_chars`; shorter spans are stray initials
pub const MIN_COMPANY_CHARS: usize = 3;

/// Extraction tuning
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractionConfig {
    /// Characters of the containing sentence kept as directional match context
    pub context_chars: usize,

    /// Minimum length (in characters, after trimming) of a captured company span.
    /// Values below [`MIN_COMPANY_CHARS`] are rejected.
    pub min_company_chars: usize,

    /// Characters of the containing sentence kept as candidate context
    pub candidate_context_chars: usize,

    /// Confidence given to keyword candidates when no similarity scorer is wired in
    pub keyword_confidence: f32,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            context_chars: 300,
            min_company_chars: MIN_COMPANY_CHARS,
            candidate_context_chars: 200,
            keyword_confidence: 0.40,
        }
    }
}

impl ExtractionConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        if self.context_chars == 0 {
            return Err(ConfigError::InvalidValue {
                key: "extraction.context_chars".to_string(),
                value: "0".to_string(),
            });
        }
        if self.min_company_chars < MIN_COMPANY_CHARS {
            return Err(ConfigError::InvalidValue {
                key: "extraction.min_company_chars".to_string(),
                value: format!(
                    "{} (must be at least {MIN_COMPANY_CHARS})",
                    self.min_company_chars
                ),
            });
        }
        if !(0.0..=1.0).contains(&self.keyword_confidence) {
            return Err(ConfigError::InvalidValue {
                key: "extraction.keyword_confidence".to_string(),
                value: self.keyword_confidence.to_string(),
            });
        }
        Ok(())
    }
}

/// Confidence thresholds for one relationship type
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TierThresholds {
    /// Minimum confidence to treat a relationship as FACT
    pub fact_threshold: f32,

    /// Minimum confidence to retain as CANDIDATE; below it, REJECTED
    pub candidate_threshold: f32,

    /// Whether the FACT tier is trustworthy enough for direct analytics use
    pub analytics_ready: bool,

    /// Advice for callers when the type is not analytics ready
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recommendation: Option<String>,
}

impl TierThresholds {
    pub fn new(fact_threshold: f32, candidate_threshold: f32, analytics_ready: bool) -> Self {
        Self {
            fact_threshold,
            candidate_threshold,
            analytics_ready,
            recommendation: None,
        }
    }

    pub fn with_recommendation(mut self, recommendation: impl Into<String>) -> Self {
        self.recommendation = Some(recommendation.into());
        self
    }

    fn validate(&self, label: &str) -> Result<(), ConfigError> {
        let in_range = |v: f32| (0.0..=1.0).contains(&v);
        if !in_range(self.fact_threshold) || !in_range(self.candidate_threshold) {
            return Err(ConfigError::InvalidValue {
                key: format!("thresholds.{label}"),
                value: format!(
                    "fact={} candidate={} (must be within [0, 1])",
                    self.fact_threshold, self.candidate_threshold
                ),
            });
        }
        if self.candidate_threshold > self.fact_threshold {
            return Err(ConfigError::InvalidValue {
                key: format!("thresholds.{label}"),
                value: format!(
                    "candidate_threshold {} exceeds fact_threshold {}",
                    self.candidate_threshold, self.fact_threshold
                ),
            });
        }
        Ok(())
    }
}

/// Per-relationship threshold table.
///
/// Competitor cues are distinctive enough to tune aggressively; supplier and
/// customer cues collide with biographical and corporate-structure language
/// and are tuned conservatively.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ThresholdConfig {
    pub competitor: TierThresholds,
    pub partner: TierThresholds,
    pub supplier: TierThresholds,
    pub customer: TierThresholds,
}

impl Default for ThresholdConfig {
    fn default() -> Self {
        Self {
            // 91.8% precision at fact, 88.2% at candidate
            competitor: TierThresholds::new(0.45, 0.30, true),
            // 90.9% precision at fact, 75.0% at candidate
            partner: TierThresholds::new(0.55, 0.40, false),
            // ~80% precision at fact but very low recall
            supplier: TierThresholds::new(0.55, 0.40, false)
                .with_recommendation("Use LLM verification for suppliers"),
            // ~100% precision at fact but very low recall
            customer: TierThresholds::new(0.55, 0.40, false)
                .with_recommendation("Use LLM verification for customers"),
        }
    }
}

impl ThresholdConfig {
    /// Thresholds for a relationship type
    pub fn get(&self, rel: RelationType) -> &TierThresholds {
        match rel {
            RelationType::Competitor => &self.competitor,
            RelationType::Partner => &self.partner,
            RelationType::Supplier => &self.supplier,
            RelationType::Customer => &self.customer,
        }
    }

    /// Thresholds keyed by edge label (`HAS_COMPETITOR`) or short name
    pub fn for_label(&self, label: &str) -> Option<&TierThresholds> {
        RelationType::from_label(label).map(|rel| self.get(rel))
    }

    /// Replace the thresholds of one type, returning a new table
    pub fn with(mut self, rel: RelationType, thresholds: TierThresholds) -> Self {
        match rel {
            RelationType::Competitor => self.competitor = thresholds,
            RelationType::Partner => self.partner = thresholds,
            RelationType::Supplier => self.supplier = thresholds,
            RelationType::Customer => self.customer = thresholds,
        }
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        for rel in RelationType::ALL {
            self.get(rel).validate(rel.as_str())?;
        }
        Ok(())
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,

    /// JSON format for logs
    pub json_format: bool,

    /// Include file/line in logs
    pub include_location: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json_format: false,
            include_location: false,
        }
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    FileReadError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file {path}: {message}")]
    ParseError { path: PathBuf, message: String },

    #[error("Invalid value for {key}: {value}")]
    InvalidValue { key: String, value: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.extraction.context_chars, 300);
        assert_eq!(config.extraction.min_company_chars, 3);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_default_thresholds() {
        let thresholds = ThresholdConfig::default();

        let competitor = thresholds.get(RelationType::Competitor);
        assert_eq!(competitor.fact_threshold, 0.45);
        assert_eq!(competitor.candidate_threshold, 0.30);
        assert!(competitor.analytics_ready);

        for rel in [RelationType::Supplier, RelationType::Customer] {
            let t = thresholds.get(rel);
            assert_eq!(t.fact_threshold, 0.55);
            assert!(!t.analytics_ready);
            assert!(t.recommendation.is_some());
        }
    }

    #[test]
    fn test_for_label() {
        let thresholds = ThresholdConfig::default();
        assert_eq!(
            thresholds.for_label("HAS_PARTNER").map(|t| t.candidate_threshold),
            Some(0.40)
        );
        assert!(thresholds.for_label("HAS_INVESTOR").is_none());
    }

    #[test]
    fn test_validate_rejects_inverted_thresholds() {
        let thresholds = ThresholdConfig::default()
            .with(RelationType::Partner, TierThresholds::new(0.3, 0.6, false));
        assert!(thresholds.validate().is_err());

        let thresholds = ThresholdConfig::default()
            .with(RelationType::Supplier, TierThresholds::new(1.5, 0.4, false));
        assert!(thresholds.validate().is_err());
    }

    #[test]
    fn test_parse_partial_toml() {
        let toml_str = r#"
            [extraction]
            context_chars = 120

            [thresholds.competitor]
            fact_threshold = 0.5
            candidate_threshold = 0.35
            analytics_ready = true
        "#;

        let config: AppConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.extraction.context_chars, 120);
        assert_eq!(config.extraction.keyword_confidence, 0.40);
        assert_eq!(config.thresholds.competitor.fact_threshold, 0.5);
        assert_eq!(config.thresholds.supplier.fact_threshold, 0.55);
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_validate_rejects_short_company_spans() {
        for min_company_chars in [0, 1, 2] {
            let config = AppConfig {
                extraction: ExtractionConfig {
                    min_company_chars,
                    ..ExtractionConfig::default()
                },
                ..AppConfig::default()
            };
            assert!(matches!(
                config.validate(),
                Err(ConfigError::InvalidValue { ref key, .. }) if key == "extraction.min_company_chars"
            ));
        }

        let toml_str = r#"
            [extraction]
            min_company_chars = 1
        "#;
        let config: AppConfig = toml::from_str(toml_str).unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_parse_env_value() {
        assert_eq!(parse_env::<usize>("PCG_CONTEXT_CHARS", "42").unwrap(), 42);
        assert!(parse_env::<bool>("PCG_LOG_JSON", "maybe").is_err());
    }
}
