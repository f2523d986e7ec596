use anyhow::{Context, Result};
use communities::CentralityConfig;
use extract::{EntityType, FilterConfig, NormalizerConfig, RelationshipConfig};
use ingest::ChunkerConfig;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::Path;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    pub mode: AnalysisMode,
    pub chunking: ChunkerConfig,
    pub filter: FilterConfig,
    pub normalizer: NormalizerConfig,
    pub relationships: RelationshipConfig,
    pub centrality: CentralityConfig,
    pub community_detection: bool,
    pub geocoding: GeocodingConfig,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum AnalysisMode {
    Strict,   // Fewer, cleaner entities: tighter merging and filtering
    Lenient,  // More entities, looser merging
    Balanced, // Default
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeocodingConfig {
    pub enabled: bool,
    pub base_url: String,
    pub user_agent: String,
    pub timeout_secs: u64,
}

impl Default for GeocodingConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            base_url: "https://nominatim.openstreetmap.org".to_string(),
            user_agent: "entity-graph/0.1".to_string(),
            timeout_secs: 5,
        }
    }
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            mode: AnalysisMode::Balanced,
            chunking: ChunkerConfig::default(),
            filter: FilterConfig::default(),
            normalizer: NormalizerConfig::default(),
            relationships: RelationshipConfig::default(),
            centrality: CentralityConfig::default(),
            community_detection: true,
            geocoding: GeocodingConfig::default(),
        }
    }
}

impl AnalysisConfig {
    pub fn strict() -> Self {
        Self {
            mode: AnalysisMode::Strict,
            filter: FilterConfig {
                short_span_limit: 3,
                ..FilterConfig::default()
            },
            normalizer: NormalizerConfig {
                similarity_threshold: 0.9,
                ..NormalizerConfig::default()
            },
            ..Self::default()
        }
    }

    pub fn lenient() -> Self {
        Self {
            mode: AnalysisMode::Lenient,
            filter: FilterConfig {
                allowed_types: EntityType::ALL.to_vec(),
                short_span_limit: 2,
                ..FilterConfig::default()
            },
            normalizer: NormalizerConfig {
                similarity_threshold: 0.8,
                ..NormalizerConfig::default()
            },
            ..Self::default()
        }
    }

    pub fn for_mode(mode: AnalysisMode) -> Self {
        match mode {
            AnalysisMode::Strict => Self::strict(),
            AnalysisMode::Lenient => Self::lenient(),
            AnalysisMode::Balanced => Self::default(),
        }
    }

    /// Load from JSON. Fields absent from the file take the values of the
    /// preset named by `mode` (balanced when `mode` is absent).
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .context(format!("Failed to read config file: {:?}", path))?;
        Self::from_json_str(&raw)
    }

    pub fn from_json_str(raw: &str) -> Result<Self> {
        let overrides: Value = serde_json::from_str(raw).context("Failed to parse config JSON")?;
        let mode = match overrides.get("mode") {
            Some(mode) => AnalysisMode::deserialize(mode).context("Invalid config mode")?,
            None => AnalysisMode::Balanced,
        };

        let mut merged = serde_json::to_value(Self::for_mode(mode))
            .context("Failed to serialize preset config")?;
        overlay(&mut merged, overrides);
        serde_json::from_value(merged).context("Invalid config JSON")
    }
}

/// Recursively replace fields of `base` with those present in `overrides`.
fn overlay(base: &mut Value, overrides: Value) {
    match (base, overrides) {
        (Value::Object(base), Value::Object(overrides)) => {
            for (key, value) in overrides {
                match base.get_mut(&key) {
                    Some(slot) => overlay(slot, value),
                    None => {
                        base.insert(key, value);
                    }
                }
            }
        }
        (slot, value) => *slot = value,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_json_keeps_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(
            &path,
            r#"{"normalizer": {"similarity_threshold": 0.8}, "chunking": {"max_chunk_chars": 5000}}"#,
        )
        .unwrap();

        let config = AnalysisConfig::from_json_file(&path).unwrap();
        assert_eq!(config.mode, AnalysisMode::Balanced);
        assert_eq!(config.normalizer.similarity_threshold, 0.8);
        assert_eq!(config.normalizer.min_rewrite_chars, 5);
        assert!(config.normalizer.rules.contains_key(&EntityType::Person));
        assert_eq!(config.chunking.max_chunk_chars, 5000);
        assert_eq!(config.chunking.back_scan_chars, 1000);
        assert_eq!(config.relationships.max_contexts, 3);
    }

    #[test]
    fn test_mode_applies_its_preset() {
        let config = AnalysisConfig::from_json_str(r#"{"mode": "strict"}"#).unwrap();
        assert_eq!(config.mode, AnalysisMode::Strict);
        assert_eq!(config.filter.short_span_limit, 3);
        assert_eq!(config.normalizer.similarity_threshold, 0.9);

        // Explicit fields still win over the preset
        let config = AnalysisConfig::from_json_str(
            r#"{"mode": "strict", "filter": {"short_span_limit": 1}}"#,
        )
        .unwrap();
        assert_eq!(config.filter.short_span_limit, 1);
        assert_eq!(config.normalizer.similarity_threshold, 0.9);
        assert_eq!(config.filter.languages, vec!["el".to_string(), "en".to_string()]);
    }

    #[test]
    fn test_unknown_mode_is_rejected() {
        assert!(AnalysisConfig::from_json_str(r#"{"mode": "turbo"}"#).is_err());
    }

    #[test]
    fn test_presets() {
        assert_eq!(AnalysisConfig::strict().filter.short_span_limit, 3);
        assert!(AnalysisConfig::lenient().filter.allowed_types.contains(&EntityType::Misc));
        assert_eq!(AnalysisConfig::for_mode(AnalysisMode::Balanced).mode, AnalysisMode::Balanced);
    }
}
