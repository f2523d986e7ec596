use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};
use stop_words::{LANGUAGE, get};

use crate::schema::{EntityType, RawSpan};

/// Characters allowed inside a number ("1.000", "12/05/1996", "3-4").
const NUMERIC_SEPARATORS: &[char] = &['.', ',', ':', '/', '-'];

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterConfig {
    pub allowed_types: Vec<EntityType>,
    /// Spans whose trimmed length (in characters) is at or below this are dropped.
    pub short_span_limit: usize,
    /// Stopword languages, as ISO codes or English names ("el", "english").
    pub languages: Vec<String>,
    pub extra_stopwords: Vec<String>,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            allowed_types: EntityType::ALL
                .into_iter()
                .filter(|t| *t != EntityType::Misc)
                .collect(),
            short_span_limit: 2,
            languages: vec!["el".to_string(), "en".to_string()],
            extra_stopwords: Vec::new(),
        }
    }
}

/// Pure keep/discard predicate over raw spans.
#[derive(Debug, Clone)]
pub struct EntityFilter {
    allowed_types: FxHashSet<EntityType>,
    short_span_limit: usize,
    stopwords: FxHashSet<String>,
}

impl EntityFilter {
    pub fn new(config: &FilterConfig) -> Self {
        let mut stopwords: FxHashSet<String> = config
            .languages
            .iter()
            .flat_map(|language| Self::load_stopwords(language))
            .collect();
        stopwords.extend(config.extra_stopwords.iter().map(|w| w.to_lowercase()));

        Self {
            allowed_types: config.allowed_types.iter().copied().collect(),
            short_span_limit: config.short_span_limit,
            stopwords,
        }
    }

    pub fn keep(&self, span: &RawSpan) -> bool {
        if !self.allowed_types.contains(&span.entity_type) {
            return false;
        }

        let text = span.text.trim();
        if text.chars().count() <= self.short_span_limit {
            return false;
        }

        if self.stopwords.contains(&text.to_lowercase()) {
            return false;
        }

        !is_numeric(text)
    }

    pub fn is_stopword(&self, word: &str) -> bool {
        self.stopwords.contains(&word.to_lowercase())
    }

    fn load_stopwords(language: &str) -> Vec<String> {
        let lang = match language.to_lowercase().as_str() {
            "el" | "greek" => LANGUAGE::Greek,
            "en" | "english" => LANGUAGE::English,
            "de" | "german" => LANGUAGE::German,
            "fr" | "french" => LANGUAGE::French,
            "es" | "spanish" => LANGUAGE::Spanish,
            "it" | "italian" => LANGUAGE::Italian,
            "pt" | "portuguese" => LANGUAGE::Portuguese,
            "ru" | "russian" => LANGUAGE::Russian,
            other => {
                tracing::warn!(language = other, "no stopword list for language, skipping");
                return Vec::new();
            }
        };

        get(lang).iter().map(|s| s.to_lowercase()).collect()
    }
}

fn is_numeric(text: &str) -> bool {
    text.chars()
        .all(|c| c.is_numeric() || c.is_whitespace() || NUMERIC_SEPARATORS.contains(&c))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn filter() -> EntityFilter {
        EntityFilter::new(&FilterConfig::default())
    }

    #[test]
    fn test_keeps_regular_entities() {
        let filter = filter();
        assert!(filter.keep(&RawSpan::new("Athens", EntityType::Loc, 0)));
        assert!(filter.keep(&RawSpan::new("Rotting Christ", EntityType::Band, 0)));
        assert!(filter.keep(&RawSpan::new("Μάρτιος 1996", EntityType::Date, 0)));
    }

    #[test]
    fn test_drops_disallowed_types() {
        assert!(!filter().keep(&RawSpan::new("Something", EntityType::Misc, 0)));
    }

    #[test]
    fn test_drops_short_spans() {
        let filter = filter();
        assert!(!filter.keep(&RawSpan::new(" EU ", EntityType::Org, 0)));
        assert!(filter.keep(&RawSpan::new("NATO", EntityType::Org, 0)));

        let strict = EntityFilter::new(&FilterConfig {
            short_span_limit: 3,
            ..FilterConfig::default()
        });
        assert!(!strict.keep(&RawSpan::new("BBC", EntityType::Org, 0)));
    }

    #[test]
    fn test_drops_numeric_spans() {
        let filter = filter();
        assert!(!filter.keep(&RawSpan::new("1996", EntityType::Date, 0)));
        assert!(!filter.keep(&RawSpan::new("12/05/1996", EntityType::Date, 0)));
        assert!(!filter.keep(&RawSpan::new("1.000.000", EntityType::Misc, 0)));
    }

    #[test]
    fn test_drops_stopwords() {
        let filter = EntityFilter::new(&FilterConfig {
            extra_stopwords: vec!["Band".to_string()],
            ..FilterConfig::default()
        });
        assert!(!filter.keep(&RawSpan::new("The", EntityType::Org, 0)));
        assert!(!filter.keep(&RawSpan::new("band", EntityType::Band, 0)));
        assert!(filter.is_stopword("THE"));
    }
}
