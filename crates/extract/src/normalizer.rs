use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use tracing::debug;
use unicode_normalization::UnicodeNormalization;
use unicode_normalization::char::is_combining_mark;

use crate::schema::{CanonicalEntity, EntityType, RawSpan};
use crate::similarity;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RewriteRule {
    pub suffix: String,
    pub replacement: String,
}

impl RewriteRule {
    pub fn new(suffix: &str, replacement: &str) -> Self {
        Self {
            suffix: suffix.to_string(),
            replacement: replacement.to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NormalizerConfig {
    pub similarity_threshold: f64,
    /// Rewrite rules only touch names with at least this many characters.
    pub min_rewrite_chars: usize,
    /// Ordered suffix rewrites per type; the first matching rule is applied.
    pub rules: BTreeMap<EntityType, Vec<RewriteRule>>,
}

impl Default for NormalizerConfig {
    fn default() -> Self {
        let possessive = || vec![RewriteRule::new("'s", ""), RewriteRule::new("’s", "")];

        let mut rules = BTreeMap::new();
        // Genitive -ου / -ού back to nominative -ος / -ός
        rules.insert(
            EntityType::Person,
            [
                vec![RewriteRule::new("ου", "ος"), RewriteRule::new("ού", "ός")],
                possessive(),
            ]
            .concat(),
        );
        // Genitive -ας / -ης back to the base -α / -η
        let place = [
            vec![
                RewriteRule::new("ας", "α"),
                RewriteRule::new("άς", "ά"),
                RewriteRule::new("ης", "η"),
                RewriteRule::new("ής", "ή"),
            ],
            possessive(),
        ]
        .concat();
        rules.insert(EntityType::Loc, place.clone());
        rules.insert(EntityType::Gpe, place);
        rules.insert(EntityType::Org, possessive());
        rules.insert(EntityType::Band, possessive());

        Self {
            similarity_threshold: 0.85,
            min_rewrite_chars: 5,
            rules,
        }
    }
}

/// A raw surface form and the canonical entity it resolved to.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SurfaceForm {
    pub text: String,
    #[serde(rename = "type")]
    pub entity_type: EntityType,
    pub canonical: usize,
}

/// Every observed surface form, in first-seen order, mapped to an index into
/// the canonical entity list.
#[derive(Debug, Clone, Default)]
pub struct EntityMap {
    forms: Vec<SurfaceForm>,
    index: HashMap<(String, EntityType), usize>,
}

impl EntityMap {
    pub fn get(&self, text: &str, entity_type: EntityType) -> Option<usize> {
        self.index
            .get(&(text.to_string(), entity_type))
            .map(|&i| self.forms[i].canonical)
    }

    pub fn forms(&self) -> &[SurfaceForm] {
        &self.forms
    }

    pub fn len(&self) -> usize {
        self.forms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.forms.is_empty()
    }

    fn insert(&mut self, text: String, entity_type: EntityType, canonical: usize) {
        self.index
            .entry((text.clone(), entity_type))
            .or_insert_with(|| {
                self.forms.push(SurfaceForm {
                    text,
                    entity_type,
                    canonical,
                });
                self.forms.len() - 1
            });
    }
}

/// Output of a normalization pass.
#[derive(Debug, Clone, Default)]
pub struct NormalizedEntities {
    pub entities: Vec<CanonicalEntity>,
    pub map: EntityMap,
}

/// Collapses inflected and near-duplicate surface forms into canonical entities.
///
/// Built fresh for each document. Spans are resolved in encounter order and
/// the first existing entity of the same type that clears the similarity
/// threshold wins, so the spelling seen first becomes canonical.
pub struct EntityNormalizer {
    config: NormalizerConfig,
    entities: Vec<CanonicalEntity>,
    /// Comparison key per entity, parallel to `entities`
    keys: Vec<String>,
    map: EntityMap,
}

impl EntityNormalizer {
    pub fn new(config: NormalizerConfig) -> Self {
        Self {
            config,
            entities: Vec::new(),
            keys: Vec::new(),
            map: EntityMap::default(),
        }
    }

    /// Resolve one span, returning the index of its canonical entity.
    pub fn normalize(&mut self, span: &RawSpan) -> Option<usize> {
        let surface = span.text.trim();
        if surface.is_empty() {
            return None;
        }

        if let Some(idx) = self.map.get(surface, span.entity_type) {
            self.entities[idx].mention_count += 1;
            return Some(idx);
        }

        let rewritten = self.rewrite(surface, span.entity_type);
        let key = comparison_key(&rewritten);

        let idx = match self.find_match(&key, span.entity_type) {
            Some(idx) => {
                debug!(
                    surface,
                    canonical = %self.entities[idx].canonical_text,
                    "merged surface form"
                );
                self.entities[idx].mention_count += 1;
                idx
            }
            None => {
                self.entities.push(CanonicalEntity {
                    canonical_text: rewritten,
                    entity_type: span.entity_type,
                    mention_count: 1,
                });
                self.keys.push(key);
                self.entities.len() - 1
            }
        };

        self.map.insert(surface.to_string(), span.entity_type, idx);
        Some(idx)
    }

    pub fn normalize_all<'a>(mut self, spans: impl IntoIterator<Item = &'a RawSpan>) -> NormalizedEntities {
        for span in spans {
            self.normalize(span);
        }
        self.finish()
    }

    pub fn entities(&self) -> &[CanonicalEntity] {
        &self.entities
    }

    pub fn finish(self) -> NormalizedEntities {
        NormalizedEntities {
            entities: self.entities,
            map: self.map,
        }
    }

    fn rewrite(&self, text: &str, entity_type: EntityType) -> String {
        if text.chars().count() < self.config.min_rewrite_chars {
            return text.to_string();
        }

        let Some(rules) = self.config.rules.get(&entity_type) else {
            return text.to_string();
        };

        for rule in rules {
            let suffix_chars = rule.suffix.chars().count();
            if suffix_chars == 0 {
                continue;
            }
            let Some((cut, _)) = text.char_indices().rev().nth(suffix_chars - 1) else {
                continue;
            };
            let tail = &text[cut..];
            if tail.to_lowercase() != rule.suffix.to_lowercase() {
                continue;
            }
            // An all-caps ending gets an all-caps replacement
            let replacement = if tail.chars().any(char::is_lowercase) {
                rule.replacement.clone()
            } else {
                rule.replacement.to_uppercase()
            };
            return format!("{}{}", &text[..cut], replacement);
        }
        text.to_string()
    }

    /// First canonical entity of this type, in insertion order, that clears the threshold.
    fn find_match(&self, key: &str, entity_type: EntityType) -> Option<usize> {
        self.entities
            .iter()
            .zip(&self.keys)
            .position(|(entity, existing)| {
                entity.entity_type == entity_type
                    && similarity::ratio(key, existing) >= self.config.similarity_threshold
            })
    }
}

/// Lowercase, then drop combining marks after canonical decomposition.
pub fn comparison_key(text: &str) -> String {
    text.to_lowercase()
        .nfd()
        .filter(|c| !is_combining_mark(*c))
        .collect()
}
