use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use tracing::debug;

use crate::normalizer::EntityMap;
use crate::schema::{CanonicalEntity, Relationship};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RelationshipConfig {
    /// Context sentences kept per pair.
    pub max_contexts: usize,
    /// Context sentences are cut to this many characters.
    pub context_chars: usize,
}

impl Default for RelationshipConfig {
    fn default() -> Self {
        Self {
            max_contexts: 3,
            context_chars: 200,
        }
    }
}

#[derive(Default)]
struct PairAccumulator {
    count: usize,
    contexts: Vec<String>,
}

/// Counts sentence-level co-occurrence between canonical entities.
///
/// An entity is present in a sentence when any of its raw surface forms is a
/// lowercase substring of the sentence. This is coarse: a form that is a
/// substring of another entity's form will co-occur with it as well.
pub struct RelationshipBuilder {
    config: RelationshipConfig,
}

impl RelationshipBuilder {
    pub fn new(config: RelationshipConfig) -> Self {
        Self { config }
    }

    pub fn build(
        &self,
        sentences: &[String],
        entities: &[CanonicalEntity],
        map: &EntityMap,
    ) -> Vec<Relationship> {
        let forms: Vec<(String, usize)> = map
            .forms()
            .iter()
            .map(|form| (form.text.to_lowercase(), form.canonical))
            .collect();

        let mut pairs: BTreeMap<(String, String), PairAccumulator> = BTreeMap::new();

        for sentence in sentences {
            let lowered = sentence.to_lowercase();

            let mut present: Vec<usize> = Vec::new();
            for (form, canonical) in &forms {
                if !present.contains(canonical) && lowered.contains(form.as_str()) {
                    present.push(*canonical);
                }
            }
            if present.len() < 2 {
                continue;
            }

            // Distinct entities can share a text; each text pair counts once per sentence
            let mut keys: BTreeSet<(String, String)> = BTreeSet::new();
            for (i, &a) in present.iter().enumerate() {
                for &b in &present[i + 1..] {
                    let (a, b) = (&entities[a].canonical_text, &entities[b].canonical_text);
                    if a == b {
                        continue;
                    }
                    keys.insert(if a < b {
                        (a.clone(), b.clone())
                    } else {
                        (b.clone(), a.clone())
                    });
                }
            }

            for key in keys {
                let pair = pairs.entry(key).or_default();
                pair.count += 1;
                if pair.contexts.len() < self.config.max_contexts {
                    pair.contexts.push(self.context(sentence));
                }
            }
        }

        debug!(pairs = pairs.len(), sentences = sentences.len(), "built co-occurrence pairs");

        pairs
            .into_iter()
            .filter(|(_, pair)| pair.count > 0)
            .map(|((entity_a, entity_b), pair)| Relationship {
                entity_a,
                entity_b,
                strength: pair.count as f64,
                contexts: pair.contexts,
            })
            .collect()
    }

    fn context(&self, sentence: &str) -> String {
        sentence.trim().chars().take(self.config.context_chars).collect()
    }
}
