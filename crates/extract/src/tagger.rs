use anyhow::{Context, Result};
use regex::Regex;
use std::collections::BTreeMap;
use std::path::Path;
use tracing::warn;

use crate::schema::{EntityType, RawSpan, TaggedDocument};

/// Named-entity tagging capability.
///
/// Implementations are loaded once by the caller and shared read-only across
/// analyses, so they must be `Send + Sync`.
pub trait Tagger: Send + Sync {
    fn tag(&self, text: &str) -> Result<TaggedDocument>;
}

const KNOWN_BANDS: &[&str] = &[
    "rotting christ",
    "necromantia",
    "varathron",
    "septicflesh",
    "thou art lord",
    "astarte",
    "zemial",
    "kawir",
    "naer mataron",
    "mortify",
    "nightfall",
    "horror of sadist",
    "dark nova",
];

const KNOWN_CITIES: &[&str] = &[
    "athens",
    "thessaloniki",
    "patras",
    "heraklion",
    "larissa",
    "volos",
    "αθήνα",
    "θεσσαλονίκη",
    "πάτρα",
];

struct GazetteerEntry {
    entity_type: EntityType,
    pattern: Regex,
    name_len: usize,
}

/// Dictionary tagger: case-insensitive whole-word lookup of known names,
/// sentence by sentence. Reports the surface text exactly as it appears.
pub struct GazetteerTagger {
    entries: Vec<GazetteerEntry>,
}

impl GazetteerTagger {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Known Greek extreme-metal bands plus the main Greek cities.
    pub fn greek_metal_scene() -> Self {
        let mut tagger = Self::new();
        tagger.add_names(EntityType::Band, KNOWN_BANDS);
        tagger.add_names(EntityType::Loc, KNOWN_CITIES);
        tagger
    }

    /// Load a `{ "TYPE": ["name", ...] }` JSON file. Unknown types are skipped.
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .context(format!("Failed to read gazetteer: {:?}", path))?;
        let lists: BTreeMap<String, Vec<String>> =
            serde_json::from_str(&raw).context("Failed to parse gazetteer JSON")?;

        let mut tagger = Self::new();
        for (label, names) in &lists {
            match EntityType::from_label(label) {
                Some(entity_type) => tagger.add_names(entity_type, names),
                None => warn!(label = %label, "skipping unknown gazetteer type"),
            }
        }
        Ok(tagger)
    }

    pub fn with_names<S: AsRef<str>>(mut self, entity_type: EntityType, names: &[S]) -> Self {
        self.add_names(entity_type, names);
        self
    }

    pub fn add_names<S: AsRef<str>>(&mut self, entity_type: EntityType, names: &[S]) {
        for name in names {
            let name = name.as_ref().trim();
            if name.is_empty() {
                continue;
            }
            // Escaped input always compiles
            if let Ok(pattern) = Regex::new(&format!(r"(?i)\b{}\b", regex::escape(name))) {
                self.entries.push(GazetteerEntry {
                    entity_type,
                    pattern,
                    name_len: name.chars().count(),
                });
            }
        }
        // Longer names claim overlapping text first
        self.entries.sort_by(|a, b| b.name_len.cmp(&a.name_len));
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn tag_sentence(&self, sentence: &str, sentence_id: usize) -> Vec<RawSpan> {
        let mut accepted: Vec<(usize, usize, EntityType)> = Vec::new();

        for entry in &self.entries {
            for m in entry.pattern.find_iter(sentence) {
                let overlaps = accepted
                    .iter()
                    .any(|&(start, end, _)| m.start() < end && start < m.end());
                if !overlaps {
                    accepted.push((m.start(), m.end(), entry.entity_type));
                }
            }
        }

        accepted.sort_by_key(|&(start, _, _)| start);
        accepted
            .into_iter()
            .map(|(start, end, entity_type)| RawSpan::new(&sentence[start..end], entity_type, sentence_id))
            .collect()
    }
}

impl Default for GazetteerTagger {
    fn default() -> Self {
        Self::new()
    }
}

impl Tagger for GazetteerTagger {
    fn tag(&self, text: &str) -> Result<TaggedDocument> {
        let mut document = TaggedDocument::default();

        for (sentence_id, sentence) in ingest::split_sentences(text).into_iter().enumerate() {
            document.spans.extend(self.tag_sentence(sentence.text, sentence_id));
            document.sentences.push(sentence.text.to_string());
        }

        Ok(document)
    }
}
