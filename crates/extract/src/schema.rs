use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Closed set of entity tags the pipeline understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EntityType {
    Person,
    Org,
    Loc,
    Gpe,
    Date,
    Event,
    WorkOfArt,
    Band,
    Misc,
}

impl EntityType {
    pub const ALL: [EntityType; 9] = [
        EntityType::Person,
        EntityType::Org,
        EntityType::Loc,
        EntityType::Gpe,
        EntityType::Date,
        EntityType::Event,
        EntityType::WorkOfArt,
        EntityType::Band,
        EntityType::Misc,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            EntityType::Person => "PERSON",
            EntityType::Org => "ORG",
            EntityType::Loc => "LOC",
            EntityType::Gpe => "GPE",
            EntityType::Date => "DATE",
            EntityType::Event => "EVENT",
            EntityType::WorkOfArt => "WORK_OF_ART",
            EntityType::Band => "BAND",
            EntityType::Misc => "MISC",
        }
    }

    /// Map a tagger label onto a known type. Unknown labels yield `None`.
    pub fn from_label(label: &str) -> Option<Self> {
        let label = label.trim().to_uppercase();
        let entity_type = match label.as_str() {
            "PERSON" | "PER" => EntityType::Person,
            "ORG" | "ORGANIZATION" | "ORGANISATION" => EntityType::Org,
            "LOC" | "LOCATION" => EntityType::Loc,
            "GPE" => EntityType::Gpe,
            "DATE" => EntityType::Date,
            "EVENT" => EntityType::Event,
            "WORK_OF_ART" => EntityType::WorkOfArt,
            "BAND" => EntityType::Band,
            "MISC" => EntityType::Misc,
            _ => return None,
        };
        Some(entity_type)
    }

    pub fn is_location(&self) -> bool {
        matches!(self, EntityType::Loc | EntityType::Gpe)
    }
}

impl fmt::Display for EntityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EntityType {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_label(s).ok_or_else(|| anyhow::anyhow!("Unknown entity type: {}", s))
    }
}

/// One tagged occurrence, exactly as the tagger reported it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawSpan {
    pub text: String,
    #[serde(rename = "type")]
    pub entity_type: EntityType,
    pub sentence_id: usize,
}

impl RawSpan {
    pub fn new(text: impl Into<String>, entity_type: EntityType, sentence_id: usize) -> Self {
        Self {
            text: text.into(),
            entity_type,
            sentence_id,
        }
    }

    /// Build a span from a free-form tagger label, dropping unknown labels.
    pub fn from_label(text: impl Into<String>, label: &str, sentence_id: usize) -> Option<Self> {
        EntityType::from_label(label).map(|t| Self::new(text, t, sentence_id))
    }
}

/// Tagger output for one piece of text: its sentences and the spans found in them.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TaggedDocument {
    pub sentences: Vec<String>,
    pub spans: Vec<RawSpan>,
}

impl TaggedDocument {
    /// Append another document, shifting its sentence ids past ours.
    pub fn append(&mut self, other: TaggedDocument) {
        let offset = self.sentences.len();
        self.sentences.extend(other.sentences);
        self.spans.extend(other.spans.into_iter().map(|mut span| {
            span.sentence_id += offset;
            span
        }));
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CanonicalEntity {
    #[serde(rename = "text")]
    pub canonical_text: String,
    #[serde(rename = "type")]
    pub entity_type: EntityType,
    pub mention_count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Relationship {
    pub entity_a: String,
    pub entity_b: String,
    pub strength: f64,
    pub contexts: Vec<String>,
}
