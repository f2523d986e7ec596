pub mod filter;
pub mod normalizer;
pub mod relations;
pub mod schema;
pub mod similarity;
pub mod tagger;

pub use filter::{EntityFilter, FilterConfig};
pub use normalizer::{EntityMap, EntityNormalizer, NormalizedEntities, NormalizerConfig, RewriteRule, SurfaceForm};
pub use relations::{RelationshipBuilder, RelationshipConfig};
pub use schema::{CanonicalEntity, EntityType, RawSpan, Relationship, TaggedDocument};
pub use tagger::{GazetteerTagger, Tagger};

use anyhow::{Context, Result};
use ingest::{Chunker, ChunkerConfig};
use std::sync::Arc;
use tracing::{debug, info};

/// Everything extracted from one document, ready for graph analytics.
#[derive(Debug, Clone, Default)]
pub struct Extraction {
    pub sentences: Vec<String>,
    pub entities: Vec<CanonicalEntity>,
    pub map: EntityMap,
    pub relationships: Vec<Relationship>,
    pub spans_tagged: usize,
    pub spans_kept: usize,
}

/// Runs tagging, filtering, normalization and co-occurrence for one text.
///
/// Holds only configuration and the shared tagger; every call builds its own
/// normalizer and accumulators.
pub struct Extractor {
    tagger: Arc<dyn Tagger>,
    chunker: Chunker,
    filter: EntityFilter,
    normalizer_config: NormalizerConfig,
    relationships: RelationshipBuilder,
}

impl Extractor {
    pub fn new(
        tagger: Arc<dyn Tagger>,
        chunker_config: ChunkerConfig,
        filter_config: &FilterConfig,
        normalizer_config: NormalizerConfig,
        relationship_config: RelationshipConfig,
    ) -> Self {
        Self {
            tagger,
            chunker: Chunker::new(chunker_config),
            filter: EntityFilter::new(filter_config),
            normalizer_config,
            relationships: RelationshipBuilder::new(relationship_config),
        }
    }

    pub fn with_defaults(tagger: Arc<dyn Tagger>) -> Self {
        Self::new(
            tagger,
            ChunkerConfig::default(),
            &FilterConfig::default(),
            NormalizerConfig::default(),
            RelationshipConfig::default(),
        )
    }

    /// Tag `text`, chunking it at sentence boundaries when it exceeds the bound.
    /// Chunk results are merged in order.
    pub fn tag_document(&self, text: &str) -> Result<TaggedDocument> {
        if !self.chunker.needs_chunking(text) {
            return self.tagger.tag(text).context("Tagger failed");
        }

        let mut document = TaggedDocument::default();
        for chunk in self.chunker.chunks(text) {
            let tagged = self
                .tagger
                .tag(chunk.text)
                .context(format!("Tagger failed on chunk {}", chunk.index))?;
            debug!(chunk = chunk.index, spans = tagged.spans.len(), "tagged chunk");
            document.append(tagged);
        }
        Ok(document)
    }

    pub fn extract(&self, text: &str) -> Result<Extraction> {
        let document = self.tag_document(text)?;
        let spans_tagged = document.spans.len();

        let kept: Vec<&RawSpan> = document
            .spans
            .iter()
            .filter(|span| self.filter.keep(span))
            .collect();
        let spans_kept = kept.len();

        let normalized = EntityNormalizer::new(self.normalizer_config.clone()).normalize_all(kept);
        let relationships =
            self.relationships
                .build(&document.sentences, &normalized.entities, &normalized.map);

        info!(
            sentences = document.sentences.len(),
            spans_tagged,
            spans_kept,
            entities = normalized.entities.len(),
            relationships = relationships.len(),
            "extraction complete"
        );

        Ok(Extraction {
            sentences: document.sentences,
            entities: normalized.entities,
            map: normalized.map,
            relationships,
            spans_tagged,
            spans_kept,
        })
    }
}
