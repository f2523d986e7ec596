pub mod artifact;
pub mod config;
pub mod error;
pub mod geocode;
pub mod result;

pub use artifact::write_graph_artifact;
pub use config::{AnalysisConfig, AnalysisMode, GeocodingConfig};
pub use error::{AnalysisError, Result};
pub use geocode::{Geocoder, LocationVerification, NominatimGeocoder, VerificationStatus, verify_locations};
pub use result::{AnalysisResult, AnalysisStatus, GraphStatistics, NodeView};

use communities::{CommunityDetector, GraphAnalyzer, LouvainDetector, NoCommunityDetection};
use extract::{Extractor, Tagger};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, instrument};

/// Text in, entity graph out.
///
/// Holds configuration and capabilities only. Each call to [`Analyzer::analyze`]
/// builds its own normalizer, graph and result, so one analyzer can serve any
/// number of documents.
pub struct Analyzer {
    extractor: Extractor,
    graph: GraphAnalyzer,
}

impl Analyzer {
    pub fn new(tagger: Arc<dyn Tagger>, config: &AnalysisConfig) -> Self {
        let detector: Box<dyn CommunityDetector> = if config.community_detection {
            Box::new(LouvainDetector::default())
        } else {
            Box::new(NoCommunityDetection)
        };
        Self::with_detector(tagger, config, detector)
    }

    pub fn with_detector(
        tagger: Arc<dyn Tagger>,
        config: &AnalysisConfig,
        detector: Box<dyn CommunityDetector>,
    ) -> Self {
        let extractor = Extractor::new(
            tagger,
            config.chunking.clone(),
            &config.filter,
            config.normalizer.clone(),
            config.relationships.clone(),
        );
        Self {
            extractor,
            graph: GraphAnalyzer::new(detector, config.centrality.clone()),
        }
    }

    /// Analyze one document. When `output_dir` is given and entities were
    /// found, the graph artifact is written there and its path recorded.
    #[instrument(skip_all, fields(chars = text.len()))]
    pub fn analyze(&self, text: &str, output_dir: Option<&Path>) -> Result<AnalysisResult> {
        let mut result = self.analyze_text(text)?;
        self.write_artifact(&mut result, output_dir)?;
        Ok(result)
    }

    /// Decode `bytes` as UTF-8 and analyze them.
    pub fn analyze_bytes(&self, bytes: &[u8], output_dir: Option<&Path>) -> Result<AnalysisResult> {
        let text = std::str::from_utf8(bytes)?;
        self.analyze(text, output_dir)
    }

    /// Like [`Analyzer::analyze`], but checks LOC/GPE entities with
    /// `geocoder` before the artifact is written, so the artifact carries the
    /// location checks too.
    #[instrument(skip_all, fields(chars = text.len()))]
    pub async fn analyze_with_locations(
        &self,
        text: &str,
        output_dir: Option<&Path>,
        geocoder: &dyn Geocoder,
        timeout: Duration,
    ) -> Result<AnalysisResult> {
        let mut result = self.analyze_text(text)?;
        result.location_checks = verify_locations(&result.entities, geocoder, timeout).await;
        self.write_artifact(&mut result, output_dir)?;
        Ok(result)
    }

    fn analyze_text(&self, text: &str) -> Result<AnalysisResult> {
        let extraction = self.extractor.extract(text)?;
        if extraction.entities.is_empty() {
            info!("no entities found");
            return Ok(AnalysisResult::empty());
        }

        let analysis = self
            .graph
            .analyze(&extraction.entities, &extraction.relationships);
        let result =
            AnalysisResult::assemble(extraction.entities, extraction.relationships, analysis);

        let stats = result.statistics();
        info!(
            entities = stats.entity_count,
            relationships = stats.relationship_count,
            communities = stats.community_count,
            density = stats.density,
            "analysis complete"
        );
        Ok(result)
    }

    fn write_artifact(&self, result: &mut AnalysisResult, output_dir: Option<&Path>) -> Result<()> {
        if let Some(dir) = output_dir.filter(|_| !result.is_empty()) {
            result.artifact_path = Some(write_graph_artifact(result, dir)?);
        }
        Ok(())
    }
}
