pub mod centrality;
pub mod graph;
pub mod louvain;

pub use centrality::{CentralityConfig, CentralityRecord};
pub use graph::EntityGraph;
pub use louvain::LouvainDetector;

use anyhow::Result;
use extract::{CanonicalEntity, Relationship};
use std::collections::BTreeMap;
use tracing::{info, warn};

/// Community detection capability. Returns one community id per graph node,
/// in node order.
pub trait CommunityDetector: Send + Sync {
    fn name(&self) -> &str;
    fn partition(&self, graph: &EntityGraph) -> Result<Vec<usize>>;
}

/// Stand-in used when no community detection is configured.
pub struct NoCommunityDetection;

impl CommunityDetector for NoCommunityDetection {
    fn name(&self) -> &str {
        "none"
    }

    fn partition(&self, _graph: &EntityGraph) -> Result<Vec<usize>> {
        anyhow::bail!("community detection is not available")
    }
}

/// Community and centrality results keyed by canonical entity text.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GraphAnalysis {
    pub communities: BTreeMap<String, usize>,
    pub centrality: BTreeMap<String, CentralityRecord>,
}

impl GraphAnalysis {
    /// Every entity in community 0 with zero centrality.
    fn degenerate(graph: &EntityGraph) -> Self {
        Self {
            communities: graph.entities().map(|e| (e.to_string(), 0)).collect(),
            centrality: graph
                .entities()
                .map(|e| (e.to_string(), CentralityRecord::default()))
                .collect(),
        }
    }
}

pub struct GraphAnalyzer {
    detector: Box<dyn CommunityDetector>,
    config: CentralityConfig,
}

impl GraphAnalyzer {
    pub fn new(detector: Box<dyn CommunityDetector>, config: CentralityConfig) -> Self {
        Self { detector, config }
    }

    pub fn louvain(config: CentralityConfig) -> Self {
        Self::new(Box::new(LouvainDetector::default()), config)
    }

    /// Build the graph and compute communities and centrality.
    ///
    /// Never fails: a graph without edges, a missing or failing detector, or a
    /// numerical problem in one measure all fall back to zero values for the
    /// part that could not be computed.
    pub fn analyze(&self, entities: &[CanonicalEntity], relationships: &[Relationship]) -> GraphAnalysis {
        let graph = EntityGraph::build(entities, relationships);
        if graph.edge_count() == 0 {
            return GraphAnalysis::degenerate(&graph);
        }

        let adjacency = graph.adjacency();
        let n = graph.node_count();
        let mut analysis = GraphAnalysis::degenerate(&graph);

        match self.detector.partition(&graph) {
            Ok(partition) if partition.len() == n => {
                for (idx, community) in partition.into_iter().enumerate() {
                    analysis.communities.insert(graph.entity(idx).to_string(), community);
                }
            }
            Ok(partition) => warn!(
                detector = self.detector.name(),
                expected = n,
                got = partition.len(),
                "partition size mismatch, using single community"
            ),
            Err(e) => warn!(
                detector = self.detector.name(),
                error = %e,
                "community detection unavailable, using single community"
            ),
        }

        let degrees = centrality::degree(&adjacency);
        let betweenness = finite_or_zero("betweenness", centrality::betweenness(&adjacency));
        let pagerank = match centrality::pagerank(&adjacency, &self.config) {
            Ok(scores) => finite_or_zero("pagerank", scores),
            Err(e) => {
                warn!(error = %e, "pagerank failed, using zeros");
                vec![0.0; n]
            }
        };

        for idx in 0..n {
            analysis.centrality.insert(
                graph.entity(idx).to_string(),
                CentralityRecord {
                    degree: degrees[idx],
                    betweenness: betweenness[idx],
                    pagerank: pagerank[idx],
                },
            );
        }

        info!(
            nodes = n,
            edges = graph.edge_count(),
            communities = analysis.communities.values().collect::<std::collections::BTreeSet<_>>().len(),
            "graph analysis complete"
        );
        analysis
    }
}

fn finite_or_zero(measure: &str, mut scores: Vec<f64>) -> Vec<f64> {
    let mut replaced = 0;
    for score in scores.iter_mut().filter(|s| !s.is_finite()) {
        *score = 0.0;
        replaced += 1;
    }
    if replaced > 0 {
        warn!(measure, replaced, "non-finite centrality values replaced with zero");
    }
    scores
}
