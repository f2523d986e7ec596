use crate::geocode::LocationVerification;
use communities::{CentralityRecord, GraphAnalysis};
use extract::{CanonicalEntity, EntityType, Relationship};
use serde::{Deserialize, Serialize, Serializer};
use std::collections::{BTreeMap, BTreeSet};
use std::path::PathBuf;

/// Category10 colours, indexed by community id.
pub const PALETTE: [&str; 10] = [
    "#1f77b4", "#ff7f0e", "#2ca02c", "#d62728", "#9467bd", "#8c564b", "#e377c2", "#7f7f7f",
    "#bcbd22", "#17becf",
];

const MIN_NODE_SIZE: f64 = 20.0;
const MAX_NODE_SIZE: f64 = 60.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnalysisStatus {
    Complete,
    NoEntitiesFound,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GraphStatistics {
    pub entity_count: usize,
    pub relationship_count: usize,
    pub community_count: usize,
    pub avg_degree: f64,
    pub density: f64,
}

/// Render hints for one entity.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NodeView {
    pub label: String,
    #[serde(rename = "type")]
    pub entity_type: EntityType,
    pub community: usize,
    pub size: f64,
    pub color: &'static str,
    pub type_color: &'static str,
    pub mention_count: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisResult {
    pub status: AnalysisStatus,
    pub entities: Vec<CanonicalEntity>,
    pub relationships: Vec<Relationship>,
    pub communities: BTreeMap<String, usize>,
    pub centrality: BTreeMap<String, CentralityRecord>,
    pub artifact_path: Option<PathBuf>,
    pub location_checks: Vec<LocationVerification>,
}

impl AnalysisResult {
    pub fn empty() -> Self {
        Self {
            status: AnalysisStatus::NoEntitiesFound,
            entities: Vec::new(),
            relationships: Vec::new(),
            communities: BTreeMap::new(),
            centrality: BTreeMap::new(),
            artifact_path: None,
            location_checks: Vec::new(),
        }
    }

    pub fn assemble(
        entities: Vec<CanonicalEntity>,
        relationships: Vec<Relationship>,
        analysis: GraphAnalysis,
    ) -> Self {
        if entities.is_empty() {
            return Self::empty();
        }
        Self {
            status: AnalysisStatus::Complete,
            entities,
            relationships,
            communities: analysis.communities,
            centrality: analysis.centrality,
            artifact_path: None,
            location_checks: Vec::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.status == AnalysisStatus::NoEntitiesFound
    }

    /// Derived from the current collections on every call.
    pub fn statistics(&self) -> GraphStatistics {
        let n = self.entities.len();
        let relationship_count = self.relationships.len();

        let density = if n > 1 {
            relationship_count as f64 / (n * (n - 1) / 2) as f64
        } else {
            0.0
        };
        let avg_degree = if self.centrality.is_empty() {
            0.0
        } else {
            self.centrality.values().map(|c| c.degree).sum::<usize>() as f64
                / self.centrality.len() as f64
        };

        GraphStatistics {
            entity_count: n,
            relationship_count,
            community_count: self.communities.values().collect::<BTreeSet<_>>().len(),
            avg_degree,
            density,
        }
    }

    pub fn entities_by_type(&self) -> BTreeMap<EntityType, Vec<String>> {
        let mut grouped: BTreeMap<EntityType, Vec<String>> = BTreeMap::new();
        for entity in &self.entities {
            grouped
                .entry(entity.entity_type)
                .or_default()
                .push(entity.canonical_text.clone());
        }
        grouped
    }

    /// Total mentions per type.
    pub fn type_distribution(&self) -> BTreeMap<EntityType, usize> {
        let mut distribution = BTreeMap::new();
        for entity in &self.entities {
            *distribution.entry(entity.entity_type).or_insert(0) += entity.mention_count;
        }
        distribution
    }

    pub fn nodes(&self) -> Vec<NodeView> {
        self.entities
            .iter()
            .map(|entity| {
                let community = self
                    .communities
                    .get(&entity.canonical_text)
                    .copied()
                    .unwrap_or(0);
                let record = self
                    .centrality
                    .get(&entity.canonical_text)
                    .copied()
                    .unwrap_or_default();
                NodeView {
                    label: entity.canonical_text.clone(),
                    entity_type: entity.entity_type,
                    community,
                    size: node_size(&record),
                    color: PALETTE[community % PALETTE.len()],
                    type_color: type_color(entity.entity_type),
                    mention_count: entity.mention_count,
                }
            })
            .collect()
    }
}

pub fn node_size(record: &CentralityRecord) -> f64 {
    (1000.0 * record.pagerank + 3.0 * record.degree as f64).clamp(MIN_NODE_SIZE, MAX_NODE_SIZE)
}

pub fn type_color(entity_type: EntityType) -> &'static str {
    match entity_type {
        EntityType::Band => "#ff4444",
        EntityType::Loc | EntityType::Gpe => "#44ff44",
        EntityType::Org => "#4444ff",
        EntityType::Person => "#ffff44",
        EntityType::Date => "#ff44ff",
        _ => "#ffffff",
    }
}

#[derive(Serialize)]
struct AnalysisReport<'a> {
    status: AnalysisStatus,
    statistics: GraphStatistics,
    entities: &'a [CanonicalEntity],
    relationships: &'a [Relationship],
    communities: &'a BTreeMap<String, usize>,
    centrality: &'a BTreeMap<String, CentralityRecord>,
    nodes: Vec<NodeView>,
    entities_by_type: BTreeMap<EntityType, Vec<String>>,
    type_distribution: BTreeMap<EntityType, usize>,
    location_checks: &'a [LocationVerification],
    artifact_path: Option<&'a PathBuf>,
}

impl Serialize for AnalysisResult {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        AnalysisReport {
            status: self.status,
            statistics: self.statistics(),
            entities: &self.entities,
            relationships: &self.relationships,
            communities: &self.communities,
            centrality: &self.centrality,
            nodes: self.nodes(),
            entities_by_type: self.entities_by_type(),
            type_distribution: self.type_distribution(),
            location_checks: &self.location_checks,
            artifact_path: self.artifact_path.as_ref(),
        }
        .serialize(serializer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entity(text: &str, entity_type: EntityType, mention_count: usize) -> CanonicalEntity {
        CanonicalEntity {
            canonical_text: text.to_string(),
            entity_type,
            mention_count,
        }
    }

    fn sample() -> AnalysisResult {
        let entities = vec![
            entity("Rotting Christ", EntityType::Band, 2),
            entity("Athens", EntityType::Loc, 1),
            entity("Necromantia", EntityType::Band, 1),
        ];
        let relationships = vec![Relationship {
            entity_a: "Athens".to_string(),
            entity_b: "Rotting Christ".to_string(),
            strength: 1.0,
            contexts: vec!["Rotting Christ played Athens.".to_string()],
        }];
        let record = |degree| CentralityRecord {
            degree,
            betweenness: 0.0,
            pagerank: 0.3,
        };
        let analysis = GraphAnalysis {
            communities: BTreeMap::from([
                ("Rotting Christ".to_string(), 0),
                ("Athens".to_string(), 0),
                ("Necromantia".to_string(), 11),
            ]),
            centrality: BTreeMap::from([
                ("Rotting Christ".to_string(), record(1)),
                ("Athens".to_string(), record(1)),
                ("Necromantia".to_string(), record(0)),
            ]),
        };
        AnalysisResult::assemble(entities, relationships, analysis)
    }

    #[test]
    fn test_statistics() {
        let stats = sample().statistics();
        assert_eq!(stats.entity_count, 3);
        assert_eq!(stats.relationship_count, 1);
        assert_eq!(stats.community_count, 2);
        assert!((stats.density - 1.0 / 3.0).abs() < 1e-12);
        assert!((stats.avg_degree - 2.0 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_single_entity_has_zero_density() {
        let result = AnalysisResult::assemble(
            vec![entity("Athens", EntityType::Loc, 4)],
            Vec::new(),
            GraphAnalysis::default(),
        );
        let stats = result.statistics();
        assert_eq!(stats.density, 0.0);
        assert_eq!(stats.avg_degree, 0.0);
        assert_eq!(result.status, AnalysisStatus::Complete);
    }

    #[test]
    fn test_no_entities_is_marked_empty() {
        let result = AnalysisResult::assemble(Vec::new(), Vec::new(), GraphAnalysis::default());
        assert!(result.is_empty());
        assert_eq!(result.statistics().entity_count, 0);
        assert!(result.nodes().is_empty());
    }

    #[test]
    fn test_groupings() {
        let result = sample();
        assert_eq!(
            result.entities_by_type()[&EntityType::Band],
            vec!["Rotting Christ".to_string(), "Necromantia".to_string()]
        );
        assert_eq!(result.type_distribution()[&EntityType::Band], 3);
        assert_eq!(result.type_distribution()[&EntityType::Loc], 1);
    }

    #[test]
    fn test_node_hints() {
        let nodes = sample().nodes();
        // 1000 * 0.3 dominates and is clamped
        assert_eq!(nodes[0].size, 60.0);
        assert_eq!(nodes[0].color, PALETTE[0]);
        assert_eq!(nodes[2].color, PALETTE[1]);
        assert_eq!(nodes[1].type_color, "#44ff44");

        let small = CentralityRecord {
            degree: 2,
            betweenness: 0.0,
            pagerank: 0.01,
        };
        assert_eq!(node_size(&small), 20.0);
    }

    #[test]
    fn test_report_json_shape() {
        let json = serde_json::to_value(sample()).unwrap();
        assert_eq!(json["status"], "complete");
        assert_eq!(json["statistics"]["entity_count"], 3);
        assert_eq!(json["entities"][0]["type"], "BAND");
        assert_eq!(json["entities_by_type"]["LOC"][0], "Athens");
        assert!(json["artifact_path"].is_null());
        assert_eq!(json["location_checks"], serde_json::json!([]));
    }
}
