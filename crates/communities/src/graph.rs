use extract::{CanonicalEntity, Relationship};
use petgraph::graph::{NodeIndex, UnGraph};
use petgraph::visit::EdgeRef;
use std::collections::HashMap;
use tracing::warn;

/// Undirected co-occurrence graph: one node per canonical entity text,
/// edge weight = relationship strength.
#[derive(Debug, Clone, Default)]
pub struct EntityGraph {
    graph: UnGraph<String, f64>,
    entity_to_idx: HashMap<String, NodeIndex>,
}

impl EntityGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn build(entities: &[CanonicalEntity], relationships: &[Relationship]) -> Self {
        let mut graph = Self::new();

        for entity in entities {
            graph.add_entity(&entity.canonical_text);
        }

        for relationship in relationships {
            let (Some(&a), Some(&b)) = (
                graph.entity_to_idx.get(&relationship.entity_a),
                graph.entity_to_idx.get(&relationship.entity_b),
            ) else {
                warn!(
                    entity_a = %relationship.entity_a,
                    entity_b = %relationship.entity_b,
                    "relationship references unknown entity, skipping"
                );
                continue;
            };
            graph.add_edge(a.index(), b.index(), relationship.strength);
        }

        graph
    }

    pub fn add_entity(&mut self, entity_id: &str) -> usize {
        if let Some(&idx) = self.entity_to_idx.get(entity_id) {
            return idx.index();
        }

        let idx = self.graph.add_node(entity_id.to_string());
        self.entity_to_idx.insert(entity_id.to_string(), idx);
        idx.index()
    }

    /// Add weight to the edge between two nodes, creating it if needed.
    pub fn add_edge(&mut self, source: usize, target: usize, weight: f64) {
        if source == target {
            return;
        }
        let (a, b) = (NodeIndex::new(source), NodeIndex::new(target));
        match self.graph.find_edge(a, b) {
            Some(edge) => self.graph[edge] += weight,
            None => {
                self.graph.add_edge(a, b, weight);
            }
        }
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    pub fn entity(&self, idx: usize) -> &str {
        &self.graph[NodeIndex::new(idx)]
    }

    /// Entity ids in node order.
    pub fn entities(&self) -> impl Iterator<Item = &str> {
        self.graph.node_indices().map(|idx| self.graph[idx].as_str())
    }

    /// Weighted adjacency lists, one per node, neighbours in edge insertion order.
    pub fn adjacency(&self) -> Vec<Vec<(usize, f64)>> {
        let mut adjacency = vec![Vec::new(); self.node_count()];
        for edge in self.graph.edge_references() {
            let (a, b, w) = (edge.source().index(), edge.target().index(), *edge.weight());
            adjacency[a].push((b, w));
            adjacency[b].push((a, w));
        }
        adjacency
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use extract::EntityType;

    fn entity(text: &str) -> CanonicalEntity {
        CanonicalEntity {
            canonical_text: text.to_string(),
            entity_type: EntityType::Band,
            mention_count: 1,
        }
    }

    fn relationship(a: &str, b: &str, strength: f64) -> Relationship {
        Relationship {
            entity_a: a.to_string(),
            entity_b: b.to_string(),
            strength,
            contexts: Vec::new(),
        }
    }

    #[test]
    fn test_build_graph() {
        let graph = EntityGraph::build(
            &[entity("A"), entity("B"), entity("C")],
            &[relationship("A", "B", 2.0), relationship("B", "Z", 1.0)],
        );

        assert_eq!(graph.node_count(), 3);
        assert_eq!(graph.edge_count(), 1);
        let adjacency = graph.adjacency();
        assert_eq!(adjacency[0], vec![(1, 2.0)]);
        assert!(adjacency[2].is_empty());
    }

    #[test]
    fn test_duplicate_entities_share_a_node() {
        let mut graph = EntityGraph::new();
        let a = graph.add_entity("A");
        assert_eq!(graph.add_entity("A"), a);

        let b = graph.add_entity("B");
        graph.add_edge(a, b, 1.0);
        graph.add_edge(b, a, 1.0);
        assert_eq!(graph.edge_count(), 1);
        assert_eq!(graph.adjacency()[a], vec![(b, 2.0)]);
    }
}
