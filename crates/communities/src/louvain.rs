use anyhow::Result;
use std::collections::HashMap;
use tracing::debug;

use crate::CommunityDetector;
use crate::graph::EntityGraph;

const MIN_GAIN: f64 = 1e-12;

/// Multi-level Louvain modularity optimisation.
///
/// Each level moves nodes greedily to the neighbouring community with the
/// best modularity gain until no node moves, then collapses communities into
/// single nodes and repeats. Node order is fixed, so results are deterministic.
pub struct LouvainDetector {
    max_passes: usize,
    max_levels: usize,
}

impl Default for LouvainDetector {
    fn default() -> Self {
        Self {
            max_passes: 10,
            max_levels: 10,
        }
    }
}

/// One level of the hierarchy. Row sums are weighted degrees; a community
/// collapsed into a node keeps its internal weight as a self loop.
struct Level {
    adjacency: Vec<Vec<(usize, f64)>>,
    degrees: Vec<f64>,
    total_weight: f64, // 2m
}

impl Level {
    fn new(adjacency: Vec<Vec<(usize, f64)>>) -> Self {
        let degrees: Vec<f64> = adjacency
            .iter()
            .map(|row| row.iter().map(|&(_, w)| w).sum())
            .collect();
        let total_weight = degrees.iter().sum();
        Self {
            adjacency,
            degrees,
            total_weight,
        }
    }

    fn len(&self) -> usize {
        self.adjacency.len()
    }

    fn aggregate(&self, communities: &[usize], count: usize) -> Level {
        let mut rows: Vec<HashMap<usize, f64>> = vec![HashMap::new(); count];
        let mut order: Vec<Vec<usize>> = vec![Vec::new(); count];

        for (node, row) in self.adjacency.iter().enumerate() {
            let from = communities[node];
            for &(neighbor, weight) in row {
                let to = communities[neighbor];
                let entry = rows[from].entry(to).or_insert_with(|| {
                    order[from].push(to);
                    0.0
                });
                *entry += weight;
            }
        }

        let adjacency = order
            .into_iter()
            .zip(rows)
            .map(|(keys, row)| keys.into_iter().map(|k| (k, row[&k])).collect())
            .collect();
        Level::new(adjacency)
    }
}

impl LouvainDetector {
    pub fn new(max_passes: usize, max_levels: usize) -> Self {
        Self {
            max_passes: max_passes.max(1),
            max_levels: max_levels.max(1),
        }
    }

    /// Run Louvain over weighted adjacency lists.
    /// Returns: node index -> community id, numbered by first appearance.
    pub fn detect_communities(&self, adjacency: Vec<Vec<(usize, f64)>>) -> Vec<usize> {
        let n = adjacency.len();
        let mut membership: Vec<usize> = (0..n).collect();
        if n == 0 {
            return membership;
        }

        let mut level = Level::new(adjacency);
        let mut depth = 0;

        while depth < self.max_levels {
            depth += 1;
            let Some(communities) = self.move_nodes(&level) else {
                break;
            };
            let (communities, count) = renumber(&communities);

            for community in membership.iter_mut() {
                *community = communities[*community];
            }
            if count == level.len() {
                break;
            }
            level = level.aggregate(&communities, count);
        }

        let (membership, count) = renumber(&membership);
        debug!(communities = count, levels = depth, "louvain finished");
        membership
    }

    /// Local moving phase. Returns `None` when no node changed community.
    fn move_nodes(&self, level: &Level) -> Option<Vec<usize>> {
        let n = level.len();
        let m2 = level.total_weight;
        if m2 <= 0.0 {
            return None;
        }

        let mut communities: Vec<usize> = (0..n).collect();
        let mut sigma_tot = level.degrees.clone();
        let mut weight_to = vec![0.0; n];
        let mut touched: Vec<usize> = Vec::new();
        let mut any_moved = false;

        for _ in 0..self.max_passes {
            let mut moved = false;

            for node in 0..n {
                let current = communities[node];
                let k_i = level.degrees[node];

                for &(neighbor, weight) in &level.adjacency[node] {
                    if neighbor == node {
                        continue;
                    }
                    let comm = communities[neighbor];
                    if weight_to[comm] == 0.0 {
                        touched.push(comm);
                    }
                    weight_to[comm] += weight;
                }

                sigma_tot[current] -= k_i;
                let gain = |comm: usize, weight_to: &[f64], sigma_tot: &[f64]| {
                    weight_to[comm] - sigma_tot[comm] * k_i / m2
                };

                let mut best = current;
                let mut best_gain = gain(current, &weight_to, &sigma_tot);
                for &comm in &touched {
                    let g = gain(comm, &weight_to, &sigma_tot);
                    if g > best_gain + MIN_GAIN {
                        best = comm;
                        best_gain = g;
                    }
                }

                sigma_tot[best] += k_i;
                communities[node] = best;
                if best != current {
                    moved = true;
                    any_moved = true;
                }

                for comm in touched.drain(..) {
                    weight_to[comm] = 0.0;
                }
            }

            if !moved {
                break;
            }
        }

        any_moved.then_some(communities)
    }
}

impl CommunityDetector for LouvainDetector {
    fn name(&self) -> &str {
        "louvain"
    }

    fn partition(&self, graph: &EntityGraph) -> Result<Vec<usize>> {
        Ok(self.detect_communities(graph.adjacency()))
    }
}

/// Renumber labels to 0..count in order of first appearance.
fn renumber(labels: &[usize]) -> (Vec<usize>, usize) {
    let mut mapping: HashMap<usize, usize> = HashMap::new();
    let renumbered = labels
        .iter()
        .map(|label| {
            let next = mapping.len();
            *mapping.entry(*label).or_insert(next)
        })
        .collect();
    (renumbered, mapping.len())
}

/// Newman modularity of a partition over weighted adjacency lists.
pub fn modularity(adjacency: &[Vec<(usize, f64)>], communities: &[usize]) -> f64 {
    let degrees: Vec<f64> = adjacency
        .iter()
        .map(|row| row.iter().map(|&(_, w)| w).sum())
        .collect();
    let m2: f64 = degrees.iter().sum();
    if m2 <= 0.0 {
        return 0.0;
    }

    let mut internal: HashMap<usize, f64> = HashMap::new();
    let mut total: HashMap<usize, f64> = HashMap::new();
    for (node, row) in adjacency.iter().enumerate() {
        let comm = communities[node];
        *total.entry(comm).or_insert(0.0) += degrees[node];
        for &(neighbor, weight) in row {
            if communities[neighbor] == comm {
                *internal.entry(comm).or_insert(0.0) += weight;
            }
        }
    }

    total
        .iter()
        .map(|(comm, tot)| internal.get(comm).copied().unwrap_or(0.0) / m2 - (tot / m2).powi(2))
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn adjacency(n: usize, edges: &[(usize, usize, f64)]) -> Vec<Vec<(usize, f64)>> {
        let mut adjacency = vec![Vec::new(); n];
        for &(a, b, w) in edges {
            adjacency[a].push((b, w));
            adjacency[b].push((a, w));
        }
        adjacency
    }

    #[test]
    fn test_two_cliques_with_bridge() {
        // Triangles {0,1,2} and {3,4,5}, weak bridge 2-3
        let adj = adjacency(
            6,
            &[
                (0, 1, 1.0),
                (1, 2, 1.0),
                (0, 2, 1.0),
                (3, 4, 1.0),
                (4, 5, 1.0),
                (3, 5, 1.0),
                (2, 3, 1.0),
            ],
        );
        let communities = LouvainDetector::default().detect_communities(adj.clone());

        assert_eq!(communities, vec![0, 0, 0, 1, 1, 1]);
        assert!(modularity(&adj, &communities) > 0.35);
    }

    #[test]
    fn test_weights_drive_grouping() {
        // Heavy pairs 0-1 and 2-3, light links across
        let adj = adjacency(
            4,
            &[(0, 1, 10.0), (2, 3, 10.0), (1, 2, 1.0), (0, 3, 1.0)],
        );
        let communities = LouvainDetector::default().detect_communities(adj);

        assert_eq!(communities[0], communities[1]);
        assert_eq!(communities[2], communities[3]);
        assert_ne!(communities[0], communities[2]);
    }

    #[test]
    fn test_isolated_nodes_stay_singletons() {
        let adj = adjacency(4, &[(0, 1, 1.0)]);
        let communities = LouvainDetector::default().detect_communities(adj);

        assert_eq!(communities[0], communities[1]);
        assert_eq!(communities[2], 1);
        assert_eq!(communities[3], 2);
    }

    #[test]
    fn test_no_edges_keeps_every_node_apart() {
        let communities = LouvainDetector::default().detect_communities(vec![Vec::new(); 3]);
        assert_eq!(communities, vec![0, 1, 2]);
    }

    #[test]
    fn test_multilevel_merges_ring_of_cliques() {
        // Four 4-cliques in a ring, single edges between neighbours
        let mut edges = Vec::new();
        for c in 0..4 {
            let base = c * 4;
            for i in 0..4 {
                for j in i + 1..4 {
                    edges.push((base + i, base + j, 1.0));
                }
            }
            edges.push((base + 3, (base + 4) % 16, 1.0));
        }
        let adj = adjacency(16, &edges);
        let communities = LouvainDetector::default().detect_communities(adj.clone());

        let count = communities.iter().max().unwrap() + 1;
        assert_eq!(count, 4);
        for c in 0..4 {
            let base = c * 4;
            assert!((base..base + 4).all(|i| communities[i] == communities[base]));
        }
        assert!(modularity(&adj, &communities) > 0.5);
    }
}
