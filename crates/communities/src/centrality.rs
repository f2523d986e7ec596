//! Degree, betweenness and PageRank over weighted adjacency lists.

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::BinaryHeap;

/// Path lengths closer than this are treated as equal.
const PATH_EPSILON: f64 = 1e-9;

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct CentralityRecord {
    pub degree: usize,
    pub betweenness: f64,
    pub pagerank: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CentralityConfig {
    /// Damping factor (typically 0.85)
    pub damping: f64,
    pub max_iterations: usize,
    /// Per-node convergence tolerance on the L1 change between iterations
    pub tolerance: f64,
}

impl Default for CentralityConfig {
    fn default() -> Self {
        Self {
            damping: 0.85,
            max_iterations: 100,
            tolerance: 1e-6,
        }
    }
}

pub fn degree(adjacency: &[Vec<(usize, f64)>]) -> Vec<usize> {
    adjacency.iter().map(|row| row.len()).collect()
}

#[derive(Debug, Clone, Copy)]
struct QueueEntry {
    dist: f64,
    node: usize,
}

impl PartialEq for QueueEntry {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for QueueEntry {}

impl PartialOrd for QueueEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for QueueEntry {
    // Reversed so BinaryHeap pops the nearest node first
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .dist
            .total_cmp(&self.dist)
            .then_with(|| other.node.cmp(&self.node))
    }
}

/// Brandes betweenness with Dijkstra, edge length `1 / weight` so that
/// frequent co-occurrence means a shorter path. Normalised to `0..=1` for an
/// undirected graph; graphs with fewer than three nodes score zero.
pub fn betweenness(adjacency: &[Vec<(usize, f64)>]) -> Vec<f64> {
    let n = adjacency.len();
    let mut centrality = vec![0.0; n];
    if n < 3 {
        return centrality;
    }

    let mut dist: Vec<Option<f64>> = vec![None; n];
    let mut sigma = vec![0.0; n];
    let mut delta = vec![0.0; n];
    let mut settled = vec![false; n];
    let mut preds: Vec<Vec<usize>> = vec![Vec::new(); n];
    let mut order: Vec<usize> = Vec::with_capacity(n);
    let mut heap = BinaryHeap::new();

    for source in 0..n {
        dist.fill(None);
        sigma.fill(0.0);
        delta.fill(0.0);
        settled.fill(false);
        preds.iter_mut().for_each(Vec::clear);
        order.clear();

        dist[source] = Some(0.0);
        sigma[source] = 1.0;
        heap.push(QueueEntry {
            dist: 0.0,
            node: source,
        });

        while let Some(QueueEntry { dist: d, node: v }) = heap.pop() {
            if settled[v] {
                continue;
            }
            settled[v] = true;
            order.push(v);

            for &(w, weight) in &adjacency[v] {
                if settled[w] || weight <= 0.0 {
                    continue;
                }
                let candidate = d + 1.0 / weight;
                match dist[w] {
                    Some(current) if (candidate - current).abs() <= PATH_EPSILON => {
                        sigma[w] += sigma[v];
                        preds[w].push(v);
                    }
                    Some(current) if candidate > current => {}
                    _ => {
                        dist[w] = Some(candidate);
                        sigma[w] = sigma[v];
                        preds[w].clear();
                        preds[w].push(v);
                        heap.push(QueueEntry {
                            dist: candidate,
                            node: w,
                        });
                    }
                }
            }
        }

        while let Some(w) = order.pop() {
            for &v in &preds[w] {
                delta[v] += sigma[v] / sigma[w] * (1.0 + delta[w]);
            }
            if w != source {
                centrality[w] += delta[w];
            }
        }
    }

    // Every unordered pair was counted from both ends
    let scale = 1.0 / ((n - 1) * (n - 2)) as f64;
    centrality.iter_mut().for_each(|c| *c *= scale);
    centrality
}

/// Weighted PageRank by damped power iteration.
///
/// Each node passes rank to neighbours in proportion to edge weight; nodes
/// without edges spread theirs uniformly. Errors when the iteration limit is
/// reached before the L1 change drops below `n * tolerance`.
pub fn pagerank(adjacency: &[Vec<(usize, f64)>], config: &CentralityConfig) -> Result<Vec<f64>> {
    let n = adjacency.len();
    if n == 0 {
        return Ok(Vec::new());
    }

    let strength: Vec<f64> = adjacency
        .iter()
        .map(|row| row.iter().map(|&(_, w)| w).sum())
        .collect();
    let alpha = config.damping;
    let teleport = (1.0 - alpha) / n as f64;

    let mut scores = vec![1.0 / n as f64; n];
    let mut next = vec![0.0; n];

    for _ in 0..config.max_iterations {
        let dangling: f64 = (0..n).filter(|&i| strength[i] <= 0.0).map(|i| scores[i]).sum();
        let base = teleport + alpha * dangling / n as f64;
        next.fill(base);

        for (node, row) in adjacency.iter().enumerate() {
            if strength[node] <= 0.0 {
                continue;
            }
            let share = alpha * scores[node] / strength[node];
            for &(neighbor, weight) in row {
                next[neighbor] += share * weight;
            }
        }

        let change: f64 = next.iter().zip(&scores).map(|(a, b)| (a - b).abs()).sum();
        std::mem::swap(&mut scores, &mut next);
        if change < n as f64 * config.tolerance {
            return Ok(scores);
        }
    }

    anyhow::bail!(
        "PageRank did not converge within {} iterations",
        config.max_iterations
    )
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
    fn test_degree_counts_edges() {
        let adj = adjacency(3, &[(0, 1, 5.0), (0, 2, 1.0)]);
        assert_eq!(degree(&adj), vec![2, 1, 1]);
    }

    #[test]
    fn test_betweenness_path_and_star() {
        let path = adjacency(3, &[(0, 1, 1.0), (1, 2, 1.0)]);
        assert_eq!(betweenness(&path), vec![0.0, 1.0, 0.0]);

        let star = adjacency(5, &[(0, 1, 1.0), (0, 2, 1.0), (0, 3, 1.0), (0, 4, 1.0)]);
        let scores = betweenness(&star);
        assert!((scores[0] - 1.0).abs() < 1e-9);
        assert!(scores[1..].iter().all(|&s| s == 0.0));
    }

    #[test]
    fn test_betweenness_splits_equal_paths() {
        // Square 0-1-2-3-0: two shortest paths between opposite corners
        let square = adjacency(4, &[(0, 1, 1.0), (1, 2, 1.0), (2, 3, 1.0), (3, 0, 1.0)]);
        let scores = betweenness(&square);
        for s in scores {
            assert!((s - 1.0 / 6.0).abs() < 1e-9);
        }
    }

    #[test]
    fn test_betweenness_prefers_strong_ties() {
        // 0-2 direct but weak (length 1), 0-1-2 strong (length 0.25 + 0.25)
        let adj = adjacency(3, &[(0, 2, 1.0), (0, 1, 4.0), (1, 2, 4.0)]);
        let scores = betweenness(&adj);
        assert!((scores[1] - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_pagerank_sums_to_one() {
        let adj = adjacency(5, &[(0, 1, 3.0), (1, 2, 1.0), (2, 0, 2.0)]);
        let scores = pagerank(&adj, &CentralityConfig::default()).unwrap();

        let total: f64 = scores.iter().sum();
        assert!((total - 1.0).abs() < 1e-6);
        // Isolated nodes only receive teleport and dangling mass
        assert!(scores[3] < scores[0]);
        assert!((scores[3] - scores[4]).abs() < 1e-12);
    }

    #[test]
    fn test_pagerank_symmetric_pair() {
        let adj = adjacency(2, &[(0, 1, 1.0)]);
        let scores = pagerank(&adj, &CentralityConfig::default()).unwrap();
        assert!((scores[0] - 0.5).abs() < 1e-9);
        assert!((scores[1] - 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_pagerank_reports_non_convergence() {
        let adj = adjacency(3, &[(0, 1, 1.0), (1, 2, 5.0)]);
        let config = CentralityConfig {
            max_iterations: 1,
            tolerance: 1e-15,
            ..CentralityConfig::default()
        };
        assert!(pagerank(&adj, &config).is_err());
    }
}
