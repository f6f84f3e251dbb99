//! Community detection: multi-level Louvain modularity optimisation.
//!
//! Phase 1 moves each node to the neighbouring community with the largest
//! modularity gain, sweeping nodes in index order until a sweep moves nothing.
//! Phase 2 collapses each community into one node (internal weight becomes a
//! self-loop) and the two phases repeat on the smaller graph. Candidate
//! communities are visited in ascending id and a move needs a strictly larger
//! gain, so the partition is fully deterministic.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::KeywordNetwork;
use crate::config::NetworkConfig;

/// Gains closer than this are treated as equal.
const GAIN_EPSILON: f64 = 1e-12;

#[derive(Debug, Clone, PartialEq)]
pub struct LouvainConfig {
    pub resolution: f64,
    /// Cap on sweeps per level and on the number of levels.
    pub max_iterations: usize,
}

impl Default for LouvainConfig {
    fn default() -> Self {
        Self {
            resolution: 1.0,
            max_iterations: 100,
        }
    }
}

impl From<&NetworkConfig> for LouvainConfig {
    fn from(config: &NetworkConfig) -> Self {
        Self {
            resolution: config.resolution,
            max_iterations: config.max_iterations.max(1),
        }
    }
}

/// A community assignment for every network node.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Partition {
    /// Community of each node, numbered by first appearance in node order.
    pub membership: Vec<usize>,
    pub modularity: f64,
    pub levels: usize,
}

impl Partition {
    pub fn community_count(&self) -> usize {
        self.membership.iter().max().map_or(0, |max| max + 1)
    }

    /// Node count of each community, indexed by community id.
    pub fn community_sizes(&self) -> Vec<usize> {
        let mut sizes = vec![0; self.community_count()];
        for &community in &self.membership {
            sizes[community] += 1;
        }
        sizes
    }
}

/// Graph used inside one Louvain level. Nodes may carry self-loops after
/// aggregation.
#[derive(Debug, Clone)]
struct LevelGraph {
    adjacency: Vec<Vec<(usize, f64)>>,
    self_loops: Vec<f64>,
}

impl LevelGraph {
    fn from_network(network: &KeywordNetwork) -> Self {
        let n = network.node_count();
        Self {
            adjacency: (0..n).map(|i| network.neighbours(i).to_vec()).collect(),
            self_loops: vec![0.0; n],
        }
    }

    fn len(&self) -> usize {
        self.adjacency.len()
    }

    /// Weighted degree; a self-loop counts twice.
    fn degree(&self, node: usize) -> f64 {
        self.adjacency[node].iter().map(|&(_, w)| w).sum::<f64>() + 2.0 * self.self_loops[node]
    }

    /// Collapse each community into one node.
    fn aggregate(&self, community: &[usize], count: usize) -> Self {
        let mut weights: Vec<BTreeMap<usize, f64>> = vec![BTreeMap::new(); count];
        let mut self_loops = vec![0.0; count];

        for node in 0..self.len() {
            let c = community[node];
            self_loops[c] += self.self_loops[node];
            for &(neighbour, w) in &self.adjacency[node] {
                let d = community[neighbour];
                if c == d {
                    // Each internal edge is seen from both ends.
                    self_loops[c] += w / 2.0;
                } else {
                    *weights[c].entry(d).or_default() += w;
                }
            }
        }

        Self {
            adjacency: weights.into_iter().map(|m| m.into_iter().collect()).collect(),
            self_loops,
        }
    }
}

/// Renumber labels by first appearance. Returns the label count.
fn renumber(labels: &mut [usize]) -> usize {
    let mut mapping: BTreeMap<usize, usize> = BTreeMap::new();
    for label in labels.iter_mut() {
        let next = mapping.len();
        *label = *mapping.entry(*label).or_insert(next);
    }
    mapping.len()
}

/// Local moving on one level. Returns the (renumbered) community of each
/// node and whether any node moved.
fn local_moving(graph: &LevelGraph, config: &LouvainConfig, total_degree: f64) -> (Vec<usize>, bool) {
    let n = graph.len();
    let degrees: Vec<f64> = (0..n).map(|i| graph.degree(i)).collect();
    let mut community: Vec<usize> = (0..n).collect();
    let mut totals = degrees.clone();
    let mut moved_any = false;

    for _ in 0..config.max_iterations {
        let mut moved = false;

        for node in 0..n {
            let current = community[node];
            let k = degrees[node];

            let mut links: BTreeMap<usize, f64> = BTreeMap::new();
            links.insert(current, 0.0);
            for &(neighbour, w) in &graph.adjacency[node] {
                *links.entry(community[neighbour]).or_default() += w;
            }

            totals[current] -= k;
            let gain = |c: usize, w: f64| w - config.resolution * totals[c] * k / total_degree;

            let mut best = current;
            let mut best_gain = gain(current, links[&current]);
            for (&c, &w) in &links {
                let g = gain(c, w);
                if g > best_gain + GAIN_EPSILON {
                    best = c;
                    best_gain = g;
                }
            }

            totals[best] += k;
            if best != current {
                community[node] = best;
                moved = true;
                moved_any = true;
            }
        }

        if !moved {
            break;
        }
    }

    renumber(&mut community);
    (community, moved_any)
}

/// Modularity of a partition of the original network.
pub fn modularity(network: &KeywordNetwork, membership: &[usize], resolution: f64) -> f64 {
    let n = network.node_count();
    let degrees: Vec<f64> = (0..n)
        .map(|i| network.neighbours(i).iter().map(|&(_, w)| w).sum())
        .collect();
    let total_degree: f64 = degrees.iter().sum();
    if total_degree == 0.0 {
        return 0.0;
    }

    let count = membership.iter().max().map_or(0, |m| m + 1);
    let mut internal = vec![0.0; count];
    let mut totals = vec![0.0; count];
    for (a, b, w) in network.edges() {
        if membership[a] == membership[b] {
            internal[membership[a]] += w;
        }
    }
    for (node, &c) in membership.iter().enumerate() {
        totals[c] += degrees[node];
    }

    let m = total_degree / 2.0;
    internal
        .iter()
        .zip(&totals)
        .map(|(l, t)| l / m - resolution * (t / total_degree).powi(2))
        .sum()
}

/// Run Louvain over the network.
pub fn louvain(network: &KeywordNetwork, config: &LouvainConfig) -> Partition {
    let n = network.node_count();
    if n == 0 {
        return Partition::default();
    }

    let mut graph = LevelGraph::from_network(network);
    let total_degree: f64 = (0..graph.len()).map(|i| graph.degree(i)).sum();
    let mut membership: Vec<usize> = (0..n).collect();
    let mut levels = 0;

    if total_degree > 0.0 {
        while levels < config.max_iterations {
            let (community, moved) = local_moving(&graph, config, total_degree);
            if !moved {
                break;
            }
            levels += 1;

            for label in membership.iter_mut() {
                *label = community[*label];
            }
            let count = community.iter().max().map_or(0, |m| m + 1);
            if count == graph.len() {
                break;
            }
            graph = graph.aggregate(&community, count);
        }
    }

    renumber(&mut membership);
    let modularity = modularity(network, &membership, config.resolution);
    tracing::debug!(
        communities = membership.iter().max().map_or(0, |m| m + 1),
        modularity,
        levels,
        "louvain finished"
    );

    Partition {
        membership,
        modularity,
        levels,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::network::tests::keyword_set;
    use crate::network::CoOccurrence;

    /// Two triangles joined by one light edge.
    fn barbell() -> KeywordNetwork {
        let keywords = keyword_set(&["a", "b", "c", "x", "y", "z"], &[]);
        let mut segments = Vec::new();
        for pair in ["a b", "b c", "a c", "x y", "y z", "x z"] {
            for _ in 0..3 {
                segments.push(pair);
            }
        }
        segments.push("c x");
        let counts = CoOccurrence::count(&keywords, segments);
        KeywordNetwork::build(&keywords, &counts, 1)
    }

    #[test]
    fn test_barbell_splits_into_two_communities() {
        let network = barbell();
        let partition = louvain(&network, &LouvainConfig::default());

        assert_eq!(partition.membership, vec![0, 0, 0, 1, 1, 1]);
        assert_eq!(partition.community_count(), 2);
        assert_eq!(partition.community_sizes(), vec![3, 3]);
        assert!(partition.modularity > 0.4);
    }

    #[test]
    fn test_is_deterministic() {
        let network = barbell();
        let first = louvain(&network, &LouvainConfig::default());
        let second = louvain(&network, &LouvainConfig::default());
        assert_eq!(first, second);
    }

    #[test]
    fn test_empty_network() {
        let partition = louvain(&KeywordNetwork::default(), &LouvainConfig::default());
        assert!(partition.membership.is_empty());
        assert_eq!(partition.community_count(), 0);
        assert_eq!(partition.modularity, 0.0);
    }

    #[test]
    fn test_single_edge_is_one_community() {
        let keywords = keyword_set(&["a", "b"], &[]);
        let counts = CoOccurrence::count(&keywords, ["a b"]);
        let network = KeywordNetwork::build(&keywords, &counts, 1);
        let partition = louvain(&network, &LouvainConfig::default());

        assert_eq!(partition.membership, vec![0, 0]);
        assert_eq!(partition.modularity, 0.0);
    }

    #[test]
    fn test_modularity_of_singletons_is_negative() {
        let network = barbell();
        let singletons: Vec<usize> = (0..network.node_count()).collect();
        assert!(modularity(&network, &singletons, 1.0) < 0.0);
    }

    #[test]
    fn test_renumber_by_first_appearance() {
        let mut labels = vec![4, 4, 1, 7, 1];
        assert_eq!(renumber(&mut labels), 3);
        assert_eq!(labels, vec![0, 0, 1, 2, 1]);
    }
}
