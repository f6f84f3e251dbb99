//! Structural metrics of the keyword network.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, VecDeque};

use super::{CoOccurrence, KeywordKind, KeywordNetwork, PairCount, Partition, TOP_PAIRS};
use crate::report::round_to;

/// How many nodes the betweenness ranking keeps.
pub const TOP_BETWEENNESS: usize = 5;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeScore {
    pub node: String,
    pub score: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NetworkMetrics {
    pub num_nodes: usize,
    pub num_edges: usize,
    pub density: f64,
    pub avg_clustering: f64,
    pub avg_degree: f64,
    pub max_degree: usize,
    pub max_degree_node: Option<String>,
    pub top_betweenness: Vec<NodeScore>,
    pub entity_nodes: usize,
    pub theme_nodes: usize,
    pub top_co_occurrences: Vec<PairCount>,
    pub num_communities: usize,
    /// Node count per community id.
    pub community_sizes: BTreeMap<usize, usize>,
    pub modularity: f64,
}

impl NetworkMetrics {
    pub fn compute(network: &KeywordNetwork, counts: &CoOccurrence, partition: &Partition) -> Self {
        let n = network.node_count();
        let degrees: Vec<usize> = (0..n).map(|i| network.degree(i)).collect();

        // First node with the highest degree.
        let max_degree_node = degrees
            .iter()
            .enumerate()
            .fold(None, |best: Option<(usize, usize)>, (i, &d)| match best {
                Some((_, bd)) if bd >= d => best,
                _ => Some((i, d)),
            });

        let mut betweenness: Vec<(usize, f64)> =
            betweenness_centrality(network).into_iter().enumerate().collect();
        betweenness.sort_by(|a, b| b.1.total_cmp(&a.1));

        let kind_count = |kind: KeywordKind| network.nodes().iter().filter(|n| n.kind == kind).count();

        Self {
            num_nodes: n,
            num_edges: network.edge_count(),
            density: round_to(density(network), 4),
            avg_clustering: round_to(average_clustering(network), 4),
            avg_degree: if n == 0 {
                0.0
            } else {
                round_to(degrees.iter().sum::<usize>() as f64 / n as f64, 2)
            },
            max_degree: max_degree_node.map_or(0, |(_, d)| d),
            max_degree_node: max_degree_node.map(|(i, _)| network.nodes()[i].keyword.clone()),
            top_betweenness: betweenness
                .into_iter()
                .take(TOP_BETWEENNESS)
                .map(|(i, score)| NodeScore {
                    node: network.nodes()[i].keyword.clone(),
                    score: round_to(score, 4),
                })
                .collect(),
            entity_nodes: kind_count(KeywordKind::Entity),
            theme_nodes: kind_count(KeywordKind::Theme),
            top_co_occurrences: counts.top(TOP_PAIRS),
            num_communities: partition.community_count(),
            community_sizes: partition.community_sizes().into_iter().enumerate().collect(),
            modularity: round_to(partition.modularity, 4),
        }
    }
}

/// Edges over possible edges; 0 below two nodes.
pub fn density(network: &KeywordNetwork) -> f64 {
    let n = network.node_count() as f64;
    if n < 2.0 {
        return 0.0;
    }
    2.0 * network.edge_count() as f64 / (n * (n - 1.0))
}

/// Unweighted local clustering coefficient of one node.
pub fn clustering(network: &KeywordNetwork, node: usize) -> f64 {
    let neighbours = network.neighbours(node);
    let k = neighbours.len();
    if k < 2 {
        return 0.0;
    }
    let mut links = 0usize;
    for (i, &(a, _)) in neighbours.iter().enumerate() {
        for &(b, _) in &neighbours[i + 1..] {
            if network.has_edge(a, b) {
                links += 1;
            }
        }
    }
    2.0 * links as f64 / (k * (k - 1)) as f64
}

/// Mean clustering coefficient over all nodes.
pub fn average_clustering(network: &KeywordNetwork) -> f64 {
    let n = network.node_count();
    if n == 0 {
        return 0.0;
    }
    (0..n).map(|i| clustering(network, i)).sum::<f64>() / n as f64
}

/// Betweenness centrality via Brandes' algorithm, ignoring weights and
/// normalized by `1 / ((n - 1)(n - 2))`.
pub fn betweenness_centrality(network: &KeywordNetwork) -> Vec<f64> {
    let n = network.node_count();
    let mut centrality = vec![0.0_f64; n];

    for source in 0..n {
        let mut stack: Vec<usize> = Vec::with_capacity(n);
        let mut predecessors: Vec<Vec<usize>> = vec![Vec::new(); n];
        let mut sigma = vec![0.0_f64; n];
        let mut dist = vec![-1_i64; n];
        let mut delta = vec![0.0_f64; n];

        sigma[source] = 1.0;
        dist[source] = 0;
        let mut queue = VecDeque::from([source]);

        while let Some(v) = queue.pop_front() {
            stack.push(v);
            for &(w, _) in network.neighbours(v) {
                if dist[w] < 0 {
                    dist[w] = dist[v] + 1;
                    queue.push_back(w);
                }
                if dist[w] == dist[v] + 1 {
                    sigma[w] += sigma[v];
                    predecessors[w].push(v);
                }
            }
        }

        while let Some(w) = stack.pop() {
            for &v in &predecessors[w] {
                delta[v] += sigma[v] / sigma[w] * (1.0 + delta[w]);
            }
            if w != source {
                centrality[w] += delta[w];
            }
        }
    }

    if n > 2 {
        let scale = 1.0 / ((n - 1) * (n - 2)) as f64;
        for value in &mut centrality {
            *value *= scale;
        }
    }
    centrality
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::network::tests::keyword_set;
    use crate::network::{louvain, LouvainConfig};

    fn network(edges: &[&str], entities: &[&str], themes: &[&str]) -> (KeywordNetwork, CoOccurrence) {
        let keywords = keyword_set(entities, themes);
        let counts = CoOccurrence::count(&keywords, edges.iter().copied());
        (KeywordNetwork::build(&keywords, &counts, 1), counts)
    }

    #[test]
    fn test_star_betweenness() {
        let (star, _) = network(&["hub x", "hub y", "hub z"], &["hub", "x", "y", "z"], &[]);
        let scores = betweenness_centrality(&star);
        // Hub lies on all three leaf-to-leaf paths: 2 * 3 / (3 * 2).
        assert_eq!(scores[0], 1.0);
        assert_eq!(&scores[1..], &[0.0, 0.0, 0.0]);
    }

    #[test]
    fn test_path_betweenness() {
        let (path, _) = network(&["p q", "q r"], &["p", "q", "r"], &[]);
        assert_eq!(betweenness_centrality(&path), vec![0.0, 1.0, 0.0]);
    }

    #[test]
    fn test_triangle_clustering_and_density() {
        let (triangle, _) = network(&["a b", "b c", "a c"], &["a", "b", "c"], &[]);
        assert_eq!(density(&triangle), 1.0);
        assert_eq!(average_clustering(&triangle), 1.0);
        assert_eq!(clustering(&triangle, 0), 1.0);
    }

    #[test]
    fn test_star_clustering_is_zero() {
        let (star, _) = network(&["hub x", "hub y", "hub z"], &["hub", "x", "y", "z"], &[]);
        assert_eq!(average_clustering(&star), 0.0);
        assert_eq!(density(&star), 0.5);
    }

    #[test]
    fn test_metrics_for_small_network() {
        let (net, counts) = network(
            &["wolf blood", "wolf girl", "blood girl", "wolf hunter"],
            &["wolf", "girl", "hunter"],
            &["blood"],
        );
        let partition = louvain(&net, &LouvainConfig::default());
        let metrics = NetworkMetrics::compute(&net, &counts, &partition);

        assert_eq!(metrics.num_nodes, 4);
        assert_eq!(metrics.num_edges, 4);
        assert_eq!(metrics.density, 0.6667);
        assert_eq!(metrics.avg_degree, 2.0);
        assert_eq!(metrics.max_degree, 3);
        assert_eq!(metrics.max_degree_node.as_deref(), Some("wolf"));
        assert_eq!(metrics.entity_nodes, 3);
        assert_eq!(metrics.theme_nodes, 1);
        assert_eq!(metrics.top_betweenness[0].node, "wolf");
        assert_eq!(metrics.top_betweenness.len(), 4);
        assert_eq!(metrics.top_co_occurrences.len(), 4);
        assert_eq!(
            metrics.community_sizes.values().sum::<usize>(),
            metrics.num_nodes
        );
        assert_eq!(metrics.num_communities, metrics.community_sizes.len());
    }

    #[test]
    fn test_empty_network_has_zeroed_metrics() {
        let net = KeywordNetwork::default();
        let metrics = NetworkMetrics::compute(&net, &CoOccurrence::default(), &Partition::default());

        assert_eq!(metrics.num_nodes, 0);
        assert_eq!(metrics.num_edges, 0);
        assert_eq!(metrics.density, 0.0);
        assert_eq!(metrics.avg_clustering, 0.0);
        assert_eq!(metrics.avg_degree, 0.0);
        assert_eq!(metrics.max_degree, 0);
        assert_eq!(metrics.max_degree_node, None);
        assert!(metrics.top_betweenness.is_empty());
        assert_eq!(metrics.num_communities, 0);
        assert!(metrics.community_sizes.is_empty());
        assert_eq!(metrics.modularity, 0.0);
    }
}
