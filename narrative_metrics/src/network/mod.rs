//! Keyword network - entities and themes linked by dialogue co-occurrence.
//!
//! The network consists of:
//! - **Keywords**: configured entity/theme strings, the nodes
//! - **Co-occurrence**: per-pair counts of dialogue segments mentioning both
//! - **Edges**: pairs whose count reaches the threshold, weighted by count
//!
//! Nodes without any edge are dropped after the edges are built.

mod co_occurrence;
mod community;
mod keyword;
mod metrics;

pub use co_occurrence::*;
pub use community::*;
pub use keyword::*;
pub use metrics::*;

use serde::{Deserialize, Serialize};

use crate::report::Table;

/// How many pairs the co-occurrence table and metrics list.
pub const TOP_PAIRS: usize = 20;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NetworkNode {
    pub keyword: String,
    pub kind: KeywordKind,
}

/// Weighted undirected graph over keywords, stored as index adjacency lists.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct KeywordNetwork {
    nodes: Vec<NetworkNode>,
    /// Neighbours of each node as `(node index, weight)`, ascending by index.
    adjacency: Vec<Vec<(usize, f64)>>,
    edge_count: usize,
}

impl KeywordNetwork {
    /// Build the network from counted pairs. Only configured keywords become
    /// nodes, in declaration order.
    pub fn build(keywords: &KeywordSet, counts: &CoOccurrence, threshold: usize) -> Self {
        let edges: Vec<(usize, usize, f64)> = counts
            .iter()
            .filter(|(_, count)| *count >= threshold)
            .filter_map(|(pair, count)| {
                let a = keywords.position(pair.first())?;
                let b = keywords.position(pair.second())?;
                (a != b).then_some((a, b, count as f64))
            })
            .collect();

        // Keep only keywords touched by an edge, renumbered in declaration order.
        let mut index = vec![None; keywords.len()];
        let mut nodes = Vec::new();
        for (position, keyword) in keywords.iter().enumerate() {
            if edges.iter().any(|&(a, b, _)| a == position || b == position) {
                index[position] = Some(nodes.len());
                nodes.push(NetworkNode {
                    keyword: keyword.text.clone(),
                    kind: keyword.kind,
                });
            }
        }

        let mut adjacency: Vec<Vec<(usize, f64)>> = vec![Vec::new(); nodes.len()];
        for &(a, b, weight) in &edges {
            if let (Some(a), Some(b)) = (index[a], index[b]) {
                adjacency[a].push((b, weight));
                adjacency[b].push((a, weight));
            }
        }
        for neighbours in &mut adjacency {
            neighbours.sort_by_key(|&(n, _)| n);
        }

        tracing::debug!(
            nodes = nodes.len(),
            edges = edges.len(),
            isolated = keywords.len() - nodes.len(),
            "built keyword network"
        );
        Self {
            nodes,
            adjacency,
            edge_count: edges.len(),
        }
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edge_count
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn nodes(&self) -> &[NetworkNode] {
        &self.nodes
    }

    pub fn neighbours(&self, node: usize) -> &[(usize, f64)] {
        self.adjacency.get(node).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn degree(&self, node: usize) -> usize {
        self.neighbours(node).len()
    }

    pub fn has_edge(&self, a: usize, b: usize) -> bool {
        self.neighbours(a).binary_search_by_key(&b, |&(n, _)| n).is_ok()
    }

    pub fn node_index(&self, keyword: &str) -> Option<usize> {
        self.nodes.iter().position(|n| n.keyword == keyword)
    }

    /// Each edge once, as `(a, b, weight)` with `a < b`.
    pub fn edges(&self) -> impl Iterator<Item = (usize, usize, f64)> + '_ {
        self.adjacency.iter().enumerate().flat_map(|(a, neighbours)| {
            neighbours
                .iter()
                .filter(move |&&(b, _)| a < b)
                .map(move |&(b, w)| (a, b, w))
        })
    }
}

/// Table of the most frequent pairs with the kind of each keyword.
pub fn co_occurrence_table(keywords: &KeywordSet, counts: &CoOccurrence) -> Table {
    let mut table = Table::new([
        "Entity/Theme 1",
        "Entity/Theme 2",
        "Co-occurrence Count",
        "Type 1",
        "Type 2",
    ])
    .with_title("Top Entity/Theme Co-occurrences");

    let kind = |text: &str| {
        keywords
            .kind_of(text)
            .map(|k| k.as_str())
            .unwrap_or("unknown")
            .to_string()
    };
    for entry in counts.top(TOP_PAIRS) {
        let [a, b] = entry.pair;
        let (kind_a, kind_b) = (kind(&a), kind(&b));
        table.push_row([a, b, entry.count.to_string(), kind_a, kind_b]);
    }
    table
}

#[cfg(test)]
mod tests {
    use super::*;

    pub(crate) fn keyword_set(entities: &[&str], themes: &[&str]) -> KeywordSet {
        let owned = |items: &[&str]| items.iter().map(|s| s.to_string()).collect::<Vec<_>>();
        KeywordSet::new(&owned(entities), &owned(themes))
    }

    #[test]
    fn test_threshold_and_isolated_nodes() {
        let keywords = keyword_set(&["wolf", "girl", "hunter"], &["blood"]);
        let counts = CoOccurrence::count(
            &keywords,
            ["wolf blood", "blood wolf", "girl hunter"],
        );
        let network = KeywordNetwork::build(&keywords, &counts, 2);

        assert_eq!(network.node_count(), 2);
        assert_eq!(network.edge_count(), 1);
        assert_eq!(network.nodes()[0].keyword, "wolf");
        assert_eq!(network.nodes()[1].kind, KeywordKind::Theme);
        assert!(network.has_edge(0, 1));
        assert!(network.has_edge(1, 0));
        assert_eq!(network.neighbours(0), &[(1, 2.0)]);
        assert_eq!(network.node_index("girl"), None);
    }

    #[test]
    fn test_threshold_one_keeps_every_pair() {
        let keywords = keyword_set(&["wolf", "girl", "hunter"], &["blood"]);
        let counts = CoOccurrence::count(&keywords, ["wolf blood", "girl hunter"]);
        let network = KeywordNetwork::build(&keywords, &counts, 1);

        assert_eq!(network.node_count(), 4);
        assert_eq!(network.edge_count(), 2);
        let edges: Vec<(usize, usize, f64)> = network.edges().collect();
        assert_eq!(edges.len(), 2);
        assert!(edges.iter().all(|&(a, b, _)| a < b));
    }

    #[test]
    fn test_no_edges_gives_empty_network() {
        let keywords = keyword_set(&["wolf"], &["blood"]);
        let counts = CoOccurrence::count(&keywords, ["wolf blood"]);
        let network = KeywordNetwork::build(&keywords, &counts, 2);
        assert!(network.is_empty());
        assert_eq!(network.edge_count(), 0);
        assert_eq!(network.degree(0), 0);
    }

    #[test]
    fn test_table_marks_kinds() {
        let keywords = keyword_set(&["wolf"], &["blood"]);
        let counts = CoOccurrence::count(&keywords, ["wolf blood", "wolf blood"]);
        let table = co_occurrence_table(&keywords, &counts);

        assert_eq!(table.rows.len(), 1);
        assert_eq!(table.rows[0], vec!["blood", "wolf", "2", "theme", "entity"]);
    }
}
