//! Keyword co-occurrence counting over dialogue segments.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::KeywordSet;

/// Unordered keyword pair, stored with the lexicographically smaller text
/// first so `(a, b)` and `(b, a)` share one entry.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct KeywordPair(String, String);

impl KeywordPair {
    pub fn new(a: &str, b: &str) -> Self {
        if a <= b {
            Self(a.to_string(), b.to_string())
        } else {
            Self(b.to_string(), a.to_string())
        }
    }

    pub fn first(&self) -> &str {
        &self.0
    }

    pub fn second(&self) -> &str {
        &self.1
    }
}

/// A pair and its segment count, as reported in metrics.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PairCount {
    pub pair: [String; 2],
    pub count: usize,
}

/// Segment counts per keyword pair.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoOccurrence {
    counts: BTreeMap<KeywordPair, usize>,
    /// Pairs in the order they were first counted.
    first_seen: Vec<KeywordPair>,
}

impl CoOccurrence {
    /// Count, for every segment, each unordered pair of keywords it contains.
    pub fn count<'a>(keywords: &KeywordSet, segments: impl IntoIterator<Item = &'a str>) -> Self {
        let mut counts: BTreeMap<KeywordPair, usize> = BTreeMap::new();
        let mut first_seen = Vec::new();
        let mut segment_count = 0usize;

        for text in segments {
            segment_count += 1;
            let present = keywords.present_in(text);
            for i in 0..present.len() {
                for j in (i + 1)..present.len() {
                    let pair = KeywordPair::new(present[i], present[j]);
                    if !counts.contains_key(&pair) {
                        first_seen.push(pair.clone());
                    }
                    *counts.entry(pair).or_default() += 1;
                }
            }
        }

        tracing::debug!(
            segments = segment_count,
            pairs = counts.len(),
            "counted keyword co-occurrences"
        );
        Self { counts, first_seen }
    }

    /// Count for a pair in either order.
    pub fn get(&self, a: &str, b: &str) -> usize {
        self.counts.get(&KeywordPair::new(a, b)).copied().unwrap_or(0)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&KeywordPair, usize)> {
        self.counts.iter().map(|(pair, count)| (pair, *count))
    }

    pub fn len(&self) -> usize {
        self.counts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    /// The `n` most frequent pairs; equal counts stay in first-counted order.
    pub fn top(&self, n: usize) -> Vec<PairCount> {
        let mut pairs: Vec<(&KeywordPair, usize)> = self
            .first_seen
            .iter()
            .map(|pair| (pair, self.get(pair.first(), pair.second())))
            .collect();
        pairs.sort_by(|a, b| b.1.cmp(&a.1));
        pairs
            .into_iter()
            .take(n)
            .map(|(pair, count)| PairCount {
                pair: [pair.first().to_string(), pair.second().to_string()],
                count,
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn keywords() -> KeywordSet {
        KeywordSet::new(
            &["wolf".to_string(), "girl".to_string()],
            &["blood".to_string(), "home".to_string()],
        )
    }

    #[test]
    fn test_pair_is_canonical() {
        assert_eq!(KeywordPair::new("wolf", "blood"), KeywordPair::new("blood", "wolf"));
        assert_eq!(KeywordPair::new("wolf", "blood").first(), "blood");
    }

    #[test]
    fn test_counts_are_symmetric() {
        let counts = CoOccurrence::count(
            &keywords(),
            ["the wolf drew blood", "blood on the wolf", "the girl went home"],
        );
        assert_eq!(counts.get("wolf", "blood"), 2);
        assert_eq!(counts.get("blood", "wolf"), 2);
        assert_eq!(counts.get("girl", "home"), 1);
        assert_eq!(counts.get("girl", "wolf"), 0);
        assert_eq!(counts.len(), 2);
    }

    #[test]
    fn test_all_pairs_in_a_segment() {
        let counts = CoOccurrence::count(&keywords(), ["wolf girl blood home"]);
        assert_eq!(counts.len(), 6);
        assert!(counts.iter().all(|(_, n)| n == 1));
    }

    #[test]
    fn test_single_keyword_segments_add_nothing() {
        let counts = CoOccurrence::count(&keywords(), ["wolf", "home", ""]);
        assert!(counts.is_empty());
    }

    #[test]
    fn test_top_orders_by_count_then_first_seen() {
        let counts = CoOccurrence::count(
            &keywords(),
            ["wolf girl", "wolf home", "wolf home", "blood girl"],
        );
        let top = counts.top(2);
        assert_eq!(top[0].pair, ["home".to_string(), "wolf".to_string()]);
        assert_eq!(top[0].count, 2);
        assert_eq!(top[1].pair, ["girl".to_string(), "wolf".to_string()]);
        assert_eq!(counts.top(10).len(), 3);
    }
}
