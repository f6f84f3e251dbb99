//! Context scores for a single motif instance.

use serde::{Deserialize, Serialize};

use crate::config::MotifContexts;

/// Context reported when no category keyword is present.
pub const NEUTRAL: &str = "neutral";

/// Keyword hits per context category, in category declaration order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContextScores {
    scores: Vec<(String, usize)>,
}

impl ContextScores {
    /// Score `text` against every category: one point per keyword contained.
    pub fn score(contexts: &MotifContexts, text: &str) -> Self {
        let scores = contexts
            .iter()
            .map(|category| {
                let hits = category
                    .keywords
                    .iter()
                    .filter(|k| !k.is_empty() && text.contains(k.as_str()))
                    .count();
                (category.name.clone(), hits)
            })
            .collect();
        Self { scores }
    }

    /// Score of a category; 0 when it is not configured.
    pub fn get(&self, category: &str) -> usize {
        self.scores
            .iter()
            .find(|(name, _)| name == category)
            .map_or(0, |(_, score)| *score)
    }

    pub fn total(&self) -> usize {
        self.scores.iter().map(|(_, score)| score).sum()
    }

    /// Highest scoring category. The earliest declared category wins ties,
    /// `None` when nothing scored.
    pub fn dominant(&self) -> Option<&str> {
        let mut best: Option<(&str, usize)> = None;
        for (name, score) in &self.scores {
            if *score > best.map_or(0, |(_, s)| s) {
                best = Some((name, *score));
            }
        }
        best.map(|(name, _)| name)
    }

    /// Dominant category name or [`NEUTRAL`].
    pub fn dominant_context(&self) -> &str {
        self.dominant().unwrap_or(NEUTRAL)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, usize)> {
        self.scores.iter().map(|(name, score)| (name.as_str(), *score))
    }
}
