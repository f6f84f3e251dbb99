//! Beat alignment between a reference story and the game script.
//!
//! Beats are matched by type. Each reference beat takes the first unused
//! subject beat of its type; a shared word from [`OVERLAP_VOCABULARY`] makes
//! the match a direct transposition, otherwise it is a structural homology.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap, VecDeque};

use crate::config::{ReferenceBeat, SubjectBeat};
use crate::report::{percent, round_to, title_case, Table};

/// Words whose presence in both descriptions marks a direct transposition.
pub const OVERLAP_VOCABULARY: [&str; 16] = [
    "kill",
    "tank",
    "wolf",
    "werewolf",
    "visit",
    "mother",
    "grandmother",
    "leave",
    "return",
    "soap",
    "letter",
    "deliver",
    "promise",
    "train",
    "journey",
    "delay",
];

const NO_LOCATION: &str = "—";
const NO_MATCH: &str = "(No match)";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MatchType {
    #[serde(rename = "Direct Transposition")]
    DirectTransposition,
    #[serde(rename = "Structural Homology")]
    StructuralHomology,
    Unmatched,
}

impl MatchType {
    pub fn label(&self) -> &'static str {
        match self {
            MatchType::DirectTransposition => "Direct Transposition",
            MatchType::StructuralHomology => "Structural Homology",
            MatchType::Unmatched => "Unmatched",
        }
    }

    pub fn is_match(&self) -> bool {
        !matches!(self, MatchType::Unmatched)
    }
}

impl std::fmt::Display for MatchType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Classify a matched pair by shared vocabulary.
pub fn classify_match(reference: &str, subject: &str) -> MatchType {
    let reference = reference.to_lowercase();
    let subject = subject.to_lowercase();
    let reference_words: BTreeSet<&str> = reference.split_whitespace().collect();
    let shared = subject
        .split_whitespace()
        .any(|word| OVERLAP_VOCABULARY.contains(&word) && reference_words.contains(word));

    if shared {
        MatchType::DirectTransposition
    } else {
        MatchType::StructuralHomology
    }
}

/// Minutes from `H:M:S` or `M:S`; anything else is 0.
pub fn timestamp_minutes(timestamp: &str) -> f64 {
    let parts: Option<Vec<u32>> = timestamp
        .split(':')
        .map(|p| p.trim().parse().ok())
        .collect();
    match parts.as_deref() {
        Some([h, m, s]) => f64::from(*h) * 60.0 + f64::from(*m) + f64::from(*s) / 60.0,
        Some([m, s]) => f64::from(*m) + f64::from(*s) / 60.0,
        _ => 0.0,
    }
}

fn subject_location(beat: &SubjectBeat) -> String {
    format!(
        "Map {:03}, Event {:03}, Line {}",
        beat.map_id, beat.event_id, beat.line
    )
}

/// One reference beat and what it was matched to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlignmentRow {
    pub beat_type: String,
    pub reference_timestamp: String,
    pub reference_description: String,
    pub subject_location: String,
    pub subject_description: String,
    pub match_type: MatchType,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlignmentMetrics {
    pub total_reference_beats: usize,
    pub total_subject_beats: usize,
    pub matched_beats: usize,
    pub unmatched_beats: usize,
    pub alignment_score_percent: f64,
    pub direct_transpositions: usize,
    pub structural_homologies: usize,
    /// Distinct beat types with at least one match.
    pub beat_types_present: usize,
    pub total_beat_types: usize,
    /// Matches per display beat type.
    pub beat_type_matches: BTreeMap<String, usize>,
}

/// Result of aligning two beat lists.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Alignment {
    /// One row per reference beat, ordered by reference timestamp.
    pub rows: Vec<AlignmentRow>,
    pub total_subject_beats: usize,
}

impl Alignment {
    /// Match reference beats against subject beats.
    pub fn compute(reference: &[ReferenceBeat], subject: &[SubjectBeat]) -> Self {
        let mut pools: HashMap<&str, VecDeque<&SubjectBeat>> = HashMap::new();
        for beat in subject {
            pools.entry(beat.beat_type.as_str()).or_default().push_back(beat);
        }

        // Reference groups in order of first appearance.
        let mut type_order: Vec<&str> = Vec::new();
        for beat in reference {
            if !type_order.contains(&beat.beat_type.as_str()) {
                type_order.push(&beat.beat_type);
            }
        }

        let mut rows = Vec::with_capacity(reference.len());
        for beat_type in type_order {
            for beat in reference.iter().filter(|b| b.beat_type == beat_type) {
                let candidate = pools.get_mut(beat_type).and_then(VecDeque::pop_front);
                let row = match candidate {
                    Some(found) => AlignmentRow {
                        beat_type: title_case(beat_type),
                        reference_timestamp: beat.timestamp.clone(),
                        reference_description: beat.description.clone(),
                        subject_location: subject_location(found),
                        subject_description: found.description.clone(),
                        match_type: classify_match(&beat.description, &found.description),
                    },
                    None => AlignmentRow {
                        beat_type: title_case(beat_type),
                        reference_timestamp: beat.timestamp.clone(),
                        reference_description: beat.description.clone(),
                        subject_location: NO_LOCATION.to_string(),
                        subject_description: NO_MATCH.to_string(),
                        match_type: MatchType::Unmatched,
                    },
                };
                rows.push(row);
            }
        }

        rows.sort_by(|a, b| {
            timestamp_minutes(&a.reference_timestamp)
                .total_cmp(&timestamp_minutes(&b.reference_timestamp))
        });

        tracing::debug!(rows = rows.len(), "computed beat alignment");
        Self {
            rows,
            total_subject_beats: subject.len(),
        }
    }

    pub fn matched(&self) -> usize {
        self.rows.iter().filter(|r| r.match_type.is_match()).count()
    }

    /// Matched reference beats as a percentage, 0 with no reference beats.
    pub fn score(&self) -> f64 {
        percent(self.matched(), self.rows.len())
    }

    fn count(&self, match_type: MatchType) -> usize {
        self.rows.iter().filter(|r| r.match_type == match_type).count()
    }

    pub fn metrics(&self) -> AlignmentMetrics {
        let mut beat_type_matches: BTreeMap<String, usize> = BTreeMap::new();
        for row in &self.rows {
            let entry = beat_type_matches.entry(row.beat_type.clone()).or_default();
            if row.match_type.is_match() {
                *entry += 1;
            }
        }

        let matched = self.matched();
        AlignmentMetrics {
            total_reference_beats: self.rows.len(),
            total_subject_beats: self.total_subject_beats,
            matched_beats: matched,
            unmatched_beats: self.rows.len() - matched,
            alignment_score_percent: round_to(self.score(), 2),
            direct_transpositions: self.count(MatchType::DirectTransposition),
            structural_homologies: self.count(MatchType::StructuralHomology),
            beat_types_present: beat_type_matches.values().filter(|n| **n > 0).count(),
            total_beat_types: beat_type_matches.len(),
            beat_type_matches,
        }
    }

    pub fn table(&self) -> Table {
        let mut table = Table::new([
            "Beat Type",
            "Reference Timestamp",
            "Reference Beat",
            "Subject Location",
            "Subject Beat",
            "Match Type",
        ])
        .with_title("Structural Alignment: Reference vs. Subject Beats");

        for row in &self.rows {
            table.push_row([
                row.beat_type.clone(),
                row.reference_timestamp.clone(),
                row.reference_description.clone(),
                row.subject_location.clone(),
                row.subject_description.clone(),
                row.match_type.label().to_string(),
            ]);
        }
        table
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reference(beat_type: &str, timestamp: &str, description: &str) -> ReferenceBeat {
        ReferenceBeat {
            beat_type: beat_type.to_string(),
            timestamp: timestamp.to_string(),
            description: description.to_string(),
        }
    }

    fn subject(beat_type: &str, description: &str, map_id: u32) -> SubjectBeat {
        SubjectBeat {
            beat_type: beat_type.to_string(),
            description: description.to_string(),
            map_id,
            event_id: 2,
            line: 10,
        }
    }

    #[test]
    fn test_shared_vocabulary_is_direct_transposition() {
        let alignment = Alignment::compute(
            &[reference("heroic_act", "0:05:00", "Alyosha destroys a tank")],
            &[subject("heroic_act", "She destroys a tank", 5)],
        );

        assert_eq!(alignment.rows.len(), 1);
        let row = &alignment.rows[0];
        assert_eq!(row.match_type, MatchType::DirectTransposition);
        assert_eq!(row.beat_type, "Heroic Act");
        assert_eq!(row.subject_location, "Map 005, Event 002, Line 10");
        assert_eq!(alignment.score(), 100.0);
    }

    #[test]
    fn test_no_shared_vocabulary_is_structural_homology() {
        // "destroys" is shared but is not in the vocabulary.
        assert_eq!(
            classify_match("He destroys it", "She destroys it"),
            MatchType::StructuralHomology
        );
        assert_eq!(
            classify_match("A LETTER arrives", "the letter burns"),
            MatchType::DirectTransposition
        );
        // Word sets, not substrings.
        assert_eq!(
            classify_match("werewolves", "werewolf"),
            MatchType::StructuralHomology
        );
    }

    #[test]
    fn test_fifo_consumption_and_unmatched() {
        let alignment = Alignment::compute(
            &[
                reference("journey_delay", "0:30:00", "The train is delayed"),
                reference("journey_delay", "0:40:00", "Another delay"),
                reference("journey_delay", "0:50:00", "A third delay"),
                reference("reward", "0:10:00", "He is granted leave"),
            ],
            &[
                subject("journey_delay", "First train stop", 11),
                subject("journey_delay", "Second stop", 12),
            ],
        );

        let locations: Vec<&str> = alignment
            .rows
            .iter()
            .map(|r| r.subject_location.as_str())
            .collect();
        assert_eq!(
            locations,
            vec![
                NO_LOCATION,
                "Map 011, Event 002, Line 10",
                "Map 012, Event 002, Line 10",
                NO_LOCATION,
            ]
        );
        assert_eq!(alignment.rows[0].subject_description, NO_MATCH);
        assert_eq!(alignment.rows[0].match_type, MatchType::Unmatched);
        assert_eq!(alignment.rows[1].match_type, MatchType::DirectTransposition);

        let metrics = alignment.metrics();
        assert_eq!(metrics.total_reference_beats, 4);
        assert_eq!(metrics.total_subject_beats, 2);
        assert_eq!(metrics.matched_beats, 2);
        assert_eq!(metrics.unmatched_beats, 2);
        assert_eq!(metrics.alignment_score_percent, 50.0);
        assert_eq!(metrics.direct_transpositions, 1);
        assert_eq!(metrics.structural_homologies, 1);
        assert_eq!(metrics.beat_types_present, 1);
        assert_eq!(metrics.total_beat_types, 2);
        assert_eq!(metrics.beat_type_matches["Journey Delay"], 2);
        assert_eq!(metrics.beat_type_matches["Reward"], 0);
    }

    #[test]
    fn test_empty_reference_scores_zero() {
        let alignment = Alignment::compute(&[], &[subject("reward", "x", 1)]);
        assert!(alignment.rows.is_empty());
        assert_eq!(alignment.score(), 0.0);
        assert_eq!(alignment.metrics().alignment_score_percent, 0.0);
    }

    #[test]
    fn test_score_bounds() {
        let alignment = Alignment::compute(
            &[reference("a", "1:00", "x"), reference("b", "2:00", "y")],
            &[subject("a", "x", 1), subject("a", "x", 2), subject("c", "z", 3)],
        );
        let score = alignment.score();
        assert!((0.0..=100.0).contains(&score));
        assert_eq!(score, 50.0);
    }

    #[test]
    fn test_timestamp_minutes() {
        assert_eq!(timestamp_minutes("1:02:30"), 62.5);
        assert_eq!(timestamp_minutes("05:30"), 5.5);
        assert_eq!(timestamp_minutes("soon"), 0.0);
        assert_eq!(timestamp_minutes("1:2:3:4"), 0.0);
        assert_eq!(timestamp_minutes(""), 0.0);
    }

    #[test]
    fn test_unparseable_timestamps_sort_first_stably() {
        let alignment = Alignment::compute(
            &[
                reference("a", "0:10", "late"),
                reference("b", "??", "first unknown"),
                reference("c", "later", "second unknown"),
            ],
            &[],
        );
        let order: Vec<&str> = alignment
            .rows
            .iter()
            .map(|r| r.reference_description.as_str())
            .collect();
        assert_eq!(order, vec!["first unknown", "second unknown", "late"]);
    }

    #[test]
    fn test_beat_type_display() {
        assert_eq!(title_case("journey_delay"), "Journey Delay");
        assert_eq!(title_case("HEROIC_act"), "Heroic Act");
        assert_eq!(title_case("mother's_farewell"), "Mother'S Farewell");
    }

    #[test]
    fn test_table_shape() {
        let alignment = Alignment::compute(
            &[reference("reward", "0:10:00", "Leave granted")],
            &[],
        );
        let table = alignment.table();
        assert_eq!(table.headers.len(), 6);
        assert_eq!(table.rows[0][5], "Unmatched");
        assert_eq!(table.rows[0][3], "—");
    }
}
