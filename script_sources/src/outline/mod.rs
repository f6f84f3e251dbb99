//! Narrative outline records: arcs, sequences, beats and quoted dialogue.
//!
//! The outline is a Markdown document with a fixed heading ladder:
//!
//! ```text
//! ## CHAPTER 1: 小红帽
//! ### Arc 1.1: Camp Departure
//! #### Sequence 1.1.1: Awakening
//! **Location:** Map 001: 营地, Event 004
//! **Source:** Lines 143-158
//! 1. **The bugle wakes the camp**
//! > 「该出发了。」
//! > — 团长
//! ##### Summary
//! The squad prepares to leave.
//! ```

mod scanner;

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

use crate::error::{read_source, ParseResult};

/// Arc key used when a dialogue was read outside any arc.
pub const UNKNOWN_ARC: &str = "Unknown";

/// Heading context active when a record was read.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutlineContext {
    pub chapter: Option<u32>,
    /// Arc id, e.g. `1.1`.
    pub arc: Option<String>,
    /// Sequence id, e.g. `1.1.1`.
    pub sequence: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NarrativeArc {
    pub chapter: Option<u32>,
    pub arc_id: String,
    pub name: String,
    pub sequences: Vec<Sequence>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sequence {
    pub sequence_id: String,
    pub name: String,
    /// Raw text of the `**Location:**` line.
    pub location: Option<String>,
    pub map_id: Option<u32>,
    pub event_id: Option<u32>,
    /// Inclusive source line range in the event dump.
    pub source_lines: Option<(u32, u32)>,
    /// Summary sub-section, lines joined by single spaces. Empty when absent.
    pub summary: String,
}

impl Sequence {
    pub fn new(sequence_id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            sequence_id: sequence_id.into(),
            name: name.into(),
            location: None,
            map_id: None,
            event_id: None,
            source_lines: None,
            summary: String::new(),
        }
    }
}

/// A numbered, bolded plot point.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Beat {
    pub context: OutlineContext,
    pub description: String,
    pub line: usize,
}

/// A `「…」` quotation with its optional speaker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutlineDialogue {
    pub context: OutlineContext,
    pub text: String,
    pub speaker: Option<String>,
    pub line: usize,
}

/// Per-speaker dialogue census row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CharacterAppearance {
    pub character: String,
    pub dialogue_count: usize,
    pub arc_count: usize,
    /// Sorted arc ids, comma-joined.
    pub arcs: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutlineSummary {
    pub total_arcs: usize,
    pub total_sequences: usize,
    pub total_beats: usize,
    pub total_dialogues: usize,
    pub unique_characters: usize,
    pub characters: Vec<String>,
}

/// A fully parsed narrative outline.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NarrativeOutline {
    pub arcs: Vec<NarrativeArc>,
    pub beats: Vec<Beat>,
    pub dialogues: Vec<OutlineDialogue>,
    /// Every resolved speaker.
    pub characters: BTreeSet<String>,
}

impl NarrativeOutline {
    /// Parse outline text. Malformed structure is tolerated, so this cannot fail.
    pub fn parse_str(source: &str) -> Self {
        let state = scanner::scan(source);
        tracing::debug!(
            arcs = state.arcs.len(),
            dialogues = state.dialogues.len(),
            beats = state.beats.len(),
            "parsed narrative outline"
        );
        Self {
            arcs: state.arcs,
            beats: state.beats,
            dialogues: state.dialogues,
            characters: state.characters,
        }
    }

    /// Read and parse an outline file.
    pub fn parse_file(path: impl AsRef<Path>) -> ParseResult<Self> {
        let path = path.as_ref();
        let source = read_source(path)?;
        let outline = Self::parse_str(&source);
        tracing::info!(
            path = %path.display(),
            arcs = outline.arcs.len(),
            "loaded narrative outline"
        );
        Ok(outline)
    }

    pub fn sequences(&self) -> impl Iterator<Item = &Sequence> {
        self.arcs.iter().flat_map(|a| a.sequences.iter())
    }

    /// Dialogues grouped by arc id, [`UNKNOWN_ARC`] for those outside any arc.
    pub fn dialogue_by_arc(&self) -> BTreeMap<String, Vec<&OutlineDialogue>> {
        let mut groups: BTreeMap<String, Vec<&OutlineDialogue>> = BTreeMap::new();
        for dialogue in &self.dialogues {
            let key = dialogue.context.arc.as_deref().unwrap_or(UNKNOWN_ARC);
            groups.entry(key.to_string()).or_default().push(dialogue);
        }
        groups
    }

    /// Dialogue count and arc spread per speaker, most talkative first.
    pub fn character_appearances(&self) -> Vec<CharacterAppearance> {
        let mut tallies: BTreeMap<&str, (usize, BTreeSet<&str>)> = BTreeMap::new();
        for dialogue in &self.dialogues {
            let Some(speaker) = dialogue.speaker.as_deref() else {
                continue;
            };
            let entry = tallies.entry(speaker).or_default();
            entry.0 += 1;
            if let Some(arc) = dialogue.context.arc.as_deref() {
                entry.1.insert(arc);
            }
        }

        let mut rows: Vec<CharacterAppearance> = tallies
            .into_iter()
            .map(|(character, (count, arcs))| CharacterAppearance {
                character: character.to_string(),
                dialogue_count: count,
                arc_count: arcs.len(),
                arcs: arcs.into_iter().collect::<Vec<_>>().join(", "),
            })
            .collect();
        // Tallies iterate by name, so a stable sort keeps ties alphabetical.
        rows.sort_by(|a, b| b.dialogue_count.cmp(&a.dialogue_count));
        rows
    }

    /// All dialogue text, then every non-empty sequence summary, one per line.
    pub fn extract_all_text(&self) -> String {
        self.dialogues
            .iter()
            .map(|d| d.text.as_str())
            .chain(
                self.sequences()
                    .map(|s| s.summary.as_str())
                    .filter(|s| !s.is_empty()),
            )
            .collect::<Vec<_>>()
            .join("\n")
    }

    pub fn summary(&self) -> OutlineSummary {
        OutlineSummary {
            total_arcs: self.arcs.len(),
            total_sequences: self.sequences().count(),
            total_beats: self.beats.len(),
            total_dialogues: self.dialogues.len(),
            unique_characters: self.characters.len(),
            characters: self.characters.iter().cloned().collect(),
        }
    }
}
