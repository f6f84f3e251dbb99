//! Source census: what the two parsed sources contain.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use script_sources::{DumpSummary, EventDump, NarrativeOutline, OutlineSummary};

use crate::report::Table;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CensusMetrics {
    pub event_dump: DumpSummary,
    pub outline: OutlineSummary,
    /// Outline dialogue count per arc id.
    pub dialogues_by_arc: BTreeMap<String, usize>,
    /// Characters in the whole-text export of the outline.
    pub outline_text_chars: usize,
}

impl CensusMetrics {
    pub fn compute(dump: &EventDump, outline: &NarrativeOutline) -> Self {
        Self {
            event_dump: dump.summary(),
            outline: outline.summary(),
            dialogues_by_arc: outline
                .dialogue_by_arc()
                .into_iter()
                .map(|(arc, dialogues)| (arc, dialogues.len()))
                .collect(),
            outline_text_chars: outline.extract_all_text().chars().count(),
        }
    }
}

/// Speakers of the outline, most talkative first.
pub fn character_table(outline: &NarrativeOutline) -> Table {
    let mut table = Table::new(["Character", "Dialogue Count", "Arc Count", "Arcs"])
        .with_title("Character Appearances");
    for appearance in outline.character_appearances() {
        table.push_row([
            appearance.character,
            appearance.dialogue_count.to_string(),
            appearance.arc_count.to_string(),
            appearance.arcs,
        ]);
    }
    table
}

#[cfg(test)]
mod tests {
    use super::*;

    const DUMP: &str = "\
Map ID: 1
Map Name: Camp
Event ID: 1
Event Name: Briefing
@>Text: 小红帽, report.
@>Battle Processing: Wolf
";

    const OUTLINE: &str = "\
### Arc 1.1: Departure
「出发吧」
— 团长
「好的」
— 小红帽
### Arc 1.2: Forest
「狼来了」
— 小红帽
";

    #[test]
    fn test_census_counts_both_sources() {
        let dump = EventDump::parse_str(DUMP).unwrap();
        let outline = NarrativeOutline::parse_str(OUTLINE);
        let metrics = CensusMetrics::compute(&dump, &outline);

        assert_eq!(metrics.event_dump.total_maps, 1);
        assert_eq!(metrics.event_dump.total_dialogue_commands, 1);
        assert_eq!(metrics.outline.total_arcs, 2);
        assert_eq!(metrics.outline.total_dialogues, 3);
        assert_eq!(metrics.dialogues_by_arc["1.1"], 2);
        assert_eq!(metrics.dialogues_by_arc["1.2"], 1);
        assert_eq!(metrics.outline_text_chars, "出发吧\n好的\n狼来了".chars().count());
    }

    #[test]
    fn test_character_table_order() {
        let outline = NarrativeOutline::parse_str(OUTLINE);
        let table = character_table(&outline);

        assert_eq!(table.rows.len(), 2);
        assert_eq!(table.rows[0], vec!["小红帽", "2", "2", "1.1, 1.2"]);
        assert_eq!(table.rows[1], vec!["团长", "1", "1", "1.1"]);
    }
}
