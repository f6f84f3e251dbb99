//! Forward scan over the Markdown outline.
//!
//! Context (chapter, arc, sequence) lives in [`OutlineState`] and is stamped
//! onto every dialogue and beat as it is read; a heading only replaces its
//! own field. Sequence headings trigger a bounded sub-scan of the block
//! beneath them; that sub-scan owns the cursor until the block ends, so each
//! line is extracted exactly once.

use lazy_static::lazy_static;
use regex::{Captures, Regex};
use std::collections::BTreeSet;

use super::{Beat, NarrativeArc, OutlineContext, OutlineDialogue, Sequence};

lazy_static! {
    static ref CHAPTER: Regex = Regex::new(r"^## CHAPTER ([0-9]+)[:：]?\s*(.+)?$").unwrap();
    static ref ARC: Regex = Regex::new(r"^### Arc ([0-9]+\.[0-9]+)[:：]?\s*(.+)?$").unwrap();
    static ref SEQUENCE: Regex =
        Regex::new(r"^#### Sequence ([0-9]+\.[0-9]+\.[0-9]+)[:：]?\s*(.+)?$").unwrap();
    static ref LOCATION: Regex = Regex::new(r"\*\*Location:\*\*\s*(.+)").unwrap();
    static ref LOCATION_MAP: Regex = Regex::new(r"Map ([0-9]+)").unwrap();
    static ref LOCATION_EVENT: Regex = Regex::new(r"Event ([0-9]+)").unwrap();
    static ref SOURCE: Regex =
        Regex::new(r"\*\*Source:\*\*\s*Lines?\s*([0-9]+)(?:-([0-9]+))?").unwrap();
    static ref DIALOGUE: Regex = Regex::new(r"「(.+?)」").unwrap();
    static ref SPEAKER_NEXT_LINE: Regex = Regex::new(r"[—–-]\s*(.+)").unwrap();
    static ref SPEAKER_SAME_LINE: Regex = Regex::new(r"^>\s*(.+?)[:：]\s*$").unwrap();
    static ref BEAT: Regex = Regex::new(r"^[0-9]+\.\s*\*\*(.+?)\*\*").unwrap();
}

const SUMMARY_HEADING: &str = "##### Summary";
/// Headings at or above this depth close a sequence block.
const SEQUENCE_DEPTH: usize = 4;

/// Everything collected by one scan.
#[derive(Debug, Default)]
pub(super) struct OutlineState {
    pub(super) arcs: Vec<NarrativeArc>,
    pub(super) beats: Vec<Beat>,
    pub(super) dialogues: Vec<OutlineDialogue>,
    pub(super) characters: BTreeSet<String>,
    chapter: Option<u32>,
    arc: Option<String>,
    sequence: Option<String>,
}

impl OutlineState {
    fn context(&self) -> OutlineContext {
        OutlineContext {
            chapter: self.chapter,
            arc: self.arc.clone(),
            sequence: self.sequence.clone(),
        }
    }

    /// Run the dialogue and beat extractors over one line.
    fn extract_content(&mut self, lines: &[&str], index: usize) {
        let line = lines[index];

        if let Some(caps) = DIALOGUE.captures(line) {
            let speaker = speaker_for(lines, index);
            if let Some(speaker) = &speaker {
                self.characters.insert(speaker.clone());
            }
            self.dialogues.push(OutlineDialogue {
                context: self.context(),
                text: caps[1].to_string(),
                speaker,
                line: index + 1,
            });
        }

        if let Some(caps) = BEAT.captures(line) {
            self.beats.push(Beat {
                context: self.context(),
                description: caps[1].to_string(),
                line: index + 1,
            });
        }
    }

    /// Consume the block under a sequence heading, starting at `start`.
    /// Returns the index of the first line not consumed.
    fn scan_sequence_block(&mut self, lines: &[&str], start: usize, sequence: &mut Sequence) -> usize {
        let mut cursor = start;

        while cursor < lines.len() {
            let line = lines[cursor];
            if heading_depth(line).is_some_and(|depth| depth <= SEQUENCE_DEPTH) {
                break;
            }

            if line.trim() == SUMMARY_HEADING {
                cursor += 1;
                let mut parts = Vec::new();
                while cursor < lines.len() && !lines[cursor].starts_with('#') {
                    let text = lines[cursor].trim();
                    if !text.is_empty() {
                        parts.push(text);
                    }
                    self.extract_content(lines, cursor);
                    cursor += 1;
                }
                sequence.summary = parts.join(" ");
                continue;
            }

            if let Some(caps) = LOCATION.captures(line) {
                let location = caps[1].trim().to_string();
                sequence.map_id = LOCATION_MAP
                    .captures(&location)
                    .and_then(|c| parse_number(&c, 1));
                sequence.event_id = LOCATION_EVENT
                    .captures(&location)
                    .and_then(|c| parse_number(&c, 1));
                sequence.location = Some(location);
            }

            if let Some(caps) = SOURCE.captures(line) {
                if let Some(start_line) = parse_number(&caps, 1) {
                    let end_line = if caps.get(2).is_some() {
                        parse_number(&caps, 2)
                    } else {
                        Some(start_line)
                    };
                    sequence.source_lines = end_line.map(|end| (start_line, end));
                }
            }

            self.extract_content(lines, cursor);
            cursor += 1;
        }

        cursor
    }
}

/// Depth of a Markdown heading: leading `#` count followed by whitespace or
/// end of line.
fn heading_depth(line: &str) -> Option<usize> {
    let hashes = line.bytes().take_while(|b| *b == b'#').count();
    if hashes == 0 {
        return None;
    }
    match line[hashes..].chars().next() {
        None => Some(hashes),
        Some(c) if c.is_whitespace() => Some(hashes),
        Some(_) => None,
    }
}

/// Numeric capture group; overflow reads as absent.
fn parse_number(caps: &Captures<'_>, group: usize) -> Option<u32> {
    caps.get(group).and_then(|m| m.as_str().parse().ok())
}

/// Optional trailing title of a heading.
fn heading_name(caps: &Captures<'_>) -> String {
    caps.get(2)
        .map(|m| m.as_str().trim().to_string())
        .unwrap_or_default()
}

/// A dash-led attribution on the following line, else a `> Name:` line.
fn speaker_for(lines: &[&str], index: usize) -> Option<String> {
    if let Some(caps) = lines
        .get(index + 1)
        .and_then(|next| SPEAKER_NEXT_LINE.captures(next))
    {
        let name = caps[1].trim();
        return (!name.is_empty()).then(|| name.to_string());
    }

    SPEAKER_SAME_LINE
        .captures(lines[index])
        .map(|caps| caps[1].trim().to_string())
        .filter(|name| !name.is_empty())
}

pub(super) fn scan(source: &str) -> OutlineState {
    let lines: Vec<&str> = source.lines().collect();
    let mut state = OutlineState::default();
    let mut cursor = 0;

    while cursor < lines.len() {
        let line = lines[cursor];

        if let Some(caps) = CHAPTER.captures(line) {
            state.chapter = parse_number(&caps, 1);
            cursor += 1;
            continue;
        }

        if let Some(caps) = ARC.captures(line) {
            let arc_id = caps[1].to_string();
            state.arcs.push(NarrativeArc {
                chapter: state.chapter,
                arc_id: arc_id.clone(),
                name: heading_name(&caps),
                sequences: Vec::new(),
            });
            state.arc = Some(arc_id);
            cursor += 1;
            continue;
        }

        if let Some(caps) = SEQUENCE.captures(line) {
            let mut sequence = Sequence::new(&caps[1], heading_name(&caps));
            state.sequence = Some(sequence.sequence_id.clone());
            cursor = state.scan_sequence_block(&lines, cursor + 1, &mut sequence);

            match state.arcs.last_mut() {
                Some(arc) => arc.sequences.push(sequence),
                None => tracing::warn!(
                    sequence = %sequence.sequence_id,
                    "sequence heading before any arc; dropped"
                ),
            }
            continue;
        }

        state.extract_content(&lines, cursor);
        cursor += 1;
    }

    state
}
