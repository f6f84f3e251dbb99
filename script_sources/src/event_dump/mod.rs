//! Event dump records: maps, the events scripted on them, and their commands.
//!
//! The dump is a flat text listing produced by an RPG Maker event exporter:
//!
//! ```text
//! Map ID: 001
//! Map Name: Camp
//! Event ID: 004
//! Event Name: Commander
//!   @>Text: 'Actor1', 0, Normal, Bottom
//!   :    : Report to the commander.
//!   @>Battle Processing: Wolf x2
//! ```
//!
//! [`EventDump::parse_str`] scans it into a [`GameMap`] → [`MapEvent`] →
//! [`Command`] tree; the derived views (density, dialogue, summary) are
//! computed from that tree on demand.

mod category;
mod density;
mod scanner;

pub use category::*;
pub use density::*;

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::{read_source, ParseResult};

/// Numeric identifier of a map, as written in its `Map ID:` header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct MapId(pub u32);

impl From<u32> for MapId {
    fn from(id: u32) -> Self {
        Self(id)
    }
}

impl std::fmt::Display for MapId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Numeric identifier of an event within its map.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EventId(pub u32);

impl From<u32> for EventId {
    fn from(id: u32) -> Self {
        Self(id)
    }
}

impl std::fmt::Display for EventId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One scripted instruction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Command {
    /// Label as written after `@>`, e.g. `Battle Processing`.
    pub label: String,
    pub category: CommandCategory,
    /// 1-based line of the `@>` line in the dump.
    pub line: usize,
    /// Text after the first colon; continuation lines are appended with `\n`.
    pub content: String,
    /// The trimmed source line.
    pub raw: String,
}

impl Command {
    /// Create a command, deriving its category from the label.
    pub fn new(
        label: impl Into<String>,
        line: usize,
        content: impl Into<String>,
        raw: impl Into<String>,
    ) -> Self {
        let label = label.into();
        Self {
            category: CommandCategory::from_label(&label),
            label,
            line,
            content: content.into(),
            raw: raw.into(),
        }
    }

    pub fn is_text(&self) -> bool {
        self.category == CommandCategory::Text
    }
}

/// A scripted interaction attached to a map.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MapEvent {
    pub id: EventId,
    pub name: String,
    pub commands: Vec<Command>,
}

impl MapEvent {
    pub fn new(id: EventId) -> Self {
        Self {
            id,
            name: String::new(),
            commands: Vec::new(),
        }
    }
}

/// One game location with its events.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameMap {
    pub id: MapId,
    pub name: String,
    pub events: Vec<MapEvent>,
}

impl GameMap {
    pub fn new(id: MapId) -> Self {
        Self {
            id,
            name: String::new(),
            events: Vec::new(),
        }
    }

    /// Every command on this map, event by event.
    pub fn commands(&self) -> impl Iterator<Item = &Command> {
        self.events.iter().flat_map(|e| e.commands.iter())
    }

    /// Whether any event on this map shows text.
    pub fn has_dialogue(&self) -> bool {
        self.commands().any(Command::is_text)
    }
}

/// A Text command reprojected with the map and event that own it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dialogue {
    pub map_id: MapId,
    pub map_name: String,
    pub event_id: EventId,
    pub event_name: String,
    pub line: usize,
    pub text: String,
    pub raw: String,
}

/// Aggregate counts over a parsed dump.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DumpSummary {
    pub total_maps: usize,
    pub total_events: usize,
    pub total_commands: usize,
    pub total_dialogue_commands: usize,
    pub maps_with_dialogue: usize,
}

/// A fully parsed event dump.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct EventDump {
    /// Maps in the order their headers appear.
    pub maps: Vec<GameMap>,
}

impl EventDump {
    /// Parse dump text.
    pub fn parse_str(source: &str) -> ParseResult<Self> {
        let maps = scanner::scan(source)?;
        tracing::debug!(maps = maps.len(), "parsed event dump");
        Ok(Self { maps })
    }

    /// Read and parse a dump file.
    pub fn parse_file(path: impl AsRef<Path>) -> ParseResult<Self> {
        let path = path.as_ref();
        let source = read_source(path)?;
        let dump = Self::parse_str(&source)?;
        tracing::info!(
            path = %path.display(),
            maps = dump.maps.len(),
            "loaded event dump"
        );
        Ok(dump)
    }

    /// Get a map by id.
    pub fn get_map(&self, id: MapId) -> Option<&GameMap> {
        self.maps.iter().find(|m| m.id == id)
    }

    /// Per-map bucket counts, density and classification, in map order.
    pub fn map_densities(&self) -> Vec<MapDensity> {
        self.maps.iter().map(MapDensity::from_map).collect()
    }

    /// Every Text command with its map/event context, in file order.
    pub fn dialogues(&self) -> Vec<Dialogue> {
        let mut dialogues = Vec::new();
        for map in &self.maps {
            for event in &map.events {
                for command in event.commands.iter().filter(|c| c.is_text()) {
                    dialogues.push(Dialogue {
                        map_id: map.id,
                        map_name: map.name.clone(),
                        event_id: event.id,
                        event_name: event.name.clone(),
                        line: command.line,
                        text: command.content.clone(),
                        raw: command.raw.clone(),
                    });
                }
            }
        }
        dialogues
    }

    pub fn summary(&self) -> DumpSummary {
        DumpSummary {
            total_maps: self.maps.len(),
            total_events: self.maps.iter().map(|m| m.events.len()).sum(),
            total_commands: self.maps.iter().map(|m| m.commands().count()).sum(),
            total_dialogue_commands: self
                .maps
                .iter()
                .map(|m| m.commands().filter(|c| c.is_text()).count())
                .sum(),
            maps_with_dialogue: self.maps.iter().filter(|m| m.has_dialogue()).count(),
        }
    }
}
