//! Line-scan state machine for the event dump.
//!
//! Each line is offered to [`LINE_RULES`] in order and handled by the first
//! rule whose predicate accepts it. The order is significant: header rules
//! come before command rules so a header is never mistaken for content.

use super::{Command, EventId, GameMap, MapEvent, MapId};
use crate::error::{ParseError, ParseResult};

const MAP_ID: &str = "Map ID:";
const MAP_NAME: &str = "Map Name:";
const EVENT_ID: &str = "Event ID:";
const EVENT_NAME: &str = "Event Name:";
const COMMAND: &str = "@>";
/// Continuation marker; also the exact width stripped from continuation lines.
const CONTINUATION: &str = ":    :";

/// Positional state threaded through one scan.
#[derive(Debug, Default)]
struct ScanState {
    maps: Vec<GameMap>,
    /// Index into `maps`.
    current_map: Option<usize>,
    /// Index into the current map's events.
    current_event: Option<usize>,
    /// Index into the current event's commands of the most recent command,
    /// kept only while that command is a Text command.
    last_text: Option<usize>,
}

impl ScanState {
    fn map_mut(&mut self) -> Option<&mut GameMap> {
        self.current_map.and_then(|i| self.maps.get_mut(i))
    }

    fn event_mut(&mut self) -> Option<&mut MapEvent> {
        let event = self.current_event?;
        self.map_mut().and_then(|m| m.events.get_mut(event))
    }

    fn has_event(&self) -> bool {
        self.current_map.is_some() && self.current_event.is_some()
    }
}

/// One (predicate, handler) pair of the dispatch table.
struct LineRule {
    name: &'static str,
    matches: fn(&ScanState, &str) -> bool,
    apply: fn(&mut ScanState, &str, usize) -> ParseResult<()>,
}

const LINE_RULES: &[LineRule] = &[
    LineRule {
        name: "map header",
        matches: |_, line| line.starts_with(MAP_ID),
        apply: start_map,
    },
    LineRule {
        name: "map name",
        matches: |state, line| line.starts_with(MAP_NAME) && state.current_map.is_some(),
        apply: name_map,
    },
    LineRule {
        name: "event header",
        matches: |state, line| line.starts_with(EVENT_ID) && state.current_map.is_some(),
        apply: start_event,
    },
    LineRule {
        name: "event name",
        matches: |state, line| line.starts_with(EVENT_NAME) && state.has_event(),
        apply: name_event,
    },
    LineRule {
        name: "command",
        matches: |state, line| line.trim().starts_with(COMMAND) && state.has_event(),
        apply: push_command,
    },
    LineRule {
        name: "continuation",
        matches: |state, line| {
            line.trim().starts_with(CONTINUATION) && state.has_event() && state.last_text.is_some()
        },
        apply: continue_text,
    },
];

/// Scan dump text into maps.
pub(super) fn scan(source: &str) -> ParseResult<Vec<GameMap>> {
    let mut state = ScanState::default();

    for (index, line) in source.lines().enumerate() {
        let line_no = index + 1;
        if let Some(rule) = LINE_RULES.iter().find(|rule| (rule.matches)(&state, line)) {
            tracing::trace!(line = line_no, rule = rule.name, "matched");
            (rule.apply)(&mut state, line, line_no)?;
        }
    }

    Ok(state.maps)
}

/// Numeric id of a header: the text after the first colon, up to the next.
fn parse_header_id(line: &str, prefix: &str, header: &'static str, line_no: usize) -> ParseResult<u32> {
    let value = line[prefix.len()..].split(':').next().unwrap_or("").trim();
    value.parse().map_err(|_| ParseError::InvalidId {
        line: line_no,
        header,
        value: value.to_string(),
    })
}

/// Everything after the first colon, trimmed.
fn header_value(line: &str) -> String {
    line.split_once(':')
        .map(|(_, rest)| rest.trim().to_string())
        .unwrap_or_default()
}

fn start_map(state: &mut ScanState, line: &str, line_no: usize) -> ParseResult<()> {
    let id = parse_header_id(line, MAP_ID, "map", line_no)?;
    state.maps.push(GameMap::new(MapId(id)));
    state.current_map = Some(state.maps.len() - 1);
    state.current_event = None;
    state.last_text = None;
    Ok(())
}

fn name_map(state: &mut ScanState, line: &str, _line_no: usize) -> ParseResult<()> {
    if let Some(map) = state.map_mut() {
        map.name = header_value(line);
    }
    Ok(())
}

fn start_event(state: &mut ScanState, line: &str, line_no: usize) -> ParseResult<()> {
    let id = parse_header_id(line, EVENT_ID, "event", line_no)?;
    if let Some(map) = state.map_mut() {
        map.events.push(MapEvent::new(EventId(id)));
        let index = map.events.len() - 1;
        state.current_event = Some(index);
        state.last_text = None;
    }
    Ok(())
}

fn name_event(state: &mut ScanState, line: &str, _line_no: usize) -> ParseResult<()> {
    if let Some(event) = state.event_mut() {
        event.name = header_value(line);
    }
    Ok(())
}

/// Split a trimmed `@>Label: content` line into label and content.
fn split_command(trimmed: &str) -> (String, String) {
    let body = &trimmed[COMMAND.len()..];
    let (label, content) = match body.split_once(':') {
        Some((label, content)) if !label.trim().is_empty() => (label.trim(), content.trim()),
        Some(_) => ("", ""),
        None => (body.trim(), ""),
    };
    let label = if label.is_empty() { "Unknown" } else { label };
    (label.to_string(), content.to_string())
}

fn push_command(state: &mut ScanState, line: &str, line_no: usize) -> ParseResult<()> {
    let trimmed = line.trim();
    let (label, content) = split_command(trimmed);
    let command = Command::new(label, line_no, content, trimmed);
    let is_text = command.is_text();

    if let Some(event) = state.event_mut() {
        event.commands.push(command);
        let index = event.commands.len() - 1;
        state.last_text = is_text.then_some(index);
    }
    Ok(())
}

fn continue_text(state: &mut ScanState, line: &str, _line_no: usize) -> ParseResult<()> {
    let text = line.trim()[CONTINUATION.len()..].trim().to_string();
    let Some(index) = state.last_text else {
        return Ok(());
    };
    if let Some(command) = state.event_mut().and_then(|e| e.commands.get_mut(index)) {
        command.content.push('\n');
        command.content.push_str(&text);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event_dump::CommandCategory;

    #[test]
    fn test_split_command() {
        assert_eq!(
            split_command("@>Text: 'Actor1', 0, Normal, Bottom"),
            ("Text".to_string(), "'Actor1', 0, Normal, Bottom".to_string())
        );
        assert_eq!(
            split_command("@>Transfer Player: [003:Forest], (012,004)"),
            (
                "Transfer Player".to_string(),
                "[003:Forest], (012,004)".to_string()
            )
        );
        assert_eq!(
            split_command("@>Erase Event"),
            ("Erase Event".to_string(), String::new())
        );
        assert_eq!(split_command("@>"), ("Unknown".to_string(), String::new()));
        assert_eq!(split_command("@>: stray"), ("Unknown".to_string(), String::new()));
    }

    #[test]
    fn test_invalid_map_id_is_error() {
        let err = scan("Map ID: 00x\n").unwrap_err();
        match err {
            ParseError::InvalidId { line, header, value } => {
                assert_eq!(line, 1);
                assert_eq!(header, "map");
                assert_eq!(value, "00x");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_invalid_event_id_is_error() {
        let err = scan("Map ID: 001\nEvent ID:\n").unwrap_err();
        assert!(matches!(err, ParseError::InvalidId { line: 2, header: "event", .. }));
    }

    #[test]
    fn test_headers_need_parents() {
        // Without a map, names and events are ignored rather than attached.
        let maps = scan("Map Name: Nowhere\nEvent ID: 001\n  @>Text: lost\n").unwrap();
        assert!(maps.is_empty());
    }

    #[test]
    fn test_commands_before_any_event_are_ignored() {
        let maps = scan("Map ID: 003\n  @>Text: orphan\nEvent ID: 001\n  @>Text: kept\n").unwrap();
        assert_eq!(maps[0].events.len(), 1);
        assert_eq!(maps[0].events[0].commands.len(), 1);
        assert_eq!(maps[0].events[0].commands[0].content, "kept");
    }

    #[test]
    fn test_map_header_resets_event() {
        let source = "Map ID: 001\nEvent ID: 001\nMap ID: 002\n  @>Text: dropped\nEvent Name: dropped\n";
        let maps = scan(source).unwrap();
        assert_eq!(maps.len(), 2);
        assert!(maps[1].events.is_empty());
        assert_eq!(maps[0].events[0].name, "");
    }

    #[test]
    fn test_continuation_dropped_after_non_text_command() {
        let source = "\
Map ID: 001
Event ID: 001
  @>Text: first
  @>Play SE: 'Bell', 80, 100
  :    : orphaned continuation
  @>Text: second
  :    : attached
";
        let maps = scan(source).unwrap();
        let commands = &maps[0].events[0].commands;
        assert_eq!(commands.len(), 3);
        assert_eq!(commands[0].content, "first");
        assert_eq!(commands[1].category, CommandCategory::Audio);
        assert_eq!(commands[2].content, "second\nattached");
    }

    #[test]
    fn test_continuation_does_not_cross_events() {
        let source = "\
Map ID: 001
Event ID: 001
  @>Text: first
Event ID: 002
  :    : belongs nowhere
";
        let maps = scan(source).unwrap();
        assert_eq!(maps[0].events[0].commands[0].content, "first");
        assert!(maps[0].events[1].commands.is_empty());
    }

    #[test]
    fn test_line_numbers_are_one_based() {
        let maps = scan("Map ID: 001\r\nEvent ID: 002\r\n  @>Wait: 30 frame(s)\r\n").unwrap();
        let command = &maps[0].events[0].commands[0];
        assert_eq!(command.line, 3);
        assert_eq!(command.category, CommandCategory::Wait);
        assert_eq!(command.raw, "@>Wait: 30 frame(s)");
    }

    #[test]
    fn test_map_name_keeps_inner_colons() {
        let maps = scan("Map ID: 010\nMap Name: Ruins: Lower Floor\n").unwrap();
        assert_eq!(maps[0].id, MapId(10));
        assert_eq!(maps[0].name, "Ruins: Lower Floor");
    }
}
