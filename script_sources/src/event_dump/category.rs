//! Command categories and the keyword table that maps raw labels onto them.

use serde::{Deserialize, Serialize};

/// Normalized category of a scripted command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum CommandCategory {
    /// Message box text, i.e. dialogue.
    Text,
    Battle,
    /// Branches, switches, variables, loops and scripts.
    Logic,
    Navigation,
    Party,
    Audio,
    Visual,
    /// Choices, number input and window settings.
    Message,
    /// Calls into a common event.
    Common,
    Wait,
    /// Anything the keyword table does not recognise.
    Other,
}

/// Category table in declaration order. The first row with a keyword contained
/// in the raw label wins, so `Wait for Move` lands in Navigation before the
/// bare `Wait` row is reached.
const CATEGORY_TABLE: &[(CommandCategory, &[&str])] = &[
    (CommandCategory::Text, &["Text"]),
    (CommandCategory::Battle, &["Battle Processing"]),
    (
        CommandCategory::Logic,
        &[
            "Conditional Branch",
            "Control Switches",
            "Control Variables",
            "Loop",
            "Break Loop",
            "Exit Event Processing",
            "Script",
        ],
    ),
    (
        CommandCategory::Navigation,
        &["Transfer Player", "Set Move Route", "Wait for Move"],
    ),
    (
        CommandCategory::Party,
        &["Change Party Member", "Change Items", "Change Gold"],
    ),
    (
        CommandCategory::Audio,
        &["Play BGM", "Play SE", "Stop BGM", "Change BGS"],
    ),
    (
        CommandCategory::Visual,
        &[
            "Change Transparent",
            "Show Animation",
            "Show Picture",
            "Erase Picture",
            "Screen Tone",
            "Flash Screen",
            "Shake Screen",
        ],
    ),
    (
        CommandCategory::Message,
        &["Show Choices", "Input Number", "Message Window"],
    ),
    (CommandCategory::Common, &["Call Common Event"]),
    (CommandCategory::Wait, &["Wait"]),
];

impl CommandCategory {
    /// All categories in table order, `Other` last.
    pub const ALL: [CommandCategory; 11] = [
        CommandCategory::Text,
        CommandCategory::Battle,
        CommandCategory::Logic,
        CommandCategory::Navigation,
        CommandCategory::Party,
        CommandCategory::Audio,
        CommandCategory::Visual,
        CommandCategory::Message,
        CommandCategory::Common,
        CommandCategory::Wait,
        CommandCategory::Other,
    ];

    /// Classify a raw command label.
    pub fn from_label(label: &str) -> Self {
        CATEGORY_TABLE
            .iter()
            .find(|(_, keywords)| keywords.iter().any(|k| label.contains(k)))
            .map(|(category, _)| *category)
            .unwrap_or(CommandCategory::Other)
    }

    /// Keywords that select this category (empty for `Other`).
    pub fn keywords(&self) -> &'static [&'static str] {
        CATEGORY_TABLE
            .iter()
            .find(|(category, _)| category == self)
            .map(|(_, keywords)| *keywords)
            .unwrap_or(&[])
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            CommandCategory::Text => "Text",
            CommandCategory::Battle => "Battle",
            CommandCategory::Logic => "Logic",
            CommandCategory::Navigation => "Navigation",
            CommandCategory::Party => "Party",
            CommandCategory::Audio => "Audio",
            CommandCategory::Visual => "Visual",
            CommandCategory::Message => "Message",
            CommandCategory::Common => "Common",
            CommandCategory::Wait => "Wait",
            CommandCategory::Other => "Other",
        }
    }
}

impl std::fmt::Display for CommandCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exact_labels() {
        assert_eq!(CommandCategory::from_label("Text"), CommandCategory::Text);
        assert_eq!(
            CommandCategory::from_label("Battle Processing"),
            CommandCategory::Battle
        );
        assert_eq!(
            CommandCategory::from_label("Call Common Event"),
            CommandCategory::Common
        );
        assert_eq!(CommandCategory::from_label("Play SE"), CommandCategory::Audio);
    }

    #[test]
    fn test_first_match_wins() {
        // "Wait for Move" also contains "Wait"; Navigation is declared first.
        assert_eq!(
            CommandCategory::from_label("Wait for Move's Completion"),
            CommandCategory::Navigation
        );
        assert_eq!(CommandCategory::from_label("Wait"), CommandCategory::Wait);
        // "Break Loop" is caught by the "Loop" keyword either way.
        assert_eq!(CommandCategory::from_label("Break Loop"), CommandCategory::Logic);
    }

    #[test]
    fn test_substring_containment() {
        assert_eq!(
            CommandCategory::from_label("Change Text Options"),
            CommandCategory::Text
        );
        assert_eq!(
            CommandCategory::from_label("Control Variables [0012]"),
            CommandCategory::Logic
        );
    }

    #[test]
    fn test_unknown_label_is_other() {
        assert_eq!(
            CommandCategory::from_label("Change Actor Graphic"),
            CommandCategory::Other
        );
        assert_eq!(CommandCategory::from_label(""), CommandCategory::Other);
        assert!(CommandCategory::Other.keywords().is_empty());
    }

    #[test]
    fn test_display() {
        assert_eq!(CommandCategory::Visual.to_string(), "Visual");
        assert_eq!(CommandCategory::ALL.len(), 11);
    }
}
