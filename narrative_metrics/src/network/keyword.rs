//! Keyword definitions - the nodes of the keyword network.

use serde::{Deserialize, Serialize};

/// What a configured keyword names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KeywordKind {
    /// A character, creature or faction.
    Entity,
    /// A recurring concept.
    Theme,
}

impl KeywordKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            KeywordKind::Entity => "entity",
            KeywordKind::Theme => "theme",
        }
    }
}

impl std::fmt::Display for KeywordKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Keyword {
    pub text: String,
    pub kind: KeywordKind,
}

/// The configured vocabulary, entities first, then themes.
///
/// Each text appears once. A text listed both as entity and theme keeps its
/// entity position but takes the theme kind.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeywordSet {
    keywords: Vec<Keyword>,
}

impl KeywordSet {
    pub fn new(entities: &[String], themes: &[String]) -> Self {
        let mut set = Self::default();
        for text in entities {
            set.insert(text, KeywordKind::Entity);
        }
        for text in themes {
            set.insert(text, KeywordKind::Theme);
        }
        set
    }

    fn insert(&mut self, text: &str, kind: KeywordKind) {
        if text.is_empty() {
            return;
        }
        match self.keywords.iter_mut().find(|k| k.text == text) {
            Some(existing) => existing.kind = kind,
            None => self.keywords.push(Keyword {
                text: text.to_string(),
                kind,
            }),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &Keyword> {
        self.keywords.iter()
    }

    pub fn len(&self) -> usize {
        self.keywords.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keywords.is_empty()
    }

    pub fn kind_of(&self, text: &str) -> Option<KeywordKind> {
        self.keywords.iter().find(|k| k.text == text).map(|k| k.kind)
    }

    /// Position of a keyword in declaration order.
    pub fn position(&self, text: &str) -> Option<usize> {
        self.keywords.iter().position(|k| k.text == text)
    }

    /// Keywords contained in `text`, in declaration order.
    pub fn present_in<'a>(&'a self, text: &str) -> Vec<&'a str> {
        self.keywords
            .iter()
            .filter(|k| text.contains(k.text.as_str()))
            .map(|k| k.text.as_str())
            .collect()
    }
}
