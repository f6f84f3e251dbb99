//! Input documents and run configuration.
//!
//! Two JSON documents feed the analyses: the reference beat list and the
//! keyword document (subject beats, network keywords, motif contexts). The
//! run itself is configured from an optional TOML file.

use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::path::{Path, PathBuf};

use crate::error::{read_json, read_to_string, AnalysisError, AnalysisResult};

/// A plot point of the reference story.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReferenceBeat {
    #[serde(rename = "type")]
    pub beat_type: String,
    /// `H:M:S` or `M:S`.
    pub timestamp: String,
    pub description: String,
}

/// A plot point located in the game script.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubjectBeat {
    #[serde(rename = "type")]
    pub beat_type: String,
    pub description: String,
    pub map_id: u32,
    pub event_id: u32,
    pub line: u32,
}

/// One named context category and the keywords that signal it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContextCategory {
    pub name: String,
    pub keywords: Vec<String>,
}

impl ContextCategory {
    pub fn new(name: impl Into<String>, keywords: &[&str]) -> Self {
        Self {
            name: name.into(),
            keywords: keywords.iter().map(|k| k.to_string()).collect(),
        }
    }
}

/// Motif context categories in declaration order.
///
/// Stored as a JSON object; the order of its keys is significant because it
/// breaks ties between equally scored categories.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MotifContexts(pub Vec<ContextCategory>);

impl MotifContexts {
    pub fn iter(&self) -> impl Iterator<Item = &ContextCategory> {
        self.0.iter()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(|c| c.name.as_str())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Default for MotifContexts {
    fn default() -> Self {
        Self(vec![
            ContextCategory::new(
                "innocence",
                &["外婆", "罐头", "家", "想你", "梦见", "回来", "小时候"],
            ),
            ContextCategory::new(
                "military",
                &["团长", "战斗", "狼人", "士兵", "命令", "战争", "敌人"],
            ),
            ContextCategory::new(
                "posthuman",
                &["血", "病毒", "基因", "吸血鬼", "感染", "培育", "死"],
            ),
        ])
    }
}

impl Serialize for MotifContexts {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for category in &self.0 {
            map.serialize_entry(&category.name, &category.keywords)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for MotifContexts {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct ContextsVisitor;

        impl<'de> Visitor<'de> for ContextsVisitor {
            type Value = MotifContexts;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("an object mapping context names to keyword lists")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
                let mut categories: Vec<ContextCategory> = Vec::new();
                while let Some((name, keywords)) = access.next_entry::<String, Vec<String>>()? {
                    // A repeated key replaces the earlier list in place.
                    match categories.iter_mut().find(|c| c.name == name) {
                        Some(existing) => existing.keywords = keywords,
                        None => categories.push(ContextCategory { name, keywords }),
                    }
                }
                Ok(MotifContexts(categories))
            }
        }

        deserializer.deserialize_map(ContextsVisitor)
    }
}

/// The keyword document: subject beats, network vocabulary, motif contexts.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct KeywordConfig {
    #[serde(default)]
    pub game_beats: Vec<SubjectBeat>,
    #[serde(default)]
    pub entities: Vec<String>,
    #[serde(default)]
    pub themes: Vec<String>,
    #[serde(default)]
    pub motif_contexts: MotifContexts,
}

impl KeywordConfig {
    pub fn from_file(path: impl AsRef<Path>) -> AnalysisResult<Self> {
        let path = path.as_ref();
        let config: Self = read_json(path)?;
        tracing::debug!(
            path = %path.display(),
            subject_beats = config.game_beats.len(),
            entities = config.entities.len(),
            themes = config.themes.len(),
            "loaded keyword config"
        );
        Ok(config)
    }
}

/// Load the reference beat array.
pub fn load_reference_beats(path: impl AsRef<Path>) -> AnalysisResult<Vec<ReferenceBeat>> {
    let path = path.as_ref();
    let beats: Vec<ReferenceBeat> = read_json(path)?;
    tracing::debug!(path = %path.display(), beats = beats.len(), "loaded reference beats");
    Ok(beats)
}

/// Input file names, resolved against the data directory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InputFiles {
    pub event_dump: PathBuf,
    pub outline: PathBuf,
    pub reference_beats: PathBuf,
    pub keywords: PathBuf,
}

impl Default for InputFiles {
    fn default() -> Self {
        Self {
            event_dump: PathBuf::from("EventTextDump.txt"),
            outline: PathBuf::from("narrative_extraction.md"),
            reference_beats: PathBuf::from("reference_beats.json"),
            keywords: PathBuf::from("context_keywords.json"),
        }
    }
}

/// Keyword network settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NetworkConfig {
    /// Minimum co-occurrence count for an edge.
    pub threshold: usize,
    /// Louvain resolution; values above 1.0 favour smaller communities.
    pub resolution: f64,
    /// Cap on local-moving passes per level, and on levels.
    pub max_iterations: usize,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            threshold: 2,
            resolution: 1.0,
            max_iterations: 100,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MotifConfig {
    /// Substring that marks a dialogue as a motif instance.
    pub motif: String,
    /// Instance text is cut to this many characters.
    pub excerpt_chars: usize,
}

impl Default for MotifConfig {
    fn default() -> Self {
        Self {
            motif: "小红帽".to_string(),
            excerpt_chars: 150,
        }
    }
}

/// Configuration for one run of every analysis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    pub data_dir: PathBuf,
    pub output_dir: PathBuf,
    pub inputs: InputFiles,
    pub network: NetworkConfig,
    pub motif: MotifConfig,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data"),
            output_dir: PathBuf::from("outputs"),
            inputs: InputFiles::default(),
            network: NetworkConfig::default(),
            motif: MotifConfig::default(),
        }
    }
}

impl RunConfig {
    /// Load a TOML run configuration. Missing fields take their defaults.
    pub fn from_file(path: impl AsRef<Path>) -> AnalysisResult<Self> {
        let path = path.as_ref();
        let text = read_to_string(path)?;
        toml::from_str(&text).map_err(|source| AnalysisError::Config {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn event_dump_path(&self) -> PathBuf {
        self.data_dir.join(&self.inputs.event_dump)
    }

    pub fn outline_path(&self) -> PathBuf {
        self.data_dir.join(&self.inputs.outline)
    }

    pub fn reference_beats_path(&self) -> PathBuf {
        self.data_dir.join(&self.inputs.reference_beats)
    }

    pub fn keywords_path(&self) -> PathBuf {
        self.data_dir.join(&self.inputs.keywords)
    }

    /// Every input path, in the order they are checked.
    pub fn input_paths(&self) -> [PathBuf; 4] {
        [
            self.event_dump_path(),
            self.outline_path(),
            self.reference_beats_path(),
            self.keywords_path(),
        ]
    }

    pub fn metrics_dir(&self) -> PathBuf {
        self.output_dir.join("metrics")
    }

    pub fn tables_dir(&self) -> PathBuf {
        self.output_dir.join("tables")
    }
}
