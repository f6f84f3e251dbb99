//! Runs every analysis over the configured inputs.
//!
//! Inputs are checked once up front; a missing file stops the run before
//! anything is written. After that each analysis parses what it needs, writes
//! its metrics document and table, and a failure is recorded without stopping
//! the analyses after it.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::path::PathBuf;
use uuid::Uuid;

use script_sources::{EventDump, NarrativeOutline};

use crate::alignment::Alignment;
use crate::census::{character_table, CensusMetrics};
use crate::config::{load_reference_beats, KeywordConfig, RunConfig};
use crate::density::DensityAnalysis;
use crate::error::{AnalysisError, AnalysisResult};
use crate::motif::MotifTracker;
use crate::network::{
    co_occurrence_table, louvain, CoOccurrence, KeywordNetwork, KeywordSet, LouvainConfig,
    NetworkMetrics,
};
use crate::report::{write_metrics, Table};

/// Unique identifier of one pipeline run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RunId(pub Uuid);

impl RunId {
    /// Create a new random run ID.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Create a run ID from a specific UUID.
    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Create a nil run ID (useful for fixed output).
    pub fn nil() -> Self {
        Self(Uuid::nil())
    }
}

impl Default for RunId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for RunId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The analyses a run performs, in run order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnalysisKind {
    /// Summary counts of both parsed sources.
    Census,
    Alignment,
    Density,
    Network,
    Motif,
}

impl AnalysisKind {
    pub const ALL: [AnalysisKind; 5] = [
        AnalysisKind::Census,
        AnalysisKind::Alignment,
        AnalysisKind::Density,
        AnalysisKind::Network,
        AnalysisKind::Motif,
    ];

    /// Name used in output file names and logs.
    pub fn name(&self) -> &'static str {
        match self {
            AnalysisKind::Census => "census",
            AnalysisKind::Alignment => "alignment",
            AnalysisKind::Density => "density",
            AnalysisKind::Network => "network",
            AnalysisKind::Motif => "motif",
        }
    }
}

impl fmt::Display for AnalysisKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// What happened to one analysis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum AnalysisOutcome {
    Completed {
        analysis: AnalysisKind,
        metrics_path: PathBuf,
        /// Empty when the table had no rows.
        table_paths: Vec<PathBuf>,
    },
    Failed {
        analysis: AnalysisKind,
        message: String,
    },
}

impl AnalysisOutcome {
    pub fn analysis(&self) -> AnalysisKind {
        match self {
            AnalysisOutcome::Completed { analysis, .. } | AnalysisOutcome::Failed { analysis, .. } => {
                *analysis
            }
        }
    }

    pub fn is_completed(&self) -> bool {
        matches!(self, AnalysisOutcome::Completed { .. })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunSummary {
    pub run_id: RunId,
    pub outcomes: Vec<AnalysisOutcome>,
}

impl RunSummary {
    pub fn completed(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_completed()).count()
    }

    pub fn failed(&self) -> impl Iterator<Item = &AnalysisOutcome> {
        self.outcomes.iter().filter(|o| !o.is_completed())
    }

    pub fn all_completed(&self) -> bool {
        self.completed() == self.outcomes.len()
    }

    pub fn outcome(&self, analysis: AnalysisKind) -> Option<&AnalysisOutcome> {
        self.outcomes.iter().find(|o| o.analysis() == analysis)
    }
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Run {}", self.run_id)?;
        for outcome in &self.outcomes {
            match outcome {
                AnalysisOutcome::Completed {
                    analysis,
                    metrics_path,
                    table_paths,
                } => writeln!(
                    f,
                    "  {:<10} ok     {} ({} table files)",
                    analysis.name(),
                    metrics_path.display(),
                    table_paths.len()
                )?,
                AnalysisOutcome::Failed { analysis, message } => {
                    writeln!(f, "  {:<10} ERROR  {}", analysis.name(), message)?
                }
            }
        }
        write!(
            f,
            "{} of {} analyses completed",
            self.completed(),
            self.outcomes.len()
        )
    }
}

/// Metrics document and table produced by one analysis.
struct AnalysisOutput {
    metrics: Value,
    table: Table,
}

impl AnalysisOutput {
    fn new<T: Serialize>(metrics: &T, table: Table) -> AnalysisResult<Self> {
        Ok(Self {
            metrics: serde_json::to_value(metrics)?,
            table,
        })
    }
}

pub struct Pipeline {
    config: RunConfig,
    run_id: RunId,
}

impl Pipeline {
    pub fn new(config: RunConfig) -> Self {
        Self::with_run_id(config, RunId::new())
    }

    pub fn with_run_id(config: RunConfig, run_id: RunId) -> Self {
        Self { config, run_id }
    }

    pub fn config(&self) -> &RunConfig {
        &self.config
    }

    pub fn run_id(&self) -> RunId {
        self.run_id
    }

    /// Fail with every input file that does not exist.
    pub fn check_inputs(&self) -> AnalysisResult<()> {
        let missing: Vec<PathBuf> = self
            .config
            .input_paths()
            .into_iter()
            .filter(|path| !path.is_file())
            .collect();
        if missing.is_empty() {
            Ok(())
        } else {
            Err(AnalysisError::MissingInputs(missing))
        }
    }

    pub fn run(&self) -> AnalysisResult<RunSummary> {
        self.check_inputs()?;
        tracing::info!(
            run_id = %self.run_id,
            data_dir = %self.config.data_dir.display(),
            output_dir = %self.config.output_dir.display(),
            "starting analysis run"
        );

        let mut outcomes = Vec::with_capacity(AnalysisKind::ALL.len());
        for analysis in AnalysisKind::ALL {
            let outcome = match self.run_analysis(analysis) {
                Ok(outcome) => {
                    tracing::info!(analysis = analysis.name(), "analysis completed");
                    outcome
                }
                Err(e) => {
                    tracing::error!(analysis = analysis.name(), error = %e, "analysis failed");
                    AnalysisOutcome::Failed {
                        analysis,
                        message: e.to_string(),
                    }
                }
            };
            outcomes.push(outcome);
        }

        let summary = RunSummary {
            run_id: self.run_id,
            outcomes,
        };
        tracing::info!(
            run_id = %self.run_id,
            completed = summary.completed(),
            total = summary.outcomes.len(),
            "analysis run finished"
        );
        Ok(summary)
    }

    fn run_analysis(&self, analysis: AnalysisKind) -> AnalysisResult<AnalysisOutcome> {
        let output = match analysis {
            AnalysisKind::Census => self.census()?,
            AnalysisKind::Alignment => self.alignment()?,
            AnalysisKind::Density => self.density()?,
            AnalysisKind::Network => self.network()?,
            AnalysisKind::Motif => self.motif()?,
        };
        self.write_output(analysis, output)
    }

    fn write_output(&self, analysis: AnalysisKind, output: AnalysisOutput) -> AnalysisResult<AnalysisOutcome> {
        let mut document = Map::new();
        document.insert("run_id".to_string(), Value::String(self.run_id.to_string()));
        match output.metrics {
            Value::Object(fields) => document.extend(fields),
            other => {
                document.insert("metrics".to_string(), other);
            }
        }

        let metrics_path = self
            .config
            .metrics_dir()
            .join(format!("{}_metrics.json", analysis.name()));
        write_metrics(&metrics_path, &document)?;

        let table_paths = if output.table.is_empty() {
            tracing::debug!(analysis = analysis.name(), "table has no rows, not written");
            Vec::new()
        } else {
            output
                .table
                .write(&self.config.tables_dir(), &format!("{}_table", analysis.name()))?
        };

        Ok(AnalysisOutcome::Completed {
            analysis,
            metrics_path,
            table_paths,
        })
    }

    fn event_dump(&self) -> AnalysisResult<EventDump> {
        Ok(EventDump::parse_file(self.config.event_dump_path())?)
    }

    fn keywords(&self) -> AnalysisResult<KeywordConfig> {
        KeywordConfig::from_file(self.config.keywords_path())
    }

    fn census(&self) -> AnalysisResult<AnalysisOutput> {
        let dump = self.event_dump()?;
        let outline = NarrativeOutline::parse_file(self.config.outline_path())?;
        AnalysisOutput::new(&CensusMetrics::compute(&dump, &outline), character_table(&outline))
    }

    fn alignment(&self) -> AnalysisResult<AnalysisOutput> {
        let reference = load_reference_beats(self.config.reference_beats_path())?;
        let keywords = self.keywords()?;
        let alignment = Alignment::compute(&reference, &keywords.game_beats);
        tracing::info!(
            matched = alignment.matched(),
            score = alignment.score(),
            "beat alignment computed"
        );
        AnalysisOutput::new(&alignment.metrics(), alignment.table())
    }

    fn density(&self) -> AnalysisResult<AnalysisOutput> {
        let analysis = DensityAnalysis::new(self.event_dump()?.map_densities());
        AnalysisOutput::new(&analysis.statistics(), analysis.table())
    }

    fn network(&self) -> AnalysisResult<AnalysisOutput> {
        let dialogues = self.event_dump()?.dialogues();
        let keywords = self.keywords()?;
        let vocabulary = KeywordSet::new(&keywords.entities, &keywords.themes);
        if vocabulary.is_empty() {
            tracing::warn!("no entity or theme keywords configured");
        }

        let counts = CoOccurrence::count(&vocabulary, dialogues.iter().map(|d| d.text.as_str()));
        let network = KeywordNetwork::build(&vocabulary, &counts, self.config.network.threshold);
        let partition = louvain(&network, &LouvainConfig::from(&self.config.network));
        let metrics = NetworkMetrics::compute(&network, &counts, &partition);
        tracing::info!(
            nodes = metrics.num_nodes,
            edges = metrics.num_edges,
            communities = metrics.num_communities,
            "keyword network analysed"
        );
        AnalysisOutput::new(&metrics, co_occurrence_table(&vocabulary, &counts))
    }

    fn motif(&self) -> AnalysisResult<AnalysisOutput> {
        let dialogues = self.event_dump()?.dialogues();
        let keywords = self.keywords()?;
        let tracker = MotifTracker::new(self.config.motif.clone(), keywords.motif_contexts);
        let evolution = tracker.analyze(&dialogues);
        tracing::info!(
            motif = %evolution.motif,
            instances = evolution.instances.len(),
            arcs = evolution.arcs.len(),
            "motif evolution tracked"
        );
        AnalysisOutput::new(&evolution.metrics(), evolution.table())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_run_id_display_and_nil() {
        let id = RunId::from_uuid(Uuid::nil());
        assert_eq!(id, RunId::nil());
        assert_eq!(id.to_string(), "00000000-0000-0000-0000-000000000000");
        assert_ne!(RunId::new(), RunId::new());
    }

    #[test]
    fn test_analysis_names() {
        let names: Vec<&str> = AnalysisKind::ALL.iter().map(|a| a.name()).collect();
        assert_eq!(names, vec!["census", "alignment", "density", "network", "motif"]);
        assert_eq!(AnalysisKind::Motif.to_string(), "motif");
    }

    #[test]
    fn test_summary_display() {
        let summary = RunSummary {
            run_id: RunId::nil(),
            outcomes: vec![
                AnalysisOutcome::Completed {
                    analysis: AnalysisKind::Density,
                    metrics_path: PathBuf::from("out/metrics/density_metrics.json"),
                    table_paths: vec![PathBuf::from("a.md"), PathBuf::from("a.csv")],
                },
                AnalysisOutcome::Failed {
                    analysis: AnalysisKind::Motif,
                    message: "boom".to_string(),
                },
            ],
        };

        let text = summary.to_string();
        assert!(text.starts_with("Run 00000000-0000-0000-0000-000000000000\n"));
        assert!(text.contains("density    ok     out/metrics/density_metrics.json (2 table files)"));
        assert!(text.contains("motif      ERROR  boom"));
        assert!(text.ends_with("1 of 2 analyses completed"));
        assert!(!summary.all_completed());
        assert_eq!(summary.failed().count(), 1);
        assert!(summary.outcome(AnalysisKind::Density).unwrap().is_completed());
        assert!(summary.outcome(AnalysisKind::Census).is_none());
    }

    #[test]
    fn test_missing_inputs_are_all_reported() {
        let dir = tempfile::tempdir().unwrap();
        let config = RunConfig {
            data_dir: dir.path().to_path_buf(),
            ..RunConfig::default()
        };
        std::fs::write(config.outline_path(), "# Outline\n").unwrap();

        let err = Pipeline::new(config.clone()).check_inputs().unwrap_err();
        match err {
            AnalysisError::MissingInputs(paths) => {
                assert_eq!(paths.len(), 3);
                assert!(!paths.contains(&config.outline_path()));
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
