//! Diachronic motif tracking.
//!
//! Every dialogue line that mentions the motif is an instance. Each instance
//! is scored against the configured context categories, assigned a dominant
//! context and placed in a narrative arc by its map id. The per-arc share of
//! each dominant context shows how the motif's meaning drifts.

mod scores;

pub use scores::*;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

use script_sources::{Dialogue, EventId, MapId};

use crate::config::{MotifConfig, MotifContexts};
use crate::report::{percent, round_to, title_case, Table};

/// Narrative arc a map belongs to.
pub fn arc_for_map(map_id: MapId) -> &'static str {
    match map_id.0 {
        0..=10 => "1.1 (Camp)",
        11..=30 => "1.2 (Journey)",
        31..=45 => "1.3 (Grandmother)",
        46..=100 => "2.x (Cinderella)",
        _ => "3.x (Snow White)",
    }
}

/// One mention of the motif.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MotifInstance {
    pub map_id: MapId,
    pub map_name: String,
    pub event_id: EventId,
    pub line: usize,
    /// Dialogue text cut to the configured excerpt length.
    pub text: String,
    pub arc: String,
    pub scores: ContextScores,
    pub dominant_context: String,
    pub total_context_score: usize,
}

/// Finds and scores motif instances.
#[derive(Debug, Clone)]
pub struct MotifTracker {
    config: MotifConfig,
    contexts: MotifContexts,
}

impl MotifTracker {
    pub fn new(config: MotifConfig, contexts: MotifContexts) -> Self {
        Self { config, contexts }
    }

    pub fn motif(&self) -> &str {
        &self.config.motif
    }

    pub fn contexts(&self) -> &MotifContexts {
        &self.contexts
    }

    pub fn extract_instances(&self, dialogues: &[Dialogue]) -> Vec<MotifInstance> {
        if self.config.motif.is_empty() {
            tracing::warn!("motif is empty, no instances extracted");
            return Vec::new();
        }

        let instances: Vec<MotifInstance> = dialogues
            .iter()
            .filter(|d| d.text.contains(self.config.motif.as_str()))
            .map(|d| {
                let scores = ContextScores::score(&self.contexts, &d.text);
                MotifInstance {
                    map_id: d.map_id,
                    map_name: d.map_name.clone(),
                    event_id: d.event_id,
                    line: d.line,
                    text: d.text.chars().take(self.config.excerpt_chars).collect(),
                    arc: arc_for_map(d.map_id).to_string(),
                    dominant_context: scores.dominant_context().to_string(),
                    total_context_score: scores.total(),
                    scores,
                }
            })
            .collect();

        tracing::debug!(
            motif = %self.config.motif,
            instances = instances.len(),
            "extracted motif instances"
        );
        instances
    }

    /// Extract instances and group them by arc.
    pub fn analyze(&self, dialogues: &[Dialogue]) -> MotifEvolution {
        MotifEvolution::new(self.motif(), &self.contexts, self.extract_instances(dialogues))
    }
}

/// Share of one context among an arc's instances.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContextShare {
    pub context: String,
    pub percent: f64,
}

/// Dominant-context distribution within one arc.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArcEvolution {
    pub arc: String,
    /// One share per configured category, in declaration order.
    pub shares: Vec<ContextShare>,
    pub neutral_percent: f64,
    pub total_instances: usize,
    /// Title-cased name of the most frequent dominant context.
    pub dominant_context: String,
}

impl ArcEvolution {
    fn share(&self, context: &str) -> f64 {
        self.shares
            .iter()
            .find(|s| s.context == context)
            .map_or(0.0, |s| s.percent)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MotifMetrics {
    pub motif: String,
    pub total_instances: usize,
    pub unique_arcs: usize,
    /// `<context>_total_pct` for every context that dominated an instance.
    #[serde(flatten)]
    pub context_totals: Map<String, Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub initial_dominant: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub final_dominant: Option<String>,
    /// `<category>_shift`, last arc minus first arc, when there are two arcs
    /// or more.
    #[serde(flatten)]
    pub shifts: Map<String, Value>,
    pub arc_evolution: Vec<ArcEvolution>,
}

/// Motif instances grouped into arcs.
#[derive(Debug, Clone, PartialEq)]
pub struct MotifEvolution {
    pub motif: String,
    pub categories: Vec<String>,
    pub instances: Vec<MotifInstance>,
    /// Sorted by arc label.
    pub arcs: Vec<ArcEvolution>,
}

impl MotifEvolution {
    pub fn new(motif: &str, contexts: &MotifContexts, instances: Vec<MotifInstance>) -> Self {
        let categories: Vec<String> = contexts.names().map(str::to_string).collect();

        let mut by_arc: BTreeMap<&str, BTreeMap<&str, usize>> = BTreeMap::new();
        for instance in &instances {
            *by_arc
                .entry(instance.arc.as_str())
                .or_default()
                .entry(instance.dominant_context.as_str())
                .or_default() += 1;
        }

        let arcs = by_arc
            .into_iter()
            .map(|(arc, counts)| {
                let total: usize = counts.values().sum();
                let count = |context: &str| counts.get(context).copied().unwrap_or(0);

                // Neutral comes last so a configured category wins a tie.
                let mut dominant = NEUTRAL;
                let mut best = 0;
                for context in categories.iter().map(String::as_str).chain([NEUTRAL]) {
                    if count(context) > best {
                        best = count(context);
                        dominant = context;
                    }
                }

                ArcEvolution {
                    arc: arc.to_string(),
                    shares: categories
                        .iter()
                        .map(|c| ContextShare {
                            context: c.clone(),
                            percent: round_to(percent(count(c), total), 1),
                        })
                        .collect(),
                    neutral_percent: round_to(percent(count(NEUTRAL), total), 1),
                    total_instances: total,
                    dominant_context: title_case(dominant),
                }
            })
            .collect();

        Self {
            motif: motif.to_string(),
            categories,
            instances,
            arcs,
        }
    }

    pub fn metrics(&self) -> MotifMetrics {
        let total = self.instances.len();
        let dominated = |context: &str| {
            self.instances
                .iter()
                .filter(|i| i.dominant_context == context)
                .count()
        };

        let mut context_totals = Map::new();
        for context in self.categories.iter().map(String::as_str).chain([NEUTRAL]) {
            let count = dominated(context);
            if count > 0 {
                context_totals.insert(
                    format!("{context}_total_pct"),
                    Value::from(round_to(percent(count, total), 2)),
                );
            }
        }

        let mut metrics = MotifMetrics {
            motif: self.motif.clone(),
            total_instances: total,
            unique_arcs: self.arcs.len(),
            context_totals,
            initial_dominant: None,
            final_dominant: None,
            shifts: Map::new(),
            arc_evolution: self.arcs.clone(),
        };

        if let [first, .., last] = self.arcs.as_slice() {
            metrics.initial_dominant = Some(first.dominant_context.clone());
            metrics.final_dominant = Some(last.dominant_context.clone());
            for category in &self.categories {
                let shift = last.share(category) - first.share(category);
                metrics
                    .shifts
                    .insert(format!("{category}_shift"), Value::from(round_to(shift, 2)));
            }
        }
        metrics
    }

    pub fn table(&self) -> Table {
        let headers = std::iter::once("Arc".to_string())
            .chain(self.categories.iter().map(|c| format!("{} %", title_case(c))))
            .chain(
                ["Neutral %", "Total Instances", "Dominant Context"]
                    .into_iter()
                    .map(String::from),
            );
        let mut table =
            Table::new(headers).with_title(format!("Motif Context Evolution: {}", self.motif));

        for arc in &self.arcs {
            let row = std::iter::once(arc.arc.clone())
                .chain(arc.shares.iter().map(|s| format!("{:.1}", s.percent)))
                .chain([
                    format!("{:.1}", arc.neutral_percent),
                    arc.total_instances.to_string(),
                    arc.dominant_context.clone(),
                ]);
            table.push_row(row);
        }
        table
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ContextCategory;

    fn contexts() -> MotifContexts {
        MotifContexts(vec![
            ContextCategory::new("innocence", &["home"]),
            ContextCategory::new("military", &["war"]),
        ])
    }

    fn dialogue(map: u32, line: usize, text: &str) -> Dialogue {
        Dialogue {
            map_id: MapId(map),
            map_name: format!("MAP{map:03}"),
            event_id: EventId(1),
            event_name: "EV001".to_string(),
            line,
            text: text.to_string(),
            raw: format!("@>Text: {text}"),
        }
    }

    fn tracker() -> MotifTracker {
        let config = MotifConfig {
            motif: "hood".to_string(),
            excerpt_chars: 150,
        };
        MotifTracker::new(config, contexts())
    }

    #[test]
    fn test_arc_breakpoints() {
        assert_eq!(arc_for_map(MapId(1)), "1.1 (Camp)");
        assert_eq!(arc_for_map(MapId(10)), "1.1 (Camp)");
        assert_eq!(arc_for_map(MapId(11)), "1.2 (Journey)");
        assert_eq!(arc_for_map(MapId(45)), "1.3 (Grandmother)");
        assert_eq!(arc_for_map(MapId(100)), "2.x (Cinderella)");
        assert_eq!(arc_for_map(MapId(101)), "3.x (Snow White)");
    }

    #[test]
    fn test_extracts_only_motif_lines() {
        let dialogues = vec![
            dialogue(3, 1, "little hood, I miss home"),
            dialogue(3, 2, "I miss home"),
        ];
        let instances = tracker().extract_instances(&dialogues);

        assert_eq!(instances.len(), 1);
        let instance = &instances[0];
        assert_eq!(instance.scores.get("innocence"), 1);
        assert_eq!(instance.scores.get("military"), 0);
        assert_eq!(instance.dominant_context, "innocence");
        assert_eq!(instance.total_context_score, 1);
        assert_eq!(instance.arc, "1.1 (Camp)");
    }

    #[test]
    fn test_excerpt_counts_characters() {
        let config = MotifConfig {
            motif: "小红帽".to_string(),
            excerpt_chars: 4,
        };
        let tracker = MotifTracker::new(config, contexts());
        let instances = tracker.extract_instances(&[dialogue(1, 1, "小红帽回家了")]);
        assert_eq!(instances[0].text, "小红帽回");
    }

    #[test]
    fn test_empty_motif_matches_nothing() {
        let config = MotifConfig {
            motif: String::new(),
            excerpt_chars: 150,
        };
        let tracker = MotifTracker::new(config, contexts());
        assert!(tracker.extract_instances(&[dialogue(1, 1, "hood")]).is_empty());
    }

    #[test]
    fn test_evolution_across_arcs() {
        let dialogues = vec![
            dialogue(2, 1, "hood at home"),
            dialogue(5, 2, "hood by the fire"),
            dialogue(120, 3, "hood goes to war"),
        ];
        let evolution = tracker().analyze(&dialogues);

        assert_eq!(evolution.arcs.len(), 2);
        let camp = &evolution.arcs[0];
        assert_eq!(camp.arc, "1.1 (Camp)");
        assert_eq!(camp.total_instances, 2);
        assert_eq!(camp.share("innocence"), 50.0);
        assert_eq!(camp.neutral_percent, 50.0);
        assert_eq!(camp.dominant_context, "Innocence");

        let metrics = evolution.metrics();
        assert_eq!(metrics.total_instances, 3);
        assert_eq!(metrics.unique_arcs, 2);
        assert_eq!(metrics.initial_dominant.as_deref(), Some("Innocence"));
        assert_eq!(metrics.final_dominant.as_deref(), Some("Military"));
        assert_eq!(metrics.shifts["innocence_shift"], -50.0);
        assert_eq!(metrics.shifts["military_shift"], 100.0);
        assert_eq!(metrics.context_totals["innocence_total_pct"], 33.33);
        assert_eq!(metrics.context_totals["neutral_total_pct"], 33.33);

        let keys: Vec<&String> = metrics.context_totals.keys().collect();
        assert_eq!(
            keys,
            vec!["innocence_total_pct", "military_total_pct", "neutral_total_pct"]
        );
    }

    #[test]
    fn test_single_arc_has_no_shift() {
        let evolution = tracker().analyze(&[dialogue(2, 1, "hood")]);
        let metrics = evolution.metrics();

        assert_eq!(evolution.arcs[0].dominant_context, "Neutral");
        assert!(metrics.initial_dominant.is_none());
        assert!(metrics.shifts.is_empty());

        let json = serde_json::to_value(&metrics).unwrap();
        assert!(json.get("initial_dominant").is_none());
        assert_eq!(json["neutral_total_pct"], 100.0);
        assert!(json.get("innocence_total_pct").is_none());
    }

    #[test]
    fn test_table_layout() {
        let evolution = tracker().analyze(&[dialogue(2, 1, "hood at home")]);
        let table = evolution.table();

        assert_eq!(table.title.as_deref(), Some("Motif Context Evolution: hood"));
        assert_eq!(
            table.headers,
            vec![
                "Arc",
                "Innocence %",
                "Military %",
                "Neutral %",
                "Total Instances",
                "Dominant Context"
            ]
        );
        assert_eq!(
            table.rows[0],
            vec!["1.1 (Camp)", "100.0", "0.0", "0.0", "1", "Innocence"]
        );
    }

    #[test]
    fn test_no_instances() {
        let evolution = tracker().analyze(&[dialogue(2, 1, "nothing here")]);
        let metrics = evolution.metrics();
        assert_eq!(metrics.total_instances, 0);
        assert_eq!(metrics.unique_arcs, 0);
        assert!(metrics.context_totals.is_empty());
        assert!(evolution.table().is_empty());
    }
}
