//! Summary statistics over per-map narrative density.

use script_sources::{DensityClass, MapDensity, MapId};
use serde::{Deserialize, Serialize};

use crate::report::{percent, round_to, Table};

/// How many maps each top list keeps.
pub const TOP_MAPS: usize = 10;

/// A map in a top-density list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedMap {
    pub map_id: MapId,
    pub map_name: String,
    pub narrative_density: f64,
}

impl From<&MapDensity> for RankedMap {
    fn from(row: &MapDensity) -> Self {
        Self {
            map_id: row.map_id,
            map_name: row.map_name.clone(),
            narrative_density: row.narrative_density,
        }
    }
}

/// Command mix of one density class, each bucket as a percentage of the
/// class's commands.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassBreakdown {
    pub classification: DensityClass,
    pub dialogue_pct: f64,
    pub battle_pct: f64,
    pub logic_pct: f64,
    pub navigation_pct: f64,
    pub visual_audio_pct: f64,
    pub other_pct: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DensityStatistics {
    pub total_maps: usize,
    pub mean_density: f64,
    pub median_density: f64,
    pub std_density: f64,
    pub min_density: f64,
    pub max_density: f64,

    pub story_heavy_count: usize,
    pub mixed_count: usize,
    pub combat_traversal_count: usize,
    pub story_heavy_pct: f64,
    pub mixed_pct: f64,
    pub combat_traversal_pct: f64,

    pub total_dialogue_commands: usize,
    pub total_battle_commands: usize,
    pub total_logic_commands: usize,
    pub total_all_commands: usize,

    pub top_story_maps: Vec<RankedMap>,
    pub top_combat_maps: Vec<RankedMap>,
    /// Only classes with at least one map.
    pub class_breakdown: Vec<ClassBreakdown>,
}

/// Density rows restricted to maps that have at least one command.
#[derive(Debug, Clone, PartialEq)]
pub struct DensityAnalysis {
    pub rows: Vec<MapDensity>,
}

impl DensityAnalysis {
    pub fn new(rows: Vec<MapDensity>) -> Self {
        let total = rows.len();
        let rows: Vec<MapDensity> = rows.into_iter().filter(|r| r.total_commands > 0).collect();
        tracing::debug!(maps = total, with_content = rows.len(), "filtered density rows");
        Self { rows }
    }

    pub fn statistics(&self) -> DensityStatistics {
        let densities: Vec<f64> = self.rows.iter().map(|r| r.narrative_density).collect();
        let n = densities.len();

        let class_count = |class: DensityClass| {
            self.rows
                .iter()
                .filter(|r| r.classification == class)
                .count()
        };
        let story = class_count(DensityClass::StoryHeavy);
        let mixed = class_count(DensityClass::Mixed);
        let combat = class_count(DensityClass::CombatTraversal);

        let sum_of = |field: fn(&MapDensity) -> usize| self.rows.iter().map(field).sum::<usize>();

        let mut by_density_desc: Vec<&MapDensity> = self.rows.iter().collect();
        by_density_desc.sort_by(|a, b| b.narrative_density.total_cmp(&a.narrative_density));
        let mut by_density_asc: Vec<&MapDensity> = self.rows.iter().collect();
        by_density_asc.sort_by(|a, b| a.narrative_density.total_cmp(&b.narrative_density));

        DensityStatistics {
            total_maps: n,
            mean_density: round_to(mean(&densities), 4),
            median_density: round_to(median(&densities), 4),
            std_density: round_to(sample_std(&densities), 4),
            min_density: round_to(densities.iter().copied().reduce(f64::min).unwrap_or(0.0), 4),
            max_density: round_to(densities.iter().copied().reduce(f64::max).unwrap_or(0.0), 4),

            story_heavy_count: story,
            mixed_count: mixed,
            combat_traversal_count: combat,
            story_heavy_pct: round_to(percent(story, n), 2),
            mixed_pct: round_to(percent(mixed, n), 2),
            combat_traversal_pct: round_to(percent(combat, n), 2),

            total_dialogue_commands: sum_of(|r| r.dialogue_count),
            total_battle_commands: sum_of(|r| r.battle_count),
            total_logic_commands: sum_of(|r| r.logic_count),
            total_all_commands: sum_of(|r| r.total_commands),

            top_story_maps: by_density_desc.iter().take(TOP_MAPS).map(|r| RankedMap::from(*r)).collect(),
            top_combat_maps: by_density_asc.iter().take(TOP_MAPS).map(|r| RankedMap::from(*r)).collect(),
            class_breakdown: self.class_breakdown(),
        }
    }

    fn class_breakdown(&self) -> Vec<ClassBreakdown> {
        DensityClass::ALL
            .iter()
            .filter_map(|class| {
                let mut buckets = [0usize; 6];
                let mut seen = false;
                for row in self.rows.iter().filter(|r| r.classification == *class) {
                    seen = true;
                    for (total, count) in buckets.iter_mut().zip(row.buckets()) {
                        *total += count;
                    }
                }
                if !seen {
                    return None;
                }
                let all: usize = buckets.iter().sum();
                let pct = |i: usize| round_to(percent(buckets[i], all), 2);
                Some(ClassBreakdown {
                    classification: *class,
                    dialogue_pct: pct(0),
                    battle_pct: pct(1),
                    logic_pct: pct(2),
                    navigation_pct: pct(3),
                    visual_audio_pct: pct(4),
                    other_pct: pct(5),
                })
            })
            .collect()
    }

    /// Every map, densest first.
    pub fn table(&self) -> Table {
        let mut table = Table::new([
            "map_id",
            "map_name",
            "dialogue_count",
            "total_commands",
            "narrative_density",
            "classification",
        ])
        .with_title("Narrative Density by Map");

        let mut rows: Vec<&MapDensity> = self.rows.iter().collect();
        rows.sort_by(|a, b| b.narrative_density.total_cmp(&a.narrative_density));
        for row in rows {
            table.push_row([
                row.map_id.to_string(),
                row.map_name.clone(),
                row.dialogue_count.to_string(),
                row.total_commands.to_string(),
                format!("{:.4}", row.narrative_density),
                row.classification.label().to_string(),
            ]);
        }
        table
    }
}

fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        0.0
    } else {
        values.iter().sum::<f64>() / values.len() as f64
    }
}

fn median(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        (sorted[mid - 1] + sorted[mid]) / 2.0
    } else {
        sorted[mid]
    }
}

/// Sample standard deviation (n - 1 denominator); 0 below two values.
fn sample_std(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let m = mean(values);
    let variance =
        values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / (values.len() - 1) as f64;
    variance.sqrt()
}
