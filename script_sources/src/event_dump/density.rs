//! Per-map narrative density: dialogue commands over all commands.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use super::{CommandCategory, GameMap, MapId};

/// Density strictly above this is story-heavy.
pub const STORY_HEAVY_THRESHOLD: f64 = 0.7;
/// Density strictly above this (and not story-heavy) is mixed.
pub const MIXED_THRESHOLD: f64 = 0.3;

/// Three-way classification of a map by narrative density.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DensityClass {
    #[serde(rename = "Story-Heavy")]
    StoryHeavy,
    Mixed,
    #[serde(rename = "Combat/Traversal")]
    CombatTraversal,
}

impl DensityClass {
    /// Classes in presentation order.
    pub const ALL: [DensityClass; 3] = [
        DensityClass::StoryHeavy,
        DensityClass::Mixed,
        DensityClass::CombatTraversal,
    ];

    /// Classify a density value. Both boundaries belong to the lower class.
    pub fn classify(density: f64) -> Self {
        if density > STORY_HEAVY_THRESHOLD {
            DensityClass::StoryHeavy
        } else if density > MIXED_THRESHOLD {
            DensityClass::Mixed
        } else {
            DensityClass::CombatTraversal
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            DensityClass::StoryHeavy => "Story-Heavy",
            DensityClass::Mixed => "Mixed",
            DensityClass::CombatTraversal => "Combat/Traversal",
        }
    }
}

impl std::fmt::Display for DensityClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Command counts of one map folded into six buckets.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MapDensity {
    pub map_id: MapId,
    pub map_name: String,
    pub dialogue_count: usize,
    /// Battle processing plus common-event calls, which usually start battles.
    pub battle_count: usize,
    pub logic_count: usize,
    pub navigation_count: usize,
    pub visual_audio_count: usize,
    /// Other, Message, Wait and Party commands.
    pub other_count: usize,
    pub total_commands: usize,
    /// Dialogue share rounded to four decimals.
    pub narrative_density: f64,
    pub classification: DensityClass,
}

impl MapDensity {
    /// Count and classify the commands of a map.
    pub fn from_map(map: &GameMap) -> Self {
        let mut counts: HashMap<CommandCategory, usize> = HashMap::new();
        for command in map.commands() {
            *counts.entry(command.category).or_default() += 1;
        }
        let count = |category: CommandCategory| counts.get(&category).copied().unwrap_or(0);

        let dialogue = count(CommandCategory::Text);
        let battle = count(CommandCategory::Battle) + count(CommandCategory::Common);
        let logic = count(CommandCategory::Logic);
        let navigation = count(CommandCategory::Navigation);
        let visual = count(CommandCategory::Visual) + count(CommandCategory::Audio);
        let other = count(CommandCategory::Other)
            + count(CommandCategory::Message)
            + count(CommandCategory::Wait)
            + count(CommandCategory::Party);

        let total = dialogue + battle + logic + navigation + visual + other;
        let density = if total > 0 {
            dialogue as f64 / total as f64
        } else {
            0.0
        };

        Self {
            map_id: map.id,
            map_name: map.name.clone(),
            dialogue_count: dialogue,
            battle_count: battle,
            logic_count: logic,
            navigation_count: navigation,
            visual_audio_count: visual,
            other_count: other,
            total_commands: total,
            narrative_density: (density * 10_000.0).round() / 10_000.0,
            classification: DensityClass::classify(density),
        }
    }

    /// The six bucket counts in a fixed order: dialogue, battle, logic,
    /// navigation, visual/audio, other.
    pub fn buckets(&self) -> [usize; 6] {
        [
            self.dialogue_count,
            self.battle_count,
            self.logic_count,
            self.navigation_count,
            self.visual_audio_count,
            self.other_count,
        ]
    }
}
