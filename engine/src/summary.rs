use serde::{Deserialize, Serialize};
use std::fmt;

use crate::actor::UnitKind;
use crate::combat::FactionStats;
use crate::types::{ActorId, Faction};
use crate::world::{AlarmState, Mission, Outcome};

// ============================================================================
// End-of-Mission Report
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActorReport {
    pub id: ActorId,
    pub name: String,
    pub faction: Faction,
    pub kind: UnitKind,
    pub alive: bool,
    // Crew only: alive and standing in the entry zone
    pub extracted: bool,
    pub hp: i32,
    pub kills: u32,
    pub shots: u32,
    pub hits: u32,
    pub damage_dealt: i32,
    pub damage_taken: i32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MissionSummary {
    pub name: String,
    pub seed: u64,
    pub ticks: u64,
    // None when the run stopped at the tick cap
    pub outcome: Option<Outcome>,
    pub victory: bool,
    pub alarm_raised: bool,
    pub actors: Vec<ActorReport>,
    pub stats: FactionStats,
}

impl MissionSummary {
    #[must_use]
    pub fn survivors(&self, faction: Faction) -> usize {
        self.actors
            .iter()
            .filter(|report| report.faction == faction && report.alive)
            .count()
    }

    #[must_use]
    pub fn extracted(&self) -> usize {
        self.actors.iter().filter(|report| report.extracted).count()
    }
}

impl fmt::Display for MissionSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let result = match self.outcome {
            Some(Outcome::Victory) => "VICTORY",
            Some(Outcome::Defeat) => "DEFEAT",
            None => "UNFINISHED",
        };
        writeln!(
            f,
            "{} [seed {}] {result} after {} ticks (alarm {})",
            self.name,
            self.seed,
            self.ticks,
            if self.alarm_raised { "raised" } else { "quiet" }
        )?;
        for faction in [Faction::Crew, Faction::Enemy] {
            let stats = self.stats.get(faction);
            writeln!(
                f,
                "  {faction:?}: {} shots, {} hits ({:.0}%), {} damage, {} kills",
                stats.shots,
                stats.hits,
                stats.accuracy() * 100.0,
                stats.damage_dealt,
                stats.kills
            )?;
        }
        for report in &self.actors {
            let state = match (report.alive, report.extracted) {
                (true, true) => "extracted",
                (true, false) => "alive",
                (false, _) => "dead",
            };
            writeln!(
                f,
                "  {:>3} {:<16} {state:<9} hp {:>3}  kills {}  hits {}/{}  dealt {}  taken {}",
                report.id.0,
                report.name,
                report.hp,
                report.kills,
                report.hits,
                report.shots,
                report.damage_dealt,
                report.damage_taken
            )?;
        }
        Ok(())
    }
}

impl Mission {
    // Pull-style snapshot; valid at any point, final once the mission is complete
    #[must_use]
    pub fn summary(&self) -> MissionSummary {
        let actors = self
            .actors
            .iter()
            .map(|actor| ActorReport {
                id: actor.id,
                name: actor.name.clone(),
                faction: actor.faction,
                kind: actor.kind,
                alive: actor.alive,
                extracted: actor.faction == Faction::Crew && actor.alive && self.entry_zone.contains(&actor.pos),
                hp: actor.hp,
                kills: actor.tally.kills,
                shots: actor.tally.shots,
                hits: actor.tally.hits,
                damage_dealt: actor.tally.damage_dealt,
                damage_taken: actor.tally.damage_taken,
            })
            .collect();

        let outcome = self.outcome();
        MissionSummary {
            name: self.name.clone(),
            seed: self.seed,
            ticks: self.tick,
            outcome,
            victory: outcome == Some(Outcome::Victory),
            alarm_raised: self.alarm == AlarmState::Alerted,
            actors,
            stats: self.stats,
        }
    }
}
