use tracing::info;

use crate::events::SimEvent;
use crate::mission::Objective;
use crate::types::Faction;
use crate::world::{Mission, MissionStatus, Outcome};

// ============================================================================
// Win / Lose Check
// ============================================================================

#[must_use]
pub fn objective_met(mission: &Mission) -> bool {
    match mission.objective {
        Objective::EliminateAll => mission.live_actors(Faction::Enemy).next().is_none(),
        Objective::HackAndExtract => {
            let hacked = mission
                .interactables
                .iter()
                .filter(|interactable| interactable.is_objective())
                .all(|terminal| terminal.is_hacked());
            let extracted = mission
                .live_actors(Faction::Crew)
                .all(|crew| mission.entry_zone.contains(&crew.pos));
            hacked && extracted
        }
    }
}

#[must_use]
pub fn defeated(mission: &Mission) -> bool {
    let wiped = mission.live_actors(Faction::Crew).next().is_none();
    let timed_out = mission.time_limit.is_some_and(|limit| mission.tick >= limit);
    wiped || timed_out
}

// Last step of the tick. Defeat takes precedence when both hold; the mission is terminal after.
pub fn run(mission: &mut Mission) {
    if mission.is_complete() {
        return;
    }

    let outcome = if defeated(mission) {
        Outcome::Defeat
    } else if objective_met(mission) {
        Outcome::Victory
    } else {
        return;
    };

    mission.status = MissionStatus::Complete(outcome);
    let victory = outcome == Outcome::Victory;
    info!(tick = mission.tick, ?outcome, "mission ended");
    mission.emit(SimEvent::MissionEnded {
        victory,
        tick: mission.tick,
    });
}
