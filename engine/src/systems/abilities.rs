use tracing::debug;

use crate::actor::StatusEffect;
use crate::definitions::AbilityKind;
use crate::events::SimEvent;
use crate::types::{ActorId, GridPos, InteractableId};
use crate::world::{Mission, PendingAbility};

// ============================================================================
// Delayed Ability Resolution
// ============================================================================

// Resolve every pending ability that is due, in the order they were used. An owner who died in
// the meantime does not cancel anything already thrown.
pub fn run(mission: &mut Mission) {
    let tick = mission.tick;
    let (due, waiting): (Vec<PendingAbility>, Vec<PendingAbility>) = std::mem::take(&mut mission.pending)
        .into_iter()
        .partition(|pending| pending.resolve_tick <= tick);
    mission.pending = waiting;

    for pending in due {
        resolve(mission, &pending);
    }
}

fn caught_in_blast(mission: &Mission, center: GridPos, radius: f32) -> Vec<ActorId> {
    mission
        .actors
        .iter()
        .filter(|actor| actor.alive && actor.pos.distance(center) <= radius)
        .map(|actor| actor.id)
        .collect()
}

fn resolve(mission: &mut Mission, pending: &PendingAbility) {
    let owner_faction = mission.actor(pending.owner).map(|owner| owner.faction);

    let affected = match pending.ability.kind {
        AbilityKind::Grenade { radius, damage } => {
            let caught = caught_in_blast(mission, pending.target, radius);
            for victim in &caught {
                let hostile = mission
                    .actor(*victim)
                    .is_some_and(|actor| Some(actor.faction) != owner_faction);
                if hostile {
                    mission.note_shot(*victim, pending.owner);
                }
                mission.apply_damage(*victim, damage, Some(pending.owner));
            }

            let hazards: Vec<InteractableId> = mission
                .interactables
                .iter()
                .filter(|interactable| {
                    interactable.is_armed_hazard() && interactable.pos.distance(pending.target) <= radius
                })
                .map(|interactable| interactable.id)
                .collect();
            for hazard in hazards {
                mission.trigger_hazard(hazard, Some(pending.owner));
            }
            caught
        }
        AbilityKind::Flashbang { radius, stun_ticks } => {
            let caught = caught_in_blast(mission, pending.target, radius);
            for victim in &caught {
                mission.add_status(*victim, StatusEffect::Stunned { remaining: stun_ticks });
            }
            caught
        }
        AbilityKind::Medkit { heal } => match mission.actor_at(pending.target) {
            Some(patient) => {
                mission.actors[patient.index()].heal(heal);
                vec![patient]
            }
            None => Vec::new(),
        },
    };

    debug!(
        tick = mission.tick,
        owner = %pending.owner,
        ability = %pending.ability.id,
        target = %pending.target,
        affected = affected.len(),
        "ability resolved"
    );
    mission.emit(SimEvent::AbilityResolved {
        owner: pending.owner,
        ability: pending.ability.id.clone(),
        target: pending.target,
        affected,
    });
}
