use super::movement;
use crate::world::Mission;

// ============================================================================
// Per-Actor Advance
// ============================================================================

// Cooldowns and reloads, status effects, movement, then channel progress, actor by actor in id
// order. Anything that kills the actor part-way stops the rest of its advance.
pub fn run(mission: &mut Mission) {
    for idx in 0..mission.actors.len() {
        if !mission.actors[idx].alive {
            continue;
        }
        let id = mission.actors[idx].id;

        mission.actors[idx].advance_timers();
        let bleed = mission.actors[idx].advance_statuses();
        if bleed > 0 && mission.apply_damage(id, bleed, None) {
            continue;
        }

        movement::advance(mission, idx);
        if !mission.actors[idx].alive {
            continue;
        }

        advance_channel(mission, idx);
    }
}

fn advance_channel(mission: &mut Mission, idx: usize) {
    let actor = &mut mission.actors[idx];
    // Stuns cancel interruptible channels when applied; the rest just stall
    let stunned = actor.is_stunned();
    let Some(channel) = actor.channel.as_mut() else {
        return;
    };
    if stunned {
        return;
    }

    channel.remaining = channel.remaining.saturating_sub(1);
    if channel.remaining == 0 {
        let id = actor.id;
        mission.complete_channel(id);
    }
}
