use serde::{Deserialize, Serialize};
use std::panic::{AssertUnwindSafe, catch_unwind};

use crate::combat::AttackResult;
use crate::interactables::{ChannelKind, InteractableState};
use crate::types::{ActorId, Faction, GridPos, InteractableId};

// ============================================================================
// Simulation Events
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "event")]
pub enum SimEvent {
    ActorAdded {
        actor: ActorId,
        name: String,
        faction: Faction,
        pos: GridPos,
    },
    ActorRemoved {
        actor: ActorId,
    },
    AttackResolved(AttackResult),
    ActorDied {
        actor: ActorId,
        killer: Option<ActorId>,
    },
    EnemyAlerted {
        enemy: ActorId,
        spotted: ActorId,
        at: GridPos,
    },
    AlarmRaised {
        by: ActorId,
    },
    InteractableChanged {
        id: InteractableId,
        from: InteractableState,
        to: InteractableState,
    },
    ChannelStarted {
        actor: ActorId,
        target: InteractableId,
        kind: ChannelKind,
        ticks: u32,
    },
    ChannelCompleted {
        actor: ActorId,
        target: InteractableId,
        kind: ChannelKind,
    },
    ChannelInterrupted {
        actor: ActorId,
        target: InteractableId,
        kind: ChannelKind,
    },
    AbilityResolved {
        owner: ActorId,
        ability: String,
        target: GridPos,
        affected: Vec<ActorId>,
    },
    HazardTriggered {
        id: InteractableId,
        by: Option<ActorId>,
    },
    MissionEnded {
        victory: bool,
        tick: u64,
    },
}

// ============================================================================
// Event Bus
// ============================================================================

pub type EventHandler = Box<dyn FnMut(&SimEvent) -> anyhow::Result<()>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

// Synchronous dispatch to every subscriber in subscription order. A failing or panicking handler
// is logged and skipped; the rest still run.
#[derive(Default)]
pub struct EventBus {
    next_id: u64,
    handlers: Vec<(SubscriptionId, EventHandler)>,
    failures: u64,
}

impl EventBus {
    pub fn subscribe(&mut self, handler: impl FnMut(&SimEvent) -> anyhow::Result<()> + 'static) -> SubscriptionId {
        let id = SubscriptionId(self.next_id);
        self.next_id += 1;
        self.handlers.push((id, Box::new(handler)));
        id
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.handlers.len();
        self.handlers.retain(|(handler_id, _)| *handler_id != id);
        self.handlers.len() != before
    }

    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.handlers.len()
    }

    // Handler failures since the bus was created
    #[must_use]
    pub const fn failures(&self) -> u64 {
        self.failures
    }

    pub fn publish(&mut self, event: &SimEvent) {
        for (id, handler) in &mut self.handlers {
            match catch_unwind(AssertUnwindSafe(|| handler(event))) {
                Ok(Ok(())) => {}
                Ok(Err(err)) => {
                    self.failures += 1;
                    tracing::warn!(subscriber = id.0, "event handler failed: {err:#}");
                }
                Err(_) => {
                    self.failures += 1;
                    tracing::warn!(subscriber = id.0, "event handler panicked");
                }
            }
        }
    }
}

impl std::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventBus")
            .field("subscribers", &self.handlers.len())
            .field("failures", &self.failures)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn removal(actor: u32) -> SimEvent {
        SimEvent::ActorRemoved { actor: ActorId(actor) }
    }

    #[test]
    fn faulty_subscribers_do_not_starve_the_rest() {
        let mut bus = EventBus::default();
        let seen = Rc::new(RefCell::new(Vec::new()));

        bus.subscribe(|_| anyhow::bail!("listener broke"));
        bus.subscribe(|_| panic!("listener exploded"));
        let sink = Rc::clone(&seen);
        bus.subscribe(move |event| {
            sink.borrow_mut().push(event.clone());
            Ok(())
        });

        bus.publish(&removal(1));
        bus.publish(&removal(2));

        assert_eq!(*seen.borrow(), vec![removal(1), removal(2)]);
        assert_eq!(bus.failures(), 4);
    }

    #[test]
    fn unsubscribed_handlers_stop_receiving() {
        let mut bus = EventBus::default();
        let count = Rc::new(RefCell::new(0));
        let counter = Rc::clone(&count);
        let id = bus.subscribe(move |_| {
            *counter.borrow_mut() += 1;
            Ok(())
        });

        bus.publish(&removal(0));
        assert!(bus.unsubscribe(id));
        assert!(!bus.unsubscribe(id));
        bus.publish(&removal(0));

        assert_eq!(*count.borrow(), 1);
        assert_eq!(bus.subscriber_count(), 0);
    }
}
