use serde::{Deserialize, Serialize};

use crate::constants::*;
use crate::types::{ActorId, GridPos, InteractableId};

// ============================================================================
// States
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DoorState {
    Closed,
    Open,
    Locked,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TerminalState {
    Idle,
    Hacking,
    Hacked,
    Disabled,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HazardState {
    Armed,
    Triggered,
    Disabled,
}

// Snapshot of any interactable's state, used in change events
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "state")]
pub enum InteractableState {
    Door(DoorState),
    Terminal(TerminalState),
    Hazard(HazardState),
}

// ============================================================================
// Interactable Kinds
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DoorConfig {
    pub unlock_ticks: u32,
    pub interruptible: bool,
}

impl Default for DoorConfig {
    fn default() -> Self {
        Self {
            unlock_ticks: DEFAULT_UNLOCK_TICKS,
            interruptible: true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TerminalConfig {
    pub hack_ticks: u32,
    pub interruptible: bool,
    // Counts toward a hack-and-extract objective
    pub objective: bool,
    // Shuts down for good once the alarm is raised
    pub locks_on_alarm: bool,
}

impl Default for TerminalConfig {
    fn default() -> Self {
        Self {
            hack_ticks: DEFAULT_HACK_TICKS,
            interruptible: true,
            objective: true,
            locks_on_alarm: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HazardConfig {
    pub radius: f32,
    pub damage: i32,
    pub disarm_ticks: u32,
    pub interruptible: bool,
    // Bleed applied to everyone caught in the blast
    pub bleed_per_tick: i32,
    pub bleed_ticks: u32,
}

impl Default for HazardConfig {
    fn default() -> Self {
        Self {
            radius: DEFAULT_HAZARD_RADIUS,
            damage: DEFAULT_HAZARD_DAMAGE,
            disarm_ticks: DEFAULT_DISARM_TICKS,
            interruptible: true,
            bleed_per_tick: 0,
            bleed_ticks: 0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InteractableKind {
    Door { state: DoorState, config: DoorConfig },
    Terminal { state: TerminalState, config: TerminalConfig },
    Hazard { state: HazardState, config: HazardConfig },
}

// ============================================================================
// Channeled Actions
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChannelKind {
    Unlock,
    Hack,
    Disarm,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChanneledAction {
    pub actor: ActorId,
    pub target: InteractableId,
    pub kind: ChannelKind,
    pub total: u32,
    pub remaining: u32,
    pub interruptible: bool,
}

// What an interaction request does to an interactable
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Interaction {
    // Applied immediately
    Open,
    Close,
    // Multi-tick channel with the given base duration
    Channel { kind: ChannelKind, base_ticks: u32, interruptible: bool },
    // Nothing to do in the current state
    Unavailable,
}

// ============================================================================
// Interactable
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Interactable {
    pub id: InteractableId,
    pub pos: GridPos,
    pub kind: InteractableKind,
}

impl Interactable {
    #[must_use]
    pub const fn state(&self) -> InteractableState {
        match self.kind {
            InteractableKind::Door { state, .. } => InteractableState::Door(state),
            InteractableKind::Terminal { state, .. } => InteractableState::Terminal(state),
            InteractableKind::Hazard { state, .. } => InteractableState::Hazard(state),
        }
    }

    // Closed and locked doors seal their tile
    #[must_use]
    pub const fn seals_tile(&self) -> bool {
        matches!(
            self.kind,
            InteractableKind::Door {
                state: DoorState::Closed | DoorState::Locked,
                ..
            }
        )
    }

    #[must_use]
    pub const fn is_objective(&self) -> bool {
        matches!(self.kind, InteractableKind::Terminal { config, .. } if config.objective)
    }

    #[must_use]
    pub const fn is_hacked(&self) -> bool {
        matches!(
            self.kind,
            InteractableKind::Terminal {
                state: TerminalState::Hacked,
                ..
            }
        )
    }

    #[must_use]
    pub const fn is_armed_hazard(&self) -> bool {
        matches!(
            self.kind,
            InteractableKind::Hazard {
                state: HazardState::Armed,
                ..
            }
        )
    }

    // Decide what interacting with this would do, without changing anything
    #[must_use]
    pub const fn interaction(&self) -> Interaction {
        match self.kind {
            InteractableKind::Door { state, config } => match state {
                DoorState::Closed => Interaction::Open,
                DoorState::Open => Interaction::Close,
                DoorState::Locked => Interaction::Channel {
                    kind: ChannelKind::Unlock,
                    base_ticks: config.unlock_ticks,
                    interruptible: config.interruptible,
                },
            },
            InteractableKind::Terminal { state, config } => match state {
                TerminalState::Idle => Interaction::Channel {
                    kind: ChannelKind::Hack,
                    base_ticks: config.hack_ticks,
                    interruptible: config.interruptible,
                },
                TerminalState::Hacking | TerminalState::Hacked | TerminalState::Disabled => Interaction::Unavailable,
            },
            InteractableKind::Hazard { state, config } => match state {
                HazardState::Armed => Interaction::Channel {
                    kind: ChannelKind::Disarm,
                    base_ticks: config.disarm_ticks,
                    interruptible: config.interruptible,
                },
                HazardState::Triggered | HazardState::Disabled => Interaction::Unavailable,
            },
        }
    }

    // Move to a new state. Returns the previous state when something changed.
    pub fn transition(&mut self, to: InteractableState) -> Option<InteractableState> {
        let from = self.state();
        if from == to {
            return None;
        }
        match (&mut self.kind, to) {
            (InteractableKind::Door { state, .. }, InteractableState::Door(next)) => *state = next,
            (InteractableKind::Terminal { state, .. }, InteractableState::Terminal(next)) => *state = next,
            (InteractableKind::Hazard { state, .. }, InteractableState::Hazard(next)) => *state = next,
            _ => return None,
        }
        Some(from)
    }

    // State a channel of `kind` leaves behind when it completes
    #[must_use]
    pub const fn completed_state(&self, kind: ChannelKind) -> Option<InteractableState> {
        match (self.kind, kind) {
            (
                InteractableKind::Door {
                    state: DoorState::Locked,
                    ..
                },
                ChannelKind::Unlock,
            ) => Some(InteractableState::Door(DoorState::Open)),
            (
                InteractableKind::Terminal {
                    state: TerminalState::Hacking,
                    ..
                },
                ChannelKind::Hack,
            ) => Some(InteractableState::Terminal(TerminalState::Hacked)),
            (
                InteractableKind::Hazard {
                    state: HazardState::Armed,
                    ..
                },
                ChannelKind::Disarm,
            ) => Some(InteractableState::Hazard(HazardState::Disabled)),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn terminal() -> Interactable {
        Interactable {
            id: InteractableId(0),
            pos: GridPos::new(3, 3),
            kind: InteractableKind::Terminal {
                state: TerminalState::Idle,
                config: TerminalConfig::default(),
            },
        }
    }

    fn door(state: DoorState) -> Interactable {
        Interactable {
            id: InteractableId(1),
            pos: GridPos::new(4, 4),
            kind: InteractableKind::Door {
                state,
                config: DoorConfig::default(),
            },
        }
    }

    #[test]
    fn doors_open_close_or_need_unlocking() {
        assert_eq!(door(DoorState::Closed).interaction(), Interaction::Open);
        assert_eq!(door(DoorState::Open).interaction(), Interaction::Close);
        assert!(matches!(
            door(DoorState::Locked).interaction(),
            Interaction::Channel {
                kind: ChannelKind::Unlock,
                ..
            }
        ));
        assert!(door(DoorState::Locked).seals_tile());
        assert!(!door(DoorState::Open).seals_tile());
    }

    #[test]
    fn hack_completes_only_from_hacking() {
        let mut term = terminal();
        assert_eq!(term.completed_state(ChannelKind::Hack), None);
        assert_eq!(
            term.transition(InteractableState::Terminal(TerminalState::Hacking)),
            Some(InteractableState::Terminal(TerminalState::Idle))
        );
        assert_eq!(
            term.completed_state(ChannelKind::Hack),
            Some(InteractableState::Terminal(TerminalState::Hacked))
        );
        assert_eq!(term.interaction(), Interaction::Unavailable);
    }

    #[test]
    fn transition_rejects_mismatched_kinds_and_no_ops() {
        let mut term = terminal();
        assert_eq!(term.transition(InteractableState::Door(DoorState::Open)), None);
        assert_eq!(term.transition(InteractableState::Terminal(TerminalState::Idle)), None);
        assert!(term.is_objective());
        assert!(!term.is_hacked());
    }
}
