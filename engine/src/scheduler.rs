use tracing::{debug, info};

use crate::summary::MissionSummary;
use crate::systems;
use crate::world::Mission;

// ============================================================================
// Fixed-Step Clock
// ============================================================================

// Converts variable wall-clock deltas into whole fixed-duration ticks
#[derive(Debug, Clone, PartialEq)]
pub struct TickClock {
    accumulator: f64,
    tick_seconds: f64,
    time_scale: f64,
    paused: bool,
    max_catch_up: u32,
}

impl TickClock {
    #[must_use]
    pub fn new(tick_seconds: f32, max_catch_up: u32) -> Self {
        Self {
            accumulator: 0.0,
            tick_seconds: f64::from(tick_seconds.max(f32::EPSILON)),
            time_scale: 1.0,
            paused: false,
            max_catch_up: max_catch_up.max(1),
        }
    }

    pub const fn set_paused(&mut self, paused: bool) {
        self.paused = paused;
    }

    #[must_use]
    pub const fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn set_time_scale(&mut self, scale: f32) {
        self.time_scale = if scale.is_finite() { f64::from(scale.max(0.0)) } else { 1.0 };
    }

    // Number of ticks owed for `delta` seconds of wall-clock time
    pub fn advance(&mut self, delta: f32) -> u32 {
        if self.paused || !delta.is_finite() || delta <= 0.0 {
            return 0;
        }

        self.accumulator += f64::from(delta) * self.time_scale;
        let mut ticks = 0;
        while self.accumulator >= self.tick_seconds && ticks < self.max_catch_up {
            self.accumulator -= self.tick_seconds;
            ticks += 1;
        }

        // Drop the backlog rather than spiral after a long stall
        if self.accumulator >= self.tick_seconds {
            debug!(backlog = self.accumulator, "clock dropped backlog");
            self.accumulator = 0.0;
        }
        ticks
    }
}

// ============================================================================
// Tick Pipeline
// ============================================================================

impl Mission {
    // Run one fixed tick. Returns false once the mission is over (nothing runs after that).
    pub fn tick(&mut self) -> bool {
        if self.is_complete() {
            return false;
        }
        self.announce_roster();
        self.tick += 1;

        systems::ai::run(self);
        systems::abilities::run(self);
        systems::attacks::run(self);
        systems::collision::run(self);
        systems::advance::run(self);
        self.refresh_visibility();
        systems::perception::run(self);
        systems::outcome::run(self);

        !self.is_complete()
    }

    // Feed wall-clock time; runs however many ticks the clock says are due
    pub fn update(&mut self, delta: f32) -> u32 {
        let due = self.clock.advance(delta);
        let mut ran = 0;
        for _ in 0..due {
            if !self.tick() {
                break;
            }
            ran += 1;
        }
        ran
    }

    // Headless run until the mission ends or `max_ticks` have elapsed
    pub fn run_to_completion(&mut self, max_ticks: u64) -> MissionSummary {
        while self.tick < max_ticks && self.tick() {}
        if !self.is_complete() {
            info!(ticks = self.tick, "tick cap reached before the mission ended");
        }
        self.summary()
    }
}
