use serde::{Deserialize, Serialize};

use crate::constants::*;

// ============================================================================
// Simulation Configuration
// ============================================================================

// Per-mission tunables. Everything defaults to the values in `constants`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    pub tick_rate_hz: u32,
    pub ai_interval_ticks: u64,
    pub switch_hysteresis: f32,
    pub min_hit_chance: f32,
    pub max_hit_chance: f32,
    pub max_catch_up_ticks: u32,
    pub crew_autopilot: bool,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            tick_rate_hz: TICK_RATE_HZ,
            ai_interval_ticks: AI_INTERVAL_TICKS,
            switch_hysteresis: TARGET_SWITCH_HYSTERESIS,
            min_hit_chance: MIN_HIT_CHANCE,
            max_hit_chance: MAX_HIT_CHANCE,
            max_catch_up_ticks: MAX_CATCH_UP_TICKS,
            crew_autopilot: false,
        }
    }
}

impl SimConfig {
    #[must_use]
    pub fn tick_seconds(&self) -> f32 {
        1.0 / self.tick_rate_hz.max(1) as f32
    }

    // Clamp nonsensical values instead of rejecting them
    #[must_use]
    pub fn sanitized(mut self) -> Self {
        self.tick_rate_hz = self.tick_rate_hz.max(1);
        self.ai_interval_ticks = self.ai_interval_ticks.max(1);
        self.switch_hysteresis = self.switch_hysteresis.max(0.0);
        self.min_hit_chance = self.min_hit_chance.clamp(0.0, 1.0);
        self.max_hit_chance = self.max_hit_chance.clamp(self.min_hit_chance, 1.0);
        self.max_catch_up_ticks = self.max_catch_up_ticks.max(1);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_constants() {
        let config = SimConfig::default();
        assert_eq!(config.tick_rate_hz, 20);
        assert_eq!(config.ai_interval_ticks, 10);
        assert!((config.tick_seconds() - 0.05).abs() < 1e-6);
    }

    #[test]
    fn sanitized_repairs_inverted_clamp() {
        let config = SimConfig {
            min_hit_chance: 0.8,
            max_hit_chance: 0.2,
            tick_rate_hz: 0,
            ..SimConfig::default()
        }
        .sanitized();
        assert!(config.max_hit_chance >= config.min_hit_chance);
        assert_eq!(config.tick_rate_hz, 1);
    }

    #[cfg(feature = "json")]
    #[test]
    fn partial_json_fills_defaults() {
        let config: SimConfig = serde_json::from_str(r#"{ "crew_autopilot": true }"#).expect("valid json");
        assert!(config.crew_autopilot);
        assert_eq!(config.ai_interval_ticks, AI_INTERVAL_TICKS);
    }
}
