use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::config::SimConfig;
use crate::constants::*;
use crate::definitions::WeaponDef;
use crate::map::CoverHeight;
use crate::types::{ActorId, Faction};

// ============================================================================
// Hit Chance & Damage
// ============================================================================

// clamp(accuracy + aim - range penalty, min, max), then reduced multiplicatively by cover
#[must_use]
pub fn hit_chance(weapon: &WeaponDef, aim: f32, distance: f32, cover: CoverHeight, config: &SimConfig) -> f32 {
    let raw = weapon.accuracy + aim - weapon.range_penalty_per_tile * distance;
    let clamped = raw.clamp(config.min_hit_chance, config.max_hit_chance);
    clamped * (1.0 - cover.reduction())
}

// One draw from the shared stream
pub fn roll_hit<R: Rng>(rng: &mut R, chance: f32) -> bool {
    rng.random::<f32>() < chance
}

// Weapon damage roll minus armor, never below the minimum
pub fn roll_damage<R: Rng>(rng: &mut R, weapon: &WeaponDef, armor: i32) -> i32 {
    let low = weapon.damage_min.min(weapon.damage_max);
    let high = weapon.damage_max.max(low);
    let rolled = rng.random_range(low..=high);
    (rolled - armor.max(0)).max(MIN_HIT_DAMAGE)
}

// ============================================================================
// Results & Stats
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AttackResult {
    pub tick: u64,
    pub attacker: ActorId,
    pub target: ActorId,
    pub hit: bool,
    pub chance: f32,
    pub damage: i32,
    pub cover: CoverHeight,
    pub distance: f32,
    pub killed: bool,
    // Fired as return fire rather than on a manual order
    pub auto_defend: bool,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CombatStats {
    pub shots: u32,
    pub hits: u32,
    pub damage_dealt: i32,
    pub kills: u32,
}

impl CombatStats {
    #[must_use]
    pub fn accuracy(&self) -> f32 {
        if self.shots == 0 {
            return 0.0;
        }
        self.hits as f32 / self.shots as f32
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FactionStats {
    pub crew: CombatStats,
    pub enemy: CombatStats,
}

impl FactionStats {
    #[must_use]
    pub const fn get(&self, faction: Faction) -> &CombatStats {
        match faction {
            Faction::Crew => &self.crew,
            Faction::Enemy => &self.enemy,
        }
    }

    pub const fn get_mut(&mut self, faction: Faction) -> &mut CombatStats {
        match faction {
            Faction::Crew => &mut self.crew,
            Faction::Enemy => &mut self.enemy,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::definitions::Definitions;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn rifle() -> WeaponDef {
        Definitions::builtin().weapon("rifle").expect("builtin rifle").clone()
    }

    #[test]
    fn hit_chance_strictly_decreases_with_cover() {
        let weapon = rifle();
        let config = SimConfig::default();
        let chances: Vec<f32> = [CoverHeight::None, CoverHeight::Low, CoverHeight::Half, CoverHeight::High]
            .into_iter()
            .map(|cover| hit_chance(&weapon, 0.0, 4.0, cover, &config))
            .collect();
        for pair in chances.windows(2) {
            assert!(pair[0] > pair[1], "{chances:?}");
        }
    }

    #[test]
    fn hit_chance_strictly_decreases_with_range() {
        let weapon = rifle();
        let config = SimConfig::default();
        let mut previous = f32::MAX;
        for distance in 1..=10 {
            let chance = hit_chance(&weapon, 0.0, distance as f32, CoverHeight::None, &config);
            assert!(chance < previous);
            previous = chance;
        }
    }

    #[test]
    fn hit_chance_is_clamped_before_cover() {
        let weapon = rifle();
        let config = SimConfig::default();
        let point_blank = hit_chance(&weapon, 1.0, 0.0, CoverHeight::None, &config);
        assert!((point_blank - MAX_HIT_CHANCE).abs() < 1e-6);
        let hopeless = hit_chance(&weapon, -1.0, 50.0, CoverHeight::Half, &config);
        assert!((hopeless - MIN_HIT_CHANCE * 0.7).abs() < 1e-6);
    }

    #[test]
    fn damage_respects_armor_floor() {
        let weapon = rifle();
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        for _ in 0..50 {
            let damage = roll_damage(&mut rng, &weapon, 0);
            assert!((weapon.damage_min..=weapon.damage_max).contains(&damage));
            assert_eq!(roll_damage(&mut rng, &weapon, 100), MIN_HIT_DAMAGE);
        }
    }

    #[test]
    fn certain_and_impossible_rolls() {
        let mut rng = ChaCha8Rng::seed_from_u64(11);
        for _ in 0..100 {
            assert!(roll_hit(&mut rng, 1.0));
            assert!(!roll_hit(&mut rng, 0.0));
        }
    }
}
