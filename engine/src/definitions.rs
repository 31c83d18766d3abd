use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use thiserror::Error;

use crate::actor::{ActorStats, UnitKind};
use crate::constants::*;

// ============================================================================
// Definition Types
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeaponDef {
    pub id: String,
    pub name: String,
    pub damage_min: i32,
    pub damage_max: i32,
    // Maximum engagement distance in tiles
    pub range: f32,
    // Base hit chance before aim, range and cover
    pub accuracy: f32,
    pub range_penalty_per_tile: f32,
    pub magazine: u32,
    #[serde(default)]
    pub reserve: u32,
    pub cooldown_ticks: u32,
    pub reload_ticks: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnemyDef {
    pub id: String,
    pub name: String,
    pub kind: UnitKind,
    pub stats: ActorStats,
    pub weapon: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "type")]
pub enum AbilityKind {
    Grenade { radius: f32, damage: i32 },
    Flashbang { radius: f32, stun_ticks: u32 },
    Medkit { heal: i32 },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AbilityDef {
    pub id: String,
    pub name: String,
    pub kind: AbilityKind,
    pub range: f32,
    pub delay_ticks: u32,
    pub cooldown_ticks: u32,
    pub charges: u32,
}

// ============================================================================
// Validation
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationIssue {
    pub subject: String,
    pub message: String,
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.subject, self.message)
    }
}

// Everything wrong with a definition set, collected in one pass
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationReport {
    pub errors: Vec<ValidationIssue>,
    pub warnings: Vec<ValidationIssue>,
}

impl ValidationReport {
    fn error(&mut self, subject: impl Into<String>, message: impl Into<String>) {
        self.errors.push(ValidationIssue {
            subject: subject.into(),
            message: message.into(),
        });
    }

    fn warn(&mut self, subject: impl Into<String>, message: impl Into<String>) {
        self.warnings.push(ValidationIssue {
            subject: subject.into(),
            message: message.into(),
        });
    }

    #[must_use]
    pub const fn is_ok(&self) -> bool {
        self.errors.is_empty()
    }
}

impl fmt::Display for ValidationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} error(s), {} warning(s)", self.errors.len(), self.warnings.len())?;
        for issue in &self.errors {
            write!(f, "\n  error: {issue}")?;
        }
        for issue in &self.warnings {
            write!(f, "\n  warning: {issue}")?;
        }
        Ok(())
    }
}

#[derive(Debug, Error)]
pub enum DefinitionError {
    #[error("invalid definitions: {0}")]
    Invalid(ValidationReport),
    #[error("unknown weapon '{0}'")]
    UnknownWeapon(String),
    #[error("unknown enemy definition '{0}'")]
    UnknownEnemy(String),
    #[error("unknown ability '{0}'")]
    UnknownAbility(String),
    #[cfg(feature = "json")]
    #[error("failed to parse definitions: {0}")]
    Parse(#[from] serde_json::Error),
}

fn validate_weapon(weapon: &WeaponDef, report: &mut ValidationReport) {
    let subject = format!("weapon '{}'", weapon.id);
    if weapon.damage_max <= 0 {
        report.error(&subject, "damage_max must be positive");
    }
    if weapon.damage_min < 0 || weapon.damage_min > weapon.damage_max {
        report.error(&subject, "damage_min must be within 0..=damage_max");
    }
    if weapon.range <= 0.0 {
        report.error(&subject, "range must be positive");
    }
    if !(0.0..=1.0).contains(&weapon.accuracy) {
        report.error(&subject, "accuracy must be within 0.0..=1.0");
    } else if weapon.accuracy > MAX_HIT_CHANCE {
        report.warn(&subject, "accuracy above the hit-chance ceiling is clamped");
    }
    if weapon.range_penalty_per_tile < 0.0 {
        report.error(&subject, "range_penalty_per_tile must not be negative");
    }
    if weapon.magazine == 0 {
        report.error(&subject, "magazine must hold at least one round");
    }
    if weapon.cooldown_ticks == 0 {
        report.warn(&subject, "zero cooldown fires every tick");
    }
}

fn validate_stats(subject: &str, stats: &ActorStats, report: &mut ValidationReport) {
    if stats.max_hp <= 0 {
        report.error(subject, "max_hp must be positive");
    }
    if stats.armor < 0 {
        report.error(subject, "armor must not be negative");
    }
    if stats.speed <= 0.0 {
        report.error(subject, "speed must be positive");
    }
    if stats.vision <= 0.0 {
        report.error(subject, "vision must be positive");
    }
    if !(0.0..=MAX_STEALTH).contains(&stats.stealth) {
        report.warn(subject, "stealth outside 0.0..=0.9 is clamped");
    }
    if !(0.0..=MAX_TECH).contains(&stats.tech) {
        report.warn(subject, "tech outside 0.0..=0.75 is clamped");
    }
}

fn validate_ability(ability: &AbilityDef, report: &mut ValidationReport) {
    let subject = format!("ability '{}'", ability.id);
    if ability.range <= 0.0 {
        report.error(&subject, "range must be positive");
    }
    match ability.kind {
        AbilityKind::Grenade { radius, damage } => {
            if radius <= 0.0 {
                report.error(&subject, "radius must be positive");
            }
            if damage <= 0 {
                report.error(&subject, "damage must be positive");
            }
        }
        AbilityKind::Flashbang { radius, stun_ticks } => {
            if radius <= 0.0 {
                report.error(&subject, "radius must be positive");
            }
            if stun_ticks == 0 {
                report.warn(&subject, "flashbang with zero stun has no effect");
            }
        }
        AbilityKind::Medkit { heal } => {
            if heal <= 0 {
                report.error(&subject, "heal must be positive");
            }
        }
    }
    if ability.charges == 0 {
        report.warn(&subject, "ability has no charges");
    }
}

// ============================================================================
// Definition Registry
// ============================================================================

// Serialized form: plain lists, ids checked for duplicates during validation
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DefinitionSet {
    pub weapons: Vec<WeaponDef>,
    pub enemies: Vec<EnemyDef>,
    pub abilities: Vec<AbilityDef>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Definitions {
    weapons: BTreeMap<String, WeaponDef>,
    enemies: BTreeMap<String, EnemyDef>,
    abilities: BTreeMap<String, AbilityDef>,
}

impl Definitions {
    // Validate a set on top of the current registry and merge it in. Fails with every problem
    // found; warnings are logged and returned.
    pub fn extend(&mut self, set: DefinitionSet) -> Result<ValidationReport, DefinitionError> {
        let mut merged = self.clone();
        let mut report = ValidationReport::default();
        // Overriding a registered id is fine; naming the same id twice in one set is not
        let mut seen = BTreeSet::new();

        for weapon in set.weapons {
            validate_weapon(&weapon, &mut report);
            if !seen.insert(("weapon", weapon.id.clone())) {
                report.error(format!("weapon '{}'", weapon.id), "duplicate id");
            }
            merged.weapons.insert(weapon.id.clone(), weapon);
        }
        for ability in set.abilities {
            validate_ability(&ability, &mut report);
            if !seen.insert(("ability", ability.id.clone())) {
                report.error(format!("ability '{}'", ability.id), "duplicate id");
            }
            merged.abilities.insert(ability.id.clone(), ability);
        }
        for enemy in set.enemies {
            let subject = format!("enemy '{}'", enemy.id);
            validate_stats(&subject, &enemy.stats, &mut report);
            if enemy.kind == UnitKind::Crew {
                report.error(&subject, "enemy definitions cannot use the crew kind");
            }
            if !merged.weapons.contains_key(&enemy.weapon) {
                report.error(&subject, format!("references unknown weapon '{}'", enemy.weapon));
            }
            if !seen.insert(("enemy", enemy.id.clone())) {
                report.error(subject, "duplicate id");
            }
            merged.enemies.insert(enemy.id.clone(), enemy);
        }

        for issue in &report.warnings {
            tracing::warn!("definition warning: {issue}");
        }

        if !report.is_ok() {
            return Err(DefinitionError::Invalid(report));
        }

        *self = merged;
        Ok(report)
    }

    pub fn from_set(set: DefinitionSet) -> Result<Self, DefinitionError> {
        let mut defs = Self::default();
        defs.extend(set)?;
        Ok(defs)
    }

    #[cfg(feature = "json")]
    pub fn from_json_str(text: &str) -> Result<Self, DefinitionError> {
        let set: DefinitionSet = serde_json::from_str(text)?;
        Self::from_set(set)
    }

    pub fn weapon(&self, id: &str) -> Result<&WeaponDef, DefinitionError> {
        self.weapons.get(id).ok_or_else(|| DefinitionError::UnknownWeapon(id.to_string()))
    }

    pub fn enemy(&self, id: &str) -> Result<&EnemyDef, DefinitionError> {
        self.enemies.get(id).ok_or_else(|| DefinitionError::UnknownEnemy(id.to_string()))
    }

    pub fn ability(&self, id: &str) -> Result<&AbilityDef, DefinitionError> {
        self.abilities.get(id).ok_or_else(|| DefinitionError::UnknownAbility(id.to_string()))
    }

    // Re-check the whole registry as it stands
    #[must_use]
    pub fn validate(&self) -> ValidationReport {
        let mut report = ValidationReport::default();
        for weapon in self.weapons.values() {
            validate_weapon(weapon, &mut report);
        }
        for ability in self.abilities.values() {
            validate_ability(ability, &mut report);
        }
        for enemy in self.enemies.values() {
            let subject = format!("enemy '{}'", enemy.id);
            validate_stats(&subject, &enemy.stats, &mut report);
            if enemy.kind == UnitKind::Crew {
                report.error(&subject, "enemy definitions cannot use the crew kind");
            }
            if !self.weapons.contains_key(&enemy.weapon) {
                report.error(subject, format!("references unknown weapon '{}'", enemy.weapon));
            }
        }
        report
    }

    #[must_use]
    pub fn weapon_ids(&self) -> Vec<&str> {
        self.weapons.keys().map(String::as_str).collect()
    }

    // Standard equipment and opposition
    #[must_use]
    pub fn builtin() -> Self {
        let weapons = vec![
            WeaponDef {
                id: "pistol".into(),
                name: "Service Pistol".into(),
                damage_min: 2,
                damage_max: 4,
                range: 6.0,
                accuracy: 0.75,
                range_penalty_per_tile: 0.04,
                magazine: 8,
                reserve: 24,
                cooldown_ticks: 10,
                reload_ticks: 20,
            },
            WeaponDef {
                id: "rifle".into(),
                name: "Assault Rifle".into(),
                damage_min: 3,
                damage_max: 6,
                range: 10.0,
                accuracy: 0.70,
                range_penalty_per_tile: 0.02,
                magazine: 12,
                reserve: 36,
                cooldown_ticks: 12,
                reload_ticks: 30,
            },
            WeaponDef {
                id: "shotgun".into(),
                name: "Breaching Shotgun".into(),
                damage_min: 5,
                damage_max: 9,
                range: 4.0,
                accuracy: 0.85,
                range_penalty_per_tile: 0.10,
                magazine: 4,
                reserve: 12,
                cooldown_ticks: 20,
                reload_ticks: 40,
            },
            WeaponDef {
                id: "smg".into(),
                name: "Compact SMG".into(),
                damage_min: 2,
                damage_max: 3,
                range: 7.0,
                accuracy: 0.65,
                range_penalty_per_tile: 0.03,
                magazine: 20,
                reserve: 60,
                cooldown_ticks: 5,
                reload_ticks: 25,
            },
        ];

        let enemies = vec![
            EnemyDef {
                id: "guard".into(),
                name: "Guard".into(),
                kind: UnitKind::Trooper,
                stats: ActorStats {
                    max_hp: 10,
                    armor: 0,
                    aim: 0.0,
                    ..ActorStats::default()
                },
                weapon: "pistol".into(),
            },
            EnemyDef {
                id: "heavy".into(),
                name: "Heavy Trooper".into(),
                kind: UnitKind::Trooper,
                stats: ActorStats {
                    max_hp: 18,
                    armor: 2,
                    aim: -0.05,
                    speed: 3.0,
                    ..ActorStats::default()
                },
                weapon: "rifle".into(),
            },
            EnemyDef {
                id: "drone".into(),
                name: "Security Drone".into(),
                kind: UnitKind::Drone,
                stats: ActorStats {
                    max_hp: 6,
                    armor: 1,
                    aim: 0.05,
                    speed: 5.0,
                    vision: 10.0,
                    ..ActorStats::default()
                },
                weapon: "smg".into(),
            },
        ];

        let abilities = vec![
            AbilityDef {
                id: "frag".into(),
                name: "Frag Grenade".into(),
                kind: AbilityKind::Grenade {
                    radius: 1.5,
                    damage: 6,
                },
                range: 6.0,
                delay_ticks: 20,
                cooldown_ticks: 40,
                charges: 2,
            },
            AbilityDef {
                id: "flashbang".into(),
                name: "Flashbang".into(),
                kind: AbilityKind::Flashbang {
                    radius: 2.0,
                    stun_ticks: 40,
                },
                range: 6.0,
                delay_ticks: 10,
                cooldown_ticks: 60,
                charges: 1,
            },
            AbilityDef {
                id: "medkit".into(),
                name: "Field Medkit".into(),
                kind: AbilityKind::Medkit { heal: 6 },
                range: 1.5,
                delay_ticks: 0,
                cooldown_ticks: 20,
                charges: 2,
            },
        ];

        let mut defs = Self::default();
        for weapon in weapons {
            defs.weapons.insert(weapon.id.clone(), weapon);
        }
        for enemy in enemies {
            defs.enemies.insert(enemy.id.clone(), enemy);
        }
        for ability in abilities {
            defs.abilities.insert(ability.id.clone(), ability);
        }
        defs
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn broken_weapon() -> WeaponDef {
        WeaponDef {
            id: "broken".into(),
            name: "Broken".into(),
            damage_min: 5,
            damage_max: 2,
            range: 0.0,
            accuracy: 1.5,
            range_penalty_per_tile: 0.0,
            magazine: 0,
            reserve: 0,
            cooldown_ticks: 5,
            reload_ticks: 5,
        }
    }

    #[test]
    fn builtin_set_is_valid() {
        let builtin = Definitions::builtin();
        let set = DefinitionSet {
            weapons: builtin.weapons.values().cloned().collect(),
            enemies: builtin.enemies.values().cloned().collect(),
            abilities: builtin.abilities.values().cloned().collect(),
        };
        let defs = Definitions::from_set(set).expect("builtin definitions validate");
        assert_eq!(defs, builtin);
    }

    #[test]
    fn builtin_registry_revalidates_cleanly() {
        let report = Definitions::builtin().validate();
        assert!(report.is_ok(), "{report}");
        assert!(report.errors.is_empty());
    }

    #[test]
    fn validation_accumulates_every_error() {
        let set = DefinitionSet {
            weapons: vec![broken_weapon()],
            enemies: vec![EnemyDef {
                id: "ghost".into(),
                name: "Ghost".into(),
                kind: UnitKind::Trooper,
                stats: ActorStats {
                    max_hp: 0,
                    ..ActorStats::default()
                },
                weapon: "railgun".into(),
            }],
            abilities: Vec::new(),
        };

        let Err(DefinitionError::Invalid(report)) = Definitions::from_set(set) else {
            panic!("expected validation failure");
        };
        // damage range, range, accuracy, magazine, max_hp, unknown weapon
        assert_eq!(report.errors.len(), 6, "{report}");
    }

    #[test]
    fn duplicate_ids_in_one_set_are_rejected() {
        let weapon = Definitions::builtin().weapon("pistol").expect("builtin pistol").clone();
        let set = DefinitionSet {
            weapons: vec![weapon.clone(), weapon],
            ..DefinitionSet::default()
        };
        let Err(DefinitionError::Invalid(report)) = Definitions::from_set(set) else {
            panic!("expected duplicate rejection");
        };
        assert!(report.errors.iter().any(|issue| issue.message == "duplicate id"));
    }

    #[test]
    fn duplicate_overrides_of_a_builtin_are_rejected() {
        let mut defs = Definitions::builtin();
        let pistol = defs.weapon("pistol").expect("builtin pistol").clone();
        let guard = defs.enemy("guard").expect("builtin guard").clone();
        let set = DefinitionSet {
            weapons: vec![pistol.clone(), pistol],
            enemies: vec![guard.clone(), guard],
            ..DefinitionSet::default()
        };

        let before = defs.clone();
        let Err(DefinitionError::Invalid(report)) = defs.extend(set) else {
            panic!("expected duplicate rejection");
        };
        let subjects: Vec<&str> = report
            .errors
            .iter()
            .filter(|issue| issue.message == "duplicate id")
            .map(|issue| issue.subject.as_str())
            .collect();
        assert_eq!(subjects, vec!["weapon 'pistol'", "enemy 'guard'"]);
        assert_eq!(defs, before);
    }

    #[test]
    fn extend_can_override_builtins_and_keeps_registry_on_failure() {
        let mut defs = Definitions::builtin();
        let mut pistol = defs.weapon("pistol").expect("builtin pistol").clone();
        pistol.damage_max = 5;
        defs.extend(DefinitionSet {
            weapons: vec![pistol],
            ..DefinitionSet::default()
        })
        .expect("override validates");
        assert_eq!(defs.weapon("pistol").expect("pistol").damage_max, 5);

        let before = defs.clone();
        assert!(
            defs.extend(DefinitionSet {
                weapons: vec![broken_weapon()],
                ..DefinitionSet::default()
            })
            .is_err()
        );
        assert_eq!(defs, before);
    }

    #[test]
    fn warnings_do_not_block() {
        let mut weapon = Definitions::builtin().weapon("rifle").expect("rifle").clone();
        weapon.id = "laser".into();
        weapon.accuracy = 0.99;
        let report = Definitions::builtin()
            .extend(DefinitionSet {
                weapons: vec![weapon],
                ..DefinitionSet::default()
            })
            .expect("warnings only");
        assert_eq!(report.warnings.len(), 1);
    }

    #[test]
    fn unknown_lookups_are_typed_errors() {
        let defs = Definitions::builtin();
        assert!(matches!(defs.weapon("nope"), Err(DefinitionError::UnknownWeapon(_))));
        assert!(matches!(defs.enemy("nope"), Err(DefinitionError::UnknownEnemy(_))));
        assert!(matches!(defs.ability("nope"), Err(DefinitionError::UnknownAbility(_))));
    }

    #[cfg(feature = "json")]
    #[test]
    fn loads_from_json() {
        let text = r#"{
            "weapons": [{
                "id": "dart", "name": "Dart Gun", "damage_min": 1, "damage_max": 2, "range": 5.0,
                "accuracy": 0.8, "range_penalty_per_tile": 0.05, "magazine": 6, "cooldown_ticks": 8,
                "reload_ticks": 16
            }],
            "abilities": [{
                "id": "bang", "name": "Bang", "kind": { "type": "grenade", "radius": 2.0, "damage": 3 },
                "range": 4.0, "delay_ticks": 10, "cooldown_ticks": 10, "charges": 1
            }]
        }"#;
        let defs = Definitions::from_json_str(text).expect("valid json definitions");
        assert_eq!(defs.weapon("dart").expect("dart").reserve, 0);
        assert!(defs.ability("bang").is_ok());
    }
}
