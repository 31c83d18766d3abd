// ============================================================================
// Clock
// ============================================================================

pub const TICK_RATE_HZ: u32 = 20;
pub const TICK_SECONDS: f32 = 1.0 / TICK_RATE_HZ as f32;
// Upper bound on ticks run for a single wall-clock frame (avoids a catch-up spiral after a stall)
pub const MAX_CATCH_UP_TICKS: u32 = 10;
// Safety cap used by headless runs
pub const DEFAULT_MAX_TICKS: u64 = 20 * 60 * 10; // ten minutes of simulated time

// ============================================================================
// AI & Perception
// ============================================================================

pub const AI_INTERVAL_TICKS: u64 = 10;
pub const TARGET_SWITCH_HYSTERESIS: f32 = 0.25; // challenger must score 25% higher

// Target scoring weights
pub const SCORE_IN_RANGE_BONUS: f32 = 0.4;
pub const SCORE_ATTACKING_ME_BONUS: f32 = 0.5;
pub const SCORE_DEFENDING_AGAINST_ME_BONUS: f32 = 0.3;
pub const SCORE_WOUNDED_WEIGHT: f32 = 0.3;

// Stealth can never shrink detection below this fraction of the watcher's vision
pub const MIN_DETECTION_FRACTION: f32 = 0.1;
pub const MAX_STEALTH: f32 = 0.9;

// ============================================================================
// Combat
// ============================================================================

pub const MIN_HIT_CHANCE: f32 = 0.05;
pub const MAX_HIT_CHANCE: f32 = 0.95;

// Multiplicative hit-chance reduction per cover height
pub const COVER_REDUCTION_LOW: f32 = 0.15;
pub const COVER_REDUCTION_HALF: f32 = 0.30;
pub const COVER_REDUCTION_HIGH: f32 = 0.45;
pub const COVER_REDUCTION_FULL: f32 = 0.60;

// Armor never reduces a hit below this much damage
pub const MIN_HIT_DAMAGE: i32 = 1;

// ============================================================================
// Actors
// ============================================================================

pub const DEFAULT_VISION: f32 = 8.0; // tiles
pub const DEFAULT_SPEED: f32 = 4.0; // tiles per second
pub const MAX_TECH: f32 = 0.75;

// ============================================================================
// Interactables
// ============================================================================

pub const DEFAULT_UNLOCK_TICKS: u32 = 40;
pub const DEFAULT_HACK_TICKS: u32 = 60;
pub const DEFAULT_DISARM_TICKS: u32 = 30;
pub const DEFAULT_HAZARD_RADIUS: f32 = 1.5;
pub const DEFAULT_HAZARD_DAMAGE: i32 = 4;

// ============================================================================
// Procedural Maps
// ============================================================================

pub const MIN_PROCEDURAL_SIZE: i32 = 8;
pub const MAX_PROCEDURAL_SIZE: i32 = 128;
pub const PROCEDURAL_WALL_DENSITY: f32 = 0.06;
pub const PROCEDURAL_PROP_DENSITY: f32 = 0.04;
pub const PROCEDURAL_MAX_ATTEMPTS: usize = 32;
pub const ENTRY_ZONE_SIZE: i32 = 3;
