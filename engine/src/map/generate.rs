use rand::Rng;
use std::collections::{HashSet, VecDeque};

use super::{CoverHeight, GameMap, MapBuild, Tile};
use crate::constants::*;
use crate::types::{Compass, GridPos};

// ============================================================================
// Reachability
// ============================================================================

// Check that every walkable tile can be reached from `start` using 8-way steps
#[must_use]
pub fn all_floor_reachable(map: &GameMap, start: GridPos) -> bool {
    if !map.is_walkable(start) {
        return false;
    }

    let target_count = map.walkable_count();
    let mut visited = HashSet::new();
    let mut queue = VecDeque::new();

    visited.insert(start);
    queue.push_back(start);

    while let Some(pos) = queue.pop_front() {
        for dir in Compass::ALL {
            let next = pos.step(dir);
            if map.is_walkable(next) && !visited.contains(&next) {
                visited.insert(next);
                queue.push_back(next);
            }
        }

        if visited.len() == target_count {
            return true;
        }
    }

    visited.len() == target_count
}

// ============================================================================
// Map Generation
// ============================================================================

fn entry_zone(width: i32, height: i32) -> Vec<GridPos> {
    let size_x = ENTRY_ZONE_SIZE.min(width - 2);
    let size_y = ENTRY_ZONE_SIZE.min(height - 2);
    (1..=size_y)
        .flat_map(|y| (1..=size_x).map(move |x| GridPos::new(x, y)))
        .collect()
}

// Obstacles keep one tile of clearance around the entry zone
fn near_entry(pos: GridPos, zone: &[GridPos]) -> bool {
    zone.iter().any(|entry| entry.chebyshev(pos) <= 1)
}

fn scatter_walls<R: Rng>(rng: &mut R, map: &mut GameMap, zone: &[GridPos]) {
    let interior = ((map.width() - 2) * (map.height() - 2)) as f32;
    let segments = ((interior * PROCEDURAL_WALL_DENSITY) / 3.0).ceil() as usize;

    for _ in 0..segments {
        let length = rng.random_range(2..=4);
        let horizontal = rng.random_bool(0.5);
        let start = GridPos::new(
            rng.random_range(1..map.width() - 1),
            rng.random_range(1..map.height() - 1),
        );
        for i in 0..length {
            let pos = if horizontal { start.offset(i, 0) } else { start.offset(0, i) };
            if map.is_walkable(pos) && !near_entry(pos, zone) {
                map.set_tile(pos, Tile::wall());
            }
        }
    }
}

fn scatter_props<R: Rng>(rng: &mut R, map: &mut GameMap, zone: &[GridPos]) {
    const HEIGHTS: [CoverHeight; 3] = [CoverHeight::Low, CoverHeight::Half, CoverHeight::High];

    let interior = ((map.width() - 2) * (map.height() - 2)) as f32;
    let props = (interior * PROCEDURAL_PROP_DENSITY).ceil() as usize;

    for _ in 0..props {
        let pos = GridPos::new(
            rng.random_range(1..map.width() - 1),
            rng.random_range(1..map.height() - 1),
        );
        if map.is_walkable(pos) && !near_entry(pos, zone) {
            let height = HEIGHTS[rng.random_range(0..HEIGHTS.len())];
            map.set_tile(pos, Tile::prop(height));
        }
    }
}

// Seeded procedural map: perimeter walls, scattered wall segments and cover props, and an entry
// zone in the north-west corner. Layouts that cut off floor are regenerated; after too many
// attempts the open room is used as-is.
pub fn generate_map<R: Rng>(rng: &mut R, width: i32, height: i32) -> MapBuild {
    let width = width.clamp(MIN_PROCEDURAL_SIZE, MAX_PROCEDURAL_SIZE);
    let height = height.clamp(MIN_PROCEDURAL_SIZE, MAX_PROCEDURAL_SIZE);
    let zone = entry_zone(width, height);

    for attempt in 0..PROCEDURAL_MAX_ATTEMPTS {
        let mut map = GameMap::walled(width, height);
        scatter_walls(rng, &mut map, &zone);
        scatter_props(rng, &mut map, &zone);
        map.rebuild_cover();

        if all_floor_reachable(&map, zone[0]) {
            tracing::debug!(attempt, width, height, "generated procedural map");
            return MapBuild {
                map,
                entry_zone: zone,
                features: Vec::new(),
            };
        }
    }

    tracing::warn!(width, height, "procedural generation kept isolating floor, using an open room");
    MapBuild {
        map: GameMap::walled(width, height),
        entry_zone: zone,
        features: Vec::new(),
    }
}
