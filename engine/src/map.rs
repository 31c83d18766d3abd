pub mod cover;
pub mod generate;
pub mod template;

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::types::{Compass, GridPos, InteractableId};

pub use cover::{CoverHeight, cover_against};
pub use generate::generate_map;
pub use template::{MapBuild, parse_template};

// ============================================================================
// Tiles
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Terrain {
    Floor,
    Wall,
    #[default]
    Void,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Tile {
    pub terrain: Terrain,
    // Bit per compass direction this tile projects cover toward
    pub cover_mask: u8,
    // Partial-cover prop standing on this tile (None for open floor and walls)
    pub cover_height: CoverHeight,
    // Closed or locked door occupying this tile
    pub sealed: bool,
}

impl Tile {
    #[must_use]
    pub const fn floor() -> Self {
        Self {
            terrain: Terrain::Floor,
            cover_mask: 0,
            cover_height: CoverHeight::None,
            sealed: false,
        }
    }

    #[must_use]
    pub const fn wall() -> Self {
        Self {
            terrain: Terrain::Wall,
            cover_mask: 0,
            cover_height: CoverHeight::None,
            sealed: false,
        }
    }

    #[must_use]
    pub const fn prop(height: CoverHeight) -> Self {
        Self {
            terrain: Terrain::Floor,
            cover_mask: 0,
            cover_height: height,
            sealed: false,
        }
    }

    // Actors can stand here: open floor without a prop or a closed door
    #[must_use]
    pub const fn is_walkable(&self) -> bool {
        matches!(self.terrain, Terrain::Floor) && matches!(self.cover_height, CoverHeight::None) && !self.sealed
    }

    // Sight stops at walls, void and closed doors. Partial cover does not block sight.
    #[must_use]
    pub const fn blocks_sight(&self) -> bool {
        !matches!(self.terrain, Terrain::Floor) || self.sealed
    }

    #[must_use]
    pub const fn projects_cover_toward(&self, dir: Compass) -> bool {
        self.cover_mask & dir.bit() != 0
    }
}

// ============================================================================
// Game Map
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub struct GameMap {
    width: i32,
    height: i32,
    tiles: Vec<Tile>,
    interactables: BTreeMap<GridPos, InteractableId>,
}

impl GameMap {
    // Map of the given size filled with void
    #[must_use]
    pub fn new(width: i32, height: i32) -> Self {
        let width = width.max(0);
        let height = height.max(0);
        Self {
            width,
            height,
            tiles: vec![Tile::default(); (width * height) as usize],
            interactables: BTreeMap::new(),
        }
    }

    // Open floor surrounded by a wall ring
    #[must_use]
    pub fn walled(width: i32, height: i32) -> Self {
        let mut map = Self::new(width, height);
        for y in 0..map.height {
            for x in 0..map.width {
                let edge = x == 0 || y == 0 || x == map.width - 1 || y == map.height - 1;
                let tile = if edge { Tile::wall() } else { Tile::floor() };
                map.set_tile(GridPos::new(x, y), tile);
            }
        }
        map.rebuild_cover();
        map
    }

    #[must_use]
    pub const fn width(&self) -> i32 {
        self.width
    }

    #[must_use]
    pub const fn height(&self) -> i32 {
        self.height
    }

    #[must_use]
    pub const fn in_bounds(&self, pos: GridPos) -> bool {
        pos.x >= 0 && pos.y >= 0 && pos.x < self.width && pos.y < self.height
    }

    const fn index(&self, pos: GridPos) -> usize {
        (pos.y * self.width + pos.x) as usize
    }

    // Out-of-bounds queries read as void
    #[must_use]
    pub fn tile(&self, pos: GridPos) -> Tile {
        if self.in_bounds(pos) {
            self.tiles[self.index(pos)]
        } else {
            Tile::default()
        }
    }

    pub fn set_tile(&mut self, pos: GridPos, tile: Tile) {
        if self.in_bounds(pos) {
            let idx = self.index(pos);
            self.tiles[idx] = tile;
        }
    }

    #[must_use]
    pub fn terrain(&self, pos: GridPos) -> Terrain {
        self.tile(pos).terrain
    }

    #[must_use]
    pub fn is_walkable(&self, pos: GridPos) -> bool {
        self.tile(pos).is_walkable()
    }

    #[must_use]
    pub fn blocks_sight(&self, pos: GridPos) -> bool {
        self.tile(pos).blocks_sight()
    }

    #[must_use]
    pub fn cover_height(&self, pos: GridPos) -> CoverHeight {
        self.tile(pos).cover_height
    }

    // Doors toggle this; sealed tiles block movement and sight. Neighbouring cover masks follow.
    pub fn set_sealed(&mut self, pos: GridPos, sealed: bool) {
        if !self.in_bounds(pos) {
            return;
        }
        let idx = self.index(pos);
        if self.tiles[idx].sealed == sealed {
            return;
        }
        self.tiles[idx].sealed = sealed;

        for dir in Compass::ALL {
            let neighbor = pos.step(dir);
            if self.in_bounds(neighbor) {
                let mask = cover::projection_mask(self, neighbor);
                let idx = self.index(neighbor);
                self.tiles[idx].cover_mask = mask;
            }
        }
    }

    #[must_use]
    pub fn interactable_at(&self, pos: GridPos) -> Option<InteractableId> {
        self.interactables.get(&pos).copied()
    }

    pub fn register_interactable(&mut self, pos: GridPos, id: InteractableId) {
        if self.in_bounds(pos) {
            self.interactables.insert(pos, id);
        }
    }

    // Iterate every coordinate in row-major order
    pub fn positions(&self) -> impl Iterator<Item = GridPos> + '_ {
        (0..self.height).flat_map(move |y| (0..self.width).map(move |x| GridPos::new(x, y)))
    }

    #[must_use]
    pub fn walkable_count(&self) -> usize {
        self.tiles.iter().filter(|tile| tile.is_walkable()).count()
    }

    // Recompute every tile's cover mask. Call after editing terrain or props.
    pub fn rebuild_cover(&mut self) {
        let masks: Vec<u8> = self.positions().map(|pos| cover::projection_mask(self, pos)).collect();
        for (tile, mask) in self.tiles.iter_mut().zip(masks) {
            tile.cover_mask = mask;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn out_of_bounds_reads_as_void() {
        let map = GameMap::walled(5, 5);
        let outside = GridPos::new(-1, 2);
        assert_eq!(map.terrain(outside), Terrain::Void);
        assert!(!map.is_walkable(outside));
        assert!(map.blocks_sight(outside));
        assert_eq!(map.cover_height(GridPos::new(9, 9)), CoverHeight::None);
    }

    #[test]
    fn walled_map_has_floor_inside() {
        let map = GameMap::walled(5, 4);
        assert_eq!(map.terrain(GridPos::new(0, 0)), Terrain::Wall);
        assert!(map.is_walkable(GridPos::new(2, 2)));
        assert_eq!(map.walkable_count(), 3 * 2);
    }

    #[test]
    fn sealed_tile_blocks_movement_and_sight() {
        let mut map = GameMap::walled(5, 5);
        let door = GridPos::new(2, 2);
        map.set_sealed(door, true);
        assert!(!map.is_walkable(door));
        assert!(map.blocks_sight(door));
        map.set_sealed(door, false);
        assert!(map.is_walkable(door));
    }

    #[test]
    fn props_block_movement_but_not_sight() {
        let mut map = GameMap::walled(6, 6);
        let crate_pos = GridPos::new(3, 3);
        map.set_tile(crate_pos, Tile::prop(CoverHeight::Half));
        assert!(!map.is_walkable(crate_pos));
        assert!(!map.blocks_sight(crate_pos));
    }
}
