use serde::{Deserialize, Serialize};

use crate::map::GameMap;
use crate::types::GridPos;

// ============================================================================
// Line Rasterization
// ============================================================================

// Bresenham raster from `from` to `to`, both endpoints included
#[must_use]
pub fn raster_line(from: GridPos, to: GridPos) -> Vec<GridPos> {
    let dx = (to.x - from.x).abs();
    let dy = -(to.y - from.y).abs();
    let sx = if from.x < to.x { 1 } else { -1 };
    let sy = if from.y < to.y { 1 } else { -1 };

    let mut points = Vec::with_capacity((dx.max(-dy) + 1) as usize);
    let mut err = dx + dy;
    let mut current = from;

    loop {
        points.push(current);
        if current == to {
            break;
        }
        let doubled = 2 * err;
        if doubled >= dy {
            err += dy;
            current.x += sx;
        }
        if doubled <= dx {
            err += dx;
            current.y += sy;
        }
    }

    points
}

// True when no tile strictly between the endpoints blocks sight. The endpoints themselves never
// block, so a wall can be seen but nothing behind it can.
#[must_use]
pub fn has_line_of_sight(map: &GameMap, from: GridPos, to: GridPos) -> bool {
    let line = raster_line(from, to);
    let inner = line.len().saturating_sub(1);
    line.iter().take(inner).skip(1).all(|pos| !map.blocks_sight(*pos))
}

// Within a circular radius and with clear line of sight
#[must_use]
pub fn can_see(map: &GameMap, from: GridPos, to: GridPos, radius: f32) -> bool {
    from.distance_sq(to) as f32 <= radius * radius && has_line_of_sight(map, from, to)
}

// ============================================================================
// Fog of War
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Visibility {
    #[default]
    Unknown,
    Revealed,
    Visible,
}

// Per-tile tri-state memory of what the friendly faction has observed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VisibilityGrid {
    width: i32,
    height: i32,
    cells: Vec<Visibility>,
}

impl VisibilityGrid {
    #[must_use]
    pub fn new(width: i32, height: i32) -> Self {
        let width = width.max(0);
        let height = height.max(0);
        Self {
            width,
            height,
            cells: vec![Visibility::Unknown; (width * height) as usize],
        }
    }

    const fn index(&self, pos: GridPos) -> Option<usize> {
        if pos.x >= 0 && pos.y >= 0 && pos.x < self.width && pos.y < self.height {
            Some((pos.y * self.width + pos.x) as usize)
        } else {
            None
        }
    }

    #[must_use]
    pub fn get(&self, pos: GridPos) -> Visibility {
        self.index(pos).map_or(Visibility::Unknown, |idx| self.cells[idx])
    }

    #[must_use]
    pub fn is_visible(&self, pos: GridPos) -> bool {
        self.get(pos) == Visibility::Visible
    }

    #[must_use]
    pub fn count(&self, state: Visibility) -> usize {
        self.cells.iter().filter(|cell| **cell == state).count()
    }

    // Recompute from the given observers (position, vision radius). Tiles seen now become
    // Visible; tiles that were Visible but are not seen now degrade to Revealed.
    pub fn recompute(&mut self, map: &GameMap, observers: &[(GridPos, f32)]) {
        let mut seen = vec![false; self.cells.len()];

        for (origin, radius) in observers {
            let reach = radius.max(0.0).ceil() as i32;
            let radius_sq = radius * radius;
            for dy in -reach..=reach {
                for dx in -reach..=reach {
                    if (dx * dx + dy * dy) as f32 > radius_sq {
                        continue;
                    }
                    let candidate = origin.offset(dx, dy);
                    let Some(idx) = self.index(candidate) else {
                        continue;
                    };
                    if seen[idx] {
                        continue;
                    }
                    if has_line_of_sight(map, *origin, candidate) {
                        seen[idx] = true;
                    }
                }
            }
        }

        for (cell, now) in self.cells.iter_mut().zip(seen) {
            *cell = match (*cell, now) {
                (_, true) => Visibility::Visible,
                (Visibility::Visible, false) => Visibility::Revealed,
                (other, false) => other,
            };
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::map::Tile;

    fn map_with_wall(wall: GridPos) -> GameMap {
        let mut map = GameMap::walled(12, 10);
        map.set_tile(wall, Tile::wall());
        map.rebuild_cover();
        map
    }

    #[test]
    fn raster_includes_both_endpoints() {
        let line = raster_line(GridPos::new(1, 1), GridPos::new(5, 3));
        assert_eq!(line.first(), Some(&GridPos::new(1, 1)));
        assert_eq!(line.last(), Some(&GridPos::new(5, 3)));
        assert_eq!(line.len(), 5);
        assert_eq!(raster_line(GridPos::new(2, 2), GridPos::new(2, 2)), vec![GridPos::new(2, 2)]);
    }

    #[test]
    fn single_wall_blocks_its_row_but_not_a_parallel_row() {
        let map = map_with_wall(GridPos::new(5, 4));
        assert!(!has_line_of_sight(&map, GridPos::new(2, 4), GridPos::new(8, 4)));
        assert!(has_line_of_sight(&map, GridPos::new(2, 5), GridPos::new(8, 5)));
    }

    #[test]
    fn blocking_tile_is_visible_but_beyond_is_not() {
        let map = map_with_wall(GridPos::new(5, 4));
        assert!(has_line_of_sight(&map, GridPos::new(2, 4), GridPos::new(5, 4)));
        assert!(!has_line_of_sight(&map, GridPos::new(2, 4), GridPos::new(6, 4)));
    }

    #[test]
    fn closed_door_blocks_sight() {
        let mut map = GameMap::walled(10, 5);
        map.set_sealed(GridPos::new(5, 2), true);
        assert!(!has_line_of_sight(&map, GridPos::new(2, 2), GridPos::new(8, 2)));
        map.set_sealed(GridPos::new(5, 2), false);
        assert!(has_line_of_sight(&map, GridPos::new(2, 2), GridPos::new(8, 2)));
    }

    #[test]
    fn can_see_respects_radius() {
        let map = GameMap::walled(20, 5);
        assert!(can_see(&map, GridPos::new(1, 2), GridPos::new(5, 2), 4.0));
        assert!(!can_see(&map, GridPos::new(1, 2), GridPos::new(6, 2), 4.0));
    }

    #[test]
    fn fog_degrades_to_revealed_when_observer_leaves() {
        let map = GameMap::walled(30, 5);
        let mut grid = VisibilityGrid::new(map.width(), map.height());
        let far = GridPos::new(25, 2);

        assert_eq!(grid.get(GridPos::new(3, 2)), Visibility::Unknown);
        grid.recompute(&map, &[(GridPos::new(2, 2), 3.0)]);
        assert!(grid.is_visible(GridPos::new(3, 2)));
        assert_eq!(grid.get(far), Visibility::Unknown);

        grid.recompute(&map, &[(GridPos::new(24, 2), 3.0)]);
        assert_eq!(grid.get(GridPos::new(3, 2)), Visibility::Revealed);
        assert!(grid.is_visible(far));

        // No observers: everything seen degrades, nothing is forgotten
        grid.recompute(&map, &[]);
        assert_eq!(grid.get(far), Visibility::Revealed);
        assert_eq!(grid.count(Visibility::Visible), 0);
    }

    #[test]
    fn out_of_bounds_reads_unknown() {
        let grid = VisibilityGrid::new(4, 4);
        assert_eq!(grid.get(GridPos::new(-1, 0)), Visibility::Unknown);
    }
}
