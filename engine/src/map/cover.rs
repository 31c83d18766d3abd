use serde::{Deserialize, Serialize};

use super::{GameMap, Terrain};
use crate::constants::*;
use crate::types::{Compass, GridPos};

// ============================================================================
// Cover Heights
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CoverHeight {
    #[default]
    None,
    Low,
    Half,
    High,
    Full,
}

impl CoverHeight {
    // Multiplicative reduction applied to the attacker's hit chance
    #[must_use]
    pub const fn reduction(self) -> f32 {
        match self {
            Self::None => 0.0,
            Self::Low => COVER_REDUCTION_LOW,
            Self::Half => COVER_REDUCTION_HALF,
            Self::High => COVER_REDUCTION_HIGH,
            Self::Full => COVER_REDUCTION_FULL,
        }
    }

    // Glyph used by map templates for partial-cover props
    #[must_use]
    pub const fn from_glyph(glyph: char) -> Option<Self> {
        match glyph {
            '-' => Some(Self::Low),
            '=' => Some(Self::Half),
            '+' => Some(Self::High),
            _ => None,
        }
    }
}

// ============================================================================
// Cover Projection
// ============================================================================

// Which compass directions a tile projects cover toward. Walls and props project toward every
// adjacent walkable tile, so closed doors receive none; open floor and void project nothing.
#[must_use]
pub fn projection_mask(map: &GameMap, pos: GridPos) -> u8 {
    let tile = map.tile(pos);
    let is_cover_source = match tile.terrain {
        Terrain::Wall => true,
        Terrain::Floor => tile.cover_height != CoverHeight::None,
        Terrain::Void => false,
    };
    if !is_cover_source {
        return 0;
    }

    Compass::ALL.iter().fold(0, |mask, dir| {
        if map.is_walkable(pos.step(*dir)) { mask | dir.bit() } else { mask }
    })
}

// Cover a defender enjoys against a specific attacker. Looks at the tile adjacent to the
// defender in the attacker's compass direction and asks whether it projects cover back.
#[must_use]
pub fn cover_against(map: &GameMap, defender: GridPos, attacker: GridPos) -> CoverHeight {
    let Some(dir) = Compass::from_bearing(attacker.x - defender.x, attacker.y - defender.y) else {
        return CoverHeight::None;
    };

    let cover_pos = defender.step(dir);
    // Point-blank: the attacker is standing on the would-be cover tile
    if cover_pos == attacker {
        return CoverHeight::None;
    }

    let tile = map.tile(cover_pos);
    if !tile.projects_cover_toward(dir.opposite()) {
        return CoverHeight::None;
    }

    match tile.terrain {
        Terrain::Wall => CoverHeight::Full,
        Terrain::Floor => tile.cover_height,
        Terrain::Void => CoverHeight::None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::map::Tile;
    use rstest::rstest;

    fn map_with_wall_at(wall: GridPos) -> GameMap {
        let mut map = GameMap::walled(12, 9);
        map.set_tile(wall, Tile::wall());
        map.rebuild_cover();
        map
    }

    #[test]
    fn wall_projects_cover_toward_open_neighbours() {
        let wall = GridPos::new(5, 4);
        let map = map_with_wall_at(wall);
        let tile = map.tile(wall);
        assert!(tile.projects_cover_toward(Compass::East));
        assert!(tile.projects_cover_toward(Compass::West));
        assert!(tile.projects_cover_toward(Compass::NorthEast));
    }

    #[test]
    fn perimeter_wall_does_not_project_outward() {
        let map = GameMap::walled(6, 6);
        let west_edge = map.tile(GridPos::new(0, 3));
        assert!(west_edge.projects_cover_toward(Compass::East));
        assert!(!west_edge.projects_cover_toward(Compass::West));
    }

    #[test]
    fn defender_behind_wall_has_full_cover_and_is_flanked_from_the_other_side() {
        let wall = GridPos::new(5, 4);
        let map = map_with_wall_at(wall);
        let defender = GridPos::new(6, 4);

        assert_eq!(cover_against(&map, defender, GridPos::new(2, 4)), CoverHeight::Full);
        assert_eq!(cover_against(&map, defender, GridPos::new(10, 4)), CoverHeight::None);
    }

    #[rstest]
    #[case(CoverHeight::Low)]
    #[case(CoverHeight::Half)]
    #[case(CoverHeight::High)]
    fn props_report_their_height(#[case] height: CoverHeight) {
        let mut map = GameMap::walled(10, 10);
        map.set_tile(GridPos::new(4, 4), Tile::prop(height));
        map.rebuild_cover();

        let defender = GridPos::new(4, 5);
        assert_eq!(cover_against(&map, defender, GridPos::new(4, 1)), height);
        assert_eq!(cover_against(&map, defender, GridPos::new(4, 8)), CoverHeight::None);
    }

    #[test]
    fn closed_doors_receive_no_cover_until_opened() {
        let mut map = GameMap::walled(8, 5);
        let wall = GridPos::new(3, 2);
        let door = GridPos::new(4, 2);
        map.set_tile(wall, Tile::wall());
        map.rebuild_cover();
        map.set_sealed(door, true);
        assert!(!map.tile(wall).projects_cover_toward(Compass::East));
        assert_eq!(cover_against(&map, door, GridPos::new(1, 2)), CoverHeight::None);

        map.set_sealed(door, false);
        assert!(map.tile(wall).projects_cover_toward(Compass::East));
        assert_eq!(cover_against(&map, door, GridPos::new(1, 2)), CoverHeight::Full);
    }

    #[test]
    fn out_of_bounds_defender_has_no_cover() {
        let map = GameMap::walled(5, 5);
        assert_eq!(cover_against(&map, GridPos::new(-3, -3), GridPos::new(2, 2)), CoverHeight::None);
    }

    #[test]
    fn reductions_increase_with_height() {
        let order = [
            CoverHeight::None,
            CoverHeight::Low,
            CoverHeight::Half,
            CoverHeight::High,
            CoverHeight::Full,
        ];
        for pair in order.windows(2) {
            assert!(pair[0].reduction() < pair[1].reduction());
        }
    }
}
