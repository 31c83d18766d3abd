use serde::{Deserialize, Serialize};
use std::fmt;

// ============================================================================
// Identifiers
// ============================================================================

// Actor ID - index into the mission roster, stable for the mission's lifetime
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ActorId(pub u32);

impl ActorId {
    #[must_use]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for ActorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "actor#{}", self.0)
    }
}

// Interactable ID - index into the interactable roster
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct InteractableId(pub u32);

impl InteractableId {
    #[must_use]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for InteractableId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "interactable#{}", self.0)
    }
}

// ============================================================================
// Factions
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Faction {
    Crew,
    Enemy,
}

impl Faction {
    #[must_use]
    pub const fn opposing(self) -> Self {
        match self {
            Self::Crew => Self::Enemy,
            Self::Enemy => Self::Crew,
        }
    }
}

// ============================================================================
// Grid Coordinates
// ============================================================================

// Integer tile coordinate. X grows east, Y grows south (row order of map templates).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub struct GridPos {
    pub x: i32,
    pub y: i32,
}

impl GridPos {
    #[must_use]
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    #[must_use]
    pub const fn offset(self, dx: i32, dy: i32) -> Self {
        Self {
            x: self.x + dx,
            y: self.y + dy,
        }
    }

    #[must_use]
    pub const fn step(self, dir: Compass) -> Self {
        let (dx, dy) = dir.delta();
        self.offset(dx, dy)
    }

    #[must_use]
    pub const fn distance_sq(self, other: Self) -> i32 {
        let dx = other.x - self.x;
        let dy = other.y - self.y;
        dx * dx + dy * dy
    }

    #[must_use]
    pub fn distance(self, other: Self) -> f32 {
        (self.distance_sq(other) as f32).sqrt()
    }

    // King-move distance; adjacency means chebyshev <= 1
    #[must_use]
    pub const fn chebyshev(self, other: Self) -> i32 {
        let dx = (other.x - self.x).abs();
        let dy = (other.y - self.y).abs();
        if dx > dy { dx } else { dy }
    }

    #[must_use]
    pub const fn is_adjacent(self, other: Self) -> bool {
        self.chebyshev(other) <= 1
    }
}

impl fmt::Display for GridPos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

// ============================================================================
// Compass Directions
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Compass {
    North,
    NorthEast,
    East,
    SouthEast,
    South,
    SouthWest,
    West,
    NorthWest,
}

impl Compass {
    pub const ALL: [Self; 8] = [
        Self::North,
        Self::NorthEast,
        Self::East,
        Self::SouthEast,
        Self::South,
        Self::SouthWest,
        Self::West,
        Self::NorthWest,
    ];

    #[must_use]
    pub const fn delta(self) -> (i32, i32) {
        match self {
            Self::North => (0, -1),
            Self::NorthEast => (1, -1),
            Self::East => (1, 0),
            Self::SouthEast => (1, 1),
            Self::South => (0, 1),
            Self::SouthWest => (-1, 1),
            Self::West => (-1, 0),
            Self::NorthWest => (-1, -1),
        }
    }

    #[must_use]
    pub const fn opposite(self) -> Self {
        match self {
            Self::North => Self::South,
            Self::NorthEast => Self::SouthWest,
            Self::East => Self::West,
            Self::SouthEast => Self::NorthWest,
            Self::South => Self::North,
            Self::SouthWest => Self::NorthEast,
            Self::West => Self::East,
            Self::NorthWest => Self::SouthEast,
        }
    }

    // Bit used in per-tile cover masks
    #[must_use]
    pub const fn bit(self) -> u8 {
        1 << (self as u8)
    }

    // Unit step from a raw delta (signum of each axis). None when the delta is zero.
    #[must_use]
    pub const fn from_step(dx: i32, dy: i32) -> Option<Self> {
        match (dx.signum(), dy.signum()) {
            (0, -1) => Some(Self::North),
            (1, -1) => Some(Self::NorthEast),
            (1, 0) => Some(Self::East),
            (1, 1) => Some(Self::SouthEast),
            (0, 1) => Some(Self::South),
            (-1, 1) => Some(Self::SouthWest),
            (-1, 0) => Some(Self::West),
            (-1, -1) => Some(Self::NorthWest),
            _ => None,
        }
    }

    // Nearest of the eight compass directions to an arbitrary delta (45 degree sectors).
    #[must_use]
    pub fn from_bearing(dx: i32, dy: i32) -> Option<Self> {
        if dx == 0 && dy == 0 {
            return None;
        }
        let angle = (dy as f32).atan2(dx as f32);
        let octant = (angle / std::f32::consts::FRAC_PI_4).round() as i32;
        // Octant 0 is east; Y grows south so positive angles turn clockwise
        Some(match octant.rem_euclid(8) {
            0 => Self::East,
            1 => Self::SouthEast,
            2 => Self::South,
            3 => Self::SouthWest,
            4 => Self::West,
            5 => Self::NorthWest,
            6 => Self::North,
            _ => Self::NorthEast,
        })
    }

    #[must_use]
    pub const fn is_diagonal(self) -> bool {
        matches!(self, Self::NorthEast | Self::SouthEast | Self::SouthWest | Self::NorthWest)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(5, 0, Compass::East)]
    #[case(-3, 0, Compass::West)]
    #[case(0, -4, Compass::North)]
    #[case(0, 2, Compass::South)]
    #[case(3, 3, Compass::SouthEast)]
    #[case(-2, -2, Compass::NorthWest)]
    #[case(5, 1, Compass::East)]
    #[case(1, -5, Compass::North)]
    #[case(-4, 3, Compass::SouthWest)]
    fn bearing_picks_nearest_octant(#[case] dx: i32, #[case] dy: i32, #[case] expected: Compass) {
        assert_eq!(Compass::from_bearing(dx, dy), Some(expected));
    }

    #[test]
    fn bearing_of_zero_delta_is_none() {
        assert_eq!(Compass::from_bearing(0, 0), None);
        assert_eq!(Compass::from_step(0, 0), None);
    }

    #[test]
    fn opposite_is_an_involution_and_bits_are_distinct() {
        let mut mask = 0u8;
        for dir in Compass::ALL {
            assert_eq!(dir.opposite().opposite(), dir);
            assert_eq!(mask & dir.bit(), 0);
            mask |= dir.bit();
        }
        assert_eq!(mask, 0xFF);
    }

    #[test]
    fn step_follows_delta() {
        let origin = GridPos::new(4, 4);
        assert_eq!(origin.step(Compass::NorthEast), GridPos::new(5, 3));
        assert_eq!(Compass::from_step(7, -2), Some(Compass::NorthEast));
    }

    #[test]
    fn chebyshev_adjacency_includes_diagonals() {
        let a = GridPos::new(2, 2);
        assert!(a.is_adjacent(GridPos::new(3, 3)));
        assert!(a.is_adjacent(a));
        assert!(!a.is_adjacent(GridPos::new(4, 2)));
    }
}
