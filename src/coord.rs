//! Grid coordinates and the nine movement directions.

use serde::{Deserialize, Serialize};

/// An integer grid position `(x, y)`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Coord {
    /// Column, grows rightward.
    pub x: i32,
    /// Row, grows downward.
    pub y: i32,
}

impl Coord {
    /// Creates a new coordinate.
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Componentwise addition.
    pub fn add(self, other: Coord) -> Coord {
        Coord::new(self.x + other.x, self.y + other.y)
    }

    /// Squared Euclidean distance to `other`. Kept as an integer to avoid
    /// float rounding inside neighborhood-membership tests.
    pub fn dist_sq(self, other: Coord) -> i64 {
        let dx = (self.x - other.x) as i64;
        let dy = (self.y - other.y) as i64;
        dx * dx + dy * dy
    }

    /// Euclidean distance to `other`.
    pub fn dist(self, other: Coord) -> f64 {
        (self.dist_sq(other) as f64).sqrt()
    }

    /// Manhattan distance to `other`.
    pub fn manhattan_dist(self, other: Coord) -> i64 {
        ((self.x - other.x).abs() + (self.y - other.y).abs()) as i64
    }
}

/// One of the eight compass directions, or `Center` (no movement).
///
/// `Center` maps to `(0, 0)` and is a fixed point of every rotation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    /// No movement / no heading.
    Center,
    North,
    NorthEast,
    East,
    SouthEast,
    South,
    SouthWest,
    West,
    NorthWest,
}

impl Direction {
    const RING: [Direction; 8] = [
        Direction::North,
        Direction::NorthEast,
        Direction::East,
        Direction::SouthEast,
        Direction::South,
        Direction::SouthWest,
        Direction::West,
        Direction::NorthWest,
    ];

    /// Index of this direction within the 8-point compass ring, or `None`
    /// for `Center`.
    fn ring_index(self) -> Option<usize> {
        Self::RING.iter().position(|d| *d == self)
    }

    /// Maps to a unit (or zero, for `Center`) coordinate offset.
    pub fn as_unit_coord(self) -> Coord {
        match self {
            Direction::Center => Coord::new(0, 0),
            Direction::North => Coord::new(0, -1),
            Direction::NorthEast => Coord::new(1, -1),
            Direction::East => Coord::new(1, 0),
            Direction::SouthEast => Coord::new(1, 1),
            Direction::South => Coord::new(0, 1),
            Direction::SouthWest => Coord::new(-1, 1),
            Direction::West => Coord::new(-1, 0),
            Direction::NorthWest => Coord::new(-1, -1),
        }
    }

    /// The compass direction whose unit coord matches `(dx, dy)`, if any.
    /// `(0, 0)` maps to `Center`.
    pub fn from_unit_coord(dx: i32, dy: i32) -> Option<Direction> {
        if dx == 0 && dy == 0 {
            return Some(Direction::Center);
        }
        Self::RING
            .iter()
            .copied()
            .find(|d| d.as_unit_coord() == Coord::new(dx, dy))
    }

    fn rotate_by(self, steps: i32) -> Direction {
        match self.ring_index() {
            None => Direction::Center,
            Some(i) => {
                let len = Self::RING.len() as i32;
                let new_i = (i as i32 + steps).rem_euclid(len) as usize;
                Self::RING[new_i]
            }
        }
    }

    /// Rotates 90 degrees clockwise. `Center` is unaffected.
    pub fn rotate_90_cw(self) -> Direction {
        self.rotate_by(2)
    }

    /// Rotates 90 degrees counter-clockwise. `Center` is unaffected.
    pub fn rotate_90_ccw(self) -> Direction {
        self.rotate_by(-2)
    }

    /// Rotates 180 degrees. `Center` is unaffected.
    pub fn rotate_180(self) -> Direction {
        self.rotate_by(4)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn center_is_fixed_under_rotation() {
        assert_eq!(Direction::Center.rotate_90_cw(), Direction::Center);
        assert_eq!(Direction::Center.rotate_90_ccw(), Direction::Center);
        assert_eq!(Direction::Center.rotate_180(), Direction::Center);
        assert_eq!(Direction::Center.as_unit_coord(), Coord::new(0, 0));
    }

    #[test]
    fn rotations_cycle_through_the_compass() {
        let mut d = Direction::North;
        for _ in 0..4 {
            d = d.rotate_90_cw();
        }
        assert_eq!(d, Direction::North);

        assert_eq!(Direction::North.rotate_90_cw(), Direction::East);
        assert_eq!(Direction::East.rotate_90_cw(), Direction::South);
        assert_eq!(Direction::North.rotate_180(), Direction::South);
        assert_eq!(Direction::North.rotate_90_ccw(), Direction::West);
    }

    #[test]
    fn unit_coord_roundtrip() {
        for d in Direction::RING {
            let c = d.as_unit_coord();
            assert_eq!(Direction::from_unit_coord(c.x, c.y), Some(d));
        }
        assert_eq!(Direction::from_unit_coord(0, 0), Some(Direction::Center));
        assert_eq!(Direction::from_unit_coord(5, 5), None);
    }
}
